//! Cornfield Worms entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, PointerEvent};

    use cornfield_worms::consts::*;
    use cornfield_worms::persistence::LocalStorage;
    use cornfield_worms::sim::{GameEvent, GamePhase, Session, TickInput, tick};
    use cornfield_worms::{AudioSession, BoardLayout, CellCoord, Settings, platform};

    /// Gap between plots in CSS pixels
    const CELL_GAP: f32 = 8.0;
    /// How long the pesticide flash stays on the board
    const PULSE_MS: f64 = 250.0;

    /// Game instance holding all state
    struct Game {
        session: Session,
        audio: AudioSession,
        settings: Settings,
        storage: LocalStorage,
        layout: BoardLayout,
        accumulator: f64,
        last_time: f64,
        input: TickInput,
        pulse_until: f64,
        /// Power-up ids currently rendered in the tray
        tray_ids: Vec<u32>,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let storage = LocalStorage::new();
            let settings = Settings::load(&storage);
            let mut audio = AudioSession::new();
            audio.apply_settings(&settings);
            Self {
                session: Session::new(seed, Box::new(LocalStorage::new())),
                audio,
                settings,
                storage,
                layout: BoardLayout::fit(Vec2::ZERO, CELL_GAP),
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                pulse_until: 0.0,
                tray_ids: Vec::new(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run simulation steps for the elapsed frame time
        fn update(&mut self, dt_ms: f64, time: f64) {
            self.accumulator += dt_ms.min(MAX_FRAME_MS as f64);
            let steps = (self.accumulator / SIM_STEP_MS as f64).floor() as u32;
            if steps > 0 || self.input.start {
                tick(&mut self.session, &self.input, steps * SIM_STEP_MS);
                self.accumulator -= (steps * SIM_STEP_MS) as f64;
                self.input.clear();
            }

            let events = self.session.drain_events();
            self.audio.handle_events(&events);
            for event in &events {
                match event {
                    GameEvent::FieldCleared { .. } if self.settings.effective_clear_pulse() => {
                        self.pulse_until = time + PULSE_MS;
                    }
                    GameEvent::PhaseChanged(phase) => log::info!("Phase: {:?}", phase),
                    _ => {}
                }
            }

            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (59_000.0 / elapsed).round() as u32;
                }
            }
        }

        fn toggle_mute(&mut self) {
            self.settings.muted = !self.settings.muted;
            self.audio.set_muted(self.settings.muted);
            self.settings.save(&mut self.storage);
        }

        /// Update plots and worms in the DOM
        fn render_board(&mut self, document: &Document, time: f64) {
            let now = self.session.time_ms();
            let board = self.session.board();
            for (cell, health) in board.grid().cells() {
                let Some(el) = document.get_element_by_id(&cell_id(cell)) else {
                    continue;
                };
                let mut class = format!("cell health-{}", health);
                if let Some(worm) = board
                    .active_worms()
                    .filter(|w| w.cell == cell)
                    .min_by_key(|w| w.spawned_at_ms)
                {
                    class.push_str(" has-worm");
                    if worm.urgency(now) > 0.66 {
                        class.push_str(" urgent");
                    }
                }
                let _ = el.set_attribute("class", &class);
            }

            if let Some(el) = document.get_element_by_id("board") {
                let mut class = String::from("board");
                if self.session.shield_active() {
                    class.push_str(" shielded");
                }
                if time < self.pulse_until {
                    class.push_str(" pulse");
                }
                let _ = el.set_attribute("class", &class);
            }

            if let Some(tray) = document.get_element_by_id("powerups") {
                let powerups = self.session.powerups();
                // Rebuilding detaches the buttons, so only do it when the set changes
                let ids = powerups.unexpired_ids(now);
                if ids != self.tray_ids {
                    let html: String = powerups
                        .live()
                        .iter()
                        .filter(|p| ids.contains(&p.id))
                        .map(|p| {
                            format!(
                                r#"<button class="powerup {kind}" data-id="{id}">{kind}</button>"#,
                                kind = p.kind.as_str(),
                                id = p.id
                            )
                        })
                        .collect();
                    tray.set_inner_html(&html);
                    self.tray_ids = ids;
                }

                for powerup in powerups.live().iter().filter(|p| self.tray_ids.contains(&p.id)) {
                    let selector = format!(r#"[data-id="{}"]"#, powerup.id);
                    if let Some(el) = tray.query_selector(&selector).ok().flatten() {
                        let fading = powerup.urgency(now) > 0.7;
                        let _ = el.class_list().toggle_with_force("fading", fading);
                    }
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            set_text(document, "#hud-score .hud-value", &self.session.score().to_string());
            set_text(document, "#hud-lives .hud-value", &self.session.lives().to_string());
            set_text(document, "#hud-level .hud-value", &self.session.difficulty().to_string());
            set_text(document, "#hud-best .hud-value", &self.session.best_score().to_string());
            set_text(document, "#hud-fps .hud-value", &self.fps.to_string());
            show(document, "hud-fps", self.settings.show_fps);

            // Combo (only show when 2+)
            let combo = self.session.combo();
            show(document, "hud-combo", combo > 1);
            if combo > 1 {
                set_text(document, "#hud-combo .hud-value", &combo.to_string());
                let multiplier = combo.min(MAX_COMBO_MULTIPLIER);
                set_text(document, "#hud-combo .multiplier", &format!("x{}", multiplier));
            }

            show(document, "menu", self.session.phase() == GamePhase::Menu);
            let over = self.session.phase() == GamePhase::GameOver;
            show(document, "game-over", over);
            if over {
                set_text(document, "#final-score", &self.session.score().to_string());
                set_text(document, "#final-best", &self.session.best_score().to_string());
            }
        }

        /// Lay the plots out to fill the board element
        fn layout_board(&mut self, document: &Document) {
            let Some(board) = document.get_element_by_id("board") else {
                return;
            };
            let size = Vec2::new(board.client_width() as f32, board.client_height() as f32);
            self.layout = BoardLayout::fit(size, CELL_GAP);
            for row in 0..GRID_ROWS {
                for col in 0..GRID_COLS {
                    let cell = CellCoord::new(row, col);
                    let Some(el) = document.get_element_by_id(&cell_id(cell)) else {
                        continue;
                    };
                    let (min, _) = self.layout.cell_rect(cell);
                    let style = format!(
                        "left:{}px;top:{}px;width:{size}px;height:{size}px",
                        min.x,
                        min.y,
                        size = self.layout.cell_size
                    );
                    let _ = el.set_attribute("style", &style);
                }
            }
        }
    }

    fn cell_id(cell: CellCoord) -> String {
        format!("cell-{}-{}", cell.row, cell.col)
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        log::info!("Cornfield Worms starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document - cannot start");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(board) = document.get_element_by_id("board") else {
            log::error!("No #board element - cannot start");
            return;
        };
        create_cells(&document, &board);

        let seed = platform::run_seed();
        let game = Rc::new(RefCell::new(Game::new(seed)));
        game.borrow_mut().layout_board(&document);
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&board, game.clone());
        setup_buttons(&document, game.clone());
        setup_focus_handlers(game.clone());

        request_animation_frame(game);
        log::info!("Cornfield Worms running!");
    }

    fn create_cells(document: &Document, board: &Element) {
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                if let Ok(el) = document.create_element("div") {
                    el.set_id(&cell_id(CellCoord::new(row, col)));
                    let _ = el.set_attribute("class", "cell");
                    let _ = board.append_child(&el);
                }
            }
        }
    }

    fn setup_input_handlers(board: &Element, game: Rc<RefCell<Game>>) {
        // Tap a plot
        {
            let game = game.clone();
            let board_clone = board.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let rect = board_clone.get_bounding_client_rect();
                let pos = Vec2::new(
                    event.client_x() as f32 - rect.left() as f32,
                    event.client_y() as f32 - rect.top() as f32,
                );
                let mut g = game.borrow_mut();
                g.audio.init();
                let hit = g.layout.worm_at(pos, g.session.board().worms());
                if let Some(id) = hit {
                    g.input.taps.push(id);
                }
            });
            let _ = board
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize
        if let Some(window) = web_sys::window() {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    game.borrow_mut().layout_board(&document);
                }
            });
            let _ =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" => {
                        g.audio.init();
                        g.input.start = true;
                    }
                    "m" | "M" => g.toggle_mute(),
                    "i" | "I" => {
                        g.input.idle_mode = !g.input.idle_mode;
                        log::info!("Idle mode: {}", g.input.idle_mode);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        // Start and restart share behaviour
        for id in ["start-btn", "restart-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                    let mut g = game.borrow_mut();
                    g.audio.init();
                    g.input.start = true;
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        // Reset settings to defaults
        if let Some(btn) = document.get_element_by_id("reset-settings-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                let settings = Settings::reset(&mut g.storage);
                g.audio.apply_settings(&settings);
                g.settings = settings;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Power-up tray: buttons come and go, so listen on the tray and
        // activate on press like board taps
        if let Some(tray) = document.get_element_by_id("powerups") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let id = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest("[data-id]").ok().flatten())
                    .and_then(|el| el.get_attribute("data-id"))
                    .and_then(|id| id.parse::<u32>().ok());
                if let Some(id) = id {
                    event.prevent_default();
                    game.borrow_mut().input.activations.push(id);
                }
            });
            let _ = tray
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_focus_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Window blur (click outside)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Focus restores the saved mute preference
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                let muted = g.settings.muted;
                g.audio.set_muted(muted);
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                time - g.last_time
            } else {
                SIM_STEP_MS as f64
            };
            g.last_time = time;

            g.update(dt, time);
            g.render_board(&document, time);
            g.update_hud(&document);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use cornfield_worms::persistence::platform_storage;
    use cornfield_worms::sim::{GamePhase, Session, TickInput, tick};
    use cornfield_worms::{AudioSession, platform};

    /// Simulated length of the headless demo
    const DEMO_MS: u32 = 5 * 60 * 1000;
    const FRAME_MS: u32 = 16;

    env_logger::init();
    log::info!("Cornfield Worms (native) starting...");
    log::info!("Native mode runs a headless demo - use `trunk serve` for the web version");

    let seed = platform::run_seed();
    let mut session = Session::new(seed, platform_storage());
    let mut audio = AudioSession::new();
    audio.init();

    let mut input = TickInput {
        start: true,
        idle_mode: true,
        ..Default::default()
    };
    let mut elapsed = 0;
    while elapsed < DEMO_MS {
        tick(&mut session, &input, FRAME_MS);
        input.start = false;
        audio.handle_events(&session.drain_events());
        elapsed += FRAME_MS;
        // A single run; idle mode would otherwise restart it
        if session.phase() == GamePhase::GameOver {
            break;
        }
    }
    audio.teardown();

    println!(
        "Demo run (seed {}): score {}, level {}, lives {}, dead plots {}, {:.1}s simulated",
        seed,
        session.score(),
        session.difficulty(),
        session.lives(),
        session.board().grid().dead_count(),
        session.time_ms() as f64 / 1000.0
    );
}
