//! Session controller
//!
//! Owns the phase machine (menu -> playing -> game over -> playing ...),
//! score, lives, combo and difficulty. Drives the board and the power-up
//! cycle one fixed step at a time and collects [`GameEvent`]s for the view
//! and the audio session.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::board::{Board, BoardConfig, DecayReport};
use super::powerup::PowerUpCycle;
use super::state::{GameEvent, GamePhase, PowerUpKind};
use super::timer::Countdown;
use crate::best_score::BestScore;
use crate::consts::*;
use crate::difficulty_for_score;
use crate::persistence::Storage;
use crate::squash_points;

pub struct Session {
    phase: GamePhase,
    score: u64,
    lives: u8,
    combo: u32,
    difficulty: u32,
    best: BestScore,
    storage: Box<dyn Storage>,
    board: Board,
    powerups: PowerUpCycle,
    shield: Countdown,
    game_over_delay: Countdown,
    /// Simulation clock (ms since the current game started)
    time_ms: u64,
    rng: Pcg32,
    events: Vec<GameEvent>,
}

impl Session {
    /// Create a session in the menu, reading the best score from `storage`
    pub fn new(seed: u64, storage: Box<dyn Storage>) -> Self {
        let best = BestScore::load(storage.as_ref());
        Self {
            phase: GamePhase::Menu,
            score: 0,
            lives: MAX_LIVES,
            combo: 0,
            difficulty: 1,
            best,
            storage,
            board: Board::new(),
            powerups: PowerUpCycle::new(),
            shield: Countdown::new(SHIELD_DURATION_MS),
            game_over_delay: Countdown::new(GAME_OVER_DELAY_MS),
            time_ms: 0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn best_score(&self) -> u64 {
        self.best.score
    }

    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn powerups(&self) -> &PowerUpCycle {
        &self.powerups
    }

    pub fn shield_active(&self) -> bool {
        self.shield.is_running()
    }

    pub fn shield_remaining_ms(&self) -> u32 {
        self.shield.remaining_ms()
    }

    /// Lives ran out and the game-over transition is scheduled
    pub fn game_over_pending(&self) -> bool {
        self.game_over_delay.is_running()
    }

    /// Accepting taps and activations
    pub fn is_interactive(&self) -> bool {
        self.phase == GamePhase::Playing && !self.game_over_pending()
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a new game from the menu or the game-over screen
    pub fn start(&mut self) {
        if self.phase == GamePhase::Playing {
            return;
        }

        self.score = 0;
        self.lives = MAX_LIVES;
        self.combo = 0;
        self.difficulty = difficulty_for_score(0);
        self.time_ms = 0;
        self.board.reset();
        self.powerups.reset();
        self.shield.cancel();
        self.game_over_delay.cancel();
        self.phase = GamePhase::Playing;
        self.sync_board();

        log::info!("Game started (best {})", self.best.score);
        self.events.push(GameEvent::PhaseChanged(GamePhase::Playing));
        self.events.push(GameEvent::AmbientStarted);
        self.events.push(GameEvent::ScoreChanged(self.score));
        self.events.push(GameEvent::LivesChanged(self.lives));
        self.events.push(GameEvent::DifficultyChanged(self.difficulty));
    }

    /// Tap a worm. Returns the points awarded.
    pub fn squash(&mut self, worm_id: u32) -> Option<u64> {
        if !self.is_interactive() {
            return None;
        }
        let cell = self.board.squash(worm_id)?;
        self.combo += 1;
        let points = squash_points(self.combo);
        log::debug!("Worm {} squashed, combo {} (+{})", worm_id, self.combo, points);
        self.events.push(GameEvent::WormSquashed {
            id: worm_id,
            cell,
            combo: self.combo,
            points,
        });
        self.add_score(points);
        Some(points)
    }

    /// Collect a power-up and apply its effect
    pub fn activate_power_up(&mut self, id: u32) -> Option<PowerUpKind> {
        if !self.is_interactive() {
            return None;
        }
        let powerup = self.powerups.take(id, self.time_ms)?;
        log::info!("Power-up {} activated", powerup.kind.as_str());
        self.events.push(GameEvent::PowerUpActivated {
            id,
            kind: powerup.kind,
        });

        match powerup.kind {
            PowerUpKind::Pesticide => {
                let cleared = self.board.clear_all();
                self.events.push(GameEvent::FieldCleared { worms: cleared });
                if cleared > 0 {
                    self.add_score(POINTS_PER_CLEARED_WORM * cleared as u64);
                }
            }
            PowerUpKind::Shield => self.activate_shield(),
            PowerUpKind::Fertilizer => {
                if let Some((cell, health)) = self.board.heal() {
                    self.events.push(GameEvent::CellHealed { cell, health });
                }
            }
        }
        Some(powerup.kind)
    }

    /// Start (or restart) damage immunity for the full duration
    pub fn activate_shield(&mut self) {
        if !self.is_interactive() {
            return;
        }
        let was_running = self.shield.is_running();
        self.shield.restart();
        self.sync_board();
        if !was_running {
            self.events.push(GameEvent::ShieldChanged(true));
        }
    }

    /// Advance the simulation by one step
    pub fn step(&mut self, dt_ms: u32) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.time_ms += dt_ms as u64;

        if self.shield.advance(dt_ms) {
            self.sync_board();
            self.events.push(GameEvent::ShieldChanged(false));
        }

        let report = self
            .board
            .advance(self.time_ms, dt_ms, &mut self.rng, &mut self.events);
        self.apply_decay(&report);

        if !self.game_over_pending() {
            self.powerups
                .advance(self.time_ms, dt_ms, &mut self.rng, &mut self.events);
        }

        if self.game_over_delay.advance(dt_ms) {
            self.end_game();
        }
    }

    fn apply_decay(&mut self, report: &DecayReport) {
        let lost = report.lives_lost();
        if lost == 0 {
            return;
        }

        let lost = lost.min(u8::MAX as usize) as u8;
        self.lives = self.lives.saturating_sub(lost);
        self.combo = 0;
        self.events.push(GameEvent::ComboReset);
        self.events.push(GameEvent::LivesChanged(self.lives));

        if self.lives == 0 && !self.game_over_pending() {
            log::info!("Out of lives at score {}", self.score);
            self.game_over_delay.restart();
            self.sync_board();
        }
    }

    fn add_score(&mut self, points: u64) {
        self.score += points;
        self.events.push(GameEvent::ScoreChanged(self.score));

        let level = difficulty_for_score(self.score);
        if level != self.difficulty {
            self.difficulty = level;
            log::info!("Difficulty {}", level);
            self.events.push(GameEvent::DifficultyChanged(level));
            self.sync_board();
        }
    }

    fn end_game(&mut self) {
        self.phase = GamePhase::GameOver;
        self.shield.cancel();
        self.game_over_delay.cancel();
        self.powerups.cancel_timers();
        self.sync_board();

        let new_best = self.best.submit(self.score);
        if new_best {
            self.best.save(self.storage.as_mut());
        }
        log::info!(
            "Game over: score {} (best {}{})",
            self.score,
            self.best.score,
            if new_best { ", new record" } else { "" }
        );

        self.events.push(GameEvent::PhaseChanged(GamePhase::GameOver));
        self.events.push(GameEvent::AmbientStopped);
        self.events.push(GameEvent::GameOver {
            score: self.score,
            best: self.best.score,
            new_best,
        });
    }

    fn sync_board(&mut self) {
        self.board.configure(BoardConfig {
            active: self.is_interactive(),
            difficulty: self.difficulty,
            immune: self.shield.is_running(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellCoord;
    use crate::persistence::MemoryStorage;

    fn playing_session() -> (Session, MemoryStorage) {
        let storage = MemoryStorage::new();
        let mut session = Session::new(42, Box::new(storage.clone()));
        session.start();
        session.drain_events();
        (session, storage)
    }

    fn run_for(session: &mut Session, ms: u32) {
        for _ in 0..ms / SIM_STEP_MS {
            session.step(SIM_STEP_MS);
        }
    }

    /// Run while tapping every worm the moment it appears
    fn run_defended(session: &mut Session, ms: u32) {
        for _ in 0..ms / SIM_STEP_MS {
            let ids: Vec<u32> = session.board().active_worms().map(|w| w.id).collect();
            for id in ids {
                session.squash(id);
            }
            session.step(SIM_STEP_MS);
        }
    }

    /// Place a worm directly so tests control where and when it bites
    fn plant_worm(session: &mut Session, cell: CellCoord) -> u32 {
        let now = session.time_ms();
        session.board_mut().spawn_worm_at(cell, now).unwrap().id
    }

    #[test]
    fn test_start_resets_state() {
        let (mut session, _) = playing_session();
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.lives(), MAX_LIVES);
        assert_eq!(session.score(), 0);
        assert_eq!(session.difficulty(), 1);
        assert!(session.board().config().active);

        // Already playing: no-op
        session.start();
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_menu_does_not_tick() {
        let mut session = Session::new(1, Box::new(MemoryStorage::new()));
        run_for(&mut session, 5000);
        assert_eq!(session.time_ms(), 0);
        assert!(session.board().worms().is_empty());
        assert!(session.squash(1).is_none());
    }

    #[test]
    fn test_six_squash_combo_scores_200() {
        let (mut session, _) = playing_session();
        let ids: Vec<u32> = (0..6)
            .map(|_| plant_worm(&mut session, CellCoord::new(0, 0)))
            .collect();
        let points: Vec<u64> = ids.iter().filter_map(|&id| session.squash(id)).collect();
        assert_eq!(points, vec![10, 20, 30, 40, 50, 50]);
        assert_eq!(session.score(), 200);
        assert_eq!(session.combo(), 6);
        assert_eq!(session.difficulty(), 5);
        assert_eq!(session.board().spawn_interval_ms(), 1000);
    }

    #[test]
    fn test_squash_unknown_or_repeat_is_ignored() {
        let (mut session, _) = playing_session();
        assert!(session.squash(999).is_none());
        let id = plant_worm(&mut session, CellCoord::new(1, 2));
        assert_eq!(session.squash(id), Some(10));
        assert!(session.squash(id).is_none());
        assert_eq!(session.combo(), 1);
    }

    #[test]
    fn test_damage_resets_combo_and_costs_lives() {
        let (mut session, _) = playing_session();
        let id = plant_worm(&mut session, CellCoord::new(0, 0));
        session.squash(id);
        assert_eq!(session.combo(), 1);

        let cells = [CellCoord::new(1, 1), CellCoord::new(2, 2), CellCoord::new(3, 3)];
        for cell in cells {
            plant_worm(&mut session, cell);
        }
        // Natural spawns are still too young to bite by then
        run_for(&mut session, WORM_LIFETIME_MS as u32 + 100);

        assert_eq!(session.combo(), 0);
        assert_eq!(session.lives(), MAX_LIVES - 3);
        for cell in cells {
            assert_eq!(session.board().grid().health(cell), MAX_HEALTH - 1);
        }
        assert!(session.events().contains(&GameEvent::ComboReset));
        assert!(
            session
                .events()
                .contains(&GameEvent::LivesChanged(MAX_LIVES - 3))
        );
    }

    #[test]
    fn test_game_over_fires_once_after_delay() {
        let (mut session, storage) = playing_session();
        for _ in 0..MAX_LIVES + 2 {
            plant_worm(&mut session, CellCoord::new(0, 1));
        }
        let id = plant_worm(&mut session, CellCoord::new(0, 2));
        session.squash(id);
        run_for(&mut session, WORM_LIFETIME_MS as u32 + 100);
        assert_eq!(session.lives(), 0);
        assert_eq!(session.board().grid().health(CellCoord::new(0, 1)), 0);
        assert!(session.game_over_pending());
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(!session.board().config().active);

        run_for(&mut session, GAME_OVER_DELAY_MS);
        assert_eq!(session.phase(), GamePhase::GameOver);
        let game_overs = session
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
        assert!(session.events().contains(&GameEvent::AmbientStopped));
        assert_eq!(session.best_score(), 10);
        assert_eq!(BestScore::load(&storage).score, 10);

        // Nothing moves after game over
        let t = session.time_ms();
        run_for(&mut session, 10_000);
        assert_eq!(session.time_ms(), t);
    }

    #[test]
    fn test_best_score_not_lowered() {
        let mut storage = MemoryStorage::new();
        BestScore::new(1000).save(&mut storage);
        let mut session = Session::new(3, Box::new(storage.clone()));
        assert_eq!(session.best_score(), 1000);
        session.start();
        for _ in 0..MAX_LIVES {
            plant_worm(&mut session, CellCoord::new(1, 0));
        }
        run_for(
            &mut session,
            WORM_LIFETIME_MS as u32 + 100 + GAME_OVER_DELAY_MS,
        );
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert!(session.events().contains(&GameEvent::GameOver {
            score: 0,
            best: 1000,
            new_best: false
        }));
        assert_eq!(BestScore::load(&storage).score, 1000);
    }

    #[test]
    fn test_restart_after_game_over() {
        let (mut session, _) = playing_session();
        for _ in 0..MAX_LIVES {
            plant_worm(&mut session, CellCoord::new(2, 0));
        }
        run_for(
            &mut session,
            WORM_LIFETIME_MS as u32 + 100 + GAME_OVER_DELAY_MS,
        );
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert!(session.squash(1).is_none());

        session.start();
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.lives(), MAX_LIVES);
        assert_eq!(session.time_ms(), 0);
        assert_eq!(
            session.board().grid().health(CellCoord::new(2, 0)),
            MAX_HEALTH
        );
        assert!(session.board().worms().is_empty());
        assert!(session.board().config().active);
    }

    #[test]
    fn test_shield_blocks_damage() {
        let (mut session, _) = playing_session();
        session.activate_shield();
        assert!(session.shield_active());
        plant_worm(&mut session, CellCoord::new(3, 0));
        run_for(&mut session, WORM_LIFETIME_MS as u32 + 100);
        assert_eq!(session.lives(), MAX_LIVES);
        assert_eq!(
            session.board().grid().health(CellCoord::new(3, 0)),
            MAX_HEALTH
        );
        assert!(session.events().contains(&GameEvent::WormsExpired {
            cells: vec![CellCoord::new(3, 0)],
            damaged: false
        }));
    }

    #[test]
    fn test_shield_reactivation_restarts_window() {
        let (mut session, _) = playing_session();
        session.activate_shield();
        run_for(&mut session, 3000);
        session.activate_shield();
        assert_eq!(session.shield_remaining_ms(), SHIELD_DURATION_MS);
        run_for(&mut session, SHIELD_DURATION_MS - SIM_STEP_MS);
        assert!(session.shield_active());
        run_for(&mut session, SIM_STEP_MS);
        assert!(!session.shield_active());
        assert!(!session.board().config().immune);

        let toggles: Vec<_> = session
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::ShieldChanged(_)))
            .collect();
        assert_eq!(
            toggles,
            vec![
                &GameEvent::ShieldChanged(true),
                &GameEvent::ShieldChanged(false)
            ]
        );
    }

    #[test]
    fn test_power_ups_spawn_and_activate() {
        let (mut session, _) = playing_session();
        run_defended(&mut session, POWERUP_SPAWN_MS);
        assert_eq!(session.lives(), MAX_LIVES);
        assert_eq!(session.powerups().live().len(), 1);
        let powerup = session.powerups().live()[0].clone();
        assert_eq!(session.activate_power_up(powerup.id), Some(powerup.kind));
        assert!(session.powerups().live().is_empty());
        assert!(session.activate_power_up(powerup.id).is_none());
    }

    #[test]
    fn test_unused_power_up_expires() {
        let (mut session, _) = playing_session();
        run_defended(&mut session, POWERUP_SPAWN_MS);
        let id = session.powerups().live()[0].id;
        run_defended(&mut session, POWERUP_LIFETIME_MS as u32);
        assert!(session.powerups().live().iter().all(|p| p.id != id));
        assert!(session.events().contains(&GameEvent::PowerUpExpired { id }));
    }

    #[test]
    fn test_pesticide_clears_board() {
        let (mut session, _) = playing_session();
        let mut rng = Pcg32::seed_from_u64(0);
        // Draw until a pesticide comes up
        let id = loop {
            let powerup = session.powerups.spawn(session.time_ms, &mut rng).unwrap();
            if powerup.kind == PowerUpKind::Pesticide {
                break powerup.id;
            }
            session.powerups.take(powerup.id, session.time_ms);
        };
        for col in 0..3 {
            plant_worm(&mut session, CellCoord::new(0, col));
        }
        assert_eq!(session.activate_power_up(id), Some(PowerUpKind::Pesticide));
        assert_eq!(session.score(), 15);
        assert_eq!(session.combo(), 0);
        assert_eq!(session.board().active_worms().count(), 0);
        assert!(session.events().contains(&GameEvent::FieldCleared { worms: 3 }));
    }

    #[test]
    fn test_fertilizer_heals_through_session() {
        let (mut session, _) = playing_session();
        session.board_mut().grid_mut().set_health(CellCoord::new(0, 0), 1);
        let mut rng = Pcg32::seed_from_u64(9);
        let id = loop {
            let powerup = session.powerups.spawn(session.time_ms, &mut rng).unwrap();
            if powerup.kind == PowerUpKind::Fertilizer {
                break powerup.id;
            }
            session.powerups.take(powerup.id, session.time_ms);
        };
        session.activate_power_up(id);
        assert_eq!(
            session.board().grid().health(CellCoord::new(0, 0)),
            MAX_HEALTH
        );
        assert!(session.events().contains(&GameEvent::CellHealed {
            cell: CellCoord::new(0, 0),
            health: MAX_HEALTH
        }));
    }
}
