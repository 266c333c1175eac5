//! Audio session
//!
//! The game never synthesizes sound itself; it emits [`GameEvent`]s and the
//! caller hands them to an [`AudioSession`] it owns. On the web the session
//! drives a Web Audio context with procedurally generated cues (no external
//! files). Natively it only tracks state and logs.

#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::settings::Settings;
use crate::sim::{GameEvent, PowerUpKind};

/// Fire-and-forget sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Worm squashed
    Squash,
    /// A worm bit a plot
    Damage,
    /// Consecutive squash (combo count)
    Combo(u32),
    /// Pesticide or fertilizer used
    PowerUp,
    /// Shield raised
    Shield,
    /// Run ended
    GameOver,
}

/// Cues for a single game event
pub fn cues_for(event: &GameEvent, out: &mut Vec<AudioCue>) {
    match event {
        GameEvent::WormSquashed { combo, .. } => {
            out.push(AudioCue::Squash);
            if *combo >= 2 {
                out.push(AudioCue::Combo(*combo));
            }
        }
        GameEvent::WormsExpired { damaged: true, .. } => out.push(AudioCue::Damage),
        GameEvent::PowerUpActivated { kind, .. } => out.push(match kind {
            PowerUpKind::Shield => AudioCue::Shield,
            _ => AudioCue::PowerUp,
        }),
        GameEvent::GameOver { .. } => out.push(AudioCue::GameOver),
        _ => {}
    }
}

/// Owned audio state. `init` after a user gesture, `teardown` when leaving.
pub struct AudioSession {
    #[cfg(target_arch = "wasm32")]
    ctx: Option<AudioContext>,
    #[cfg(target_arch = "wasm32")]
    ambient: Option<(OscillatorNode, OscillatorNode, GainNode)>,
    initialized: bool,
    ambient_playing: bool,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl Default for AudioSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSession {
    /// An uninitialized session; nothing plays until `init`
    pub fn new() -> Self {
        Self {
            #[cfg(target_arch = "wasm32")]
            ctx: None,
            #[cfg(target_arch = "wasm32")]
            ambient: None,
            initialized: false,
            ambient_playing: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_ambient_playing(&self) -> bool {
        self.ambient_playing
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.master_volume = settings.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = settings.music_volume.clamp(0.0, 1.0);
        self.set_muted(settings.muted);
    }

    /// Mute/unmute all audio (stops and restarts the ambient drone)
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        if self.ambient_playing {
            self.stop_ambient_nodes();
            if !muted {
                self.start_ambient_nodes();
            }
        }
    }

    fn effective_volume(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * channel
        }
    }

    /// Create the audio context (must follow a user gesture in browsers)
    pub fn init(&mut self) {
        if self.initialized {
            self.resume();
            return;
        }
        #[cfg(target_arch = "wasm32")]
        {
            self.ctx = AudioContext::new().ok();
            if self.ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
        }
        self.initialized = true;
        log::info!("Audio session initialized");
    }

    /// Stop everything and release the context
    pub fn teardown(&mut self) {
        if !self.initialized {
            return;
        }
        self.stop_ambient();
        self.close_context();
        self.initialized = false;
        log::info!("Audio session torn down");
    }

    /// Resume a suspended context (browsers suspend until a gesture)
    #[cfg(target_arch = "wasm32")]
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn resume(&self) {}

    #[cfg(target_arch = "wasm32")]
    fn close_context(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            let _ = ctx.close();
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn close_context(&mut self) {}

    /// React to a frame's worth of game events
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        let mut cues = Vec::new();
        for event in events {
            match event {
                GameEvent::AmbientStarted => self.start_ambient(),
                GameEvent::AmbientStopped => self.stop_ambient(),
                _ => cues_for(event, &mut cues),
            }
        }
        for cue in cues {
            self.play(cue);
        }
    }

    pub fn start_ambient(&mut self) {
        if self.ambient_playing {
            return;
        }
        self.ambient_playing = true;
        self.start_ambient_nodes();
    }

    pub fn stop_ambient(&mut self) {
        if !self.ambient_playing {
            return;
        }
        self.ambient_playing = false;
        self.stop_ambient_nodes();
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn play(&self, cue: AudioCue) {
        if self.initialized && self.effective_volume(self.sfx_volume) > 0.0 {
            log::debug!("Audio cue {:?}", cue);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_ambient_nodes(&mut self) {
        log::debug!(
            "Ambient loop on (volume {:.2})",
            self.effective_volume(self.music_volume)
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn stop_ambient_nodes(&mut self) {
        log::debug!("Ambient loop off");
    }

    /// Play a sound cue
    #[cfg(target_arch = "wasm32")]
    pub fn play(&self, cue: AudioCue) {
        let vol = self.effective_volume(self.sfx_volume);
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        self.resume();

        match cue {
            AudioCue::Squash => self.play_squash(ctx, vol),
            AudioCue::Damage => self.play_damage(ctx, vol),
            AudioCue::Combo(count) => self.play_combo(ctx, vol, count),
            AudioCue::PowerUp => self.play_power_up(ctx, vol),
            AudioCue::Shield => self.play_shield(ctx, vol),
            AudioCue::GameOver => self.play_game_over(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    #[cfg(target_arch = "wasm32")]
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Low two-voice drone that runs for the whole game
    #[cfg(target_arch = "wasm32")]
    fn start_ambient_nodes(&mut self) {
        let vol = self.effective_volume(self.music_volume);
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let Some((low, gain)) = self.create_osc(ctx, 55.0, OscillatorType::Sine) else {
            return;
        };
        let Some(high) = ctx.create_oscillator().ok() else {
            return;
        };
        high.set_type(OscillatorType::Triangle);
        high.frequency().set_value(82.5);
        high.connect_with_audio_node(&gain).ok();

        let t = ctx.current_time();
        gain.gain().set_value_at_time(0.001, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(vol * 0.08, t + 1.5)
            .ok();
        low.start().ok();
        high.start().ok();
        self.ambient = Some((low, high, gain));
    }

    #[cfg(target_arch = "wasm32")]
    fn stop_ambient_nodes(&mut self) {
        if let Some((low, high, _gain)) = self.ambient.take() {
            low.stop().ok();
            high.stop().ok();
        }
    }

    /// Squash - wet thump
    #[cfg(target_arch = "wasm32")]
    fn play_squash(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 220.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.6, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency().set_value_at_time(220.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(70.0, t + 0.12)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Damage - ominous descend
    #[cfg(target_arch = "wasm32")]
    fn play_damage(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.35, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.5)
            .ok();
        osc.frequency().set_value_at_time(300.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(40.0, t + 0.5)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.6).ok();
    }

    /// Combo - chime that climbs with the combo count
    #[cfg(target_arch = "wasm32")]
    fn play_combo(&self, ctx: &AudioContext, vol: f32, count: u32) {
        let base = 500.0 + 60.0 * count.min(10) as f32;
        for (i, step) in [1.0, 1.25, 1.5].iter().enumerate() {
            let delay = i as f64 * 0.05;
            if let Some((osc, gain)) = self.create_osc(ctx, base * step, OscillatorType::Triangle) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.2, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.2).ok();
            }
        }
    }

    /// Power-up - happy ding
    #[cfg(target_arch = "wasm32")]
    fn play_power_up(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [600.0, 800.0, 1000.0].iter().enumerate() {
            let delay = i as f64 * 0.08;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.2).ok();
            }
        }
    }

    /// Shield - rising shimmer
    #[cfg(target_arch = "wasm32")]
    fn play_shield(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.01, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(vol * 0.3, t + 0.1)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.5)
            .ok();
        osc.frequency().set_value_at_time(300.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(1200.0, t + 0.4)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.55).ok();
    }

    /// Game over - sad descending
    #[cfg(target_arch = "wasm32")]
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
            let delay = i as f64 * 0.2;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }
}
