//! Fixed timestep simulation tick
//!
//! Applies one frame's worth of player input, then advances the session in
//! fixed steps so every timer fires in chronological order.

use super::session::Session;
use super::state::{GamePhase, PowerUpKind};
use crate::consts::*;

/// How long the autoplayer waits before tapping a worm
pub const IDLE_REACTION_MS: u64 = 1200;

/// Input commands gathered since the last tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start / restart (from menu or game over)
    pub start: bool,
    /// Worm ids tapped by the player
    pub taps: Vec<u32>,
    /// Power-up ids activated by the player
    pub activations: Vec<u32>,
    /// Idle/demo mode - the autoplayer taps worms and uses power-ups
    pub idle_mode: bool,
}

impl TickInput {
    /// Clear one-shot inputs after processing (idle mode persists)
    pub fn clear(&mut self) {
        self.start = false;
        self.taps.clear();
        self.activations.clear();
    }
}

/// Advance the session by `dt_ms`
pub fn tick(session: &mut Session, input: &TickInput, dt_ms: u32) {
    if input.start {
        session.start();
    }

    // Squash before any timer runs: a worm tapped this frame never bites
    for &id in &input.taps {
        session.squash(id);
    }
    for &id in &input.activations {
        session.activate_power_up(id);
    }

    if input.idle_mode && session.phase() == GamePhase::GameOver {
        session.start();
    }

    let mut remaining = dt_ms;
    while remaining > 0 {
        let step = remaining.min(SIM_STEP_MS);
        if input.idle_mode {
            autoplay(session);
        }
        session.step(step);
        remaining -= step;
    }
}

/// Demo autoplayer: taps worms after a human-ish reaction delay and uses
/// power-ups when they help
fn autoplay(session: &mut Session) {
    if !session.is_interactive() {
        return;
    }
    let now = session.time_ms();

    let ripe: Vec<u32> = session
        .board()
        .active_worms()
        .filter(|w| w.age_ms(now) >= IDLE_REACTION_MS)
        .map(|w| w.id)
        .collect();
    for id in ripe {
        session.squash(id);
    }

    let active = session.board().active_worms().count();
    let damaged = session
        .board()
        .grid()
        .cells()
        .any(|(_, h)| h < MAX_HEALTH);
    let wanted = session.powerups().live().iter().find(|p| {
        !p.is_expired(now)
            && match p.kind {
                PowerUpKind::Pesticide => active >= 3,
                PowerUpKind::Shield => !session.shield_active() && active >= 2,
                PowerUpKind::Fertilizer => damaged,
            }
    });
    if let Some(id) = wanted.map(|p| p.id) {
        session.activate_power_up(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use proptest::prelude::*;

    fn new_session(seed: u64) -> Session {
        Session::new(seed, Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_tick_menu_to_playing() {
        let mut session = new_session(12345);
        assert_eq!(session.phase(), GamePhase::Menu);

        tick(&mut session, &TickInput::default(), 1000);
        assert_eq!(session.phase(), GamePhase::Menu);

        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut session, &input, SIM_STEP_MS);
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.time_ms(), SIM_STEP_MS as u64);
    }

    #[test]
    fn test_tick_splits_large_delta() {
        let mut session = new_session(1);
        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut session, &start, 0);
        // One big frame still produces the same worms as many small ones
        tick(&mut session, &TickInput::default(), 2805);
        assert_eq!(session.time_ms(), 2805);
        assert_eq!(session.board().worms().len(), 2);
    }

    #[test]
    fn test_tap_beats_expiry_in_same_frame() {
        let mut session = new_session(2);
        tick(
            &mut session,
            &TickInput {
                start: true,
                ..Default::default()
            },
            0,
        );
        let id = session
            .board_mut()
            .spawn_worm_at(crate::CellCoord::new(0, 0), 0)
            .unwrap()
            .id;
        tick(&mut session, &TickInput::default(), WORM_LIFETIME_MS as u32);
        // The decay scan that would expire it falls in the next frame
        let input = TickInput {
            taps: vec![id],
            ..Default::default()
        };
        tick(&mut session, &input, 100);
        assert_eq!(session.lives(), MAX_LIVES);
        assert_eq!(session.combo(), 1);
    }

    #[test]
    fn test_idle_mode_survives() {
        let mut session = new_session(77);
        let input = TickInput {
            start: true,
            idle_mode: true,
            ..Default::default()
        };
        tick(&mut session, &input, 0);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut session, &input, 100);
        }
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.lives(), MAX_LIVES);
        assert!(session.score() > 0);
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed and inputs end up identical
        let mut a = new_session(99999);
        let mut b = new_session(99999);
        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut a, &start, 16);
        tick(&mut b, &start, 16);
        for _ in 0..500 {
            tick(&mut a, &TickInput::default(), 16);
            tick(&mut b, &TickInput::default(), 16);
        }
        assert_eq!(a.board().worms(), b.board().worms());
        assert_eq!(a.board().grid(), b.board().grid());
        assert_eq!(a.lives(), b.lives());
    }

    #[derive(Debug, Clone)]
    enum Action {
        Wait(u32),
        TapOldest,
        TapNewest,
        ActivateFirst,
        Shield,
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (1u32..2000).prop_map(Action::Wait),
            Just(Action::TapOldest),
            Just(Action::TapNewest),
            Just(Action::ActivateFirst),
            Just(Action::Shield),
        ]
    }

    proptest! {
        #[test]
        fn prop_bounds_hold(seed in any::<u64>(), actions in prop::collection::vec(action(), 1..120)) {
            let mut session = new_session(seed);
            session.start();
            for action in actions {
                let mut input = TickInput::default();
                let mut dt = 0;
                match action {
                    Action::Wait(ms) => dt = ms,
                    Action::TapOldest => input.taps.extend(session.board().active_worms().map(|w| w.id).next()),
                    Action::TapNewest => input.taps.extend(session.board().active_worms().map(|w| w.id).last()),
                    Action::ActivateFirst => input.activations.extend(session.powerups().live().first().map(|p| p.id)),
                    Action::Shield => session.activate_shield(),
                }
                tick(&mut session, &input, dt);

                prop_assert!(session.lives() <= MAX_LIVES);
                prop_assert!(session.board().grid().cells().all(|(_, h)| h <= MAX_HEALTH));
                prop_assert!(session.powerups().unexpired_count(session.time_ms()) <= MAX_POWERUPS);
                prop_assert!(session.powerups().live().len() <= MAX_POWERUPS);
                prop_assert_eq!(session.difficulty(), crate::difficulty_for_score(session.score()));
            }
        }

        #[test]
        fn prop_squash_scores_by_combo(seed in any::<u64>(), taps in 1usize..12) {
            let mut session = new_session(seed);
            session.start();
            let ids: Vec<u32> = (0..taps)
                .filter_map(|_| session.board_mut().spawn_worm_at(crate::CellCoord::new(1, 1), 0))
                .map(|w| w.id)
                .collect();
            for id in ids {
                let before_combo = session.combo();
                let before_score = session.score();
                let points = session.squash(id);
                prop_assert_eq!(session.combo(), before_combo + 1);
                prop_assert_eq!(points, Some(crate::squash_points(before_combo + 1)));
                prop_assert_eq!(session.score(), before_score + crate::squash_points(before_combo + 1));
            }
        }

        #[test]
        fn prop_damage_always_resets_combo(seed in any::<u64>(), squashes in 1usize..8) {
            let mut session = new_session(seed);
            session.start();
            let cell = crate::CellCoord::new(2, 3);
            let doomed = session.board_mut().spawn_worm_at(cell, 0).map(|w| w.id);
            for _ in 0..squashes {
                if let Some(worm) = session.board_mut().spawn_worm_at(cell, 0) {
                    session.squash(worm.id);
                }
            }
            prop_assert!(doomed.is_some());
            prop_assert_eq!(session.combo(), squashes as u32);
            tick(&mut session, &TickInput::default(), WORM_LIFETIME_MS as u32 + 100);
            prop_assert_eq!(session.combo(), 0);
            prop_assert!(session.lives() < MAX_LIVES);
        }
    }
}
