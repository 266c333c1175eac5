//! Power-up spawn and expiry cadence
//!
//! Effects are dispatched by the session controller; this module only owns
//! which power-ups are waiting to be collected.

use rand::Rng;

use super::state::{GameEvent, PowerUp, PowerUpKind};
use super::timer::Interval;
use crate::consts::*;

#[derive(Debug, Clone)]
pub struct PowerUpCycle {
    live: Vec<PowerUp>,
    spawn_timer: Interval,
    expiry_timer: Interval,
    next_id: u32,
}

impl Default for PowerUpCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerUpCycle {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            spawn_timer: Interval::new(POWERUP_SPAWN_MS),
            expiry_timer: Interval::new(POWERUP_EXPIRY_CHECK_MS),
            next_id: 1,
        }
    }

    /// Drop every power-up and restart both cadences
    pub fn reset(&mut self) {
        self.live.clear();
        self.cancel_timers();
        self.next_id = 1;
    }

    pub fn cancel_timers(&mut self) {
        self.spawn_timer.reset();
        self.expiry_timer.reset();
    }

    /// Power-ups waiting to be collected (may include ones past expiry until the next check)
    pub fn live(&self) -> &[PowerUp] {
        &self.live
    }

    pub fn unexpired_count(&self, now_ms: u64) -> usize {
        self.live.iter().filter(|p| !p.is_expired(now_ms)).count()
    }

    /// Ids a player can still activate, in spawn order
    pub fn unexpired_ids(&self, now_ms: u64) -> Vec<u32> {
        self.live
            .iter()
            .filter(|p| !p.is_expired(now_ms))
            .map(|p| p.id)
            .collect()
    }

    pub fn advance<R: Rng>(
        &mut self,
        now_ms: u64,
        dt_ms: u32,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        for _ in 0..self.spawn_timer.advance(dt_ms) {
            if let Some(powerup) = self.spawn(now_ms, rng) {
                events.push(GameEvent::PowerUpSpawned {
                    id: powerup.id,
                    kind: powerup.kind,
                });
            }
        }

        for _ in 0..self.expiry_timer.advance(dt_ms) {
            for id in self.expire(now_ms) {
                events.push(GameEvent::PowerUpExpired { id });
            }
        }
    }

    /// Add a random power-up unless the cap is reached
    pub fn spawn<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> Option<PowerUp> {
        if self.unexpired_count(now_ms) >= MAX_POWERUPS {
            log::debug!("Power-up cap reached, skipping spawn");
            return None;
        }
        let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
        let powerup = PowerUp {
            id: self.next_id,
            kind,
            spawned_at_ms: now_ms,
            expires_at_ms: now_ms + POWERUP_LIFETIME_MS,
        };
        self.next_id += 1;
        log::debug!("Power-up {} ({}) spawned", powerup.id, kind.as_str());
        self.live.push(powerup.clone());
        Some(powerup)
    }

    /// Remove power-ups past their expiry, returning their ids
    pub fn expire(&mut self, now_ms: u64) -> Vec<u32> {
        let expired: Vec<u32> = self
            .live
            .iter()
            .filter(|p| p.is_expired(now_ms))
            .map(|p| p.id)
            .collect();
        self.live.retain(|p| !p.is_expired(now_ms));
        expired
    }

    /// Consume a power-up for activation
    pub fn take(&mut self, id: u32, now_ms: u64) -> Option<PowerUp> {
        let index = self
            .live
            .iter()
            .position(|p| p.id == id && !p.is_expired(now_ms))?;
        Some(self.live.remove(index))
    }
}
