//! The corn field: plot health, worms, and the spawn/decay timers
//!
//! The board knows nothing about score or lives. It reports what happened
//! (spawns, expiries, damage) and the session controller turns that into
//! score, combo and life changes.

use rand::Rng;

use super::state::{GameEvent, Grid, Worm};
use super::timer::Interval;
use crate::consts::*;
use crate::{CellCoord, spawn_interval_ms};

/// Controller-to-board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Timers only run while active
    pub active: bool,
    /// Difficulty level (drives spawn cadence)
    pub difficulty: u32,
    /// Damage immunity (shield)
    pub immune: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            active: false,
            difficulty: 1,
            immune: false,
        }
    }
}

/// Outcome of one or more decay scans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Cells of worms that expired, one entry per worm
    pub expired: Vec<CellCoord>,
    /// Whether the expiries damaged plots (false under immunity)
    pub damaged: bool,
}

impl DecayReport {
    /// Lives the player should lose for this report
    pub fn lives_lost(&self) -> usize {
        if self.damaged { self.expired.len() } else { 0 }
    }

    fn merge(&mut self, other: DecayReport) {
        self.damaged |= other.damaged;
        self.expired.extend(other.expired);
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    worms: Vec<Worm>,
    config: BoardConfig,
    spawn_timer: Interval,
    decay_timer: Interval,
    next_id: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        let config = BoardConfig::default();
        Self {
            grid: Grid::new(),
            worms: Vec::new(),
            config,
            spawn_timer: Interval::new(spawn_interval_ms(config.difficulty)),
            decay_timer: Interval::new(DECAY_TICK_MS),
            next_id: 1,
        }
    }

    /// Fresh field for a new game (keeps configuration)
    pub fn reset(&mut self) {
        self.grid = Grid::new();
        self.worms.clear();
        self.spawn_timer.reset();
        self.decay_timer.reset();
        self.next_id = 1;
    }

    pub fn configure(&mut self, config: BoardConfig) {
        if config.difficulty != self.config.difficulty {
            self.spawn_timer
                .set_period(spawn_interval_ms(config.difficulty));
        }
        if !config.active && self.config.active {
            // Leaving play: tear the timers down
            self.spawn_timer.reset();
            self.decay_timer.reset();
        }
        self.config = config;
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Worms still on the board (includes those squashed this step until the next scan)
    pub fn worms(&self) -> &[Worm] {
        &self.worms
    }

    pub fn active_worms(&self) -> impl Iterator<Item = &Worm> {
        self.worms.iter().filter(|w| w.is_active())
    }

    pub fn spawn_interval_ms(&self) -> u32 {
        self.spawn_timer.period_ms()
    }

    /// Advance the board's timers by `dt_ms` ending at `now_ms`
    pub fn advance<R: Rng>(
        &mut self,
        now_ms: u64,
        dt_ms: u32,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> DecayReport {
        let mut report = DecayReport::default();
        if !self.config.active {
            return report;
        }

        for _ in 0..self.spawn_timer.advance(dt_ms) {
            if let Some(worm) = self.spawn_worm(now_ms, rng) {
                events.push(GameEvent::WormSpawned {
                    id: worm.id,
                    cell: worm.cell,
                });
            }
        }

        for _ in 0..self.decay_timer.advance(dt_ms) {
            let scan = self.decay(now_ms);
            if !scan.expired.is_empty() {
                events.push(GameEvent::WormsExpired {
                    cells: scan.expired.clone(),
                    damaged: scan.damaged,
                });
            }
            report.merge(scan);
        }

        report
    }

    /// Place a worm on a random living plot
    pub fn spawn_worm<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> Option<Worm> {
        let living = self.grid.living_cells();
        if living.is_empty() {
            return None;
        }
        let cell = living[rng.random_range(0..living.len())];
        self.spawn_worm_at(cell, now_ms)
    }

    /// Place a worm on a specific plot (must be on the grid and alive)
    pub fn spawn_worm_at(&mut self, cell: CellCoord, now_ms: u64) -> Option<Worm> {
        if !self.grid.is_alive(cell) {
            return None;
        }
        let worm = Worm::new(self.next_id, cell, now_ms);
        self.next_id += 1;
        log::debug!("Worm {} spawned at {}", worm.id, cell);
        self.worms.push(worm.clone());
        Some(worm)
    }

    /// Expire old worms, apply damage (unless immune), and sweep dead entries
    pub fn decay(&mut self, now_ms: u64) -> DecayReport {
        let mut expired = Vec::new();
        for worm in self.worms.iter_mut().filter(|w| w.is_active()) {
            if worm.age_ms(now_ms) > WORM_LIFETIME_MS {
                worm.expired = true;
                expired.push(worm.cell);
            }
        }

        let damaged = !expired.is_empty() && !self.config.immune;
        if damaged {
            for &cell in &expired {
                let health = self.grid.damage(cell);
                log::debug!("Plot {} bitten, health {}", cell, health);
            }
        }

        self.worms.retain(|w| w.is_active());
        DecayReport { expired, damaged }
    }

    /// Squash an active worm. Returns its cell, or None if it is not tappable.
    pub fn squash(&mut self, worm_id: u32) -> Option<CellCoord> {
        let worm = self
            .worms
            .iter_mut()
            .find(|w| w.id == worm_id && w.is_active())?;
        worm.squashed = true;
        Some(worm.cell)
    }

    /// Squash every active worm; returns how many were cleared
    pub fn clear_all(&mut self) -> usize {
        let mut cleared = 0;
        for worm in self.worms.iter_mut().filter(|w| w.is_active()) {
            worm.squashed = true;
            cleared += 1;
        }
        cleared
    }

    /// Fertilize: the most damaged living plot gains up to two health.
    /// With no damaged living plot, the first dead plot is revived instead.
    pub fn heal(&mut self) -> Option<(CellCoord, u8)> {
        let target = self
            .grid
            .cells()
            .filter(|&(_, h)| h > 0 && h < MAX_HEALTH)
            .min_by_key(|&(_, h)| h)
            .or_else(|| self.grid.cells().find(|&(_, h)| h == 0))
            .map(|(cell, _)| cell)?;
        let health = self.grid.heal(target, FERTILIZER_HEAL);
        Some((target, health))
    }
}
