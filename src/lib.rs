//! Cornfield Worms - A whack-a-worm arcade game
//!
//! Core modules:
//! - `sim`: Game simulation (timers, board, power-ups, session controller)
//! - `audio`: Owned audio session (Web Audio cues on wasm)
//! - `layout`: Pointer-to-cell hit testing
//! - `persistence`: Key/value storage backends
//! - `platform`: Browser/native platform helpers

pub mod audio;
pub mod best_score;
pub mod layout;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use audio::{AudioCue, AudioSession};
pub use best_score::BestScore;
pub use layout::BoardLayout;
pub use settings::Settings;

use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step in milliseconds
    pub const SIM_STEP_MS: u32 = 10;
    /// Maximum frame delta fed into the simulation (tab switches, stalls)
    pub const MAX_FRAME_MS: u32 = 250;

    /// Grid dimensions (fixed)
    pub const GRID_ROWS: usize = 4;
    pub const GRID_COLS: usize = 4;
    /// Corn plot health
    pub const MAX_HEALTH: u8 = 3;

    /// Player lives
    pub const MAX_LIVES: u8 = 5;

    /// Worm spawn cadence: base minus a step per difficulty level, floored
    pub const SPAWN_BASE_MS: u32 = 1500;
    pub const SPAWN_STEP_MS: u32 = 100;
    pub const SPAWN_FLOOR_MS: u32 = 600;
    /// Decay scan cadence
    pub const DECAY_TICK_MS: u32 = 100;
    /// Worm lifetime before it bites
    pub const WORM_LIFETIME_MS: u64 = 3000;

    /// Scoring
    pub const POINTS_PER_SQUASH: u64 = 10;
    pub const MAX_COMBO_MULTIPLIER: u32 = 5;
    pub const POINTS_PER_CLEARED_WORM: u64 = 5;
    /// Score needed per difficulty level
    pub const SCORE_PER_LEVEL: u64 = 50;

    /// Power-ups
    pub const POWERUP_SPAWN_MS: u32 = 12_000;
    pub const POWERUP_EXPIRY_CHECK_MS: u32 = 1000;
    pub const POWERUP_LIFETIME_MS: u64 = 10_000;
    pub const MAX_POWERUPS: usize = 3;
    pub const SHIELD_DURATION_MS: u32 = 5000;
    pub const FERTILIZER_HEAL: u8 = 2;

    /// Delay between the last life lost and the game-over transition
    pub const GAME_OVER_DELAY_MS: u32 = 300;
}

/// Grid cell coordinate (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major index into the grid
    #[inline]
    pub fn index(&self) -> usize {
        self.row * consts::GRID_COLS + self.col
    }

    /// Inverse of [`CellCoord::index`]
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self::new(index / consts::GRID_COLS, index % consts::GRID_COLS)
    }

    /// Whether the coordinate lies on the grid
    #[inline]
    pub fn in_bounds(&self) -> bool {
        self.row < consts::GRID_ROWS && self.col < consts::GRID_COLS
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

/// Difficulty level for a score: one level per 50 points, starting at 1
#[inline]
pub fn difficulty_for_score(score: u64) -> u32 {
    let level = 1 + score / consts::SCORE_PER_LEVEL;
    level.min(u32::MAX as u64) as u32
}

/// Worm spawn cadence for a difficulty level
#[inline]
pub fn spawn_interval_ms(level: u32) -> u32 {
    consts::SPAWN_BASE_MS
        .saturating_sub(consts::SPAWN_STEP_MS.saturating_mul(level))
        .max(consts::SPAWN_FLOOR_MS)
}

/// Points for a squash at the given (already incremented) combo
#[inline]
pub fn squash_points(combo: u32) -> u64 {
    consts::POINTS_PER_SQUASH * combo.min(consts::MAX_COMBO_MULTIPLIER) as u64
}
