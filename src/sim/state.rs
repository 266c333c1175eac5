//! Game state and core simulation types

use serde::{Deserialize, Serialize};

use crate::CellCoord;
use crate::consts::*;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing running
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Run ended
    GameOver,
}

/// Corn plot health, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    health: [u8; GRID_ROWS * GRID_COLS],
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            health: [MAX_HEALTH; GRID_ROWS * GRID_COLS],
        }
    }
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Health of a cell (0 for off-grid coordinates)
    pub fn health(&self, cell: CellCoord) -> u8 {
        if !cell.in_bounds() {
            return 0;
        }
        self.health[cell.index()]
    }

    /// Set health, clamped to [0, MAX_HEALTH]
    pub fn set_health(&mut self, cell: CellCoord, health: u8) {
        if cell.in_bounds() {
            self.health[cell.index()] = health.min(MAX_HEALTH);
        }
    }

    /// Remove one health point, floored at 0. Returns the new health.
    pub fn damage(&mut self, cell: CellCoord) -> u8 {
        let health = self.health(cell).saturating_sub(1);
        self.set_health(cell, health);
        health
    }

    /// Add health, capped at MAX_HEALTH. Returns the new health.
    pub fn heal(&mut self, cell: CellCoord, amount: u8) -> u8 {
        let health = self.health(cell).saturating_add(amount).min(MAX_HEALTH);
        self.set_health(cell, health);
        health
    }

    pub fn is_alive(&self, cell: CellCoord) -> bool {
        self.health(cell) > 0
    }

    /// All cells with their health, row-major
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, u8)> + '_ {
        self.health
            .iter()
            .enumerate()
            .map(|(i, &h)| (CellCoord::from_index(i), h))
    }

    /// Cells with health > 0, row-major
    pub fn living_cells(&self) -> Vec<CellCoord> {
        self.cells()
            .filter(|&(_, h)| h > 0)
            .map(|(c, _)| c)
            .collect()
    }

    pub fn dead_count(&self) -> usize {
        self.health.iter().filter(|&&h| h == 0).count()
    }
}

/// A worm occupying a corn plot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worm {
    pub id: u32,
    pub cell: CellCoord,
    /// Simulation time (ms) the worm appeared
    pub spawned_at_ms: u64,
    /// Tapped by the player (or cleared by pesticide)
    pub squashed: bool,
    /// Outlived its lifetime and bit the plot
    pub expired: bool,
}

impl Worm {
    pub fn new(id: u32, cell: CellCoord, now_ms: u64) -> Self {
        Self {
            id,
            cell,
            spawned_at_ms: now_ms,
            squashed: false,
            expired: false,
        }
    }

    /// Still on the board and tappable
    pub fn is_active(&self) -> bool {
        !self.squashed && !self.expired
    }

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.spawned_at_ms)
    }

    /// Fraction of lifetime used, 0-1 (for rendering urgency)
    pub fn urgency(&self, now_ms: u64) -> f32 {
        (self.age_ms(now_ms) as f32 / WORM_LIFETIME_MS as f32).min(1.0)
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Clears every worm on the board
    Pesticide,
    /// Temporary damage immunity
    Shield,
    /// Heals the most damaged plot
    Fertilizer,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::Pesticide,
        PowerUpKind::Shield,
        PowerUpKind::Fertilizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Pesticide => "pesticide",
            PowerUpKind::Shield => "shield",
            PowerUpKind::Fertilizer => "fertilizer",
        }
    }
}

/// A collectible power-up waiting to be activated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub spawned_at_ms: u64,
    pub expires_at_ms: u64,
}

impl PowerUp {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// 0.0 when spawned, 1.0 at expiry
    pub fn urgency(&self, now_ms: u64) -> f32 {
        let lifetime = self.expires_at_ms.saturating_sub(self.spawned_at_ms);
        if lifetime == 0 {
            return 1.0;
        }
        let age = now_ms.saturating_sub(self.spawned_at_ms);
        (age as f32 / lifetime as f32).min(1.0)
    }
}

/// Notifications emitted by the simulation for the view and audio session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged(GamePhase),
    ScoreChanged(u64),
    LivesChanged(u8),
    DifficultyChanged(u32),
    WormSpawned { id: u32, cell: CellCoord },
    WormSquashed { id: u32, cell: CellCoord, combo: u32, points: u64 },
    /// Worms that outlived their lifetime; `damaged` is false under a shield
    WormsExpired { cells: Vec<CellCoord>, damaged: bool },
    ComboReset,
    PowerUpSpawned { id: u32, kind: PowerUpKind },
    PowerUpExpired { id: u32 },
    PowerUpActivated { id: u32, kind: PowerUpKind },
    /// Pesticide wiped the board (visual pulse)
    FieldCleared { worms: usize },
    ShieldChanged(bool),
    CellHealed { cell: CellCoord, health: u8 },
    AmbientStarted,
    AmbientStopped,
    GameOver { score: u64, best: u64, new_best: bool },
}
