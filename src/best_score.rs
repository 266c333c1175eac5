//! Best score tracking
//!
//! A single scalar persisted across sessions. Absent or malformed stored
//! values count as zero.

use serde::{Deserialize, Serialize};

use crate::persistence::Storage;

/// Best score ever reached on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BestScore {
    pub score: u64,
}

impl BestScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "cornfield_worms_best_score";

    pub fn new(score: u64) -> Self {
        Self { score }
    }

    /// Parse a stored value, falling back to zero
    pub fn parse(raw: &str) -> u64 {
        serde_json::from_str::<u64>(raw.trim()).unwrap_or(0)
    }

    /// Whether a finished run beats the record
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.score
    }

    /// Record a finished run. Returns true if it set a new best.
    pub fn submit(&mut self, score: u64) -> bool {
        if !self.qualifies(score) {
            return false;
        }
        self.score = score;
        true
    }

    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get(Self::STORAGE_KEY) {
            Some(raw) => {
                let score = Self::parse(&raw);
                log::info!("Loaded best score {}", score);
                Self::new(score)
            }
            None => {
                log::info!("No best score found, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        if storage.set(Self::STORAGE_KEY, &self.score.to_string()) {
            log::info!("Best score saved ({})", self.score);
        } else {
            log::warn!("Failed to save best score");
        }
    }
}
