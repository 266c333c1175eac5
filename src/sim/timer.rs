//! Scheduled tasks driven by simulated milliseconds
//!
//! Every periodic behaviour in the game (spawning, decay scans, power-up
//! cadence) is an [`Interval`]; one-shot deadlines (shield, game-over delay)
//! are a [`Countdown`]. Neither touches the wall clock.

use serde::{Deserialize, Serialize};

/// Repeating fixed-cadence timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    period_ms: u32,
    elapsed_ms: u32,
}

impl Interval {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            elapsed_ms: 0,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Change cadence, keeping time already accumulated toward the next fire
    pub fn set_period(&mut self, period_ms: u32) {
        self.period_ms = period_ms;
    }

    /// Drop accumulated time
    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
    }

    /// Advance by `dt_ms`, returning how many times the interval fired
    pub fn advance(&mut self, dt_ms: u32) -> u32 {
        if self.period_ms == 0 {
            return 0;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let fired = self.elapsed_ms / self.period_ms;
        self.elapsed_ms %= self.period_ms;
        fired
    }
}

/// One-shot deadline. Restarting re-arms to the full duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    duration_ms: u32,
    remaining_ms: Option<u32>,
}

impl Countdown {
    /// A disarmed countdown
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            remaining_ms: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.remaining_ms.is_some()
    }

    pub fn remaining_ms(&self) -> u32 {
        self.remaining_ms.unwrap_or(0)
    }

    /// Arm (or re-arm) to the full duration
    pub fn restart(&mut self) {
        self.remaining_ms = Some(self.duration_ms);
    }

    pub fn cancel(&mut self) {
        self.remaining_ms = None;
    }

    /// Advance by `dt_ms`; true only on the call where the deadline lapses
    pub fn advance(&mut self, dt_ms: u32) -> bool {
        match self.remaining_ms {
            Some(remaining) if remaining <= dt_ms => {
                self.remaining_ms = None;
                true
            }
            Some(remaining) => {
                self.remaining_ms = Some(remaining - dt_ms);
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_fires_on_cadence() {
        let mut interval = Interval::new(100);
        assert_eq!(interval.advance(40), 0);
        assert_eq!(interval.advance(60), 1);
        assert_eq!(interval.advance(250), 2);
        assert_eq!(interval.advance(50), 1);
    }

    #[test]
    fn test_interval_zero_period_never_fires() {
        let mut interval = Interval::new(0);
        assert_eq!(interval.advance(10_000), 0);
    }

    #[test]
    fn test_interval_set_period_keeps_progress() {
        let mut interval = Interval::new(1000);
        interval.advance(700);
        interval.set_period(800);
        assert_eq!(interval.advance(100), 1);
    }

    #[test]
    fn test_countdown_restart_does_not_stack() {
        let mut countdown = Countdown::new(5000);
        countdown.restart();
        assert!(!countdown.advance(3000));
        countdown.restart();
        assert_eq!(countdown.remaining_ms(), 5000);
        assert!(!countdown.advance(4990));
        assert!(countdown.advance(10));
        assert!(!countdown.is_running());
        assert!(!countdown.advance(10));
    }

    #[test]
    fn test_countdown_cancel() {
        let mut countdown = Countdown::new(300);
        countdown.restart();
        countdown.cancel();
        assert!(!countdown.advance(1000));
    }
}
