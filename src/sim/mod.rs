//! Game simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches the
//! browser:
//! - Time only advances through `tick` (simulated milliseconds)
//! - Seeded RNG only
//! - Events out, no callbacks into rendering or audio

pub mod board;
pub mod powerup;
pub mod session;
pub mod state;
pub mod tick;
pub mod timer;

pub use board::{Board, BoardConfig, DecayReport};
pub use powerup::PowerUpCycle;
pub use session::Session;
pub use state::{GameEvent, GamePhase, Grid, PowerUp, PowerUpKind, Worm};
pub use tick::{TickInput, tick};
pub use timer::{Countdown, Interval};
