//! Game rules for Gridwar.
//!
//! Everything here is synchronous and free of I/O:
//!
//! - [`Shape`] and [`rotate`]: unit templates and quarter turns.
//! - [`try_place`]: validates a rotated, translated unit against a [`Board`].
//! - [`Board`]: one player's grid, units, and attack marks.
//! - [`Session`]: the two-player state machine that turns intents into
//!   addressed [`ServerEvent`](gridwar_protocol::ServerEvent)s.
//!
//! The registry crate wraps each [`Session`] in an actor; tests drive it
//! directly.

mod board;
mod config;
mod error;
mod placement;
mod session;
mod shape;

pub use board::{Board, CellStatus, Unit};
pub use config::{GameConfig, UnitKind};
pub use error::{ConfigError, GameError, ShapeError};
pub use placement::{Placement, try_place};
pub use session::{Outbound, Session};
pub use shape::{Shape, rotate};
