//! Error types for the engine.

use gridwar_protocol::{Coord, Phase, RejectReason};

/// A rejected intent or admission.
///
/// Every variant is recoverable: the session reports it to the offending
/// player and leaves its state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// A unit cell or attack target falls outside the board.
    #[error("cell {0} is outside the board")]
    OutOfBounds(Coord),

    /// A unit cell is already occupied by another unit.
    #[error("cell {0} is already occupied")]
    Overlap(Coord),

    /// The player already placed the configured number of units.
    #[error("all {0} units are already placed")]
    CapacityExceeded(usize),

    /// An attack arrived from the player who is not on turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The target cell was already hit or missed.
    #[error("cell {0} was already attacked")]
    AlreadyAttacked(Coord),

    /// The intent is not valid in the session's current phase.
    #[error("not allowed while the session is {0}")]
    WrongPhase(Phase),

    /// Both seats are taken.
    #[error("session is full")]
    SessionFull,
}

impl GameError {
    /// The wire reason reported to the client.
    pub fn reason(&self) -> RejectReason {
        match self {
            Self::OutOfBounds(_) => RejectReason::OutOfBounds,
            Self::Overlap(_) => RejectReason::Overlap,
            Self::CapacityExceeded(_) => RejectReason::CapacityExceeded,
            Self::NotYourTurn => RejectReason::NotYourTurn,
            Self::AlreadyAttacked(_) => RejectReason::AlreadyAttacked,
            Self::WrongPhase(_) => RejectReason::WrongPhase,
            Self::SessionFull => RejectReason::SessionFull,
        }
    }
}

/// Errors raised while building a [`Shape`](crate::Shape).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("a shape needs at least one cell")]
    Empty,

    #[error("offset {0} appears more than once")]
    DuplicateOffset(Coord),

    #[error("critical index {index} is out of range for {len} cells")]
    CriticalOutOfRange { index: usize, len: usize },
}

/// Errors raised while parsing configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown unit kind {0:?} (expected \"plane\" or \"ship:<length>\")")]
    InvalidUnitKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_maps_each_variant() {
        assert_eq!(
            GameError::OutOfBounds(Coord::new(-1, 3)).reason(),
            RejectReason::OutOfBounds
        );
        assert_eq!(GameError::NotYourTurn.reason(), RejectReason::NotYourTurn);
        assert_eq!(
            GameError::WrongPhase(Phase::Waiting).reason(),
            RejectReason::WrongPhase
        );
        assert_eq!(GameError::SessionFull.reason(), RejectReason::SessionFull);
    }

    #[test]
    fn test_display_includes_coordinate() {
        let err = GameError::AlreadyAttacked(Coord::new(2, 7));
        assert_eq!(err.to_string(), "cell (2, 7) was already attacked");
    }
}
