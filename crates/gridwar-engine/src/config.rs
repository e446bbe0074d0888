//! Game configuration: board size, unit template, and fleet size.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Shape};

// ---------------------------------------------------------------------------
// UnitKind
// ---------------------------------------------------------------------------

/// Which template every unit in a session uses.
///
/// The engine itself only ever sees the resulting [`Shape`]; this enum is
/// the configuration surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitKind {
    /// A straight ship with no critical cell; destroyed when every cell is hit.
    Ship { length: usize },
    /// The cross plane; destroyed by a hit on its nose.
    Plane,
    /// Any validated shape.
    Custom { shape: Shape },
}

impl UnitKind {
    /// Builds the template shape for this kind.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Ship { length } => Shape::line(*length),
            Self::Plane => Shape::plane(),
            Self::Custom { shape } => shape.clone(),
        }
    }
}

impl Default for UnitKind {
    fn default() -> Self {
        Self::Plane
    }
}

/// Parses `"plane"` or `"ship:<length>"`.
impl FromStr for UnitKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "plane" {
            return Ok(Self::Plane);
        }
        if let Some(length) = s.strip_prefix("ship:") {
            let length: usize = length
                .parse()
                .map_err(|_| ConfigError::InvalidUnitKind(s.clone()))?;
            if length > 0 {
                return Ok(Self::Ship { length });
            }
        }
        Err(ConfigError::InvalidUnitKind(s))
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Per-session rules.
///
/// The defaults reproduce the classic plane game: a 10×10 board and two
/// planes per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Side length of each square board.
    pub board_size: i32,

    /// Template shared by every unit.
    pub unit: UnitKind,

    /// How many units each player must place before combat starts.
    pub units_per_player: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 10,
            unit: UnitKind::Plane,
            units_per_player: 2,
        }
    }
}

impl GameConfig {
    /// Largest supported board side.
    pub const MAX_BOARD_SIZE: i32 = 26;

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called by [`Session::new`](crate::Session::new). `board_size` is
    /// kept within `1..=MAX_BOARD_SIZE` and `units_per_player` is at least 1.
    pub fn validated(mut self) -> Self {
        if !(1..=Self::MAX_BOARD_SIZE).contains(&self.board_size) {
            let clamped = self.board_size.clamp(1, Self::MAX_BOARD_SIZE);
            tracing::warn!(
                board_size = self.board_size,
                clamped,
                "board_size out of range, clamping"
            );
            self.board_size = clamped;
        }
        if self.units_per_player == 0 {
            tracing::warn!("units_per_player is 0, using 1");
            self.units_per_player = 1;
        }
        self
    }
}
