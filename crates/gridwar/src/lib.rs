//! # Gridwar
//!
//! Server for two-player, turn-based grid battle games: each player hides a
//! fleet of shaped units on their own board, then both take turns firing
//! at the other's board until one fleet is destroyed.
//!
//! Clients connect over WebSocket and speak JSON. The upgrade path picks
//! the session:
//!
//! - `/ws` or `/ws/match`: pair with the next waiting player
//! - `/ws/new`: open a session and share its id
//! - `/ws/{session_id}`: join that session
//! - `/ws/{session_id}/info`: receive one `session_info` event, then close
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridwar::prelude::*;
//!
//! # async fn start() -> Result<(), GridwarError> {
//! let server = GridwarServer::builder()
//!     .bind("0.0.0.0:8000")
//!     .game_config(GameConfig {
//!         unit: UnitKind::Ship { length: 4 },
//!         ..GameConfig::default()
//!     })
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::GridwarError;
pub use server::{GridwarServer, GridwarServerBuilder};

/// Common imports for running a server or writing a client.
pub mod prelude {
    pub use crate::{GridwarError, GridwarServer, GridwarServerBuilder};
    pub use gridwar_engine::{GameConfig, Shape, UnitKind};
    pub use gridwar_protocol::{
        AttackOutcome, CellView, ClientIntent, Codec, Coord, JsonCodec, Orientation, Phase,
        PlayerSlot, RejectReason, ServerEvent, SessionId,
    };
    pub use gridwar_registry::RegistryConfig;
}
