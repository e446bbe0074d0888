//! Wire protocol for Gridwar.
//!
//! This crate defines the "language" clients and the server speak:
//!
//! - **Types** ([`ClientIntent`], [`ServerEvent`], [`Coord`], [`Phase`], …)
//!   are the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) decide how those structures are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (ClientIntent / ServerEvent) → Registry → Engine
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AttackOutcome, CellView, ClientIntent, Coord, Orientation, Phase, PlayerSlot, Recipient,
    RejectReason, ServerEvent, SessionId,
};
