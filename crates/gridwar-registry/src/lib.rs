//! Session registry for Gridwar.
//!
//! Each session runs as an isolated Tokio task (actor model) that owns its
//! [`Session`](gridwar_engine::Session); the registry owns the handles.
//!
//! # Key types
//!
//! - [`SessionRegistry`]: creates sessions, pairs and routes players
//! - [`SessionHandle`]: send commands to a running session actor
//! - [`SessionInfo`]: metadata snapshot of one session
//! - [`RegistryConfig`]: actor settings

mod actor;
mod config;
mod error;
mod registry;

pub use actor::{PlayerSender, SessionHandle, SessionInfo};
pub use config::RegistryConfig;
pub use error::RegistryError;
pub use registry::SessionRegistry;
