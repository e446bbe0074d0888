//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every session actor the registry spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Capacity of each session's command queue. When it fills up,
    /// senders wait.
    pub channel_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { channel_size: 64 }
    }
}
