//! Session registry: creates, tracks, and routes players to sessions.

use std::collections::HashMap;

use gridwar_engine::GameConfig;
use gridwar_protocol::{ClientIntent, PlayerSlot, SessionId};
use rand::Rng;

use crate::actor::spawn_session;
use crate::{PlayerSender, RegistryConfig, RegistryError, SessionHandle, SessionInfo};

/// A registered session.
struct Entry {
    handle: SessionHandle,
    /// Offered to pairing requests. Sessions created by id are never
    /// pairable; pairing clears the flag once a session's second seat is
    /// taken or its actor stops answering.
    pairable: bool,
}

/// Owns every live session handle.
///
/// This is the entry point for session operations from the server. The
/// map itself is the only shared structure; per-session work happens in
/// the session actors.
pub struct SessionRegistry {
    config: RegistryConfig,
    sessions: HashMap<SessionId, Entry>,
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
        }
    }

    /// Creates a session that can only be joined by id.
    pub fn create_session(&mut self, game_config: GameConfig) -> SessionId {
        self.spawn(game_config, false)
    }

    fn spawn(&mut self, game_config: GameConfig, pairable: bool) -> SessionId {
        let session_id = loop {
            let candidate = SessionId(generate_session_id());
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle = spawn_session(session_id.clone(), game_config, self.config.channel_size);
        self.sessions
            .insert(session_id.clone(), Entry { handle, pairable });
        tracing::info!(%session_id, pairable, "session created");
        session_id
    }

    /// Seats a player in `session_id`.
    ///
    /// Returns the assigned slot together with a handle the caller should
    /// keep for routing that player's intents.
    pub async fn join(
        &self,
        session_id: &SessionId,
        sink: PlayerSender,
    ) -> Result<(PlayerSlot, SessionHandle), RegistryError> {
        let handle = self
            .handle(session_id)
            .ok_or_else(|| RegistryError::NotFound(session_id.clone()))?;
        let slot = handle.join(sink).await?;
        Ok((slot, handle))
    }

    /// Pairs the player into a waiting session, or opens a new one.
    ///
    /// Only sessions still flagged pairable are asked, so the search never
    /// touches sessions past `Waiting`. A session that refuses the join
    /// (full, or its actor stopped) loses the flag and the search moves on.
    pub async fn join_or_create(
        &mut self,
        game_config: GameConfig,
        sink: PlayerSender,
    ) -> Result<(SessionId, PlayerSlot, SessionHandle), RegistryError> {
        for (session_id, entry) in self.sessions.iter_mut().filter(|(_, e)| e.pairable) {
            match entry.handle.join(sink.clone()).await {
                Ok(slot) => {
                    if slot == PlayerSlot::Second {
                        entry.pairable = false;
                    }
                    return Ok((session_id.clone(), slot, entry.handle.clone()));
                }
                Err(e) => {
                    tracing::debug!(%session_id, error = %e, "session no longer pairable");
                    entry.pairable = false;
                }
            }
        }

        let session_id = self.spawn(game_config, true);
        let (slot, handle) = self.join(&session_id, sink).await?;
        Ok((session_id, slot, handle))
    }

    /// Routes an intent to a session.
    pub async fn route(
        &self,
        session_id: &SessionId,
        slot: PlayerSlot,
        intent: ClientIntent,
    ) -> Result<(), RegistryError> {
        self.existing(session_id)?.send_intent(slot, intent).await
    }

    /// Reports a closed connection to its session.
    pub async fn disconnect(
        &self,
        session_id: &SessionId,
        slot: PlayerSlot,
    ) -> Result<(), RegistryError> {
        self.existing(session_id)?.disconnect(slot).await
    }

    pub async fn session_info(&self, session_id: &SessionId) -> Result<SessionInfo, RegistryError> {
        self.existing(session_id)?.get_info().await
    }

    /// Returns a cloned handle, if the session is registered.
    pub fn handle(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(session_id).map(|e| e.handle.clone())
    }

    fn existing(&self, session_id: &SessionId) -> Result<&SessionHandle, RegistryError> {
        self.sessions
            .get(session_id)
            .map(|e| &e.handle)
            .ok_or_else(|| RegistryError::NotFound(session_id.clone()))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }

    /// Drops the handles of sessions whose actor has stopped. Returns how
    /// many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, e| !e.handle.is_closed());
        let removed = before - self.sessions.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.sessions.len(), "pruned stopped sessions");
        }
        removed
    }

    /// Shuts a session down and forgets it.
    pub async fn remove_session(&mut self, session_id: &SessionId) -> Result<(), RegistryError> {
        let entry = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| RegistryError::NotFound(session_id.clone()))?;
        let _ = entry.handle.shutdown().await;
        tracing::info!(%session_id, "session removed");
        Ok(())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

/// 128 random bits as 32 lowercase hex characters.
fn generate_session_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
