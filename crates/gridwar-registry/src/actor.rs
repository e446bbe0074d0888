//! Session actor: an isolated Tokio task that owns one [`Session`].
//!
//! Every command for a session goes through its bounded queue, so intents
//! are applied one at a time in arrival order and the session itself needs
//! no locking. Events come back out through per-player unbounded channels.

use gridwar_engine::{GameConfig, Outbound, Session};
use gridwar_protocol::{ClientIntent, Phase, PlayerSlot, ServerEvent, SessionId};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::RegistryError;

/// Channel sender for delivering events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a session actor through its queue.
pub(crate) enum SessionCommand {
    /// Seat a new player and register their event sink.
    Join {
        sink: PlayerSender,
        reply: oneshot::Sender<Result<PlayerSlot, RegistryError>>,
    },

    /// Apply an intent on behalf of a seated player.
    Intent {
        slot: PlayerSlot,
        intent: ClientIntent,
    },

    /// The player's connection is gone.
    Disconnect { slot: PlayerSlot },

    /// Request a metadata snapshot.
    GetInfo { reply: oneshot::Sender<SessionInfo> },

    /// Stop the actor.
    Shutdown,
}

/// A snapshot of session metadata. Never includes board contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub phase: Phase,
    /// Whose turn it is, while `Playing`.
    pub current_turn: Option<PlayerSlot>,
    /// Connection flag per slot, `player1` first.
    pub players_connected: [bool; 2],
    pub winner: Option<PlayerSlot>,
}

impl From<SessionInfo> for ServerEvent {
    fn from(info: SessionInfo) -> Self {
        ServerEvent::SessionInfo {
            session_id: info.session_id,
            phase: info.phase,
            current_turn: info.current_turn,
            players_connected: info.players_connected,
            winner: info.winner,
        }
    }
}

/// Handle to a running session actor.
///
/// Cheap to clone; connection handlers keep their own copy so they never
/// go back through the registry for per-intent work.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn unavailable(&self) -> RegistryError {
        RegistryError::Unavailable(self.session_id.clone())
    }

    /// Asks the session to seat a new player whose events go to `sink`.
    pub async fn join(&self, sink: PlayerSender) -> Result<PlayerSlot, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Join {
                sink,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Queues an intent (fire-and-forget). The outcome arrives as events.
    pub async fn send_intent(
        &self,
        slot: PlayerSlot,
        intent: ClientIntent,
    ) -> Result<(), RegistryError> {
        self.sender
            .send(SessionCommand::Intent { slot, intent })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Reports that `slot`'s connection closed.
    pub async fn disconnect(&self, slot: PlayerSlot) -> Result<(), RegistryError> {
        self.sender
            .send(SessionCommand::Disconnect { slot })
            .await
            .map_err(|_| self.unavailable())
    }

    pub async fn get_info(&self) -> Result<SessionInfo, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn shutdown(&self) -> Result<(), RegistryError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The actor state. Runs inside a Tokio task.
struct SessionActor {
    session: Session,
    /// Per-slot event sinks; cleared on disconnect.
    sinks: [Option<PlayerSender>; 2],
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    fn id(&self) -> &SessionId {
        self.session.id()
    }

    async fn run(mut self) {
        tracing::info!(session_id = %self.id(), "session actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Join { sink, reply } => {
                    let result = self.handle_join(sink);
                    let _ = reply.send(result);
                }
                SessionCommand::Intent { slot, intent } => {
                    self.handle_intent(slot, intent);
                }
                SessionCommand::Disconnect { slot } => {
                    let out = self.session.disconnect(slot);
                    self.sinks[slot.index()] = None;
                    self.dispatch(out);
                    if self.session.is_abandoned() {
                        tracing::info!(session_id = %self.id(), "all players gone");
                        break;
                    }
                }
                SessionCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                SessionCommand::Shutdown => {
                    tracing::info!(session_id = %self.id(), "session shutting down");
                    break;
                }
            }
        }

        tracing::info!(session_id = %self.id(), phase = %self.session.phase(), "session actor stopped");
    }

    fn handle_join(&mut self, sink: PlayerSender) -> Result<PlayerSlot, RegistryError> {
        let (slot, out) = self
            .session
            .admit()
            .map_err(|_| RegistryError::SessionFull(self.session.id().clone()))?;
        self.sinks[slot.index()] = Some(sink);
        self.dispatch(out);
        Ok(slot)
    }

    fn handle_intent(&mut self, slot: PlayerSlot, intent: ClientIntent) {
        if !self.session.is_connected(slot) {
            tracing::warn!(
                session_id = %self.id(),
                player = %slot,
                "intent from a player who is not seated, ignoring"
            );
            return;
        }
        let out = self.session.handle_intent(slot, intent);
        self.dispatch(out);
    }

    /// Delivers each event to every slot its recipient covers.
    fn dispatch(&self, out: Vec<Outbound>) {
        for (recipient, event) in out {
            for slot in PlayerSlot::ALL {
                if recipient.includes(slot) {
                    self.send_to(slot, event.clone());
                }
            }
        }
    }

    /// Sends to one player. Silently drops if their receiver is gone.
    fn send_to(&self, slot: PlayerSlot, event: ServerEvent) {
        if let Some(sink) = &self.sinks[slot.index()] {
            let _ = sink.send(event);
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session.id().clone(),
            phase: self.session.phase(),
            current_turn: self.session.current_turn(),
            players_connected: PlayerSlot::ALL.map(|slot| self.session.is_connected(slot)),
            winner: self.session.winner(),
        }
    }
}

/// Spawns a session actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; a full queue makes senders
/// wait.
pub(crate) fn spawn_session(
    session_id: SessionId,
    config: GameConfig,
    channel_size: usize,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));

    let actor = SessionActor {
        session: Session::new(session_id.clone(), config),
        sinks: [None, None],
        receiver: rx,
    };

    tokio::spawn(actor.run());

    SessionHandle {
        session_id,
        sender: tx,
    }
}
