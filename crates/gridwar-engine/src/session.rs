//! The per-match state machine.
//!
//! A [`Session`] owns both players' boards and decides, intent by intent,
//! what happens next. It never performs I/O: every operation returns the
//! events to deliver as `(Recipient, ServerEvent)` pairs and the caller
//! (the session actor) routes them to connections. This keeps the rules
//! synchronous and directly testable.
//!
//! ```text
//! admit ──(2nd player)──→ Placing ──(both fleets placed)──→ Playing ──(fleet destroyed)──→ Finished
//! ```

use gridwar_protocol::{
    ClientIntent, Coord, Orientation, Phase, PlayerSlot, Recipient, ServerEvent, SessionId,
};

use crate::placement::try_place;
use crate::{Board, GameConfig, GameError, Shape};

/// An event paired with its addressee.
pub type Outbound = (Recipient, ServerEvent);

/// One occupied seat.
#[derive(Debug, Clone)]
struct Player {
    board: Board,
    ready: bool,
    connected: bool,
}

impl Player {
    fn new(board_size: i32) -> Self {
        Self {
            board: Board::new(board_size),
            ready: false,
            connected: true,
        }
    }
}

/// A single two-player match.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    config: GameConfig,
    shape: Shape,
    phase: Phase,
    players: [Option<Player>; 2],
    turn: PlayerSlot,
    winner: Option<PlayerSlot>,
}

impl Session {
    /// Creates an empty session in `Waiting`.
    pub fn new(id: SessionId, config: GameConfig) -> Self {
        let config = config.validated();
        let shape = config.unit.shape();
        Self {
            id,
            config,
            shape,
            phase: Phase::Waiting,
            players: [None, None],
            turn: PlayerSlot::First,
            winner: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The template every unit in this session uses.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whose turn it is. Only meaningful while `Playing`.
    pub fn current_turn(&self) -> Option<PlayerSlot> {
        (self.phase == Phase::Playing).then_some(self.turn)
    }

    pub fn winner(&self) -> Option<PlayerSlot> {
        self.winner
    }

    pub fn board(&self, slot: PlayerSlot) -> Option<&Board> {
        self.player(slot).map(|p| &p.board)
    }

    pub fn placed_count(&self, slot: PlayerSlot) -> usize {
        self.player(slot).map_or(0, |p| p.board.unit_count())
    }

    pub fn is_ready(&self, slot: PlayerSlot) -> bool {
        self.player(slot).is_some_and(|p| p.ready)
    }

    pub fn is_connected(&self, slot: PlayerSlot) -> bool {
        self.player(slot).is_some_and(|p| p.connected)
    }

    pub fn admitted_count(&self) -> usize {
        self.players.iter().flatten().count()
    }

    pub fn connected_count(&self) -> usize {
        self.players.iter().flatten().filter(|p| p.connected).count()
    }

    /// Returns `true` once somebody was admitted and nobody is left.
    /// Such a session can never be reached again.
    pub fn is_abandoned(&self) -> bool {
        self.admitted_count() > 0 && self.connected_count() == 0
    }

    fn player(&self, slot: PlayerSlot) -> Option<&Player> {
        self.players[slot.index()].as_ref()
    }

    // -- Phase table --------------------------------------------------------

    fn require_phase(&self, required: Phase) -> Result<(), GameError> {
        if self.phase == required {
            Ok(())
        } else {
            Err(GameError::WrongPhase(self.phase))
        }
    }

    /// Moves to `target` if the transition table allows it.
    fn advance(&mut self, target: Phase) {
        if self.phase.can_transition_to(target) {
            tracing::info!(
                session_id = %self.id,
                from = %self.phase,
                to = %target,
                "phase changed"
            );
            self.phase = target;
        } else {
            tracing::warn!(
                session_id = %self.id,
                from = %self.phase,
                to = %target,
                "illegal phase transition ignored"
            );
        }
    }

    // -- Admission ----------------------------------------------------------

    /// Seats a new player in the first open slot.
    ///
    /// Seating the second player moves the session to `Placing` and tells
    /// both players.
    ///
    /// # Errors
    /// [`GameError::SessionFull`] when both seats were ever taken. Seats
    /// of disconnected players are not reopened.
    pub fn admit(&mut self) -> Result<(PlayerSlot, Vec<Outbound>), GameError> {
        if !self.phase.is_joinable() {
            return Err(GameError::SessionFull);
        }
        let slot = PlayerSlot::ALL
            .into_iter()
            .find(|slot| self.players[slot.index()].is_none())
            .ok_or(GameError::SessionFull)?;

        self.players[slot.index()] = Some(Player::new(self.config.board_size));
        tracing::info!(session_id = %self.id, player = %slot, "player admitted");

        if self.admitted_count() == 2 {
            self.advance(Phase::Placing);
        }

        let mut out = vec![(
            Recipient::Player(slot),
            ServerEvent::PlayerAssigned {
                session_id: self.id.clone(),
                player: slot,
                phase: self.phase,
            },
        )];
        if self.phase == Phase::Placing {
            out.push((Recipient::All, ServerEvent::BothConnected));
        }
        Ok((slot, out))
    }

    // -- Intents ------------------------------------------------------------

    /// Runs one intent and turns any rejection into the matching event for
    /// the sender. Rejections never change state.
    pub fn handle_intent(&mut self, slot: PlayerSlot, intent: ClientIntent) -> Vec<Outbound> {
        if let Some(required) = intent.required_phase() {
            if let Err(err) = self.require_phase(required) {
                return vec![(Recipient::Player(slot), self.reject(slot, &intent, err))];
            }
        }

        let result = match intent {
            ClientIntent::PlaceUnit {
                anchor_x,
                anchor_y,
                orientation,
            } => self.place_unit(slot, Coord::new(anchor_x, anchor_y), orientation),
            ClientIntent::PreviewUnit {
                anchor_x,
                anchor_y,
                orientation,
            } => self
                .preview_unit(slot, Coord::new(anchor_x, anchor_y), orientation)
                .map(|cells| {
                    vec![(
                        Recipient::Player(slot),
                        ServerEvent::PlacementPreview {
                            valid: true,
                            cells,
                            error: None,
                        },
                    )]
                }),
            ClientIntent::Attack { x, y } => self.attack(slot, Coord::new(x, y)),
            ClientIntent::GetBoards => Ok(vec![(Recipient::Player(slot), self.boards(slot))]),
            ClientIntent::GetSessionInfo => Ok(vec![(Recipient::Player(slot), self.info())]),
        };

        result.unwrap_or_else(|err| vec![(Recipient::Player(slot), self.reject(slot, &intent, err))])
    }

    /// The event that answers a rejected `intent`.
    fn reject(&self, slot: PlayerSlot, intent: &ClientIntent, err: GameError) -> ServerEvent {
        tracing::debug!(
            session_id = %self.id,
            player = %slot,
            error = %err,
            "intent rejected"
        );
        match *intent {
            ClientIntent::PlaceUnit { .. } => ServerEvent::UnitPlaced {
                success: false,
                placed_count: self.placed_count(slot),
                cells: Vec::new(),
                error: Some(err.reason()),
            },
            ClientIntent::PreviewUnit {
                anchor_x,
                anchor_y,
                orientation,
            } => ServerEvent::PlacementPreview {
                valid: false,
                cells: self.shape.project(Coord::new(anchor_x, anchor_y), orientation),
                error: Some(err.reason()),
            },
            ClientIntent::Attack { .. }
            | ClientIntent::GetBoards
            | ClientIntent::GetSessionInfo => ServerEvent::Error {
                reason: err.reason(),
                message: err.to_string(),
            },
        }
    }

    /// Places one unit for `slot`.
    ///
    /// # Errors
    /// `WrongPhase` outside `Placing`, `CapacityExceeded` once the fleet is
    /// complete, `OutOfBounds` / `Overlap` from validation.
    pub fn place_unit(
        &mut self,
        slot: PlayerSlot,
        anchor: Coord,
        orientation: Orientation,
    ) -> Result<Vec<Outbound>, GameError> {
        self.require_phase(Phase::Placing)?;
        let required = self.config.units_per_player;
        let phase = self.phase;
        let player = self.players[slot.index()]
            .as_mut()
            .ok_or(GameError::WrongPhase(phase))?;

        if player.board.unit_count() >= required {
            return Err(GameError::CapacityExceeded(required));
        }
        let placement = try_place(&player.board, &self.shape, anchor, orientation)?;
        let cells = placement.cells.clone();
        player.board.commit(placement)?;

        let placed_count = player.board.unit_count();
        if placed_count == required {
            player.ready = true;
        }
        tracing::debug!(
            session_id = %self.id,
            player = %slot,
            placed_count,
            %anchor,
            "unit placed"
        );

        let mut out = vec![(
            Recipient::Player(slot),
            ServerEvent::UnitPlaced {
                success: true,
                placed_count,
                cells,
                error: None,
            },
        )];

        if self.players.iter().flatten().all(|p| p.ready) && self.admitted_count() == 2 {
            self.advance(Phase::Playing);
            self.turn = PlayerSlot::First;
            out.push((
                Recipient::All,
                ServerEvent::GameStarted {
                    first_turn: self.turn,
                },
            ));
        }
        Ok(out)
    }

    /// Validates a placement for `slot` without committing it.
    ///
    /// # Errors
    /// The same errors [`place_unit`](Self::place_unit) would return.
    pub fn preview_unit(
        &self,
        slot: PlayerSlot,
        anchor: Coord,
        orientation: Orientation,
    ) -> Result<Vec<Coord>, GameError> {
        self.require_phase(Phase::Placing)?;
        let player = self
            .player(slot)
            .ok_or(GameError::WrongPhase(self.phase))?;
        if player.board.unit_count() >= self.config.units_per_player {
            return Err(GameError::CapacityExceeded(self.config.units_per_player));
        }
        try_place(&player.board, &self.shape, anchor, orientation).map(|p| p.cells)
    }

    /// Fires at `target` on the opponent's board.
    ///
    /// # Errors
    /// `WrongPhase` outside `Playing`, `NotYourTurn`, `OutOfBounds`, or
    /// `AlreadyAttacked`. None of them change state.
    pub fn attack(
        &mut self,
        slot: PlayerSlot,
        target: Coord,
    ) -> Result<Vec<Outbound>, GameError> {
        self.require_phase(Phase::Playing)?;
        if slot != self.turn {
            return Err(GameError::NotYourTurn);
        }

        let defender_slot = slot.opponent();
        let phase = self.phase;
        let defender = self.players[defender_slot.index()]
            .as_mut()
            .ok_or(GameError::WrongPhase(phase))?;
        let outcome = defender.board.receive_attack(target)?;
        let fleet_destroyed = defender.board.all_destroyed();

        tracing::debug!(
            session_id = %self.id,
            attacker = %slot,
            %target,
            ?outcome,
            "attack resolved"
        );

        let mut out = vec![
            (
                Recipient::Player(slot),
                ServerEvent::AttackResult {
                    x: target.x,
                    y: target.y,
                    outcome,
                    is_attacker: true,
                },
            ),
            (
                Recipient::Player(defender_slot),
                ServerEvent::AttackResult {
                    x: target.x,
                    y: target.y,
                    outcome,
                    is_attacker: false,
                },
            ),
        ];

        if fleet_destroyed {
            self.advance(Phase::Finished);
            self.winner = Some(slot);
            tracing::info!(session_id = %self.id, winner = %slot, "game over");
            out.push((Recipient::All, ServerEvent::GameOver { winner: slot }));
        } else {
            self.turn = defender_slot;
            out.push((
                Recipient::All,
                ServerEvent::TurnChanged {
                    turn: defender_slot,
                },
            ));
        }
        Ok(out)
    }

    /// Both grids from `slot`'s point of view; the opponent's is masked.
    pub fn boards(&self, slot: PlayerSlot) -> ServerEvent {
        let size = self.config.board_size;
        let render = |slot: PlayerSlot, reveal: bool| {
            self.board(slot)
                .map_or_else(|| Board::new(size).view(reveal), |b| b.view(reveal))
        };
        ServerEvent::BoardsUpdate {
            own: render(slot, true),
            opponent: render(slot.opponent(), false),
        }
    }

    /// Metadata snapshot: phase, turn, seat flags and winner.
    pub fn info(&self) -> ServerEvent {
        ServerEvent::SessionInfo {
            session_id: self.id.clone(),
            phase: self.phase,
            current_turn: self.current_turn(),
            players_connected: PlayerSlot::ALL.map(|slot| self.is_connected(slot)),
            winner: self.winner,
        }
    }

    /// Marks `slot` as gone and tells the other player. The match is not
    /// ended or paused.
    pub fn disconnect(&mut self, slot: PlayerSlot) -> Vec<Outbound> {
        let Some(player) = self.players[slot.index()].as_mut() else {
            return Vec::new();
        };
        if !player.connected {
            return Vec::new();
        }
        player.connected = false;
        tracing::info!(
            session_id = %self.id,
            player = %slot,
            phase = %self.phase,
            "player disconnected"
        );
        vec![(
            Recipient::AllExcept(slot),
            ServerEvent::PlayerDisconnected { player: slot },
        )]
    }
}
