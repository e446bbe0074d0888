//! Core protocol types for Gridwar's wire format.
//!
//! Everything in this module travels "on the wire": it is serialized by a
//! [`Codec`](crate::Codec), sent over the connection, and decoded on the
//! other side. The engine produces and consumes these types directly, so
//! the transport layer only has to marshal bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier of one match.
///
/// Generated by the registry as a random hex token. `#[serde(transparent)]`
/// keeps the JSON representation a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One of the two seats in a session.
///
/// The first admitted connection always gets `First` and always moves first
/// once combat starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    #[serde(rename = "player1")]
    First,
    #[serde(rename = "player2")]
    Second,
}

impl PlayerSlot {
    /// Both slots in admission order.
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::First, PlayerSlot::Second];

    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// Index into per-player arrays (`0` or `1`).
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "player1"),
            Self::Second => write!(f, "player2"),
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A board coordinate or a relative shape offset.
///
/// Signed on purpose: a rotated shape translated near an edge can produce
/// cells such as `(-1, 3)`, and those must be representable so placement
/// can reject them as out of bounds instead of failing to decode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise sum, used to translate an offset by an anchor.
    ///
    /// Saturates at the `i32` range. A saturated component is never inside
    /// a board, so client-supplied anchors near `i32::MAX` / `i32::MIN`
    /// still come out as out of bounds.
    pub fn offset_by(self, other: Coord) -> Self {
        Self::new(
            self.x.saturating_add(other.x),
            self.y.saturating_add(other.y),
        )
    }

    /// Returns `true` if the coordinate lies inside a `size × size` board.
    pub fn in_bounds(self, size: i32) -> bool {
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Facing of a placed unit.
///
/// Boards are y-down: row 0 is the top. `Up` is the template as drawn,
/// `Right` points its front toward +x, `Left` toward -x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Right,
        Orientation::Down,
        Orientation::Left,
    ];

    /// Number of `(x, y) → (y, −x)` quarter turns from `Up` (0–3).
    ///
    /// On a y-down board that turn is counter-clockwise on screen, so
    /// facing right takes three of them.
    pub fn steps(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 3,
            Self::Down => 2,
            Self::Left => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase: the session lifecycle
// ---------------------------------------------------------------------------

/// The lifecycle phase of a session.
///
/// Transitions are strictly ordered, no skipping:
///
/// ```text
/// Waiting → Placing → Playing → Finished
/// ```
///
/// - **Waiting**: fewer than two players admitted.
/// - **Placing**: both seats taken, players place their units.
/// - **Playing**: both fleets complete, players alternate attacks.
/// - **Finished**: one fleet was destroyed. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Placing,
    Playing,
    Finished,
}

impl Phase {
    /// Returns the only phase this one may advance to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Placing),
            Self::Placing => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` follows the transition table.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Returns `true` while the session still has an open seat.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Placing => write!(f, "placing"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Combat results and board views
// ---------------------------------------------------------------------------

/// How a single attack resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackOutcome {
    Hit,
    CriticalHit,
    Miss,
}

/// One cell of a rendered board.
///
/// The owner's view shows its units; the opponent's view collapses every
/// unattacked cell to `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellView {
    Empty,
    Unit,
    Critical,
    Hit,
    CriticalHit,
    Miss,
}

/// Stable, machine-readable reason attached to every rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    OutOfBounds,
    Overlap,
    CapacityExceeded,
    NotYourTurn,
    AlreadyAttacked,
    WrongPhase,
    SessionFull,
    SessionNotFound,
    InvalidMessage,
    Unavailable,
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Addressing for an outbound event.
///
/// The engine returns `(Recipient, ServerEvent)` pairs; the session actor
/// resolves them against the sinks it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Both players.
    All,
    /// One specific seat.
    Player(PlayerSlot),
    /// Everyone except the given seat.
    AllExcept(PlayerSlot),
}

impl Recipient {
    /// Returns `true` if an event with this address reaches `slot`.
    pub fn includes(self, slot: PlayerSlot) -> bool {
        match self {
            Self::All => true,
            Self::Player(target) => target == slot,
            Self::AllExcept(excluded) => excluded != slot,
        }
    }
}

// ---------------------------------------------------------------------------
// Intents (client → server)
// ---------------------------------------------------------------------------

/// Everything a client may ask of its session.
///
/// Internally tagged: `{"type": "attack", "x": 3, "y": 4}`. The aliases keep
/// clients written against the plane-only protocol working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientIntent {
    /// Commit a unit at `anchor` facing `orientation`.
    #[serde(alias = "place_plane")]
    PlaceUnit {
        #[serde(alias = "head_x")]
        anchor_x: i32,
        #[serde(alias = "head_y")]
        anchor_y: i32,
        orientation: Orientation,
    },

    /// Validate a placement without committing it (hover preview).
    PreviewUnit {
        anchor_x: i32,
        anchor_y: i32,
        orientation: Orientation,
    },

    /// Fire at a cell of the opponent's board.
    Attack { x: i32, y: i32 },

    /// Ask for both boards from the requester's perspective.
    GetBoards,

    /// Ask for the session's metadata (phase, turn, seats).
    GetSessionInfo,
}

impl ClientIntent {
    /// The phase this intent is valid in, or `None` if it is always valid.
    pub fn required_phase(&self) -> Option<Phase> {
        match self {
            Self::PlaceUnit { .. } | Self::PreviewUnit { .. } => Some(Phase::Placing),
            Self::Attack { .. } => Some(Phase::Playing),
            Self::GetBoards | Self::GetSessionInfo => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Events (server → client)
// ---------------------------------------------------------------------------

/// Everything the server tells a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once to a connection after it takes a seat.
    PlayerAssigned {
        session_id: SessionId,
        player: PlayerSlot,
        phase: Phase,
    },

    /// Both seats are taken; placement may begin.
    BothConnected,

    /// Acknowledges a `place_unit` intent, successful or not.
    UnitPlaced {
        success: bool,
        placed_count: usize,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        cells: Vec<Coord>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<RejectReason>,
    },

    /// Answers a `preview_unit` intent.
    PlacementPreview {
        valid: bool,
        cells: Vec<Coord>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<RejectReason>,
    },

    /// Both fleets are complete; `first_turn` moves first.
    GameStarted { first_turn: PlayerSlot },

    /// Result of one attack. `is_attacker` tells the receiver which board
    /// the coordinate refers to.
    AttackResult {
        x: i32,
        y: i32,
        outcome: AttackOutcome,
        is_attacker: bool,
    },

    TurnChanged { turn: PlayerSlot },

    GameOver { winner: PlayerSlot },

    /// The other player's connection went away.
    PlayerDisconnected { player: PlayerSlot },

    /// Row-major grids (`own[y][x]`).
    BoardsUpdate {
        own: Vec<Vec<CellView>>,
        opponent: Vec<Vec<CellView>>,
    },

    /// Session metadata. Never includes board contents.
    SessionInfo {
        session_id: SessionId,
        phase: Phase,
        /// Whose turn it is, while `playing`.
        current_turn: Option<PlayerSlot>,
        /// Seat flags, `player1` first.
        players_connected: [bool; 2],
        winner: Option<PlayerSlot>,
    },

    /// A rejected intent or admission.
    Error {
        reason: RejectReason,
        message: String,
    },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The browser client parses these exact JSON shapes, so the serde
    //! attributes are checked field by field.

    use super::*;

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionId("abc".into())).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId::from("f00d").to_string(), "S-f00d");
    }

    #[test]
    fn test_player_slot_wire_names() {
        assert_eq!(
            serde_json::to_string(&PlayerSlot::First).unwrap(),
            "\"player1\""
        );
        let slot: PlayerSlot = serde_json::from_str("\"player2\"").unwrap();
        assert_eq!(slot, PlayerSlot::Second);
    }

    #[test]
    fn test_player_slot_opponent_and_index() {
        assert_eq!(PlayerSlot::First.opponent(), PlayerSlot::Second);
        assert_eq!(PlayerSlot::Second.opponent(), PlayerSlot::First);
        assert_eq!(PlayerSlot::First.index(), 0);
        assert_eq!(PlayerSlot::Second.index(), 1);
    }

    #[test]
    fn test_coord_in_bounds() {
        assert!(Coord::new(0, 0).in_bounds(10));
        assert!(Coord::new(9, 9).in_bounds(10));
        assert!(!Coord::new(-1, 3).in_bounds(10));
        assert!(!Coord::new(3, 10).in_bounds(10));
    }

    #[test]
    fn test_coord_offset_by_saturates() {
        assert_eq!(Coord::new(2, 3).offset_by(Coord::new(-1, 4)), Coord::new(1, 7));
        let far = Coord::new(i32::MAX, i32::MIN).offset_by(Coord::new(2, -3));
        assert_eq!(far, Coord::new(i32::MAX, i32::MIN));
        assert!(!far.in_bounds(10));
    }

    #[test]
    fn test_orientation_steps() {
        let steps: Vec<u8> = Orientation::ALL.iter().map(|o| o.steps()).collect();
        assert_eq!(steps, vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_phase_next_follows_strict_order() {
        assert_eq!(Phase::Waiting.next(), Some(Phase::Placing));
        assert_eq!(Phase::Placing.next(), Some(Phase::Playing));
        assert_eq!(Phase::Playing.next(), Some(Phase::Finished));
        assert_eq!(Phase::Finished.next(), None);
    }

    #[test]
    fn test_phase_can_transition_to() {
        assert!(Phase::Waiting.can_transition_to(Phase::Placing));
        assert!(!Phase::Waiting.can_transition_to(Phase::Playing));
        assert!(!Phase::Finished.can_transition_to(Phase::Waiting));
    }

    #[test]
    fn test_phase_is_joinable() {
        assert!(Phase::Waiting.is_joinable());
        assert!(!Phase::Placing.is_joinable());
        assert!(!Phase::Finished.is_joinable());
    }

    #[test]
    fn test_recipient_includes() {
        assert!(Recipient::All.includes(PlayerSlot::Second));
        assert!(Recipient::Player(PlayerSlot::First).includes(PlayerSlot::First));
        assert!(!Recipient::Player(PlayerSlot::First).includes(PlayerSlot::Second));
        assert!(!Recipient::AllExcept(PlayerSlot::First).includes(PlayerSlot::First));
        assert!(Recipient::AllExcept(PlayerSlot::First).includes(PlayerSlot::Second));
    }

    #[test]
    fn test_intent_place_unit_json_format() {
        let intent: ClientIntent = serde_json::from_str(
            r#"{"type":"place_unit","anchor_x":5,"anchor_y":2,"orientation":"up"}"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            ClientIntent::PlaceUnit {
                anchor_x: 5,
                anchor_y: 2,
                orientation: Orientation::Up,
            }
        );
    }

    #[test]
    fn test_intent_accepts_plane_aliases() {
        let intent: ClientIntent = serde_json::from_str(
            r#"{"type":"place_plane","head_x":1,"head_y":0,"orientation":"left"}"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            ClientIntent::PlaceUnit {
                anchor_x: 1,
                anchor_y: 0,
                orientation: Orientation::Left,
            }
        );
    }

    #[test]
    fn test_intent_negative_anchor_decodes() {
        // Bounds are a placement concern, not a decoding one.
        let intent: ClientIntent = serde_json::from_str(
            r#"{"type":"place_unit","anchor_x":-1,"anchor_y":3,"orientation":"down"}"#,
        )
        .unwrap();
        assert!(matches!(intent, ClientIntent::PlaceUnit { anchor_x: -1, .. }));
    }

    #[test]
    fn test_intent_required_phase() {
        assert_eq!(
            ClientIntent::Attack { x: 0, y: 0 }.required_phase(),
            Some(Phase::Playing)
        );
        assert_eq!(ClientIntent::GetBoards.required_phase(), None);
        assert_eq!(ClientIntent::GetSessionInfo.required_phase(), None);
    }

    #[test]
    fn test_intent_unknown_type_is_rejected() {
        let result: Result<ClientIntent, _> =
            serde_json::from_str(r#"{"type":"launch_nukes"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_event_attack_result_json_format() {
        let event = ServerEvent::AttackResult {
            x: 5,
            y: 2,
            outcome: AttackOutcome::CriticalHit,
            is_attacker: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "attack_result");
        assert_eq!(json["outcome"], "critical_hit");
        assert_eq!(json["is_attacker"], true);
    }

    #[test]
    fn test_event_player_assigned_json_format() {
        let event = ServerEvent::PlayerAssigned {
            session_id: SessionId::from("abc"),
            player: PlayerSlot::First,
            phase: Phase::Waiting,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "player_assigned");
        assert_eq!(json["session_id"], "abc");
        assert_eq!(json["player"], "player1");
        assert_eq!(json["phase"], "waiting");
    }

    #[test]
    fn test_event_unit_placed_omits_empty_fields() {
        let event = ServerEvent::UnitPlaced {
            success: false,
            placed_count: 1,
            cells: Vec::new(),
            error: Some(RejectReason::Overlap),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["error"], "overlap");
        assert!(json.get("cells").is_none());
    }

    #[test]
    fn test_event_session_info_json_format() {
        let event = ServerEvent::SessionInfo {
            session_id: SessionId::from("abc"),
            phase: Phase::Placing,
            current_turn: None,
            players_connected: [true, false],
            winner: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_info");
        assert_eq!(json["phase"], "placing");
        assert!(json["current_turn"].is_null());
        assert_eq!(json["players_connected"], serde_json::json!([true, false]));
    }

    #[test]
    fn test_event_unit_vs_data_variants() {
        let json = serde_json::to_value(&ServerEvent::BothConnected).unwrap();
        assert_eq!(json, serde_json::json!({"type": "both_connected"}));
    }
}
