//! Integration tests for the session registry and session actors.

use std::time::Duration;

use gridwar_engine::{GameConfig, UnitKind};
use gridwar_protocol::{
    AttackOutcome, ClientIntent, Orientation, Phase, PlayerSlot, ServerEvent, SessionId,
};
use gridwar_registry::{PlayerSender, RegistryError, SessionRegistry};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

fn sink() -> (PlayerSender, Inbox) {
    mpsc::unbounded_channel()
}

/// Creates a sender whose receiver is dropped immediately.
fn dummy_sink() -> PlayerSender {
    mpsc::unbounded_channel().0
}

/// One single-cell ship each on a 3×3 board: the first hit wins.
fn quick_config() -> GameConfig {
    GameConfig {
        board_size: 3,
        unit: UnitKind::Ship { length: 1 },
        units_per_player: 1,
    }
}

async fn next_event(inbox: &mut Inbox) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(1), inbox.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

fn place_at_origin() -> ClientIntent {
    ClientIntent::PlaceUnit {
        anchor_x: 0,
        anchor_y: 0,
        orientation: Orientation::Up,
    }
}

// =========================================================================
// Creation and admission
// =========================================================================

#[tokio::test]
async fn test_create_session_returns_unique_ids() {
    let mut registry = SessionRegistry::default();
    let s1 = registry.create_session(GameConfig::default());
    let s2 = registry.create_session(GameConfig::default());
    assert_ne!(s1, s2);
    assert_eq!(registry.session_count(), 2);

    let ids = registry.session_ids();
    assert!(ids.contains(&s1));
    assert!(ids.contains(&s2));
}

#[tokio::test]
async fn test_join_assigns_slots_in_order() {
    let mut registry = SessionRegistry::default();
    let id = registry.create_session(GameConfig::default());

    let (tx1, mut rx1) = sink();
    let (slot, handle) = registry.join(&id, tx1).await.unwrap();
    assert_eq!(slot, PlayerSlot::First);
    assert_eq!(handle.session_id(), &id);
    assert_eq!(
        next_event(&mut rx1).await,
        ServerEvent::PlayerAssigned {
            session_id: id.clone(),
            player: PlayerSlot::First,
            phase: Phase::Waiting,
        }
    );

    let (tx2, mut rx2) = sink();
    let (slot, _) = registry.join(&id, tx2).await.unwrap();
    assert_eq!(slot, PlayerSlot::Second);
    assert!(matches!(
        next_event(&mut rx2).await,
        ServerEvent::PlayerAssigned {
            phase: Phase::Placing,
            ..
        }
    ));
    assert_eq!(next_event(&mut rx1).await, ServerEvent::BothConnected);
    assert_eq!(next_event(&mut rx2).await, ServerEvent::BothConnected);
}

#[tokio::test]
async fn test_join_unknown_session() {
    let registry = SessionRegistry::default();
    let id = SessionId::from("nope");
    let result = registry.join(&id, dummy_sink()).await;
    assert_eq!(result.unwrap_err(), RegistryError::NotFound(id));
}

#[tokio::test]
async fn test_join_third_player_is_session_full() {
    let mut registry = SessionRegistry::default();
    let id = registry.create_session(GameConfig::default());
    registry.join(&id, dummy_sink()).await.unwrap();
    registry.join(&id, dummy_sink()).await.unwrap();

    let result = registry.join(&id, dummy_sink()).await;
    assert_eq!(result.unwrap_err(), RegistryError::SessionFull(id));
}

// =========================================================================
// Pairing
// =========================================================================

#[tokio::test]
async fn test_join_or_create_pairs_two_players() {
    let mut registry = SessionRegistry::default();

    let (s1, slot1, _) = registry
        .join_or_create(GameConfig::default(), dummy_sink())
        .await
        .unwrap();
    let (s2, slot2, _) = registry
        .join_or_create(GameConfig::default(), dummy_sink())
        .await
        .unwrap();

    assert_eq!(s1, s2);
    assert_eq!(slot1, PlayerSlot::First);
    assert_eq!(slot2, PlayerSlot::Second);
    assert_eq!(registry.session_count(), 1);

    let (s3, slot3, _) = registry
        .join_or_create(GameConfig::default(), dummy_sink())
        .await
        .unwrap();
    assert_ne!(s3, s1);
    assert_eq!(slot3, PlayerSlot::First);
    assert_eq!(registry.session_count(), 2);
}

#[tokio::test]
async fn test_join_or_create_skips_sessions_created_by_id() {
    let mut registry = SessionRegistry::default();
    let private = registry.create_session(GameConfig::default());
    registry.join(&private, dummy_sink()).await.unwrap();

    let (paired, _, _) = registry
        .join_or_create(GameConfig::default(), dummy_sink())
        .await
        .unwrap();
    assert_ne!(paired, private);
}

// =========================================================================
// Routing
// =========================================================================

#[tokio::test]
async fn test_route_full_game() {
    let mut registry = SessionRegistry::default();
    let id = registry.create_session(quick_config());
    let (tx1, mut rx1) = sink();
    let (tx2, mut rx2) = sink();
    registry.join(&id, tx1).await.unwrap();
    registry.join(&id, tx2).await.unwrap();

    // PlayerAssigned + BothConnected each.
    for _ in 0..2 {
        next_event(&mut rx1).await;
        next_event(&mut rx2).await;
    }

    registry
        .route(&id, PlayerSlot::First, place_at_origin())
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut rx1).await,
        ServerEvent::UnitPlaced {
            success: true,
            placed_count: 1,
            ..
        }
    ));

    registry
        .route(&id, PlayerSlot::Second, place_at_origin())
        .await
        .unwrap();
    next_event(&mut rx2).await;
    let started = ServerEvent::GameStarted {
        first_turn: PlayerSlot::First,
    };
    assert_eq!(next_event(&mut rx1).await, started);
    assert_eq!(next_event(&mut rx2).await, started);

    registry
        .route(&id, PlayerSlot::First, ClientIntent::Attack { x: 0, y: 0 })
        .await
        .unwrap();
    assert_eq!(
        next_event(&mut rx1).await,
        ServerEvent::AttackResult {
            x: 0,
            y: 0,
            outcome: AttackOutcome::Hit,
            is_attacker: true,
        }
    );
    assert!(matches!(
        next_event(&mut rx2).await,
        ServerEvent::AttackResult {
            is_attacker: false,
            ..
        }
    ));
    let over = ServerEvent::GameOver {
        winner: PlayerSlot::First,
    };
    assert_eq!(next_event(&mut rx1).await, over);
    assert_eq!(next_event(&mut rx2).await, over);

    let info = registry.session_info(&id).await.unwrap();
    assert_eq!(info.phase, Phase::Finished);
    assert_eq!(info.winner, Some(PlayerSlot::First));
}

#[tokio::test]
async fn test_route_rejection_reaches_sender_only() {
    let mut registry = SessionRegistry::default();
    let id = registry.create_session(quick_config());
    let (tx1, mut rx1) = sink();
    let (tx2, mut rx2) = sink();
    registry.join(&id, tx1).await.unwrap();
    registry.join(&id, tx2).await.unwrap();
    for _ in 0..2 {
        next_event(&mut rx1).await;
        next_event(&mut rx2).await;
    }

    registry
        .route(&id, PlayerSlot::Second, ClientIntent::Attack { x: 0, y: 0 })
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut rx2).await,
        ServerEvent::Error { .. }
    ));

    // Nothing was queued for the other player.
    let info = registry.session_info(&id).await.unwrap();
    assert_eq!(info.phase, Phase::Placing);
    assert!(rx1.try_recv().is_err());
}

#[tokio::test]
async fn test_route_session_info_matches_snapshot() {
    let mut registry = SessionRegistry::default();
    let id = registry.create_session(GameConfig::default());
    let (tx1, mut rx1) = sink();
    registry.join(&id, tx1).await.unwrap();
    next_event(&mut rx1).await;

    registry
        .route(&id, PlayerSlot::First, ClientIntent::GetSessionInfo)
        .await
        .unwrap();
    let event = next_event(&mut rx1).await;
    assert_eq!(
        event,
        ServerEvent::SessionInfo {
            session_id: id.clone(),
            phase: Phase::Waiting,
            current_turn: None,
            players_connected: [true, false],
            winner: None,
        }
    );

    let snapshot = registry.session_info(&id).await.unwrap();
    assert_eq!(ServerEvent::from(snapshot), event);
}

#[tokio::test]
async fn test_route_unknown_session() {
    let registry = SessionRegistry::default();
    let result = registry
        .route(
            &SessionId::from("nope"),
            PlayerSlot::First,
            ClientIntent::GetBoards,
        )
        .await;
    assert!(matches!(result, Err(RegistryError::NotFound(_))));
}

// =========================================================================
// Disconnects and cleanup
// =========================================================================

#[tokio::test]
async fn test_disconnect_notifies_other_player() {
    let mut registry = SessionRegistry::default();
    let id = registry.create_session(GameConfig::default());
    let (tx1, mut rx1) = sink();
    registry.join(&id, tx1).await.unwrap();
    registry.join(&id, dummy_sink()).await.unwrap();
    next_event(&mut rx1).await;
    next_event(&mut rx1).await;

    registry.disconnect(&id, PlayerSlot::Second).await.unwrap();
    assert_eq!(
        next_event(&mut rx1).await,
        ServerEvent::PlayerDisconnected {
            player: PlayerSlot::Second,
        }
    );

    let info = registry.session_info(&id).await.unwrap();
    assert_eq!(info.players_connected, [true, false]);
    assert_eq!(info.phase, Phase::Placing);
}

#[tokio::test]
async fn test_session_stops_when_everyone_leaves() {
    let mut registry = SessionRegistry::default();
    let id = registry.create_session(GameConfig::default());
    let (_, handle) = registry.join(&id, dummy_sink()).await.unwrap();
    registry.join(&id, dummy_sink()).await.unwrap();

    registry.disconnect(&id, PlayerSlot::First).await.unwrap();
    registry.disconnect(&id, PlayerSlot::Second).await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), async {
        while !handle.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session actor did not stop");

    assert_eq!(registry.prune(), 1);
    assert_eq!(registry.session_count(), 0);
}

#[tokio::test]
async fn test_remove_session_shuts_actor_down() {
    let mut registry = SessionRegistry::default();
    let id = registry.create_session(GameConfig::default());
    let handle = registry.handle(&id).unwrap();

    registry.remove_session(&id).await.unwrap();
    assert_eq!(registry.session_count(), 0);

    tokio::time::timeout(Duration::from_secs(1), async {
        while !handle.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session actor did not stop");
    assert!(handle.get_info().await.is_err());
}
