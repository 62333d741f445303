//! End-to-end session behavior under paused virtual time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use combat_core::{
    ActionId, CombatEntity, EntityId, EntityKind, EntityPatch, FixedRoller, GateDirection,
    GateExits, RoomFlags, RoomPosition, catalog::ids,
};
use combat_runtime::{
    RoomDescriptor, RoomGateway, RoomMoveRequest, Session, SessionEvent, SessionHandle,
};

/// Gateway double that records every request and answers from a script.
struct RecordingGateway {
    calls: Mutex<Vec<GateDirection>>,
    fail: bool,
}

impl RecordingGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn calls(&self) -> Vec<GateDirection> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomGateway for RecordingGateway {
    async fn request_move(&self, request: RoomMoveRequest) -> anyhow::Result<RoomDescriptor> {
        self.calls.lock().unwrap().push(request.direction);
        if self.fail {
            anyhow::bail!("gateway offline");
        }
        Ok(RoomDescriptor {
            id: "room-2".into(),
            exits: GateExits::ALL,
            flags: RoomFlags::default(),
        })
    }
}

fn player_at(x: f32, y: f32) -> CombatEntity {
    CombatEntity::new("p1", "Hero", EntityKind::Player)
        .with_hp(40)
        .with_stats(18, 2, 12, 4)
        .with_level(5)
        .with_position(RoomPosition::new(x, y))
}

fn goblin_at(x: f32, y: f32) -> CombatEntity {
    CombatEntity::new("g1", "Goblin", EntityKind::Hostile)
        .with_hp(20)
        .with_stats(6, 12, 8, 3)
        .with_level(2)
        .with_position(RoomPosition::new(x, y))
}

fn forced_hit_session(gateway: Arc<dyn RoomGateway>) -> SessionHandle {
    let session = Session::builder()
        .gateway(gateway)
        .roller(Box::new(FixedRoller(0.0)))
        .build()
        .expect("session builds");
    session.handle()
}

fn attack_id() -> ActionId {
    ActionId::new(ids::BASIC_ATTACK)
}

#[tokio::test(start_paused = true)]
async fn queued_attack_executes_on_a_tick() {
    let handle = forced_hit_session(RecordingGateway::new());
    handle.add_entity(player_at(50.0, 50.0)).await.unwrap();
    handle.add_entity(goblin_at(55.0, 50.0)).await.unwrap();

    let accepted = handle
        .queue_action("p1".into(), attack_id(), Some("g1".into()), None)
        .await
        .unwrap();
    assert!(accepted);

    // Execution latency is 600ms; give the 100ms tick loop room to fire.
    sleep(Duration::from_millis(800)).await;

    let snapshot = handle.snapshot().await.unwrap();
    let goblin = snapshot
        .entities
        .iter()
        .find(|e| e.id == EntityId::new("g1"))
        .unwrap();
    assert_eq!(goblin.hp, 8);
    assert!(snapshot.is_in_combat);
    assert!(snapshot.action_queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn immediate_requeue_is_rejected_with_queue_unchanged() {
    let handle = forced_hit_session(RecordingGateway::new());
    handle.add_entity(player_at(50.0, 50.0)).await.unwrap();
    handle.add_entity(goblin_at(55.0, 50.0)).await.unwrap();

    let mut events = handle.subscribe_events();

    let first = handle
        .queue_action("p1".into(), attack_id(), Some("g1".into()), None)
        .await
        .unwrap();
    let second = handle
        .queue_action("p1".into(), attack_id(), Some("g1".into()), None)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(handle.snapshot().await.unwrap().action_queue.len(), 1);

    // The rejection is observable but changed nothing.
    let mut saw_rejection = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::ActionRejected { .. }) {
            saw_rejection = true;
        }
    }
    assert!(saw_rejection);
}

#[tokio::test(start_paused = true)]
async fn gate_crossing_debounces_to_one_request_per_window() {
    let gateway = RecordingGateway::new();
    let handle = forced_hit_session(gateway.clone());
    handle.add_entity(player_at(94.0, 50.0)).await.unwrap();
    handle.add_entity(goblin_at(30.0, 30.0)).await.unwrap();

    handle.movement_input("p1".into(), 1.0, 0.0).await.unwrap();
    handle.movement_input("p1".into(), 1.0, 0.0).await.unwrap();
    sleep(Duration::from_millis(50)).await;

    // Exactly one transition request despite two crossing moves.
    assert_eq!(gateway.calls(), vec![GateDirection::East]);

    // Confirmed success cleared the mob and placed the player at the
    // opposite edge of travel.
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.entities.len(), 1);
    assert_eq!(snapshot.entities[0].id, EntityId::new("p1"));
    assert_eq!(snapshot.entities[0].position, RoomPosition::new(12.0, 50.0));

    // After the window elapses a fresh crossing triggers again.
    sleep(Duration::from_millis(2100)).await;
    handle
        .update_entity(
            "p1".into(),
            EntityPatch {
                position: Some(RoomPosition::new(94.0, 50.0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    handle.movement_input("p1".into(), 1.0, 0.0).await.unwrap();
    sleep(Duration::from_millis(50)).await;

    assert_eq!(gateway.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_transition_leaves_the_roster_untouched() {
    let gateway = RecordingGateway::failing();
    let handle = forced_hit_session(gateway.clone());
    handle.add_entity(player_at(94.0, 50.0)).await.unwrap();
    handle.add_entity(goblin_at(30.0, 30.0)).await.unwrap();

    let mut events = handle.subscribe_events();

    handle.movement_input("p1".into(), 1.0, 0.0).await.unwrap();
    sleep(Duration::from_millis(50)).await;

    assert_eq!(gateway.calls().len(), 1);
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.entities.len(), 2);

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::TransitionFailed { .. }) {
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test(start_paused = true)]
async fn subscription_sees_the_current_snapshot_immediately() {
    let handle = forced_hit_session(RecordingGateway::new());

    let state_rx = handle.subscribe_state();
    assert!(state_rx.borrow().entities.is_empty());

    handle.add_entity(player_at(50.0, 50.0)).await.unwrap();
    // Commands are processed in order, so a round-trip flushes the add.
    handle.snapshot().await.unwrap();

    let mut state_rx = handle.subscribe_state();
    // A subscriber arriving after the mutation reads it without waiting.
    assert_eq!(state_rx.borrow().entities.len(), 1);

    // And existing subscribers observe the next mutation.
    handle.add_entity(goblin_at(60.0, 50.0)).await.unwrap();
    state_rx.changed().await.unwrap();
    assert_eq!(state_rx.borrow().entities.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn engage_closes_distance_then_attacks() {
    let handle = forced_hit_session(RecordingGateway::new());
    handle.add_entity(player_at(10.0, 50.0)).await.unwrap();
    handle.add_entity(goblin_at(40.0, 50.0)).await.unwrap();

    // 30 units apart, melee range 12: the direct attack is rejected and the
    // two-step schedule kicks in.
    let engaged = handle
        .engage("p1".into(), attack_id(), "g1".into())
        .await
        .unwrap();
    assert!(engaged);

    sleep(Duration::from_millis(800)).await;

    let snapshot = handle.snapshot().await.unwrap();
    let player = snapshot
        .entities
        .iter()
        .find(|e| e.id == EntityId::new("p1"))
        .unwrap();
    let goblin = snapshot
        .entities
        .iter()
        .find(|e| e.id == EntityId::new("g1"))
        .unwrap();

    // Moved to just under range, then landed the hit.
    assert!(player.position.distance_to(goblin.position) <= 12.0);
    assert_eq!(goblin.hp, 8);
}

#[tokio::test(start_paused = true)]
async fn cancelled_action_keeps_its_cooldown() {
    let handle = forced_hit_session(RecordingGateway::new());
    handle.add_entity(player_at(50.0, 50.0)).await.unwrap();
    handle.add_entity(goblin_at(55.0, 50.0)).await.unwrap();

    assert!(handle
        .queue_action("p1".into(), attack_id(), Some("g1".into()), None)
        .await
        .unwrap());

    let snapshot = handle.snapshot().await.unwrap();
    let ticket = snapshot.action_queue[0].ticket;
    assert!(handle.cancel_action(ticket).await.unwrap());
    assert!(handle.snapshot().await.unwrap().action_queue.is_empty());

    // No refund: the immediate requeue still trips the cooldown.
    assert!(!handle
        .queue_action("p1".into(), attack_id(), Some("g1".into()), None)
        .await
        .unwrap());

    // Cancelling an unknown ticket is a quiet no-op.
    assert!(!handle.cancel_action(ticket).await.unwrap());
}
