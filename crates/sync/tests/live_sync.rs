//! End-to-end behavior of panels over the in-memory backend: snapshot
//! delivery, fan-out, scoping, and unmount semantics.

use std::time::Duration;

use chrono::Utc;

use studyhall_core::CollectionPath;
use studyhall_core::message::Message;
use studyhall_core::task::Task;
use studyhall_core::testing;
use studyhall_gateway::{CollectionGateway, GatewayError, MemoryBackend, MemoryGateway};
use studyhall_sync::{Panel, PanelChange, PanelState};

fn task_panel(gw: &MemoryGateway, uid: &str) -> Panel<Task, MemoryGateway> {
    Panel::new(gw.clone(), CollectionPath::tasks(uid))
}

#[tokio::test]
async fn created_task_appears_in_the_next_snapshot() {
    let backend = MemoryBackend::new();
    let gw = backend.connect("u1");
    let mut panel = task_panel(&gw, "u1");

    panel.mount();
    panel.wait_live().await.unwrap();
    assert!(panel.items().is_empty());

    let record = panel
        .create(&Task::new("Read Ch.5", testing::date(2026, 9, 1)))
        .await
        .unwrap();
    assert!(matches!(
        panel.next_change().await,
        Some(PanelChange::Snapshot)
    ));

    let items = panel.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, record.id);
    assert_eq!(items[0].created_at, record.created_at);
    assert_eq!(items[0].data.title, "Read Ch.5");
    assert!(!items[0].data.completed);
}

#[tokio::test]
async fn two_panels_on_one_room_see_identical_ordering() {
    let backend = MemoryBackend::new();
    let alice = backend.connect("alice");
    let bob = backend.connect("bob");

    let room = alice
        .create(
            &CollectionPath::study_rooms(),
            studyhall_core::to_fields(&studyhall_core::room::Room::new("Calculus", "alice"))
                .unwrap(),
        )
        .await
        .unwrap();
    for gw in [&alice, &bob] {
        gw.create(
            &CollectionPath::room_members(&room.id),
            studyhall_core::to_fields(&studyhall_core::room::Membership::new(
                gw.actor(),
                Utc::now(),
            ))
            .unwrap(),
        )
        .await
        .unwrap();
    }

    let path = CollectionPath::room_messages(&room.id);
    let mut panel_a: Panel<Message, _> = Panel::new(alice.clone(), path.clone());
    let mut panel_b: Panel<Message, _> = Panel::new(bob.clone(), path.clone());
    panel_a.mount();
    panel_b.mount();
    panel_a.wait_live().await.unwrap();
    panel_b.wait_live().await.unwrap();

    // A message sent through panel A lands in both panels.
    panel_a
        .create(&Message::new("hello room", "alice", Utc::now()))
        .await
        .unwrap();
    panel_a.next_change().await.unwrap();
    panel_b.next_change().await.unwrap();

    panel_b
        .create(&Message::new("hi!", "bob", Utc::now()))
        .await
        .unwrap();
    panel_a.next_change().await.unwrap();
    panel_b.next_change().await.unwrap();

    let ids_a: Vec<&str> = panel_a.items().iter().map(|m| m.id.as_str()).collect();
    let ids_b: Vec<&str> = panel_b.items().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids_a.len(), 2);
    assert_eq!(ids_a, ids_b);
    assert_eq!(panel_a.items()[0].data.text, "hello room");
}

#[tokio::test]
async fn unmount_discards_the_view_and_inflight_writes_still_land() {
    let backend = MemoryBackend::new();
    let gw = backend.connect("u1");
    let mut panel = task_panel(&gw, "u1");

    panel.mount();
    panel.wait_live().await.unwrap();

    // Issue the create, unmount before driving the future to completion.
    let pending = panel.create(&Task::new("late arrival", testing::date(2026, 9, 2)));
    panel.unmount();
    assert_eq!(panel.state(), PanelState::Unmounted);

    let record = pending.await.unwrap();
    // Nothing local to update: the view stays discarded, nothing panics.
    assert!(panel.items().is_empty());
    assert_eq!(panel.pump(), 0);

    // The write completed against the backend regardless.
    let mut fresh = task_panel(&gw, "u1");
    fresh.mount();
    fresh.wait_live().await.unwrap();
    assert_eq!(fresh.items().len(), 1);
    assert_eq!(fresh.items()[0].id, record.id);
}

#[tokio::test]
async fn repeated_unmount_is_harmless() {
    let backend = MemoryBackend::new();
    let gw = backend.connect("u1");
    let mut panel = task_panel(&gw, "u1");

    panel.unmount(); // never mounted
    panel.mount();
    panel.wait_live().await.unwrap();
    panel.unmount();
    panel.unmount();
    assert_eq!(panel.state(), PanelState::Unmounted);
}

#[tokio::test]
async fn unauthorized_panel_keeps_the_error_and_siblings_stay_live() {
    let backend = MemoryBackend::new();
    let bob = backend.connect("bob");

    let mut foreign = task_panel(&bob, "alice");
    foreign.mount();
    let err = foreign.wait_live().await.unwrap_err();
    assert!(matches!(err, GatewayError::Unauthorized { .. }));
    assert!(foreign.last_error().is_some());
    assert_eq!(foreign.state(), PanelState::Subscribing);

    let mut own = task_panel(&bob, "bob");
    own.mount();
    own.wait_live().await.unwrap();
    own.create(&Task::new("mine", testing::date(2026, 9, 1)))
        .await
        .unwrap();
    own.next_change().await.unwrap();
    assert_eq!(own.items().len(), 1);
}

#[tokio::test]
async fn validation_failures_never_reach_the_gateway() {
    let backend = MemoryBackend::new();
    let gw = backend.connect("u1");
    let mut panel = task_panel(&gw, "u1");
    panel.mount();
    panel.wait_live().await.unwrap();

    let invalid = Task::new("   ", testing::date(2026, 9, 1));
    assert!(panel.create(&invalid).await.is_err());

    // No write happened, so no snapshot is queued.
    assert_eq!(panel.pump(), 0);
    assert!(panel.items().is_empty());
}

#[tokio::test]
async fn toggling_completion_via_field_patch() {
    let backend = MemoryBackend::new();
    let gw = backend.connect("u1");
    let mut panel = task_panel(&gw, "u1");
    panel.mount();
    panel.wait_live().await.unwrap();

    let record = panel
        .create(&Task::new("toggle me", testing::date(2026, 9, 1)))
        .await
        .unwrap();
    panel.next_change().await.unwrap();

    let mut fields = studyhall_core::FieldMap::new();
    fields.insert("completed".to_string(), serde_json::Value::Bool(true));
    panel.update(&record.id, fields).await.unwrap();
    panel.next_change().await.unwrap();

    assert!(panel.items()[0].data.completed);
    assert_eq!(panel.items()[0].data.title, "toggle me");
}

#[tokio::test]
async fn staleness_reflects_snapshot_age() {
    let backend = MemoryBackend::new();
    let gw = backend.connect("u1");
    let mut panel = task_panel(&gw, "u1");

    assert!(!panel.is_stale(Duration::ZERO)); // unmounted panels are never stale

    panel.mount();
    panel.wait_live().await.unwrap();
    assert!(!panel.is_stale(Duration::from_secs(60)));
    std::thread::sleep(Duration::from_millis(2));
    assert!(panel.is_stale(Duration::from_millis(1)));
}
