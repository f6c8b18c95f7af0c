//! GroupService against the in-memory store.

mod common;

use backend_test_support::unique_helpers::unique_pin;
use common::{future_form, group_form, memory_service};
use serde_json::json;
use signup_backend::domain::QueueType;
use signup_backend::entities::groups;
use signup_backend::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use signup_backend::MemoryGroupStore;
use time::macros::datetime;

fn names(players: &[signup_backend::domain::PlayerView]) -> Vec<&str> {
    players.iter().map(|p| p.name.as_str()).collect()
}

#[tokio::test]
async fn create_then_fetch_round_trips_the_session() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);

    let id = service.create_group(&future_form()).await.unwrap();
    let group = service.get_group(id).await.unwrap();
    let view = service.resolve_group(&group).unwrap();

    assert_eq!(view.id, id);
    assert_eq!(view.location, "Community Gym");
    assert_eq!(view.date, "Fri,Jun 12");
    assert_eq!(view.start_time, "7:30 PM");
    assert_eq!(view.end_time, "9:30 PM");
    assert!(view.can_signup && view.can_retreat);
    assert!(view.single_players.is_empty() && view.double_players.is_empty());
}

#[tokio::test]
async fn invalid_form_is_rejected_without_writing() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);

    let mut form = future_form();
    form.date = Some("12/06/2099".into());
    let err = service.create_group(&form).await.unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
    assert!(err.detail().contains("date"));
    assert!(service.list_groups(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_names_are_rejected_case_insensitively() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();

    service
        .add_player(id, QueueType::Double, "Alice", "1111")
        .await
        .unwrap();
    let err = service
        .add_player(id, QueueType::Double, "  alice ", "2222")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::DuplicateName, _)
    ));
    assert_eq!(err.detail(), "Player with the same name already exists");
    let group = service.get_group(id).await.unwrap();
    assert_eq!(group.double_players.len(), 1);
}

#[tokio::test]
async fn same_name_may_join_both_queues() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();

    let pin = unique_pin();
    service.add_player(id, QueueType::Single, "Alice", &pin).await.unwrap();
    service.add_player(id, QueueType::Double, "Alice", &pin).await.unwrap();

    let group = service.get_group(id).await.unwrap();
    assert_eq!(group.single_players.len(), 1);
    assert_eq!(group.double_players[0].pin, pin);
}

#[tokio::test]
async fn removing_an_absent_name_is_not_found() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();
    service.add_player(id, QueueType::Single, "Alice", "1").await.unwrap();

    let err = service
        .remove_player(id, QueueType::Single, "Bob", "1")
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Player, _)));
    assert_eq!(err.detail(), "Can't find player with that name");
    assert_eq!(service.get_group(id).await.unwrap().single_players.len(), 1);
}

#[tokio::test]
async fn removal_accepts_player_or_organizer_pin_only() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();
    for name in ["Alice", "Bob"] {
        service
            .add_player(id, QueueType::Double, name, &format!("{name}-pin"))
            .await
            .unwrap();
    }

    let err = service
        .remove_player(id, QueueType::Double, "Alice", "Bob-pin")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::WrongCredential(_)));
    assert_eq!(err.detail(), "Wrong PIN");
    assert_eq!(service.get_group(id).await.unwrap().double_players.len(), 2);

    service
        .remove_player(id, QueueType::Double, "alice", "Alice-pin")
        .await
        .unwrap();
    service
        .remove_player(id, QueueType::Double, "Bob", "organizer")
        .await
        .unwrap();
    assert!(service.get_group(id).await.unwrap().double_players.is_empty());
}

#[tokio::test]
async fn withdrawal_promotes_the_waitlist() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();

    service.add_player(id, QueueType::Single, "A", "a").await.unwrap();
    service.add_player(id, QueueType::Single, "B", "b").await.unwrap();

    let view = service
        .resolve_group(&service.get_group(id).await.unwrap())
        .unwrap();
    assert_eq!(names(&view.single_players), ["A"]);
    assert_eq!(names(&view.single_waitlist), ["B"]);

    service.remove_player(id, QueueType::Single, "A", "a").await.unwrap();

    let view = service
        .resolve_group(&service.get_group(id).await.unwrap())
        .unwrap();
    assert_eq!(names(&view.single_players), ["B"]);
    assert!(view.single_waitlist.is_empty());
}

#[tokio::test]
async fn past_sessions_close_signup() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&group_form("2001-03-04")).await.unwrap();

    let view = service
        .resolve_group(&service.get_group(id).await.unwrap())
        .unwrap();
    assert!(!view.can_signup);
    assert!(!view.can_retreat);
}

#[tokio::test]
async fn unknown_group_is_not_found() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);

    let err = service.get_group(77).await.unwrap_err();
    assert_eq!(err, DomainError::group_not_found(77));

    let err = service
        .remove_player(77, QueueType::Double, "A", "a")
        .await
        .unwrap_err();
    assert_eq!(err.detail(), "Can't find group with ID 77");
}

#[tokio::test]
async fn store_write_failures_reach_the_caller() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();
    store.set_fail_writes(true);

    let add = service.add_player(id, QueueType::Single, "A", "a").await;
    assert!(matches!(add, Err(DomainError::Infra(_, _))));

    let create = service.create_group(&future_form()).await;
    assert!(matches!(create, Err(DomainError::Infra(_, _))));

    store.set_fail_writes(false);
    assert!(service.get_group(id).await.unwrap().single_players.is_empty());
}

#[tokio::test]
async fn conflicting_writers_are_retried() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();

    store.inject_concurrent_writes(2);
    service.add_player(id, QueueType::Single, "A", "a").await.unwrap();

    let group = service.get_group(id).await.unwrap();
    assert_eq!(group.single_players.len(), 1);
    // Two simulated writers plus our own commit
    assert_eq!(store.version_of(id), Some(4));
}

#[tokio::test]
async fn exhausted_retries_report_the_conflict() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();

    store.inject_concurrent_writes(3);
    let err = service
        .add_player(id, QueueType::Single, "A", "a")
        .await
        .unwrap_err();

    assert!(err.is_optimistic_lock());
    assert!(service.get_group(id).await.unwrap().single_players.is_empty());
}

fn raw_row(location: &str, single_players: serde_json::Value, limit: i32) -> groups::Model {
    groups::Model {
        id: 0,
        location: location.into(),
        description: None,
        start_time: datetime!(2099-01-01 03:00 UTC),
        end_time: datetime!(2099-01-01 05:00 UTC),
        retreat_deadline: datetime!(2098-12-31 20:00 UTC),
        single_limit: limit,
        double_limit: 4,
        pin: "org".into(),
        single_players,
        double_players: json!([]),
        created_at: datetime!(2098-12-01 00:00 UTC),
        updated_at: datetime!(2098-12-01 00:00 UTC),
        version: 1,
    }
}

#[tokio::test]
async fn malformed_entries_are_dropped_and_corrupt_groups_skipped() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);

    let messy = store.insert_raw(raw_row(
        "Messy",
        json!([
            {"name": "Ann", "pin": "1", "signup_time": "2098-12-20T10:00:00Z"},
            {"pin": "2", "signup_time": "2098-12-20T10:05:00Z"},
            {"name": "Cy", "pin": "3", "signup_time": "yesterday"}
        ]),
        2,
    ));
    let broken = store.insert_raw(raw_row("Broken", json!("not a list"), 2));

    let group = service.get_group(messy).await.unwrap();
    assert_eq!(group.single_players.len(), 1);
    assert_eq!(group.single_players[0].name, "Ann");

    let err = service.get_group(broken).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Infra(InfraErrorKind::DataCorruption, _)
    ));

    let listed = service.list_groups(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, messy);
}

#[tokio::test]
async fn entries_keep_signup_order_after_a_round_trip() {
    let store = MemoryGroupStore::new();
    let service = memory_service(&store);
    let id = service.create_group(&future_form()).await.unwrap();

    for name in ["first", "second", "third"] {
        service.add_player(id, QueueType::Double, name, "p").await.unwrap();
    }

    let group = service.get_group(id).await.unwrap();
    let seqs: Vec<u64> = group.double_players.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, [1, 2, 3]);

    let view = service.resolve_group(&group).unwrap();
    assert_eq!(names(&view.double_players), ["first", "second", "third"]);
}
