//! End-to-end check-in pipeline tests over the in-memory doubles.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use rollcall_core::{
    CheckinConfig, CheckinError, HubConfig, RosterFilter, TokenConfig, TokenCodec, UserProfile,
};
use rollcall_server::hub::{BroadcastHub, Frame, StreamMessage};
use rollcall_server::mocks::{MemoryCache, MemoryStore};
use rollcall_server::CheckinPipeline;

type TestPipeline = CheckinPipeline<MemoryStore, MemoryCache>;

fn codec() -> TokenCodec {
    TokenCodec::new(&TokenConfig::new("integration-test-secret".to_owned()))
}

fn pipeline() -> (TestPipeline, MemoryStore, MemoryCache, BroadcastHub) {
    let store = MemoryStore::new();
    let cache = MemoryCache::new();
    let hub = BroadcastHub::new(HubConfig::default());
    let pipeline = CheckinPipeline::new(
        store.clone(),
        cache.clone(),
        hub.clone(),
        codec(),
        CheckinConfig::default(),
    );
    (pipeline, store, cache, hub)
}

fn student(id: i64) -> UserProfile {
    UserProfile {
        id,
        name: format!("Student {id}"),
        email: format!("student{id}@campus.edu"),
        roll_no: Some(format!("R{id:03}")),
        division: Some("A".to_owned()),
        department: "CS".to_owned(),
    }
}

#[tokio::test]
async fn checkin_commits_and_notifies() {
    let (pipeline, store, cache, hub) = pipeline();
    store.add_user(student(7));
    let event = store.add_event_on(Utc::now());
    let token = codec().issue(event.id).unwrap();

    let mut subscription = hub.subscribe(event.id).await;
    // Drain the connected frame before checking in.
    match subscription.frames.recv().await.unwrap() {
        Frame::Message(StreamMessage::Connected { .. }) => {}
        other => panic!("expected connected frame, got {other:?}"),
    }

    // Warm the cache so the invalidation is observable.
    let (_, from_cache) = pipeline
        .roster(event.id, &RosterFilter::default())
        .await
        .unwrap();
    assert!(!from_cache);
    assert!(cache.contains(event.id, &RosterFilter::default()));

    let committed = pipeline.check_in(event.id, 7, &token).await.unwrap();
    assert_eq!(committed.attendance.event_id, event.id);
    assert_eq!(committed.attendance.user_id, 7);
    assert_eq!(committed.user.name, "Student 7");
    assert_eq!(store.attendance_count(event.id), 1);

    // Invalidation removed the cached roster snapshot.
    assert!(!cache.contains(event.id, &RosterFilter::default()));

    // The subscriber saw the broadcast.
    match subscription.frames.recv().await.unwrap() {
        Frame::Message(StreamMessage::NewAttendance { data, .. }) => {
            assert_eq!(data.attendance.user_id, 7);
            assert_eq!(data.user.email, "student7@campus.edu");
        }
        other => panic!("expected new_attendance frame, got {other:?}"),
    }
}

#[tokio::test]
async fn checkin_invalidates_filtered_snapshots_too() {
    let (pipeline, store, cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now());
    let token = codec().issue(event.id).unwrap();

    let filters = [
        RosterFilter::default(),
        RosterFilter::by_division("A"),
        RosterFilter::by_department("CS"),
    ];
    for filter in &filters {
        pipeline.roster(event.id, filter).await.unwrap();
        assert!(cache.contains(event.id, filter));
    }

    pipeline.check_in(event.id, 1, &token).await.unwrap();

    for filter in &filters {
        assert!(
            !cache.contains(event.id, filter),
            "filter variant survived invalidation"
        );
    }
}

#[tokio::test]
async fn garbage_token_is_rejected_without_side_effects() {
    let (pipeline, store, _cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now());

    let result = pipeline.check_in(event.id, 1, "not-a-jwt").await;
    assert!(matches!(result, Err(CheckinError::InvalidToken)));
    assert_eq!(store.attendance_count(event.id), 0);
}

#[tokio::test]
async fn token_for_another_event_is_rejected() {
    let (pipeline, store, _cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now());
    let other = store.add_event_on(Utc::now());
    let token = codec().issue(other.id).unwrap();

    let result = pipeline.check_in(event.id, 1, &token).await;
    assert!(matches!(result, Err(CheckinError::TokenEventMismatch)));
    assert_eq!(store.attendance_count(event.id), 0);
}

#[tokio::test]
async fn missing_event_reads_as_not_active() {
    let (pipeline, store, _cache, _hub) = pipeline();
    store.add_user(student(1));
    let token = codec().issue(99).unwrap();

    let result = pipeline.check_in(99, 1, &token).await;
    assert!(matches!(result, Err(CheckinError::EventNotActive)));
}

#[tokio::test]
async fn event_past_grace_window_is_closed() {
    let (pipeline, store, _cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now() - Duration::days(2));
    let token = codec().issue(event.id).unwrap();

    let result = pipeline.check_in(event.id, 1, &token).await;
    assert!(matches!(result, Err(CheckinError::EventNotActive)));
    assert_eq!(store.attendance_count(event.id), 0);
}

#[tokio::test]
async fn yesterdays_event_is_still_inside_the_grace_window() {
    let (pipeline, store, _cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now() - Duration::hours(20));
    let token = codec().issue(event.id).unwrap();

    pipeline.check_in(event.id, 1, &token).await.unwrap();
    assert_eq!(store.attendance_count(event.id), 1);
}

#[tokio::test]
async fn second_checkin_is_rejected_and_store_unchanged() {
    let (pipeline, store, _cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now());
    let token = codec().issue(event.id).unwrap();

    pipeline.check_in(event.id, 1, &token).await.unwrap();
    let second = pipeline.check_in(event.id, 1, &token).await;

    assert!(matches!(second, Err(CheckinError::AlreadyCheckedIn)));
    assert_eq!(store.attendance_count(event.id), 1);
}

#[tokio::test]
async fn concurrent_checkins_commit_exactly_once() {
    let (pipeline, store, _cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now());
    let token = codec().issue(event.id).unwrap();

    let (a, b, c) = tokio::join!(
        pipeline.check_in(event.id, 1, &token),
        pipeline.check_in(event.id, 1, &token),
        pipeline.check_in(event.id, 1, &token),
    );

    let successes = [&a, &b, &c].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one racer may win");
    for result in [a, b, c] {
        if let Err(error) = result {
            assert!(matches!(error, CheckinError::AlreadyCheckedIn));
        }
    }
    assert_eq!(store.attendance_count(event.id), 1);
}

#[tokio::test]
async fn cache_outage_does_not_block_checkin_or_roster() {
    let (pipeline, store, cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now());
    let token = codec().issue(event.id).unwrap();
    cache.set_unavailable(true);

    pipeline.check_in(event.id, 1, &token).await.unwrap();

    let (students, from_cache) = pipeline
        .roster(event.id, &RosterFilter::default())
        .await
        .unwrap();
    assert_eq!(students.len(), 1);
    assert!(!from_cache);
}

#[tokio::test]
async fn roster_read_through_hits_storage_once() {
    let (pipeline, store, _cache, _hub) = pipeline();
    store.add_user(student(1));
    let event = store.add_event_on(Utc::now());
    let token = codec().issue(event.id).unwrap();
    pipeline.check_in(event.id, 1, &token).await.unwrap();

    let filter = RosterFilter::default();
    let (first, from_cache) = pipeline.roster(event.id, &filter).await.unwrap();
    assert!(!from_cache);
    assert_eq!(first.len(), 1);
    let queries_after_miss = store.roster_query_count();

    let (second, from_cache) = pipeline.roster(event.id, &filter).await.unwrap();
    assert!(from_cache);
    assert_eq!(second, first);
    assert_eq!(store.roster_query_count(), queries_after_miss);
}

#[tokio::test]
async fn filtered_rosters_are_cached_independently() {
    let (pipeline, store, _cache, _hub) = pipeline();
    let mut in_b = student(2);
    in_b.division = Some("B".to_owned());
    store.add_user(student(1));
    store.add_user(in_b);
    let event = store.add_event_on(Utc::now());
    for user_id in [1, 2] {
        let token = codec().issue(event.id).unwrap();
        pipeline.check_in(event.id, user_id, &token).await.unwrap();
    }

    let (all, _) = pipeline
        .roster(event.id, &RosterFilter::default())
        .await
        .unwrap();
    let (division_a, _) = pipeline
        .roster(event.id, &RosterFilter::by_division("A"))
        .await
        .unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(division_a.len(), 1);
    assert_eq!(division_a[0].id, 1);

    // The unfiltered snapshot must not shadow the filtered one.
    let (division_a_again, from_cache) = pipeline
        .roster(event.id, &RosterFilter::by_division("A"))
        .await
        .unwrap();
    assert!(from_cache);
    assert_eq!(division_a_again, division_a);
}
