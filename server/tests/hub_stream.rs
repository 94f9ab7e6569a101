//! Broadcast hub fan-out, reaping and lifecycle tests.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use rollcall_core::{AttendanceRecord, HubConfig, NewAttendance, UserProfile};
use rollcall_server::hub::{BroadcastHub, Frame, StreamMessage, Subscription};

fn hub() -> BroadcastHub {
    BroadcastHub::new(HubConfig::default().with_channel_capacity(4))
}

fn attendance(event_id: i64, user_id: i64) -> NewAttendance {
    NewAttendance {
        attendance: AttendanceRecord {
            id: 1,
            event_id,
            user_id,
            timestamp: Utc::now(),
        },
        user: UserProfile {
            id: user_id,
            name: "Sam".to_owned(),
            email: "sam@campus.edu".to_owned(),
            roll_no: None,
            division: None,
            department: "CS".to_owned(),
        },
    }
}

async fn drain_connected(subscription: &mut Subscription) {
    match subscription.frames.recv().await.unwrap() {
        Frame::Message(StreamMessage::Connected { .. }) => {}
        other => panic!("expected connected frame, got {other:?}"),
    }
}

#[tokio::test]
async fn first_frame_is_the_connection_acknowledgement() {
    let hub = hub();
    let mut subscription = hub.subscribe(1).await;

    match subscription.frames.recv().await.unwrap() {
        Frame::Message(StreamMessage::Connected { message, .. }) => {
            assert_eq!(message, "Connected to attendance stream");
        }
        other => panic!("expected connected frame, got {other:?}"),
    }
}

#[tokio::test]
async fn broadcast_reaches_every_subscriber_of_the_event_and_nobody_else() {
    let hub = hub();
    let mut watching_a = hub.subscribe(1).await;
    let mut also_watching_a = hub.subscribe(1).await;
    let mut watching_b = hub.subscribe(2).await;
    drain_connected(&mut watching_a).await;
    drain_connected(&mut also_watching_a).await;
    drain_connected(&mut watching_b).await;

    hub.broadcast(1, StreamMessage::new_attendance(attendance(1, 7)))
        .await;

    for subscription in [&mut watching_a, &mut also_watching_a] {
        match subscription.frames.recv().await.unwrap() {
            Frame::Message(StreamMessage::NewAttendance { data, .. }) => {
                assert_eq!(data.attendance.event_id, 1);
            }
            other => panic!("expected new_attendance frame, got {other:?}"),
        }
    }

    // The other event's subscriber got nothing beyond its ack.
    assert!(watching_b.frames.try_recv().is_err());
}

#[tokio::test]
async fn unsubscribe_prunes_the_event_entry() {
    let hub = hub();
    let subscription = hub.subscribe(1).await;
    assert_eq!(hub.client_count(1).await, 1);

    hub.unsubscribe(1, subscription.id).await;
    assert_eq!(hub.client_count(1).await, 0);
    assert_eq!(hub.total_clients().await, 0);
}

#[tokio::test]
async fn dropped_receiver_is_reaped_on_broadcast() {
    let hub = hub();
    let gone = hub.subscribe(1).await;
    let mut alive = hub.subscribe(1).await;
    drain_connected(&mut alive).await;
    drop(gone);
    assert_eq!(hub.client_count(1).await, 2);

    hub.broadcast(1, StreamMessage::new_attendance(attendance(1, 7)))
        .await;

    assert_eq!(hub.client_count(1).await, 1);
    assert!(matches!(
        alive.frames.recv().await.unwrap(),
        Frame::Message(StreamMessage::NewAttendance { .. })
    ));
}

#[tokio::test]
async fn dropped_receiver_is_reaped_on_heartbeat() {
    let hub = hub();
    let gone = hub.subscribe(1).await;
    let mut alive = hub.subscribe(1).await;
    drain_connected(&mut alive).await;
    drop(gone);

    hub.heartbeat().await;

    assert_eq!(hub.client_count(1).await, 1);
    assert!(matches!(
        alive.frames.recv().await.unwrap(),
        Frame::Heartbeat
    ));
}

#[tokio::test]
async fn subscriber_with_a_full_channel_is_treated_as_dead() {
    let hub = hub();
    // Capacity 4, one slot taken by the ack; never drained.
    let stuck = hub.subscribe(1).await;

    for _ in 0..3 {
        hub.broadcast(1, StreamMessage::new_attendance(attendance(1, 7)))
            .await;
    }
    assert_eq!(hub.client_count(1).await, 1);

    // This push finds the channel full and reaps the subscriber.
    hub.broadcast(1, StreamMessage::new_attendance(attendance(1, 7)))
        .await;
    assert_eq!(hub.client_count(1).await, 0);

    drop(stuck);
}

#[tokio::test]
async fn shutdown_closes_every_channel() {
    let hub = hub();
    let mut one = hub.subscribe(1).await;
    let mut two = hub.subscribe(2).await;
    drain_connected(&mut one).await;
    drain_connected(&mut two).await;

    hub.shutdown().await;

    assert_eq!(hub.total_clients().await, 0);
    // Senders were dropped with the registry, so receivers see the end
    // of their streams.
    assert!(one.frames.recv().await.is_none());
    assert!(two.frames.recv().await.is_none());
}
