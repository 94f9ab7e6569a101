//! Live broadcast hub.
//!
//! Maintains a per-event registry of live-view subscribers and fans
//! check-in events out to them. Registries are partitioned by event id
//! so a broadcast touches only that event's viewers, not every open
//! connection in the process.
//!
//! Delivery is best-effort: there is no backlog for late joiners and no
//! redelivery after a failed push. A push that fails (closed or
//! saturated channel) removes exactly that subscriber; the rest of the
//! fan-out proceeds. A periodic keep-alive frame prevents idle-timeout
//! disconnection by intermediaries and doubles as the reaper for dead
//! connections.
//!
//! The registry lives in this process only — the known scaling boundary
//! of the design. Running several server processes requires replacing
//! this hub with a shared pub/sub channel per event.

use chrono::{DateTime, Utc};
use rollcall_core::{HubConfig, NewAttendance};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// JSON-framed message pushed to live viewers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Acknowledgement pushed immediately on subscription.
    Connected {
        /// Human-readable confirmation.
        message: String,
        /// Server time of the acknowledgement.
        timestamp: DateTime<Utc>,
    },
    /// A check-in committed for the subscribed event.
    NewAttendance {
        /// The attendance record and attendee identity.
        data: NewAttendance,
        /// Server time of the broadcast.
        timestamp: DateTime<Utc>,
    },
}

impl StreamMessage {
    /// Connection-confirmation message.
    #[must_use]
    pub fn connected() -> Self {
        Self::Connected {
            message: "Connected to attendance stream".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// New-attendance notification.
    #[must_use]
    pub fn new_attendance(data: NewAttendance) -> Self {
        Self::NewAttendance {
            data,
            timestamp: Utc::now(),
        }
    }
}

/// One frame on a subscriber channel.
#[derive(Debug, Clone)]
pub enum Frame {
    /// A JSON-framed [`StreamMessage`].
    Message(StreamMessage),
    /// No-op keep-alive, rendered as an SSE comment.
    Heartbeat,
}

/// Handle to an active subscription.
///
/// Dropping the receiver (client disconnect) makes the next push to
/// this subscriber fail, which removes it from the registry; callers
/// that can observe the disconnect directly should call
/// [`BroadcastHub::unsubscribe`] instead of waiting for that.
#[derive(Debug)]
pub struct Subscription {
    /// Opaque subscriber id, used to unsubscribe.
    pub id: Uuid,
    /// Event this subscription watches.
    pub event_id: i64,
    /// Incoming frames for this subscriber.
    pub frames: mpsc::Receiver<Frame>,
}

type Registry = HashMap<i64, HashMap<Uuid, mpsc::Sender<Frame>>>;

/// In-process fan-out of check-in events to live viewers.
///
/// Cloning the hub clones a handle to the shared registry.
#[derive(Clone)]
pub struct BroadcastHub {
    registry: Arc<Mutex<Registry>>,
    config: HubConfig,
}

impl BroadcastHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Register a new subscriber for `event_id`.
    ///
    /// The connection-confirmation frame is pushed before this returns,
    /// so the first frame a client sees is always `connected`.
    pub async fn subscribe(&self, event_id: i64) -> Subscription {
        // A zero-capacity channel panics; the builder clamps, but the
        // field is public.
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let id = Uuid::new_v4();

        // Queue the acknowledgement before the sender is shared; a
        // fresh channel always has capacity for it.
        let _ = tx.try_send(Frame::Message(StreamMessage::connected()));

        let mut registry = self.registry.lock().await;
        let subscribers = registry.entry(event_id).or_default();
        subscribers.insert(id, tx);

        tracing::info!(
            event_id,
            subscriber_id = %id,
            total = subscribers.len(),
            "Live-view subscriber connected"
        );

        Subscription {
            id,
            event_id,
            frames: rx,
        }
    }

    /// Remove a subscriber. Removing the last subscriber for an event
    /// prunes the event's registry entry entirely.
    pub async fn unsubscribe(&self, event_id: i64, subscriber_id: Uuid) {
        let mut registry = self.registry.lock().await;
        if let Some(subscribers) = registry.get_mut(&event_id) {
            if subscribers.remove(&subscriber_id).is_some() {
                tracing::info!(
                    event_id,
                    subscriber_id = %subscriber_id,
                    remaining = subscribers.len(),
                    "Live-view subscriber disconnected"
                );
            }
            if subscribers.is_empty() {
                registry.remove(&event_id);
            }
        }
    }

    /// Push `message` to every current subscriber of `event_id`,
    /// best-effort and in no particular order.
    ///
    /// A failed push removes only that subscriber; delivery to the
    /// others proceeds.
    pub async fn broadcast(&self, event_id: i64, message: StreamMessage) {
        let mut registry = self.registry.lock().await;
        let Some(subscribers) = registry.get_mut(&event_id) else {
            tracing::debug!(event_id, "No live-view subscribers for broadcast");
            return;
        };

        tracing::debug!(
            event_id,
            subscribers = subscribers.len(),
            "Broadcasting to live viewers"
        );

        let frame = Frame::Message(message);
        subscribers.retain(|id, tx| {
            let alive = tx.try_send(frame.clone()).is_ok();
            if !alive {
                tracing::warn!(event_id, subscriber_id = %id, "Dropping dead live-view subscriber");
            }
            alive
        });
        if subscribers.is_empty() {
            registry.remove(&event_id);
        }
    }

    /// Push one keep-alive frame to every open subscriber across every
    /// event, reaping subscribers whose push fails.
    pub async fn heartbeat(&self) {
        let mut registry = self.registry.lock().await;
        for subscribers in registry.values_mut() {
            subscribers.retain(|id, tx| {
                let alive = tx.try_send(Frame::Heartbeat).is_ok();
                if !alive {
                    tracing::warn!(subscriber_id = %id, "Heartbeat failed, dropping subscriber");
                }
                alive
            });
        }
        registry.retain(|_, subscribers| !subscribers.is_empty());
    }

    /// Spawn the periodic heartbeat task at the configured interval.
    ///
    /// The task runs until aborted or the process exits.
    #[must_use]
    pub fn spawn_heartbeat(&self) -> JoinHandle<()> {
        let hub = self.clone();
        let period = self.config.heartbeat_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick fires immediately; skip it so heartbeats start
            // one full interval after connect.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                hub.heartbeat().await;
            }
        })
    }

    /// Close every open subscriber channel and clear all registries.
    pub async fn shutdown(&self) {
        let mut registry = self.registry.lock().await;
        let total: usize = registry.values().map(HashMap::len).sum();
        registry.clear();
        tracing::info!(closed = total, "Broadcast hub shut down");
    }

    /// Number of subscribers currently watching `event_id`.
    pub async fn client_count(&self, event_id: i64) -> usize {
        self.registry
            .lock()
            .await
            .get(&event_id)
            .map_or(0, HashMap::len)
    }

    /// Total subscribers across all events.
    pub async fn total_clients(&self) -> usize {
        self.registry.lock().await.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hub() -> BroadcastHub {
        BroadcastHub::new(HubConfig::default().with_channel_capacity(4))
    }

    #[tokio::test]
    async fn subscribe_delivers_connected_frame_first() {
        let hub = hub();
        let mut sub = hub.subscribe(5).await;

        let frame = sub.frames.recv().await.unwrap();
        assert!(matches!(
            frame,
            Frame::Message(StreamMessage::Connected { .. })
        ));
    }

    #[tokio::test]
    async fn unsubscribing_last_subscriber_prunes_the_event_entry() {
        let hub = hub();
        let sub = hub.subscribe(5).await;
        assert_eq!(hub.client_count(5).await, 1);

        hub.unsubscribe(5, sub.id).await;
        assert_eq!(hub.client_count(5).await, 0);
        assert!(hub.registry.lock().await.is_empty());
    }

    #[tokio::test]
    async fn zero_capacity_config_still_yields_a_working_channel() {
        // Bypasses the builder clamp by setting the field directly.
        let config = HubConfig {
            channel_capacity: 0,
            ..HubConfig::default()
        };
        let hub = BroadcastHub::new(config);

        let mut sub = hub.subscribe(5).await;
        assert!(matches!(
            sub.frames.recv().await.unwrap(),
            Frame::Message(StreamMessage::Connected { .. })
        ));
    }

    #[tokio::test]
    async fn connected_message_wire_shape() {
        let json = serde_json::to_value(StreamMessage::connected()).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["message"], "Connected to attendance stream");
        assert!(json["timestamp"].is_string());
    }
}
