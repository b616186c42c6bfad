//! Multicast event fan-out for stream subscribers.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use contentflow_protocols::{EventKind, StreamEvent};

/// Buffered events per subscriber before the connection is considered
/// dead.
const CHANNEL_CAPACITY: usize = 64;

/// Fan-out hub for workflow progress events.
///
/// Subscribers are held in a concurrent registry keyed by connection
/// id. Delivery is best effort: a subscriber whose channel is full or
/// closed is pruned during the send that discovered it, and delivery
/// to the remaining subscribers is unaffected.
pub struct EventBroadcaster {
    /// Active subscribers: connection_id -> event sender.
    connections: DashMap<String, mpsc::Sender<StreamEvent>>,
}

impl EventBroadcaster {
    /// Create a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new subscriber.
    ///
    /// The returned receiver immediately holds a `connected` event
    /// carrying the assigned connection id.
    pub fn subscribe(&self) -> (String, mpsc::Receiver<StreamEvent>) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let hello = StreamEvent::new(
            EventKind::Connected,
            json!({
                "connection_id": id,
                "message": "Stream connection established",
                "timestamp": StreamEvent::timestamp(),
            }),
        );
        // The channel is freshly created, so this cannot fail.
        let _ = tx.try_send(hello);

        debug!(connection_id = %id, "stream subscriber registered");
        self.connections.insert(id.clone(), tx);
        (id, rx)
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, connection_id: &str) {
        if self.connections.remove(connection_id).is_some() {
            debug!(connection_id, "stream subscriber removed");
        }
    }

    /// Deliver an event to one subscriber.
    ///
    /// Returns `false` and drops the connection if delivery fails.
    pub fn send(&self, connection_id: &str, event: StreamEvent) -> bool {
        let Some(tx) = self.connections.get(connection_id).map(|e| e.value().clone())
        else {
            return false;
        };
        if tx.try_send(event).is_err() {
            warn!(connection_id, "subscriber unreachable, dropping");
            self.connections.remove(connection_id);
            return false;
        }
        true
    }

    /// Deliver an event to every subscriber, pruning dead connections.
    ///
    /// Returns the number of successful deliveries.
    pub fn broadcast(&self, event: &StreamEvent) -> usize {
        let targets: Vec<(String, mpsc::Sender<StreamEvent>)> = self
            .connections
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            if tx.try_send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                warn!(connection_id = %id, "subscriber unreachable, dropping");
                self.connections.remove(&id);
            }
        }
        delivered
    }

    /// Number of active subscribers.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Start a periodic heartbeat so idle connections stay open.
    pub fn spawn_heartbeat(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let broadcaster = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let event = StreamEvent::new(
                    EventKind::Heartbeat,
                    json!({
                        "timestamp": StreamEvent::timestamp(),
                        "active_connections": broadcaster.connection_count(),
                    }),
                );
                broadcaster.broadcast(&event);
            }
        })
    }

    /// Notify every subscriber the server is stopping, then drop them
    /// all.
    pub fn shutdown(&self) {
        let goodbye = StreamEvent::new(
            EventKind::Disconnect,
            json!({
                "message": "Server shutting down",
                "timestamp": StreamEvent::timestamp(),
            }),
        );
        let notified = self.broadcast(&goodbye);
        debug!(notified, "stream subscribers disconnected");
        self.connections.clear();
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
