use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use utoipa::ToSchema;

/// Events pushed to real-time subscribers. Serialized as JSON with a `type`
/// discriminator so clients can dispatch without inspecting payload shape.
#[derive(Serialize, ToSchema, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    NewOrder {
        order_id: i32,
        status: String,
        customer_name: String,
        order_total_cents: i64,
        created_at: DateTime<Utc>,
    },
    OrderStatus {
        order_id: i32,
        status: String,
        message: String,
    },
    PaymentStatus {
        order_id: i32,
        payment_id: i32,
        payment_status: String,
        message: String,
    },
}

/// Restaurant-owner channel for a restaurant's incoming orders.
pub fn restaurant_topic(restaurant_id: i32) -> String {
    format!("restaurant_{}", restaurant_id)
}

/// Per-customer channel for order/payment status updates.
pub fn customer_topic(user_id: i32) -> String {
    format!("user_{}", user_id)
}

/// Fire-and-forget notification port. Implementations must never block the
/// caller or surface delivery failures; the order workflow publishes only
/// after its transaction has committed.
pub trait Notifier: Send + Sync {
    fn publish(&self, topic: &str, event: &OrderEvent);
}

/// In-memory topic registry over tokio broadcast channels. Disconnected or
/// lagging subscribers drop events; there is no replay.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, broadcast::Sender<String>>>,
    capacity: usize,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(32)
    }
}

impl ChannelRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Join a topic, creating its channel on first use.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<String> {
        let mut channels = self.channels.write().unwrap();
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

impl Notifier for ChannelRegistry {
    fn publish(&self, topic: &str, event: &OrderEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!("publish: failed to serialize event for topic '{}': {}", topic, e);
                return;
            }
        };

        let channels = self.channels.read().unwrap();
        match channels.get(topic) {
            Some(sender) => {
                // Err means no live receivers, which is fine for at-most-once.
                if sender.send(payload).is_err() {
                    debug!("publish: no subscribers on topic '{}'", topic);
                }
            }
            None => {
                debug!("publish: topic '{}' has never been subscribed", topic);
            }
        }
    }
}

/// Notifier that drops everything. Used where a workflow is exercised
/// without any real-time consumers.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn publish(&self, _topic: &str, _event: &OrderEvent) {}
}
