use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Domain events emitted after a tracking mutation commits. Delivery is
/// best-effort: a full or closed channel never fails the operation that
/// produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    TrackingItemCreated {
        tracking_item_id: i64,
        tracking_number: String,
    },
    TrackingItemUpdated {
        tracking_item_id: i64,
        tracking_number: String,
    },
    TrackingItemDeleted {
        tracking_item_id: i64,
        tracking_number: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes events off the channel for the lifetime of the process. Currently
/// the sink is the structured log; external consumers would hook in here.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::TrackingItemCreated {
                tracking_item_id,
                tracking_number,
            } => info!(tracking_item_id, %tracking_number, "tracking item created"),
            Event::TrackingItemUpdated {
                tracking_item_id,
                tracking_number,
            } => info!(tracking_item_id, %tracking_number, "tracking item updated"),
            Event::TrackingItemDeleted {
                tracking_item_id,
                tracking_number,
            } => info!(tracking_item_id, %tracking_number, "tracking item deleted"),
        }
    }
}
