//! Domain events.
//!
//! Services publish an event after their transaction commits. A single
//! background task drains the channel and hands each event to a [`Notifier`].
//! Delivery is best effort: a full or closed channel is logged and never
//! fails the operation that produced the event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    // Payment events
    OrderCreated {
        payment_id: Uuid,
        order_ids: Vec<Uuid>,
        user_id: Uuid,
    },
    PaymentProofUploaded(Uuid),
    PaymentConfirmed(Uuid),
    PaymentRejected(Uuid),
    PaymentCancelled(Uuid),
    PaymentExpired(Uuid),

    // Order events
    OrderProcessed {
        order_id: Uuid,
        stock_request_ids: Vec<Uuid>,
    },
    OrderSent(Uuid),
    OrderCancelled {
        order_id: Uuid,
        stock_returned: bool,
    },
    OrderArrived(Uuid),

    // Stock request events
    StockRequestCreated(Uuid),
    StockRequestApproved(Uuid),
    StockRequestCancelled(Uuid),
}

impl Event {
    /// Stable name used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Event::OrderCreated { .. } => "order_created",
            Event::PaymentProofUploaded(_) => "payment_proof_uploaded",
            Event::PaymentConfirmed(_) => "payment_confirmed",
            Event::PaymentRejected(_) => "payment_rejected",
            Event::PaymentCancelled(_) => "payment_cancelled",
            Event::PaymentExpired(_) => "payment_expired",
            Event::OrderProcessed { .. } => "order_processed",
            Event::OrderSent(_) => "order_sent",
            Event::OrderCancelled { .. } => "order_cancelled",
            Event::OrderArrived(_) => "order_arrived",
            Event::StockRequestCreated(_) => "stock_request_created",
            Event::StockRequestApproved(_) => "stock_request_approved",
            Event::StockRequestCancelled(_) => "stock_request_cancelled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, waiting for channel capacity.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Queues an event without waiting. A full or closed channel drops the
    /// event with a warning.
    pub fn publish(&self, event: Event) {
        let name = event.name();
        match self.sender.try_send(event) {
            Ok(()) => {
                metrics::counter!("pharmahub_events.published", 1, "event" => name);
            }
            Err(TrySendError::Full(_)) => {
                metrics::counter!("pharmahub_events.dropped", 1, "event" => name, "reason" => "full");
                warn!(event = name, "Event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                metrics::counter!("pharmahub_events.dropped", 1, "event" => name, "reason" => "closed");
                warn!(event = name, "Event channel closed, dropping event");
            }
        }
    }
}

/// Destination of published events
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &Event) -> Result<(), String>;
}

/// Writes every event to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &Event) -> Result<(), String> {
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;
        info!(event = event.name(), %payload, "Event delivered");
        Ok(())
    }
}

/// Drains the channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, notifier: Arc<dyn Notifier>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        if let Err(e) = notifier.notify(&event).await {
            error!(event = event.name(), error = %e, "Failed to deliver event");
        }
    }

    info!("Event processing loop stopped");
}
