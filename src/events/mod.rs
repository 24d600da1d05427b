use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::errors::ServiceError;

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
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Sends an event, logging instead of propagating when the bus is gone.
    /// Event publication must never fail the operation that produced it.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Production order events
    ProductionOrderStateChanged {
        production_order_id: i64,
        old_state: String,
        new_state: String,
    },

    // Work order events
    WorkOrderStarted {
        work_order_id: i64,
        production_order_id: i64,
    },
    WorkOrderFinished {
        work_order_id: i64,
        production_order_id: i64,
    },

    // Outbound bridge events
    OperationEventDelivered {
        production_order_id: i64,
        kind: String,
        log_id: Option<String>,
    },
    OperationEventFailed {
        production_order_id: i64,
        kind: String,
    },
}

// Function to process incoming events and distribute them to the handlers below.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ProductionOrderStateChanged {
                production_order_id,
                ref old_state,
                ref new_state,
            } => {
                info!(
                    "Production order {} moved from {} to {}",
                    production_order_id, old_state, new_state
                );
            }
            Event::WorkOrderStarted {
                work_order_id,
                production_order_id,
            } => {
                if let Err(e) = handle_work_order_started(work_order_id, production_order_id).await
                {
                    error!(
                        "Failed to handle work order started event: work_order_id={}, error={}",
                        work_order_id, e
                    );
                }
            }
            Event::WorkOrderFinished {
                work_order_id,
                production_order_id,
            } => {
                if let Err(e) = handle_work_order_finished(work_order_id, production_order_id).await
                {
                    error!(
                        "Failed to handle work order finished event: work_order_id={}, error={}",
                        work_order_id, e
                    );
                }
            }
            Event::OperationEventDelivered {
                production_order_id,
                ref kind,
                ref log_id,
            } => {
                info!(
                    "Operation event delivered: production_order_id={}, kind={}, log_id={:?}",
                    production_order_id, kind, log_id
                );
            }
            Event::OperationEventFailed {
                production_order_id,
                ref kind,
            } => {
                warn!(
                    "Operation event delivery failed: production_order_id={}, kind={}",
                    production_order_id, kind
                );
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events
async fn handle_work_order_started(
    work_order_id: i64,
    production_order_id: i64,
) -> Result<(), String> {
    info!(
        "Processing work order started event for work order {} on production order {}",
        work_order_id, production_order_id
    );

    Ok(())
}

async fn handle_work_order_finished(
    work_order_id: i64,
    production_order_id: i64,
) -> Result<(), String> {
    info!(
        "Processing work order finished event for work order {} on production order {}",
        work_order_id, production_order_id
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consumer_drains_every_variant_and_stops_on_close() {
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let consumer = tokio::spawn(process_events(rx));

        sender
            .send(Event::WorkOrderStarted {
                work_order_id: 1,
                production_order_id: 10,
            })
            .await
            .unwrap();
        sender
            .send(Event::WorkOrderFinished {
                work_order_id: 1,
                production_order_id: 10,
            })
            .await
            .unwrap();
        sender
            .send(Event::ProductionOrderStateChanged {
                production_order_id: 10,
                old_state: "confirmed".into(),
                new_state: "in_progress".into(),
            })
            .await
            .unwrap();
        sender
            .send(Event::OperationEventDelivered {
                production_order_id: 10,
                kind: "started".into(),
                log_id: Some("77".into()),
            })
            .await
            .unwrap();
        sender
            .send(Event::OperationEventFailed {
                production_order_id: 10,
                kind: "completed".into(),
            })
            .await
            .unwrap();

        drop(sender);
        consumer
            .await
            .expect("event loop exits once the channel closes");
    }

    #[tokio::test]
    async fn send_or_log_swallows_a_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        drop(rx);

        let err = sender
            .send(Event::OperationEventFailed {
                production_order_id: 1,
                kind: "started".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EventError(_)));

        sender
            .send_or_log(Event::OperationEventFailed {
                production_order_id: 1,
                kind: "started".into(),
            })
            .await;
    }
}
