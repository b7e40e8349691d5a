use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Queues an event for the worker, waiting if the channel is full.
    /// Fails only when the receiving worker has shut down.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("event channel unavailable: {}", e))
    }
}

/// Domain events emitted after successful writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Supplier events
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),

    // Inventory item events
    ItemCreated(Uuid),
    ItemUpdated(Uuid),
    ItemDeleted(Uuid),

    // Stock movement events
    TransactionRecorded {
        transaction_id: Uuid,
        item_id: Uuid,
        transaction_type: String,
        quantity: i32,
        new_item_quantity: i32,
    },
    LowStockDetected {
        item_id: Uuid,
        quantity: i32,
        threshold: i32,
    },
}

/// Drains the event channel until every sender is gone. Runs as a
/// dedicated tokio task spawned at startup.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Event worker started");

    while let Some(event) = rx.recv().await {
        match event {
            Event::TransactionRecorded {
                transaction_id,
                item_id,
                ref transaction_type,
                quantity,
                new_item_quantity,
            } => {
                info!(
                    %transaction_id,
                    %item_id,
                    transaction_type = %transaction_type,
                    quantity,
                    new_item_quantity,
                    "Inventory transaction recorded"
                );
            }
            Event::LowStockDetected {
                item_id,
                quantity,
                threshold,
            } => {
                if let Err(e) = handle_low_stock(item_id, quantity, threshold).await {
                    warn!("Failed to handle low stock event: item_id={}, error={}", item_id, e);
                }
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    warn!("Event channel closed; worker exiting");
}

// Hook point for replenishment notifications; for now the signal is only logged
async fn handle_low_stock(item_id: Uuid, quantity: i32, threshold: i32) -> Result<(), String> {
    warn!(
        %item_id,
        quantity,
        threshold,
        "Item stock at or below threshold"
    );
    Ok(())
}
