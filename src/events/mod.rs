use crate::entities::{abuse_report::AbuseReason, order::OrderStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

pub mod hooks;

pub use hooks::{EventPublishHook, HookRegistry, NotificationHook, PostCommitHook};

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

/// Facts published once the transaction that produced them has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        supplier_id: Uuid,
        customer_full_name: String,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    ProductsImported {
        supplier_id: Uuid,
        created: usize,
        updated: usize,
        failed_rows: usize,
    },
    AbuseReported {
        report_id: Uuid,
        product_id: Uuid,
        product_name: String,
        supplier_id: Uuid,
        reason: AbuseReason,
    },
    CatalogPosted {
        post_id: Uuid,
        supplier_id: Uuid,
        product_count: usize,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::OrderCreated { .. } => "order_created",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::ProductsImported { .. } => "products_imported",
            Event::AbuseReported { .. } => "abuse_reported",
            Event::CatalogPosted { .. } => "catalog_posted",
        }
    }
}

/// Drains the event channel, logging each event until every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processing loop started");

    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                supplier_id,
                ..
            } => {
                info!(order_id = %order_id, supplier_id = %supplier_id, "Order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Order status changed"
                );
            }
            Event::ProductsImported {
                supplier_id,
                created,
                updated,
                failed_rows,
            } => {
                if *failed_rows > 0 {
                    warn!(
                        supplier_id = %supplier_id,
                        created, updated, failed_rows,
                        "Product import finished with row errors"
                    );
                } else {
                    info!(supplier_id = %supplier_id, created, updated, "Product import finished");
                }
            }
            Event::AbuseReported {
                report_id,
                product_id,
                reason,
                ..
            } => {
                warn!(
                    report_id = %report_id,
                    product_id = %product_id,
                    reason = %reason,
                    "Product reported"
                );
            }
            Event::CatalogPosted {
                post_id,
                supplier_id,
                product_count,
            } => {
                info!(
                    post_id = %post_id,
                    supplier_id = %supplier_id,
                    product_count,
                    "Catalog posted"
                );
            }
        }
    }

    warn!("Event processing loop has ended");
}
