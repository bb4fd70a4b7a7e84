//! Callbacks run after a transaction commits.
//!
//! Hooks run in registration order. A failing hook is logged and counted and
//! never affects the operation that produced the event, nor the hooks after it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{Event, EventSender};
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::metrics::HOOK_FAILURES;
use crate::repositories::SupplierRepository;
use crate::services::notifications::{abuse_report_message, new_order_message, NotificationService};

#[async_trait]
pub trait PostCommitHook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_commit(&self, event: &Event) -> Result<(), ServiceError>;
}

#[derive(Default, Clone)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn PostCommitHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: Arc<dyn PostCommitHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub async fn dispatch(&self, event: Event) {
        for hook in &self.hooks {
            match hook.on_commit(&event).await {
                Ok(()) => debug!(hook = hook.name(), event = event.kind(), "hook completed"),
                Err(e) => {
                    HOOK_FAILURES.with_label_values(&[hook.name()]).inc();
                    error!(
                        hook = hook.name(),
                        event = event.kind(),
                        error = %e,
                        "post-commit hook failed"
                    );
                }
            }
        }
    }
}

/// Writes supplier notifications for new orders and abuse reports.
pub struct NotificationHook {
    suppliers: SupplierRepository,
    notifications: NotificationService,
}

impl NotificationHook {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            suppliers: SupplierRepository::new(db_pool.clone()),
            notifications: NotificationService::new(db_pool),
        }
    }

    async fn notify_supplier(&self, supplier_id: Uuid, message: String) -> Result<(), ServiceError> {
        let supplier = self
            .suppliers
            .find_by_id(supplier_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))?;

        match supplier.user_id {
            Some(user_id) => {
                self.notifications.create(user_id, message).await?;
                Ok(())
            }
            None => {
                warn!(supplier_id = %supplier_id, "Supplier has no linked user; notification skipped");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl PostCommitHook for NotificationHook {
    fn name(&self) -> &'static str {
        "notification"
    }

    async fn on_commit(&self, event: &Event) -> Result<(), ServiceError> {
        match event {
            Event::OrderCreated {
                supplier_id,
                customer_full_name,
                ..
            } => {
                self.notify_supplier(*supplier_id, new_order_message(customer_full_name))
                    .await
            }
            Event::AbuseReported {
                supplier_id,
                product_name,
                reason,
                ..
            } => {
                self.notify_supplier(*supplier_id, abuse_report_message(product_name, *reason))
                    .await
            }
            _ => Ok(()),
        }
    }
}

/// Forwards every event to the in-process event channel.
pub struct EventPublishHook {
    sender: EventSender,
}

impl EventPublishHook {
    pub fn new(sender: EventSender) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl PostCommitHook for EventPublishHook {
    fn name(&self) -> &'static str {
        "event_publish"
    }

    async fn on_commit(&self, event: &Event) -> Result<(), ServiceError> {
        self.sender
            .send(event.clone())
            .await
            .map_err(ServiceError::InternalError)
    }
}
