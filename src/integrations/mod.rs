//! Outbound integrations.

pub mod telegram;

use async_trait::async_trait;

use crate::errors::ServiceError;

pub use telegram::TelegramPublisher;

/// Publishes a rendered catalog post somewhere public.
#[async_trait]
pub trait CatalogPublisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<(), ServiceError>;
}
