use crate::{
    db::DbPool,
    entities::{
        abuse_report::AbuseReason,
        notification::{self, Entity as NotificationEntity, Model as NotificationModel},
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Text a supplier receives when a buyer places an order.
pub fn new_order_message(customer_full_name: &str) -> String {
    format!("You have a new order from {}.", customer_full_name)
}

/// Text a supplier receives when one of their products is reported.
pub fn abuse_report_message(product_name: &str, reason: AbuseReason) -> String {
    format!(
        "Your product '{}' has been reported. Main reason: '{}'\nPlease review and take necessary action.",
        product_name,
        reason.label()
    )
}

/// In-app notification store
#[derive(Clone)]
pub struct NotificationService {
    db_pool: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, message))]
    pub async fn create(
        &self,
        recipient_id: Uuid,
        message: String,
    ) -> Result<NotificationModel, ServiceError> {
        let created = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            recipient_id: Set(recipient_id),
            message: Set(message),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(notification_id = %created.id, "Notification created");
        Ok(created)
    }

    /// Notifications for a recipient, newest first
    pub async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> Result<Vec<NotificationModel>, ServiceError> {
        NotificationEntity::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Marks one of the recipient's own notifications as read.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<NotificationModel, ServiceError> {
        let db = &*self.db_pool;
        let existing = NotificationEntity::find_by_id(notification_id)
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        if existing.is_read {
            return Ok(existing);
        }

        let mut active: notification::ActiveModel = existing.into();
        active.is_read = Set(true);
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Marks every unread notification of the recipient as read and returns
    /// how many changed.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, ServiceError> {
        let result = NotificationEntity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(result.rows_affected)
    }
}
