use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{auth::AuthUser, entities::notification::Model as NotificationModel, errors::ServiceError, AppState};

pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<NotificationModel>>, ServiceError> {
    let notifications = state
        .services
        .notifications
        .list_for_recipient(auth.user_id)
        .await?;
    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<NotificationModel>, ServiceError> {
    let notification = state
        .services
        .notifications
        .mark_read(notification_id, auth.user_id)
        .await?;
    Ok(Json(notification))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ServiceError> {
    let updated = state
        .services
        .notifications
        .mark_all_read(auth.user_id)
        .await?;
    Ok(Json(json!({
        "detail": format!("{} notifications marked as read.", updated),
        "updated": updated,
    })))
}
