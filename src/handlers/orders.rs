use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::common::{created_response, success_response, JsonBody};
use crate::{
    auth::AuthSupplier,
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderDetails, UpdateOrderStatusRequest},
    AppState,
};

/// Places an order. No account is needed to buy.
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    let details = state.services.orders.create_order(request).await?;
    info!(order_id = %details.order.id, "Order accepted");
    Ok(created_response(json!({
        "message": "Order created successfully",
        "order_id": details.order.id,
    })))
}

/// Active orders for the signed-in supplier
pub async fn list_supplier_orders(
    State(state): State<AppState>,
    auth: AuthSupplier,
) -> Result<Json<Vec<OrderDetails>>, ServiceError> {
    let orders = state
        .services
        .orders
        .list_supplier_orders(auth.supplier_id())
        .await?;
    Ok(Json(orders))
}

pub async fn get_supplier_order(
    State(state): State<AppState>,
    auth: AuthSupplier,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetails>, ServiceError> {
    let order = state
        .services
        .orders
        .get_supplier_order(order_id, auth.supplier_id())
        .await?;
    Ok(Json(order))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthSupplier,
    Path(order_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateOrderStatusRequest>,
) -> Result<Response, ServiceError> {
    let updated = state
        .services
        .orders
        .update_order_status(order_id, auth.supplier_id(), request.status)
        .await?;
    Ok(success_response(updated))
}
