use crate::{
    db::DbPool,
    entities::{
        order::{self, Model as OrderModel, OrderStatus},
        order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
        product::Model as ProductModel,
    },
    errors::ServiceError,
    events::{Event, HookRegistry},
    metrics::{ORDERS_CREATED, ORDER_CREATION_FAILURES, ORDER_STATUS_CHANGES},
    repositories::{OrderRepository, ProductRepository},
    services::stock_ledger,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

pub const MIXED_SUPPLIERS_MESSAGE: &str = "All products in one order must be from the same supplier";

/// Buyer's order payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 255, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email_address: String,
    #[validate(length(min = 1, max = 32, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 1, max = 255, message = "Pharmacy name is required"))]
    pub pharmacy_name: String,
    #[validate(length(min = 1, message = "Delivery address is required"))]
    pub delivery_address: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    /// Public product token
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// An order with its items, as returned to suppliers.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
    pub has_expired: bool,
}

impl OrderDetails {
    pub fn new(order: OrderModel, items: Vec<OrderItemModel>, now: DateTime<Utc>) -> Self {
        let has_expired = order.has_expired(now);
        Self {
            order,
            items,
            has_expired,
        }
    }
}

/// `now > expiry_date`; informational only.
pub fn has_expired(order: &OrderModel, now: DateTime<Utc>) -> bool {
    order.has_expired(now)
}

/// Order lifecycle: creation with stock decrement and status changes with
/// compensating stock effects.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    hooks: Arc<HookRegistry>,
    order_lifetime: Duration,
    repository: OrderRepository,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, hooks: Arc<HookRegistry>, order_lifetime: Duration) -> Self {
        let repository = OrderRepository::new(db_pool.clone());
        Self {
            db_pool,
            hooks,
            order_lifetime,
            repository,
        }
    }

    /// Creates an order and takes its stock in one transaction.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        match self.create_order_inner(request).await {
            Ok(details) => {
                ORDERS_CREATED.inc();
                Ok(details)
            }
            Err(e) => {
                ORDER_CREATION_FAILURES.inc();
                Err(e)
            }
        }
    }

    async fn create_order_inner(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let lines = resolve_lines(&txn, &request).await?;
        let supplier_id = lines[0].0.supplier_id;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            customer_full_name: Set(request.full_name.trim().to_string()),
            customer_email_address: Set(request.email_address.trim().to_string()),
            customer_phone: Set(request.phone.trim().to_string()),
            customer_pharmacy_name: Set(request.pharmacy_name.trim().to_string()),
            customer_delivery_address: Set(request.delivery_address.trim().to_string()),
            supplier_id: Set(supplier_id),
            status: Set(OrderStatus::Pending),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            expiry_date: Set(now + self.order_lifetime),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::db_error(e)
        })?;

        let mut items = Vec::with_capacity(lines.len());
        for (product, quantity) in &lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                quantity: Set(*quantity),
                price: Set(product.price),
                is_active: Set(true),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;

            stock_ledger::take(&txn, product.id, *quantity).await?;
            items.push(item);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            supplier_id = %supplier_id,
            item_count = items.len(),
            "Order created successfully"
        );

        self.hooks
            .dispatch(Event::OrderCreated {
                order_id,
                supplier_id,
                customer_full_name: order_model.customer_full_name.clone(),
            })
            .await;

        Ok(OrderDetails::new(order_model, items, now))
    }

    /// Moves an order to `new_status`, restoring or re-taking stock when the
    /// order leaves or re-enters an active status.
    #[instrument(skip(self), fields(order_id = %order_id, supplier_id = %supplier_id, new_status = %new_status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        supplier_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderDetails, ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for status update");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderRepository::find_for_supplier(&txn, order_id, supplier_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let items = OrderRepository::find_items(&txn, order_id).await?;

        let old_status = order.status;
        if old_status == new_status {
            info!("Status unchanged; nothing to do");
            return Ok(OrderDetails::new(order, items, Utc::now()));
        }

        match (old_status.holds_stock(), new_status.holds_stock()) {
            (true, false) => {
                for item in &items {
                    stock_ledger::restore(&txn, item.product_id, item.quantity).await?;
                }
            }
            (false, true) => {
                for item in &items {
                    stock_ledger::take(&txn, item.product_id, item.quantity).await?;
                }
            }
            _ => {}
        }

        let is_active = new_status.holds_stock();
        let now = Utc::now();

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.is_active = Set(is_active);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        set_items_active(&txn, order_id, is_active).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit status update");
            ServiceError::DatabaseError(e)
        })?;

        let label = new_status.to_string();
        ORDER_STATUS_CHANGES
            .with_label_values(&[label.as_str()])
            .inc();
        info!(old_status = %old_status, "Order status updated");

        self.hooks
            .dispatch(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            })
            .await;

        let items = items
            .into_iter()
            .map(|item| OrderItemModel { is_active, ..item })
            .collect();
        Ok(OrderDetails::new(updated, items, now))
    }

    /// Active orders of a supplier, newest first
    #[instrument(skip(self))]
    pub async fn list_supplier_orders(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<OrderDetails>, ServiceError> {
        let now = Utc::now();
        let orders = self.repository.find_active_with_items(supplier_id).await?;
        Ok(orders
            .into_iter()
            .map(|(order, items)| OrderDetails::new(order, items, now))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_supplier_order(
        &self,
        order_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<OrderDetails, ServiceError> {
        let db = &*self.db_pool;
        let order = OrderRepository::find_for_supplier(db, order_id, supplier_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let items = OrderRepository::find_items(db, order_id).await?;
        Ok(OrderDetails::new(order, items, Utc::now()))
    }
}

/// Loads every referenced product and checks the single-supplier and stock
/// preconditions. The conditional decrement still has the final say.
async fn resolve_lines(
    txn: &DatabaseTransaction,
    request: &CreateOrderRequest,
) -> Result<Vec<(ProductModel, i32)>, ServiceError> {
    let mut lines: Vec<(ProductModel, i32)> = Vec::with_capacity(request.items.len());

    for item in &request.items {
        let product = ProductRepository::find_by_public_id(txn, &item.product_id)
            .await?
            .ok_or_else(|| {
                warn!(product_id = %item.product_id, "Order references unknown product");
                ServiceError::ValidationError(format!(
                    "Product {} does not exist",
                    item.product_id
                ))
            })?;
        lines.push((product, item.quantity));
    }

    let supplier_id = match lines.first() {
        Some((product, _)) => product.supplier_id,
        None => {
            return Err(ServiceError::ValidationError(
                "At least one item is required".to_string(),
            ))
        }
    };

    if lines.iter().any(|(p, _)| p.supplier_id != supplier_id) {
        return Err(ServiceError::ValidationError(
            MIXED_SUPPLIERS_MESSAGE.to_string(),
        ));
    }

    for (product, quantity) in &lines {
        if *quantity > product.stock_quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "Not enough stock for product {} ({} {}): requested {}, available {}",
                product.product_id, product.name, product.strength, quantity, product.stock_quantity
            )));
        }
    }

    Ok(lines)
}

async fn set_items_active(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    is_active: bool,
) -> Result<(), ServiceError> {
    OrderItemEntity::update_many()
        .col_expr(order_item::Column::IsActive, Expr::value(is_active))
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}
