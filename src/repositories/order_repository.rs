use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::order::{Column, Entity as Order, Model as OrderModel};
use crate::entities::order_item::{self, Entity as OrderItem, Model as OrderItemModel};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for order operations
#[derive(Debug, Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find an order owned by `supplier_id`
    pub async fn find_for_supplier<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Option<OrderModel>, ServiceError> {
        Order::find_by_id(id)
            .filter(Column::SupplierId.eq(supplier_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_items<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemModel>, ServiceError> {
        OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(conn)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Active orders of a supplier, newest first, each with its items.
    pub async fn find_active_with_items(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<(OrderModel, Vec<OrderItemModel>)>, ServiceError> {
        let db = self.base.get_db();

        let orders = Order::find()
            .filter(Column::SupplierId.eq(supplier_id))
            .filter(Column::IsActive.eq(true))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut by_order: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                (order, items)
            })
            .collect())
    }
}
