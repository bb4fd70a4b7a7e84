//! Conditional stock mutations.
//!
//! Both functions run on whatever connection they are given, so callers pass
//! their open transaction and a failure rolls back together with the rest of
//! the operation. Stock never goes below zero: a decrement that would do so
//! matches no row and is reported as [`ServiceError::InsufficientStock`].

use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::product::{self, Entity as Product};
use crate::errors::ServiceError;
use crate::metrics::STOCK_CONFLICTS;

/// Removes `quantity` units from a product's stock in one conditional update.
pub async fn take<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> Result<(), ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(format!(
            "Quantity must be at least 1, got {}",
            quantity
        )));
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::StockQuantity.gte(quantity))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        STOCK_CONFLICTS.inc();
        let current = Product::find_by_id(product_id)
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        return match current {
            Some(p) => {
                warn!(
                    product_id = %product_id,
                    requested = quantity,
                    available = p.stock_quantity,
                    "Stock decrement rejected"
                );
                Err(ServiceError::InsufficientStock(format!(
                    "Not enough stock for product {} ({} {}): requested {}, available {}",
                    p.product_id, p.name, p.strength, quantity, p.stock_quantity
                )))
            }
            None => Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            ))),
        };
    }

    debug!(product_id = %product_id, quantity, "Stock taken");
    Ok(())
}

/// Returns `quantity` units to a product's stock.
pub async fn restore<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> Result<(), ServiceError> {
    if quantity <= 0 {
        return Ok(());
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).add(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "Product {} not found",
            product_id
        )));
    }

    debug!(product_id = %product_id, quantity, "Stock restored");
    Ok(())
}
