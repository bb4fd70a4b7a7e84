use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::product::{Column, Entity as Product, Model as ProductModel, Relation};
use crate::entities::{dosage_form, order_item, supplier};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Natural key of a product within a supplier's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalKey<'a> {
    pub name: &'a str,
    pub strength: &'a str,
    pub dosage_form_id: i32,
    pub supplier_id: Uuid,
}

/// Catalog search criteria. `term` matches product, supplier and dosage form
/// names case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter<'a> {
    pub term: Option<&'a str>,
    pub dosage_form_id: Option<i32>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductModel>, ServiceError> {
        Product::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Looks up a product by its public token.
    pub async fn find_by_public_id<C: ConnectionTrait>(
        conn: &C,
        product_id: &str,
    ) -> Result<Option<ProductModel>, ServiceError> {
        Product::find()
            .filter(Column::ProductId.eq(product_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_by_natural_key<C: ConnectionTrait>(
        conn: &C,
        key: &NaturalKey<'_>,
    ) -> Result<Option<ProductModel>, ServiceError> {
        Product::find()
            .filter(Column::SupplierId.eq(key.supplier_id))
            .filter(Column::Name.eq(key.name))
            .filter(Column::Strength.eq(key.strength))
            .filter(Column::DosageFormId.eq(key.dosage_form_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Products of a supplier that are not in `excluded`, oldest first.
    pub async fn find_for_supplier_excluding(
        &self,
        supplier_id: Uuid,
        excluded: Vec<Uuid>,
        limit: u64,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let mut query = Product::find().filter(Column::SupplierId.eq(supplier_id));
        if !excluded.is_empty() {
            query = query.filter(Column::Id.is_not_in(excluded));
        }

        query
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .limit(limit)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// One page of the public catalog plus the total number of matches.
    pub async fn search(
        &self,
        filter: &CatalogFilter<'_>,
        sort: (Column, Order),
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let mut query = Product::find();

        if let Some(term) = filter.term {
            let escaped = term
                .to_lowercase()
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            let pattern = format!("%{}%", escaped);
            let matches = |column: Expr| {
                Expr::expr(Func::lower(column)).like(LikeExpr::new(pattern.as_str()).escape('\\'))
            };

            query = query
                .join(JoinType::InnerJoin, Relation::Supplier.def())
                .join(JoinType::InnerJoin, Relation::DosageForm.def())
                .filter(
                    Condition::any()
                        .add(matches(Expr::col((Product, Column::Name))))
                        .add(matches(Expr::col((supplier::Entity, supplier::Column::Name))))
                        .add(matches(Expr::col((
                            dosage_form::Entity,
                            dosage_form::Column::Name,
                        )))),
                );
        }
        if let Some(dosage_form_id) = filter.dosage_form_id {
            query = query.filter(Column::DosageFormId.eq(dosage_form_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(Column::SupplierId.eq(supplier_id));
        }

        let (column, order) = sort;
        let paginator = query
            .order_by(column, order)
            .order_by_asc(Column::Id)
            .paginate(self.base.get_db(), per_page);

        let total = paginator.num_items().await.map_err(ServiceError::DatabaseError)?;
        let products = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok((products, total))
    }

    /// A supplier's whole catalog, by name.
    pub async fn list_for_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .filter(Column::SupplierId.eq(supplier_id))
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Strength)
            .order_by_asc(Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Number of order lines, active or not, that reference a product.
    pub async fn count_order_items<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
    ) -> Result<u64, ServiceError> {
        order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .count(conn)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
