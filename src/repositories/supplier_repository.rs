use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::supplier::{Column, Entity as Supplier, Model as SupplierModel};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for supplier profiles
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    base: BaseRepository,
}

impl SupplierRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SupplierModel>, ServiceError> {
        Supplier::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Supplier profile owned by a user account, if any.
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SupplierModel>, ServiceError> {
        Supplier::find()
            .filter(Column::UserId.eq(user_id))
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// All suppliers in a stable order: oldest first, id as tie-breaker.
    pub async fn list_in_posting_order(&self) -> Result<Vec<SupplierModel>, ServiceError> {
        Supplier::find()
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_many(&self, ids: Vec<Uuid>) -> Result<Vec<SupplierModel>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Supplier::find()
            .filter(Column::Id.is_in(ids))
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
