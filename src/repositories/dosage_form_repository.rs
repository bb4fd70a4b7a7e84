use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::dosage_form::{Column, Entity as DosageForm, Model as DosageFormModel};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

#[derive(Debug, Clone)]
pub struct DosageFormRepository {
    base: BaseRepository,
}

impl DosageFormRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Lower-cased dosage form name to id.
    pub async fn lookup_table(&self) -> Result<HashMap<String, i32>, ServiceError> {
        let forms = DosageForm::find()
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(forms
            .into_iter()
            .map(|form| (form.name.trim().to_lowercase(), form.id))
            .collect())
    }

    pub async fn list_all(&self) -> Result<Vec<DosageFormModel>, ServiceError> {
        DosageForm::find()
            .order_by_asc(Column::Name)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<DosageFormModel>, ServiceError> {
        DosageForm::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
