use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A supplier's catalog entry.
///
/// `(name, strength, dosage_form_id, supplier_id)` is the natural key used by
/// the bulk importer. `stock_quantity` is only ever changed through
/// [`crate::services::stock_ledger`], an import upsert or a supplier edit, and
/// never goes below zero.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Public token used in URLs and order payloads.
    #[sea_orm(unique)]
    pub product_id: String,
    pub name: String,
    pub strength: String,
    pub expire_date: Option<NaiveDate>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub dosage_form_id: i32,
    pub supplier_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_delete = "Cascade"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::dosage_form::Entity",
        from = "Column::DosageFormId",
        to = "super::dosage_form::Column::Id"
    )]
    DosageForm,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::dosage_form::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DosageForm.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active_model.product_id {
                active_model.product_id = Set(new_public_id());
            }
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

/// Fresh public product token.
pub fn new_public_id() -> String {
    Uuid::new_v4().simple().to_string()
}
