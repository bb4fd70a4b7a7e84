use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Fixed set of reasons a product can be reported for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AbuseReason {
    #[sea_orm(string_value = "illegal_fraudulent")]
    IllegalFraudulent,
    #[sea_orm(string_value = "spam")]
    Spam,
    #[sea_orm(string_value = "wrong_price")]
    WrongPrice,
    #[sea_orm(string_value = "wrong_category")]
    WrongCategory,
    #[sea_orm(string_value = "prepayment")]
    Prepayment,
    #[sea_orm(string_value = "sold")]
    Sold,
    #[sea_orm(string_value = "unreachable_user")]
    UnreachableUser,
    #[sea_orm(string_value = "counterfeit")]
    Counterfeit,
    #[sea_orm(string_value = "offensive_content")]
    OffensiveContent,
    #[sea_orm(string_value = "misleading")]
    Misleading,
    #[sea_orm(string_value = "duplicate")]
    Duplicate,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "prohibited_item")]
    ProhibitedItem,
    #[sea_orm(string_value = "other")]
    Other,
}

impl AbuseReason {
    /// Human-readable label shown to suppliers.
    pub fn label(self) -> &'static str {
        match self {
            AbuseReason::IllegalFraudulent => "This is illegal/fraudulent",
            AbuseReason::Spam => "This product is spam",
            AbuseReason::WrongPrice => "The price is wrong",
            AbuseReason::WrongCategory => "Wrong category",
            AbuseReason::Prepayment => "Seller asked for prepayment",
            AbuseReason::Sold => "It is sold",
            AbuseReason::UnreachableUser => "User is unreachable",
            AbuseReason::Counterfeit => "This product is counterfeit/fake",
            AbuseReason::OffensiveContent => "Contains offensive or inappropriate content",
            AbuseReason::Misleading => "Misleading or false information",
            AbuseReason::Duplicate => "Duplicate listing",
            AbuseReason::Expired => "Product expired or outdated",
            AbuseReason::ProhibitedItem => "Prohibited item for sale",
            AbuseReason::Other => "Other",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "abuse_reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub reporter_email: String,
    pub reason: AbuseReason,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub reported_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
