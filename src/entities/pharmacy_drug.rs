use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sellable (pharmacy, drug) pairing with its own stock and price.
///
/// `stock` is only ever changed through
/// [`InventoryLedger`](crate::repositories::inventory_ledger::InventoryLedger).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pharmacy_drugs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub drug_id: Uuid,
    pub category_id: Option<Uuid>,
    pub stock: i32,
    pub price: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pharmacy::Entity",
        from = "Column::PharmacyId",
        to = "super::pharmacy::Column::Id"
    )]
    Pharmacy,
    #[sea_orm(
        belongs_to = "super::drug::Entity",
        from = "Column::DrugId",
        to = "super::drug::Column::Id"
    )]
    Drug,
}

impl Related<super::pharmacy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pharmacy.def()
    }
}

impl Related<super::drug::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drug.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
