use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub pharmacy_drug_id: Uuid,
    pub quantity: i32,
    pub is_prescripted: bool,
    pub price: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pharmacy_drug::Entity",
        from = "Column::PharmacyDrugId",
        to = "super::pharmacy_drug::Column::Id"
    )]
    PharmacyDrug,
}

impl Related<super::pharmacy_drug::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PharmacyDrug.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
