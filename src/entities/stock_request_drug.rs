use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_request_drugs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub stock_request_id: Uuid,
    pub drug_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_request::Entity",
        from = "Column::StockRequestId",
        to = "super::stock_request::Column::Id"
    )]
    StockRequest,
}

impl Related<super::stock_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
