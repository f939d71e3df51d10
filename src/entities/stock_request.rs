use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum StockRequestStatus {
    #[sea_orm(string_value = "waiting for approval")]
    #[strum(serialize = "waiting for approval")]
    WaitingForApproval,
    #[sea_orm(string_value = "approved")]
    #[strum(serialize = "approved")]
    Approved,
    #[sea_orm(string_value = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
}

/// Transfer instruction moving drug stock from the sender to the receiver pharmacy
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sender_pharmacy_id: Uuid,
    pub receiver_pharmacy_id: Uuid,
    pub status: StockRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_request_drug::Entity")]
    StockRequestDrugs,
}

impl Related<super::stock_request_drug::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRequestDrugs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
