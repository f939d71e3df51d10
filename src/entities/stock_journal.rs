use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason attached to a stock movement
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum JournalDescription {
    #[sea_orm(string_value = "sold")]
    Sold,
    #[sea_orm(string_value = "transferred")]
    Transferred,
    #[sea_orm(string_value = "received")]
    Received,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "updated")]
    Updated,
    #[sea_orm(string_value = "sent-mutation")]
    SentMutation,
    #[sea_orm(string_value = "received-mutation")]
    ReceivedMutation,
}

/// Append-only stock movement. Negative quantities are outflows.
///
/// Entries point at a pharmacy drug through the `(drug_id, pharmacy_id)` pair,
/// never through the pharmacy drug id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_journals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub drug_id: Uuid,
    pub pharmacy_id: Uuid,
    pub quantity: i32,
    pub description: JournalDescription,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
