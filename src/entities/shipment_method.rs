use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Courier offering. Low ids are in-house couriers priced per kilometer,
/// the rest are quoted by a third-party rate API.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipment_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub courier_name: String,
    pub price_per_km: i64,
    pub estimated_days: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
