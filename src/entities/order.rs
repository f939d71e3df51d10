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
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(40))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "waiting for payment")]
    #[strum(serialize = "waiting for payment")]
    WaitingForPayment,
    #[sea_orm(string_value = "waiting for payment confirmation")]
    #[strum(serialize = "waiting for payment confirmation")]
    WaitingForPaymentConfirmation,
    #[sea_orm(string_value = "payment confirmed")]
    #[strum(serialize = "payment confirmed")]
    PaymentConfirmed,
    #[sea_orm(string_value = "processed")]
    #[strum(serialize = "processed")]
    Processed,
    #[sea_orm(string_value = "sent")]
    #[strum(serialize = "sent")]
    Sent,
    #[sea_orm(string_value = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "expired")]
    #[strum(serialize = "expired")]
    Expired,
    #[sea_orm(string_value = "invalid payment")]
    #[strum(serialize = "invalid payment")]
    InvalidPayment,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub payment_id: Uuid,
    pub pharmacy_id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub total_price: i64,
    pub shipment_price: i64,
    pub status: OrderStatus,
    pub shipment_method_id: i32,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment::Entity",
        from = "Column::PaymentId",
        to = "super::payment::Column::Id"
    )]
    Payment,
    #[sea_orm(has_many = "super::order_detail::Entity")]
    OrderDetails,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl Related<super::order_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
