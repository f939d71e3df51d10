use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pharmacy_shipment_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub shipment_method_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipment_method::Entity",
        from = "Column::ShipmentMethodId",
        to = "super::shipment_method::Column::Id"
    )]
    ShipmentMethod,
}

impl Related<super::shipment_method::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShipmentMethod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
