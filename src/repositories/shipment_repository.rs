use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::entities::{pharmacy_shipment_method, shipment_method};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, Default)]
pub struct ShipmentRepository;

impl ShipmentRepository {
    /// The shipment method `method_id` if the pharmacy offers it.
    pub async fn find_for_pharmacy<C: ConnectionTrait>(
        &self,
        conn: &C,
        pharmacy_id: Uuid,
        method_id: i32,
    ) -> Result<Option<shipment_method::Model>, ServiceError> {
        let method = shipment_method::Entity::find()
            .join(
                JoinType::InnerJoin,
                pharmacy_shipment_method::Relation::ShipmentMethod.def().rev(),
            )
            .filter(pharmacy_shipment_method::Column::PharmacyId.eq(pharmacy_id))
            .filter(shipment_method::Column::Id.eq(method_id))
            .one(conn)
            .await?;
        Ok(method)
    }
}
