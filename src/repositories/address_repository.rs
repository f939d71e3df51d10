use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::user_address;
use crate::errors::ServiceError;
use crate::services::shipment_pricing::GeoPoint;

/// Checkout destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAddress {
    /// Formatted address, snapshotted onto the payment
    pub address: String,
    pub location: GeoPoint,
    pub city_id: i32,
}

#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolves one of the user's own addresses. Addresses of other users
    /// are reported as not found.
    async fn resolve(&self, address_id: Uuid, user_id: Uuid)
        -> Result<ResolvedAddress, ServiceError>;
}

/// Resolves addresses from the `user_addresses` table
#[derive(Debug, Clone)]
pub struct UserAddressRepository {
    db: Arc<DatabaseConnection>,
}

impl UserAddressRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AddressResolver for UserAddressRepository {
    async fn resolve(
        &self,
        address_id: Uuid,
        user_id: Uuid,
    ) -> Result<ResolvedAddress, ServiceError> {
        let address = user_address::Entity::find_by_id(address_id)
            .filter(user_address::Column::UserId.eq(user_id))
            .filter(user_address::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("address {}", address_id)))?;

        Ok(ResolvedAddress {
            address: address.address,
            location: GeoPoint::new(address.latitude, address.longitude),
            city_id: address.city_id,
        })
    }
}
