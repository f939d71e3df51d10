use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::entities::{pharmacy, pharmacy_drug};
use crate::errors::ServiceError;

/// Pharmacy able to give away stock of a drug
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct DonorCandidate {
    pub pharmacy_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PharmacyRepository;

impl PharmacyRepository {
    pub async fn find_active<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<pharmacy::Model>, ServiceError> {
        let found = pharmacy::Entity::find_by_id(id)
            .filter(pharmacy::Column::DeletedAt.is_null())
            .one(conn)
            .await?;
        Ok(found)
    }

    /// Whether `manager_id` runs the pharmacy.
    pub async fn is_managed_by<C: ConnectionTrait>(
        &self,
        conn: &C,
        pharmacy_id: Uuid,
        manager_id: Uuid,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .find_active(conn, pharmacy_id)
            .await?
            .map(|p| p.manager_id == manager_id)
            .unwrap_or(false))
    }

    /// Other pharmacies of `manager_id` holding at least `min_stock` units of
    /// the drug, locked for the rest of the transaction.
    pub async fn lock_donor_candidates<C: ConnectionTrait>(
        &self,
        conn: &C,
        manager_id: Uuid,
        excluded_pharmacy_id: Uuid,
        drug_id: Uuid,
        min_stock: i32,
    ) -> Result<Vec<DonorCandidate>, ServiceError> {
        let candidates = pharmacy_drug::Entity::find()
            .select_only()
            .column_as(pharmacy::Column::Id, "pharmacy_id")
            .column_as(pharmacy::Column::Latitude, "latitude")
            .column_as(pharmacy::Column::Longitude, "longitude")
            .column_as(pharmacy_drug::Column::Stock, "stock")
            .join(JoinType::InnerJoin, pharmacy_drug::Relation::Pharmacy.def())
            .filter(pharmacy::Column::ManagerId.eq(manager_id))
            .filter(pharmacy::Column::Id.ne(excluded_pharmacy_id))
            .filter(pharmacy::Column::DeletedAt.is_null())
            .filter(pharmacy_drug::Column::DrugId.eq(drug_id))
            .filter(pharmacy_drug::Column::DeletedAt.is_null())
            .filter(pharmacy_drug::Column::Stock.gte(min_stock))
            .lock_exclusive()
            .into_model::<DonorCandidate>()
            .all(conn)
            .await?;
        Ok(candidates)
    }
}
