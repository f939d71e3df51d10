use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::payment;
use crate::errors::ServiceError;

/// Payment writes are guarded on the columns the status is derived from, so
/// a write only lands while the payment is still in the state the caller saw.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        payment: payment::ActiveModel,
    ) -> Result<payment::Model, ServiceError> {
        Ok(payment.insert(conn).await?)
    }

    /// Finds a payment, soft-deleted ones included.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<payment::Model>, ServiceError> {
        Ok(payment::Entity::find_by_id(id).one(conn).await?)
    }

    pub async fn lock_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<payment::Model>, ServiceError> {
        Ok(payment::Entity::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await?)
    }

    /// Stores a proof on an open payment that has none yet.
    pub async fn attach_proof<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        proof: String,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let result = payment::Entity::update_many()
            .set(payment::ActiveModel {
                proof: Set(Some(proof)),
                expired_at: Set(Some(expires_at)),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(payment::Column::Id.eq(id))
            .filter(payment::Column::DeletedAt.is_null())
            .filter(payment::Column::Proof.is_null())
            .filter(payment::Column::ExpiredAt.gt(now))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Clears the expiry of a payment with a pending proof.
    pub async fn confirm<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let result = payment::Entity::update_many()
            .set(payment::ActiveModel {
                expired_at: Set(None),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(payment::Column::Id.eq(id))
            .filter(payment::Column::DeletedAt.is_null())
            .filter(payment::Column::Proof.is_not_null())
            .filter(payment::Column::ExpiredAt.is_not_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Drops a pending proof and reopens the payment until `expires_at`.
    pub async fn reject<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let result = payment::Entity::update_many()
            .set(payment::ActiveModel {
                proof: Set(None),
                expired_at: Set(Some(expires_at)),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(payment::Column::Id.eq(id))
            .filter(payment::Column::DeletedAt.is_null())
            .filter(payment::Column::Proof.is_not_null())
            .filter(payment::Column::ExpiredAt.is_not_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Soft-deletes a payment that has not been confirmed.
    pub async fn soft_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let result = payment::Entity::update_many()
            .set(payment::ActiveModel {
                deleted_at: Set(Some(now)),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(payment::Column::Id.eq(id))
            .filter(payment::Column::DeletedAt.is_null())
            .filter(payment::Column::ExpiredAt.is_not_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
