use chrono::Utc;
use sea_orm::{
    sea_query::Query, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::{
    pharmacy,
    stock_request::{self, StockRequestStatus},
    stock_request_drug,
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, Default)]
pub struct StockRequestRepository;

impl StockRequestRepository {
    /// Inserts a request and its drug lines.
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        sender_pharmacy_id: Uuid,
        receiver_pharmacy_id: Uuid,
        status: StockRequestStatus,
        lines: &[(Uuid, i32)],
    ) -> Result<(stock_request::Model, Vec<stock_request_drug::Model>), ServiceError> {
        let now = Utc::now();
        let request = stock_request::Model {
            id: Uuid::new_v4(),
            sender_pharmacy_id,
            receiver_pharmacy_id,
            status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        stock_request::Entity::insert(stock_request::ActiveModel::from(request.clone()))
            .exec(conn)
            .await?;

        let drugs: Vec<stock_request_drug::Model> = lines
            .iter()
            .map(|(drug_id, quantity)| stock_request_drug::Model {
                id: Uuid::new_v4(),
                stock_request_id: request.id,
                drug_id: *drug_id,
                quantity: *quantity,
                created_at: now,
            })
            .collect();

        if !drugs.is_empty() {
            stock_request_drug::Entity::insert_many(
                drugs
                    .iter()
                    .cloned()
                    .map(stock_request_drug::ActiveModel::from),
            )
            .exec(conn)
            .await?;
        }

        Ok((request, drugs))
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<stock_request::Model>, ServiceError> {
        let found = stock_request::Entity::find_by_id(id)
            .filter(stock_request::Column::DeletedAt.is_null())
            .one(conn)
            .await?;
        Ok(found)
    }

    pub async fn lock_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<stock_request::Model>, ServiceError> {
        let found = stock_request::Entity::find_by_id(id)
            .filter(stock_request::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(conn)
            .await?;
        Ok(found)
    }

    pub async fn lines_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        request_id: Uuid,
    ) -> Result<Vec<stock_request_drug::Model>, ServiceError> {
        let lines = stock_request_drug::Entity::find()
            .filter(stock_request_drug::Column::StockRequestId.eq(request_id))
            .order_by_asc(stock_request_drug::Column::CreatedAt)
            .all(conn)
            .await?;
        Ok(lines)
    }

    pub async fn lock_lines<C: ConnectionTrait>(
        &self,
        conn: &C,
        request_id: Uuid,
    ) -> Result<Vec<stock_request_drug::Model>, ServiceError> {
        let lines = stock_request_drug::Entity::find()
            .filter(stock_request_drug::Column::StockRequestId.eq(request_id))
            .order_by_asc(stock_request_drug::Column::CreatedAt)
            .lock_exclusive()
            .all(conn)
            .await?;
        Ok(lines)
    }

    /// Leaves `waiting for approval` for `to`, but only when `manager_id`
    /// runs the sending pharmacy. Returns the number of rows moved.
    pub async fn resolve_waiting<C: ConnectionTrait>(
        &self,
        conn: &C,
        request_id: Uuid,
        manager_id: Uuid,
        to: StockRequestStatus,
    ) -> Result<u64, ServiceError> {
        let managed_pharmacies = Query::select()
            .column(pharmacy::Column::Id)
            .from(pharmacy::Entity)
            .and_where(pharmacy::Column::ManagerId.eq(manager_id))
            .and_where(pharmacy::Column::DeletedAt.is_null())
            .to_owned();

        let result = stock_request::Entity::update_many()
            .set(stock_request::ActiveModel {
                status: Set(to),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(stock_request::Column::Id.eq(request_id))
            .filter(stock_request::Column::Status.eq(StockRequestStatus::WaitingForApproval))
            .filter(stock_request::Column::SenderPharmacyId.in_subquery(managed_pharmacies))
            .filter(stock_request::Column::DeletedAt.is_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
