use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    order::{self, OrderStatus},
    order_detail, pharmacy, pharmacy_drug,
};
use crate::errors::ServiceError;
use crate::services::order_status::ensure_transition;

/// Order line joined to the stock it draws from, read under a row lock
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct LockedOrderLine {
    pub order_detail_id: Uuid,
    pub pharmacy_drug_id: Uuid,
    pub pharmacy_id: Uuid,
    pub manager_id: Uuid,
    pub drug_id: Uuid,
    pub quantity: i32,
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRepository;

impl OrderRepository {
    pub async fn insert_orders<C: ConnectionTrait>(
        &self,
        conn: &C,
        orders: Vec<order::ActiveModel>,
    ) -> Result<(), ServiceError> {
        if orders.is_empty() {
            return Ok(());
        }
        order::Entity::insert_many(orders).exec(conn).await?;
        Ok(())
    }

    pub async fn insert_details<C: ConnectionTrait>(
        &self,
        conn: &C,
        details: Vec<order_detail::ActiveModel>,
    ) -> Result<(), ServiceError> {
        if details.is_empty() {
            return Ok(());
        }
        order_detail::Entity::insert_many(details).exec(conn).await?;
        Ok(())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<order::Model>, ServiceError> {
        Ok(order::Entity::find_by_id(id).one(conn).await?)
    }

    pub async fn find_by_payment<C: ConnectionTrait>(
        &self,
        conn: &C,
        payment_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::PaymentId.eq(payment_id))
            .order_by_asc(order::Column::CreatedAt)
            .all(conn)
            .await?;
        Ok(orders)
    }

    pub async fn details_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<order_detail::Model>, ServiceError> {
        let details = order_detail::Entity::find()
            .filter(order_detail::Column::OrderId.eq(order_id))
            .all(conn)
            .await?;
        Ok(details)
    }

    /// Locks the order's lines together with the pharmacy drugs they draw
    /// from (`SELECT ... FOR UPDATE`).
    pub async fn lock_order_lines<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<LockedOrderLine>, ServiceError> {
        let lines = order_detail::Entity::find()
            .select_only()
            .column_as(order_detail::Column::Id, "order_detail_id")
            .column_as(order_detail::Column::PharmacyDrugId, "pharmacy_drug_id")
            .column_as(pharmacy_drug::Column::PharmacyId, "pharmacy_id")
            .column_as(pharmacy::Column::ManagerId, "manager_id")
            .column_as(pharmacy_drug::Column::DrugId, "drug_id")
            .column_as(order_detail::Column::Quantity, "quantity")
            .column_as(pharmacy_drug::Column::Stock, "stock")
            .join(JoinType::InnerJoin, order_detail::Relation::PharmacyDrug.def())
            .join(JoinType::InnerJoin, pharmacy_drug::Relation::Pharmacy.def())
            .filter(order_detail::Column::OrderId.eq(order_id))
            .order_by_asc(order_detail::Column::CreatedAt)
            .lock_exclusive()
            .into_model::<LockedOrderLine>()
            .all(conn)
            .await?;
        Ok(lines)
    }

    /// Moves one order to `to` only while its status is one of `expected`.
    /// A concurrent transition makes this fail with `NoValidOrderPayment`;
    /// a move the status table forbids fails with `InternalError`.
    pub async fn transition<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        expected: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<(), ServiceError> {
        ensure_transition(expected, to)?;
        let result = order::Entity::update_many()
            .set(order::ActiveModel {
                status: Set(to),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.is_in(expected.iter().copied()))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NoValidOrderPayment(format!(
                "order {} is no longer {}",
                order_id,
                describe(expected)
            )));
        }
        Ok(())
    }

    /// Moves every order of a payment whose status is one of `expected`.
    /// Returns how many orders moved.
    pub async fn transition_by_payment<C: ConnectionTrait>(
        &self,
        conn: &C,
        payment_id: Uuid,
        expected: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<u64, ServiceError> {
        ensure_transition(expected, to)?;
        let result = order::Entity::update_many()
            .set(order::ActiveModel {
                status: Set(to),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(order::Column::PaymentId.eq(payment_id))
            .filter(order::Column::Status.is_in(expected.iter().copied()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Stamps `finished_at` on a sent order that has not been finished yet.
    pub async fn mark_finished<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let result = order::Entity::update_many()
            .set(order::ActiveModel {
                finished_at: Set(Some(at)),
                updated_at: Set(at),
                ..Default::default()
            })
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(OrderStatus::Sent))
            .filter(order::Column::FinishedAt.is_null())
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NoValidOrderPayment(format!(
                "order {} is not awaiting arrival",
                order_id
            )));
        }
        Ok(())
    }
}

fn describe(statuses: &[OrderStatus]) -> String {
    statuses
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}
