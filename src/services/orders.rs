use chrono::Utc;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::Transactor;
use crate::entities::{
    order::{self, OrderStatus},
    order_detail,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::{OrderRepository, PaymentRepository, PharmacyRepository};

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub details: Vec<order_detail::Model>,
}

/// Order reads and the delivery half of the order lifecycle
#[derive(Clone)]
pub struct OrderService {
    transactor: Transactor,
    events: EventSender,
    orders: OrderRepository,
}

impl OrderService {
    pub fn new(transactor: Transactor, events: EventSender) -> Self {
        Self {
            transactor,
            events,
            orders: OrderRepository,
        }
    }

    /// An order with its lines, for the buyer, the pharmacy's manager or an
    /// admin.
    #[instrument(skip(self, actor), fields(order_id = %order_id))]
    pub async fn get_order(&self, actor: &Actor, order_id: Uuid) -> Result<OrderView, ServiceError> {
        let conn = self.transactor.connection();
        let order = self.find(conn, order_id).await?;

        match actor {
            Actor::Admin { .. } => {}
            Actor::User { id, .. } => ensure_buyer(conn, &order, *id).await?,
            Actor::Manager { id, .. } => ensure_manager(conn, &order, *id).await?,
            Actor::Doctor { .. } => {
                return Err(ServiceError::Unauthorized(
                    "doctors can't access orders".to_string(),
                ))
            }
        }

        let details = self.orders.details_of(conn, order_id).await?;
        Ok(OrderView { order, details })
    }

    /// Hands a processed order to the courier.
    #[instrument(skip(self, actor), fields(order_id = %order_id, manager_id = %actor.id()))]
    pub async fn send_order(&self, actor: &Actor, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let manager_id = actor.require_manager()?;
        let orders = self.orders;

        let order = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let order = find_order(txn, orders, order_id).await?;
                    ensure_manager(txn, &order, manager_id).await?;
                    orders
                        .transition(txn, order_id, &[OrderStatus::Processed], OrderStatus::Sent)
                        .await?;
                    find_order(txn, orders, order_id).await
                })
            })
            .await?;

        info!(order_id = %order_id, "Order sent");
        self.events.publish(Event::OrderSent(order_id));
        Ok(order)
    }

    /// The buyer confirms a sent order has arrived.
    #[instrument(skip(self, actor), fields(order_id = %order_id, user_id = %actor.id()))]
    pub async fn confirm_arrival(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let user_id = actor.require_user()?;
        let orders = self.orders;

        let order = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let order = find_order(txn, orders, order_id).await?;
                    ensure_buyer(txn, &order, user_id).await?;
                    orders.mark_finished(txn, order_id, Utc::now()).await?;
                    find_order(txn, orders, order_id).await
                })
            })
            .await?;

        info!(order_id = %order_id, "Order arrived");
        self.events.publish(Event::OrderArrived(order_id));
        Ok(order)
    }

    async fn find<C: ConnectionTrait>(&self, conn: &C, order_id: Uuid) -> Result<order::Model, ServiceError> {
        find_order(conn, self.orders, order_id).await
    }
}

async fn find_order<C: ConnectionTrait>(
    conn: &C,
    orders: OrderRepository,
    order_id: Uuid,
) -> Result<order::Model, ServiceError> {
    orders
        .find_by_id(conn, order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))
}

/// Someone else's order is reported as missing.
async fn ensure_buyer<C: ConnectionTrait>(
    conn: &C,
    order: &order::Model,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    let owned = PaymentRepository
        .find_by_id(conn, order.payment_id)
        .await?
        .map(|payment| payment.user_id == user_id)
        .unwrap_or(false);
    if !owned {
        return Err(ServiceError::NotFound(format!("order {}", order.id)));
    }
    Ok(())
}

async fn ensure_manager<C: ConnectionTrait>(
    conn: &C,
    order: &order::Model,
    manager_id: Uuid,
) -> Result<(), ServiceError> {
    if !PharmacyRepository
        .is_managed_by(conn, order.pharmacy_id, manager_id)
        .await?
    {
        return Err(ServiceError::Unauthorized(format!(
            "order {} is not handled by this manager",
            order.id
        )));
    }
    Ok(())
}
