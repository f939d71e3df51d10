//! Payment status derivation and the payment lifecycle.

use chrono::{DateTime, Duration, Utc};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::Actor;
use crate::config::AppConfig;
use crate::db::Transactor;
use crate::entities::{
    order::{self, OrderStatus},
    payment,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::{OrderRepository, PaymentRepository};
use crate::services::order_status::CANCELLABLE_WITH_PAYMENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[strum(serialize = "waiting for payment")]
    WaitingForPayment,
    #[strum(serialize = "waiting for payment confirmation")]
    WaitingForPaymentConfirmation,
    #[strum(serialize = "payment confirmed")]
    PaymentConfirmed,
    #[strum(serialize = "payment expired")]
    PaymentExpired,
    #[strum(serialize = "cancelled")]
    Cancelled,
    #[strum(serialize = "invalid payment")]
    InvalidPayment,
}

/// Derives the status of a payment from its stored columns at `now`.
///
/// A deleted payment is cancelled. An uploaded proof keeps the payment
/// waiting for confirmation even after its expiry has passed. An expiry at
/// exactly `now` counts as passed.
pub fn derive_payment_status(
    deleted_at: Option<DateTime<Utc>>,
    expired_at: Option<DateTime<Utc>>,
    proof: Option<&str>,
    now: DateTime<Utc>,
) -> PaymentStatus {
    if deleted_at.is_some() {
        return PaymentStatus::Cancelled;
    }

    match (expired_at, proof.is_some()) {
        (Some(_), true) => PaymentStatus::WaitingForPaymentConfirmation,
        (Some(expires), false) if expires > now => PaymentStatus::WaitingForPayment,
        (Some(_), false) => PaymentStatus::PaymentExpired,
        (None, true) => PaymentStatus::PaymentConfirmed,
        (None, false) => {
            warn!("Payment has neither an expiry nor a proof");
            PaymentStatus::InvalidPayment
        }
    }
}

pub fn status_of(payment: &payment::Model, now: DateTime<Utc>) -> PaymentStatus {
    derive_payment_status(
        payment.deleted_at,
        payment.expired_at,
        payment.proof.as_deref(),
        now,
    )
}

/// A payment with its derived status and orders
#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: payment::Model,
    pub status: PaymentStatus,
    pub orders: Vec<order::Model>,
}

#[derive(Clone)]
pub struct PaymentService {
    transactor: Transactor,
    events: EventSender,
    payments: PaymentRepository,
    orders: OrderRepository,
    payment_expiry: Duration,
    confirmation_window: Duration,
}

impl PaymentService {
    pub fn new(transactor: Transactor, events: EventSender, config: &AppConfig) -> Self {
        Self {
            transactor,
            events,
            payments: PaymentRepository,
            orders: OrderRepository,
            payment_expiry: config.payment_expiry(),
            confirmation_window: config.payment_confirmation_window(),
        }
    }

    /// Payment visible to its owner and to admins.
    #[instrument(skip(self, actor), fields(payment_id = %payment_id))]
    pub async fn get_payment(
        &self,
        actor: &Actor,
        payment_id: Uuid,
    ) -> Result<PaymentView, ServiceError> {
        let conn = self.transactor.connection();
        let payment = self
            .payments
            .find_by_id(conn, payment_id)
            .await?
            .ok_or_else(|| not_found(payment_id))?;
        authorize_owner_or_admin(actor, &payment)?;

        view(conn, self.orders, payment, Utc::now()).await
    }

    /// Attaches a transfer proof. The payment then waits for an admin and
    /// its expiry moves to the end of the confirmation window.
    #[instrument(skip(self, actor, proof), fields(payment_id = %payment_id))]
    pub async fn upload_proof(
        &self,
        actor: &Actor,
        payment_id: Uuid,
        proof: String,
    ) -> Result<PaymentView, ServiceError> {
        let user_id = actor.require_user()?;
        let proof = proof.trim().to_string();
        if proof.is_empty() {
            return Err(ServiceError::ValidationError(
                "payment proof must not be empty".to_string(),
            ));
        }

        let payments = self.payments;
        let orders = self.orders;
        let window = self.confirmation_window;
        let view = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let payment = payments
                        .lock_by_id(txn, payment_id)
                        .await?
                        .filter(|p| p.user_id == user_id)
                        .ok_or_else(|| not_found(payment_id))?;
                    expect_status(&payment, now, PaymentStatus::WaitingForPayment)?;

                    let moved = payments
                        .attach_proof(txn, payment_id, proof, now + window, now)
                        .await?;
                    ensure_moved(moved, payment_id)?;

                    orders
                        .transition_by_payment(
                            txn,
                            payment_id,
                            &[OrderStatus::WaitingForPayment],
                            OrderStatus::WaitingForPaymentConfirmation,
                        )
                        .await?;

                    reload(txn, payments, orders, payment_id, now).await
                })
            })
            .await?;

        info!(payment_id = %payment_id, "Payment proof uploaded");
        self.events
            .publish(Event::PaymentProofUploaded(payment_id));
        Ok(view)
    }

    /// Accepts an uploaded proof; the payment's orders become ready to
    /// process.
    #[instrument(skip(self, actor), fields(payment_id = %payment_id))]
    pub async fn confirm_payment(
        &self,
        actor: &Actor,
        payment_id: Uuid,
    ) -> Result<PaymentView, ServiceError> {
        actor.require_admin()?;

        let payments = self.payments;
        let orders = self.orders;
        let view = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let payment = payments
                        .lock_by_id(txn, payment_id)
                        .await?
                        .ok_or_else(|| not_found(payment_id))?;
                    expect_status(&payment, now, PaymentStatus::WaitingForPaymentConfirmation)?;

                    ensure_moved(payments.confirm(txn, payment_id, now).await?, payment_id)?;
                    orders
                        .transition_by_payment(
                            txn,
                            payment_id,
                            &[OrderStatus::WaitingForPaymentConfirmation],
                            OrderStatus::PaymentConfirmed,
                        )
                        .await?;

                    reload(txn, payments, orders, payment_id, now).await
                })
            })
            .await?;

        info!(payment_id = %payment_id, "Payment confirmed");
        self.events.publish(Event::PaymentConfirmed(payment_id));
        Ok(view)
    }

    /// Drops an uploaded proof and reopens the payment for a fresh expiry
    /// window.
    #[instrument(skip(self, actor), fields(payment_id = %payment_id))]
    pub async fn reject_payment(
        &self,
        actor: &Actor,
        payment_id: Uuid,
    ) -> Result<PaymentView, ServiceError> {
        actor.require_admin()?;

        let payments = self.payments;
        let orders = self.orders;
        let expiry = self.payment_expiry;
        let view = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let payment = payments
                        .lock_by_id(txn, payment_id)
                        .await?
                        .ok_or_else(|| not_found(payment_id))?;
                    expect_status(&payment, now, PaymentStatus::WaitingForPaymentConfirmation)?;

                    ensure_moved(
                        payments.reject(txn, payment_id, now + expiry, now).await?,
                        payment_id,
                    )?;
                    orders
                        .transition_by_payment(
                            txn,
                            payment_id,
                            &[OrderStatus::WaitingForPaymentConfirmation],
                            OrderStatus::WaitingForPayment,
                        )
                        .await?;

                    reload(txn, payments, orders, payment_id, now).await
                })
            })
            .await?;

        info!(payment_id = %payment_id, "Payment rejected");
        self.events.publish(Event::PaymentRejected(payment_id));
        Ok(view)
    }

    /// Cancels an unconfirmed payment together with its open orders.
    #[instrument(skip(self, actor), fields(payment_id = %payment_id))]
    pub async fn cancel_payment(
        &self,
        actor: &Actor,
        payment_id: Uuid,
    ) -> Result<PaymentView, ServiceError> {
        let actor = actor.clone();
        let payments = self.payments;
        let orders = self.orders;
        let view = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let payment = payments
                        .lock_by_id(txn, payment_id)
                        .await?
                        .ok_or_else(|| not_found(payment_id))?;
                    authorize_owner_or_admin(&actor, &payment)?;

                    let status = status_of(&payment, now);
                    if !matches!(
                        status,
                        PaymentStatus::WaitingForPayment
                            | PaymentStatus::WaitingForPaymentConfirmation
                    ) {
                        return Err(stale(payment_id, status));
                    }

                    ensure_moved(payments.soft_delete(txn, payment_id, now).await?, payment_id)?;
                    orders
                        .transition_by_payment(
                            txn,
                            payment_id,
                            &CANCELLABLE_WITH_PAYMENT,
                            OrderStatus::Cancelled,
                        )
                        .await?;

                    reload(txn, payments, orders, payment_id, now).await
                })
            })
            .await?;

        info!(payment_id = %payment_id, "Payment cancelled");
        self.events.publish(Event::PaymentCancelled(payment_id));
        Ok(view)
    }

    /// Marks the orders of an overdue unpaid payment as expired.
    #[instrument(skip(self, actor), fields(payment_id = %payment_id))]
    pub async fn expire_payment(
        &self,
        actor: &Actor,
        payment_id: Uuid,
    ) -> Result<PaymentView, ServiceError> {
        let actor = actor.clone();
        let payments = self.payments;
        let orders = self.orders;
        let (view, expired) = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let payment = payments
                        .lock_by_id(txn, payment_id)
                        .await?
                        .ok_or_else(|| not_found(payment_id))?;
                    authorize_owner_or_admin(&actor, &payment)?;
                    expect_status(&payment, now, PaymentStatus::PaymentExpired)?;

                    let expired = orders
                        .transition_by_payment(
                            txn,
                            payment_id,
                            &[OrderStatus::WaitingForPayment],
                            OrderStatus::Expired,
                        )
                        .await?;

                    let view = reload(txn, payments, orders, payment_id, now).await?;
                    Ok((view, expired))
                })
            })
            .await?;

        if expired > 0 {
            info!(payment_id = %payment_id, orders = expired, "Payment expired");
            self.events.publish(Event::PaymentExpired(payment_id));
        }
        Ok(view)
    }
}

async fn view<C: ConnectionTrait>(
    conn: &C,
    orders: OrderRepository,
    payment: payment::Model,
    now: DateTime<Utc>,
) -> Result<PaymentView, ServiceError> {
    let status = status_of(&payment, now);
    let orders = orders.find_by_payment(conn, payment.id).await?;
    Ok(PaymentView {
        payment,
        status,
        orders,
    })
}

async fn reload<C: ConnectionTrait>(
    conn: &C,
    payments: PaymentRepository,
    orders: OrderRepository,
    payment_id: Uuid,
    now: DateTime<Utc>,
) -> Result<PaymentView, ServiceError> {
    let payment = payments
        .find_by_id(conn, payment_id)
        .await?
        .ok_or_else(|| not_found(payment_id))?;
    view(conn, orders, payment, now).await
}

/// Admins see every payment; users only their own, and anyone else's is
/// reported as missing.
fn authorize_owner_or_admin(actor: &Actor, payment: &payment::Model) -> Result<(), ServiceError> {
    match actor {
        Actor::Admin { .. } => Ok(()),
        Actor::User { id, .. } if *id == payment.user_id => Ok(()),
        Actor::User { .. } => Err(not_found(payment.id)),
        other => Err(ServiceError::Unauthorized(format!(
            "{} can't access payments",
            other.role()
        ))),
    }
}

fn expect_status(
    payment: &payment::Model,
    now: DateTime<Utc>,
    expected: PaymentStatus,
) -> Result<(), ServiceError> {
    let status = status_of(payment, now);
    if status != expected {
        return Err(stale(payment.id, status));
    }
    Ok(())
}

fn ensure_moved(rows: u64, payment_id: Uuid) -> Result<(), ServiceError> {
    if rows == 0 {
        return Err(ServiceError::NoValidOrderPayment(format!(
            "payment {} changed concurrently",
            payment_id
        )));
    }
    Ok(())
}

fn stale(payment_id: Uuid, status: PaymentStatus) -> ServiceError {
    ServiceError::NoValidOrderPayment(format!("payment {} is {}", payment_id, status))
}

fn not_found(payment_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("payment {}", payment_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn deleted_payments_are_cancelled_whatever_else_is_set() {
        let now = at(0);
        assert_eq!(
            derive_payment_status(Some(now), Some(at(60)), Some("proof.png"), now),
            PaymentStatus::Cancelled
        );
        assert_eq!(
            derive_payment_status(Some(now), None, None, now),
            PaymentStatus::Cancelled
        );
    }

    #[test]
    fn expiry_boundary() {
        let now = at(0);
        assert_eq!(
            derive_payment_status(None, Some(at(-1)), None, now),
            PaymentStatus::PaymentExpired
        );
        assert_eq!(
            derive_payment_status(None, Some(at(-1)), Some("proof.png"), now),
            PaymentStatus::WaitingForPaymentConfirmation
        );
        assert_eq!(
            derive_payment_status(None, Some(now), None, now),
            PaymentStatus::PaymentExpired
        );
        assert_eq!(
            derive_payment_status(None, Some(at(1)), None, now),
            PaymentStatus::WaitingForPayment
        );
    }

    #[test]
    fn cleared_expiry_with_proof_is_confirmed() {
        assert_eq!(
            derive_payment_status(None, None, Some("proof.png"), at(0)),
            PaymentStatus::PaymentConfirmed
        );
        assert_eq!(
            derive_payment_status(None, None, None, at(0)),
            PaymentStatus::InvalidPayment
        );
    }

    #[test]
    fn status_names_match_the_stored_vocabulary() {
        assert_eq!(
            PaymentStatus::WaitingForPaymentConfirmation.to_string(),
            "waiting for payment confirmation"
        );
        assert_eq!(PaymentStatus::PaymentExpired.to_string(), "payment expired");
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(
            deleted in proptest::option::of(-1000i64..1000),
            expires in proptest::option::of(-1000i64..1000),
            has_proof in any::<bool>(),
            now in -1000i64..1000,
        ) {
            let proof = has_proof.then_some("proof.png");
            let first = derive_payment_status(deleted.map(at), expires.map(at), proof, at(now));
            let second = derive_payment_status(deleted.map(at), expires.map(at), proof, at(now));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn proof_always_wins_over_a_passed_expiry(
            expires in -1000i64..1000,
            now in -1000i64..1000,
        ) {
            prop_assert_eq!(
                derive_payment_status(None, Some(at(expires)), Some("proof.png"), at(now)),
                PaymentStatus::WaitingForPaymentConfirmation
            );
        }

        #[test]
        fn unpaid_status_follows_the_clock(
            expires in -1000i64..1000,
            now in -1000i64..1000,
        ) {
            let status = derive_payment_status(None, Some(at(expires)), None, at(now));
            if expires > now {
                prop_assert_eq!(status, PaymentStatus::WaitingForPayment);
            } else {
                prop_assert_eq!(status, PaymentStatus::PaymentExpired);
            }
        }
    }
}
