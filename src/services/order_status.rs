//! Order status transitions.

use crate::entities::order::OrderStatus;
use crate::errors::ServiceError;

/// Whether an order may move from `from` to `to`.
///
/// `cancelled`, `expired` and `invalid payment` are absorbing; once `sent`
/// an order can only be finished, which does not change its status.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    match (from, to) {
        (WaitingForPayment, WaitingForPaymentConfirmation) => true,
        (WaitingForPayment, Cancelled) => true,
        (WaitingForPayment, Expired) => true,

        (WaitingForPaymentConfirmation, PaymentConfirmed) => true,
        (WaitingForPaymentConfirmation, WaitingForPayment) => true,
        (WaitingForPaymentConfirmation, Cancelled) => true,
        (WaitingForPaymentConfirmation, InvalidPayment) => true,

        (PaymentConfirmed, Processed) => true,
        (PaymentConfirmed, Cancelled) => true,

        (Processed, Sent) => true,
        (Processed, Cancelled) => true,

        _ => false,
    }
}

/// Fails with `InternalError` unless every status in `from` may move to `to`.
pub fn ensure_transition(from: &[OrderStatus], to: OrderStatus) -> Result<(), ServiceError> {
    match from.iter().find(|status| !is_valid_transition(**status, to)) {
        Some(status) => Err(ServiceError::InternalError(format!(
            "order status can't move from {} to {}",
            status, to
        ))),
        None => Ok(()),
    }
}

/// Statuses a manager may cancel from
pub const CANCELLABLE_BY_MANAGER: [OrderStatus; 2] =
    [OrderStatus::PaymentConfirmed, OrderStatus::Processed];

/// Statuses whose orders are cancelled together with their payment
pub const CANCELLABLE_WITH_PAYMENT: [OrderStatus; 2] = [
    OrderStatus::WaitingForPayment,
    OrderStatus::WaitingForPaymentConfirmation,
];
