//! Cart checkout: one payment and one order per pharmacy.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Actor;
use crate::config::AppConfig;
use crate::db::Transactor;
use crate::entities::{
    order::{self, OrderStatus},
    order_detail, payment, pharmacy, shipment_method,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::{
    AddressResolver, CartRepository, LockedCartItem, OrderRepository, PaymentRepository,
    PharmacyRepository, ShipmentRepository,
};
use crate::services::shipment_pricing::{GeoPoint, ShipmentPricer, ShipmentQuoteRequest};

/// Cart items of one pharmacy and how to ship them
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutGroup {
    pub pharmacy_id: Uuid,
    #[validate(length(min = 1, message = "at least one cart item is required"))]
    pub cart_item_ids: Vec<Uuid>,
    pub shipment_method_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub address_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub payment_method: String,
    #[validate(length(min = 1, message = "at least one pharmacy is required"))]
    pub pharmacies: Vec<CheckoutGroup>,
}

impl CreateOrderRequest {
    fn validate_all(&self) -> Result<(), ServiceError> {
        self.validate()?;
        let mut seen = HashSet::new();
        for group in &self.pharmacies {
            group.validate()?;
            if !seen.insert(group.pharmacy_id) {
                return Err(ServiceError::ValidationError(format!(
                    "pharmacy {} appears more than once",
                    group.pharmacy_id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub payment: payment::Model,
    pub orders: Vec<order::Model>,
}

/// A pharmacy group whose cart items are locked
struct LockedGroup {
    pharmacy: pharmacy::Model,
    method: shipment_method::Model,
    items: Vec<LockedCartItem>,
}

impl LockedGroup {
    fn subtotal(&self) -> i64 {
        self.items.iter().map(|item| item.total_price).sum()
    }

    fn weight(&self) -> i64 {
        self.items.iter().map(LockedCartItem::line_weight).sum()
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    transactor: Transactor,
    events: EventSender,
    addresses: Arc<dyn AddressResolver>,
    pricer: ShipmentPricer,
    payment_expiry: Duration,
}

impl CheckoutService {
    pub fn new(
        transactor: Transactor,
        events: EventSender,
        addresses: Arc<dyn AddressResolver>,
        pricer: ShipmentPricer,
        config: &AppConfig,
    ) -> Self {
        Self {
            transactor,
            events,
            addresses,
            pricer,
            payment_expiry: config.payment_expiry(),
        }
    }

    /// Turns the selected cart items into a payment with one order per
    /// pharmacy.
    ///
    /// Groups whose cart items were all taken by a concurrent checkout are
    /// skipped; when none is left nothing is written and the call fails
    /// with `NoValidCartOrder`.
    #[instrument(skip(self, actor, request), fields(user_id = %actor.id()))]
    pub async fn create_order(
        &self,
        actor: &Actor,
        request: CreateOrderRequest,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let user_id = actor.require_user()?;
        request.validate_all()?;

        let destination = self.addresses.resolve(request.address_id, user_id).await?;

        let pricer = self.pricer.clone();
        let expires_at = Utc::now() + self.payment_expiry;
        let outcome = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let pharmacies = PharmacyRepository;
                    let shipments = ShipmentRepository;
                    let carts = CartRepository;

                    let mut groups = Vec::with_capacity(request.pharmacies.len());
                    for group in &request.pharmacies {
                        let pharmacy = pharmacies
                            .find_active(txn, group.pharmacy_id)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!("pharmacy {}", group.pharmacy_id))
                            })?;
                        let method = shipments
                            .find_for_pharmacy(txn, pharmacy.id, group.shipment_method_id)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::InvalidShipmentMethods(format!(
                                    "pharmacy {} does not offer method {}",
                                    pharmacy.id, group.shipment_method_id
                                ))
                            })?;
                        let items = carts
                            .lock_cart_items(txn, user_id, pharmacy.id, &group.cart_item_ids)
                            .await?;
                        if items.is_empty() {
                            debug!(pharmacy_id = %pharmacy.id, "No cart items left for pharmacy");
                            continue;
                        }
                        groups.push(LockedGroup {
                            pharmacy,
                            method,
                            items,
                        });
                    }

                    if groups.is_empty() {
                        return Err(ServiceError::NoValidCartOrder);
                    }

                    let quotes: Vec<ShipmentQuoteRequest> = groups
                        .iter()
                        .map(|group| ShipmentQuoteRequest {
                            method: group.method.clone(),
                            origin: GeoPoint::new(
                                group.pharmacy.latitude,
                                group.pharmacy.longitude,
                            ),
                            origin_city_id: group.pharmacy.city_id,
                            destination: destination.location,
                            destination_city_id: destination.city_id,
                            weight: group.weight(),
                        })
                        .collect();
                    let shipment_prices = pricer.price_all(&quotes).await?;

                    let now = Utc::now();
                    let payment_id = Uuid::new_v4();
                    let mut orders = Vec::with_capacity(groups.len());
                    let mut details = Vec::new();
                    let mut ordered_items = Vec::new();

                    for (group, shipment_price) in groups.iter().zip(shipment_prices) {
                        let order = order::Model {
                            id: Uuid::new_v4(),
                            payment_id,
                            pharmacy_id: group.pharmacy.id,
                            order_number: reference_number("ORD", now),
                            total_price: group.subtotal() + shipment_price,
                            shipment_price,
                            status: OrderStatus::WaitingForPayment,
                            shipment_method_id: group.method.id,
                            finished_at: None,
                            created_at: now,
                            updated_at: now,
                        };

                        for item in &group.items {
                            details.push(order_detail::ActiveModel::from(order_detail::Model {
                                id: Uuid::new_v4(),
                                order_id: order.id,
                                pharmacy_drug_id: item.pharmacy_drug_id,
                                quantity: item.quantity,
                                price: item.price,
                                created_at: now,
                            }));
                            ordered_items.push(item.cart_item_id);
                        }
                        orders.push(order);
                    }

                    let payment = PaymentRepository
                        .insert(
                            txn,
                            payment::ActiveModel::from(payment::Model {
                                id: payment_id,
                                user_id,
                                number: reference_number("PAY", now),
                                method: request.payment_method.clone(),
                                proof: None,
                                total_price: orders.iter().map(|o| o.total_price).sum(),
                                address: destination.address.clone(),
                                expired_at: Some(expires_at),
                                created_at: now,
                                updated_at: now,
                                deleted_at: None,
                            }),
                        )
                        .await?;

                    let repo = OrderRepository;
                    repo.insert_orders(
                        txn,
                        orders.iter().cloned().map(order::ActiveModel::from).collect(),
                    )
                    .await?;
                    repo.insert_details(txn, details).await?;
                    carts.soft_delete_items(txn, user_id, &ordered_items).await?;

                    Ok(CheckoutOutcome { payment, orders })
                })
            })
            .await?;

        metrics::counter!("pharmahub_checkout.orders_created", outcome.orders.len() as u64);
        info!(
            payment_id = %outcome.payment.id,
            orders = outcome.orders.len(),
            total_price = outcome.payment.total_price,
            "Checkout completed"
        );

        self.events
            .publish(Event::OrderCreated {
                payment_id: outcome.payment.id,
                order_ids: outcome.orders.iter().map(|o| o.id).collect(),
                user_id,
            });

        Ok(outcome)
    }
}

/// `PREFIX-YYYYMMDDHHMMSS-XXXXXXXX` with a random alphanumeric suffix.
fn reference_number(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!(
        "{}-{}-{}",
        prefix,
        at.format("%Y%m%d%H%M%S"),
        suffix.to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn group(pharmacy_id: Uuid) -> CheckoutGroup {
        CheckoutGroup {
            pharmacy_id,
            cart_item_ids: vec![Uuid::new_v4()],
            shipment_method_id: 1,
        }
    }

    #[test]
    fn reference_numbers_carry_prefix_and_are_unique() {
        let now = Utc::now();
        let a = reference_number("ORD", now);
        let b = reference_number("ORD", now);
        assert!(a.starts_with("ORD-"));
        assert_eq!(a.len(), "ORD-".len() + 14 + 1 + 8);
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_pharmacies_are_rejected() {
        let pharmacy_id = Uuid::new_v4();
        let request = CreateOrderRequest {
            address_id: Uuid::new_v4(),
            payment_method: "bank transfer".to_string(),
            pharmacies: vec![group(pharmacy_id), group(pharmacy_id)],
        };
        assert_matches!(
            request.validate_all(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn empty_groups_are_rejected() {
        let mut empty = group(Uuid::new_v4());
        empty.cart_item_ids.clear();
        let request = CreateOrderRequest {
            address_id: Uuid::new_v4(),
            payment_method: "bank transfer".to_string(),
            pharmacies: vec![empty],
        };
        assert_matches!(
            request.validate_all(),
            Err(ServiceError::ValidationError(_))
        );

        let no_pharmacies = CreateOrderRequest {
            address_id: Uuid::new_v4(),
            payment_method: "bank transfer".to_string(),
            pharmacies: Vec::new(),
        };
        assert!(no_pharmacies.validate_all().is_err());
    }
}
