//! Order fulfillment by pharmacy managers.
//!
//! Proceeding an order sells every line from the order's pharmacy. A line the
//! pharmacy cannot cover is topped up from the nearest other pharmacy of the
//! same manager, recorded as an approved stock request.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::Transactor;
use crate::entities::{
    order::{self, OrderStatus},
    stock_journal::JournalDescription,
    stock_request::StockRequestStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::{
    inventory_ledger::push_adjustment, DonorCandidate, InventoryLedger, JournalEntry,
    OrderRepository, PharmacyRepository, StockAdjustments, StockRequestRepository,
};
use crate::services::order_status::CANCELLABLE_BY_MANAGER;
use crate::services::shipment_pricing::{DistanceCalculator, GeoPoint};

#[derive(Debug, Clone, Serialize)]
pub struct FulfillmentOutcome {
    pub order: order::Model,
    /// Transfers created to cover missing stock
    pub stock_request_ids: Vec<Uuid>,
}

/// Stock movements planned for one order, applied at the end in one go.
#[derive(Debug, Default)]
struct FulfillmentPlan {
    /// Planned change per (pharmacy, drug) on top of the locked stock
    pending: HashMap<(Uuid, Uuid), i32>,
    increments: StockAdjustments,
    decrements: StockAdjustments,
    journal: Vec<JournalEntry>,
    /// donor -> drug -> quantity
    transfers: BTreeMap<Uuid, BTreeMap<Uuid, i32>>,
}

impl FulfillmentPlan {
    /// Stock left at a pharmacy once the planned movements are applied.
    fn available(&self, pharmacy_id: Uuid, drug_id: Uuid, locked_stock: i32) -> i32 {
        locked_stock
            + self
                .pending
                .get(&(pharmacy_id, drug_id))
                .copied()
                .unwrap_or(0)
    }

    fn sell(&mut self, pharmacy_id: Uuid, drug_id: Uuid, quantity: i32) {
        *self.pending.entry((pharmacy_id, drug_id)).or_default() -= quantity;
        push_adjustment(&mut self.decrements, pharmacy_id, drug_id, quantity);
        self.journal.push(JournalEntry::outflow(
            pharmacy_id,
            drug_id,
            quantity,
            JournalDescription::Sold,
        ));
    }

    fn transfer(&mut self, donor_id: Uuid, receiver_id: Uuid, drug_id: Uuid, quantity: i32) {
        *self.pending.entry((donor_id, drug_id)).or_default() -= quantity;
        *self.pending.entry((receiver_id, drug_id)).or_default() += quantity;
        push_adjustment(&mut self.decrements, donor_id, drug_id, quantity);
        push_adjustment(&mut self.increments, receiver_id, drug_id, quantity);
        self.journal.push(JournalEntry::outflow(
            donor_id,
            drug_id,
            quantity,
            JournalDescription::Transferred,
        ));
        self.journal.push(JournalEntry::inflow(
            receiver_id,
            drug_id,
            quantity,
            JournalDescription::Received,
        ));
        *self
            .transfers
            .entry(donor_id)
            .or_default()
            .entry(drug_id)
            .or_default() += quantity;
    }

    /// Nearest candidate that still has `quantity` units once this plan's
    /// own movements are taken into account.
    fn nearest_donor(
        &self,
        candidates: Vec<DonorCandidate>,
        drug_id: Uuid,
        quantity: i32,
        origin: GeoPoint,
        distance: &dyn DistanceCalculator,
    ) -> Option<DonorCandidate> {
        candidates
            .into_iter()
            .filter(|c| self.available(c.pharmacy_id, drug_id, c.stock) >= quantity)
            .map(|c| {
                let km = distance.distance_km(origin, GeoPoint::new(c.latitude, c.longitude));
                (km, c)
            })
            .min_by(|(a_km, a), (b_km, b)| {
                a_km.total_cmp(b_km)
                    .then_with(|| a.pharmacy_id.cmp(&b.pharmacy_id))
            })
            .map(|(_, c)| c)
    }
}

#[derive(Clone)]
pub struct FulfillmentService {
    transactor: Transactor,
    events: EventSender,
    distance: Arc<dyn DistanceCalculator>,
}

impl FulfillmentService {
    pub fn new(
        transactor: Transactor,
        events: EventSender,
        distance: Arc<dyn DistanceCalculator>,
    ) -> Self {
        Self {
            transactor,
            events,
            distance,
        }
    }

    /// Takes the stock for a confirmed order and marks it processed.
    ///
    /// Fails with `InsufficientStockMutation` and changes nothing when a line
    /// can be covered neither locally nor by a single partner pharmacy.
    #[instrument(skip(self, actor), fields(order_id = %order_id, manager_id = %actor.id()))]
    pub async fn proceed_order(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<FulfillmentOutcome, ServiceError> {
        let manager_id = actor.require_manager()?;
        let distance = self.distance.clone();

        let outcome = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let orders = OrderRepository;
                    let pharmacies = PharmacyRepository;
                    let ledger = InventoryLedger;

                    let order = orders
                        .find_by_id(txn, order_id)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
                    if order.status != OrderStatus::PaymentConfirmed {
                        return Err(ServiceError::NoValidOrderPayment(format!(
                            "order {} is {}",
                            order_id, order.status
                        )));
                    }

                    let lines = orders.lock_order_lines(txn, order_id).await?;
                    if lines.is_empty() {
                        return Err(ServiceError::NoValidPayment(format!(
                            "order {} has no lines",
                            order_id
                        )));
                    }
                    if lines
                        .iter()
                        .any(|l| l.pharmacy_id != order.pharmacy_id || l.manager_id != manager_id)
                    {
                        warn!(order_id = %order_id, "Order lines outside the manager's pharmacy");
                        return Err(ServiceError::Unauthorized(format!(
                            "order {} is not handled by this manager",
                            order_id
                        )));
                    }

                    let receiver = pharmacies
                        .find_active(txn, order.pharmacy_id)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("pharmacy {}", order.pharmacy_id))
                        })?;
                    let origin = GeoPoint::new(receiver.latitude, receiver.longitude);

                    let mut plan = FulfillmentPlan::default();
                    for line in &lines {
                        let available = plan.available(receiver.id, line.drug_id, line.stock);
                        if available < line.quantity {
                            let deficit = line.quantity - available.max(0);
                            let candidates = pharmacies
                                .lock_donor_candidates(
                                    txn,
                                    manager_id,
                                    receiver.id,
                                    line.drug_id,
                                    deficit,
                                )
                                .await?;
                            let donor = plan
                                .nearest_donor(
                                    candidates,
                                    line.drug_id,
                                    deficit,
                                    origin,
                                    distance.as_ref(),
                                )
                                .ok_or_else(|| {
                                    ServiceError::InsufficientStockMutation(format!(
                                        "no partner pharmacy holds {} units of drug {}",
                                        deficit, line.drug_id
                                    ))
                                })?;
                            debug!(
                                donor_id = %donor.pharmacy_id,
                                drug_id = %line.drug_id,
                                deficit,
                                "Covering stock deficit by transfer"
                            );
                            plan.transfer(donor.pharmacy_id, receiver.id, line.drug_id, deficit);
                        }
                        plan.sell(receiver.id, line.drug_id, line.quantity);
                    }

                    let requests = StockRequestRepository;
                    let mut stock_request_ids = Vec::with_capacity(plan.transfers.len());
                    for (donor_id, drugs) in &plan.transfers {
                        let lines: Vec<(Uuid, i32)> =
                            drugs.iter().map(|(drug, qty)| (*drug, *qty)).collect();
                        let (request, _) = requests
                            .insert(
                                txn,
                                *donor_id,
                                receiver.id,
                                StockRequestStatus::Approved,
                                &lines,
                            )
                            .await?;
                        stock_request_ids.push(request.id);
                    }

                    ledger.bulk_increment(txn, &plan.increments).await?;
                    ledger.bulk_decrement(txn, &plan.decrements).await?;
                    ledger.record_journal(txn, &plan.journal).await?;

                    orders
                        .transition(
                            txn,
                            order_id,
                            &[OrderStatus::PaymentConfirmed],
                            OrderStatus::Processed,
                        )
                        .await?;

                    let order = orders
                        .find_by_id(txn, order_id)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
                    Ok(FulfillmentOutcome {
                        order,
                        stock_request_ids,
                    })
                })
            })
            .await?;

        info!(
            order_id = %order_id,
            transfers = outcome.stock_request_ids.len(),
            "Order processed"
        );
        self.events
            .publish(Event::OrderProcessed {
                order_id,
                stock_request_ids: outcome.stock_request_ids.clone(),
            });
        Ok(outcome)
    }

    /// Cancels a confirmed or processed order of one of the manager's
    /// pharmacies. Stock taken by a processed order goes back on the shelf.
    #[instrument(skip(self, actor), fields(order_id = %order_id, manager_id = %actor.id()))]
    pub async fn cancel_order(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let manager_id = actor.require_manager()?;

        let (order, stock_returned) = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let orders = OrderRepository;
                    let ledger = InventoryLedger;

                    let order = orders
                        .find_by_id(txn, order_id)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
                    if !PharmacyRepository
                        .is_managed_by(txn, order.pharmacy_id, manager_id)
                        .await?
                    {
                        return Err(ServiceError::Unauthorized(format!(
                            "order {} is not handled by this manager",
                            order_id
                        )));
                    }

                    if !CANCELLABLE_BY_MANAGER.contains(&order.status) {
                        return Err(ServiceError::CantCancelOrder);
                    }
                    let stock_returned = order.status == OrderStatus::Processed;

                    if stock_returned {
                        let lines = orders.lock_order_lines(txn, order_id).await?;
                        let mut returns = StockAdjustments::new();
                        let mut journal = Vec::with_capacity(lines.len());
                        for line in &lines {
                            push_adjustment(
                                &mut returns,
                                line.pharmacy_id,
                                line.drug_id,
                                line.quantity,
                            );
                            journal.push(JournalEntry::inflow(
                                line.pharmacy_id,
                                line.drug_id,
                                line.quantity,
                                JournalDescription::Returned,
                            ));
                        }
                        ledger.bulk_increment(txn, &returns).await?;
                        ledger.record_journal(txn, &journal).await?;
                    }

                    orders
                        .transition(txn, order_id, &[order.status], OrderStatus::Cancelled)
                        .await?;

                    let order = orders
                        .find_by_id(txn, order_id)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
                    Ok((order, stock_returned))
                })
            })
            .await?;

        info!(order_id = %order_id, stock_returned, "Order cancelled by manager");
        self.events
            .publish(Event::OrderCancelled {
                order_id,
                stock_returned,
            });
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::shipment_pricing::HaversineDistance;

    fn candidate(lat: f64, stock: i32) -> DonorCandidate {
        DonorCandidate {
            pharmacy_id: Uuid::new_v4(),
            latitude: lat,
            longitude: 0.0,
            stock,
        }
    }

    #[test]
    fn transfer_then_sell_nets_to_zero_at_the_receiver() {
        let (receiver, donor, drug) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut plan = FulfillmentPlan::default();

        plan.transfer(donor, receiver, drug, 2);
        plan.sell(receiver, drug, 2);

        assert_eq!(plan.available(receiver, drug, 0), 0);
        assert_eq!(plan.available(donor, drug, 5), 3);
        let received: i32 = plan
            .journal
            .iter()
            .filter(|e| e.pharmacy_id == receiver)
            .map(|e| e.quantity)
            .sum();
        assert_eq!(received, 0);
        assert_eq!(plan.transfers[&donor][&drug], 2);
    }

    #[test]
    fn nearest_donor_wins() {
        let far = candidate(1.0, 10);
        let near = candidate(0.1, 10);
        let plan = FulfillmentPlan::default();

        let picked = plan
            .nearest_donor(
                vec![far.clone(), near.clone()],
                Uuid::new_v4(),
                3,
                GeoPoint::new(0.0, 0.0),
                &HaversineDistance,
            )
            .unwrap();
        assert_eq!(picked.pharmacy_id, near.pharmacy_id);
    }

    #[test]
    fn donors_drained_by_the_same_plan_are_skipped() {
        let drug = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let near = candidate(0.1, 4);
        let far = candidate(1.0, 4);
        let mut plan = FulfillmentPlan::default();
        plan.transfer(near.pharmacy_id, receiver, drug, 3);

        let picked = plan
            .nearest_donor(
                vec![near.clone(), far.clone()],
                drug,
                3,
                GeoPoint::new(0.0, 0.0),
                &HaversineDistance,
            )
            .unwrap();
        assert_eq!(picked.pharmacy_id, far.pharmacy_id);

        assert!(plan
            .nearest_donor(vec![near], drug, 3, GeoPoint::new(0.0, 0.0), &HaversineDistance)
            .is_none());
    }
}
