//! Manual stock transfers between pharmacies of one manager.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Actor;
use crate::db::Transactor;
use crate::entities::{
    stock_journal::JournalDescription,
    stock_request::{self, StockRequestStatus},
    stock_request_drug,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::{
    inventory_ledger::push_adjustment, InventoryLedger, JournalEntry, PharmacyRepository,
    StockAdjustments, StockRequestRepository,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StockRequestLine {
    pub drug_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStockRequest {
    pub sender_pharmacy_id: Uuid,
    pub receiver_pharmacy_id: Uuid,
    #[validate(length(min = 1, message = "at least one drug is required"))]
    pub drugs: Vec<StockRequestLine>,
}

impl CreateStockRequest {
    fn validate_all(&self) -> Result<(), ServiceError> {
        self.validate()?;
        let mut seen = HashSet::new();
        for line in &self.drugs {
            line.validate()?;
            if !seen.insert(line.drug_id) {
                return Err(ServiceError::ValidationError(format!(
                    "drug {} appears more than once",
                    line.drug_id
                )));
            }
        }
        if self.sender_pharmacy_id == self.receiver_pharmacy_id {
            return Err(ServiceError::CantRequestToSamePharmacy);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StockRequestView {
    #[serde(flatten)]
    pub request: stock_request::Model,
    pub drugs: Vec<stock_request_drug::Model>,
}

/// Lifecycle of a stock request: `waiting for approval` until the sending
/// pharmacy's manager approves or cancels it.
#[derive(Clone)]
pub struct StockRequestService {
    transactor: Transactor,
    events: EventSender,
    requests: StockRequestRepository,
    pharmacies: PharmacyRepository,
}

impl StockRequestService {
    pub fn new(transactor: Transactor, events: EventSender) -> Self {
        Self {
            transactor,
            events,
            requests: StockRequestRepository,
            pharmacies: PharmacyRepository,
        }
    }

    #[instrument(skip(self, actor, request), fields(manager_id = %actor.id()))]
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateStockRequest,
    ) -> Result<StockRequestView, ServiceError> {
        let manager_id = actor.require_manager()?;
        request.validate_all()?;

        let requests = self.requests;
        let pharmacies = self.pharmacies;
        let view = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    for pharmacy_id in [request.sender_pharmacy_id, request.receiver_pharmacy_id] {
                        if !pharmacies.is_managed_by(txn, pharmacy_id, manager_id).await? {
                            return Err(ServiceError::CantRequestToPharmaciesNotPartner);
                        }
                    }

                    let lines: Vec<(Uuid, i32)> = request
                        .drugs
                        .iter()
                        .map(|line| (line.drug_id, line.quantity))
                        .collect();
                    let (request, drugs) = requests
                        .insert(
                            txn,
                            request.sender_pharmacy_id,
                            request.receiver_pharmacy_id,
                            StockRequestStatus::WaitingForApproval,
                            &lines,
                        )
                        .await?;
                    Ok(StockRequestView { request, drugs })
                })
            })
            .await?;

        info!(stock_request_id = %view.request.id, "Stock request created");
        self.events
            .publish(Event::StockRequestCreated(view.request.id));
        Ok(view)
    }

    /// Moves the requested stock from sender to receiver.
    #[instrument(skip(self, actor), fields(stock_request_id = %request_id, manager_id = %actor.id()))]
    pub async fn approve(
        &self,
        actor: &Actor,
        request_id: Uuid,
    ) -> Result<StockRequestView, ServiceError> {
        let manager_id = actor.require_manager()?;

        let requests = self.requests;
        let pharmacies = self.pharmacies;
        let view = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let request = requests
                        .lock_by_id(txn, request_id)
                        .await?
                        .ok_or_else(|| not_found(request_id))?;
                    if request.status != StockRequestStatus::WaitingForApproval
                        || !pharmacies
                            .is_managed_by(txn, request.sender_pharmacy_id, manager_id)
                            .await?
                    {
                        return Err(ServiceError::CantApproveStockMutation);
                    }

                    let drugs = requests.lock_lines(txn, request_id).await?;
                    let mut outgoing = StockAdjustments::new();
                    let mut incoming = StockAdjustments::new();
                    let mut journal = Vec::with_capacity(drugs.len() * 2);
                    for line in &drugs {
                        push_adjustment(
                            &mut outgoing,
                            request.sender_pharmacy_id,
                            line.drug_id,
                            line.quantity,
                        );
                        push_adjustment(
                            &mut incoming,
                            request.receiver_pharmacy_id,
                            line.drug_id,
                            line.quantity,
                        );
                        journal.push(JournalEntry::outflow(
                            request.sender_pharmacy_id,
                            line.drug_id,
                            line.quantity,
                            JournalDescription::SentMutation,
                        ));
                        journal.push(JournalEntry::inflow(
                            request.receiver_pharmacy_id,
                            line.drug_id,
                            line.quantity,
                            JournalDescription::ReceivedMutation,
                        ));
                    }

                    let ledger = InventoryLedger;
                    ledger
                        .bulk_decrement(txn, &outgoing)
                        .await
                        .map_err(|err| match err {
                            ServiceError::InsufficientStock(msg) => {
                                ServiceError::InsufficientStockMutation(msg)
                            }
                            other => other,
                        })?;
                    ledger.bulk_increment(txn, &incoming).await?;
                    ledger.record_journal(txn, &journal).await?;

                    let moved = requests
                        .resolve_waiting(txn, request_id, manager_id, StockRequestStatus::Approved)
                        .await?;
                    if moved == 0 {
                        return Err(ServiceError::CantApproveStockMutation);
                    }

                    let request = requests
                        .find_by_id(txn, request_id)
                        .await?
                        .ok_or_else(|| not_found(request_id))?;
                    Ok(StockRequestView { request, drugs })
                })
            })
            .await?;

        info!(stock_request_id = %request_id, "Stock request approved");
        self.events
            .publish(Event::StockRequestApproved(request_id));
        Ok(view)
    }

    #[instrument(skip(self, actor), fields(stock_request_id = %request_id, manager_id = %actor.id()))]
    pub async fn cancel(
        &self,
        actor: &Actor,
        request_id: Uuid,
    ) -> Result<StockRequestView, ServiceError> {
        let manager_id = actor.require_manager()?;

        let requests = self.requests;
        let pharmacies = self.pharmacies;
        let view = self
            .transactor
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let request = requests
                        .lock_by_id(txn, request_id)
                        .await?
                        .ok_or_else(|| not_found(request_id))?;
                    if request.status != StockRequestStatus::WaitingForApproval
                        || !pharmacies
                            .is_managed_by(txn, request.sender_pharmacy_id, manager_id)
                            .await?
                    {
                        return Err(ServiceError::CantCancelStockMutation);
                    }

                    let moved = requests
                        .resolve_waiting(txn, request_id, manager_id, StockRequestStatus::Cancelled)
                        .await?;
                    if moved == 0 {
                        return Err(ServiceError::CantCancelStockMutation);
                    }

                    let request = requests
                        .find_by_id(txn, request_id)
                        .await?
                        .ok_or_else(|| not_found(request_id))?;
                    let drugs = requests.lines_of(txn, request_id).await?;
                    Ok(StockRequestView { request, drugs })
                })
            })
            .await?;

        info!(stock_request_id = %request_id, "Stock request cancelled");
        self.events
            .publish(Event::StockRequestCancelled(request_id));
        Ok(view)
    }

    /// A request seen from either side of the transfer, or by an admin.
    #[instrument(skip(self, actor), fields(stock_request_id = %request_id))]
    pub async fn get(
        &self,
        actor: &Actor,
        request_id: Uuid,
    ) -> Result<StockRequestView, ServiceError> {
        let conn = self.transactor.connection();
        let request = self
            .requests
            .find_by_id(conn, request_id)
            .await?
            .ok_or_else(|| not_found(request_id))?;

        if !actor.is_admin() {
            let manager_id = actor.require_manager()?;
            let sender = self
                .pharmacies
                .is_managed_by(conn, request.sender_pharmacy_id, manager_id)
                .await?;
            let receiver = self
                .pharmacies
                .is_managed_by(conn, request.receiver_pharmacy_id, manager_id)
                .await?;
            if !sender && !receiver {
                return Err(not_found(request_id));
            }
        }

        let drugs = self.requests.lines_of(conn, request_id).await?;
        Ok(StockRequestView { request, drugs })
    }
}

fn not_found(request_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("stock request {}", request_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(sender: Uuid, receiver: Uuid, drugs: Vec<(Uuid, i32)>) -> CreateStockRequest {
        CreateStockRequest {
            sender_pharmacy_id: sender,
            receiver_pharmacy_id: receiver,
            drugs: drugs
                .into_iter()
                .map(|(drug_id, quantity)| StockRequestLine { drug_id, quantity })
                .collect(),
        }
    }

    #[test]
    fn same_pharmacy_is_rejected() {
        let pharmacy = Uuid::new_v4();
        assert_matches!(
            request(pharmacy, pharmacy, vec![(Uuid::new_v4(), 1)]).validate_all(),
            Err(ServiceError::CantRequestToSamePharmacy)
        );
    }

    #[test]
    fn quantities_must_be_positive() {
        assert_matches!(
            request(Uuid::new_v4(), Uuid::new_v4(), vec![(Uuid::new_v4(), 0)]).validate_all(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn lines_are_required_and_unique() {
        assert_matches!(
            request(Uuid::new_v4(), Uuid::new_v4(), Vec::new()).validate_all(),
            Err(ServiceError::ValidationError(_))
        );

        let drug = Uuid::new_v4();
        assert_matches!(
            request(Uuid::new_v4(), Uuid::new_v4(), vec![(drug, 1), (drug, 2)]).validate_all(),
            Err(ServiceError::ValidationError(_))
        );
    }
}
