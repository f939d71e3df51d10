mod common;

use assert_matches::assert_matches;
use common::{admin, manager, TestDb};
use pharmahub_api::{
    entities::{stock_journal::JournalDescription, stock_request::StockRequestStatus},
    errors::ServiceError,
    events::Event,
    services::stock_requests::{CreateStockRequest, StockRequestLine},
};
use uuid::Uuid;

fn transfer(sender: Uuid, receiver: Uuid, drug_id: Uuid, quantity: i32) -> CreateStockRequest {
    CreateStockRequest {
        sender_pharmacy_id: sender,
        receiver_pharmacy_id: receiver,
        drugs: vec![StockRequestLine { drug_id, quantity }],
    }
}

#[tokio::test]
async fn approved_request_moves_stock_between_partners() {
    let mut ctx = TestDb::with_distance(1.0).await;
    let pm = manager(Uuid::new_v4());
    let sender = ctx.pharmacy(pm.id(), -6.20, 106.80).await;
    let receiver = ctx.pharmacy(pm.id(), -6.30, 106.90).await;
    let drug = ctx.drug(100).await;
    ctx.stock(sender.id, drug.id, 8, 1200).await;
    ctx.stock(receiver.id, drug.id, 1, 1200).await;

    let created = ctx
        .services
        .stock_requests
        .create(&pm, transfer(sender.id, receiver.id, drug.id, 3))
        .await
        .unwrap();
    assert_eq!(created.request.status, StockRequestStatus::WaitingForApproval);
    assert_eq!(created.drugs.len(), 1);
    // Stock only moves on approval.
    assert_eq!(ctx.stock_of(sender.id, drug.id).await, 8);

    let approved = ctx
        .services
        .stock_requests
        .approve(&pm, created.request.id)
        .await
        .unwrap();

    assert_eq!(approved.request.status, StockRequestStatus::Approved);
    assert_eq!(ctx.stock_of(sender.id, drug.id).await, 5);
    assert_eq!(ctx.stock_of(receiver.id, drug.id).await, 4);

    let sent = ctx.journal_of(sender.id, drug.id).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].quantity, -3);
    assert_eq!(sent[0].description, JournalDescription::SentMutation);
    let received = ctx.journal_of(receiver.id, drug.id).await;
    assert_eq!(received[0].quantity, 3);
    assert_eq!(received[0].description, JournalDescription::ReceivedMutation);

    let events = ctx.drain_events();
    assert_matches!(
        events.as_slice(),
        [Event::StockRequestCreated(a), Event::StockRequestApproved(b)]
            if *a == created.request.id && *b == created.request.id
    );
}

#[tokio::test]
async fn requests_must_stay_within_one_manager() {
    let ctx = TestDb::with_distance(1.0).await;
    let pm = manager(Uuid::new_v4());
    let mine = ctx.pharmacy(pm.id(), -6.20, 106.80).await;
    let theirs = ctx.pharmacy(Uuid::new_v4(), -6.30, 106.90).await;
    let drug = ctx.drug(100).await;

    let foreign = ctx
        .services
        .stock_requests
        .create(&pm, transfer(theirs.id, mine.id, drug.id, 1))
        .await;
    assert_matches!(foreign, Err(ServiceError::CantRequestToPharmaciesNotPartner));

    let same = ctx
        .services
        .stock_requests
        .create(&pm, transfer(mine.id, mine.id, drug.id, 1))
        .await;
    assert_matches!(same, Err(ServiceError::CantRequestToSamePharmacy));

    let empty = ctx
        .services
        .stock_requests
        .create(&pm, transfer(mine.id, theirs.id, drug.id, 0))
        .await;
    assert_matches!(empty, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn approval_with_too_little_stock_moves_nothing() {
    let ctx = TestDb::with_distance(1.0).await;
    let pm = manager(Uuid::new_v4());
    let sender = ctx.pharmacy(pm.id(), -6.20, 106.80).await;
    let receiver = ctx.pharmacy(pm.id(), -6.30, 106.90).await;
    let drug = ctx.drug(100).await;
    ctx.stock(sender.id, drug.id, 2, 1200).await;
    ctx.stock(receiver.id, drug.id, 0, 1200).await;

    let created = ctx
        .services
        .stock_requests
        .create(&pm, transfer(sender.id, receiver.id, drug.id, 3))
        .await
        .unwrap();
    let result = ctx
        .services
        .stock_requests
        .approve(&pm, created.request.id)
        .await;

    assert_matches!(result, Err(ServiceError::InsufficientStockMutation(_)));
    assert_eq!(ctx.stock_of(sender.id, drug.id).await, 2);
    assert_eq!(ctx.stock_of(receiver.id, drug.id).await, 0);
    let view = ctx
        .services
        .stock_requests
        .get(&pm, created.request.id)
        .await
        .unwrap();
    assert_eq!(view.request.status, StockRequestStatus::WaitingForApproval);
}

#[tokio::test]
async fn resolved_requests_cannot_change_again() {
    let ctx = TestDb::with_distance(1.0).await;
    let pm = manager(Uuid::new_v4());
    let sender = ctx.pharmacy(pm.id(), -6.20, 106.80).await;
    let receiver = ctx.pharmacy(pm.id(), -6.30, 106.90).await;
    let drug = ctx.drug(100).await;
    ctx.stock(sender.id, drug.id, 10, 1200).await;
    ctx.stock(receiver.id, drug.id, 0, 1200).await;

    let created = ctx
        .services
        .stock_requests
        .create(&pm, transfer(sender.id, receiver.id, drug.id, 3))
        .await
        .unwrap();
    let id = created.request.id;

    let cancelled = ctx.services.stock_requests.cancel(&pm, id).await.unwrap();
    assert_eq!(cancelled.request.status, StockRequestStatus::Cancelled);

    assert_matches!(
        ctx.services.stock_requests.approve(&pm, id).await,
        Err(ServiceError::CantApproveStockMutation)
    );
    assert_matches!(
        ctx.services.stock_requests.cancel(&pm, id).await,
        Err(ServiceError::CantCancelStockMutation)
    );
    assert_eq!(ctx.stock_of(sender.id, drug.id).await, 10);
}

#[tokio::test]
async fn only_the_sending_manager_resolves_a_request() {
    let ctx = TestDb::with_distance(1.0).await;
    let pm = manager(Uuid::new_v4());
    let sender = ctx.pharmacy(pm.id(), -6.20, 106.80).await;
    let receiver = ctx.pharmacy(pm.id(), -6.30, 106.90).await;
    let drug = ctx.drug(100).await;
    ctx.stock(sender.id, drug.id, 10, 1200).await;
    ctx.stock(receiver.id, drug.id, 0, 1200).await;
    let created = ctx
        .services
        .stock_requests
        .create(&pm, transfer(sender.id, receiver.id, drug.id, 3))
        .await
        .unwrap();
    let outsider = manager(Uuid::new_v4());

    assert_matches!(
        ctx.services
            .stock_requests
            .approve(&outsider, created.request.id)
            .await,
        Err(ServiceError::CantApproveStockMutation)
    );
    assert_matches!(
        ctx.services
            .stock_requests
            .cancel(&outsider, created.request.id)
            .await,
        Err(ServiceError::CantCancelStockMutation)
    );
    assert_matches!(
        ctx.services
            .stock_requests
            .get(&outsider, created.request.id)
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert!(ctx
        .services
        .stock_requests
        .get(&admin(), created.request.id)
        .await
        .is_ok());
}
