mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::TestDb;
use pharmahub_api::{
    entities::stock_journal::JournalDescription,
    errors::ServiceError,
    repositories::{InventoryLedger, JournalEntry, StockAdjustments},
};
use uuid::Uuid;

#[tokio::test]
async fn concurrent_decrements_never_oversell() {
    let ctx = TestDb::new().await;
    let pharmacy = ctx.pharmacy(Uuid::new_v4(), -6.2, 106.8).await;
    let drug = ctx.drug(100).await;
    ctx.stock(pharmacy.id, drug.id, 10, 1000).await;

    let db = ctx.db.clone();
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let db = Arc::clone(&db);
        let (pharmacy_id, drug_id) = (pharmacy.id, drug.id);
        tasks.push(tokio::spawn(async move {
            InventoryLedger
                .decrement_stock(db.as_ref(), pharmacy_id, drug_id, 1)
                .await
        }));
    }

    let mut succeeded = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(()) => succeeded += 1,
            Err(err) => assert_matches!(err, ServiceError::InsufficientStock(_)),
        }
    }

    assert_eq!(succeeded, 10, "exactly 10 decrements should succeed");
    assert_eq!(ctx.stock_of(pharmacy.id, drug.id).await, 0);
}

#[tokio::test]
async fn rejected_decrement_leaves_stock_untouched() {
    let ctx = TestDb::new().await;
    let pharmacy = ctx.pharmacy(Uuid::new_v4(), -6.2, 106.8).await;
    let drug = ctx.drug(100).await;
    ctx.stock(pharmacy.id, drug.id, 3, 1000).await;

    let result = InventoryLedger
        .decrement_stock(ctx.conn(), pharmacy.id, drug.id, 4)
        .await;

    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
    assert_eq!(ctx.stock_of(pharmacy.id, drug.id).await, 3);
}

#[tokio::test]
async fn adjustments_must_be_positive_and_target_stocked_drugs() {
    let ctx = TestDb::new().await;
    let pharmacy = ctx.pharmacy(Uuid::new_v4(), -6.2, 106.8).await;
    let drug = ctx.drug(100).await;
    ctx.stock(pharmacy.id, drug.id, 3, 1000).await;
    let ledger = InventoryLedger;

    assert_matches!(
        ledger.decrement_stock(ctx.conn(), pharmacy.id, drug.id, 0).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        ledger.increment_stock(ctx.conn(), pharmacy.id, drug.id, -2).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        ledger
            .increment_stock(ctx.conn(), pharmacy.id, Uuid::new_v4(), 2)
            .await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn bulk_adjustments_reconcile_with_the_journal() {
    let ctx = TestDb::new().await;
    let manager_id = Uuid::new_v4();
    let p = ctx.pharmacy(manager_id, -6.2, 106.8).await;
    let q = ctx.pharmacy(manager_id, -6.3, 106.9).await;
    let drug = ctx.drug(100).await;
    ctx.stock(p.id, drug.id, 10, 1000).await;
    ctx.stock(q.id, drug.id, 4, 1000).await;
    let ledger = InventoryLedger;

    let mut out = StockAdjustments::new();
    out.entry(p.id).or_default().push((drug.id, 6));
    let mut inc = StockAdjustments::new();
    inc.entry(q.id).or_default().push((drug.id, 6));

    ledger.bulk_decrement(ctx.conn(), &out).await.unwrap();
    ledger.bulk_increment(ctx.conn(), &inc).await.unwrap();
    ledger
        .record_journal(
            ctx.conn(),
            &[
                JournalEntry::outflow(p.id, drug.id, 6, JournalDescription::SentMutation),
                JournalEntry::inflow(q.id, drug.id, 6, JournalDescription::ReceivedMutation),
            ],
        )
        .await
        .unwrap();

    assert_eq!(ctx.stock_of(p.id, drug.id).await, 10 + ctx.journal_sum(p.id, drug.id).await);
    assert_eq!(ctx.stock_of(q.id, drug.id).await, 4 + ctx.journal_sum(q.id, drug.id).await);
    assert_eq!(ctx.stock_of(p.id, drug.id).await, 4);
    assert_eq!(ctx.stock_of(q.id, drug.id).await, 10);
}

#[tokio::test]
async fn empty_journal_is_a_no_op() {
    let ctx = TestDb::new().await;
    InventoryLedger
        .record_journal(ctx.conn(), &[])
        .await
        .expect("empty journal should be accepted");
}
