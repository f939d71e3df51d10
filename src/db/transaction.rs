//! Scoped transactions.
//!
//! Every multi-step mutation runs inside [`Transactor::with_transaction`]. The
//! callback receives the transaction handle explicitly and passes it to every
//! repository call it makes, so nothing inside it ever opens a second
//! transaction.

use crate::errors::ServiceError;
use futures::future::BoxFuture;
use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Transactor {
    db: Arc<DatabaseConnection>,
}

impl Transactor {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Begins a transaction, runs `f` with it, commits when `f` succeeds and
    /// rolls back when it fails. The error from `f` is returned unchanged.
    ///
    /// ```rust,ignore
    /// let order = transactor
    ///     .with_transaction(move |txn| {
    ///         Box::pin(async move {
    ///             ledger.decrement_stock(txn, pharmacy_id, drug_id, 1).await?;
    ///             orders.insert(txn, order).await
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_transaction<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>>
            + Send,
        T: Send,
    {
        let transaction_id = Uuid::new_v4();
        let start = Instant::now();

        debug!(transaction_id = %transaction_id, "Starting database transaction");
        counter!("pharmahub_db.transaction.started", 1);

        let txn = self.db.begin().await?;
        let result = f(&txn).await;
        let elapsed = start.elapsed();
        histogram!("pharmahub_db.transaction.duration", elapsed);

        match result {
            Ok(value) => {
                txn.commit().await?;
                counter!("pharmahub_db.transaction.committed", 1);
                debug!(transaction_id = %transaction_id, "Transaction committed in {:?}", elapsed);
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(
                        transaction_id = %transaction_id,
                        error = %rollback_err,
                        "Transaction rollback failed"
                    );
                }
                counter!("pharmahub_db.transaction.rolled_back", 1);
                warn!(
                    transaction_id = %transaction_id,
                    error = %err,
                    "Transaction rolled back after {:?}",
                    elapsed
                );
                Err(err)
            }
        }
    }
}
