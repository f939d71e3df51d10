use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QuerySelect,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::{
    pharmacy_drug,
    stock_journal::{self, JournalDescription},
};
use crate::errors::ServiceError;

/// Adjustments grouped by pharmacy: `pharmacy_id -> [(drug_id, quantity)]`
pub type StockAdjustments = HashMap<Uuid, Vec<(Uuid, i32)>>;

/// A stock movement to append to the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub drug_id: Uuid,
    pub pharmacy_id: Uuid,
    /// Negative for outflows
    pub quantity: i32,
    pub description: JournalDescription,
}

impl JournalEntry {
    pub fn outflow(
        pharmacy_id: Uuid,
        drug_id: Uuid,
        quantity: i32,
        description: JournalDescription,
    ) -> Self {
        Self {
            drug_id,
            pharmacy_id,
            quantity: -quantity,
            description,
        }
    }

    pub fn inflow(
        pharmacy_id: Uuid,
        drug_id: Uuid,
        quantity: i32,
        description: JournalDescription,
    ) -> Self {
        Self {
            drug_id,
            pharmacy_id,
            quantity,
            description,
        }
    }
}

/// The only writer of `pharmacy_drugs.stock`.
///
/// Stock is changed with relative updates (`stock = stock - n`), never by
/// writing an absolute value, so concurrent writers cannot lose each other's
/// changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    /// Atomically removes `quantity` units. Fails with `InsufficientStock`
    /// and changes nothing when fewer units are on hand.
    pub async fn decrement_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        pharmacy_id: Uuid,
        drug_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        ensure_positive(quantity)?;

        let result = pharmacy_drug::Entity::update_many()
            .col_expr(
                pharmacy_drug::Column::Stock,
                Expr::col(pharmacy_drug::Column::Stock).sub(quantity),
            )
            .col_expr(pharmacy_drug::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(pharmacy_drug::Column::PharmacyId.eq(pharmacy_id))
            .filter(pharmacy_drug::Column::DrugId.eq(drug_id))
            .filter(pharmacy_drug::Column::DeletedAt.is_null())
            .filter(pharmacy_drug::Column::Stock.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            warn!(%pharmacy_id, %drug_id, quantity, "stock decrement rejected");
            return Err(ServiceError::InsufficientStock(format!(
                "drug {} at pharmacy {} has fewer than {} units",
                drug_id, pharmacy_id, quantity
            )));
        }

        debug!(%pharmacy_id, %drug_id, quantity, "stock decremented");
        Ok(())
    }

    /// Atomically adds `quantity` units to an existing pharmacy drug.
    pub async fn increment_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        pharmacy_id: Uuid,
        drug_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        ensure_positive(quantity)?;

        let result = pharmacy_drug::Entity::update_many()
            .col_expr(
                pharmacy_drug::Column::Stock,
                Expr::col(pharmacy_drug::Column::Stock).add(quantity),
            )
            .col_expr(pharmacy_drug::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(pharmacy_drug::Column::PharmacyId.eq(pharmacy_id))
            .filter(pharmacy_drug::Column::DrugId.eq(drug_id))
            .filter(pharmacy_drug::Column::DeletedAt.is_null())
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "drug {} is not stocked by pharmacy {}",
                drug_id, pharmacy_id
            )));
        }

        debug!(%pharmacy_id, %drug_id, quantity, "stock incremented");
        Ok(())
    }

    /// Applies every adjustment with [`Self::decrement_stock`]; the first
    /// failure aborts the rest.
    pub async fn bulk_decrement<C: ConnectionTrait>(
        &self,
        conn: &C,
        adjustments: &StockAdjustments,
    ) -> Result<(), ServiceError> {
        for (pharmacy_id, lines) in adjustments {
            for (drug_id, quantity) in lines {
                self.decrement_stock(conn, *pharmacy_id, *drug_id, *quantity)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn bulk_increment<C: ConnectionTrait>(
        &self,
        conn: &C,
        adjustments: &StockAdjustments,
    ) -> Result<(), ServiceError> {
        for (pharmacy_id, lines) in adjustments {
            for (drug_id, quantity) in lines {
                self.increment_stock(conn, *pharmacy_id, *drug_id, *quantity)
                    .await?;
            }
        }
        Ok(())
    }

    /// Appends journal entries. Must run on the same transaction as the
    /// stock change it describes.
    pub async fn record_journal<C: ConnectionTrait>(
        &self,
        conn: &C,
        entries: &[JournalEntry],
    ) -> Result<(), ServiceError> {
        if entries.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let models = entries.iter().map(|entry| stock_journal::ActiveModel {
            id: Set(Uuid::new_v4()),
            drug_id: Set(entry.drug_id),
            pharmacy_id: Set(entry.pharmacy_id),
            quantity: Set(entry.quantity),
            description: Set(entry.description),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        });

        stock_journal::Entity::insert_many(models).exec(conn).await?;
        debug!(count = entries.len(), "stock journal entries recorded");
        Ok(())
    }

    /// Current stock of a pharmacy drug, `None` when it is not stocked.
    pub async fn stock_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        pharmacy_id: Uuid,
        drug_id: Uuid,
    ) -> Result<Option<i32>, ServiceError> {
        let stock = pharmacy_drug::Entity::find()
            .select_only()
            .column(pharmacy_drug::Column::Stock)
            .filter(pharmacy_drug::Column::PharmacyId.eq(pharmacy_id))
            .filter(pharmacy_drug::Column::DrugId.eq(drug_id))
            .filter(pharmacy_drug::Column::DeletedAt.is_null())
            .into_tuple::<i32>()
            .one(conn)
            .await?;
        Ok(stock)
    }

    /// Journal entries of one (drug, pharmacy) pair, oldest first.
    pub async fn journal_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        pharmacy_id: Uuid,
        drug_id: Uuid,
    ) -> Result<Vec<stock_journal::Model>, ServiceError> {
        use sea_orm::QueryOrder;

        let entries = stock_journal::Entity::find()
            .filter(stock_journal::Column::PharmacyId.eq(pharmacy_id))
            .filter(stock_journal::Column::DrugId.eq(drug_id))
            .filter(stock_journal::Column::DeletedAt.is_null())
            .order_by_asc(stock_journal::Column::CreatedAt)
            .all(conn)
            .await?;
        Ok(entries)
    }
}

fn ensure_positive(quantity: i32) -> Result<(), ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(format!(
            "stock adjustments must be positive, got {}",
            quantity
        )));
    }
    Ok(())
}

/// Adds `(drug_id, quantity)` to a pharmacy's adjustment list.
pub fn push_adjustment(
    adjustments: &mut StockAdjustments,
    pharmacy_id: Uuid,
    drug_id: Uuid,
    quantity: i32,
) {
    adjustments
        .entry(pharmacy_id)
        .or_default()
        .push((drug_id, quantity));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_entry_signs() {
        let (p, d) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            JournalEntry::outflow(p, d, 3, JournalDescription::Sold).quantity,
            -3
        );
        assert_eq!(
            JournalEntry::inflow(p, d, 3, JournalDescription::Returned).quantity,
            3
        );
    }

    #[test]
    fn non_positive_adjustments_are_rejected() {
        assert!(ensure_positive(0).is_err());
        assert!(ensure_positive(-2).is_err());
        assert!(ensure_positive(1).is_ok());
    }

    #[test]
    fn adjustments_group_by_pharmacy() {
        let mut adjustments = StockAdjustments::new();
        let (p, d1, d2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        push_adjustment(&mut adjustments, p, d1, 1);
        push_adjustment(&mut adjustments, p, d2, 4);
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[&p], vec![(d1, 1), (d2, 4)]);
    }
}
