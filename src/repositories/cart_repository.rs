use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QuerySelect, RelationTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{cart_item, drug, pharmacy_drug};
use crate::errors::ServiceError;

/// Cart line frozen under a row lock for checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockedCartItem {
    pub cart_item_id: Uuid,
    pub pharmacy_drug_id: Uuid,
    pub drug_id: Uuid,
    pub quantity: i32,
    pub is_prescripted: bool,
    /// Unit price at lock time
    pub price: i64,
    /// `quantity * price`
    pub total_price: i64,
    pub stock: i32,
    /// Unit weight in grams
    pub weight: i32,
}

impl LockedCartItem {
    pub fn line_weight(&self) -> i64 {
        i64::from(self.weight) * i64::from(self.quantity)
    }
}

#[derive(Debug, FromQueryResult)]
struct CartLockRow {
    cart_item_id: Uuid,
    pharmacy_drug_id: Uuid,
    drug_id: Uuid,
    quantity: i32,
    is_prescripted: bool,
    price: i64,
    stock: i32,
    weight: i32,
}

impl From<CartLockRow> for LockedCartItem {
    fn from(row: CartLockRow) -> Self {
        Self {
            cart_item_id: row.cart_item_id,
            pharmacy_drug_id: row.pharmacy_drug_id,
            drug_id: row.drug_id,
            quantity: row.quantity,
            is_prescripted: row.is_prescripted,
            price: row.price,
            total_price: row.price.saturating_mul(i64::from(row.quantity)),
            stock: row.stock,
            weight: row.weight,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CartRepository;

impl CartRepository {
    /// Locks the requested cart items of `user_id` that are sold by
    /// `pharmacy_id` (`SELECT ... FOR UPDATE`).
    ///
    /// Items owned by someone else, sold by another pharmacy, already
    /// ordered, or whose pharmacy drug is gone are left out. A result shorter
    /// than `item_ids` is expected under concurrent checkouts.
    pub async fn lock_cart_items<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        pharmacy_id: Uuid,
        item_ids: &[Uuid],
    ) -> Result<Vec<LockedCartItem>, ServiceError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = cart_item::Entity::find()
            .select_only()
            .column_as(cart_item::Column::Id, "cart_item_id")
            .column_as(cart_item::Column::PharmacyDrugId, "pharmacy_drug_id")
            .column_as(pharmacy_drug::Column::DrugId, "drug_id")
            .column_as(cart_item::Column::Quantity, "quantity")
            .column_as(cart_item::Column::IsPrescripted, "is_prescripted")
            .column_as(pharmacy_drug::Column::Price, "price")
            .column_as(pharmacy_drug::Column::Stock, "stock")
            .column_as(drug::Column::Weight, "weight")
            .join(JoinType::InnerJoin, cart_item::Relation::PharmacyDrug.def())
            .join(JoinType::InnerJoin, pharmacy_drug::Relation::Drug.def())
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::Id.is_in(item_ids.to_vec()))
            .filter(cart_item::Column::DeletedAt.is_null())
            .filter(pharmacy_drug::Column::PharmacyId.eq(pharmacy_id))
            .filter(pharmacy_drug::Column::IsActive.eq(true))
            .filter(pharmacy_drug::Column::DeletedAt.is_null())
            .lock_exclusive()
            .into_model::<CartLockRow>()
            .all(conn)
            .await?;

        Ok(rows.into_iter().map(LockedCartItem::from).collect())
    }

    /// Marks ordered cart items as deleted.
    pub async fn soft_delete_items<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        item_ids: &[Uuid],
    ) -> Result<u64, ServiceError> {
        if item_ids.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let result = cart_item::Entity::update_many()
            .set(cart_item::ActiveModel {
                deleted_at: Set(Some(now)),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::Id.is_in(item_ids.to_vec()))
            .filter(cart_item::Column::DeletedAt.is_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<cart_item::Model>, ServiceError> {
        Ok(cart_item::Entity::find_by_id(id).one(conn).await?)
    }
}
