//! Stock store business logic - Inventory rows and their one-way allocation.
//!
//! The load-bearing operation is [`reserve`]: a single conditional bulk update
//!
//! ```sql
//! UPDATE stock_items
//!    SET allocated = true, allocated_to_id = ?, allocated_at = ?
//!  WHERE id IN (...) AND allocated = false
//! ```
//!
//! whose affected-row count tells the caller how many rows it actually won. The
//! "still unallocated" predicate is evaluated atomically with the write, so two
//! overlapping reservations can never both claim the same row. Callers compare the
//! count with what they asked for and abort when it falls short.

use crate::{
    entities::{DeliveryPayload, StockItem, product, stock_item},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr,
};
use tracing::{debug, info};

/// Which slice of inventory an aggregate operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockScope {
    /// Every stock row of the product, tagged or not
    Product(i64),
    /// Stock rows tagged with the variant
    Variant(i64),
}

impl StockScope {
    fn condition(self) -> Condition {
        match self {
            Self::Product(id) => Condition::all().add(stock_item::Column::ProductId.eq(id)),
            Self::Variant(id) => Condition::all().add(stock_item::Column::VariantId.eq(id)),
        }
    }
}

/// A stock row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockItem {
    /// Owning product
    pub product_id: i64,
    /// Variant tag, None for product-level stock
    pub variant_id: Option<i64>,
    /// Deliverable payload
    pub payload: DeliveryPayload,
    /// Optional note delivered with the payload
    pub note: Option<String>,
}

impl NewStockItem {
    fn into_active_model(self, now: DateTimeUtc) -> stock_item::ActiveModel {
        let (code, email, password, text) = self.payload.into_columns();
        stock_item::ActiveModel {
            product_id: Set(self.product_id),
            variant_id: Set(self.variant_id),
            code: Set(code),
            email: Set(email),
            password: Set(password),
            text: Set(text),
            note: Set(self.note),
            allocated: Set(false),
            allocated_to_id: Set(None),
            allocated_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
    }
}

/// Returns up to `limit` unallocated rows of `(product_id, variant_id)`, lowest id first.
///
/// `variant_id = None` matches untagged product-level stock only.
pub async fn find_unallocated<C>(
    db: &C,
    product_id: i64,
    variant_id: Option<i64>,
    limit: u64,
) -> Result<Vec<stock_item::Model>>
where
    C: ConnectionTrait,
{
    let variant_filter = variant_id.map_or_else(
        || stock_item::Column::VariantId.is_null(),
        |id| stock_item::Column::VariantId.eq(id),
    );

    StockItem::find()
        .filter(stock_item::Column::ProductId.eq(product_id))
        .filter(variant_filter)
        .filter(stock_item::Column::Allocated.eq(false))
        .order_by_asc(stock_item::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks the given rows allocated to `user_id`, skipping rows that are already taken.
///
/// # Returns
/// The number of rows this call actually reserved. Anything less than `ids.len()`
/// means another reservation got there first.
pub async fn reserve<C>(db: &C, ids: &[i64], user_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(0);
    }

    let result = StockItem::update_many()
        .col_expr(stock_item::Column::Allocated, Expr::value(true))
        .col_expr(stock_item::Column::AllocatedToId, Expr::value(user_id))
        .col_expr(
            stock_item::Column::AllocatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(stock_item::Column::Id.is_in(ids.iter().copied()))
        .filter(stock_item::Column::Allocated.eq(false))
        .exec(db)
        .await?;

    debug!(
        requested = ids.len(),
        reserved = result.rows_affected,
        user_id,
        "Stock reservation"
    );
    Ok(result.rows_affected)
}

/// Counts unallocated rows in the scope.
pub async fn count_unallocated<C>(db: &C, scope: StockScope) -> Result<u64>
where
    C: ConnectionTrait,
{
    StockItem::find()
        .filter(scope.condition())
        .filter(stock_item::Column::Allocated.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Counts allocated rows in the scope.
pub async fn count_allocated<C>(db: &C, scope: StockScope) -> Result<u64>
where
    C: ConnectionTrait,
{
    StockItem::find()
        .filter(scope.condition())
        .filter(stock_item::Column::Allocated.eq(true))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Deletes every unallocated row in the scope. Allocated rows are never touched.
///
/// # Returns
/// The number of rows removed.
pub async fn delete_unallocated(db: &DatabaseConnection, scope: StockScope) -> Result<u64> {
    let removed = StockItem::delete_many()
        .filter(scope.condition())
        .filter(stock_item::Column::Allocated.eq(false))
        .exec(db)
        .await?
        .rows_affected;
    info!(?scope, removed, "Cleared unallocated stock");
    Ok(removed)
}

/// Inserts the rows in one statement.
///
/// # Returns
/// The number of rows inserted; an empty input inserts nothing and returns 0.
pub async fn bulk_insert<C>(db: &C, rows: Vec<NewStockItem>) -> Result<u64>
where
    C: ConnectionTrait,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let now = chrono::Utc::now();
    let models = rows.into_iter().map(|row| row.into_active_model(now));
    let inserted = StockItem::insert_many(models)
        .exec_without_returning(db)
        .await?;
    info!(inserted, "Inserted stock rows");
    Ok(inserted)
}

/// Creates one stock row after checking the payload fits the product.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist, or the variant does not belong to it (`NotFound`)
/// - The payload kind differs from the product's delivery type, or a required field is
///   blank (`Validation`)
pub async fn create_stock_item(
    db: &DatabaseConnection,
    product_id: i64,
    variant_id: Option<i64>,
    payload: DeliveryPayload,
    note: Option<String>,
) -> Result<stock_item::Model> {
    let product = crate::core::catalog::get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    if let Some(variant_id) = variant_id {
        let variant = crate::core::catalog::get_variant_by_id(db, variant_id).await?;
        if variant.is_none_or(|v| v.product_id != product_id) {
            return Err(Error::not_found("Variant", variant_id));
        }
    }

    validate_payload(&product, &payload)?;

    let row = NewStockItem {
        product_id,
        variant_id,
        payload,
        note: note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    };
    row.into_active_model(chrono::Utc::now())
        .insert(db)
        .await
        .map_err(Into::into)
}

fn validate_payload(product: &product::Model, payload: &DeliveryPayload) -> Result<()> {
    if payload.delivery_type() != product.delivery_type {
        return Err(Error::validation(format!(
            "'{}' delivers {} items, got a {} payload",
            product.title,
            product.delivery_type,
            payload.delivery_type()
        )));
    }

    let blank = match payload {
        DeliveryPayload::Code { code } => code.trim().is_empty(),
        DeliveryPayload::Account { email, password } => {
            email.trim().is_empty() || password.trim().is_empty()
        }
        DeliveryPayload::Text { text } => text.trim().is_empty(),
    };
    if blank {
        return Err(Error::validation("Stock payload fields cannot be empty"));
    }
    Ok(())
}

/// Returns the newest unallocated rows in the scope, for admin previews.
pub async fn preview_unallocated(
    db: &DatabaseConnection,
    scope: StockScope,
    limit: u64,
) -> Result<Vec<stock_item::Model>> {
    StockItem::find()
        .filter(scope.condition())
        .filter(stock_item::Column::Allocated.eq(false))
        .order_by_desc(stock_item::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::DeliveryType;
    use crate::test_utils::*;

    fn code(value: &str) -> DeliveryPayload {
        DeliveryPayload::Code {
            code: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_unallocated_is_ordered_and_scoped() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Codes", DeliveryType::Code).await?;
        let variant = create_test_variant(&db, product.id, "Basic", 100).await?;
        let other = create_test_variant(&db, product.id, "Pro", 200).await?;

        add_stock(&db, &product, Some(variant.id), 3).await?;
        add_stock(&db, &product, Some(other.id), 2).await?;
        add_stock(&db, &product, None, 1).await?;

        let rows = find_unallocated(&db, product.id, Some(variant.id), 10).await?;
        assert_eq!(rows.len(), 3);
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
        assert!(rows.iter().all(|r| r.variant_id == Some(variant.id)));

        let limited = find_unallocated(&db, product.id, Some(variant.id), 2).await?;
        assert_eq!(limited, rows[..2].to_vec());

        let untagged = find_unallocated(&db, product.id, None, 10).await?;
        assert_eq!(untagged.len(), 1);
        assert!(untagged[0].variant_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_only_takes_unallocated_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, variant) = setup_code_offering(&db, 100, 3).await?;
        let first = create_test_user(&db, "first", 0).await?;
        let second = create_test_user(&db, "second", 0).await?;

        let rows = find_unallocated(&db, product.id, Some(variant.id), 3).await?;
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        assert_eq!(reserve(&db, &ids[..2], first.id).await?, 2);
        // Overlapping claim: only the one row still free is won
        assert_eq!(reserve(&db, &ids, second.id).await?, 1);
        assert_eq!(reserve(&db, &ids, second.id).await?, 0);

        let all = StockItem::find()
            .order_by_asc(stock_item::Column::Id)
            .all(&db)
            .await?;
        assert_eq!(all[0].allocated_to_id, Some(first.id));
        assert_eq!(all[1].allocated_to_id, Some(first.id));
        assert_eq!(all[2].allocated_to_id, Some(second.id));
        assert!(all.iter().all(|r| r.allocated && r.allocated_at.is_some()));
        Ok(())
    }

    #[tokio::test]
    async fn test_counts_and_delete_unallocated() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, variant) = setup_code_offering(&db, 100, 4).await?;
        let buyer = create_test_user(&db, "buyer", 0).await?;

        let rows = find_unallocated(&db, product.id, Some(variant.id), 1).await?;
        reserve(&db, &[rows[0].id], buyer.id).await?;

        let scope = StockScope::Variant(variant.id);
        assert_eq!(count_unallocated(&db, scope).await?, 3);
        assert_eq!(count_allocated(&db, scope).await?, 1);

        assert_eq!(delete_unallocated(&db, scope).await?, 3);
        assert_eq!(count_unallocated(&db, scope).await?, 0);
        // Allocated rows survive a clear
        assert_eq!(count_allocated(&db, StockScope::Product(product.id)).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_insert_empty_is_noop() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(bulk_insert(&db, Vec::new()).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_stock_item_checks_payload_kind() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Accounts", DeliveryType::Account).await?;

        let result = create_stock_item(&db, product.id, None, code("ABC"), None).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_stock_item(
            &db,
            product.id,
            None,
            DeliveryPayload::Account {
                email: "a@x.com".to_string(),
                password: " ".to_string(),
            },
            None,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let item = create_stock_item(
            &db,
            product.id,
            None,
            DeliveryPayload::Account {
                email: "a@x.com".to_string(),
                password: "pw".to_string(),
            },
            Some("  profile 2 ".to_string()),
        )
        .await?;
        assert_eq!(item.email.as_deref(), Some("a@x.com"));
        assert_eq!(item.note.as_deref(), Some("profile 2"));
        assert!(item.code.is_none());
        assert!(!item.allocated);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_stock_item_rejects_foreign_variant() -> Result<()> {
        let db = setup_test_db().await?;
        let mine = create_test_product(&db, "Mine", DeliveryType::Code).await?;
        let theirs = create_test_product(&db, "Theirs", DeliveryType::Code).await?;
        let their_variant = create_test_variant(&db, theirs.id, "Basic", 100).await?;

        let result =
            create_stock_item(&db, mine.id, Some(their_variant.id), code("X"), None).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_preview_is_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, _variant) = setup_code_offering(&db, 100, 5).await?;

        let preview = preview_unallocated(&db, StockScope::Product(product.id), 2).await?;
        assert_eq!(preview.len(), 2);
        assert!(preview[0].id > preview[1].id);
        Ok(())
    }
}
