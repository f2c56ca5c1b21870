//! Bulk stock loader - Maps parsed rows to stock payloads and inserts them.
//!
//! Rows arrive already tokenized (see [`crate::core::rows`]). Mapping depends on the
//! product's delivery type:
//!
//! | Delivery type | Positional columns           |
//! |---------------|------------------------------|
//! | CODE          | `code, note?`                |
//! | ACCOUNT       | `email, password, note?`     |
//! | TEXT          | `text, note?`                |
//!
//! When the first row looks like a header for the delivery type it is excluded, and
//! columns are looked up by name instead. Rows missing a required field are skipped
//! without error; callers report them as `input_rows - inserted`.

use crate::{
    core::{
        catalog,
        stock::{self, NewStockItem},
    },
    entities::{DeliveryPayload, DeliveryType},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

/// Result of a bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    /// Data rows received, header excluded
    pub input_rows: usize,
    /// Stock rows written
    pub inserted: usize,
    /// Rows dropped for missing a required field
    pub skipped: usize,
    /// Whether the first row was treated as a header
    pub header_detected: bool,
}

/// Payloads extracted from rows, before they are bound to a product.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MappedRows {
    /// Valid payloads with their optional note
    pub items: Vec<(DeliveryPayload, Option<String>)>,
    /// Data rows seen, header excluded
    pub input_rows: usize,
    /// Whether the first row was treated as a header
    pub header_detected: bool,
}

impl MappedRows {
    fn summary(&self, inserted: usize) -> LoadSummary {
        LoadSummary {
            input_rows: self.input_rows,
            inserted,
            skipped: self.input_rows.saturating_sub(inserted),
            header_detected: self.header_detected,
        }
    }
}

/// Column positions used to read one delivery type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    primary: usize,
    password: Option<usize>,
    note: usize,
}

impl Columns {
    const fn positional(delivery_type: DeliveryType) -> Self {
        match delivery_type {
            DeliveryType::Account => Self {
                primary: 0,
                password: Some(1),
                note: 2,
            },
            DeliveryType::Code | DeliveryType::Text => Self {
                primary: 0,
                password: None,
                note: 1,
            },
        }
    }

    /// Resolves columns from header names, keeping the positional slot for any
    /// column the header does not name.
    fn from_header(delivery_type: DeliveryType, header: &[String]) -> Self {
        let find = |name: &str| header.iter().position(|h| h == name);
        let fallback = Self::positional(delivery_type);
        let primary_name = match delivery_type {
            DeliveryType::Code => "code",
            DeliveryType::Account => "email",
            DeliveryType::Text => "text",
        };
        Self {
            primary: find(primary_name).unwrap_or(fallback.primary),
            password: fallback.password.map(|pos| find("password").unwrap_or(pos)),
            note: find("note").unwrap_or(fallback.note),
        }
    }
}

fn is_header(delivery_type: DeliveryType, cells: &[String]) -> bool {
    let has = |name: &str| cells.iter().any(|c| c == name);
    match delivery_type {
        DeliveryType::Code => has("code"),
        DeliveryType::Account => has("email") || has("password"),
        DeliveryType::Text => has("text"),
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map_or("", |c| c.trim())
}

fn map_row(
    delivery_type: DeliveryType,
    columns: Columns,
    row: &[String],
) -> Option<(DeliveryPayload, Option<String>)> {
    let primary = cell(row, columns.primary);
    if primary.is_empty() {
        return None;
    }

    let payload = match delivery_type {
        DeliveryType::Code => DeliveryPayload::Code {
            code: primary.to_string(),
        },
        DeliveryType::Text => DeliveryPayload::Text {
            text: primary.to_string(),
        },
        DeliveryType::Account => {
            let password = columns.password.map_or("", |i| cell(row, i));
            if password.is_empty() {
                return None;
            }
            DeliveryPayload::Account {
                email: primary.to_string(),
                password: password.to_string(),
            }
        }
    };

    let note = cell(row, columns.note);
    Some((payload, (!note.is_empty()).then(|| note.to_string())))
}

/// Maps rows to payloads for a delivery type without touching the database.
#[must_use]
pub fn map_rows(delivery_type: DeliveryType, rows: &[Vec<String>]) -> MappedRows {
    let header: Option<Vec<String>> = rows
        .first()
        .map(|first| first.iter().map(|c| c.trim().to_lowercase()).collect())
        .filter(|cells: &Vec<String>| is_header(delivery_type, cells));

    let (columns, data) = match &header {
        Some(names) => (Columns::from_header(delivery_type, names), &rows[1..]),
        None => (Columns::positional(delivery_type), rows),
    };

    MappedRows {
        items: data
            .iter()
            .filter_map(|row| map_row(delivery_type, columns, row))
            .collect(),
        input_rows: data.len(),
        header_detected: header.is_some(),
    }
}

/// Loads rows as stock tagged with a variant.
///
/// # Errors
/// Returns `NotFound` when the variant or its product does not exist.
#[instrument(skip(db, rows), fields(rows = rows.len()))]
pub async fn load_rows(
    db: &DatabaseConnection,
    variant_id: i64,
    rows: &[Vec<String>],
) -> Result<LoadSummary> {
    let (variant, product) = catalog::get_variant_with_product(db, variant_id)
        .await?
        .ok_or_else(|| Error::not_found("Variant", variant_id))?;

    insert_mapped(db, product.id, Some(variant.id), product.delivery_type, rows).await
}

/// Loads rows as untagged, product-level stock.
///
/// # Errors
/// Returns `NotFound` when the product does not exist.
#[instrument(skip(db, rows), fields(rows = rows.len()))]
pub async fn load_product_rows(
    db: &DatabaseConnection,
    product_id: i64,
    rows: &[Vec<String>],
) -> Result<LoadSummary> {
    let product = catalog::get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    insert_mapped(db, product.id, None, product.delivery_type, rows).await
}

async fn insert_mapped(
    db: &DatabaseConnection,
    product_id: i64,
    variant_id: Option<i64>,
    delivery_type: DeliveryType,
    rows: &[Vec<String>],
) -> Result<LoadSummary> {
    let mapped = map_rows(delivery_type, rows);
    let new_rows: Vec<NewStockItem> = mapped
        .items
        .iter()
        .cloned()
        .map(|(payload, note)| NewStockItem {
            product_id,
            variant_id,
            payload,
            note,
        })
        .collect();

    let inserted = usize::try_from(stock::bulk_insert(db, new_rows).await?).unwrap_or(usize::MAX);
    let summary = mapped.summary(inserted);
    info!(
        product_id,
        ?variant_id,
        input_rows = summary.input_rows,
        inserted = summary.inserted,
        skipped = summary.skipped,
        "Bulk stock load finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::stock::StockScope;
    use crate::entities::{StockItem, stock_item};
    use crate::test_utils::*;
    use sea_orm::{EntityTrait, QueryOrder};

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn test_account_rows_skip_missing_fields() {
        let mapped = map_rows(
            DeliveryType::Account,
            &rows(&[&["a@x.com", "p1", ""], &["", ""], &["b@x.com", "p2", "note"]]),
        );
        assert!(!mapped.header_detected);
        assert_eq!(mapped.input_rows, 3);
        assert_eq!(mapped.items.len(), 2);
        assert_eq!(mapped.items[0].1, None);
        assert_eq!(mapped.items[1].1.as_deref(), Some("note"));
        assert_eq!(mapped.summary(2).skipped, 1);
    }

    #[test]
    fn test_header_maps_columns_by_name() {
        let mapped = map_rows(
            DeliveryType::Account,
            &rows(&[
                &["Note", "Password", "EMAIL"],
                &["family plan", "secret", "c@x.com"],
                &["", "", "d@x.com"],
            ]),
        );
        assert!(mapped.header_detected);
        assert_eq!(mapped.input_rows, 2);
        assert_eq!(
            mapped.items,
            vec![(
                DeliveryPayload::Account {
                    email: "c@x.com".to_string(),
                    password: "secret".to_string(),
                },
                Some("family plan".to_string())
            )]
        );
    }

    #[test]
    fn test_header_only_counts_for_its_delivery_type() {
        // "email" is no header for CODE stock, so the row is data
        let mapped = map_rows(DeliveryType::Code, &rows(&[&["email"], &["ABC-1"]]));
        assert!(!mapped.header_detected);
        assert_eq!(mapped.items.len(), 2);

        let mapped = map_rows(DeliveryType::Text, &rows(&[&[" Text ", "note"], &["hello"]]));
        assert!(mapped.header_detected);
        assert_eq!(
            mapped.items,
            vec![(
                DeliveryPayload::Text {
                    text: "hello".to_string()
                },
                None
            )]
        );
    }

    #[test]
    fn test_empty_input() {
        let mapped = map_rows(DeliveryType::Code, &[]);
        assert_eq!(mapped, MappedRows::default());
    }

    #[tokio::test]
    async fn test_load_rows_tags_variant_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Netflix", DeliveryType::Account).await?;
        let variant = create_test_variant(&db, product.id, "1 month", 12000).await?;

        let summary = load_rows(
            &db,
            variant.id,
            &rows(&[&["a@x.com", "p1", ""], &["", ""], &["b@x.com", "p2", "note"]]),
        )
        .await?;
        assert_eq!(
            summary,
            LoadSummary {
                input_rows: 3,
                inserted: 2,
                skipped: 1,
                header_detected: false,
            }
        );

        let stored = StockItem::find()
            .order_by_asc(stock_item::Column::Id)
            .all(&db)
            .await?;
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|s| s.variant_id == Some(variant.id)));
        assert_eq!(stored[1].note.as_deref(), Some("note"));
        assert_eq!(
            stored[0].payload(DeliveryType::Account),
            Some(DeliveryPayload::Account {
                email: "a@x.com".to_string(),
                password: "p1".to_string(),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_load_product_rows_is_untagged() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Keys", DeliveryType::Code).await?;

        let summary =
            load_product_rows(&db, product.id, &rows(&[&["code", "note"], &["K1"], &["K2", "x"]]))
                .await?;
        assert!(summary.header_detected);
        assert_eq!(summary.inserted, 2);
        assert_eq!(
            stock::count_unallocated(&db, StockScope::Product(product.id)).await?,
            2
        );
        assert!(
            stock::find_unallocated(&db, product.id, None, 10)
                .await?
                .iter()
                .all(|s| s.variant_id.is_none())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_load_into_missing_variant_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = load_rows(&db, 42, &rows(&[&["X"]])).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
