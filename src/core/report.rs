//! Report generation business logic.
//!
//! This module builds the read models the bot renders: the storefront listing, a
//! product's buyable variants, and the admin stock summary. All functions are
//! framework-agnostic and return structured data that the bot layer formats.

use crate::{
    core::{
        catalog,
        stock::{self, StockScope},
    },
    entities::{product, product_variant},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;

/// One product as listed in the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontEntry {
    /// The product
    pub product: product::Model,
    /// Cheapest active variant, None when the product has none
    pub min_price: Option<i64>,
    /// Unallocated stock across active variants
    pub total_unallocated: u64,
}

/// A product page: the product with its buyable variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetail {
    /// The product
    pub product: product::Model,
    /// Active variants, cheapest first, with their unallocated stock
    pub variants: Vec<(product_variant::Model, u64)>,
}

/// Stock counts for an admin view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockSummary {
    /// Every stock row
    pub total: u64,
    /// Rows already delivered
    pub allocated: u64,
    /// Rows still for sale
    pub unallocated: u64,
}

/// Lists active products, newest first, with price and availability.
pub async fn storefront(db: &DatabaseConnection) -> Result<Vec<StorefrontEntry>> {
    let products = catalog::list_products(db, false).await?;

    let mut entries = Vec::with_capacity(products.len());
    for product in products {
        let variants = catalog::list_variants(db, product.id, false).await?;
        let min_price = variants.iter().map(|v| v.price).min();

        let mut total_unallocated = 0;
        for variant in &variants {
            total_unallocated +=
                stock::count_unallocated(db, StockScope::Variant(variant.id)).await?;
        }

        entries.push(StorefrontEntry {
            product,
            min_price,
            total_unallocated,
        });
    }
    Ok(entries)
}

/// Loads an active product by slug with its active variants.
///
/// # Errors
/// Returns `NotFound` for unknown and inactive products alike.
pub async fn product_detail(db: &DatabaseConnection, slug: &str) -> Result<ProductDetail> {
    let product = catalog::get_product_by_slug(db, slug)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| Error::not_found("Product", slug))?;

    let mut variants = catalog::list_variants(db, product.id, false).await?;
    variants.sort_by_key(|v| (v.price, v.id));

    let mut with_stock = Vec::with_capacity(variants.len());
    for variant in variants {
        let available = stock::count_unallocated(db, StockScope::Variant(variant.id)).await?;
        with_stock.push((variant, available));
    }

    Ok(ProductDetail {
        product,
        variants: with_stock,
    })
}

/// Counts a product's stock rows, tagged and untagged.
pub async fn stock_summary(db: &DatabaseConnection, product_id: i64) -> Result<StockSummary> {
    let scope = StockScope::Product(product_id);
    let allocated = stock::count_allocated(db, scope).await?;
    let unallocated = stock::count_unallocated(db, scope).await?;
    Ok(StockSummary {
        total: allocated + unallocated,
        allocated,
        unallocated,
    })
}

/// Formats an amount with thousands separators and a currency label.
///
/// # Examples
/// ```
/// assert_eq!(vault_shop::core::report::format_money(20000, "MMK"), "20,000 MMK");
/// ```
#[must_use]
pub fn format_money(amount: i64, currency: &str) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if currency.is_empty() {
        grouped
    } else {
        format!("{grouped} {currency}")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::purchase;
    use crate::entities::DeliveryType;
    use crate::test_utils::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0, "MMK"), "0 MMK");
        assert_eq!(format_money(999, "MMK"), "999 MMK");
        assert_eq!(format_money(1000, "MMK"), "1,000 MMK");
        assert_eq!(format_money(1_234_567, ""), "1,234,567");
        assert_eq!(format_money(-20000, "MMK"), "-20,000 MMK");
    }

    #[tokio::test]
    async fn test_storefront_min_price_and_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Spotify", DeliveryType::Account).await?;
        let cheap = create_test_variant(&db, product.id, "1 month", 3000).await?;
        let pricey = create_test_variant(&db, product.id, "1 year", 30000).await?;
        let hidden = create_test_variant(&db, product.id, "Promo", 10).await?;
        catalog::set_variant_active(&db, hidden.id, false).await?;

        add_stock(&db, &product, Some(cheap.id), 2).await?;
        add_stock(&db, &product, Some(pricey.id), 1).await?;
        add_stock(&db, &product, Some(hidden.id), 5).await?;
        add_stock(&db, &product, None, 4).await?;

        let empty = create_test_product(&db, "Empty", DeliveryType::Code).await?;
        let off = create_test_product(&db, "Off", DeliveryType::Code).await?;
        catalog::set_product_active(&db, off.id, false).await?;

        let listing = storefront(&db).await?;
        assert_eq!(listing.len(), 2);
        let spotify = listing.iter().find(|e| e.product.id == product.id).unwrap();
        assert_eq!(spotify.min_price, Some(3000));
        assert_eq!(spotify.total_unallocated, 3);
        let empty = listing.iter().find(|e| e.product.id == empty.id).unwrap();
        assert_eq!(empty.min_price, None);
        assert_eq!(empty.total_unallocated, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_product_detail_sorts_by_price() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Netflix", DeliveryType::Account).await?;
        let year = create_test_variant(&db, product.id, "1 year", 90000).await?;
        let month = create_test_variant(&db, product.id, "1 month", 9000).await?;
        add_stock(&db, &product, Some(month.id), 2).await?;

        let detail = product_detail(&db, &product.slug).await?;
        let order: Vec<i64> = detail.variants.iter().map(|(v, _)| v.id).collect();
        assert_eq!(order, vec![month.id, year.id]);
        assert_eq!(detail.variants[0].1, 2);
        assert_eq!(detail.variants[1].1, 0);

        catalog::set_product_active(&db, product.id, false).await?;
        assert!(matches!(
            product_detail(&db, &product.slug).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_stock_summary_after_sale() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, variant) = setup_code_offering(&db, 100, 4).await?;
        add_stock(&db, &product, None, 1).await?;
        let buyer = create_test_user(&db, "buyer", 1000).await?;
        purchase::purchase(&db, buyer.id, variant.id, Some(3)).await?;

        assert_eq!(
            stock_summary(&db, product.id).await?,
            StockSummary {
                total: 5,
                allocated: 3,
                unallocated: 2,
            }
        );
        Ok(())
    }
}
