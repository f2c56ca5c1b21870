//! Catalog business logic - Products and their pricing variants.
//!
//! This module provides functions for creating, retrieving, updating and removing
//! products and variants. It also exposes the catalog reader the purchase flow uses,
//! [`get_variant_with_product`], which works on any connection so it can run inside
//! the purchase transaction.
//!
//! Removal comes in three strengths:
//! - [`delete_product`] deactivates a product that has sales history and hard-deletes one
//!   that has none;
//! - [`purge_product`] always deletes stock, variants and the product, but never orders;
//! - [`purge_variant`] does the same for a single variant.

use crate::{
    entities::{
        DeliveryType, Product, ProductVariant, StockItem, product, product_variant, stock_item,
    },
    errors::{Error, Result},
};
use sea_orm::{
    PaginatorTrait, QueryOrder, Set, SqlErr, TransactionTrait, prelude::*,
};
use tracing::{info, instrument, warn};

/// Input for [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Display title
    pub title: String,
    /// Slug; derived from the title when None
    pub slug: Option<String>,
    /// Delivery type of all future stock
    pub delivery_type: DeliveryType,
    /// Optional description
    pub description: Option<String>,
}

/// Input for [`update_product`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New delivery type; refused once stock exists
    pub delivery_type: Option<DeliveryType>,
}

/// Input for [`create_variant`].
#[derive(Debug, Clone)]
pub struct NewVariant {
    /// Tier title
    pub title: String,
    /// Subscription length in months
    pub months: Option<i32>,
    /// Price in whole currency units
    pub price: i64,
}

/// What [`delete_product`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRemoval {
    /// Product has sales history and was only switched off
    Deactivated,
    /// Product, variants and stock were removed
    Deleted,
}

/// Row counts removed by a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeOutcome {
    /// Stock rows deleted, allocated ones included
    pub stock_removed: u64,
    /// Variants deleted
    pub variants_removed: u64,
}

/// Turns a title into a URL-safe slug: lowercase ASCII alphanumerics joined by `-`.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Whether `slug` only uses `[a-z0-9-]` and is non-empty.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Creates a new, active product.
///
/// # Errors
/// Returns an error if:
/// - The title is empty or whitespace-only (`Validation`)
/// - The slug is not URL-safe (`Validation`)
/// - Another product already uses the slug (`Conflict`)
#[instrument(skip(db))]
pub async fn create_product(db: &DatabaseConnection, input: NewProduct) -> Result<product::Model> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::validation("Product title cannot be empty"));
    }

    let slug = input
        .slug
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&title));
    if !is_valid_slug(&slug) {
        return Err(Error::validation(format!(
            "Slug '{slug}' may only contain lowercase letters, digits and '-'"
        )));
    }

    if get_product_by_slug(db, &slug).await?.is_some() {
        return Err(Error::conflict(format!("Slug '{slug}' is already taken")));
    }

    let model = product::ActiveModel {
        title: Set(title),
        slug: Set(slug.clone()),
        delivery_type: Set(input.delivery_type),
        active: Set(true),
        description: Set(input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(product) => {
            info!(product_id = product.id, slug = %product.slug, "Created product");
            Ok(product)
        }
        // A concurrent create can still win the race past the pre-check.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(Error::conflict(format!("Slug '{slug}' is already taken")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Updates title, description and delivery type of a product.
///
/// # Errors
/// Returns `Conflict` when the delivery type would change while stock rows exist, since
/// their payload columns were filled for the old type.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    update: ProductUpdate,
) -> Result<product::Model> {
    let product = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    let mut active: product::ActiveModel = product.clone().into();

    if let Some(title) = update.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(Error::validation("Product title cannot be empty"));
        }
        active.title = Set(title);
    }

    if let Some(description) = update.description {
        let description = description.trim().to_string();
        active.description = Set((!description.is_empty()).then_some(description));
    }

    if let Some(delivery_type) = update.delivery_type
        && delivery_type != product.delivery_type
    {
        let stock = StockItem::find()
            .filter(stock_item::Column::ProductId.eq(product_id))
            .count(db)
            .await?;
        if stock > 0 {
            return Err(Error::conflict(format!(
                "Cannot change delivery type of '{}': it already has {stock} stock items",
                product.title
            )));
        }
        active.delivery_type = Set(delivery_type);
    }

    active.update(db).await.map_err(Into::into)
}

/// Retrieves a product by its unique ID.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by slug, active or not.
pub async fn get_product_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists products, newest first. Inactive products are included only on request.
pub async fn list_products(
    db: &DatabaseConnection,
    include_inactive: bool,
) -> Result<Vec<product::Model>> {
    let mut query = Product::find();
    if !include_inactive {
        query = query.filter(product::Column::Active.eq(true));
    }
    query
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Switches a product on or off.
pub async fn set_product_active(
    db: &DatabaseConnection,
    product_id: i64,
    active: bool,
) -> Result<product::Model> {
    let product = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    let mut model: product::ActiveModel = product.into();
    model.active = Set(active);
    let product = model.update(db).await?;
    info!(product_id, active, "Product visibility changed");
    Ok(product)
}

/// Removes a product, softly when it has allocated stock or orders.
///
/// Products with sales history are only deactivated so buyers keep a consistent view.
/// Products without any are deleted together with their variants and stock. The history
/// check and the removal share one transaction, so a purchase committing in between
/// cannot have its stock deleted.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<ProductRemoval> {
    let txn = db.begin().await?;

    let product = get_product_by_id(&txn, product_id)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    let allocated = StockItem::find()
        .filter(stock_item::Column::ProductId.eq(product_id))
        .filter(stock_item::Column::Allocated.eq(true))
        .count(&txn)
        .await?;
    let orders = crate::core::orders::count_orders_for_product(&txn, product_id).await?;

    if allocated > 0 || orders > 0 {
        let mut model: product::ActiveModel = product.into();
        model.active = Set(false);
        model.update(&txn).await?;
        txn.commit().await?;
        info!(product_id, allocated, orders, "Product has history, deactivated");
        return Ok(ProductRemoval::Deactivated);
    }

    remove_product_tree(&txn, product_id).await?;
    txn.commit().await?;
    info!(product_id, "Product deleted");
    Ok(ProductRemoval::Deleted)
}

/// Permanently deletes a product with all its stock and variants, keeping orders.
///
/// Orders and order items are snapshots and stay readable afterwards.
#[instrument(skip(db))]
pub async fn purge_product(db: &DatabaseConnection, product_id: i64) -> Result<PurgeOutcome> {
    let txn = db.begin().await?;
    if get_product_by_id(&txn, product_id).await?.is_none() {
        return Err(Error::not_found("Product", product_id));
    }

    let outcome = remove_product_tree(&txn, product_id).await?;
    txn.commit().await?;
    warn!(
        product_id,
        stock_removed = outcome.stock_removed,
        variants_removed = outcome.variants_removed,
        "Product purged"
    );
    Ok(outcome)
}

/// Deletes stock, variants and the product row on the caller's transaction.
async fn remove_product_tree<C>(txn: &C, product_id: i64) -> Result<PurgeOutcome>
where
    C: ConnectionTrait,
{
    let stock_removed = StockItem::delete_many()
        .filter(stock_item::Column::ProductId.eq(product_id))
        .exec(txn)
        .await?
        .rows_affected;
    let variants_removed = ProductVariant::delete_many()
        .filter(product_variant::Column::ProductId.eq(product_id))
        .exec(txn)
        .await?
        .rows_affected;
    Product::delete_by_id(product_id).exec(txn).await?;

    Ok(PurgeOutcome {
        stock_removed,
        variants_removed,
    })
}

/// Adds a pricing tier to a product.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist (`NotFound`)
/// - The title is empty or the price is negative (`Validation`)
pub async fn create_variant(
    db: &DatabaseConnection,
    product_id: i64,
    input: NewVariant,
) -> Result<product_variant::Model> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::validation("Variant title cannot be empty"));
    }
    if input.price < 0 {
        return Err(Error::validation(format!(
            "Price cannot be negative, got {}",
            input.price
        )));
    }
    if let Some(months) = input.months
        && months <= 0
    {
        return Err(Error::validation("Months must be a positive number"));
    }

    if get_product_by_id(db, product_id).await?.is_none() {
        return Err(Error::not_found("Product", product_id));
    }

    let variant = product_variant::ActiveModel {
        product_id: Set(product_id),
        title: Set(title),
        months: Set(input.months),
        price: Set(input.price),
        active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        variant_id = variant.id,
        product_id,
        price = variant.price,
        "Created variant"
    );
    Ok(variant)
}

/// Lists a product's variants in creation order.
pub async fn list_variants(
    db: &DatabaseConnection,
    product_id: i64,
    include_inactive: bool,
) -> Result<Vec<product_variant::Model>> {
    let mut query =
        ProductVariant::find().filter(product_variant::Column::ProductId.eq(product_id));
    if !include_inactive {
        query = query.filter(product_variant::Column::Active.eq(true));
    }
    query
        .order_by_asc(product_variant::Column::CreatedAt)
        .order_by_asc(product_variant::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a variant by its unique ID.
pub async fn get_variant_by_id<C>(
    db: &C,
    variant_id: i64,
) -> Result<Option<product_variant::Model>>
where
    C: ConnectionTrait,
{
    ProductVariant::find_by_id(variant_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a variant together with its parent product.
///
/// Returns None when either is missing.
pub async fn get_variant_with_product<C>(
    db: &C,
    variant_id: i64,
) -> Result<Option<(product_variant::Model, product::Model)>>
where
    C: ConnectionTrait,
{
    let found = ProductVariant::find_by_id(variant_id)
        .find_also_related(Product)
        .one(db)
        .await?;
    Ok(found.and_then(|(variant, product)| product.map(|product| (variant, product))))
}

/// Lists every variant with its product, grouped by product.
///
/// With `buyable_only`, variants or products that are switched off are left out.
pub async fn list_offerings(
    db: &DatabaseConnection,
    buyable_only: bool,
) -> Result<Vec<(product_variant::Model, product::Model)>> {
    let rows = ProductVariant::find()
        .find_also_related(Product)
        .order_by_asc(product_variant::Column::ProductId)
        .order_by_asc(product_variant::Column::Price)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(variant, product)| product.map(|product| (variant, product)))
        .filter(|(variant, product)| !buyable_only || (variant.active && product.active))
        .collect())
}

/// Switches a variant on or off.
pub async fn set_variant_active(
    db: &DatabaseConnection,
    variant_id: i64,
    active: bool,
) -> Result<product_variant::Model> {
    let variant = get_variant_by_id(db, variant_id)
        .await?
        .ok_or_else(|| Error::not_found("Variant", variant_id))?;

    let mut model: product_variant::ActiveModel = variant.into();
    model.active = Set(active);
    model.update(db).await.map_err(Into::into)
}

/// Permanently deletes a variant and every stock row tagged with it.
///
/// # Returns
/// The number of stock rows removed.
pub async fn purge_variant(db: &DatabaseConnection, variant_id: i64) -> Result<u64> {
    if get_variant_by_id(db, variant_id).await?.is_none() {
        return Err(Error::not_found("Variant", variant_id));
    }

    let txn = db.begin().await?;
    let stock_removed = StockItem::delete_many()
        .filter(stock_item::Column::VariantId.eq(variant_id))
        .exec(&txn)
        .await?
        .rows_affected;
    ProductVariant::delete_by_id(variant_id).exec(&txn).await?;
    txn.commit().await?;

    warn!(variant_id, stock_removed, "Variant purged");
    Ok(stock_removed)
}

/// Display title used in order snapshots and ledger reasons: "Product - Variant".
#[must_use]
pub fn offering_title(product: &product::Model, variant: &product_variant::Model) -> String {
    if variant.title.is_empty() {
        product.title.clone()
    } else {
        format!("{} - {}", product.title, variant.title)
    }
}
