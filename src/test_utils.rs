//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        catalog::{self, NewProduct, NewVariant},
        stock::{self, NewStockItem},
        users, wallet,
    },
    entities::{DeliveryPayload, DeliveryType, Role, product, product_variant, user},
    errors::Result,
};
use sea_orm::{ConnectOptions, DatabaseConnection};

/// Creates an in-memory `SQLite` database with all tables initialized.
///
/// The pool is capped at one connection: every extra connection to `sqlite::memory:`
/// would open a separate, empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database inside `dir` with all tables initialized.
///
/// Unlike [`setup_test_db`], the pool holds several connections, so transactions
/// started from different tasks really overlap.
pub async fn setup_file_test_db(dir: &std::path::Path) -> Result<DatabaseConnection> {
    let url = format!("sqlite://{}?mode=rwc", dir.join("shop.sqlite").display());
    let db = crate::config::database::create_connection(&url).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a test user and funds their wallet.
///
/// # Defaults
/// * `email`: `<discord_id>@test.local`
/// * `role`: USER
///
/// A positive `balance` is credited through the ledger so balance and ledger agree.
pub async fn create_test_user(
    db: &DatabaseConnection,
    discord_id: &str,
    balance: i64,
) -> Result<user::Model> {
    let user =
        users::register_user(db, discord_id, &format!("{discord_id}@test.local"), Role::User)
            .await?;
    if balance > 0 {
        wallet::credit(db, user.id, balance, "Test funding").await?;
        return users::get_user_by_id(db, user.id)
            .await
            .map(|found| found.unwrap_or(user));
    }
    Ok(user)
}

/// Creates an active test product with a slug derived from the title.
pub async fn create_test_product(
    db: &DatabaseConnection,
    title: &str,
    delivery_type: DeliveryType,
) -> Result<product::Model> {
    catalog::create_product(
        db,
        NewProduct {
            title: title.to_string(),
            slug: None,
            delivery_type,
            description: None,
        },
    )
    .await
}

/// Creates an active test variant without a month count.
pub async fn create_test_variant(
    db: &DatabaseConnection,
    product_id: i64,
    title: &str,
    price: i64,
) -> Result<product_variant::Model> {
    catalog::create_variant(
        db,
        product_id,
        NewVariant {
            title: title.to_string(),
            months: None,
            price,
        },
    )
    .await
}

/// Inserts `count` unallocated stock rows with unique payloads for the product's type.
pub async fn add_stock(
    db: &DatabaseConnection,
    product: &product::Model,
    variant_id: Option<i64>,
    count: usize,
) -> Result<u64> {
    let tag = variant_id.map_or_else(|| "p".to_string(), |id| format!("v{id}"));
    let rows = (0..count)
        .map(|i| {
            let key = format!("{}-{tag}-{i}", product.id);
            let payload = match product.delivery_type {
                DeliveryType::Code => DeliveryPayload::Code {
                    code: format!("CODE-{key}"),
                },
                DeliveryType::Account => DeliveryPayload::Account {
                    email: format!("user-{key}@test.local"),
                    password: format!("pw-{key}"),
                },
                DeliveryType::Text => DeliveryPayload::Text {
                    text: format!("Text {key}"),
                },
            };
            NewStockItem {
                product_id: product.id,
                variant_id,
                payload,
                note: (i % 2 == 1).then(|| format!("note {i}")),
            }
        })
        .collect();
    stock::bulk_insert(db, rows).await
}

/// Sets up a CODE product "Test Codes" with one "Standard" variant and `stock` rows.
/// Returns (product, variant) for purchase-related tests.
pub async fn setup_code_offering(
    db: &DatabaseConnection,
    price: i64,
    stock: usize,
) -> Result<(product::Model, product_variant::Model)> {
    let product = create_test_product(db, "Test Codes", DeliveryType::Code).await?;
    let variant = create_test_variant(db, product.id, "Standard", price).await?;
    add_stock(db, &product, Some(variant.id), stock).await?;
    Ok((product, variant))
}
