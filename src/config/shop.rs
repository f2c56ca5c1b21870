//! Shop configuration loading from config.toml
//!
//! `config.toml` carries the storefront name, the display currency and an optional
//! catalog used to seed products and variants on start. Seeding is keyed by slug, so
//! restarting the bot never duplicates products.

use crate::core::catalog::{self, NewProduct, NewVariant};
use crate::entities::DeliveryType;
use crate::errors::{Error, Result};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Storefront settings
    #[serde(default)]
    pub shop: ShopSettings,
    /// Products to seed when missing
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// Storefront display settings
#[derive(Debug, Deserialize, Clone)]
pub struct ShopSettings {
    /// Name shown in replies and notification mails
    #[serde(default = "default_shop_name")]
    pub name: String,
    /// Currency label appended to amounts
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Deliver top-up notifications as Discord DMs; when false they are only logged
    #[serde(default = "default_dm_notifications")]
    pub dm_notifications: bool,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            name: default_shop_name(),
            currency: default_currency(),
            dm_notifications: default_dm_notifications(),
        }
    }
}

const fn default_dm_notifications() -> bool {
    true
}

fn default_shop_name() -> String {
    "Premium City".to_string()
}

fn default_currency() -> String {
    "MMK".to_string()
}

/// Seed entry for a single product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Product title
    pub title: String,
    /// Slug; derived from the title when omitted
    pub slug: Option<String>,
    /// Delivery type (`CODE`, `ACCOUNT` or `TEXT`)
    pub delivery_type: DeliveryType,
    /// Optional description
    pub description: Option<String>,
    /// Pricing tiers
    #[serde(default)]
    pub variants: Vec<VariantSeed>,
}

/// Seed entry for a single variant
#[derive(Debug, Deserialize, Clone)]
pub struct VariantSeed {
    /// Tier title
    pub title: String,
    /// Subscription length in months
    pub months: Option<i32>,
    /// Price in whole currency units
    pub price: i64,
}

/// Loads shop configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error: the shop runs with defaults and an empty seed.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        info!("No config file at {}, using defaults", path);
        Ok(AppConfig::default())
    }
}

/// Creates seeded products (and their variants) whose slug is not in the catalog yet.
///
/// Returns the number of products created.
#[instrument(skip(db, seeds))]
pub async fn seed_catalog(db: &DatabaseConnection, seeds: &[ProductSeed]) -> Result<usize> {
    let mut created = 0;
    for seed in seeds {
        let slug = seed
            .slug
            .clone()
            .unwrap_or_else(|| catalog::slugify(&seed.title));
        if catalog::get_product_by_slug(db, &slug).await?.is_some() {
            continue;
        }

        let product = catalog::create_product(
            db,
            NewProduct {
                title: seed.title.clone(),
                slug: Some(slug),
                delivery_type: seed.delivery_type,
                description: seed.description.clone(),
            },
        )
        .await?;

        for variant in &seed.variants {
            catalog::create_variant(
                db,
                product.id,
                NewVariant {
                    title: variant.title.clone(),
                    months: variant.months,
                    price: variant.price,
                },
            )
            .await?;
        }
        created += 1;
    }

    if created > 0 {
        info!("Seeded {} products from config", created);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const SAMPLE: &str = r#"
        [shop]
        name = "Premium City"
        currency = "MMK"

        [[products]]
        title = "Netflix Premium"
        delivery_type = "ACCOUNT"

        [[products.variants]]
        title = "1 month"
        months = 1
        price = 12000

        [[products.variants]]
        title = "6 months"
        months = 6
        price = 65000

        [[products]]
        title = "Steam Wallet 10$"
        slug = "steam-10"
        delivery_type = "CODE"
    "#;

    #[test]
    fn test_parse_shop_config() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.shop.currency, "MMK");
        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[0].delivery_type, DeliveryType::Account);
        assert_eq!(config.products[0].variants.len(), 2);
        assert_eq!(config.products[0].variants[1].price, 65000);
        assert_eq!(config.products[1].slug.as_deref(), Some("steam-10"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.shop.name, "Premium City");
        assert!(config.shop.dm_notifications);
        assert!(config.products.is_empty());
    }

    #[tokio::test]
    async fn test_seed_catalog_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();

        assert_eq!(seed_catalog(&db, &config.products).await?, 2);
        assert_eq!(seed_catalog(&db, &config.products).await?, 0);

        let netflix = catalog::get_product_by_slug(&db, "netflix-premium")
            .await?
            .unwrap();
        let variants = catalog::list_variants(&db, netflix.id, true).await?;
        assert_eq!(variants.len(), 2);
        Ok(())
    }
}
