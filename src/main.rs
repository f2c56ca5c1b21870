#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vault_shop::{
    bot,
    config::{database, shop},
    errors::{Error, Result},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load shop settings and the catalog seed
    let app_config = shop::load_default_config()
        .inspect_err(|e| error!("Critical error loading configuration: {}", e))?;
    info!(shop = %app_config.shop.name, "Configuration loaded.");

    // 4. Connect and create the schema
    let database_url = database::get_database_url();
    database::ensure_database_dir(&database_url)?;
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed catalog entries from config.toml that don't exist yet
    shop::seed_catalog(&db, &app_config.products)
        .await
        .inspect(|created| info!(created, "Catalog seed applied."))
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use, not stored in AppConfig
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, Arc::new(app_config), db).await
}
