//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the storefront, including all slash
//! commands, autocomplete handlers, the DM notification sink and bot context management.
//! Commands return core errors with `?`; [`on_error`] turns domain errors into a reply
//! the caller can act on and logs everything else.

/// Discord command implementations (shop, wallet, orders, admin, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;
/// Notification sink delivering messages as Discord DMs
pub mod notify;

use crate::{
    config::shop::AppConfig,
    core::notify::{LogSink, NotificationSink},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::{collections::HashSet, sync::Arc};
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
/// This structure holds the database connection and any other global state
/// that commands need to access.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Shop settings from config.toml
    pub config: Arc<AppConfig>,
    /// Discord ids allowed to run admin commands
    pub admin_ids: HashSet<String>,
    /// Where top-up notifications go
    pub notifier: Arc<dyn NotificationSink>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    /// This is typically called during bot initialization to set up the
    /// shared context for all commands.
    #[must_use]
    pub fn new(
        database: DatabaseConnection,
        config: Arc<AppConfig>,
        admin_ids: HashSet<String>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            database,
            config,
            admin_ids,
            notifier,
        }
    }

    /// Formats an amount in the shop currency.
    #[must_use]
    pub fn money(&self, amount: i64) -> String {
        crate::core::report::format_money(amount, &self.config.shop.currency)
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_domain() {
                warn!(command = %ctx.command().name, %error, "Command rejected");
            } else {
                error!(command = %ctx.command().name, ?error, "Command failed");
            }
            let reply = poise::CreateReply::default()
                .content(error.user_message(|amount| ctx.data().money(amount)))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::CommandCheckFailed { ctx, error, .. } => {
            if let Some(error) = error {
                error!(command = %ctx.command().name, ?error, "Permission check failed");
            }
            let reply = poise::CreateReply::default()
                .content("⛔ This command is for shop administrators only.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Starts the Discord client and blocks until it stops.
#[instrument(skip(token, config, database))]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    database: DatabaseConnection,
) -> Result<()> {
    let admin_ids = crate::config::users::get_admin_ids();
    if admin_ids.is_empty() {
        warn!("ADMIN_USER_IDS is empty, admin commands are unusable");
    }

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered {} commands globally", framework.options().commands.len());

                let notifier: Arc<dyn NotificationSink> = if config.shop.dm_notifications {
                    Arc::new(notify::DiscordDmSink::new(Arc::clone(&ctx.http)))
                } else {
                    Arc::new(LogSink::new())
                };
                Ok(BotData::new(database, config, admin_ids, notifier))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}
