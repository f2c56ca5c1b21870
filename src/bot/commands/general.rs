//! General Discord commands - ping, help and registration.
//! Ping and help need no database access; register creates the caller's
//! storefront account.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::Context,
        core::users,
        entities::Role,
        errors::Result,
    };

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't require any database operations.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let shop_name = &ctx.data().config.shop.name;
        let help_text = format!(
            "**{shop_name} Help**\n\
        Here is a summary of all available commands.\n\n\
        **Shopping**\n\
        • `/register <email>` - Create your account and wallet.\n\
        • `/shop` - List products with prices and stock.\n\
        • `/product <product>` - Show a product's variants.\n\
        • `/buy <variant> [quantity]` - Buy with your wallet balance.\n\
        • `/orders [order]` - Show your purchases and delivered items.\n\n\
        **Wallet**\n\
        • `/wallet` - Show your balance and recent activity.\n\
        • `/topup <amount> <method> [reference]` - Ask an admin to add funds.\n\n\
        **Admin**\n\
        • `/catalog <subcommand>` - Manage products and variants.\n\
        • `/stock <subcommand>` - Add, bulk load, clear and count stock.\n\
        • `/topups <subcommand>` - Review top-up requests.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message."
        );

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates your storefront account with an empty wallet.
    #[poise::command(slash_command)]
    pub async fn register(
        ctx: Context<'_>,
        #[description = "Email used for receipts and notifications"] email: String,
    ) -> Result<()> {
        let discord_id = ctx.author().id.to_string();
        let role = if ctx.data().admin_ids.contains(&discord_id) {
            Role::Admin
        } else {
            Role::User
        };

        let user = users::register_user(&ctx.data().database, &discord_id, &email, role).await?;

        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "✅ Registered as **{}**. Your wallet is empty, use `/topup` to add funds.",
                    user.email
                ))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
