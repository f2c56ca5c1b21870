//! Catalog Discord commands - `catalog` and its product/variant subcommands.
//!
//! Admin only. Products are addressed by slug and variants by id, both with
//! autocomplete that includes switched-off entries.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, commands::checks, handlers::autocomplete},
        core::catalog::{self, NewProduct, NewVariant, ProductRemoval, ProductUpdate},
        entities::{DeliveryType, product},
        errors::{Error, Result},
    };

    /// Delivery type as offered in the slash command picker.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum DeliveryChoice {
        #[name = "Code (license keys, gift cards)"]
        Code,
        #[name = "Account (email + password)"]
        Account,
        #[name = "Text (free-form)"]
        Text,
    }

    impl From<DeliveryChoice> for DeliveryType {
        fn from(choice: DeliveryChoice) -> Self {
            match choice {
                DeliveryChoice::Code => Self::Code,
                DeliveryChoice::Account => Self::Account,
                DeliveryChoice::Text => Self::Text,
            }
        }
    }

    async fn product_by_slug(ctx: Context<'_>, slug: &str) -> Result<product::Model> {
        catalog::get_product_by_slug(&ctx.data().database, slug)
            .await?
            .ok_or_else(|| Error::not_found("Product", slug))
    }

    async fn reply(ctx: Context<'_>, content: impl Into<String>) -> Result<()> {
        ctx.send(
            poise::CreateReply::default()
                .content(content)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Parent command for managing products and their variants.
    #[poise::command(
        slash_command,
        check = "checks::is_admin",
        subcommands(
            "product_create",
            "product_edit",
            "product_list",
            "product_activate",
            "product_deactivate",
            "product_delete",
            "product_purge",
            "variant_add",
            "variant_toggle",
            "variant_purge"
        )
    )]
    pub async fn catalog(ctx: Context<'_>) -> Result<()> {
        let help_text = "Catalog management. Available subcommands:\n\
            `/catalog create` - Create a product\n\
            `/catalog edit` - Change a product's title, description or delivery type\n\
            `/catalog list` - List all products with their variants\n\
            `/catalog activate` / `/catalog deactivate` - Show or hide a product\n\
            `/catalog delete` - Delete a product (deactivates it if it has sales)\n\
            `/catalog purge` - Remove a product with all its stock\n\
            `/catalog variant_add` - Add a price tier\n\
            `/catalog variant_toggle` - Show or hide a price tier\n\
            `/catalog variant_purge` - Remove a price tier with its stock";

        reply(ctx, help_text).await
    }

    /// Creates a new product.
    #[poise::command(slash_command, rename = "create", check = "checks::is_admin")]
    pub async fn product_create(
        ctx: Context<'_>,
        #[description = "Product title (e.g. 'Netflix Premium')"] title: String,
        #[description = "How stock is delivered to buyers"] delivery: DeliveryChoice,
        #[description = "URL-safe slug; derived from the title if omitted"] slug: Option<String>,
        #[description = "Shown on the product page"] description: Option<String>,
    ) -> Result<()> {
        let product = catalog::create_product(
            &ctx.data().database,
            NewProduct {
                title,
                slug,
                delivery_type: delivery.into(),
                description,
            },
        )
        .await?;

        reply(
            ctx,
            format!(
                "✅ Created **{}** (`{}`, {}). Add a price with `/catalog variant_add`.",
                product.title, product.slug, product.delivery_type
            ),
        )
        .await
    }

    /// Changes a product's title, description or delivery type.
    #[poise::command(slash_command, rename = "edit", check = "checks::is_admin")]
    pub async fn product_edit(
        ctx: Context<'_>,
        #[description = "Product to edit"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: String,
        #[description = "New title"] title: Option<String>,
        #[description = "New description"] description: Option<String>,
        #[description = "New delivery type (only while the product has no stock)"]
        delivery: Option<DeliveryChoice>,
    ) -> Result<()> {
        if title.is_none() && description.is_none() && delivery.is_none() {
            return reply(ctx, "Nothing to change.").await;
        }

        let found = product_by_slug(ctx, &product).await?;
        let updated = catalog::update_product(
            &ctx.data().database,
            found.id,
            ProductUpdate {
                title,
                description,
                delivery_type: delivery.map(Into::into),
            },
        )
        .await?;

        reply(
            ctx,
            format!("✅ Updated **{}** (`{}`).", updated.title, updated.slug),
        )
        .await
    }

    /// Lists every product with its variants.
    #[poise::command(slash_command, rename = "list", check = "checks::is_admin")]
    pub async fn product_list(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let products = catalog::list_products(&data.database, true).await?;
        if products.is_empty() {
            return reply(ctx, "No products yet. Create one with `/catalog create`.").await;
        }

        let mut content = String::from("**Catalog**\n");
        for product in &products {
            let marker = if product.active { "🟢" } else { "⚪" };
            content.push_str(&format!(
                "{marker} **{}** `{}` · {}\n",
                product.title, product.slug, product.delivery_type
            ));
            for variant in catalog::list_variants(&data.database, product.id, true).await? {
                let marker = if variant.active { "" } else { " [off]" };
                content.push_str(&format!(
                    "  └ #{} {} · {}{marker}\n",
                    variant.id,
                    variant.title,
                    data.money(variant.price)
                ));
            }
        }
        if content.chars().count() > 1900 {
            content = content.chars().take(1900).collect::<String>() + "\n…";
        }

        reply(ctx, content).await
    }

    /// Shows a product in the storefront again.
    #[poise::command(slash_command, rename = "activate", check = "checks::is_admin")]
    pub async fn product_activate(
        ctx: Context<'_>,
        #[description = "Product to activate"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: String,
    ) -> Result<()> {
        let found = product_by_slug(ctx, &product).await?;
        let updated = catalog::set_product_active(&ctx.data().database, found.id, true).await?;
        reply(ctx, format!("🟢 **{}** is now on sale.", updated.title)).await
    }

    /// Hides a product from the storefront and stops sales.
    #[poise::command(slash_command, rename = "deactivate", check = "checks::is_admin")]
    pub async fn product_deactivate(
        ctx: Context<'_>,
        #[description = "Product to deactivate"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: String,
    ) -> Result<()> {
        let found = product_by_slug(ctx, &product).await?;
        let updated = catalog::set_product_active(&ctx.data().database, found.id, false).await?;
        reply(ctx, format!("⚪ **{}** is hidden.", updated.title)).await
    }

    /// Deletes a product, or deactivates it when it has been sold before.
    #[poise::command(slash_command, rename = "delete", check = "checks::is_admin")]
    pub async fn product_delete(
        ctx: Context<'_>,
        #[description = "Product to delete"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: String,
    ) -> Result<()> {
        let found = product_by_slug(ctx, &product).await?;
        let message = match catalog::delete_product(&ctx.data().database, found.id).await? {
            ProductRemoval::Deleted => format!("🗑️ Deleted **{}**.", found.title),
            ProductRemoval::Deactivated => format!(
                "⚪ **{}** has orders, so it was deactivated instead. Use `/catalog purge` to remove it.",
                found.title
            ),
        };
        reply(ctx, message).await
    }

    /// Removes a product with all its variants and stock. Orders are kept.
    #[poise::command(slash_command, rename = "purge", check = "checks::is_admin")]
    pub async fn product_purge(
        ctx: Context<'_>,
        #[description = "Product to purge"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: String,
        #[description = "Set to true to confirm"] confirm: bool,
    ) -> Result<()> {
        if !confirm {
            return reply(ctx, "Purge cancelled. Pass `confirm: True` to go ahead.").await;
        }

        let found = product_by_slug(ctx, &product).await?;
        let outcome = catalog::purge_product(&ctx.data().database, found.id).await?;
        reply(
            ctx,
            format!(
                "🗑️ Purged **{}**: {} variant(s) and {} stock row(s) removed. Order history is kept.",
                found.title, outcome.variants_removed, outcome.stock_removed
            ),
        )
        .await
    }

    /// Adds a price tier to a product.
    #[poise::command(slash_command, rename = "variant_add", check = "checks::is_admin")]
    pub async fn variant_add(
        ctx: Context<'_>,
        #[description = "Product to add the tier to"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: String,
        #[description = "Tier title (e.g. '1 Month')"] title: String,
        #[description = "Price in whole currency units"] price: i64,
        #[description = "Subscription length in months"] months: Option<i32>,
    ) -> Result<()> {
        let data = ctx.data();
        let found = product_by_slug(ctx, &product).await?;
        let variant = catalog::create_variant(
            &data.database,
            found.id,
            NewVariant {
                title,
                months,
                price,
            },
        )
        .await?;

        reply(
            ctx,
            format!(
                "✅ Added **{}** (#{}) at {}. Load stock with `/stock add` or `/stock bulk`.",
                catalog::offering_title(&found, &variant),
                variant.id,
                data.money(variant.price)
            ),
        )
        .await
    }

    /// Switches a price tier on or off.
    #[poise::command(slash_command, rename = "variant_toggle", check = "checks::is_admin")]
    pub async fn variant_toggle(
        ctx: Context<'_>,
        #[description = "Variant to switch"]
        #[autocomplete = "autocomplete::admin_autocomplete_variant"]
        variant: i64,
        #[description = "On sale?"] active: bool,
    ) -> Result<()> {
        let updated = catalog::set_variant_active(&ctx.data().database, variant, active).await?;
        let state = if updated.active { "on sale" } else { "hidden" };
        reply(ctx, format!("Variant #{} **{}** is now {state}.", updated.id, updated.title)).await
    }

    /// Removes a price tier with all its stock. Orders are kept.
    #[poise::command(slash_command, rename = "variant_purge", check = "checks::is_admin")]
    pub async fn variant_purge(
        ctx: Context<'_>,
        #[description = "Variant to purge"]
        #[autocomplete = "autocomplete::admin_autocomplete_variant"]
        variant: i64,
        #[description = "Set to true to confirm"] confirm: bool,
    ) -> Result<()> {
        if !confirm {
            return reply(ctx, "Purge cancelled. Pass `confirm: True` to go ahead.").await;
        }

        let removed = catalog::purge_variant(&ctx.data().database, variant).await?;
        reply(
            ctx,
            format!("🗑️ Purged variant #{variant} and {removed} stock row(s)."),
        )
        .await
    }
}

// Re-export all commands
pub use inner::*;
