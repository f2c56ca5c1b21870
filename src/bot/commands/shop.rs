//! Shop Discord commands - `shop`, `product` and `buy`.
//!
//! These commands read the storefront and run purchases through the core purchase
//! flow. Purchased items are shown in an ephemeral reply, since they are secrets.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context,
            commands::{checks, render},
            handlers::autocomplete,
        },
        core::{orders, purchase, report},
        errors::Result,
    };
    use poise::serenity_prelude as serenity;

    /// Lists products with their starting price and stock.
    #[poise::command(slash_command)]
    pub async fn shop(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let listing = report::storefront(&data.database).await?;

        if listing.is_empty() {
            ctx.say("No products yet. Check back soon!").await?;
            return Ok(());
        }

        let fields = listing.iter().take(25).map(|entry| {
            let price = entry.min_price.map_or_else(
                || "No active variants".to_string(),
                |p| format!("From **{}**", data.money(p)),
            );
            let stock = if entry.total_unallocated > 0 {
                format!("In stock ({})", entry.total_unallocated)
            } else {
                "Out of stock".to_string()
            };
            (
                format!("{} · {}", entry.product.title, entry.product.delivery_type),
                format!("{price} · {stock}\n`/product {}`", entry.product.slug),
                false,
            )
        });

        let embed = serenity::CreateEmbed::default()
            .title(format!("🛒 {}", data.config.shop.name))
            .color(0x0058_65F2) // Discord purple
            .fields(fields);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows a product's variants, cheapest first.
    #[poise::command(slash_command)]
    pub async fn product(
        ctx: Context<'_>,
        #[description = "Product to show"]
        #[autocomplete = "autocomplete::autocomplete_product_slug"]
        product: String,
    ) -> Result<()> {
        let data = ctx.data();
        let detail = report::product_detail(&data.database, &product).await?;

        let mut embed = serenity::CreateEmbed::default()
            .title(&detail.product.title)
            .color(0x0058_65F2)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Delivered as {} · buy with /buy",
                detail.product.delivery_type
            )));
        if let Some(description) = &detail.product.description {
            embed = embed.description(description);
        }

        if detail.variants.is_empty() {
            embed = embed.field("Variants", "No active variants", false);
        }
        for (variant, available) in detail.variants.iter().take(25) {
            let months = variant
                .months
                .map(|m| format!(" · {m} month{}", if m == 1 { "" } else { "s" }))
                .unwrap_or_default();
            let stock = if *available > 0 {
                format!("{available} in stock")
            } else {
                "Out of stock".to_string()
            };
            embed = embed.field(
                format!("{} (#{})", variant.title, variant.id),
                format!("**{}**{months} · {stock}", data.money(variant.price)),
                true,
            );
        }

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Buys a variant with your wallet balance.
    #[poise::command(slash_command)]
    pub async fn buy(
        ctx: Context<'_>,
        #[description = "What to buy"]
        #[autocomplete = "autocomplete::autocomplete_variant"]
        variant: i64,
        #[description = "How many (defaults to 1)"] quantity: Option<i64>,
    ) -> Result<()> {
        let Some(user) = checks::current_user(ctx).await? else {
            return Ok(());
        };
        ctx.defer_ephemeral().await?;

        let data = ctx.data();
        let receipt = purchase::purchase(&data.database, user.id, variant, quantity).await?;
        let order = orders::get_order_for_user(&data.database, user.id, receipt.order_id).await?;

        let mut content = format!(
            "✅ **Order #{}** · {} × {}\nPaid {} · Wallet balance: **{}**\n\n",
            order.order.id,
            receipt.quantity,
            order.order.product_title,
            data.money(receipt.total),
            data.money(receipt.new_wallet_balance),
        );
        let pages = render::item_pages(
            order.order.delivery_type,
            &order.items,
            render::MAX_MESSAGE_LEN - render::PAGE_RESERVE,
        );
        if let Some(first) = pages.first() {
            content.push_str(&first.text);
            let omitted = order.items.len() - first.count;
            if omitted > 0 {
                content.push_str(&format!(
                    "… and {omitted} more. Continue with `/orders order:{} page:2`.",
                    order.order.id
                ));
            }
        }

        ctx.send(
            poise::CreateReply::default()
                .content(content)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
