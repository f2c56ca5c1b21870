//! Inventory Discord commands - `stock` and its subcommands.
//!
//! Admin only. Single items are typed in directly; bulk loads take either a CSV
//! attachment or pasted rows, which go through the row parser and the loader.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, commands::checks, handlers::autocomplete},
        core::{
            catalog,
            loader::{self, LoadSummary},
            report, rows,
            stock::{self, StockScope},
        },
        entities::{DeliveryPayload, DeliveryType, product, product_variant},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Largest CSV attachment accepted, in bytes.
    const MAX_UPLOAD_BYTES: u32 = 2 * 1024 * 1024;

    async fn variant_with_product(
        ctx: Context<'_>,
        variant_id: i64,
    ) -> Result<(product_variant::Model, product::Model)> {
        catalog::get_variant_with_product(&ctx.data().database, variant_id)
            .await?
            .ok_or_else(|| Error::not_found("Variant", variant_id))
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

    /// Reads rows from an attachment, or from pasted text when no file is given.
    async fn collect_rows(
        file: Option<serenity::Attachment>,
        text: Option<String>,
    ) -> Result<Vec<Vec<String>>> {
        let parsed = match (file, text) {
            (Some(file), _) => {
                if file.size > MAX_UPLOAD_BYTES {
                    return Err(Error::validation(format!(
                        "'{}' is too large ({} bytes, limit {MAX_UPLOAD_BYTES})",
                        file.filename, file.size
                    )));
                }
                let bytes = file.download().await?;
                rows::parse_csv(&String::from_utf8_lossy(&bytes))
            }
            (None, Some(text)) => rows::parse_pasted(&text),
            (None, None) => {
                return Err(Error::validation("Provide a CSV file or pasted text."));
            }
        };

        if parsed.is_empty() {
            return Err(Error::validation("No data rows found"));
        }
        Ok(parsed)
    }

    fn summary_message(target: &str, summary: &LoadSummary) -> String {
        let mut message = format!(
            "📥 Loaded **{}** item(s) into {target}. {} row(s) read, {} skipped.",
            summary.inserted, summary.input_rows, summary.skipped
        );
        if summary.header_detected {
            message.push_str("\nFirst row was used as a header.");
        }
        message
    }

    fn expected_columns(delivery_type: DeliveryType) -> &'static str {
        match delivery_type {
            DeliveryType::Code => "code, note",
            DeliveryType::Account => "email, password, note",
            DeliveryType::Text => "text, note",
        }
    }

    /// Help shown by the bare `/stock` command.
    pub const STOCK_HELP: &str = "Inventory management. Available subcommands:\n\
        `/stock add` - Add one item to a variant\n\
        `/stock bulk` - Load many items into a variant from a CSV file or pasted rows\n\
        `/stock bulk_product` - Load untagged product-level items (not sold by /buy)\n\
        `/stock clear` - Delete unsold items\n\
        `/stock summary` - Show counts and the newest unsold items";

    /// Parent command for managing inventory.
    #[poise::command(
        slash_command,
        check = "checks::is_admin",
        subcommands(
            "stock_add",
            "stock_bulk",
            "stock_bulk_product",
            "stock_clear",
            "stock_summary"
        )
    )]
    pub async fn stock(ctx: Context<'_>) -> Result<()> {
        reply(ctx, STOCK_HELP).await
    }

    /// Adds a single item to a variant.
    ///
    /// `value` is the code or text; for account products it is the email and
    /// `password` is required.
    #[poise::command(slash_command, rename = "add", check = "checks::is_admin")]
    pub async fn stock_add(
        ctx: Context<'_>,
        #[description = "Variant to stock"]
        #[autocomplete = "autocomplete::admin_autocomplete_variant"]
        variant: i64,
        #[description = "Code, text, or account email"] value: String,
        #[description = "Account password (account products only)"] password: Option<String>,
        #[description = "Note delivered with the item"] note: Option<String>,
    ) -> Result<()> {
        let (variant, product) = variant_with_product(ctx, variant).await?;

        let payload = match product.delivery_type {
            DeliveryType::Code => DeliveryPayload::Code { code: value },
            DeliveryType::Text => DeliveryPayload::Text { text: value },
            DeliveryType::Account => {
                let Some(password) = password else {
                    return Err(Error::validation(format!(
                        "'{}' delivers accounts, so a password is required",
                        product.title
                    )));
                };
                DeliveryPayload::Account {
                    email: value,
                    password,
                }
            }
        };

        let item = stock::create_stock_item(
            &ctx.data().database,
            product.id,
            Some(variant.id),
            payload,
            note,
        )
        .await?;
        let available =
            stock::count_unallocated(&ctx.data().database, StockScope::Variant(variant.id)).await?;

        reply(
            ctx,
            format!(
                "✅ Added item #{} to **{}**. {available} unsold.",
                item.id,
                catalog::offering_title(&product, &variant)
            ),
        )
        .await
    }

    /// Loads many items into a variant.
    #[poise::command(slash_command, rename = "bulk", check = "checks::is_admin")]
    pub async fn stock_bulk(
        ctx: Context<'_>,
        #[description = "Variant to stock"]
        #[autocomplete = "autocomplete::admin_autocomplete_variant"]
        variant: i64,
        #[description = "CSV file, header row optional"] file: Option<serenity::Attachment>,
        #[description = "Pasted rows, separated by , | ; or tabs"] text: Option<String>,
    ) -> Result<()> {
        let (variant, product) = variant_with_product(ctx, variant).await?;
        ctx.defer_ephemeral().await?;

        let parsed = collect_rows(file, text).await?;
        let summary = loader::load_rows(&ctx.data().database, variant.id, &parsed).await?;

        let mut message =
            summary_message(&catalog::offering_title(&product, &variant), &summary);
        if summary.skipped > 0 {
            message.push_str(&format!(
                "\nExpected columns: `{}`.",
                expected_columns(product.delivery_type)
            ));
        }
        reply(ctx, message).await
    }

    /// Loads untagged product-level items. `/buy` only sells variant-tagged stock.
    #[poise::command(slash_command, rename = "bulk_product", check = "checks::is_admin")]
    pub async fn stock_bulk_product(
        ctx: Context<'_>,
        #[description = "Product to stock"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: String,
        #[description = "CSV file, header row optional"] file: Option<serenity::Attachment>,
        #[description = "Pasted rows, separated by , | ; or tabs"] text: Option<String>,
    ) -> Result<()> {
        let product = product_by_slug(ctx, &product).await?;
        ctx.defer_ephemeral().await?;

        let parsed = collect_rows(file, text).await?;
        let summary = loader::load_product_rows(&ctx.data().database, product.id, &parsed).await?;

        reply(ctx, summary_message(&format!("**{}**", product.title), &summary)).await
    }

    /// Deletes unsold items of a variant, or of a whole product.
    #[poise::command(slash_command, rename = "clear", check = "checks::is_admin")]
    pub async fn stock_clear(
        ctx: Context<'_>,
        #[description = "Variant to clear"]
        #[autocomplete = "autocomplete::admin_autocomplete_variant"]
        variant: Option<i64>,
        #[description = "Product to clear, all variants included"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: Option<String>,
    ) -> Result<()> {
        let (scope, label) = match (variant, product) {
            (Some(variant_id), None) => {
                let (variant, product) = variant_with_product(ctx, variant_id).await?;
                (
                    StockScope::Variant(variant.id),
                    catalog::offering_title(&product, &variant),
                )
            }
            (None, Some(slug)) => {
                let product = product_by_slug(ctx, &slug).await?;
                (StockScope::Product(product.id), product.title)
            }
            _ => return reply(ctx, "Pick either a variant or a product.").await,
        };

        let removed = stock::delete_unallocated(&ctx.data().database, scope).await?;
        reply(
            ctx,
            format!("🧹 Removed {removed} unsold item(s) from **{label}**. Sold items are kept."),
        )
        .await
    }

    /// Shows stock counts for a product and its newest unsold items.
    #[poise::command(slash_command, rename = "summary", check = "checks::is_admin")]
    pub async fn stock_summary(
        ctx: Context<'_>,
        #[description = "Product to inspect"]
        #[autocomplete = "autocomplete::admin_autocomplete_product_slug"]
        product: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let product = product_by_slug(ctx, &product).await?;
        let totals = report::stock_summary(db, product.id).await?;

        let mut content = format!(
            "📊 **{}** · {} total · {} sold · {} unsold\n",
            product.title, totals.total, totals.allocated, totals.unallocated
        );
        for variant in catalog::list_variants(db, product.id, true).await? {
            let unsold = stock::count_unallocated(db, StockScope::Variant(variant.id)).await?;
            content.push_str(&format!("  └ #{} {} · {unsold} unsold\n", variant.id, variant.title));
        }

        let preview = stock::preview_unallocated(db, StockScope::Product(product.id), 5).await?;
        if !preview.is_empty() {
            content.push_str("\nNewest unsold:\n");
            for item in preview {
                let shown = item
                    .payload(product.delivery_type)
                    .map_or_else(|| "(incomplete)".to_string(), |p| mask(&p));
                let tag = item
                    .variant_id
                    .map_or_else(|| "product".to_string(), |id| format!("#{id}"));
                content.push_str(&format!("`{}` {shown} · {tag}\n", item.id));
            }
        }

        reply(ctx, content).await
    }

    /// Shows enough of a payload to recognize it without leaking it in full.
    fn mask(payload: &DeliveryPayload) -> String {
        fn head(value: &str) -> String {
            let visible: String = value.chars().take(4).collect();
            if value.chars().count() > 4 {
                format!("{visible}…")
            } else {
                visible
            }
        }
        match payload {
            DeliveryPayload::Code { code } => head(code),
            DeliveryPayload::Account { email, .. } => email.clone(),
            DeliveryPayload::Text { text } => head(text),
        }
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_says_product_level_stock_is_not_sold() {
        let line = STOCK_HELP
            .lines()
            .find(|l| l.contains("/stock bulk_product"))
            .unwrap_or_default();
        assert!(line.contains("not sold by /buy"));
        assert!(!STOCK_HELP.contains("shared by all variants"));
    }
}
