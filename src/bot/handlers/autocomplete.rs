//! Autocomplete handlers for Discord slash command parameters.
//!
//! This module provides autocomplete functionality for product slugs and variants,
//! improving the user experience by suggesting valid options as the user types.
//! Customer-facing handlers only suggest what can be bought; the `admin_` variants
//! include switched-off products and variants.

use crate::{bot::Context, core::catalog, entities::{product, product_variant}};
use poise::serenity_prelude as serenity;

/// Discord shows at most this many suggestions.
const MAX_CHOICES: usize = 25;

fn product_matches(product: &product::Model, partial: &str) -> bool {
    product.slug.contains(partial) || product.title.to_lowercase().contains(partial)
}

async fn product_slugs(ctx: Context<'_>, partial: &str, include_inactive: bool) -> Vec<String> {
    let Ok(products) = catalog::list_products(&ctx.data().database, include_inactive).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = products
        .into_iter()
        .filter(|p| product_matches(p, &partial_lower))
        .map(|p| p.slug)
        .take(MAX_CHOICES)
        .collect();

    // Sort alphabetically for consistent UX
    matching.sort();
    matching
}

/// Suggests slugs of active products.
pub async fn autocomplete_product_slug(ctx: Context<'_>, partial: &str) -> Vec<String> {
    product_slugs(ctx, partial, false).await
}

/// Suggests slugs of all products, inactive ones included.
pub async fn admin_autocomplete_product_slug(ctx: Context<'_>, partial: &str) -> Vec<String> {
    product_slugs(ctx, partial, true).await
}

fn variant_choice(
    ctx: Context<'_>,
    variant: &product_variant::Model,
    product: &product::Model,
) -> serenity::AutocompleteChoice {
    let mut label = format!(
        "{} ({})",
        catalog::offering_title(product, variant),
        ctx.data().money(variant.price)
    );
    if !(variant.active && product.active) {
        label.push_str(" [off]");
    }
    // Choice names are capped at 100 characters
    if label.chars().count() > 100 {
        label = label.chars().take(99).collect::<String>() + "…";
    }
    serenity::AutocompleteChoice::new(label, variant.id)
}

async fn variant_choices(
    ctx: Context<'_>,
    partial: &str,
    buyable_only: bool,
) -> Vec<serenity::AutocompleteChoice> {
    let Ok(offerings) = catalog::list_offerings(&ctx.data().database, buyable_only).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    offerings
        .iter()
        .filter(|(variant, product)| {
            product_matches(product, &partial_lower)
                || variant.title.to_lowercase().contains(&partial_lower)
                || variant.id.to_string() == partial
        })
        .take(MAX_CHOICES)
        .map(|(variant, product)| variant_choice(ctx, variant, product))
        .collect()
}

/// Suggests buyable variants as "Product - Variant (price)".
pub async fn autocomplete_variant(
    ctx: Context<'_>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    variant_choices(ctx, partial, true).await
}

/// Suggests every variant, marking switched-off ones.
pub async fn admin_autocomplete_variant(
    ctx: Context<'_>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    variant_choices(ctx, partial, false).await
}
