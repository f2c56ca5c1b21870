//! Order history Discord command - `orders`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context,
            commands::{checks, render},
        },
        core::orders,
        errors::Result,
    };

    /// Shows your recent orders, or the items of one order.
    ///
    /// Large orders are split into pages; every delivered item is on one of them.
    #[poise::command(slash_command)]
    pub async fn orders(
        ctx: Context<'_>,
        #[description = "Order number to open"] order: Option<i64>,
        #[description = "Page of items to show (defaults to 1)"]
        #[min = 1]
        page: Option<usize>,
    ) -> Result<()> {
        let Some(user) = checks::current_user(ctx).await? else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let content = if let Some(order_id) = order {
            let found = orders::get_order_for_user(db, user.id, order_id).await?;
            let pages = render::item_pages(
                found.order.delivery_type,
                &found.items,
                render::MAX_MESSAGE_LEN - render::PAGE_RESERVE,
            );
            let total = pages.len().max(1);
            let page = page.unwrap_or(1).clamp(1, total);

            let mut content = format!(
                "📦 **Order #{}** · {} · {}\n",
                found.order.id,
                found.order.product_title,
                found.order.created_at.format("%Y-%m-%d %H:%M UTC")
            );
            if total > 1 {
                content.push_str(&format!("Page {page}/{total}\n"));
            }
            content.push('\n');
            if let Some(items) = pages.get(page - 1) {
                content.push_str(&items.text);
            }
            if page < total {
                content.push_str(&format!(
                    "Next: `/orders order:{} page:{}`",
                    found.order.id,
                    page + 1
                ));
            }
            content
        } else {
            let history = orders::list_orders_for_user(db, user.id).await?;
            if history.is_empty() {
                "You have no orders yet. Browse with `/shop`.".to_string()
            } else {
                let mut content = String::from("📦 **Your orders**\n");
                for entry in history.iter().take(15) {
                    content.push_str(&format!(
                        "`#{}` {} × {} · {}\n",
                        entry.order.id,
                        entry.items.len(),
                        entry.order.product_title,
                        entry.order.created_at.format("%Y-%m-%d")
                    ));
                }
                if history.len() > 15 {
                    content.push_str(&format!("… and {} older orders.\n", history.len() - 15));
                }
                content.push_str("Open one with `/orders <number>`.");
                content
            }
        };

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
