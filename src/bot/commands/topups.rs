//! Top-up review Discord commands - `topups` and its subcommands.
//!
//! Admin only. Approving credits the wallet through the ledger and then tells the
//! customer by DM; a failed DM never undoes the credit.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, commands::checks},
        core::{
            notify::{self, TopupMail},
            topup, users,
        },
        errors::Result,
    };
    use tracing::warn;

    async fn reply(ctx: Context<'_>, content: impl Into<String>) -> Result<()> {
        ctx.send(
            poise::CreateReply::default()
                .content(content)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Parent command for reviewing wallet top-ups.
    #[poise::command(
        slash_command,
        check = "checks::is_admin",
        subcommands("topups_pending", "topups_approve", "topups_reject")
    )]
    pub async fn topups(ctx: Context<'_>) -> Result<()> {
        let help_text = "Top-up review. Available subcommands:\n\
            `/topups pending` - List requests waiting for review\n\
            `/topups approve` - Credit a request to the customer's wallet\n\
            `/topups reject` - Decline a request";

        reply(ctx, help_text).await
    }

    /// Lists pending requests, oldest first.
    #[poise::command(slash_command, rename = "pending", check = "checks::is_admin")]
    pub async fn topups_pending(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let pending = topup::list_pending_topups(&data.database).await?;
        if pending.is_empty() {
            return reply(ctx, "✨ No pending top-ups.").await;
        }

        let mut content = format!("🧾 **{} pending top-up(s)**\n", pending.len());
        for request in pending.iter().take(20) {
            let who = users::get_user_by_id(&data.database, request.user_id)
                .await?
                .map_or_else(|| format!("user #{}", request.user_id), |u| format!("<@{}>", u.discord_id));
            content.push_str(&format!(
                "`#{}` {} · {} via {} · ref `{}` · {}\n",
                request.id,
                who,
                data.money(request.amount),
                request.method,
                request.reference.as_deref().unwrap_or("-"),
                request.created_at.format("%Y-%m-%d %H:%M")
            ));
        }
        if pending.len() > 20 {
            content.push_str(&format!("… and {} more.\n", pending.len() - 20));
        }

        reply(ctx, content).await
    }

    /// Approves a request and credits the customer's wallet.
    #[poise::command(slash_command, rename = "approve", check = "checks::is_admin")]
    pub async fn topups_approve(
        ctx: Context<'_>,
        #[description = "Top-up request number"] id: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let approved = topup::approve_topup(&data.database, id).await?;
        let request = &approved.request;
        let amount = data.money(request.amount);

        reply(
            ctx,
            format!(
                "✅ Approved top-up #{} for {amount}. New balance: **{}**.",
                request.id,
                data.money(approved.new_wallet_balance)
            ),
        )
        .await?;

        match users::get_user_by_id(&data.database, request.user_id).await? {
            Some(customer) => {
                let html = notify::topup_approved_customer(
                    Some(&customer.email),
                    TopupMail {
                        amount: &amount,
                        method: &request.method,
                        reference: request.reference.as_deref(),
                        next_step: "/shop",
                    },
                );
                notify::deliver_best_effort(
                    data.notifier.as_ref(),
                    &customer.discord_id,
                    &notify::topup_approved_subject(&amount),
                    &html,
                )
                .await;
            }
            None => warn!(topup_id = request.id, "Approved top-up has no customer to notify"),
        }
        Ok(())
    }

    /// Declines a request. Nothing is credited.
    #[poise::command(slash_command, rename = "reject", check = "checks::is_admin")]
    pub async fn topups_reject(
        ctx: Context<'_>,
        #[description = "Top-up request number"] id: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let rejected = topup::reject_topup(&data.database, id).await?;
        reply(
            ctx,
            format!(
                "❌ Rejected top-up #{} for {}.",
                rejected.id,
                data.money(rejected.amount)
            ),
        )
        .await
    }
}

// Re-export all commands
pub use inner::*;
