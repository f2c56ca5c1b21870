//! Wallet Discord commands - `wallet` and `topup`.
//!
//! Balances only change through the ledger: purchases debit it and approved top-ups
//! credit it. `/topup` records a request and alerts the admins; it does not credit
//! anything by itself.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, commands::checks},
        core::{
            notify::{self, TopupMail},
            topup, wallet,
        },
        entities::TopupStatus,
        errors::Result,
    };
    use poise::serenity_prelude as serenity;

    /// Shows your balance, recent wallet activity and open top-ups.
    #[poise::command(slash_command)]
    pub async fn wallet(ctx: Context<'_>) -> Result<()> {
        let Some(user) = checks::current_user(ctx).await? else {
            return Ok(());
        };
        let data = ctx.data();
        let db = &data.database;

        let balance = wallet::get_balance(db, user.id).await?;
        let entries = wallet::list_transactions(db, user.id, 10).await?;
        let pending: Vec<_> = topup::list_topups_for_user(db, user.id)
            .await?
            .into_iter()
            .filter(|t| t.status == TopupStatus::Pending)
            .collect();

        let history = if entries.is_empty() {
            "No activity yet.".to_string()
        } else {
            entries
                .iter()
                .map(|e| {
                    format!(
                        "`{}` {}{} · {}",
                        e.created_at.format("%Y-%m-%d"),
                        if e.amount > 0 { "+" } else { "" },
                        data.money(e.amount),
                        e.reason
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut embed = serenity::CreateEmbed::default()
            .title("👛 Wallet")
            .color(0x0058_65F2)
            .field("Balance", format!("**{}**", data.money(balance)), false)
            .field("Recent activity", history, false);
        if !pending.is_empty() {
            let lines = pending
                .iter()
                .map(|t| format!("#{} · {} via {}", t.id, data.money(t.amount), t.method))
                .collect::<Vec<_>>()
                .join("\n");
            embed = embed.field("Pending top-ups", lines, false);
        }

        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Requests a wallet top-up. An admin credits it after checking your payment.
    #[poise::command(slash_command)]
    pub async fn topup(
        ctx: Context<'_>,
        #[description = "Amount you paid"] amount: i64,
        #[description = "Payment method (e.g. KBZ, Wave)"] method: String,
        #[description = "Transaction reference from your payment app"] reference: Option<String>,
    ) -> Result<()> {
        let Some(user) = checks::current_user(ctx).await? else {
            return Ok(());
        };
        let data = ctx.data();

        let request =
            topup::request_topup(&data.database, user.id, amount, &method, reference.as_deref())
                .await?;

        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "🧾 Top-up request #{} for **{}** received. You'll get a DM once it is approved.",
                    request.id,
                    data.money(request.amount)
                ))
                .ephemeral(true),
        )
        .await?;

        // Notify admins after the request is stored; failures are only logged.
        let amount = data.money(request.amount);
        let html = notify::topup_admin_alert(TopupMail {
            amount: &amount,
            method: &request.method,
            reference: request.reference.as_deref(),
            next_step: &format!("/topups approve {}", request.id),
        });
        let subject = notify::topup_admin_subject(&amount);
        for admin_id in &data.admin_ids {
            notify::deliver_best_effort(data.notifier.as_ref(), admin_id, &subject, &html).await;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
