//! Notifications - Outbound messages about top-ups.
//!
//! The storefront does not speak SMTP. Messages go through a [`NotificationSink`]
//! injected at startup: the bot plugs in a Discord DM sink, tests and headless runs use
//! [`LogSink`]. Delivery is always best effort, a failing sink never undoes the
//! database change that triggered the message.

use crate::errors::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Receipt returned by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Identifier assigned by the transport
    pub message_id: String,
    /// Where the message can be viewed, when the transport offers it
    pub preview_link: Option<String>,
}

/// Something that can deliver an HTML message to a recipient.
///
/// `to` is transport specific: an email address, a Discord user id, and so on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Sends one message.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<Delivery>;
}

/// Sink that only writes messages to the log.
#[derive(Debug, Default)]
pub struct LogSink {
    sent: AtomicU64,
}

impl LogSink {
    /// Creates a sink with a fresh message counter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<Delivery> {
        let seq = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        let message_id = format!("<{}.{seq}@vault-shop.log>", chrono::Utc::now().timestamp());
        info!(
            %to,
            %subject,
            body = %html_to_text(html),
            %message_id,
            "Notification logged"
        );
        Ok(Delivery {
            message_id,
            preview_link: None,
        })
    }
}

/// Sends through the sink, logging and swallowing any failure.
pub async fn deliver_best_effort(
    sink: &dyn NotificationSink,
    to: &str,
    subject: &str,
    html: &str,
) -> Option<Delivery> {
    match sink.send(to, subject, html).await {
        Ok(delivery) => Some(delivery),
        Err(e) => {
            warn!(%to, %subject, error = %e, "Notification failed, ignoring");
            None
        }
    }
}

/// Details shared by the top-up templates.
#[derive(Debug, Clone, Copy)]
pub struct TopupMail<'a> {
    /// Amount, already formatted with currency
    pub amount: &'a str,
    /// Payment method
    pub method: &'a str,
    /// Payment reference, if given
    pub reference: Option<&'a str>,
    /// Where the reader should go next (a command or a link)
    pub next_step: &'a str,
}

const WRAPPER_STYLE: &str = "font-family:system-ui,-apple-system,Segoe UI,Roboto,Ubuntu,'Helvetica Neue',Arial,sans-serif";

/// Subject line for the admin alert.
#[must_use]
pub fn topup_admin_subject(amount: &str) -> String {
    format!("🔔 New Top-up - {amount}")
}

/// Subject line for the customer confirmation.
#[must_use]
pub fn topup_approved_subject(amount: &str) -> String {
    format!("Top-up approved - {amount}")
}

/// Alert sent to administrators when a customer requests a top-up.
#[must_use]
pub fn topup_admin_alert(mail: TopupMail<'_>) -> String {
    format!(
        r#"<div style="{WRAPPER_STYLE}">
  <h3 style="margin:0 0 8px">New top-up request</h3>
  <p style="margin:0 0 4px"><b>Amount:</b> {amount}</p>
  <p style="margin:0 0 4px"><b>Method:</b> {method}</p>
  <p style="margin:0 0 12px"><b>Reference:</b> {reference}</p>
  <p style="margin:0">Review it with <code>{next}</code></p>
</div>"#,
        amount = escape(mail.amount),
        method = escape(mail.method),
        reference = escape(mail.reference.unwrap_or("-")),
        next = escape(mail.next_step),
    )
}

/// Confirmation sent to the customer once a top-up is credited.
#[must_use]
pub fn topup_approved_customer(name: Option<&str>, mail: TopupMail<'_>) -> String {
    format!(
        r#"<div style="{WRAPPER_STYLE}">
  <h3 style="margin:0 0 8px">Top-up Approved ✅</h3>
  <p style="margin:0 12px 12px 0">Hi {name}, your top-up has been approved.</p>
  <p style="margin:0 0 4px"><b>Amount:</b> {amount}</p>
  <p style="margin:0 0 4px"><b>Method:</b> {method}</p>
  <p style="margin:0 12px 12px 0"><b>Reference:</b> {reference}</p>
  <p style="margin:0">Spend it with <code>{next}</code></p>
</div>"#,
        name = escape(name.unwrap_or("Customer")),
        amount = escape(mail.amount),
        method = escape(mail.method),
        reference = escape(mail.reference.unwrap_or("-")),
        next = escape(mail.next_step),
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Strips tags for plain-text channels, one trimmed line per non-empty text line.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<Delivery> {
            Err(Error::Notification {
                message: "transport down".to_string(),
            })
        }
    }

    fn sample() -> TopupMail<'static> {
        TopupMail {
            amount: "20,000 MMK",
            method: "KBZ",
            reference: None,
            next_step: "/topups pending",
        }
    }

    #[test]
    fn test_templates_render_fields() {
        let html = topup_admin_alert(sample());
        let text = html_to_text(&html);
        assert!(text.contains("Amount: 20,000 MMK"));
        assert!(text.contains("Reference: -"));
        assert!(text.contains("/topups pending"));

        let html = topup_approved_customer(Some("Aung"), sample());
        assert!(html_to_text(&html).starts_with("Top-up Approved"));
        assert!(html.contains("Hi Aung,"));
        assert!(topup_approved_customer(None, sample()).contains("Hi Customer,"));
    }

    #[test]
    fn test_user_input_is_escaped() {
        let mail = TopupMail {
            reference: Some("<script>"),
            ..sample()
        };
        let html = topup_admin_alert(mail);
        assert!(!html.contains("<script>"));
        assert!(html_to_text(&html).contains("Reference: <script>"));
    }

    #[tokio::test]
    async fn test_log_sink_assigns_unique_ids() {
        let sink = LogSink::new();
        let first = sink.send("a@x.com", "hi", "<p>one</p>").await.unwrap();
        let second = sink.send("a@x.com", "hi", "<p>two</p>").await.unwrap();
        assert_ne!(first.message_id, second.message_id);
        assert!(first.preview_link.is_none());
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        assert!(
            deliver_best_effort(&FailingSink, "a@x.com", "s", "<p>x</p>")
                .await
                .is_none()
        );
        assert!(
            deliver_best_effort(&LogSink::new(), "a@x.com", "s", "<p>x</p>")
                .await
                .is_some()
        );
    }
}
