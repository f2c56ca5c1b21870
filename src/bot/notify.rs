//! Discord DM notification sink.
//!
//! Recipients are Discord user ids. The HTML body is flattened to text since Discord
//! messages cannot render it.

use crate::{
    core::notify::{Delivery, NotificationSink, html_to_text},
    errors::{Error, Result},
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::debug;

/// Discord caps message content at this many characters.
const MAX_MESSAGE_LEN: usize = 2000;

/// Sends notifications as direct messages from the bot account.
pub struct DiscordDmSink {
    http: Arc<serenity::Http>,
}

impl DiscordDmSink {
    /// Creates a sink that talks to Discord through `http`.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

/// Parses a Discord user id, rejecting anything that is not a non-zero integer.
pub fn parse_user_id(raw: &str) -> Result<serenity::UserId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::UserId::new)
        .ok_or_else(|| Error::Notification {
            message: format!("'{raw}' is not a Discord user id"),
        })
}

/// Renders a subject and HTML body as one Discord message.
#[must_use]
pub fn dm_content(subject: &str, html: &str) -> String {
    let content = format!("**{subject}**\n{}", html_to_text(html));
    if content.chars().count() <= MAX_MESSAGE_LEN {
        return content;
    }
    let mut truncated: String = content.chars().take(MAX_MESSAGE_LEN - 1).collect();
    truncated.push('…');
    truncated
}

#[async_trait]
impl NotificationSink for DiscordDmSink {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<Delivery> {
        let user_id = parse_user_id(to)?;
        let message = user_id
            .direct_message(
                &*self.http,
                serenity::CreateMessage::new().content(dm_content(subject, html)),
            )
            .await?;

        debug!(%to, message_id = %message.id, "Sent DM notification");
        Ok(Delivery {
            message_id: message.id.to_string(),
            preview_link: Some(message.link()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id(" 42 ").ok(), Some(serenity::UserId::new(42)));
        assert!(parse_user_id("0").is_err());
        assert!(parse_user_id("someone@example.com").is_err());
    }

    #[test]
    fn test_dm_content_flattens_and_truncates() {
        let content = dm_content("Hello", "<p>Amount: <b>5</b></p>");
        assert_eq!(content, "**Hello**\nAmount: 5");

        let long = format!("<p>{}</p>", "x".repeat(3000));
        let content = dm_content("Long", &long);
        assert_eq!(content.chars().count(), MAX_MESSAGE_LEN);
        assert!(content.ends_with('…'));
    }
}
