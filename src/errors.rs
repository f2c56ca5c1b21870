//! Unified error type for the storefront.
//!
//! Domain failures (missing entities, inactive offerings, empty stock, short wallets,
//! bad input, conflicts) each have their own variant so the bot layer can answer with
//! a distinct message. Infrastructure failures wrap the underlying library error.

use thiserror::Error;

/// Every failure the storefront can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// A user, product, variant, order or top-up does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier used for the lookup
        id: String,
    },

    /// The product or variant exists but is switched off.
    #[error("'{title}' is not available for purchase")]
    Unavailable {
        /// Title of the inactive offering
        title: String,
    },

    /// Fewer unallocated stock rows than requested, including a lost reservation race.
    #[error("Out of stock: requested {requested}, available {available}")]
    OutOfStock {
        /// Quantity the buyer asked for
        requested: u64,
        /// Quantity that could actually be reserved
        available: u64,
    },

    /// Wallet balance is lower than the amount to debit.
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds {
        /// Balance at the time of the check
        balance: i64,
        /// Amount that was needed
        required: i64,
    },

    /// Malformed input such as an empty title or a negative price.
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// The request clashes with existing state (duplicate slug, already decided top-up).
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the clash
        message: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Details about the configuration problem
        message: String,
    },

    /// Database error from `SeaORM`.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Notification delivery failed.
    #[error("Notification error: {message}")]
    Notification {
        /// Reason reported by the sink
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error.
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Whether this error is an expected business outcome rather than a fault.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Unavailable { .. }
                | Self::OutOfStock { .. }
                | Self::InsufficientFunds { .. }
                | Self::Validation { .. }
                | Self::Conflict { .. }
        )
    }

    /// Message shown to a Discord user for this error.
    ///
    /// Domain errors explain themselves; infrastructure errors get a generic reply
    /// and are logged by the caller instead. `money` renders wallet amounts.
    #[must_use]
    pub fn user_message(&self, money: impl Fn(i64) -> String) -> String {
        match self {
            Self::NotFound { entity, id } => format!("❌ {entity} `{id}` was not found."),
            Self::Unavailable { title } => {
                format!("❌ **{title}** is not available right now.")
            }
            Self::OutOfStock {
                requested,
                available,
            } => format!(
                "❌ Out of stock: you asked for {requested}, only {available} left."
            ),
            Self::InsufficientFunds { balance, required } => format!(
                "❌ Insufficient wallet balance: you have {}, this needs {}. Use `/topup` to add funds.",
                money(*balance),
                money(*required)
            ),
            Self::Validation { message } => format!("❌ {message}"),
            Self::Conflict { message } => format!("⚠️ {message}"),
            _ => "❌ Something went wrong. Please try again later.".to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_have_distinct_messages() {
        let errors = [
            Error::not_found("Variant", 7),
            Error::Unavailable {
                title: "Netflix".to_string(),
            },
            Error::OutOfStock {
                requested: 2,
                available: 1,
            },
            Error::InsufficientFunds {
                balance: 500,
                required: 1000,
            },
            Error::validation("Title cannot be empty"),
            Error::conflict("Slug already taken"),
        ];

        let messages: std::collections::HashSet<String> =
            errors.iter().map(|e| e.user_message(|a| a.to_string())).collect();
        assert_eq!(messages.len(), errors.len());
        assert!(errors.iter().all(Error::is_domain));
    }

    #[test]
    fn test_infrastructure_errors_are_generic() {
        let err = Error::Config {
            message: "missing file".to_string(),
        };
        assert!(!err.is_domain());
        assert!(
            err.user_message(|a| a.to_string())
                .contains("Something went wrong")
        );
    }

    #[test]
    fn test_insufficient_funds_formats_amounts() {
        let err = Error::InsufficientFunds {
            balance: 500,
            required: 12000,
        };
        let message = err.user_message(|a| crate::core::report::format_money(a, "MMK"));
        assert!(message.contains("you have 500 MMK"));
        assert!(message.contains("this needs 12,000 MMK"));
    }
}
