//! Discord command implementations organized by category.
//!
//! Customer commands live in `general`, `shop`, `wallet` and `orders`. Admin commands
//! (`catalog`, `stock`, `topups`) are gated by [`checks::is_admin`].

#![allow(clippy::too_long_first_doc_paragraph)]

/// Product and variant management (admin)
pub mod catalog;

/// Permission checks and caller resolution
pub mod checks;

/// General utility commands
pub mod general;

/// Order history
pub mod orders;

/// Text rendering shared by several commands
pub mod render;

/// Browsing and buying
pub mod shop;

/// Inventory management (admin)
pub mod stock;

/// Top-up review (admin)
pub mod topups;

/// Wallet balance and top-up requests
pub mod wallet;

use crate::{bot::BotData, errors::Error};

// Export commands
pub use catalog::*;
pub use general::*;
pub use orders::*;
pub use shop::*;
pub use stock::*;
pub use topups::*;
pub use wallet::*;

/// Every command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        register(),
        shop(),
        product(),
        buy(),
        wallet(),
        topup(),
        orders(),
        catalog(),
        stock(),
        topups(),
    ]
}
