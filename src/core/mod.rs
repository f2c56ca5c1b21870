/// Products and pricing variants
pub mod catalog;

/// Bulk stock loading from parsed rows
pub mod loader;

/// Outbound notification sinks and message templates
pub mod notify;

/// Immutable purchase receipts
pub mod orders;

/// The atomic purchase transaction
pub mod purchase;

/// Storefront listings and stock summaries
pub mod report;

/// CSV and pasted-text tokenizers
pub mod rows;

/// Inventory rows and their allocation
pub mod stock;

/// Wallet top-up requests
pub mod topup;

/// Discord identity resolution and registration
pub mod users;

/// Wallet balances and the ledger
pub mod wallet;
