/// Database configuration and connection management
pub mod database;

/// Shop settings and catalog seed loading from config.toml
pub mod shop;

/// Administrator Discord ids from environment variables
pub mod users;
