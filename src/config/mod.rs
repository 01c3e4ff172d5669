/// Database configuration and connection management
pub mod database;

/// Currency settings and member seeds loaded from config.toml
pub mod ledger;
