//! SQLite ledger of funding requests this service submitted.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
