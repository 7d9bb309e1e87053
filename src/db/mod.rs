//! Database layer
//!
//! SQLite storage for categories, tags and posts. Services only see the
//! repository traits in [`repositories`]; the `Sqlx*Repository` adapters are
//! bound in `main.rs`.
//!
//! # Usage
//!
//! ```ignore
//! use pressroom::config::DatabaseConfig;
//! use pressroom::db::{create_pool, migrations};
//!
//! let db = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&db).await?;
//! db.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, Database};

/// True when any error in the chain is a unique-constraint violation
/// reported by the database.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation()
        )
    })
}
