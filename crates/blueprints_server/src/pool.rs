//! Pooled SQLite connections shared by request handlers.

use anyhow::Context;
use blueprints_core::db::{configure_connection, open_db};
use log::info;
use r2d2_sqlite::SqliteConnectionManager;

use crate::configuration::DatabaseConfig;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// Migrates the database file, then builds a pool over it.
///
/// Migrations run once here; pooled connections only get per-connection
/// pragmas.
pub fn build_pool(config: &DatabaseConfig) -> Result<DbPool, anyhow::Error> {
    open_db(&config.path).with_context(|| {
        format!(
            "Failed to open and migrate database at `{}`",
            config.path.display()
        )
    })?;

    let manager = SqliteConnectionManager::file(&config.path)
        .with_init(|conn| configure_connection(conn));
    let pool = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .context("Failed to build the SQLite connection pool")?;

    info!(
        "event=pool_ready module=pool status=ok max_connections={}",
        config.max_connections
    );
    Ok(pool)
}
