//! Schema versioning for the libSQL settings store.
//!
//! The applied version lives in SQLite's `user_version` pragma, so the
//! settings table is the only table in the file.

use libsql::Connection;

use crate::error::DatabaseError;

/// One schema step, applied when `user_version` is below `version`.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Append new steps; never edit an applied one.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "settings_store",
    sql: r#"
        CREATE TABLE IF NOT EXISTS settings (
            user_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, key)
        );
        CREATE INDEX IF NOT EXISTS idx_settings_user ON settings(user_id);
    "#,
}];

/// Bring the connection's schema up to the latest version.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let applied = schema_version(conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applying settings schema step"
        );
        // PRAGMA takes no bound parameters; the version is a trusted constant.
        let batch = format!(
            "{}\nPRAGMA user_version = {};",
            migration.sql, migration.version
        );
        conn.execute_batch(&batch).await.map_err(|e| {
            DatabaseError::Migration(format!(
                "V{} ({}) failed: {e}",
                migration.version, migration.name
            ))
        })?;
    }

    tracing::debug!(from = applied, "Settings schema up to date");
    Ok(())
}

async fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("PRAGMA user_version", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("user_version: {e}")))?;
    match rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("user_version: {e}")))?
    {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(format!("user_version: {e}"))),
        None => Ok(0),
    }
}
