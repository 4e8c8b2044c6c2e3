//! Version-tracked schema migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks the
//! current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::StorageError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: r#"
        CREATE TABLE IF NOT EXISTS forms (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'active',
            primary_color TEXT NOT NULL,
            theme TEXT NOT NULL DEFAULT 'light',
            questions TEXT NOT NULL,
            ai_response_prompt TEXT NOT NULL,
            products TEXT NOT NULL DEFAULT '[]',
            expert_link TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_forms_slug ON forms(slug);
        CREATE INDEX IF NOT EXISTS idx_forms_status ON forms(status);

        CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            form_id TEXT NOT NULL,
            form_name TEXT NOT NULL,
            answers TEXT NOT NULL,
            ai_response TEXT NOT NULL,
            contact_name TEXT NOT NULL,
            contact_email TEXT,
            contact_phone TEXT,
            timestamp TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_leads_form ON leads(form_id);
        CREATE INDEX IF NOT EXISTS idx_leads_timestamp ON leads(timestamp);
    "#,
}];

/// Apply all pending migrations.
pub async fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| StorageError::Backend(format!("failed to create migrations table: {e}")))?;

    let current = current_version(conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "applying migration"
        );
        conn.execute_batch(migration.sql)
            .await
            .map_err(|e| {
                StorageError::Backend(format!(
                    "migration {} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
        conn.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![migration.version, migration.name],
        )
        .await
        .map_err(|e| StorageError::Backend(format!("failed to record migration: {e}")))?;
    }

    Ok(())
}

async fn current_version(conn: &Connection) -> Result<i64, StorageError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| StorageError::Backend(format!("failed to read migration version: {e}")))?;

    match rows
        .next()
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?
    {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| StorageError::Backend(e.to_string())),
        None => Ok(0),
    }
}
