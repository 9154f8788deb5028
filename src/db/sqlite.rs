use std::path::Path;

use rusqlite::Connection;

use super::StoreError;

/// Schema steps, applied in order. Each file records its own version.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../resources/migrations/001_kv_store.sql")),
    (2, include_str!("../../resources/migrations/002_revision_sequence.sql")),
];

/// Open the store file at `path`, creating and migrating it as needed.
pub fn open_database(path: &Path) -> Result<Connection, StoreError> {
    prepare(Connection::open(path)?)
}

/// In-memory store (tests and throwaway sessions).
pub fn open_memory_database() -> Result<Connection, StoreError> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection, StoreError> {
    // Single-writer device store: durability over throughput.
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA synchronous=FULL;",
    )?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let applied = schema_version(conn);

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
        tracing::info!(version, "Applying store migration");
        conn.execute_batch(sql).map_err(|e| StoreError::MigrationFailed {
            version,
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// Highest applied version; 0 for a brand-new file.
pub fn schema_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get::<_, i64>(0)
    })
    .unwrap_or(0)
}
