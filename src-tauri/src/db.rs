//! Local SQLite document store for ZahMon.
//!
//! Uses rusqlite with WAL mode. The menu catalog lives in the `documents`
//! table as a single JSON document keyed by [`MENU_DOC_KEY`] and is always
//! replaced wholesale; orders get one row each in the `orders` table.
//! Provides schema migrations, settings helpers, and managed state for use
//! across Tauri commands.

use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::error::StoreError;

/// Document key under which the whole menu catalog is stored.
pub const MENU_DOC_KEY: &str = "menu";

/// Tauri managed state holding the database connection.
pub struct DbState {
    pub conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

impl DbState {
    /// Lock the connection, converting a poisoned mutex into a store error.
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::persistence(format!("db lock: {e}")))
    }
}

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Initialize the database at `{app_data_dir}/zahmon.db`.
///
/// Creates the directory if needed, opens the connection, sets pragmas,
/// and runs any pending migrations. On corruption or open failure,
/// deletes the file and retries once.
pub fn init(app_data_dir: &Path) -> Result<DbState, StoreError> {
    fs::create_dir_all(app_data_dir)
        .map_err(|e| StoreError::persistence(format!("create data dir: {e}")))?;

    let db_path = app_data_dir.join("zahmon.db");
    info!("Opening database at {}", db_path.display());

    let conn = match open_and_configure(&db_path) {
        Ok(c) => c,
        Err(first_err) => {
            warn!(
                "Database open failed ({}), deleting and retrying once",
                first_err
            );
            if db_path.exists() {
                let _ = fs::remove_file(&db_path);
                // Also remove WAL/SHM files if present
                let wal = db_path.with_extension("db-wal");
                let shm = db_path.with_extension("db-shm");
                let _ = fs::remove_file(&wal);
                let _ = fs::remove_file(&shm);
            }
            open_and_configure(&db_path)
                .map_err(|e| StoreError::persistence(format!("open after retry: {e}")))?
        }
    };

    run_migrations(&conn)?;

    info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

    Ok(DbState {
        conn: Mutex::new(conn),
        db_path,
    })
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;

    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    // Ensure schema_version table exists first
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Migration v1: settings, documents, and orders.
fn migrate_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        -- local_settings (category/key/value store; admin flag lives here)
        CREATE TABLE IF NOT EXISTS local_settings (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            setting_category TEXT NOT NULL,
            setting_key TEXT NOT NULL,
            setting_value TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE(setting_category, setting_key)
        );

        -- documents (whole-document JSON records; the menu catalog is one row)
        CREATE TABLE IF NOT EXISTS documents (
            doc_key TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- orders (one document per order)
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            items TEXT NOT NULL DEFAULT '[]',
            subtotal REAL NOT NULL DEFAULT 0,
            delivery_fee REAL NOT NULL DEFAULT 0,
            total REAL NOT NULL DEFAULT 0,
            location TEXT NOT NULL,
            phone TEXT NOT NULL,
            payment_method TEXT NOT NULL DEFAULT 'cash',
            trx_id TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            placed_at INTEGER NOT NULL
        );

        -- Indexes
        CREATE INDEX IF NOT EXISTS idx_orders_placed_at ON orders(placed_at);
        CREATE INDEX IF NOT EXISTS idx_local_settings_cat_key ON local_settings(setting_category, setting_key);

        -- Record migration
        INSERT INTO schema_version (version) VALUES (1);
        ",
    )
    .map_err(|e| StoreError::persistence(format!("migration v1: {e}")))?;

    info!("Applied migration v1");
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings helpers
// ---------------------------------------------------------------------------

/// Read a single setting, or `None` when absent.
pub fn get_setting(conn: &Connection, category: &str, key: &str) -> Option<String> {
    conn.query_row(
        "SELECT setting_value FROM local_settings WHERE setting_category = ?1 AND setting_key = ?2",
        params![category, key],
        |row| row.get(0),
    )
    .ok()
}

/// Insert or update a setting.
pub fn set_setting(
    conn: &Connection,
    category: &str,
    key: &str,
    value: &str,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO local_settings (setting_category, setting_key, setting_value, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(setting_category, setting_key) DO UPDATE SET
            setting_value = excluded.setting_value,
            updated_at = excluded.updated_at",
        params![category, key, value],
    )?;
    Ok(())
}

/// Delete a setting. Succeeds silently when the row does not exist.
pub fn delete_setting(conn: &Connection, category: &str, key: &str) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM local_settings WHERE setting_category = ?1 AND setting_key = ?2",
        params![category, key],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Document helpers
// ---------------------------------------------------------------------------

/// Read a whole JSON document by key.
pub fn get_document(conn: &Connection, doc_key: &str) -> Result<Option<String>, StoreError> {
    match conn.query_row(
        "SELECT data FROM documents WHERE doc_key = ?1",
        params![doc_key],
        |row| row.get(0),
    ) {
        Ok(data) => Ok(Some(data)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replace a whole JSON document. Last writer wins; there is no merge.
pub fn put_document(conn: &Connection, doc_key: &str, data: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO documents (doc_key, data, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(doc_key) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at",
        params![doc_key, data],
    )?;
    Ok(())
}

// ===========================================================================
// Test support
// ===========================================================================

/// Open an in-memory database with pragmas and the full schema applied.
#[cfg(test)]
pub fn test_state() -> DbState {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .expect("pragma setup");
    run_migrations(&conn).expect("run_migrations should succeed in test");
    DbState {
        conn: Mutex::new(conn),
        db_path: PathBuf::from(":memory:"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: list table names in the database.
    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .expect("prepare table list");
        stmt.query_map([], |row| row.get(0))
            .expect("query tables")
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_migrations_create_schema() {
        let db = test_state();
        let conn = db.conn.lock().unwrap();
        let tables = table_names(&conn);

        assert!(
            tables.contains(&"local_settings".to_string()),
            "missing local_settings"
        );
        assert!(
            tables.contains(&"documents".to_string()),
            "missing documents"
        );
        assert!(tables.contains(&"orders".to_string()), "missing orders");
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = test_state();
        let conn = db.conn.lock().unwrap();
        // Re-running against an up-to-date schema is a no-op.
        run_migrations(&conn).expect("second run should succeed");

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_setting_roundtrip_and_delete() {
        let db = test_state();
        let conn = db.conn.lock().unwrap();

        assert_eq!(get_setting(&conn, "admin", "session"), None);

        set_setting(&conn, "admin", "session", "true").unwrap();
        assert_eq!(
            get_setting(&conn, "admin", "session").as_deref(),
            Some("true")
        );

        // Upsert replaces rather than duplicating.
        set_setting(&conn, "admin", "session", "false").unwrap();
        assert_eq!(
            get_setting(&conn, "admin", "session").as_deref(),
            Some("false")
        );

        delete_setting(&conn, "admin", "session").unwrap();
        assert_eq!(get_setting(&conn, "admin", "session"), None);

        // Deleting a missing row is fine.
        delete_setting(&conn, "admin", "session").unwrap();
    }

    #[test]
    fn test_document_overwrite_replaces_wholesale() {
        let db = test_state();
        let conn = db.conn.lock().unwrap();

        assert_eq!(get_document(&conn, MENU_DOC_KEY).unwrap(), None);

        put_document(&conn, MENU_DOC_KEY, r#"{"soups":[]}"#).unwrap();
        assert_eq!(
            get_document(&conn, MENU_DOC_KEY).unwrap().as_deref(),
            Some(r#"{"soups":[]}"#)
        );

        // Second write clobbers the first entirely (last writer wins).
        put_document(&conn, MENU_DOC_KEY, r#"{"drinks":[]}"#).unwrap();
        assert_eq!(
            get_document(&conn, MENU_DOC_KEY).unwrap().as_deref(),
            Some(r#"{"drinks":[]}"#)
        );
    }
}
