// src/memory/mod.rs — Analytics persistence

pub mod schema;
pub mod store;
pub mod store_server;

use rusqlite::Connection;
use std::path::Path;

/// Owns the SQLite connection for usage analytics.
pub struct MemoryManager {
    pub store: store::Store,
}

impl MemoryManager {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        schema::run_migrations(&conn)?;

        Ok(Self {
            store: store::Store::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::run_migrations(&conn)?;
        Ok(Self {
            store: store::Store::new(conn),
        })
    }
}
