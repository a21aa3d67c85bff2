pub mod json_store;
pub mod migrate;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

use anyhow::{Result, bail};
use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::info;

pub use json_store::JsonStore;
pub use migrate::{MigrationReport, migrate_json_to_store};
pub use store::Store;

/// Which store the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Json,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "json" => Ok(Backend::Json),
            other => bail!("unknown store kind: {} (expected sqlite or json)", other),
        }
    }
}

/// SQLite backend.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads. Foreign keys stay off: rows may
        // reference users that were never registered server-side.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "OFF")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!("sqlite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert_eq!(" JSON ".parse::<Backend>().unwrap(), Backend::Json);
        assert!("postgres".parse::<Backend>().is_err());
    }
}
