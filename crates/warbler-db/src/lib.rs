pub mod accounts;
pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod session;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use accounts::{AuthOutcome, authenticate, check_credentials, signup};
pub use error::{DbError, Result};
pub use models::{Follows, Message, User};
pub use session::Session;

/// SQLite path that selects a private in-memory store.
pub const IN_MEMORY: &str = ":memory:";

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens the store named by a `DATABASE_URL`-style location: a file path,
    /// an optional `sqlite://` prefix, or `:memory:`.
    pub fn connect(url: &str) -> Result<Self> {
        let location = url.strip_prefix("sqlite://").unwrap_or(url);
        if location == IN_MEMORY {
            Self::open_in_memory()
        } else {
            Self::open(Path::new(location))
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("In-memory database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Starts a unit of work. Nothing staged on it is visible until `commit`.
    pub fn session(&self) -> Session<'_> {
        Session::new(self)
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))?;
        f(&mut conn)
    }
}
