//! Repository layer for SQLite persistence.
//!
//! All database access uses rusqlite with hand-written SQL. The page
//! corpus is indexed by an FTS5 table kept in sync with page content by
//! triggers, which provides the ranked search primitive.

pub mod document;

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;

pub use document::DocumentRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Open a connection with the pragmas every caller needs.
pub(crate) fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}
