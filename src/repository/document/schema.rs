//! Database schema initialization and corpus reset.

use super::DocumentRepository;
use crate::repository::Result;

impl DocumentRepository {
    /// Initialize the database schema.
    ///
    /// The `page_fts` virtual table is an external-content FTS5 index
    /// over `pages.content`; the triggers keep it in sync on every
    /// write, so callers never touch it directly.
    pub(crate) fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                year INTEGER NOT NULL,
                title TEXT NOT NULL,
                jurisdiction TEXT NOT NULL,
                file_url TEXT NOT NULL UNIQUE,
                num_pages INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_id INTEGER NOT NULL REFERENCES documents(id),
                page_number INTEGER NOT NULL,
                content TEXT NOT NULL,
                file_url TEXT NOT NULL,
                UNIQUE(document_id, page_number)
            );

            CREATE TABLE IF NOT EXISTS token_counts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_id INTEGER NOT NULL REFERENCES documents(id),
                token TEXT NOT NULL,
                count INTEGER NOT NULL,
                UNIQUE(document_id, token)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_jurisdiction_year
                ON documents(jurisdiction, year);
            CREATE INDEX IF NOT EXISTS idx_pages_document
                ON pages(document_id);
            CREATE INDEX IF NOT EXISTS idx_token_counts_token
                ON token_counts(token, count DESC);
            CREATE INDEX IF NOT EXISTS idx_token_counts_document
                ON token_counts(document_id);

            CREATE VIRTUAL TABLE IF NOT EXISTS page_fts USING fts5(
                content,
                content='pages',
                content_rowid='id',
                tokenize = 'unicode61 remove_diacritics 0'
            );

            CREATE TRIGGER IF NOT EXISTS pages_ai AFTER INSERT ON pages BEGIN
                INSERT INTO page_fts(rowid, content) VALUES (new.id, new.content);
            END;

            CREATE TRIGGER IF NOT EXISTS pages_ad AFTER DELETE ON pages BEGIN
                INSERT INTO page_fts(page_fts, rowid, content)
                VALUES ('delete', old.id, old.content);
            END;

            CREATE TRIGGER IF NOT EXISTS pages_au AFTER UPDATE OF content ON pages BEGIN
                INSERT INTO page_fts(page_fts, rowid, content)
                VALUES ('delete', old.id, old.content);
                INSERT INTO page_fts(rowid, content) VALUES (new.id, new.content);
            END;
            "#,
        )?;
        Ok(())
    }

    /// Drop all corpus data and recreate the schema.
    pub fn reset(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            DROP TRIGGER IF EXISTS pages_ai;
            DROP TRIGGER IF EXISTS pages_ad;
            DROP TRIGGER IF EXISTS pages_au;
            DROP TABLE IF EXISTS page_fts;
            DROP TABLE IF EXISTS token_counts;
            DROP TABLE IF EXISTS pages;
            DROP TABLE IF EXISTS documents;
            "#,
        )?;
        drop(conn);
        self.init_schema()
    }
}
