//! Bundle insertion, lookups and transactional deletion.

use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::Serialize;

use super::DocumentRepository;
use crate::models::{Document, DocumentBundle, Page};
use crate::repository::{RepositoryError, Result};

/// Per-jurisdiction year listing for the corpus index.
#[derive(Debug, Clone, Serialize)]
pub struct JurisdictionYears {
    pub jurisdiction: String,
    /// Years held in the archive, newest first.
    pub years: Vec<i32>,
}

impl DocumentRepository {
    /// Insert a complete document bundle in one transaction.
    ///
    /// Either the document row, all page rows and all token counts are
    /// committed together, or nothing is. A duplicate `file_url` fails
    /// here without leaving any partial state behind, so reprocessing a
    /// source file stays safe.
    pub fn insert_bundle(&self, bundle: &DocumentBundle) -> Result<i64> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO documents (year, title, jurisdiction, file_url, num_pages)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                bundle.year,
                bundle.title,
                bundle.jurisdiction,
                bundle.file_url,
                bundle.pages.len() as i64,
            ],
        )?;
        let document_id = tx.last_insert_rowid();

        {
            let mut page_stmt = tx.prepare(
                "INSERT INTO pages (document_id, page_number, content, file_url)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (index, page) in bundle.pages.iter().enumerate() {
                page_stmt.execute(params![
                    document_id,
                    (index + 1) as i64,
                    page.content,
                    page.file_url,
                ])?;
            }

            let mut token_stmt = tx.prepare(
                "INSERT INTO token_counts (document_id, token, count) VALUES (?1, ?2, ?3)",
            )?;
            for (token, count) in &bundle.token_counts {
                token_stmt.execute(params![document_id, token, count])?;
            }
        }

        tx.commit()?;
        Ok(document_id)
    }

    /// Get a document by its unique file URL.
    pub fn get_by_file_url(&self, file_url: &str) -> Result<Option<Document>> {
        let conn = self.connect()?;
        let doc = conn
            .query_row(
                "SELECT id, year, title, jurisdiction, file_url, num_pages
                 FROM documents WHERE file_url = ?",
                params![file_url],
                row_to_document,
            )
            .optional()?;
        Ok(doc)
    }

    /// Get a document by jurisdiction and year.
    pub fn get_by_jurisdiction_year(
        &self,
        jurisdiction: &str,
        year: i32,
    ) -> Result<Option<Document>> {
        let conn = self.connect()?;
        let doc = conn
            .query_row(
                "SELECT id, year, title, jurisdiction, file_url, num_pages
                 FROM documents WHERE jurisdiction = ? AND year = ?",
                params![jurisdiction, year],
                row_to_document,
            )
            .optional()?;
        Ok(doc)
    }

    /// Check whether any document exists for a jurisdiction and year.
    pub fn exists(&self, jurisdiction: &str, year: i32) -> Result<bool> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE jurisdiction = ? AND year = ?",
            params![jurisdiction, year],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get all documents ordered by jurisdiction, then year.
    pub fn get_all_ordered(&self) -> Result<Vec<Document>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, year, title, jurisdiction, file_url, num_pages
             FROM documents ORDER BY jurisdiction, year",
        )?;
        let docs = stmt
            .query_map([], row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(docs)
    }

    /// Get the pages of a document in page-number order.
    pub fn get_pages(&self, document_id: i64) -> Result<Vec<Page>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, document_id, page_number, content, file_url
             FROM pages WHERE document_id = ? ORDER BY page_number",
        )?;
        let pages = stmt
            .query_map(params![document_id], |row| {
                Ok(Page {
                    id: row.get(0)?,
                    document_id: row.get(1)?,
                    page_number: row.get(2)?,
                    content: row.get(3)?,
                    file_url: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    /// The full plain text of a document, pages joined by blank lines.
    pub fn document_text(&self, document_id: i64) -> Result<String> {
        let pages = self.get_pages(document_id)?;
        Ok(pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n\n"))
    }

    /// Sum of all token counts for one document.
    pub fn token_total(&self, document_id: i64) -> Result<i64> {
        let conn = self.connect()?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM token_counts WHERE document_id = ?",
            params![document_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Delete a document and everything belonging to it.
    ///
    /// Token counts, pages and the document row go in one transaction;
    /// a failure leaves the document fully intact.
    pub fn delete_by_file_url(&self, file_url: &str) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let document_id: i64 = tx
            .query_row(
                "SELECT id FROM documents WHERE file_url = ?",
                params![file_url],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound(file_url.to_string()))?;

        tx.execute(
            "DELETE FROM token_counts WHERE document_id = ?",
            params![document_id],
        )?;
        tx.execute("DELETE FROM pages WHERE document_id = ?", params![document_id])?;
        tx.execute("DELETE FROM documents WHERE id = ?", params![document_id])?;

        tx.commit()?;
        Ok(())
    }

    /// Corpus index: per-jurisdiction held years (newest first) plus the
    /// total document count.
    pub fn get_index(&self) -> Result<(Vec<JurisdictionYears>, usize)> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT year FROM documents WHERE jurisdiction = ? ORDER BY year DESC",
        )?;

        let mut index = Vec::new();
        let mut total = 0;
        for jurisdiction in crate::reports::all_jurisdictions() {
            let years = stmt
                .query_map(params![jurisdiction], |row| row.get::<_, i32>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            total += years.len();
            index.push(JurisdictionYears {
                jurisdiction: jurisdiction.to_string(),
                years,
            });
        }
        Ok((index, total))
    }

    /// Total number of documents.
    pub fn count(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Smallest and largest document year, if any documents exist.
    pub fn year_bounds(&self) -> Result<Option<(i32, i32)>> {
        let conn = self.connect()?;
        let bounds: (Option<i32>, Option<i32>) = conn.query_row(
            "SELECT MIN(year), MAX(year) FROM documents",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match bounds {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }
}

fn row_to_document(row: &rusqlite::Row<'_>) -> std::result::Result<Document, rusqlite::Error> {
    Ok(Document {
        id: row.get(0)?,
        year: row.get(1)?,
        title: row.get(2)?,
        jurisdiction: row.get(3)?,
        file_url: row.get(4)?,
        num_pages: row.get(5)?,
    })
}
