//! Ranked full-text search over the page corpus.

use std::collections::HashMap;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Row};

use super::{build_conditions, DocumentRepository};
use crate::models::{Page, SearchHit};
use crate::repository::Result;
use crate::search::{self, SearchFilter, PAGE_SIZE};

/// One page of ranked results plus the aggregates computed over the full
/// match set.
#[derive(Debug)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// Total matching pages across the whole corpus.
    pub total: u64,
    /// Document-year → number of matching pages in that year.
    pub year_counts: HashMap<i32, u64>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
            year_counts: HashMap::new(),
        }
    }
}

impl DocumentRepository {
    /// Execute a ranked, paginated search with snippets and the per-year
    /// match histogram.
    ///
    /// A filter without a query yields the empty result, not an error.
    pub fn search(&self, filter: &SearchFilter) -> Result<SearchResults> {
        let query = match &filter.query {
            Some(q) => q,
            None => return Ok(SearchResults::empty()),
        };
        let match_expr = match search::match_expression(query) {
            Some(expr) => expr,
            None => return Ok(SearchResults::empty()),
        };

        let conn = self.connect()?;
        let (conditions, params) = build_conditions(&match_expr, filter);
        let where_clause = conditions.join(" AND ");

        // Ranked result page. bm25 rank sorts best matches first.
        let offset = (filter.page.max(1) - 1) * PAGE_SIZE;
        let sql = format!(
            "SELECT p.id, p.document_id, p.page_number, p.content, p.file_url,
                    d.year, d.jurisdiction
             FROM page_fts
             JOIN pages p ON p.id = page_fts.rowid
             JOIN documents d ON d.id = p.document_id
             WHERE {}
             ORDER BY page_fts.rank
             LIMIT {} OFFSET {}",
            where_clause, PAGE_SIZE, offset
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut hits = stmt
            .query_map(params_from_iter(params.iter()), row_to_hit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Total match count, selecting ids only.
        let count_sql = format!(
            "SELECT COUNT(*) FROM (
                 SELECT p.id
                 FROM page_fts
                 JOIN pages p ON p.id = page_fts.rowid
                 JOIN documents d ON d.id = p.document_id
                 WHERE {}
             )",
            where_clause
        );
        let total: i64 = conn.query_row(&count_sql, params_from_iter(params.iter()), |row| {
            row.get(0)
        })?;

        // Per-year histogram over the full match set.
        let hist_sql = format!(
            "SELECT d.year, COUNT(p.id)
             FROM page_fts
             JOIN pages p ON p.id = page_fts.rowid
             JOIN documents d ON d.id = p.document_id
             WHERE {}
             GROUP BY d.year",
            where_clause
        );
        let mut hist_stmt = conn.prepare(&hist_sql)?;
        let year_counts = hist_stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        // Highlighted fragments for the returned page of results only.
        let terms = search::highlight_terms(query);
        for hit in &mut hits {
            let joined = search::headline(&hit.page.content, &terms);
            hit.snippets = if joined.is_empty() {
                Vec::new()
            } else {
                joined
                    .split(search::FRAGMENT_DELIMITER)
                    .map(|s| s.to_string())
                    .collect()
            };
        }

        Ok(SearchResults {
            hits,
            total: total as u64,
            year_counts,
        })
    }

    /// All matching (year, page content) pairs with year at or above a
    /// cutoff, for the trend scan.
    pub fn search_matches_since(
        &self,
        filter: &SearchFilter,
        match_expr: &str,
        min_year: i32,
    ) -> Result<Vec<(i32, String)>> {
        let conn = self.connect()?;
        let (mut conditions, mut params) = build_conditions(match_expr, filter);
        conditions.push("d.year >= ?".to_string());
        params.push(Value::Integer(min_year as i64));

        let sql = format!(
            "SELECT d.year, p.content
             FROM page_fts
             JOIN pages p ON p.id = page_fts.rowid
             JOIN documents d ON d.id = p.document_id
             WHERE {}",
            conditions.join(" AND ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get::<_, i32>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_hit(row: &Row<'_>) -> std::result::Result<SearchHit, rusqlite::Error> {
    Ok(SearchHit {
        page: Page {
            id: row.get(0)?,
            document_id: row.get(1)?,
            page_number: row.get(2)?,
            content: row.get(3)?,
            file_url: row.get(4)?,
        },
        year: row.get(5)?,
        jurisdiction: row.get(6)?,
        snippets: Vec::new(),
    })
}
