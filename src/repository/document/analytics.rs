//! Aggregations backing the trend and mentions analytics.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter};

use super::{build_conditions, DocumentRepository};
use crate::repository::Result;
use crate::search::{self, SearchFilter};

/// Number of matching pages for one (jurisdiction, year) pair.
#[derive(Debug, Clone)]
pub struct JurisdictionYearCount {
    pub jurisdiction: String,
    pub year: i32,
    pub count: i64,
}

impl DocumentRepository {
    /// Corpus-wide token totals per year, for years at or above the
    /// cutoff. Feeds the trend normalization.
    pub fn year_token_totals(&self, min_year: i32) -> Result<HashMap<i32, i64>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT d.year, SUM(tc.count)
             FROM token_counts tc
             JOIN documents d ON d.id = tc.document_id
             WHERE d.year >= ?
             GROUP BY d.year",
        )?;
        let totals = stmt
            .query_map(params![min_year], |row| {
                Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(totals)
    }

    /// Matching-page counts grouped by (jurisdiction, year), selecting
    /// page ids only, for the mentions matrix.
    pub fn search_counts_by_jurisdiction_year(
        &self,
        filter: &SearchFilter,
        match_expr: &str,
    ) -> Result<Vec<JurisdictionYearCount>> {
        let conn = self.connect()?;
        let (conditions, params) = build_conditions(match_expr, filter);

        let sql = format!(
            "SELECT d.jurisdiction, d.year, COUNT(p.id)
             FROM page_fts
             JOIN pages p ON p.id = page_fts.rowid
             JOIN documents d ON d.id = p.document_id
             WHERE {}
             GROUP BY d.jurisdiction, d.year",
            conditions.join(" AND ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let counts = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok(JurisdictionYearCount {
                    jurisdiction: row.get(0)?,
                    year: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// Convenience wrapper used by the analytics layer: trend matches as
    /// (year, content) pairs.
    pub fn trend_matches(
        &self,
        filter: &SearchFilter,
        min_year: i32,
    ) -> Result<Vec<(i32, String)>> {
        let query = match &filter.query {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };
        let match_expr = match search::match_expression(query) {
            Some(expr) => expr,
            None => return Ok(Vec::new()),
        };
        self.search_matches_since(filter, &match_expr, min_year)
    }
}
