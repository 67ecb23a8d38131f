//! Document repository for SQLite persistence.
//!
//! Split into submodules for maintainability:
//! - `schema`: schema initialization, FTS5 index, corpus reset
//! - `crud`: bundle insert, lookups, transactional delete
//! - `search`: ranked full-text search, counts, snippets
//! - `autocomplete`: token prefix suggestion
//! - `analytics`: trend and mentions aggregations

mod analytics;
mod autocomplete;
mod crud;
mod schema;
mod search;

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::Connection;

use super::Result;
use crate::search::SearchFilter;

pub use analytics::JurisdictionYearCount;
pub use crud::JurisdictionYears;
pub use search::SearchResults;

/// Build the WHERE conditions and parameters for a filtered match query,
/// shared by the ranked search and the analytics aggregations.
///
/// The match expression always comes first; document-level filters are
/// appended when present.
fn build_conditions(match_expr: &str, filter: &SearchFilter) -> (Vec<String>, Vec<Value>) {
    let mut conditions = vec!["page_fts MATCH ?".to_string()];
    let mut params: Vec<Value> = vec![Value::Text(match_expr.to_string())];

    if let Some(jurisdiction) = &filter.jurisdiction {
        conditions.push("d.jurisdiction = ?".to_string());
        params.push(Value::Text(jurisdiction.clone()));
    }
    if let Some(min_year) = filter.min_year {
        conditions.push("d.year >= ?".to_string());
        params.push(Value::Integer(min_year as i64));
    }
    if let Some(max_year) = filter.max_year {
        conditions.push("d.year <= ?".to_string());
        params.push(Value::Integer(max_year as i64));
    }

    (conditions, params)
}

/// SQLite-backed repository for documents, pages and token counts.
pub struct DocumentRepository {
    db_path: PathBuf,
}

impl DocumentRepository {
    /// Open a repository, initializing the schema if needed.
    pub fn new(db_path: &Path) -> Result<Self> {
        let repo = Self {
            db_path: db_path.to_path_buf(),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    pub(crate) fn connect(&self) -> Result<Connection> {
        crate::repository::connect(&self.db_path)
    }

    /// Get the database path.
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentBundle, NewPage};
    use crate::search::SearchFilter;
    use crate::text;

    fn open_repo() -> (tempfile::TempDir, DocumentRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = DocumentRepository::new(&dir.path().join("test.db")).unwrap();
        (dir, repo)
    }

    fn bundle(code: &str, jurisdiction: &str, year: i32, page_texts: &[&str]) -> DocumentBundle {
        let stem = format!("vsbericht-{}-{}", code, year);
        let pages = page_texts
            .iter()
            .enumerate()
            .map(|(i, content)| NewPage {
                content: content.to_string(),
                file_url: format!("/images/{}_{}.jpg", stem, i),
            })
            .collect();
        let mut token_counts: Vec<(String, i64)> =
            text::count_tokens(page_texts).into_iter().collect();
        token_counts.sort();
        DocumentBundle {
            year,
            title: format!("Verfassungsschutzbericht {}", year),
            jurisdiction: jurisdiction.to_string(),
            file_url: format!("/pdfs/{}.pdf", stem),
            pages,
            token_counts,
        }
    }

    fn query_filter(q: &str) -> SearchFilter {
        SearchFilter {
            query: Some(q.to_string()),
            page: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_lookups() {
        let (_dir, repo) = open_repo();
        let id = repo
            .insert_bundle(&bundle(
                "by",
                "Bayern",
                2004,
                &["erste seite über extremismus", "zweite seite über parteien"],
            ))
            .unwrap();

        let doc = repo
            .get_by_file_url("/pdfs/vsbericht-by-2004.pdf")
            .unwrap()
            .unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.jurisdiction, "Bayern");
        assert_eq!(doc.num_pages, 2);
        assert!(repo.exists("Bayern", 2004).unwrap());
        assert!(!repo.exists("Bayern", 2005).unwrap());
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.year_bounds().unwrap(), Some((2004, 2004)));

        let pages = repo.get_pages(id).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].page_number, 2);

        let full = repo.document_text(id).unwrap();
        assert!(full.starts_with("erste seite"));
        assert!(full.contains("\n\n\n"));
        assert_eq!(repo.token_total(id).unwrap(), 8);
    }

    #[test]
    fn test_duplicate_file_url_leaves_no_partial_state() {
        let (_dir, repo) = open_repo();
        let b = bundle("he", "Hessen", 2010, &["inhalt"]);
        repo.insert_bundle(&b).unwrap();
        assert!(repo.insert_bundle(&b).is_err());
        // Still exactly one document with one page.
        assert_eq!(repo.count().unwrap(), 1);
        let doc = repo.get_by_file_url(&b.file_url).unwrap().unwrap();
        assert_eq!(repo.get_pages(doc.id).unwrap().len(), 1);
    }

    #[test]
    fn test_search_round_trip() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle(
            "by",
            "Bayern",
            2004,
            &["die beobachtung des extremismus im freistaat nahm deutlich zu"],
        ))
        .unwrap();
        repo.insert_bundle(&bundle(
            "he",
            "Hessen",
            2005,
            &[
                "der extremismus blieb auch in diesem berichtsjahr ein schwerpunkt",
                "ganz andere themen auf dieser seite",
            ],
        ))
        .unwrap();

        let results = repo.search(&query_filter("extremismus")).unwrap();
        assert_eq!(results.total, 2);
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.year_counts[&2004], 1);
        assert_eq!(results.year_counts[&2005], 1);
        let snippet = &results.hits[0].snippets[0];
        assert!(snippet.contains("<b>extremismus</b>"));

        // Jurisdiction filter narrows both hits and aggregates.
        let mut filtered = query_filter("extremismus");
        filtered.jurisdiction = Some("Hessen".to_string());
        let results = repo.search(&filtered).unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].jurisdiction, "Hessen");
        assert!(!results.year_counts.contains_key(&2004));

        // Pages past the result set are empty but keep the totals.
        let mut second_page = query_filter("extremismus");
        second_page.page = 2;
        let results = repo.search(&second_page).unwrap();
        assert!(results.hits.is_empty());
        assert_eq!(results.total, 2);

        // A filter without a query is not an error.
        let results = repo.search(&SearchFilter::default()).unwrap();
        assert_eq!(results.total, 0);
    }

    #[test]
    fn test_dangling_operator_degrades_instead_of_erroring() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle(
            "by",
            "Bayern",
            2004,
            &["die beobachtung des extremismus im freistaat"],
        ))
        .unwrap();

        // A trailing operator falls back to the remaining terms.
        let results = repo.search(&query_filter("extremismus or")).unwrap();
        assert_eq!(results.total, 1);

        // A query that is nothing but operators yields the empty result.
        let results = repo.search(&query_filter("or and")).unwrap();
        assert_eq!(results.total, 0);
        assert!(results.hits.is_empty());
    }

    #[test]
    fn test_negation_excludes_pages() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle(
            "be",
            "Berlin",
            2001,
            &[
                "extremismus und parteien im überblick",
                "extremismus ohne weitere schlagworte",
            ],
        ))
        .unwrap();

        let results = repo.search(&query_filter("extremismus -parteien")).unwrap();
        assert_eq!(results.total, 1);
        assert!(results.hits[0].page.content.contains("schlagworte"));
    }

    #[test]
    fn test_delete_removes_pages_from_index() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle("sn", "Sachsen", 2012, &["spuren von extremismus"]))
            .unwrap();
        assert_eq!(repo.search(&query_filter("extremismus")).unwrap().total, 1);

        repo.delete_by_file_url("/pdfs/vsbericht-sn-2012.pdf").unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        assert_eq!(repo.search(&query_filter("extremismus")).unwrap().total, 0);

        let err = repo.delete_by_file_url("/pdfs/missing.pdf").unwrap_err();
        assert!(matches!(err, crate::repository::RepositoryError::NotFound(_)));
    }

    #[test]
    fn test_index_lists_federal_first() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle("by", "Bayern", 2003, &["a"])).unwrap();
        repo.insert_bundle(&bundle("by", "Bayern", 2004, &["b"])).unwrap();
        repo.insert_bundle(&bundle("bund", "Bund", 2004, &["c"])).unwrap();

        let (index, total) = repo.get_index().unwrap();
        assert_eq!(total, 3);
        assert_eq!(index[0].jurisdiction, "Bund");
        let bayern = index.iter().find(|e| e.jurisdiction == "Bayern").unwrap();
        assert_eq!(bayern.years, vec![2004, 2003]);
    }

    #[test]
    fn test_suggest_round_trip() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle(
            "by",
            "Bayern",
            2004,
            &["salafistische bestrebungen und salafismus"],
        ))
        .unwrap();
        repo.insert_bundle(&bundle("he", "Hessen", 2005, &["sonstige themen"]))
            .unwrap();

        let suggestions = repo.suggest("sala").unwrap();
        assert!(suggestions.contains(&"salafistische".to_string()));
        assert!(suggestions.contains(&"salafismus".to_string()));

        // Preceding token restricts candidates to co-occurring documents.
        let suggestions = repo.suggest("bestrebungen sala").unwrap();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.contains(&"bestrebungen salafismus".to_string()));
        assert!(suggestions.contains(&"bestrebungen salafistische".to_string()));
        let suggestions = repo.suggest("sonstige sala").unwrap();
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_year_token_totals_respect_cutoff() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle("by", "Bayern", 1990, &["alte worte hier"]))
            .unwrap();
        repo.insert_bundle(&bundle("by", "Bayern", 2000, &["neue worte"]))
            .unwrap();

        let totals = repo.year_token_totals(1993).unwrap();
        assert!(!totals.contains_key(&1990));
        assert_eq!(totals[&2000], 2);
    }

    #[test]
    fn test_counts_by_jurisdiction_year() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle(
            "by",
            "Bayern",
            2004,
            &["extremismus seite eins zwei drei", "extremismus noch eine seite hier"],
        ))
        .unwrap();
        repo.insert_bundle(&bundle(
            "he",
            "Hessen",
            2005,
            &["extremismus einmal erwähnt worden hier"],
        ))
        .unwrap();

        let counts = repo
            .search_counts_by_jurisdiction_year(&SearchFilter::default(), "\"extremismus\"")
            .unwrap();
        assert_eq!(counts.len(), 2);
        let bayern = counts.iter().find(|c| c.jurisdiction == "Bayern").unwrap();
        assert_eq!((bayern.year, bayern.count), (2004, 2));
    }

    #[test]
    fn test_reset_drops_everything() {
        let (_dir, repo) = open_repo();
        repo.insert_bundle(&bundle("by", "Bayern", 2004, &["inhalt über extremismus"]))
            .unwrap();
        repo.reset().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        assert_eq!(repo.search(&query_filter("extremismus")).unwrap().total, 0);
        // The schema is usable again right away.
        repo.insert_bundle(&bundle("by", "Bayern", 2004, &["inhalt"])).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
    }
}
