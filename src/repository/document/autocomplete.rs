//! Token prefix suggestion over the token-count table.

use std::collections::HashSet;

use rusqlite::params;

use super::DocumentRepository;
use crate::repository::Result;

/// Candidate pool fetched per prefix before deduplication.
const CANDIDATE_LIMIT: usize = 100;

/// Suggestions returned per request.
const SUGGESTION_LIMIT: usize = 10;

/// Whether a query can be completed at all. Boolean-query syntax is not
/// completable.
pub fn completable(query: &str) -> bool {
    !(query.contains('"')
        || query.contains('(')
        || query.contains(')')
        || query.contains(" and ")
        || query.contains(" or "))
}

impl DocumentRepository {
    /// Suggest completions for the last fragment of a lowercased query.
    ///
    /// Preceding fragments must co-occur as full tokens in the same
    /// document; their document-id sets are intersected and an empty
    /// intersection yields no suggestions.
    pub fn suggest(&self, query: &str) -> Result<Vec<String>> {
        let query = query.to_lowercase();
        if query.is_empty() || !completable(&query) {
            return Ok(Vec::new());
        }

        let fragments: Vec<&str> = query.split_whitespace().collect();
        let prefix = match fragments.last() {
            Some(p) => *p,
            None => return Ok(Vec::new()),
        };
        let preceding = &fragments[..fragments.len() - 1];

        let candidates = if preceding.is_empty() {
            self.prefix_candidates(prefix, None)?
        } else {
            let mut ids: Option<HashSet<i64>> = None;
            for token in preceding {
                let docs = self.documents_with_token(token)?;
                ids = Some(match ids {
                    None => docs,
                    Some(existing) => existing.intersection(&docs).copied().collect(),
                });
            }
            let ids = ids.unwrap_or_default();
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            self.prefix_candidates(prefix, Some(&ids))?
        };

        // Deduplicate preserving frequency order, cap, and render each
        // candidate as the full phrase.
        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();
        for token in candidates {
            if !seen.insert(token.clone()) {
                continue;
            }
            let mut phrase: Vec<&str> = preceding.to_vec();
            phrase.push(&token);
            suggestions.push(phrase.join(" "));
            if suggestions.len() >= SUGGESTION_LIMIT {
                break;
            }
        }
        Ok(suggestions)
    }

    /// Tokens starting with a prefix, by descending stored count,
    /// optionally restricted to a document-id set.
    fn prefix_candidates(
        &self,
        prefix: &str,
        document_ids: Option<&HashSet<i64>>,
    ) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let pattern = format!("{}%", prefix);

        let sql = match document_ids {
            Some(ids) => {
                let id_list = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "SELECT token FROM token_counts
                     WHERE token LIKE ? AND document_id IN ({})
                     ORDER BY count DESC LIMIT {}",
                    id_list, CANDIDATE_LIMIT
                )
            }
            None => format!(
                "SELECT token FROM token_counts
                 WHERE token LIKE ?
                 ORDER BY count DESC LIMIT {}",
                CANDIDATE_LIMIT
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let tokens = stmt
            .query_map(params![pattern], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tokens)
    }

    /// Document ids containing a token.
    fn documents_with_token(&self, token: &str) -> Result<HashSet<i64>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT document_id FROM token_counts WHERE token = ?")?;
        let ids = stmt
            .query_map(params![token], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_syntax_is_not_completable() {
        assert!(!completable("\"nsu\""));
        assert!(!completable("nsu and raf"));
        assert!(!completable("nsu or raf"));
        assert!(!completable("(nsu"));
        assert!(completable("nsu ra"));
        // "and"/"or" only count as whole words
        assert!(completable("android"));
    }
}
