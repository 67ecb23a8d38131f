//! Search request normalization, FTS5 match-expression building and the
//! snippet (headline) primitive.
//!
//! Everything in this module is pure; execution against the store lives
//! in `repository::document::search`.

use crate::reports;
use crate::text::clean_query;

/// Results per page.
pub const PAGE_SIZE: usize = 20;

/// Fragment delimiter for the headline primitive; unlikely to appear in
/// source text.
pub const FRAGMENT_DELIMITER: &str = "XXX.....XXX";

/// Maximum highlighted fragments per page.
pub const MAX_FRAGMENTS: usize = 10;

/// Fragment size bounds, in words.
pub const MIN_FRAGMENT_WORDS: usize = 5;
pub const MAX_FRAGMENT_WORDS: usize = 20;

/// An incoming search request, before normalization.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub q: Option<String>,
    /// 1-based result page.
    pub page: Option<usize>,
    pub jurisdiction: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

/// Normalized filter values shared by search, trend and mentions.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Cleaned, lowercased query; `None` short-circuits downstream
    /// components with an empty result.
    pub query: Option<String>,
    /// 1-based result page, at least 1.
    pub page: usize,
    /// Title-cased jurisdiction; `None` means no filter.
    pub jurisdiction: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

/// Translate a request into the composed filter.
///
/// The literal jurisdiction value "alle" means "no filter".
pub fn build_filter(request: &SearchRequest) -> SearchFilter {
    let jurisdiction = request
        .jurisdiction
        .as_deref()
        .filter(|j| !j.is_empty() && !j.eq_ignore_ascii_case("alle"))
        .map(reports::normalize_jurisdiction);

    let query = request
        .q
        .as_deref()
        .map(clean_query)
        .filter(|q| !q.is_empty());

    SearchFilter {
        query,
        page: request.page.unwrap_or(1).max(1),
        jurisdiction,
        min_year: request.min_year,
        max_year: request.max_year,
    }
}

/// Build an FTS5 MATCH expression from a cleaned query.
///
/// Bare terms are double-quoted so hyphenated words survive FTS5 syntax,
/// quoted phrases pass through, `or`/`and` become operators and leading
/// `-` negates a term. Returns `None` for queries with nothing to match.
pub fn match_expression(query: &str) -> Option<String> {
    let mut positives: Vec<String> = Vec::new();
    let mut negatives: Vec<String> = Vec::new();
    let mut explicit: Vec<String> = Vec::new();
    let mut has_operators = false;

    for item in split_query(query) {
        match item {
            QueryItem::Phrase(p) => {
                let quoted = format!("\"{}\"", p.replace('"', "\"\""));
                positives.push(quoted.clone());
                explicit.push(quoted);
            }
            QueryItem::Or => {
                has_operators = true;
                explicit.push("OR".to_string());
            }
            QueryItem::And => {
                has_operators = true;
                explicit.push("AND".to_string());
            }
            QueryItem::Negated(w) => {
                let quoted = format!("\"{}\"", w.replace('"', "\"\""));
                negatives.push(quoted.clone());
                explicit.push(format!("NOT {}", quoted));
            }
            QueryItem::Word(w) => {
                let quoted = format!("\"{}\"", w.replace('"', "\"\""));
                positives.push(quoted.clone());
                explicit.push(quoted);
            }
        }
    }

    if has_operators {
        // Reassemble so every operator has an operand on both sides:
        // leading, trailing and doubled operators would all be FTS5
        // syntax errors. NOT is binary in FTS5, so a negation without a
        // left-hand side is dropped and one following another operator
        // replaces it.
        let mut expr: Vec<String> = Vec::new();
        let mut pending_op: Option<String> = None;
        for token in explicit {
            if token == "OR" || token == "AND" {
                if !expr.is_empty() {
                    pending_op = Some(token);
                }
                continue;
            }
            if let Some(negated) = token.strip_prefix("NOT ") {
                if !expr.is_empty() {
                    pending_op = None;
                    expr.push(format!("NOT {}", negated));
                }
                continue;
            }
            if let Some(op) = pending_op.take() {
                expr.push(op);
            } else if !expr.is_empty() {
                expr.push("AND".to_string());
            }
            expr.push(token);
        }
        if expr.is_empty() {
            return None;
        }
        return Some(expr.join(" "));
    }

    if positives.is_empty() {
        return None;
    }
    let mut expr = positives.join(" AND ");
    for neg in negatives {
        expr.push_str(" NOT ");
        expr.push_str(&neg);
    }
    Some(expr)
}

enum QueryItem {
    Word(String),
    Phrase(String),
    Negated(String),
    Or,
    And,
}

fn split_query(query: &str) -> Vec<QueryItem> {
    let mut items = Vec::new();
    let mut chars = query.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut phrase = String::new();
            for pc in chars.by_ref() {
                if pc == '"' {
                    break;
                }
                phrase.push(pc);
            }
            if !phrase.trim().is_empty() {
                items.push(QueryItem::Phrase(phrase.trim().to_string()));
            }
            continue;
        }
        let mut word = String::new();
        while let Some(&wc) = chars.peek() {
            if wc.is_whitespace() || wc == '"' {
                break;
            }
            word.push(wc);
            chars.next();
        }
        match word.as_str() {
            "or" | "OR" => items.push(QueryItem::Or),
            "and" | "AND" => items.push(QueryItem::And),
            _ => {
                if let Some(stripped) = word.strip_prefix('-') {
                    if !stripped.is_empty() {
                        items.push(QueryItem::Negated(stripped.to_string()));
                    }
                } else if !word.is_empty() {
                    items.push(QueryItem::Word(word));
                }
            }
        }
    }
    items
}

/// The plain terms of a query, for literal highlighting: quotes and
/// parentheses stripped, negations and boolean words dropped.
pub fn highlight_terms(query: &str) -> Vec<String> {
    query
        .replace(['"', '\'', '(', ')'], " ")
        .split_whitespace()
        .filter(|t| !t.starts_with('-'))
        .filter(|t| {
            let lower = t.to_lowercase();
            lower != "or" && lower != "and"
        })
        .map(|t| t.to_lowercase())
        .collect()
}

/// Generate highlighted fragments for one page, ts_headline style.
///
/// Fragments are windows of [`MIN_FRAGMENT_WORDS`]..=[`MAX_FRAGMENT_WORDS`]
/// words around term matches, matches wrapped in `<b></b>`, at most
/// [`MAX_FRAGMENTS`] per page. Term matching is by lowercased prefix on
/// punctuation-trimmed words, which approximates lexeme matching well
/// enough for German inflection.
pub fn headline_fragments(content: &str, terms: &[String]) -> Vec<String> {
    if terms.is_empty() {
        return Vec::new();
    }
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let matches: Vec<bool> = words.iter().map(|w| word_matches(w, terms)).collect();

    // Group match positions into at most MAX_FRAGMENTS windows.
    let mut fragments = Vec::new();
    let mut covered_until = 0usize;
    for (pos, is_match) in matches.iter().enumerate() {
        if !is_match || pos < covered_until {
            continue;
        }
        if fragments.len() >= MAX_FRAGMENTS {
            break;
        }

        let half = MAX_FRAGMENT_WORDS / 2;
        let start = pos.saturating_sub(half).max(covered_until);
        let mut end = (start + MAX_FRAGMENT_WORDS).min(words.len());
        let start = if end - start < MIN_FRAGMENT_WORDS {
            end.saturating_sub(MIN_FRAGMENT_WORDS).max(covered_until)
        } else {
            start
        };
        // Pull trailing matches inside the same window.
        while end < words.len() && end - start < MAX_FRAGMENT_WORDS && matches[end - 1] {
            end += 1;
        }

        let rendered: Vec<String> = (start..end)
            .map(|i| {
                if matches[i] {
                    format!("<b>{}</b>", words[i])
                } else {
                    words[i].to_string()
                }
            })
            .collect();
        fragments.push(rendered.join(" "));
        covered_until = end;
    }
    fragments
}

/// The store-side headline primitive: fragments joined by the sentinel
/// delimiter, as the text-index collaborator would return them.
pub fn headline(content: &str, terms: &[String]) -> String {
    headline_fragments(content, terms).join(FRAGMENT_DELIMITER)
}

fn word_matches(word: &str, terms: &[String]) -> bool {
    let trimmed: String = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if trimmed.is_empty() {
        return false;
    }
    terms.iter().any(|t| trimmed.starts_with(t.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_defaults() {
        let filter = build_filter(&SearchRequest::default());
        assert!(filter.query.is_none());
        assert_eq!(filter.page, 1);
        assert!(filter.jurisdiction.is_none());
    }

    #[test]
    fn test_build_filter_all_jurisdictions_means_unset() {
        let filter = build_filter(&SearchRequest {
            jurisdiction: Some("alle".to_string()),
            ..Default::default()
        });
        assert!(filter.jurisdiction.is_none());
    }

    #[test]
    fn test_build_filter_title_cases_jurisdiction() {
        let filter = build_filter(&SearchRequest {
            jurisdiction: Some("baden-württemberg".to_string()),
            min_year: Some(1990),
            ..Default::default()
        });
        assert_eq!(filter.jurisdiction.as_deref(), Some("Baden-Württemberg"));
        assert_eq!(filter.min_year, Some(1990));
    }

    #[test]
    fn test_match_expression_quotes_bare_terms() {
        assert_eq!(
            match_expression("vvn-bda").as_deref(),
            Some("\"vvn-bda\"")
        );
        assert_eq!(
            match_expression("nsu akten").as_deref(),
            Some("\"nsu\" AND \"akten\"")
        );
    }

    #[test]
    fn test_match_expression_phrases_and_operators() {
        assert_eq!(
            match_expression("\"rote hilfe\" or nsu").as_deref(),
            Some("\"rote hilfe\" OR \"nsu\"")
        );
    }

    #[test]
    fn test_match_expression_negation() {
        assert_eq!(
            match_expression("nsu -akten").as_deref(),
            Some("\"nsu\" NOT \"akten\"")
        );
        assert!(match_expression("-akten").is_none());
    }

    #[test]
    fn test_match_expression_empty() {
        assert!(match_expression("").is_none());
        assert!(match_expression("   ").is_none());
    }

    #[test]
    fn test_match_expression_dangling_operators() {
        // Trailing, lone and doubled operators must never reach FTS5.
        assert_eq!(match_expression("nsu or").as_deref(), Some("\"nsu\""));
        assert_eq!(match_expression("or nsu").as_deref(), Some("\"nsu\""));
        assert!(match_expression("and").is_none());
        assert!(match_expression("or or").is_none());
        assert_eq!(
            match_expression("nsu or or raf").as_deref(),
            Some("\"nsu\" OR \"raf\"")
        );
        assert_eq!(
            match_expression("nsu and or raf").as_deref(),
            Some("\"nsu\" OR \"raf\"")
        );
    }

    #[test]
    fn test_match_expression_negation_with_operators() {
        // NOT is binary in FTS5: it needs a left-hand side and cannot
        // directly follow another operator.
        assert_eq!(
            match_expression("nsu and -raf").as_deref(),
            Some("\"nsu\" NOT \"raf\"")
        );
        assert!(match_expression("-nsu or").is_none());
        assert_eq!(
            match_expression("-nsu or raf").as_deref(),
            Some("\"raf\"")
        );
    }

    #[test]
    fn test_highlight_terms() {
        assert_eq!(
            highlight_terms("\"rote hilfe\" or -nsu (raf)"),
            vec!["rote", "hilfe", "raf"]
        );
    }

    #[test]
    fn test_headline_wraps_matches() {
        let content = "a b c d e f nsu g h i j k";
        let frags = headline_fragments(content, &["nsu".to_string()]);
        assert_eq!(frags.len(), 1);
        assert!(frags[0].contains("<b>nsu</b>"));
    }

    #[test]
    fn test_headline_fragment_count_is_capped() {
        let content = "nsu x y z w v u t s r q p ".repeat(30);
        let frags = headline_fragments(&content, &["nsu".to_string()]);
        assert!(frags.len() <= MAX_FRAGMENTS);
        assert!(frags.len() > 1);
    }

    #[test]
    fn test_headline_no_match_is_empty() {
        assert!(headline_fragments("nothing here", &["nsu".to_string()]).is_empty());
        assert_eq!(headline("nothing here", &["nsu".to_string()]), "");
    }

    #[test]
    fn test_headline_matches_inflected_words() {
        let frags = headline_fragments(
            "die Verfassungsschutzberichte der Länder wurden veröffentlicht und archiviert",
            &["verfassungsschutz".to_string()],
        );
        assert_eq!(frags.len(), 1);
        assert!(frags[0].contains("<b>Verfassungsschutzberichte</b>"));
    }
}
