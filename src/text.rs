//! Text normalization and token counting for extracted page text.
//!
//! The source material is OCR'd or born-digital German text pulled out of
//! PDFs, so cleaning is limited to whitespace normalization plus a narrow
//! repair for words broken across lines with a hyphen.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Collapse all line breaks and whitespace runs into single spaces,
/// preserving case.
pub fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = true;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Clean a user-supplied query: whitespace-normalized and lowercased.
pub fn clean_query(raw: &str) -> String {
    clean_text(raw).to_lowercase()
}

fn hyphen_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // TODO: sometimes the line break swallows the hyphen entirely; those
    // splits cannot be detected from the text alone.
    RE.get_or_init(|| Regex::new(r"-\s+").unwrap())
}

/// Rejoin words that were split across a line break with a hyphen.
///
/// A hyphen followed by whitespace is removed only when at least two
/// non-whitespace characters precede it and at least two follow the
/// whitespace. Hyphens inside single tokens ("Baden-Württemberg") have no
/// trailing whitespace and are left alone.
pub fn join_hyphenated_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for m in hyphen_break_regex().find_iter(text) {
        let before = &text[..m.start()];
        let after = &text[m.end()..];
        let prefix_ok = before
            .chars()
            .rev()
            .take(2)
            .filter(|c| !c.is_whitespace())
            .count()
            == 2;
        let suffix_ok = after.chars().take(2).filter(|c| !c.is_whitespace()).count() == 2;
        if prefix_ok && suffix_ok {
            out.push_str(&text[pos..m.start()]);
            pos = m.end();
        }
    }
    out.push_str(&text[pos..]);
    out
}

/// Full per-page normalization as stored and indexed.
pub fn normalize_page_text(raw: &str) -> String {
    join_hyphenated_words(&clean_text(raw))
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Letter/digit runs, keeping internal hyphens so compound names and
    // abbreviations like "vvn-bda" stay one token.
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+(?:-[\p{L}\p{N}]+)*").unwrap())
}

/// Segment one text into lowercased tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    token_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
}

/// Aggregate token frequencies across all pages of one document.
pub fn count_tokens<S: AsRef<str>>(texts: &[S]) -> HashMap<String, i64> {
    let mut counts = HashMap::new();
    for text in texts {
        for token in tokenize(text.as_ref()) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("a\r\nb\n  c\t d "), "a b c d");
        assert_eq!(clean_text("  "), "");
    }

    #[test]
    fn test_clean_text_preserves_case() {
        assert_eq!(clean_text("Verfassungsschutz\nBERICHT"), "Verfassungsschutz BERICHT");
    }

    #[test]
    fn test_join_hyphenated_words() {
        assert_eq!(
            join_hyphenated_words("Verfassungs- schutz"),
            "Verfassungsschutz"
        );
        assert_eq!(
            join_hyphenated_words("der Verfassungs-  schutz des"),
            "der Verfassungsschutz des"
        );
    }

    #[test]
    fn test_compound_names_are_untouched() {
        assert_eq!(join_hyphenated_words("Baden-Württemberg"), "Baden-Württemberg");
        assert_eq!(join_hyphenated_words("vvn-bda"), "vvn-bda");
    }

    #[test]
    fn test_short_runs_are_untouched() {
        // only one char before the hyphen
        assert_eq!(join_hyphenated_words("a- bc"), "a- bc");
        // only one char after the whitespace
        assert_eq!(join_hyphenated_words("ab- c"), "ab- c");
    }

    #[test]
    fn test_multiple_breaks() {
        assert_eq!(
            join_hyphenated_words("Links- extremismus und Rechts- extremismus"),
            "Linksextremismus und Rechtsextremismus"
        );
    }

    #[test]
    fn test_count_tokens_aggregates_across_pages() {
        let counts = count_tokens(&["a a", "a"]);
        assert_eq!(counts.get("a"), Some(&3));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_count_tokens_empty_input() {
        let counts = count_tokens::<&str>(&[]);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_count_tokens_lowercases() {
        let counts = count_tokens(&["NSU nsu Nsu"]);
        assert_eq!(counts.get("nsu"), Some(&3));
    }

    #[test]
    fn test_tokenize_keeps_internal_hyphens() {
        let tokens: Vec<String> = tokenize("VVN-BdA in Baden-Württemberg.").collect();
        assert_eq!(tokens, vec!["vvn-bda", "in", "baden-württemberg"]);
    }

    #[test]
    fn test_clean_query_lowercases() {
        assert_eq!(clean_query(" NSU \n Akten "), "nsu akten");
    }
}
