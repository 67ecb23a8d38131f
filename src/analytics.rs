//! Trend (frequency-over-time) and mentions (jurisdiction × year)
//! analytics over the page corpus.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::Serialize;

use crate::repository::document::JurisdictionYearCount;
use crate::repository::DocumentRepository;
use crate::reports;
use crate::search::SearchFilter;

/// Earlier years hold too few documents for meaningful relative
/// frequencies.
pub const TRENDS_MIN_YEAR: i32 = 1993;

/// Sentinel: the jurisdiction had no reporting mandate yet, or is known
/// to have published no report that year.
pub const NEVER_PUBLISHED: i64 = -2;

/// Sentinel: a report is expected but not held in the archive.
pub const NOT_IN_ARCHIVE: i64 = -1;

/// Cached corpus-wide per-year token totals.
///
/// The totals only change when documents are added or removed, so the
/// ingest, remove and reset operations call [`YearTotalsCache::invalidate`]
/// explicitly instead of relying on ambient cache expiry.
#[derive(Default)]
pub struct YearTotalsCache {
    totals: RwLock<Option<std::collections::HashMap<i32, i64>>>,
}

impl YearTotalsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the totals, loading them from the store on first use.
    pub fn get(
        &self,
        repo: &DocumentRepository,
    ) -> crate::repository::Result<std::collections::HashMap<i32, i64>> {
        if let Ok(guard) = self.totals.read() {
            if let Some(totals) = guard.as_ref() {
                return Ok(totals.clone());
            }
        }
        let totals = repo.year_token_totals(TRENDS_MIN_YEAR)?;
        if let Ok(mut guard) = self.totals.write() {
            *guard = Some(totals.clone());
        }
        Ok(totals)
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.totals.write() {
            *guard = None;
        }
    }
}

/// One override rule: force the relative frequency of a term to a fixed
/// value for all years before a threshold.
#[derive(Debug, Clone)]
pub struct TrendOverride {
    pub term: &'static str,
    pub before_year: i32,
    pub value: f64,
}

/// Domain-knowledge overrides applied after the generic frequency
/// computation.
#[derive(Debug, Clone)]
pub struct TrendOverrides {
    rules: Vec<TrendOverride>,
}

impl Default for TrendOverrides {
    fn default() -> Self {
        Self {
            rules: vec![
                // The NSU only became publicly known in 2011; earlier
                // matches are unrelated uses of the acronym.
                TrendOverride {
                    term: "nsu",
                    before_year: 2009,
                    value: 0.0,
                },
            ],
        }
    }
}

impl TrendOverrides {
    pub fn new(rules: Vec<TrendOverride>) -> Self {
        Self { rules }
    }

    /// Apply all rules matching the query to a per-year series.
    pub fn apply(&self, query: &str, series: &mut BTreeMap<i32, f64>) {
        let query = query.to_lowercase();
        for rule in &self.rules {
            if query == rule.term {
                for (year, value) in series.iter_mut() {
                    if *year < rule.before_year {
                        *value = rule.value;
                    }
                }
            }
        }
    }
}

/// Per-year relative frequency of a query term.
#[derive(Debug, Serialize)]
pub struct TrendSeries {
    pub query: String,
    pub frequencies: BTreeMap<i32, f64>,
}

/// Compute the frequency-over-time series for a cleaned query.
///
/// Matches are found through the search index, but occurrences are
/// counted as literal case-insensitive substrings of the quote-stripped
/// query, which is more precise for exact phrases than the index's own
/// tokenization. Sums are normalized by the cached per-year token totals.
pub fn trend_series(
    repo: &DocumentRepository,
    totals_cache: &YearTotalsCache,
    overrides: &TrendOverrides,
    filter: &SearchFilter,
) -> anyhow::Result<TrendSeries> {
    let query = filter
        .query
        .clone()
        .ok_or_else(|| anyhow::anyhow!("trend requires a query"))?;
    // For quoted queries like "token", count the bare phrase.
    let counting_q = query.replace(['"', '\''], "");

    let mut sums: BTreeMap<i32, i64> = BTreeMap::new();
    for (year, content) in repo.trend_matches(filter, TRENDS_MIN_YEAR)? {
        let count = count_occurrences(&content.to_lowercase(), &counting_q) as i64;
        *sums.entry(year).or_insert(0) += count;
    }

    let totals = totals_cache.get(repo)?;
    let mut frequencies: BTreeMap<i32, f64> = BTreeMap::new();
    for (year, total) in &totals {
        let sum = sums.get(year).copied().unwrap_or(0);
        frequencies.insert(*year, sum as f64 / *total as f64);
    }

    overrides.apply(&query, &mut frequencies);

    Ok(TrendSeries { query, frequencies })
}

/// Non-overlapping occurrences of `needle` in `haystack`.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// The jurisdiction × year mentions matrix.
#[derive(Debug, Serialize)]
pub struct MentionsMatrix {
    pub cells: BTreeMap<String, BTreeMap<i32, i64>>,
}

impl MentionsMatrix {
    /// Flat `jurisdiction;year;value` rows with a header line.
    pub fn to_csv(&self) -> String {
        let mut lines = vec!["juris;year;count".to_string()];
        for (jurisdiction, years) in &self.cells {
            for (year, value) in years {
                lines.push(format!("{};{};{}", jurisdiction, year, value));
            }
        }
        lines.join("\n")
    }
}

/// Assemble the mentions matrix from the aggregated match counts.
///
/// The step order is load-bearing: start-year sentinels first, then
/// absence sentinels, then forced no-report years, and only then the
/// literal match counts, which overwrite exactly the pairs present in
/// the aggregation.
pub fn mentions_matrix(
    min_year: i32,
    max_year: i32,
    counts: &[JurisdictionYearCount],
    document_exists: impl Fn(&str, i32) -> bool,
) -> MentionsMatrix {
    let mut cells: BTreeMap<String, BTreeMap<i32, i64>> = BTreeMap::new();

    // 1. Zero-fill the full range for every jurisdiction with a known
    //    start year; 2. years before the start year never had a report.
    for (jurisdiction, start_year) in reports::START_YEARS {
        let row = cells.entry(jurisdiction.to_string()).or_default();
        for year in min_year..=max_year {
            row.insert(year, 0);
        }
        for year in min_year..(*start_year).min(max_year + 1) {
            row.insert(year, NEVER_PUBLISHED);
        }
    }

    // 3. Expected but missing reports.
    for (jurisdiction, row) in cells.iter_mut() {
        for year in min_year..=max_year {
            if row.get(&year) != Some(&NEVER_PUBLISHED) && !document_exists(jurisdiction, year) {
                row.insert(year, NOT_IN_ARCHIVE);
            }
        }
    }

    // 4. Known non-published years trump the absence sentinel.
    for (jurisdiction, years) in reports::NO_REPORTS {
        if let Some(row) = cells.get_mut(*jurisdiction) {
            for year in *years {
                if *year >= min_year && *year <= max_year {
                    row.insert(*year, NEVER_PUBLISHED);
                }
            }
        }
    }

    // 5. Literal counts for exactly the aggregated pairs.
    for count in counts {
        cells
            .entry(count.jurisdiction.clone())
            .or_default()
            .insert(count.year, count.count);
    }

    MentionsMatrix { cells }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(jurisdiction: &str, year: i32, count: i64) -> JurisdictionYearCount {
        JurisdictionYearCount {
            jurisdiction: jurisdiction.to_string(),
            year,
            count,
        }
    }

    #[test]
    fn test_sentinel_precedence() {
        // Hamburg starts 1993; Thüringen published nothing in 2014.
        let counts = vec![count("Hamburg", 1995, 7)];
        let held = |jurisdiction: &str, year: i32| {
            (jurisdiction == "Hamburg" && (1993..=2015).contains(&year))
                || (jurisdiction == "Thüringen" && year != 2014)
        };
        let matrix = mentions_matrix(1990, 2015, &counts, held);

        let hamburg = &matrix.cells["Hamburg"];
        assert_eq!(hamburg[&1990], NEVER_PUBLISHED);
        assert_eq!(hamburg[&1992], NEVER_PUBLISHED);
        // held, but no matches in the aggregation: stays 0
        assert_eq!(hamburg[&1994], 0);
        // literal count overwrites
        assert_eq!(hamburg[&1995], 7);

        let thueringen = &matrix.cells["Thüringen"];
        // forced no-report year wins over the absence sentinel
        assert_eq!(thueringen[&2014], NEVER_PUBLISHED);
        assert_eq!(thueringen[&2013], 0);
    }

    #[test]
    fn test_missing_documents_get_absence_sentinel() {
        let matrix = mentions_matrix(2000, 2002, &[], |_, _| false);
        let berlin = &matrix.cells["Berlin"];
        assert_eq!(berlin[&2000], NOT_IN_ARCHIVE);
        assert_eq!(berlin[&2001], NOT_IN_ARCHIVE);
    }

    #[test]
    fn test_zero_count_in_aggregation_is_written() {
        let counts = vec![count("Bund", 2001, 0)];
        let matrix = mentions_matrix(2001, 2001, &counts, |_, _| false);
        // present in the aggregation, so the sentinel is overwritten
        assert_eq!(matrix.cells["Bund"][&2001], 0);
    }

    #[test]
    fn test_csv_rendering() {
        let counts = vec![count("Bund", 2001, 3)];
        let matrix = mentions_matrix(2001, 2001, &counts, |_, _| true);
        let csv = matrix.to_csv();
        assert!(csv.starts_with("juris;year;count\n"));
        assert!(csv.contains("Bund;2001;3"));
    }

    #[test]
    fn test_trend_overrides_zero_early_years() {
        let overrides = TrendOverrides::default();
        let mut series: BTreeMap<i32, f64> =
            [(1995, 0.5), (2008, 0.25), (2012, 0.75)].into_iter().collect();
        overrides.apply("NSU", &mut series);
        assert_eq!(series[&1995], 0.0);
        assert_eq!(series[&2008], 0.0);
        assert_eq!(series[&2012], 0.75);
    }

    #[test]
    fn test_trend_overrides_only_match_exact_term() {
        let overrides = TrendOverrides::default();
        let mut series: BTreeMap<i32, f64> = [(1995, 0.5)].into_iter().collect();
        overrides.apply("nsu akten", &mut series);
        assert_eq!(series[&1995], 0.5);
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("nsu und nsu-komplex", "nsu"), 2);
        assert_eq!(count_occurrences("abc", ""), 0);
    }
}
