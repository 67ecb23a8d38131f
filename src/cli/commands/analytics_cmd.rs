//! Trend and mentions commands.

use console::style;

use super::AppContext;
use crate::analytics::{self, NEVER_PUBLISHED, NOT_IN_ARCHIVE, TRENDS_MIN_YEAR};
use crate::search::{self, SearchRequest};

/// Print the per-year relative frequency of a query.
pub fn cmd_trend(
    ctx: &AppContext,
    query: &str,
    jurisdiction: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let request = SearchRequest {
        q: Some(query.to_string()),
        jurisdiction,
        ..Default::default()
    };
    let filter = search::build_filter(&request);
    let series = analytics::trend_series(&ctx.repo, &ctx.totals_cache, &ctx.overrides, &filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    if series.frequencies.is_empty() {
        println!("{} No data at or after {}", style("!").yellow(), TRENDS_MIN_YEAR);
        return Ok(());
    }

    println!("{} Trend for '{}'", style("✓").green(), series.query);
    let peak = series
        .frequencies
        .values()
        .cloned()
        .fold(f64::MIN, f64::max)
        .max(f64::MIN_POSITIVE);
    for (year, frequency) in &series.frequencies {
        let bar = "#".repeat((frequency / peak * 40.0).round() as usize);
        println!("  {}  {:.8}  {}", year, frequency, bar);
    }
    Ok(())
}

/// Print the jurisdiction-by-year mentions matrix.
pub fn cmd_mentions(
    ctx: &AppContext,
    query: &str,
    from: Option<i32>,
    to: Option<i32>,
    csv: bool,
    json: bool,
) -> anyhow::Result<()> {
    let request = SearchRequest {
        q: Some(query.to_string()),
        min_year: from,
        max_year: to,
        ..Default::default()
    };
    let filter = search::build_filter(&request);

    let match_expr = filter
        .query
        .as_deref()
        .and_then(search::match_expression)
        .ok_or_else(|| anyhow::anyhow!("nothing to match in '{}'", query))?;

    let (min_year, max_year) = match (from, to, ctx.repo.year_bounds()?) {
        (Some(from), Some(to), _) => (from, to),
        (from, to, Some((lo, hi))) => (from.unwrap_or(lo), to.unwrap_or(hi)),
        _ => {
            println!("{} Archive is empty", style("!").yellow());
            return Ok(());
        }
    };

    let counts = ctx
        .repo
        .search_counts_by_jurisdiction_year(&filter, &match_expr)?;
    let matrix = analytics::mentions_matrix(min_year, max_year, &counts, |jurisdiction, year| {
        ctx.repo.exists(jurisdiction, year).unwrap_or(false)
    });

    if json {
        println!("{}", serde_json::to_string_pretty(&matrix)?);
        return Ok(());
    }
    if csv {
        println!("{}", matrix.to_csv());
        return Ok(());
    }

    println!(
        "{} Mentions of '{}' {}-{}",
        style("✓").green(),
        query,
        min_year,
        max_year
    );
    for (jurisdiction, years) in &matrix.cells {
        let row = (min_year..=max_year)
            .map(|year| match years.get(&year).copied() {
                Some(NEVER_PUBLISHED) => "  .".to_string(),
                Some(NOT_IN_ARCHIVE) => "  ?".to_string(),
                Some(count) => format!("{:3}", count),
                None => "  .".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        println!("  {:<22} {}", jurisdiction, row);
    }
    println!("  (. = no report published, ? = report not in archive)");
    Ok(())
}
