//! Search and suggest commands.

use console::style;

use super::AppContext;
use crate::search::{self, SearchRequest, PAGE_SIZE};

/// Run a ranked search and print one page of results.
pub fn cmd_search(
    ctx: &AppContext,
    query: &str,
    page: usize,
    jurisdiction: Option<String>,
    from: Option<i32>,
    to: Option<i32>,
) -> anyhow::Result<()> {
    let request = SearchRequest {
        q: Some(query.to_string()),
        page: Some(page),
        jurisdiction,
        min_year: from,
        max_year: to,
    };
    let filter = search::build_filter(&request);
    let results = ctx.repo.search(&filter)?;

    if results.total == 0 {
        println!("{} No matches", style("!").yellow());
        return Ok(());
    }

    let pages = results.total.div_ceil(PAGE_SIZE as u64);
    println!(
        "{} {} matching pages (page {} of {})",
        style("✓").green(),
        results.total,
        filter.page,
        pages
    );

    for hit in &results.hits {
        println!(
            "\n{} {} {}, Seite {}",
            style("→").cyan(),
            style(&hit.jurisdiction).bold(),
            hit.year,
            hit.page.page_number
        );
        for snippet in &hit.snippets {
            println!("  ...{}...", snippet.replace("<b>", "").replace("</b>", ""));
        }
    }

    // Year histogram, most matches first.
    let mut years: Vec<(&i32, &u64)> = results.year_counts.iter().collect();
    years.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    let histogram = years
        .iter()
        .take(8)
        .map(|(year, count)| format!("{}: {}", year, count))
        .collect::<Vec<_>>()
        .join(", ");
    if !histogram.is_empty() {
        println!("\n  By year: {}", histogram);
    }
    Ok(())
}

/// Print completion suggestions for a partial query.
pub fn cmd_suggest(ctx: &AppContext, query: &str) -> anyhow::Result<()> {
    let suggestions = ctx.repo.suggest(query)?;
    if suggestions.is_empty() {
        println!("{} No suggestions", style("!").yellow());
        return Ok(());
    }
    for suggestion in suggestions {
        println!("{}", suggestion);
    }
    Ok(())
}
