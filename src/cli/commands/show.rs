//! Document inspection commands: show, list.

use console::style;

use super::AppContext;
use crate::reports;

/// Show one document by jurisdiction and year, either its metadata or,
/// with `--text`, its full plain text.
pub fn cmd_show(ctx: &AppContext, jurisdiction: &str, year: i32, text: bool) -> anyhow::Result<()> {
    // Accept either the full name or a two-letter code.
    let jurisdiction = if jurisdiction.len() == 2 {
        reports::jurisdiction_for_code(jurisdiction).to_string()
    } else {
        reports::normalize_jurisdiction(jurisdiction)
    };

    let doc = match ctx.repo.get_by_jurisdiction_year(&jurisdiction, year)? {
        Some(doc) => doc,
        None => {
            println!(
                "{} No document for {} {}",
                style("!").yellow(),
                jurisdiction,
                year
            );
            return Ok(());
        }
    };

    if text {
        println!("{}", ctx.repo.document_text(doc.id)?);
        return Ok(());
    }

    let tokens = ctx.repo.token_total(doc.id)?;
    println!("{} {}", style("✓").green(), style(&doc.title).bold());
    println!("  Jurisdiction: {}", doc.jurisdiction);
    println!("  Year:         {}", doc.year);
    println!("  File:         {}", doc.file_url);
    println!("  Pages:        {}", doc.num_pages);
    println!("  Tokens:       {}", tokens);
    Ok(())
}

/// List all documents grouped by jurisdiction.
pub fn cmd_list(ctx: &AppContext) -> anyhow::Result<()> {
    let (index, total) = ctx.repo.get_index()?;
    if total == 0 {
        println!("{} Archive is empty", style("!").yellow());
        return Ok(());
    }

    println!("{} {} documents", style("✓").green(), total);
    for entry in &index {
        if entry.years.is_empty() {
            continue;
        }
        let years = entry
            .years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {:<22} {}", entry.jurisdiction, years);
    }
    Ok(())
}
