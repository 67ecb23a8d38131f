//! Corpus mutation commands: ingest, remove, reset.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::AppContext;
use crate::ingest;

/// Ingest every matching PDF from the pdf directory.
pub async fn cmd_ingest(ctx: &AppContext, pattern: &str) -> anyhow::Result<()> {
    println!(
        "{} Ingesting {} from {}",
        style("→").cyan(),
        pattern,
        ctx.settings.pdf_dir().display()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("processing...");

    let report = ingest::ingest_matching(&ctx.repo, &ctx.settings, pattern).await?;
    ctx.totals_cache.invalidate();
    spinner.finish_and_clear();

    println!(
        "{} {} ingested, {} skipped, {} failed",
        style("✓").green(),
        report.ingested,
        report.skipped,
        report.failed
    );
    if report.failed > 0 {
        println!(
            "{} Some files failed; re-run with --verbose for details",
            style("!").yellow()
        );
    }
    Ok(())
}

/// Remove one document and its pages and token counts.
pub fn cmd_remove(ctx: &AppContext, file: &str) -> anyhow::Result<()> {
    let file_url = if file.starts_with('/') {
        file.to_string()
    } else {
        format!("/pdfs/{}", file)
    };
    ctx.repo.delete_by_file_url(&file_url)?;
    ctx.totals_cache.invalidate();
    println!("{} Removed {}", style("✓").green(), file_url);
    Ok(())
}

/// Drop and recreate the entire corpus.
pub fn cmd_reset(ctx: &AppContext, force: bool) -> anyhow::Result<()> {
    let count = ctx.repo.count()?;
    if !force {
        println!(
            "{} This deletes all {} documents. Re-run with --force to confirm.",
            style("!").yellow(),
            count
        );
        return Ok(());
    }
    ctx.repo.reset()?;
    ctx.totals_cache.invalidate();
    println!("{} Corpus reset ({} documents dropped)", style("✓").green(), count);
    Ok(())
}
