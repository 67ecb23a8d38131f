//! Initialize command.

use console::style;

use super::AppContext;

/// Initialize the data directory and database.
pub async fn cmd_init(ctx: &AppContext) -> anyhow::Result<()> {
    // Opening the context already created the directories and schema.
    println!(
        "{} Initialized archive in {}",
        style("✓").green(),
        ctx.settings.data_dir.display()
    );
    println!("  Database: {}", ctx.repo.database_path().display());
    println!("  Drop report PDFs into {}", ctx.settings.pdf_dir().display());
    println!("  Then run: vsarchiv ingest");
    Ok(())
}
