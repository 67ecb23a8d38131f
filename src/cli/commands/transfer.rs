//! Raw-data export and import commands.

use std::path::Path;

use console::style;

use crate::archive;

use super::AppContext;

/// Export all PDFs under the data directory into a tar archive.
pub fn cmd_export(ctx: &AppContext, path: &Path) -> anyhow::Result<()> {
    let total = archive::export_data(&ctx.settings.data_dir, path)?;
    println!(
        "{} Exported {} files to {}",
        style("✓").green(),
        total,
        path.display()
    );
    Ok(())
}

/// Import PDFs from a tar archive into the data directory.
pub fn cmd_import(ctx: &AppContext, path: &Path) -> anyhow::Result<()> {
    let total = archive::import_data(&ctx.settings.data_dir, path)?;
    println!(
        "{} Imported {} files from {}",
        style("✓").green(),
        total,
        path.display()
    );
    if total > 0 {
        println!("  Run 'vsarchiv ingest' to index the new files");
    }
    Ok(())
}
