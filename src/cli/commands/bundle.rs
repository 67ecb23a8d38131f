//! Bundle synchronization command.

use console::style;

use super::AppContext;
use crate::archive::{self, SyncOutcome};

/// Synchronize the PDF and text bundles. With neither flag set, both are
/// synced.
pub fn cmd_bundle(ctx: &AppContext, force: bool, pdfs: bool, texts: bool) -> anyhow::Result<()> {
    let both = !pdfs && !texts;
    let zip_dir = ctx.settings.zip_dir();

    if pdfs || both {
        let outcome = archive::sync_pdf_bundle(&ctx.settings.pdf_dir(), &zip_dir, force)?;
        match outcome {
            SyncOutcome::Rebuilt(n) => {
                println!("{} PDF bundle rebuilt with {} files", style("✓").green(), n)
            }
            SyncOutcome::Appended(n) => {
                println!("{} PDF bundle: {} new files appended", style("✓").green(), n)
            }
            SyncOutcome::UpToDate => {
                println!("{} PDF bundle already up to date", style("✓").green())
            }
        }
    }

    if texts || both {
        let total = archive::build_text_bundle(&ctx.repo, &zip_dir)?;
        println!(
            "{} Text bundle rebuilt with {} documents",
            style("✓").green(),
            total
        );
    }

    Ok(())
}
