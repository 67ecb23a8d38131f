//! Ingestion pipeline: PDF files on disk into indexed documents.
//!
//! One file flows through rasterize → extract+clean text → encode page
//! images → count tokens → atomic bundle insert. The batch driver globs
//! the PDF directory, logs per-file failures and keeps going.

use std::path::Path;

use anyhow::Context;
use globset::Glob;
use tracing::{info, warn};

use crate::config::Settings;
use crate::models::{DocumentBundle, NewPage};
use crate::pdf;
use crate::repository::DocumentRepository;
use crate::text;
use crate::{images, reports};

/// Filename stems ending in these suffixes are companion editions
/// (English translations, summaries, parliament-only versions), not the
/// main annual report.
const SKIP_SUFFIXES: &[&str] = &["_en", "kurzfassung", "_parl"];

/// Result of looking at one PDF file.
#[derive(Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Document ingested under this file URL.
    Ingested(String),
    /// Already present in the archive.
    AlreadyPresent,
    /// Companion edition, filtered by stem suffix.
    SkippedCompanion,
    /// Stem carries no parseable year.
    SkippedUnparseable,
}

/// Metadata parsed from a report filename.
#[derive(Debug, PartialEq, Eq)]
pub struct ReportFileMeta {
    pub jurisdiction: String,
    pub year: i32,
    pub title: String,
    pub file_url: String,
}

/// Parse jurisdiction, year and title out of a filename like
/// `vsbericht-by-2004.pdf`.
///
/// The jurisdiction code is the second hyphen-delimited stem segment,
/// the year the last one. Files without a numeric final segment are not
/// reports and yield `None`.
pub fn parse_filename(file_name: &str) -> Option<ReportFileMeta> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let segments: Vec<&str> = stem.split('-').collect();

    let year: i32 = segments.last()?.parse().ok()?;
    let jurisdiction = segments
        .get(1)
        .map(|code| reports::jurisdiction_for_code(code))
        .unwrap_or(reports::FEDERAL)
        .to_string();

    Some(ReportFileMeta {
        jurisdiction,
        year,
        title: format!("Verfassungsschutzbericht {}", year),
        file_url: format!("/pdfs/{}", file_name),
    })
}

/// Whether a stem names a companion edition rather than the main report.
pub fn is_companion_edition(stem: &str) -> bool {
    let stem = stem.to_lowercase();
    SKIP_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix))
}

/// Ingest a single PDF file into the archive.
///
/// The document, its pages and its token counts become visible in one
/// transaction, after all page images are on disk. Page text is cleaned
/// before indexing; the raw PDF is left untouched.
pub async fn ingest_file(
    repo: &DocumentRepository,
    settings: &Settings,
    pdf_path: &Path,
) -> anyhow::Result<IngestOutcome> {
    let file_name = pdf_path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name: {}", pdf_path.display()))?
        .to_string();
    let stem = Path::new(&file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&file_name)
        .to_string();

    if is_companion_edition(&stem) {
        info!(file = %file_name, "skipping companion edition");
        return Ok(IngestOutcome::SkippedCompanion);
    }

    let meta = match parse_filename(&file_name) {
        Some(meta) => meta,
        None => {
            warn!(file = %file_name, "no year in filename, skipping");
            return Ok(IngestOutcome::SkippedUnparseable);
        }
    };

    if repo.get_by_file_url(&meta.file_url)?.is_some() {
        return Ok(IngestOutcome::AlreadyPresent);
    }

    // One decode pass for the whole document.
    let rasterized = pdf::rasterize(pdf_path, settings.render_dpi)?;
    let num_pages = rasterized.page_images.len();

    let mut page_texts = Vec::with_capacity(num_pages);
    for page_num in 1..=num_pages as u32 {
        let raw = pdf::extract_page_text(pdf_path, page_num)?;
        page_texts.push(text::normalize_page_text(&raw));
    }

    images::save_page_images(rasterized.page_images, &settings.images_dir(), &stem).await?;

    let pages = page_texts
        .iter()
        .enumerate()
        .map(|(index, content)| NewPage {
            content: content.clone(),
            file_url: format!("/images/{}_{}.jpg", stem, index),
        })
        .collect();

    let mut token_counts: Vec<(String, i64)> =
        text::count_tokens(&page_texts).into_iter().collect();
    token_counts.sort();

    let bundle = DocumentBundle {
        year: meta.year,
        title: meta.title,
        jurisdiction: meta.jurisdiction,
        file_url: meta.file_url.clone(),
        pages,
        token_counts,
    };
    repo.insert_bundle(&bundle)?;

    info!(
        file = %file_name,
        jurisdiction = %bundle.jurisdiction,
        year = bundle.year,
        pages = num_pages,
        "document ingested"
    );
    Ok(IngestOutcome::Ingested(meta.file_url))
}

/// Totals of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ingest every PDF in the data directory matching a glob pattern.
///
/// A failing file is logged and counted; the batch continues with the
/// next one.
pub async fn ingest_matching(
    repo: &DocumentRepository,
    settings: &Settings,
    pattern: &str,
) -> anyhow::Result<BatchReport> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("invalid glob pattern: {}", pattern))?
        .compile_matcher();

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(settings.pdf_dir())? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if matcher.is_match(name) {
                candidates.push(path);
            }
        }
    }
    candidates.sort();

    let mut report = BatchReport::default();
    for path in &candidates {
        match ingest_file(repo, settings, path).await {
            Ok(IngestOutcome::Ingested(_)) => report.ingested += 1,
            Ok(_) => report.skipped += 1,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "ingestion failed");
                report.failed += 1;
            }
        }
    }

    info!(
        ingested = report.ingested,
        skipped = report.skipped,
        failed = report.failed,
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_regular_filename() {
        let meta = parse_filename("vsbericht-by-2004.pdf").unwrap();
        assert_eq!(meta.jurisdiction, "Bayern");
        assert_eq!(meta.year, 2004);
        assert_eq!(meta.title, "Verfassungsschutzbericht 2004");
        assert_eq!(meta.file_url, "/pdfs/vsbericht-by-2004.pdf");
    }

    #[test]
    fn test_unknown_code_falls_back_to_federal() {
        let meta = parse_filename("vsbericht-2001.pdf").unwrap();
        assert_eq!(meta.jurisdiction, "Bund");
        assert_eq!(meta.year, 2001);
    }

    #[test]
    fn test_filename_without_year_is_rejected() {
        assert_eq!(parse_filename("vsbericht-by-draft.pdf"), None);
        assert_eq!(parse_filename("notes.pdf"), None);
    }

    #[test]
    fn test_companion_editions_are_detected() {
        assert!(is_companion_edition("vsbericht-2004_en"));
        assert!(is_companion_edition("vsbericht-he-1999-kurzfassung"));
        assert!(is_companion_edition("vsbericht-th-2012_parl"));
        assert!(!is_companion_edition("vsbericht-by-2004"));
    }
}
