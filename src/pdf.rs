//! PDF collaborators: text extraction and page rasterization via the
//! poppler command line tools (`pdftotext`, `pdftoppm`, `pdfinfo`).

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle command output, extracting stdout on success or returning an
/// appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix, stderr
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// All rasterized pages of one document, kept alive by the temp dir the
/// images were rendered into.
pub struct RasterizedPdf {
    _temp_dir: TempDir,
    /// Page image paths in page order (index 0 is page 1).
    pub page_images: Vec<PathBuf>,
}

/// Get the page count of a PDF via `pdfinfo`.
pub fn page_count(pdf_path: &Path) -> Result<u32, ExtractionError> {
    let stdout = handle_cmd_output(
        Command::new("pdfinfo").arg(pdf_path).output(),
        "pdfinfo (install poppler-utils)",
        "pdfinfo failed",
    )?;

    for line in stdout.lines() {
        if line.starts_with("Pages:") {
            if let Some(count) = line.split_whitespace().nth(1).and_then(|s| s.parse().ok()) {
                return Ok(count);
            }
        }
    }
    Err(ExtractionError::ExtractionFailed(format!(
        "pdfinfo reported no page count for {}",
        pdf_path.display()
    )))
}

/// Extract the raw text of a single page (1-based) via `pdftotext`.
pub fn extract_page_text(pdf_path: &Path, page: u32) -> Result<String, ExtractionError> {
    let page_str = page.to_string();
    let output = Command::new("pdftotext")
        .args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
        .arg(pdf_path)
        .arg("-") // Output to stdout
        .output();

    handle_cmd_output(
        output,
        "pdftotext (install poppler-utils)",
        &format!("pdftotext failed on page {}", page),
    )
}

/// Rasterize every page of a PDF in a single `pdftoppm` run.
///
/// Decoding the whole document once is much faster than re-opening it per
/// page. Returns the rendered page images in page order.
pub fn rasterize(pdf_path: &Path, dpi: u32) -> Result<RasterizedPdf, ExtractionError> {
    let pages = page_count(pdf_path)?;

    let temp_dir = TempDir::new()?;
    let status = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string()])
        .arg(pdf_path)
        .arg(temp_dir.path().join("page"))
        .status();

    match status {
        Ok(s) if s.success() => {}
        Ok(_) => {
            return Err(ExtractionError::ExtractionFailed(format!(
                "pdftoppm failed to convert {}",
                pdf_path.display()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractionError::ToolNotFound(
                "pdftoppm (install poppler-utils)".to_string(),
            ))
        }
        Err(e) => return Err(ExtractionError::Io(e)),
    }

    let mut page_images = Vec::with_capacity(pages as usize);
    for page_num in 1..=pages {
        let path = find_page_image(temp_dir.path(), page_num).ok_or_else(|| {
            ExtractionError::ExtractionFailed(format!(
                "pdftoppm produced no image for page {} of {}",
                page_num,
                pdf_path.display()
            ))
        })?;
        page_images.push(path);
    }

    Ok(RasterizedPdf {
        _temp_dir: temp_dir,
        page_images,
    })
}

/// Locate the image pdftoppm wrote for a page.
///
/// pdftoppm zero-pads page numbers to the width of the last page, so
/// `page-3.png`, `page-03.png` and `page-003.png` are all possible.
fn find_page_image(temp_path: &Path, page_num: u32) -> Option<PathBuf> {
    for digits in [1, 2, 3, 4] {
        let filename = format!("page-{:0width$}.png", page_num, width = digits);
        let path = temp_path.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_page_image_padding() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("page-07.png"), b"x").unwrap();
        assert_eq!(
            find_page_image(dir.path(), 7),
            Some(dir.path().join("page-07.png"))
        );
        assert_eq!(find_page_image(dir.path(), 8), None);
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let result = handle_cmd_output(
            Command::new("definitely-not-a-real-binary-2718").output(),
            "definitely-not-a-real-binary-2718",
            "should not run",
        );
        assert!(matches!(result, Err(ExtractionError::ToolNotFound(_))));
    }
}
