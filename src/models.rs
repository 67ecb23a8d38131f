//! Core data model: documents, pages and token counts.

use serde::Serialize;

/// One archived report, covering a single jurisdiction and year.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub year: i32,
    pub title: String,
    pub jurisdiction: String,
    /// Public path of the source PDF, unique per document.
    pub file_url: String,
    pub num_pages: i64,
}

/// One page of a document: normalized text plus the rendered image path.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: i64,
    pub document_id: i64,
    /// 1-based, contiguous per document.
    pub page_number: i64,
    pub content: String,
    /// Public path of the rendered JPEG for this page.
    pub file_url: String,
}

/// Everything belonging to one document, assembled in memory during
/// ingestion and committed in a single transaction.
#[derive(Debug)]
pub struct DocumentBundle {
    pub year: i32,
    pub title: String,
    pub jurisdiction: String,
    pub file_url: String,
    /// Page texts and image paths in page-number order.
    pub pages: Vec<NewPage>,
    pub token_counts: Vec<(String, i64)>,
}

/// A page awaiting insertion; the page number is derived from its
/// position in [`DocumentBundle::pages`].
#[derive(Debug)]
pub struct NewPage {
    pub content: String,
    pub file_url: String,
}

/// One search hit: a matching page with its document metadata and the
/// highlighted snippets produced for it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub page: Page,
    pub year: i32,
    pub jurisdiction: String,
    pub snippets: Vec<String>,
}
