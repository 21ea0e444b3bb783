//! PDF ingestion: one [`Document`] per page, in page order.

use super::types::{Document, IngestionError};
use std::path::Path;

/// Load `path` and extract the text of every page.
///
/// Pages are numbered from 0. A page whose text cannot be extracted is kept with empty text so
/// that page numbering stays aligned with the PDF.
pub fn load_pages(path: &Path) -> Result<Vec<Document>, IngestionError> {
    let bytes = std::fs::read(path).map_err(|source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let pdf = lopdf::Document::load_mem(&bytes).map_err(|error| IngestionError::Parse {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;

    let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(IngestionError::Empty(path.to_path_buf()));
    }

    let documents: Vec<Document> = page_numbers
        .iter()
        .enumerate()
        .map(|(page, number)| {
            let text = pdf.extract_text(&[*number]).unwrap_or_else(|error| {
                tracing::warn!(page, error = %error, "Failed to extract page text");
                String::new()
            });
            Document { page, text }
        })
        .collect();

    tracing::debug!(
        path = %path.display(),
        pages = documents.len(),
        chars = documents.iter().map(|doc| doc.text.len()).sum::<usize>(),
        "PDF loaded"
    );
    Ok(documents)
}
