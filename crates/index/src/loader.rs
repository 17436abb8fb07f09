//! PDF document loader.
//!
//! Reads one PDF into per-page text segments. pdf-extract emits a form
//! feed between pages, which is what carries the page labels downstream.

use std::path::Path;

use paperchat_core::{AppError, AppResult};

use crate::types::Segment;

/// Load a PDF into per-page segments.
///
/// Page labels are 1-based page numbers as strings. Pages whose extracted
/// text is empty are dropped, but numbering is preserved for the rest.
///
/// # Errors
/// - `DocumentNotFound` when the file does not exist
/// - `IndexBuild` when text extraction fails
pub fn load_pdf(path: &Path) -> AppResult<Vec<Segment>> {
    if !path.exists() {
        return Err(AppError::DocumentNotFound(path.to_path_buf()));
    }

    tracing::info!("Loading PDF document: {:?}", path);

    let bytes = std::fs::read(path)?;
    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| AppError::IndexBuild(format!("Failed to extract text from {:?}: {}", path, e)))?;

    let segments = split_pages(&text);

    tracing::info!(
        "Extracted {} non-empty pages from {:?}",
        segments.len(),
        path
    );

    Ok(segments)
}

/// Split extracted text into page segments on form feeds.
///
/// When no form feed is present the whole text becomes page "1".
fn split_pages(text: &str) -> Vec<Segment> {
    if !text.contains('\x0c') {
        if text.trim().is_empty() {
            return Vec::new();
        }
        return vec![Segment {
            text: text.to_string(),
            page_label: Some("1".to_string()),
        }];
    }

    text.split('\x0c')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| Segment {
            text: page.to_string(),
            page_label: Some((i + 1).to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_file_is_document_not_found() {
        let err = load_pdf(&PathBuf::from("no-such-file.pdf")).unwrap_err();
        assert!(matches!(err, AppError::DocumentNotFound(_)));
    }

    #[test]
    fn test_split_pages_with_form_feeds() {
        let segments = split_pages("first page\x0csecond page\x0cthird page");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].page_label.as_deref(), Some("1"));
        assert_eq!(segments[2].page_label.as_deref(), Some("3"));
        assert_eq!(segments[1].text, "second page");
    }

    #[test]
    fn test_split_pages_preserves_numbering_over_blank_pages() {
        let segments = split_pages("first\x0c  \x0cthird");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].page_label.as_deref(), Some("1"));
        assert_eq!(segments[1].page_label.as_deref(), Some("3"));
    }

    #[test]
    fn test_split_pages_without_form_feed() {
        let segments = split_pages("one continuous document");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].page_label.as_deref(), Some("1"));
    }

    #[test]
    fn test_split_pages_empty_text() {
        assert!(split_pages("   ").is_empty());
    }
}
