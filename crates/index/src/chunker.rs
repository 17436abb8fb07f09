//! Chunker/filter: segments in, passages out.
//!
//! Splits page segments into fixed-size windows with an exact overlap
//! between consecutive windows, preferring newline boundaries. Windows
//! shorter than the noise threshold are discarded, and the total passage
//! count is capped with a non-fatal truncation advisory.

use paperchat_core::config::ChunkingConfig;
use paperchat_core::{AppError, AppResult};

use crate::types::{Passage, Segment};

/// Result of chunking one document.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// Qualifying passages, in document order
    pub passages: Vec<Passage>,

    /// Set when the passage cap cut the document short (advisory, non-fatal)
    pub truncated: bool,
}

/// Chunk a loaded document into passages.
///
/// Each segment is windowed independently so every passage keeps its page
/// label; overlap never crosses a page boundary.
///
/// # Errors
/// - `Config` when the overlap is not smaller than the window size
/// - `EmptyDocument` when no window survives the noise threshold
pub fn chunk_document(segments: &[Segment], config: &ChunkingConfig) -> AppResult<ChunkOutcome> {
    // The windowing below only advances when overlap < size; reject the
    // bound here rather than trusting every caller to validate
    if config.chunk_overlap >= config.chunk_size {
        return Err(AppError::Config(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            config.chunk_overlap, config.chunk_size
        )));
    }

    let mut passages = Vec::new();

    for segment in segments {
        for window in split_windows(&segment.text, config.chunk_size, config.chunk_overlap) {
            // Noise filter: drop windows with too little real text
            if window.trim().chars().count() < config.min_passage_chars {
                continue;
            }

            passages.push(Passage {
                text: window,
                page_label: segment.page_label.clone(),
                position: passages.len() as u32,
            });
        }
    }

    if passages.is_empty() {
        return Err(AppError::EmptyDocument);
    }

    let truncated = passages.len() > config.max_passages;
    if truncated {
        tracing::warn!(
            "Document truncated from {} to {} passages",
            passages.len(),
            config.max_passages
        );
        passages.truncate(config.max_passages);
    }

    tracing::info!("Chunking complete: {} passages", passages.len());

    Ok(ChunkOutcome {
        passages,
        truncated,
    })
}

/// Split text into windows of at most `size` characters with an exact
/// `overlap`-character suffix/prefix shared between consecutive windows.
///
/// Window ends prefer the last newline inside the window, but never move
/// into the overlap region (the next window must always advance). All
/// indices are character positions, so multi-byte text is safe.
fn split_windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(overlap < size, "overlap must be smaller than window size");

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    if len == 0 {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut start = 0usize;

    loop {
        let hard_end = (start + size).min(len);
        let mut end = hard_end;

        if hard_end < len {
            // The next window starts at end - overlap, so end must stay
            // strictly past start + overlap.
            let floor = start + overlap + 1;
            if hard_end > floor {
                if let Some(offset) = chars[floor..hard_end].iter().rposition(|&c| c == '\n') {
                    end = floor + offset + 1;
                }
            }
        }

        windows.push(chars[start..end].iter().collect());

        if end >= len {
            break;
        }
        start = end - overlap;
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize, min: usize, cap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            min_passage_chars: min,
            max_passages: cap,
        }
    }

    fn segment(text: &str, page: &str) -> Segment {
        Segment {
            text: text.to_string(),
            page_label: Some(page.to_string()),
        }
    }

    #[test]
    fn test_windows_never_exceed_size() {
        let text = "word ".repeat(200);
        for (size, overlap) in [(50, 10), (64, 0), (100, 37)] {
            for window in split_windows(&text, size, overlap) {
                assert!(window.chars().count() <= size);
            }
        }
    }

    #[test]
    fn test_overlap_region_is_character_identical() {
        let text = "Line one of the document.\nLine two follows here.\n".repeat(30);
        for (size, overlap) in [(80, 20), (120, 37), (64, 1)] {
            let windows = split_windows(&text, size, overlap);
            assert!(windows.len() > 1);
            for pair in windows.windows(2) {
                let prev: Vec<char> = pair[0].chars().collect();
                let next: Vec<char> = pair[1].chars().collect();
                let suffix = &prev[prev.len() - overlap..];
                let prefix = &next[..overlap];
                assert_eq!(suffix, prefix);
            }
        }
    }

    #[test]
    fn test_windows_prefer_newline_boundaries() {
        let text = format!("{}\n{}", "a".repeat(40), "b".repeat(100));
        let windows = split_windows(&text, 60, 10);
        // First window should break at the newline, not at the hard limit
        assert_eq!(windows[0].chars().count(), 41);
        assert!(windows[0].ends_with('\n'));
    }

    #[test]
    fn test_windows_reconstruct_source() {
        // Dropping each window's overlap prefix must reproduce the input
        let text = "The quick brown fox.\njumps over the lazy dog.\n".repeat(20);
        let overlap = 15;
        let windows = split_windows(&text, 70, overlap);

        let mut rebuilt: String = windows[0].clone();
        for window in &windows[1..] {
            rebuilt.extend(window.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        let text = "수식은 아름답다 그리고 유용하다\n".repeat(40);
        let windows = split_windows(&text, 50, 10);
        assert!(windows.len() > 1);
        for window in &windows {
            assert!(window.chars().count() <= 50);
        }
    }

    #[test]
    fn test_chunk_document_noise_filter() {
        let segments = vec![
            segment("tiny", "1"),
            segment(&"substantial passage content here. ".repeat(4), "2"),
        ];
        let outcome = chunk_document(&segments, &config(200, 20, 50, 100)).unwrap();

        assert_eq!(outcome.passages.len(), 1);
        assert_eq!(outcome.passages[0].page_label.as_deref(), Some("2"));
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_chunk_document_rejects_overlap_at_or_above_size() {
        let segments = vec![segment(&"plenty of text to work with here.\n".repeat(5), "1")];

        for overlap in [80, 100] {
            let err = chunk_document(&segments, &config(80, overlap, 20, 100)).unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
        }
    }

    #[test]
    fn test_chunk_document_empty_is_error() {
        let segments = vec![segment("   \n  ", "1"), segment("too short", "2")];
        let err = chunk_document(&segments, &config(200, 20, 50, 100)).unwrap_err();
        assert!(matches!(err, AppError::EmptyDocument));
    }

    #[test]
    fn test_chunk_document_cap_keeps_first_in_order() {
        let segments = vec![segment(&"sentence with enough text to keep.\n".repeat(60), "1")];
        let full = chunk_document(&segments, &config(80, 10, 20, 1000)).unwrap();
        assert!(full.passages.len() > 5);
        assert!(!full.truncated);

        let cap = 5;
        let capped = chunk_document(&segments, &config(80, 10, 20, cap)).unwrap();
        assert_eq!(capped.passages.len(), cap);
        assert!(capped.truncated);

        // Exactly the first `cap` passages, original order
        for (kept, original) in capped.passages.iter().zip(full.passages.iter()) {
            assert_eq!(kept, original);
        }
    }

    #[test]
    fn test_positions_are_sequential() {
        let segments = vec![
            segment(&"first page content with plenty of text.\n".repeat(10), "1"),
            segment(&"second page content with plenty of text.\n".repeat(10), "2"),
        ];
        let outcome = chunk_document(&segments, &config(100, 10, 20, 1000)).unwrap();

        for (i, passage) in outcome.passages.iter().enumerate() {
            assert_eq!(passage.position, i as u32);
        }
    }
}
