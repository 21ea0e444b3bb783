//! Fixed-size sliding-window chunking over page text.
//!
//! Windows are measured in characters (Unicode scalar values) and advance by
//! `chunk_size - overlap`, so adjacent chunks of a page share exactly `overlap` characters. Each
//! page is windowed on its own; a chunk never carries text from two pages.

use super::types::{Chunk, ChunkingError, Document};

/// Split every document into overlapping windows, preserving page order.
///
/// Pages containing only whitespace produce no chunks.
pub fn chunk_documents(
    documents: &[Document],
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    validate_window(chunk_size, overlap)?;

    let mut chunks = Vec::new();
    for document in documents {
        if document.text.trim().is_empty() {
            tracing::trace!(page = document.page, "Skipping blank page");
            continue;
        }
        chunks.extend(
            split_text(&document.text, chunk_size, overlap)
                .into_iter()
                .enumerate()
                .map(|(index, text)| Chunk {
                    page: document.page,
                    index,
                    text,
                }),
        );
    }
    Ok(chunks)
}

fn validate_window(chunk_size: usize, overlap: usize) -> Result<(), ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::OverlapTooLarge {
            chunk_size,
            overlap,
        });
    }
    Ok(())
}

fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    // Byte offset of every char boundary, including the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;
    let step = chunk_size - overlap;

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        windows.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == char_count {
            break;
        }
        start += step;
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: usize, text: &str) -> Document {
        Document {
            page,
            text: text.to_string(),
        }
    }

    fn char_prefix(text: &str, count: usize) -> String {
        text.chars().take(count).collect()
    }

    fn char_suffix(text: &str, count: usize) -> String {
        let total = text.chars().count();
        text.chars().skip(total - count).collect()
    }

    #[test]
    fn short_page_is_single_chunk() {
        let chunks = chunk_documents(&[page(0, "tiny")], 1000, 200).expect("chunks");
        assert_eq!(
            chunks,
            vec![Chunk {
                page: 0,
                index: 0,
                text: "tiny".into()
            }]
        );
    }

    #[test]
    fn adjacent_chunks_share_exactly_the_overlap() {
        let text: String = (0..2600).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_documents(&[page(3, &text)], 1000, 200).expect("chunks");

        assert_eq!(chunks.len(), 3);
        for pair in chunks.windows(2) {
            assert_eq!(char_suffix(&pair[0].text, 200), char_prefix(&pair[1].text, 200));
        }
        assert!(chunks.iter().all(|chunk| chunk.text.chars().count() <= 1000));
        assert_eq!(chunks.last().map(|c| c.text.chars().count()), Some(1000));
    }

    #[test]
    fn chunks_never_span_pages() {
        let first = "A".repeat(1500);
        let second = "B".repeat(700);
        let chunks =
            chunk_documents(&[page(0, &first), page(1, &second)], 1000, 200).expect("chunks");

        assert_eq!(chunks.len(), 3);
        assert!(chunks[..2].iter().all(|c| c.page == 0 && !c.text.contains('B')));
        assert_eq!(chunks[2].page, 1);
        assert_eq!(chunks[2].index, 0);
        assert!(!chunks[2].text.contains('A'));
    }

    #[test]
    fn chunking_is_deterministic() {
        let documents = vec![
            page(0, &"lorem ipsum dolor ".repeat(120)),
            page(1, &"sit amet ".repeat(90)),
        ];
        let first = chunk_documents(&documents, 500, 50).expect("chunks");
        let second = chunk_documents(&documents, 500, 50).expect("chunks");
        assert_eq!(first, second);
    }

    #[test]
    fn blank_pages_produce_nothing() {
        let chunks =
            chunk_documents(&[page(0, "  \n\t "), page(1, "")], 1000, 200).expect("chunks");
        assert!(chunks.is_empty());
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "é".repeat(25);
        let chunks = chunk_documents(&[page(0, &text)], 10, 3).expect("chunks");
        assert!(chunks.iter().all(|chunk| chunk.text.chars().all(|c| c == 'é')));
        assert_eq!(chunks[0].text.chars().count(), 10);
        for pair in chunks.windows(2) {
            assert_eq!(char_suffix(&pair[0].text, 3), char_prefix(&pair[1].text, 3));
        }
    }

    #[test]
    fn invalid_windows_are_rejected() {
        assert_eq!(
            chunk_documents(&[page(0, "x")], 0, 0),
            Err(ChunkingError::InvalidChunkSize)
        );
        assert_eq!(
            chunk_documents(&[page(0, "x")], 100, 100),
            Err(ChunkingError::OverlapTooLarge {
                chunk_size: 100,
                overlap: 100
            })
        );
    }
}
