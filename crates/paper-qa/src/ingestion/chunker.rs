//! Sliding-window text chunking over grapheme clusters

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Header of the human-readable document list
pub const DOC_STRING_HEADER: &str = "Available Documents:";

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Window size in grapheme clusters
    chunk_size: usize,
    /// Graphemes shared by consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be positive".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split a document into overlapping windows
    pub fn split(&self, doc: &Document) -> Vec<Chunk> {
        let text = doc.text.as_str();
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every grapheme boundary, including the end of the text
        let mut bounds: Vec<usize> = text.grapheme_indices(true).map(|(i, _)| i).collect();
        bounds.push(text.len());
        let graphemes = bounds.len() - 1;

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(graphemes);
            chunks.push(Chunk::content(
                doc,
                chunks.len() as u32,
                bounds[start],
                bounds[end],
            ));

            if end == graphemes {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Split every document of every batch
    pub fn split_all(&self, batches: &[Vec<Document>]) -> Vec<Vec<Chunk>> {
        batches
            .iter()
            .map(|docs| docs.iter().flat_map(|doc| self.split(doc)).collect())
            .collect()
    }
}

/// Derive the "Available Documents" list plus the extra chunks to index:
/// the list itself first, then one metadata chunk per non-empty batch.
pub fn summarize(chunks_per_doc: &[Vec<Chunk>]) -> (Vec<Chunk>, String) {
    let mut metadata = Vec::new();
    let mut doc_string = DOC_STRING_HEADER.to_string();

    for chunks in chunks_per_doc {
        let Some(first) = chunks.first() else {
            continue;
        };
        metadata.push(Chunk::metadata_for(&first.metadata.document));
        doc_string.push_str(&doc_string_line(first.title()));
    }

    if metadata.is_empty() {
        return (metadata, doc_string);
    }

    let mut extra = Vec::with_capacity(metadata.len() + 1);
    extra.push(Chunk::catalog(doc_string.clone()));
    extra.extend(metadata);
    (extra, doc_string)
}

/// The document-list line for one paper
pub fn doc_string_line(title: &str) -> String {
    format!("\n - {}", title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::paper;
    use crate::types::ChunkKind;

    /// Rebuild the text from the first chunk plus each later chunk's tail past the previous end
    fn reconstruct(doc: &Document, chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0usize;
        for chunk in chunks {
            let (start, end) = (chunk.metadata.start, chunk.metadata.end);
            assert!(start <= covered, "gap before chunk at {}", start);
            out.push_str(&doc.text[covered.max(start)..end]);
            covered = end;
        }
        out
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(matches!(TextChunker::new(100, 100), Err(Error::Config(_))));
        assert!(matches!(TextChunker::new(0, 0), Err(Error::Config(_))));
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_window_positions() {
        let chunker = TextChunker::new(10, 3).unwrap();
        let doc = paper("p", "P", &"abcdefghij".repeat(3));
        let chunks = chunker.split(&doc);

        let spans: Vec<(usize, usize)> = chunks
            .iter()
            .map(|c| (c.metadata.start, c.metadata.end))
            .collect();
        assert_eq!(spans, vec![(0, 10), (7, 17), (14, 24), (21, 30)]);
        assert!(chunks.iter().all(|c| c.metadata.kind == ChunkKind::Content));
        assert_eq!(chunks[3].metadata.chunk_index, Some(3));
    }

    #[test]
    fn test_coverage_reconstructs_text() {
        let chunker = TextChunker::new(37, 11).unwrap();
        let text = "Transformers replace recurrence with attention. ".repeat(20);
        let doc = paper("p", "P", &text);
        let chunks = chunker.split(&doc);

        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&doc, &chunks), doc.text);
    }

    #[test]
    fn test_multibyte_graphemes_stay_whole() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let doc = paper("p", "P", "née🧑‍🔬e\u{301}ab");
        let chunks = chunker.split(&doc);

        assert_eq!(reconstruct(&doc, &chunks), doc.text);
        assert_eq!(chunks[0].text.graphemes(true).count(), 4);
        assert!(chunks[0].text.ends_with("🧑‍🔬"));
    }

    #[test]
    fn test_short_and_empty_text() {
        let chunker = TextChunker::new(1000, 100).unwrap();
        let short = chunker.split(&paper("p", "P", "tiny"));
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].text, "tiny");

        assert!(chunker.split(&paper("p", "P", "")).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let chunker = TextChunker::new(16, 4).unwrap();
        let doc = paper("p", "P", &"retrieval augmented generation ".repeat(5));
        assert_eq!(chunker.split(&doc), chunker.split(&doc));
    }

    #[test]
    fn test_summarize() {
        let chunker = TextChunker::new(50, 5).unwrap();
        let batches = vec![
            vec![paper("a", "Paper A", "alpha text")],
            vec![],
            vec![paper("b", "Paper B", "beta text")],
        ];
        let chunks = chunker.split_all(&batches);
        let (extra, doc_string) = summarize(&chunks);

        assert_eq!(doc_string, "Available Documents:\n - Paper A\n - Paper B");
        assert_eq!(extra.len(), 3);
        assert_eq!(extra[0].text, doc_string);
        assert!(extra.iter().all(|c| c.metadata.kind == ChunkKind::Metadata));
        assert_eq!(extra[1].paper_id(), "a");
        assert_eq!(extra[2].paper_id(), "b");
    }

    #[test]
    fn test_summarize_without_documents() {
        let (extra, doc_string) = summarize(&[vec![], vec![]]);
        assert!(extra.is_empty());
        assert_eq!(doc_string, DOC_STRING_HEADER);
    }
}
