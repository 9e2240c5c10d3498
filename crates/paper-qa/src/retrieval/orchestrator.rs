//! Search, reorder and serialize retrieved chunks for the prompt

use std::collections::VecDeque;

use crate::error::Result;
use crate::types::Chunk;

use super::index::VectorIndex;

/// Reorder ranked chunks so the strongest sit at both ends of the list.
///
/// `[c1, c2, c3, c4, c5]` becomes `[c1, c3, c5, c4, c2]`.
pub fn reorder_documents<T>(ranked: Vec<T>) -> Vec<T> {
    let mut reordered = VecDeque::with_capacity(ranked.len());
    for (i, item) in ranked.into_iter().rev().enumerate() {
        if i % 2 == 0 {
            reordered.push_front(item);
        } else {
            reordered.push_back(item);
        }
    }
    reordered.into()
}

/// Render chunks as quoted passages, one per line
pub fn docs_to_string(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[Quote from {}] {}\n", c.title(), c.text))
        .collect()
}

/// Search an index snapshot and return the reordered, serialized passages
pub async fn retrieve(index: &VectorIndex, query: &str, k: usize) -> Result<String> {
    let ranked: Vec<Chunk> = index
        .search(query, k)
        .await?
        .into_iter()
        .map(|r| r.chunk)
        .collect();

    tracing::debug!("Retrieved {} passages", ranked.len());
    Ok(docs_to_string(&reorder_documents(ranked)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chunk, HashingEmbedder};
    use std::sync::Arc;

    #[test]
    fn test_reorder_five() {
        let reordered = reorder_documents(vec!["c1", "c2", "c3", "c4", "c5"]);
        assert_eq!(reordered, vec!["c1", "c3", "c5", "c4", "c2"]);
    }

    #[test]
    fn test_reorder_small_inputs() {
        assert!(reorder_documents(Vec::<u8>::new()).is_empty());
        assert_eq!(reorder_documents(vec![1]), vec![1]);
        assert_eq!(reorder_documents(vec![1, 2]), vec![2, 1]);
        assert_eq!(reorder_documents(vec![1, 2, 3, 4]), vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_docs_to_string() {
        let chunks = vec![
            chunk("a", "Paper A", "first passage"),
            chunk("b", "Paper B", "second passage"),
        ];
        assert_eq!(
            docs_to_string(&chunks),
            "[Quote from Paper A] first passage\n[Quote from Paper B] second passage\n"
        );
        assert_eq!(docs_to_string(&[]), "");
    }

    #[tokio::test]
    async fn test_retrieve_empty_index() {
        let index = VectorIndex::empty(Arc::new(HashingEmbedder::new(32)));
        assert_eq!(retrieve(&index, "question", 4).await.unwrap(), "");
    }
}
