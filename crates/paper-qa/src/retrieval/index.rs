//! In-memory vector indexes with copy-on-write snapshots

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{same_provider, EmbeddingProvider};
use crate::types::Chunk;

/// A chunk together with its embedding
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Search result with similarity score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub similarity: f32,
}

/// Immutable snapshot of embedded chunks, bound to one embedding provider
///
/// Search is exact (brute-force cosine); results are ordered by similarity with
/// ties broken by insertion order.
#[derive(Clone)]
pub struct VectorIndex {
    provider: Arc<dyn EmbeddingProvider>,
    records: Vec<Arc<IndexedChunk>>,
}

impl VectorIndex {
    /// Empty index bound to a provider
    pub fn empty(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            records: Vec::new(),
        }
    }

    /// Embed `chunks` and build a new index
    pub async fn build(provider: Arc<dyn EmbeddingProvider>, chunks: Vec<Chunk>) -> Result<Self> {
        Self::empty(provider).extend(chunks).await
    }

    /// New index holding this index's records plus `chunks`; only the new chunks are embedded
    pub async fn extend(&self, chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Ok(self.clone());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.provider.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                self.provider.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = self.provider.dimensions();
        let mut records = self.records.clone();
        records.reserve(chunks.len());

        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            if embedding.len() != dimensions {
                return Err(Error::embedding(format!(
                    "embedding has {} dimensions, provider declares {}",
                    embedding.len(),
                    dimensions
                )));
            }
            records.push(Arc::new(IndexedChunk { chunk, embedding }));
        }

        Ok(Self {
            provider: Arc::clone(&self.provider),
            records,
        })
    }

    /// Merge indexes without re-embedding; every input must share `provider`
    pub fn aggregate(provider: Arc<dyn EmbeddingProvider>, indexes: &[VectorIndex]) -> Result<Self> {
        let mut records = Vec::with_capacity(indexes.iter().map(VectorIndex::len).sum());

        for index in indexes {
            if !same_provider(&provider, &index.provider) {
                return Err(Error::index(format!(
                    "cannot aggregate an index built with a different embedding provider ({})",
                    index.provider.name()
                )));
            }
            records.extend(index.records.iter().cloned());
        }

        Ok(Self { provider, records })
    }

    /// Embed the query and return the `k` most similar chunks
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if self.records.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.provider.embed(query).await?;
        self.search_by_vector(&query_embedding, k)
    }

    /// Return the `k` chunks most similar to an already-embedded query
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.provider.dimensions() {
            return Err(Error::embedding(format!(
                "query embedding has {} dimensions, provider declares {}",
                query.len(),
                self.provider.dimensions()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (i, cosine_similarity(query, &r.embedding)))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| ScoredChunk {
                chunk: self.records[i].chunk.clone(),
                similarity,
            })
            .collect())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The provider this index is bound to
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Iterate over stored chunks in insertion order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.records.iter().map(|r| &r.chunk)
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("provider", &self.provider.name())
            .field("records", &self.records.len())
            .finish()
    }
}

/// Cosine similarity; zero when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0f32, 0f32, 0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Empty index bound to the provider
pub fn build_default(provider: Arc<dyn EmbeddingProvider>) -> VectorIndex {
    VectorIndex::empty(provider)
}

/// One index per document, seeded with its content chunks and its metadata chunk.
///
/// Metadata chunks are matched to documents by paper id. Extra chunks that belong to
/// no document (the document list) form a leading index of their own.
pub async fn build_per_document(
    provider: Arc<dyn EmbeddingProvider>,
    chunks_per_doc: Vec<Vec<Chunk>>,
    extra_chunks: &[Chunk],
) -> Result<Vec<VectorIndex>> {
    let mut indexes = Vec::with_capacity(chunks_per_doc.len() + 1);

    let doc_ids: HashSet<String> = chunks_per_doc
        .iter()
        .filter_map(|chunks| chunks.first())
        .map(|c| c.paper_id().to_string())
        .collect();
    let shared: Vec<Chunk> = extra_chunks
        .iter()
        .filter(|c| !doc_ids.contains(c.paper_id()))
        .cloned()
        .collect();
    if !shared.is_empty() {
        indexes.push(VectorIndex::build(Arc::clone(&provider), shared).await?);
    }

    for mut chunks in chunks_per_doc {
        let Some(paper_id) = chunks.first().map(|c| c.paper_id().to_string()) else {
            continue;
        };
        chunks.extend(
            extra_chunks
                .iter()
                .filter(|c| c.paper_id() == paper_id)
                .cloned(),
        );

        let count = chunks.len();
        let index = VectorIndex::build(Arc::clone(&provider), chunks).await?;
        tracing::debug!("Indexed {} chunks for {}", count, paper_id);
        indexes.push(index);
    }

    Ok(indexes)
}

/// A live index that readers snapshot and a single writer replaces
pub struct SharedIndex {
    current: RwLock<Arc<VectorIndex>>,
    writer: tokio::sync::Mutex<()>,
}

impl SharedIndex {
    /// Wrap an index
    pub fn new(index: VectorIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    /// Current snapshot; never blocks on an in-progress add
    pub fn snapshot(&self) -> Arc<VectorIndex> {
        Arc::clone(&self.current.read())
    }

    /// Embed `chunks` and publish a new snapshot containing them.
    ///
    /// On error the live snapshot is left untouched.
    pub async fn add(&self, chunks: Vec<Chunk>) -> Result<usize> {
        let _guard = self.writer.lock().await;

        let base = self.snapshot();
        let next = base.extend(chunks).await?;
        let len = next.len();

        *self.current.write() = Arc::new(next);
        Ok(len)
    }

    /// Number of records in the current snapshot
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Whether the current snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
