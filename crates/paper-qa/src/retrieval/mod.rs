//! Vector indexes and context retrieval

pub mod index;
mod orchestrator;

pub use index::{
    build_default, build_per_document, cosine_similarity, ScoredChunk, SharedIndex, VectorIndex,
};
pub use orchestrator::{docs_to_string, reorder_documents, retrieve};
