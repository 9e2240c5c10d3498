//! paper-qa: question answering over research papers
//!
//! Papers are fetched from arXiv (or uploaded as PDFs), split into overlapping chunks,
//! embedded with Ollama and kept in in-memory vector indexes. Questions are answered by
//! retrieving passages from the corpus and from earlier conversation turns and passing
//! them to an Ollama chat model.

pub mod config;
pub mod error;
pub mod feedback;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod registry;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::{Error, ErrorKind, Result};
pub use registry::{AddOutcome, LoadedPaper, Registry, RegistryComponents};
pub use types::{Chunk, ChunkKind, Document, DocumentMetadata};
