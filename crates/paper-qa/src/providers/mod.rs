//! Provider abstractions for embeddings and LLM
//!
//! Trait-based seams so the pipeline can run against Ollama or test doubles.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::{same_provider, EmbeddingProvider};
pub use llm::LlmProvider;
pub use ollama::{ollama_providers, OllamaEmbedder, OllamaLlm};
