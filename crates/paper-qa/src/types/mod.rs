//! Core types for the paper QA service

pub mod document;
pub mod request;
pub mod response;

pub use document::{Chunk, ChunkKind, ChunkMetadata, Document, DocumentMetadata};
pub use request::{AddPaperRequest, ChatRequest, FeedbackRequest};
pub use response::{
    ChatResponse, FeedbackStats, MessageResponse, PaperAddedResponse, PaperInfo, PapersResponse,
};
