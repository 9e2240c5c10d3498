//! Response bodies returned by the HTTP API

use serde::{Deserialize, Serialize};

/// Public view of a loaded paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperInfo {
    pub id: String,
    pub title: String,
}

/// GET /
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// GET /papers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PapersResponse {
    pub papers: Vec<PaperInfo>,
}

/// POST /papers/add and POST /papers/upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperAddedResponse {
    /// Human-readable outcome
    pub message: String,
    /// All papers loaded after the operation
    pub papers: Vec<PaperInfo>,
}

/// POST /chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// LLM answer
    pub response: String,
    /// Papers the answer could draw on
    pub papers: Vec<PaperInfo>,
}

/// GET /feedback/stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub likes: u64,
    pub dislikes: u64,
}
