//! Request bodies accepted by the HTTP API

use serde::{Deserialize, Serialize};

/// POST /chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question
    pub text: String,
}

/// POST /papers/add
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPaperRequest {
    /// arXiv identifier, e.g. `2301.00001`
    pub paper_id: String,
}

/// POST /feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Question that was asked
    pub question: String,
    /// Answer that was shown
    pub answer: String,
    /// `like` or `dislike` (other values are stored but not counted)
    pub feedback_type: String,
}
