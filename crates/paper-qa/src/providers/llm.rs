//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::error::Result;
use crate::generation::ChatMessage;

/// Trait for chat-completion backends
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (llama3.2, phi3, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a conversation and return the assistant's reply
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
