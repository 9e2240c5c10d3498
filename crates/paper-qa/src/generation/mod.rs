//! Prompt rendering and the Ollama client

pub mod ollama;
pub mod prompt;

pub use ollama::OllamaClient;
pub use prompt::{ChatMessage, ChatPrompt, PromptVariables, Role, DEFAULT_SYSTEM_MESSAGE};
