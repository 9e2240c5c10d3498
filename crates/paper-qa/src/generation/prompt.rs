//! Chat prompt template

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Default system message; `{context}` is required, the other placeholders are optional.
///
/// The question itself travels as the user message.
pub const DEFAULT_SYSTEM_MESSAGE: &str = r#"You are a research assistant answering questions about a collection of scientific papers.

{documents}

Use the retrieved passages below to answer. Each passage is prefixed with the paper it was quoted from.
If the passages do not contain the answer, say that the loaded papers do not cover it rather than guessing.
Mention the paper titles you rely on.

Earlier turns of this conversation that may be relevant:
{history}

Retrieved passages:
{context}"#;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Values substituted into the template
#[derive(Debug, Clone, Default)]
pub struct PromptVariables<'a> {
    /// User question
    pub input: &'a str,
    /// Serialized conversation-history passages
    pub history: &'a str,
    /// Serialized corpus passages
    pub context: &'a str,
    /// "Available Documents" list
    pub documents: &'a str,
}

/// System + user prompt built from a template
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    template: String,
}

impl ChatPrompt {
    /// Create a prompt from a system-message template
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains("{context}") {
            return Err(Error::Config(
                "prompt template must contain a {context} placeholder".into(),
            ));
        }
        Ok(Self { template })
    }

    /// Render the system and user messages.
    ///
    /// Substitution is single-pass: placeholder-like text inside substituted values is left as is.
    pub fn render(&self, vars: &PromptVariables<'_>) -> Vec<ChatMessage> {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let placeholder = PLACEHOLDER.get_or_init(|| {
            Regex::new(r"\{(input|history|context|documents)\}").expect("valid pattern")
        });

        let system = placeholder.replace_all(&self.template, |caps: &Captures<'_>| {
            match &caps[1] {
                "input" => vars.input,
                "history" => vars.history,
                "context" => vars.context,
                _ => vars.documents,
            }
            .to_string()
        });

        vec![
            ChatMessage::new(Role::System, system),
            ChatMessage::new(Role::User, vars.input),
        ]
    }
}

impl Default for ChatPrompt {
    fn default() -> Self {
        Self {
            template: DEFAULT_SYSTEM_MESSAGE.to_string(),
        }
    }
}
