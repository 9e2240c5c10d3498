//! Configuration for the paper QA service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default upload limit (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Paper source configuration
    pub papers: PapersConfig,
    /// Local storage configuration
    pub storage: StorageConfig,
    /// Prompt configuration
    pub prompt: PromptConfig,
}

impl AppConfig {
    /// Load configuration: defaults, then an optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text (missing sections fall back to defaults)
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides through the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PAPER_QA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PAPER_QA_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("PAPER_QA_LLM_MODEL") {
            self.llm.generate_model = model;
        }
        if let Some(model) = lookup("PAPER_QA_EMBED_MODEL") {
            self.embeddings.model = model;
        }
        if let Some(ids) = lookup("PAPER_QA_PAPER_IDS") {
            self.papers.initial_ids = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = lookup("PAPER_QA_FEEDBACK_PATH") {
            self.storage.feedback_path = PathBuf::from(path);
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".into()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be positive".into()));
        }
        if self.llm.timeout_secs == 0 || self.papers.fetch_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be positive".into()));
        }
        if self.server.max_file_size == 0 {
            return Err(Error::Config("server.max_file_size must be positive".into()));
        }
        if !self.prompt.system_message.contains("{context}") {
            return Err(Error::Config(
                "prompt.system_message must contain a {context} placeholder".into(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum PDF upload size in bytes (default: 10MB)
    pub max_file_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Deadline for a single Ollama request in seconds
    pub timeout_secs: u64,
    /// Context window size (tokens)
    pub context_size: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
            context_size: 8192,
        }
    }
}

impl LlmConfig {
    /// Request deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama embedding model
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in grapheme clusters
    pub chunk_size: usize,
    /// Overlap between consecutive windows
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved from each index
    pub top_k: usize,
    /// Append every chat turn to the conversation index
    pub record_history: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            record_history: true,
        }
    }
}

/// arXiv source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PapersConfig {
    /// Papers loaded at startup
    pub initial_ids: Vec<String>,
    /// arXiv query API endpoint
    pub arxiv_api_url: String,
    /// Base URL for PDF downloads (`{base}/{id}`)
    pub arxiv_pdf_url: String,
    /// Deadline for a single fetch (metadata or PDF) in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for PapersConfig {
    fn default() -> Self {
        Self {
            initial_ids: vec![
                "1706.03762".to_string(), // Attention Is All You Need
                "1810.04805".to_string(), // BERT
                "2005.11401".to_string(), // Retrieval-Augmented Generation
                "2205.00445".to_string(), // MRKL
                "2310.06825".to_string(), // Mistral 7B
                "2306.05685".to_string(), // LLM-as-a-judge
            ],
            arxiv_api_url: "https://export.arxiv.org/api/query".to_string(),
            arxiv_pdf_url: "https://arxiv.org/pdf".to_string(),
            fetch_timeout_secs: 60,
        }
    }
}

impl PapersConfig {
    /// Fetch deadline
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Feedback JSON file
    pub feedback_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paper-qa");

        Self {
            feedback_path: data_dir.join("feedback_data").join("feedback.json"),
        }
    }
}

/// Prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// System message template; `{input}`, `{history}`, `{context}` and `{documents}` are substituted
    pub system_message: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_message: crate::generation::prompt::DEFAULT_SYSTEM_MESSAGE.to_string(),
        }
    }
}
