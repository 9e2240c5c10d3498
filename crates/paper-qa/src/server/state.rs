//! Application state for the paper QA server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::feedback::FeedbackStore;
use crate::registry::{Registry, RegistryComponents};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Corpus, conversation history and loaded papers
    registry: Arc<Registry>,
    /// Feedback file
    feedback: FeedbackStore,
}

impl AppState {
    /// Create application state: open the feedback store and load the initial papers
    pub async fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing paper QA state...");

        let feedback = FeedbackStore::open(&config.storage.feedback_path).await?;
        tracing::info!("Feedback store at {}", feedback.path().display());

        let components = RegistryComponents::from_config(&config)?;
        tracing::info!(
            "Checking Ollama at {} (generation: {}, embeddings: {})",
            config.llm.base_url,
            config.llm.generate_model,
            config.embeddings.model
        );
        if components.check_backends().await {
            tracing::info!("Ollama is running");
        } else {
            tracing::warn!("Please start Ollama:");
            tracing::warn!("  1. Start: ollama serve");
            tracing::warn!(
                "  2. Pull models: ollama pull {} && ollama pull {}",
                config.embeddings.model,
                config.llm.generate_model
            );
        }

        let registry = Registry::initialize(components, &config.papers.initial_ids).await?;
        tracing::info!(
            "Loaded {} papers ({} indexed chunks)",
            registry.papers().len(),
            registry.corpus_len()
        );

        Ok(Self::from_parts(config, Arc::new(registry), feedback))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(config: AppConfig, registry: Arc<Registry>, feedback: FeedbackStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                registry,
                feedback,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the resource registry
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Get the feedback store
    pub fn feedback(&self) -> &FeedbackStore {
        &self.inner.feedback
    }
}
