//! Resource registry: the live corpus, conversation history and loaded papers

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::config::{AppConfig, RetrievalConfig};
use crate::error::{Error, Result};
use crate::generation::{ChatPrompt, PromptVariables};
use crate::ingestion::{
    doc_string_line, hash_bytes, is_pdf_filename, preprocess, preprocess_document, summarize,
    ArxivClient, DocumentLoader, TextChunker,
};
use crate::providers::{ollama_providers, same_provider, EmbeddingProvider, LlmProvider};
use crate::retrieval::{build_default, build_per_document, retrieve, SharedIndex, VectorIndex};
use crate::types::{Chunk, Document, PaperInfo};

/// A paper present in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedPaper {
    pub id: String,
    pub title: String,
    pub content_hash: Option<String>,
}

impl LoadedPaper {
    fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.metadata.paper_id.clone(),
            title: doc.metadata.title.clone(),
            content_hash: doc.metadata.content_hash.clone(),
        }
    }
}

impl From<&LoadedPaper> for PaperInfo {
    fn from(paper: &LoadedPaper) -> Self {
        PaperInfo {
            id: paper.id.clone(),
            title: paper.title.clone(),
        }
    }
}

/// Progress of a single paper addition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperStage {
    Fetching,
    Chunking,
    Indexing,
    Loaded,
}

impl fmt::Display for PaperStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaperStage::Fetching => "fetching",
            PaperStage::Chunking => "chunking",
            PaperStage::Indexing => "indexing",
            PaperStage::Loaded => "loaded",
        };
        f.write_str(name)
    }
}

/// Result of a successful paper addition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The paper was indexed by this call
    Added(LoadedPaper),
    /// The paper (by id or content) was already in the corpus
    AlreadyLoaded(LoadedPaper),
}

impl AddOutcome {
    /// The paper this outcome refers to
    pub fn paper(&self) -> &LoadedPaper {
        match self {
            AddOutcome::Added(p) | AddOutcome::AlreadyLoaded(p) => p,
        }
    }
}

/// Everything the registry needs besides its indexes
pub struct RegistryComponents {
    pub loader: DocumentLoader,
    pub chunker: TextChunker,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub prompt: ChatPrompt,
    pub retrieval: RetrievalConfig,
}

impl RegistryComponents {
    /// Wire the arXiv source and Ollama providers from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source = ArxivClient::new(&config.papers)?;
        let (embedder, llm) = ollama_providers(&config.llm, &config.embeddings)?;

        Ok(Self {
            loader: DocumentLoader::new(Arc::new(source)),
            chunker: TextChunker::from_config(&config.chunking)?,
            embedder,
            llm,
            prompt: ChatPrompt::new(config.prompt.system_message.clone())?,
            retrieval: config.retrieval.clone(),
        })
    }

    /// Check the embedding and generation backends; unavailable ones are logged
    pub async fn check_backends(&self) -> bool {
        let (embedder, llm) = tokio::join!(self.embedder.health_check(), self.llm.health_check());

        let embedder_ok = matches!(embedder, Ok(true));
        if !embedder_ok {
            tracing::warn!("Embedding provider '{}' is not available", self.embedder.name());
        }
        let llm_ok = matches!(llm, Ok(true));
        if !llm_ok {
            tracing::warn!(
                "LLM provider '{}' ({}) is not available",
                self.llm.name(),
                self.llm.model()
            );
        }

        embedder_ok && llm_ok
    }
}

struct Catalog {
    papers: Vec<LoadedPaper>,
    doc_string: String,
}

/// Owns the corpus index, conversation index, LLM handle, prompt and paper list.
///
/// Reads are lock-free snapshots; paper additions are serialized by a writer mutex.
pub struct Registry {
    loader: DocumentLoader,
    chunker: TextChunker,
    llm: Arc<dyn LlmProvider>,
    prompt: ChatPrompt,
    retrieval: RetrievalConfig,
    corpus: SharedIndex,
    conversation: SharedIndex,
    catalog: RwLock<Catalog>,
    writer: tokio::sync::Mutex<()>,
}

impl Registry {
    /// Assemble a registry from prebuilt indexes.
    ///
    /// Both indexes must be bound to the components' embedding provider instance.
    pub fn new(
        components: RegistryComponents,
        corpus: VectorIndex,
        conversation: VectorIndex,
        papers: Vec<LoadedPaper>,
        doc_string: String,
    ) -> Result<Self> {
        if !same_provider(&components.embedder, corpus.provider())
            || !same_provider(&components.embedder, conversation.provider())
        {
            return Err(Error::index(
                "corpus and conversation indexes must share the configured embedding provider",
            ));
        }

        Ok(Self {
            loader: components.loader,
            chunker: components.chunker,
            llm: components.llm,
            prompt: components.prompt,
            retrieval: components.retrieval,
            corpus: SharedIndex::new(corpus),
            conversation: SharedIndex::new(conversation),
            catalog: RwLock::new(Catalog { papers, doc_string }),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    /// Load the initial papers and build both indexes.
    ///
    /// Papers that fail to load are skipped, as are repeated ids and papers whose
    /// content matches an earlier one; embedding failures abort startup.
    pub async fn initialize(components: RegistryComponents, paper_ids: &[String]) -> Result<Self> {
        let paper_ids = unique_ids(paper_ids);
        tracing::info!("Loading {} initial papers", paper_ids.len());

        let batches = preprocess(components.loader.load_by_ids(&paper_ids).await);
        let batches = drop_duplicate_content(batches);
        let chunks = components.chunker.split_all(&batches);
        let (extra, doc_string) = summarize(&chunks);

        let papers: Vec<LoadedPaper> = batches
            .iter()
            .zip(&chunks)
            .filter(|(_, chunks)| !chunks.is_empty())
            .filter_map(|(docs, _)| docs.first().map(LoadedPaper::from_document))
            .collect();

        let total: usize = chunks.iter().map(Vec::len).sum();
        tracing::info!(
            "Indexing {} chunks from {} papers",
            total + extra.len(),
            papers.len()
        );

        let embedder = Arc::clone(&components.embedder);
        let indexes = build_per_document(Arc::clone(&embedder), chunks, &extra).await?;
        let corpus = VectorIndex::aggregate(Arc::clone(&embedder), &indexes)?;
        let conversation = build_default(embedder);

        for paper in &papers {
            tracing::info!("Loaded paper {}: {}", paper.id, paper.title);
        }

        Self::new(components, corpus, conversation, papers, doc_string)
    }

    /// Loaded papers as `{id, title}`
    pub fn papers(&self) -> Vec<PaperInfo> {
        self.catalog.read().papers.iter().map(PaperInfo::from).collect()
    }

    /// The "Available Documents" list
    pub fn doc_string(&self) -> String {
        self.catalog.read().doc_string.clone()
    }

    /// Number of records in the corpus index
    pub fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    /// Number of records in the conversation index
    pub fn conversation_len(&self) -> usize {
        self.conversation.len()
    }

    /// Corpus passages for a query, reordered and serialized
    pub async fn retrieve_context(&self, query: &str) -> Result<String> {
        let snapshot = self.corpus.snapshot();
        retrieve(&snapshot, query, self.retrieval.top_k).await
    }

    /// Conversation-history passages for a query, reordered and serialized
    pub async fn retrieve_history(&self, query: &str) -> Result<String> {
        let snapshot = self.conversation.snapshot();
        retrieve(&snapshot, query, self.retrieval.top_k).await
    }

    /// Answer a question from the corpus and conversation history
    pub async fn answer(&self, question: &str) -> Result<String> {
        let (history, context) = tokio::try_join!(
            self.retrieve_history(question),
            self.retrieve_context(question)
        )?;
        let documents = self.doc_string();

        let messages = self.prompt.render(&PromptVariables {
            input: question,
            history: &history,
            context: &context,
            documents: &documents,
        });

        let answer = self.llm.complete(&messages).await?;

        if self.retrieval.record_history {
            if let Err(e) = self.record_turn(question, &answer).await {
                tracing::warn!("Failed to record conversation turn: {}", e);
            }
        }

        Ok(answer)
    }

    async fn record_turn(&self, question: &str, answer: &str) -> Result<()> {
        let turn = vec![
            Chunk::conversation(format!("User previously responded with {}", question)),
            Chunk::conversation(format!("Agent previously responded with {}", answer)),
        ];
        let len = self.conversation.add(turn).await?;
        tracing::debug!("Conversation index holds {} turns", len / 2);
        Ok(())
    }

    /// Fetch a paper by id and add it to the corpus
    pub async fn add_paper(&self, paper_id: &str) -> Result<AddOutcome> {
        let paper_id = paper_id.trim();
        if paper_id.is_empty() {
            return Err(Error::Validation("paper_id must not be empty".into()));
        }

        if let Some(paper) = self.find(|p| p.id == paper_id) {
            return Ok(AddOutcome::AlreadyLoaded(paper));
        }

        let _guard = self.writer.lock().await;
        if let Some(paper) = self.find(|p| p.id == paper_id) {
            return Ok(AddOutcome::AlreadyLoaded(paper));
        }

        log_stage(paper_id, PaperStage::Fetching);
        let doc = self
            .loader
            .fetch(paper_id)
            .await?
            .ok_or_else(|| Error::PaperNotFound(paper_id.to_string()))?;

        if let Some(paper) = self.find_by_hash(doc.metadata.content_hash.as_deref()) {
            tracing::info!("{} has the same content as loaded paper {}", paper_id, paper.id);
            return Ok(AddOutcome::AlreadyLoaded(paper));
        }

        self.index_document(doc, paper_id).await.map(AddOutcome::Added)
    }

    /// Add an uploaded PDF to the corpus
    pub async fn add_upload(&self, filename: &str, data: Vec<u8>) -> Result<AddOutcome> {
        if !is_pdf_filename(filename) {
            return Err(Error::Validation("Only PDF files are allowed".into()));
        }

        let hash = hash_bytes(&data);
        if let Some(paper) = self.find_by_hash(Some(hash.as_str())) {
            return Ok(AddOutcome::AlreadyLoaded(paper));
        }

        let _guard = self.writer.lock().await;
        if let Some(paper) = self.find_by_hash(Some(hash.as_str())) {
            return Ok(AddOutcome::AlreadyLoaded(paper));
        }

        log_stage(filename, PaperStage::Fetching);
        let doc = self.loader.load_from_bytes(data, filename).await?;

        self.index_document(doc, filename).await.map(AddOutcome::Added)
    }

    /// Chunk, embed and publish one document; the registry is unchanged on error.
    ///
    /// Callers hold the writer lock.
    async fn index_document(&self, doc: Document, label: &str) -> Result<LoadedPaper> {
        let doc = preprocess_document(doc);

        log_stage(label, PaperStage::Chunking);
        let mut chunks = self.chunker.split(&doc);
        if chunks.is_empty() {
            return Err(Error::content(format!(
                "Paper loaded but no valid content chunks were created for: {}",
                label
            )));
        }

        log_stage(label, PaperStage::Indexing);
        let count = chunks.len();
        chunks.push(Chunk::metadata_for(&doc.metadata));
        let total = self.corpus.add(chunks).await?;

        let paper = LoadedPaper::from_document(&doc);
        {
            let mut catalog = self.catalog.write();
            catalog.papers.push(paper.clone());
            catalog.doc_string.push_str(&doc_string_line(&paper.title));
        }

        log_stage(label, PaperStage::Loaded);
        tracing::info!(
            "Added '{}' ({} chunks, corpus now {} records)",
            paper.title,
            count,
            total
        );
        Ok(paper)
    }

    fn find<F>(&self, predicate: F) -> Option<LoadedPaper>
    where
        F: Fn(&LoadedPaper) -> bool,
    {
        self.catalog.read().papers.iter().find(|p| predicate(p)).cloned()
    }

    fn find_by_hash(&self, hash: Option<&str>) -> Option<LoadedPaper> {
        let hash = hash?;
        self.find(|p| p.content_hash.as_deref() == Some(hash))
    }
}

/// Trimmed, non-empty ids in first-seen order
fn unique_ids(paper_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    paper_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Empty out batches whose content hash was already seen in an earlier batch
fn drop_duplicate_content(batches: Vec<Vec<Document>>) -> Vec<Vec<Document>> {
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .map(|docs| {
            let duplicate = docs.iter().any(|doc| {
                doc.metadata
                    .content_hash
                    .as_ref()
                    .is_some_and(|hash| !seen.insert(hash.clone()))
            });
            if duplicate {
                if let Some(doc) = docs.first() {
                    tracing::info!("Skipping {}: same content as an earlier paper", doc.metadata.paper_id);
                }
                Vec::new()
            } else {
                docs
            }
        })
        .collect()
}

fn log_stage(label: &str, stage: PaperStage) {
    tracing::debug!("{}: {}", label, stage);
}
