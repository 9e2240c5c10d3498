//! Deterministic test doubles and fixtures

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::feedback::FeedbackStore;
use crate::generation::{ChatMessage, ChatPrompt, Role};
use crate::ingestion::{hash_bytes, DocumentLoader, PaperSource, TextChunker};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::registry::{Registry, RegistryComponents};
use crate::server::state::AppState;
use crate::types::{Chunk, Document, DocumentMetadata};

/// Bag-of-words embedder: each lowercase word adds 1.0 at its FNV-1a bucket
pub struct HashingEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Successful `embed` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::embedding("embedding backend offline"));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(word.to_lowercase().as_bytes()) % self.dimensions as u64;
            vector[bucket as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.failing.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// LLM that answers "Answer to: <user message>" and records every prompt
#[derive(Default)]
pub struct EchoLlm {
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
    failing: AtomicBool,
}

impl EchoLlm {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages of the most recent call
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.prompts.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::llm("model unavailable"));
        }
        self.prompts.lock().push(messages.to_vec());

        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("Answer to: {}", question))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo"
    }
}

/// In-memory paper source
pub struct StaticSource {
    documents: HashMap<String, Document>,
    failing: HashSet<String>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|d| (d.metadata.paper_id.clone(), d))
                .collect(),
            failing: HashSet::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Make fetches of `paper_id` fail with a network error
    pub fn failing(mut self, paper_id: &str) -> Self {
        self.failing.insert(paper_id.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaperSource for StaticSource {
    async fn fetch(&self, paper_id: &str) -> Result<Option<Document>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(paper_id) {
            return Err(Error::fetch(format!("connection reset fetching {}", paper_id)));
        }
        Ok(self.documents.get(paper_id).cloned())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// A paper with the given id, title and text
pub fn paper(id: &str, title: &str, text: &str) -> Document {
    let mut metadata = DocumentMetadata::new(id, title, format!("test://{}", id));
    metadata.content_hash = Some(hash_bytes(text.as_bytes()));
    Document::new(text, metadata)
}

/// A content chunk spanning a whole one-off paper
pub fn chunk(id: &str, title: &str, text: &str) -> Chunk {
    let doc = paper(id, title, text);
    Chunk::content(&doc, 0, 0, doc.text.len())
}

/// A PDF with one page per entry; empty entries produce pages without text
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content stream"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize PDF");
    out
}

/// Registry wired to test doubles
pub struct TestHarness {
    pub registry: Arc<Registry>,
    pub embedder: Arc<HashingEmbedder>,
    pub llm: Arc<EchoLlm>,
    pub source: Arc<StaticSource>,
    pub config: AppConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Fresh components sharing this harness's doubles
    pub fn components(&self) -> RegistryComponents {
        components(&self.config, &self.embedder, &self.llm, &self.source)
    }

    /// Application state over this registry with a feedback file at `feedback_path`
    pub async fn app_state(&self, feedback_path: PathBuf) -> AppState {
        let feedback = FeedbackStore::open(feedback_path).await.unwrap();
        AppState::from_parts(self.config.clone(), Arc::clone(&self.registry), feedback)
    }
}

fn components(
    config: &AppConfig,
    embedder: &Arc<HashingEmbedder>,
    llm: &Arc<EchoLlm>,
    source: &Arc<StaticSource>,
) -> RegistryComponents {
    let embedder: Arc<dyn EmbeddingProvider> = embedder.clone();
    let llm: Arc<dyn LlmProvider> = llm.clone();
    let source: Arc<dyn PaperSource> = source.clone();

    RegistryComponents {
        loader: DocumentLoader::new(source),
        chunker: TextChunker::from_config(&config.chunking).unwrap(),
        embedder,
        llm,
        prompt: ChatPrompt::new(config.prompt.system_message.clone()).unwrap(),
        retrieval: config.retrieval.clone(),
    }
}

#[derive(Default)]
pub struct TestHarnessBuilder {
    documents: Vec<Document>,
    failing: Vec<String>,
    initial: Vec<String>,
    record_history: Option<bool>,
    max_file_size: Option<usize>,
}

impl TestHarnessBuilder {
    pub fn documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self
    }

    pub fn failing(mut self, paper_id: &str) -> Self {
        self.failing.push(paper_id.to_string());
        self
    }

    pub fn initial(mut self, ids: &[&str]) -> Self {
        self.initial = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn record_history(mut self, record: bool) -> Self {
        self.record_history = Some(record);
        self
    }

    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub async fn build(self) -> TestHarness {
        let mut config = AppConfig::default();
        config.chunking.chunk_size = 200;
        config.chunking.chunk_overlap = 20;
        config.papers.initial_ids = self.initial;
        if let Some(record) = self.record_history {
            config.retrieval.record_history = record;
        }
        if let Some(bytes) = self.max_file_size {
            config.server.max_file_size = bytes;
        }

        let mut source = StaticSource::new(self.documents);
        for id in &self.failing {
            source = source.failing(id);
        }

        let embedder = Arc::new(HashingEmbedder::new(256));
        let llm = Arc::new(EchoLlm::default());
        let source = Arc::new(source);

        let registry = Registry::initialize(
            components(&config, &embedder, &llm, &source),
            &config.papers.initial_ids,
        )
        .await
        .unwrap();

        TestHarness {
            registry: Arc::new(registry),
            embedder,
            llm,
            source,
            config,
        }
    }
}
