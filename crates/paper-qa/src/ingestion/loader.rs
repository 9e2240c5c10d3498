//! Paper loading and preprocessing

use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::types::{Document, DocumentMetadata};

use super::pdf::PdfParser;

/// A place papers can be fetched from by id
///
/// Implementations:
/// - `ArxivClient`: arXiv Atom API plus PDF download
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Fetch a paper; `Ok(None)` when the source does not know the id
    async fn fetch(&self, paper_id: &str) -> Result<Option<Document>>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Loads papers from a source or from uploaded bytes
#[derive(Clone)]
pub struct DocumentLoader {
    source: Arc<dyn PaperSource>,
}

impl DocumentLoader {
    /// Create a loader over a paper source
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self { source }
    }

    /// Fetch one paper, surfacing network failures
    pub async fn fetch(&self, paper_id: &str) -> Result<Option<Document>> {
        self.source.fetch(paper_id).await
    }

    /// Fetch one paper; any failure yields an empty list
    pub async fn load_single(&self, paper_id: &str) -> Vec<Document> {
        match self.source.fetch(paper_id).await {
            Ok(Some(doc)) => vec![doc],
            Ok(None) => {
                tracing::warn!("{}: paper {} not found", self.source.name(), paper_id);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("{}: failed to load paper {}: {}", self.source.name(), paper_id, e);
                Vec::new()
            }
        }
    }

    /// Fetch several papers concurrently; one entry per id, in input order
    pub async fn load_by_ids(&self, ids: &[String]) -> Vec<Vec<Document>> {
        join_all(ids.iter().map(|id| self.load_single(id))).await
    }

    /// Build a document from uploaded PDF bytes
    pub async fn load_from_bytes(&self, data: Vec<u8>, filename: &str) -> Result<Document> {
        let name = filename.to_string();
        let parsed = tokio::task::spawn_blocking(move || PdfParser::parse(&name, &data))
            .await
            .map_err(|e| Error::content(format!("PDF extraction aborted: {}", e)))??;

        let mut metadata = DocumentMetadata::new(
            uuid::Uuid::new_v4().to_string(),
            filename,
            format!("upload://{}", filename),
        );
        metadata.content_hash = Some(parsed.content_hash);

        Ok(Document::new(parsed.text, metadata))
    }
}

/// Preprocess every document of every batch
pub fn preprocess(batches: Vec<Vec<Document>>) -> Vec<Vec<Document>> {
    batches
        .into_iter()
        .map(|docs| docs.into_iter().map(preprocess_document).collect())
        .collect()
}

/// Normalize a document's text and metadata
pub fn preprocess_document(mut doc: Document) -> Document {
    doc.text = truncate_references(&normalize_text(&doc.text)).to_string();

    let title = collapse_whitespace(&doc.metadata.title);
    doc.metadata.title = if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    };

    doc.metadata.authors = doc
        .metadata
        .authors
        .iter()
        .map(|a| collapse_whitespace(a))
        .filter(|a| !a.is_empty())
        .collect();

    if let Some(summary) = doc.metadata.summary.take() {
        let summary = collapse_whitespace(&summary);
        doc.metadata.summary = Some(summary).filter(|s| !s.is_empty());
    }

    doc
}

/// Collapse horizontal whitespace, strip line ends and squeeze blank lines
pub fn normalize_text(text: &str) -> String {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    let spaces = SPACES.get_or_init(|| Regex::new(r"[ \t\u{00A0}]+").expect("valid pattern"));
    let blank_lines = BLANK_LINES.get_or_init(|| Regex::new(r"\n{3,}").expect("valid pattern"));

    let unified = text.replace("\r\n", "\n").replace(['\r', '\u{000C}'], "\n");
    let collapsed = spaces.replace_all(&unified, " ");

    let lines: Vec<&str> = collapsed.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");

    blank_lines.replace_all(&joined, "\n\n").trim().to_string()
}

/// Drop everything from the last "References"/"Bibliography" heading onwards.
///
/// A heading on the very first line is left alone so that the whole text is never discarded.
pub fn truncate_references(text: &str) -> &str {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    let heading = HEADING.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:\d+\.?[ \t]*)?(?:References|REFERENCES|Bibliography|BIBLIOGRAPHY)[ \t]*$")
            .expect("valid pattern")
    });

    match heading.find_iter(text).last() {
        Some(m) if m.start() > 0 => text[..m.start()].trim_end(),
        _ => text,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
