//! Document and chunk types

use serde::{Deserialize, Serialize};

/// Metadata carried by a document and inherited by every chunk derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// arXiv id for fetched papers, UUID for uploads
    pub paper_id: String,
    /// Paper title (filename for uploads)
    pub title: String,
    /// Where the text came from (PDF URL or `upload://<filename>`)
    pub source: String,
    /// Author names
    #[serde(default)]
    pub authors: Vec<String>,
    /// Publication timestamp as reported by the source
    #[serde(default)]
    pub published: Option<String>,
    /// Abstract
    #[serde(default)]
    pub summary: Option<String>,
    /// SHA-256 of the raw PDF bytes (hex)
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl DocumentMetadata {
    /// Create metadata with the required fields only
    pub fn new(
        paper_id: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            paper_id: paper_id.into(),
            title: title.into(),
            source: source.into(),
            authors: Vec::new(),
            published: None,
            summary: None,
            content_hash: None,
        }
    }
}

/// A loaded paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Full text
    pub text: String,
    /// Paper metadata
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a new document
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Paper title
    pub fn title(&self) -> &str {
        &self.metadata.title
    }
}

/// What a chunk represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Window over the document text
    Content,
    /// Synthetic summary of the document (title, authors, abstract)
    Metadata,
    /// A recorded chat turn
    Conversation,
}

/// Chunk metadata: the owning document's metadata plus position information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Inherited document metadata
    pub document: DocumentMetadata,
    /// Chunk kind
    pub kind: ChunkKind,
    /// Position of the window within its document (content chunks only)
    pub chunk_index: Option<u32>,
    /// Byte offset of the window start in the document text
    pub start: usize,
    /// Byte offset of the window end in the document text
    pub end: usize,
}

/// The unit stored in a vector index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub text: String,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a content chunk covering `start..end` of the document text
    pub fn content(doc: &Document, chunk_index: u32, start: usize, end: usize) -> Self {
        Self {
            text: doc.text[start..end].to_string(),
            metadata: ChunkMetadata {
                document: doc.metadata.clone(),
                kind: ChunkKind::Content,
                chunk_index: Some(chunk_index),
                start,
                end,
            },
        }
    }

    /// Create a synthetic metadata chunk for a document
    pub fn metadata_for(document: &DocumentMetadata) -> Self {
        let mut text = format!("Title: {}", document.title);
        if !document.authors.is_empty() {
            text.push_str(&format!("\nAuthors: {}", document.authors.join(", ")));
        }
        if let Some(published) = &document.published {
            text.push_str(&format!("\nPublished: {}", published));
        }
        if let Some(summary) = &document.summary {
            text.push_str(&format!("\nSummary: {}", summary));
        }

        Self {
            text,
            metadata: ChunkMetadata {
                document: document.clone(),
                kind: ChunkKind::Metadata,
                chunk_index: None,
                start: 0,
                end: 0,
            },
        }
    }

    /// Create the chunk carrying the "Available Documents" list
    pub fn catalog(doc_string: impl Into<String>) -> Self {
        let text = doc_string.into();
        let len = text.len();
        Self {
            text,
            metadata: ChunkMetadata {
                document: DocumentMetadata::new("catalog", "Available Documents", "catalog"),
                kind: ChunkKind::Metadata,
                chunk_index: None,
                start: 0,
                end: len,
            },
        }
    }

    /// Create a conversation-history chunk
    pub fn conversation(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.len();
        Self {
            text,
            metadata: ChunkMetadata {
                document: DocumentMetadata::new("conversation", "Conversation", "chat"),
                kind: ChunkKind::Conversation,
                chunk_index: None,
                start: 0,
                end: len,
            },
        }
    }

    /// Title of the owning document
    pub fn title(&self) -> &str {
        &self.metadata.document.title
    }

    /// Paper id of the owning document
    pub fn paper_id(&self) -> &str {
        &self.metadata.document.paper_id
    }
}
