//! Paper ingestion: arXiv fetch, PDF extraction, preprocessing and chunking

pub mod arxiv;
mod chunker;
mod loader;
pub mod pdf;

pub use arxiv::{is_valid_arxiv_id, ArxivClient};
pub use chunker::{doc_string_line, summarize, TextChunker, DOC_STRING_HEADER};
pub use loader::{normalize_text, preprocess, preprocess_document, DocumentLoader, PaperSource};
pub use pdf::{hash_bytes, is_pdf_filename, PdfParser};
