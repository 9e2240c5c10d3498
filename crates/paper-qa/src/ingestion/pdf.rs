//! PDF text extraction

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Text extracted from a PDF
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    /// Non-empty pages joined with newlines
    pub text: String,
    /// SHA-256 of the raw bytes
    pub content_hash: String,
}

/// PDF parser: `lopdf` page by page, `pdf-extract` for the whole file when that yields nothing
pub struct PdfParser;

impl PdfParser {
    /// Extract text from PDF bytes.
    ///
    /// Fails with a content error when the file is not a PDF or contains no readable text
    /// (scanned, image-only documents).
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedPdf> {
        if !looks_like_pdf(data) {
            return Err(Error::content(format!(
                "Invalid PDF file '{}': missing PDF header",
                filename
            )));
        }

        let content_hash = hash_bytes(data);
        let mut text = String::new();
        let mut pages_with_text = 0usize;
        let mut total_pages = 0usize;

        match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
                total_pages = page_numbers.len();

                for page_number in page_numbers {
                    let page_text = match doc.extract_text(&[page_number]) {
                        Ok(t) => t,
                        Err(e) => {
                            tracing::debug!("{}: page {} not extractable: {}", filename, page_number, e);
                            continue;
                        }
                    };

                    // Only add non-empty pages
                    if page_text.trim().is_empty() {
                        continue;
                    }

                    pages_with_text += 1;
                    text.push_str(&page_text);
                    text.push('\n');
                }
            }
            Err(e) => {
                tracing::debug!("lopdf could not load {}: {}", filename, e);
            }
        }

        if text.trim().is_empty() {
            // pdf-extract panics on some malformed files
            let fallback = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
                .unwrap_or_else(|_| {
                    tracing::debug!("pdf-extract panicked on {}", filename);
                    Ok(String::new())
                });

            match fallback {
                Ok(fallback) if !fallback.trim().is_empty() => {
                    tracing::debug!("{}: using pdf-extract fallback", filename);
                    pages_with_text = 1;
                    text = fallback;
                }
                Ok(_) => {}
                Err(e) if total_pages == 0 => {
                    return Err(Error::content(format!("Invalid PDF file '{}': {}", filename, e)));
                }
                Err(e) => {
                    tracing::debug!("pdf-extract failed on {}: {}", filename, e);
                }
            }
        }

        if text.trim().is_empty() {
            return Err(Error::content(format!(
                "No readable text found in PDF '{}'",
                filename
            )));
        }

        tracing::debug!(
            "Extracted {} characters from {} ({} of {} pages with text)",
            text.len(),
            filename,
            pages_with_text,
            total_pages
        );

        Ok(ParsedPdf { text, content_hash })
    }
}

/// Whether the bytes carry a PDF header near the start of the file
pub fn looks_like_pdf(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

/// Hash raw bytes for duplicate detection
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Whether a filename carries a `.pdf` extension (case-insensitive)
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}
