//! arXiv paper source: Atom metadata API plus PDF download

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;

use crate::config::PapersConfig;
use crate::error::{Error, Result};
use crate::types::{Document, DocumentMetadata};

use super::loader::PaperSource;
use super::pdf::PdfParser;

/// One `<entry>` of an arXiv Atom feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArxivEntry {
    /// Abstract page URL (`http://arxiv.org/abs/<id>`)
    pub id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published: Option<String>,
    /// Link with `title="pdf"`, when present
    pub pdf_url: Option<String>,
}

impl ArxivEntry {
    /// arXiv signals unknown ids with an entry pointing at its error namespace
    fn is_error(&self) -> bool {
        self.id.contains("/api/errors")
    }
}

/// Whether `id` is a syntactically valid arXiv identifier.
///
/// Accepts new-style ids (`2301.00001`, `2301.00001v2`) and old-style ids (`hep-th/9901001`).
pub fn is_valid_arxiv_id(id: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:\d{4}\.\d{4,5}|[a-z\-]+(?:\.[A-Z]{2})?/\d{7})(?:v\d+)?$")
                .expect("valid arXiv id pattern")
        })
        .is_match(id)
}

/// Parse an arXiv Atom feed into entries, skipping error entries
pub fn parse_feed(xml: &str) -> Result<Vec<ArxivEntry>> {
    #[derive(Clone, Copy)]
    enum Field {
        Id,
        Title,
        Summary,
        Published,
        AuthorName,
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<ArxivEntry> = None;
    let mut field: Option<Field> = None;
    let mut in_author = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"entry" => current = Some(ArxivEntry::default()),
                    b"author" => in_author = true,
                    b"link" => {
                        if let Some(entry) = current.as_mut() {
                            read_pdf_link(&e, entry)?;
                        }
                    }
                    _ if current.is_some() => {
                        field = match name.as_ref() {
                            b"id" if !in_author => Some(Field::Id),
                            b"title" => Some(Field::Title),
                            b"summary" => Some(Field::Summary),
                            b"published" => Some(Field::Published),
                            b"name" if in_author => Some(Field::AuthorName),
                            _ => None,
                        };
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link" {
                    if let Some(entry) = current.as_mut() {
                        read_pdf_link(&e, entry)?;
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::fetch(format!("Malformed arXiv response: {}", e)))?;
                    match f {
                        Field::Id => entry.id.push_str(&text),
                        Field::Title => entry.title.push_str(&text),
                        Field::Summary => entry.summary.push_str(&text),
                        Field::Published => {
                            entry.published.get_or_insert_with(String::new).push_str(&text)
                        }
                        Field::AuthorName => entry.authors.push(text.into_owned()),
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(entry) = current.take() {
                        if !entry.is_error() {
                            entries.push(entry);
                        }
                    }
                    field = None;
                }
                b"author" => in_author = false,
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::fetch(format!(
                    "Malformed arXiv response at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    Ok(entries)
}

fn read_pdf_link(element: &BytesStart<'_>, entry: &mut ArxivEntry) -> Result<()> {
    let mut href = None;
    let mut is_pdf = false;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| Error::fetch(format!("Malformed arXiv link: {}", e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::fetch(format!("Malformed arXiv link: {}", e)))?;
        match attr.key.local_name().as_ref() {
            b"href" => href = Some(value.into_owned()),
            b"title" if value == "pdf" => is_pdf = true,
            _ => {}
        }
    }

    if is_pdf {
        entry.pdf_url = href;
    }
    Ok(())
}

/// arXiv API client
pub struct ArxivClient {
    client: Client,
    api_url: String,
    pdf_url: String,
    timeout_secs: u64,
}

impl ArxivClient {
    /// Create a new arXiv client; every request is bounded by `fetch_timeout_secs`
    pub fn new(config: &PapersConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(concat!("paper-qa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.arxiv_api_url.trim_end_matches('/').to_string(),
            pdf_url: config.arxiv_pdf_url.trim_end_matches('/').to_string(),
            timeout_secs: config.fetch_timeout_secs,
        })
    }

    /// Look up a paper's metadata; `None` when arXiv does not know the id
    pub async fn fetch_entry(&self, paper_id: &str) -> Result<Option<ArxivEntry>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("id_list", paper_id), ("max_results", "1")])
            .send()
            .await
            .map_err(|e| Error::from_request(e, "arXiv metadata request", self.timeout_secs, Error::Fetch))?;

        if !response.status().is_success() {
            return Err(Error::fetch(format!(
                "arXiv metadata request for {} returned HTTP {}",
                paper_id,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::from_request(e, "arXiv metadata read", self.timeout_secs, Error::Fetch))?;

        Ok(parse_feed(&body)?.into_iter().next())
    }

    /// Download the PDF for an entry
    pub async fn fetch_pdf(&self, paper_id: &str, entry: &ArxivEntry) -> Result<(String, Vec<u8>)> {
        let url = entry
            .pdf_url
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.pdf_url, paper_id));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::from_request(e, "arXiv PDF download", self.timeout_secs, Error::Fetch))?;

        if !response.status().is_success() {
            return Err(Error::fetch(format!(
                "PDF download from {} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::from_request(e, "arXiv PDF download", self.timeout_secs, Error::Fetch))?;

        Ok((url, bytes.to_vec()))
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn fetch(&self, paper_id: &str) -> Result<Option<Document>> {
        if !is_valid_arxiv_id(paper_id) {
            tracing::debug!("Rejecting malformed arXiv id '{}'", paper_id);
            return Ok(None);
        }

        let Some(entry) = self.fetch_entry(paper_id).await? else {
            return Ok(None);
        };

        let (url, data) = self.fetch_pdf(paper_id, &entry).await?;
        tracing::debug!("Downloaded {} ({} bytes)", url, data.len());

        let filename = format!("{}.pdf", paper_id.replace('/', "_"));
        let parsed = tokio::task::spawn_blocking(move || PdfParser::parse(&filename, &data))
            .await
            .map_err(|e| Error::content(format!("PDF extraction aborted: {}", e)))??;

        let mut metadata = DocumentMetadata::new(paper_id, entry.title, url);
        metadata.authors = entry.authors;
        metadata.published = entry.published;
        metadata.summary = Some(entry.summary).filter(|s| !s.trim().is_empty());
        metadata.content_hash = Some(parsed.content_hash);

        Ok(Some(Document::new(parsed.text, metadata)))
    }

    fn name(&self) -> &str {
        "arxiv"
    }
}
