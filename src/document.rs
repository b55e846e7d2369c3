//! RDF documents
//!
//! A [`Document`] is a parsed RDF source plus a reader over its quads, with
//! the handful of lookups application code reaches for most often.

use crate::filter::{QuadPattern, TermMatch};
use crate::reader::QuadReader;
use crate::serialization::{ParseError, RdfFormat, RdfParser};
use crate::term::Term;
use crate::vocab::rdf;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Accept header sent when fetching
const ACCEPT_RDF: &str = "text/turtle, application/trig;q=0.9, application/n-quads;q=0.8, application/n-triples;q=0.8";

/// Bytes escaped in a `file://` base IRI; `/` keeps separating segments
const FILE_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Document errors
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Document could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File extension does not name a known syntax
    #[error("Cannot tell RDF syntax of {0}")]
    UnknownFormat(String),

    /// Retrieval failed
    #[error("Fetch error: {0}")]
    Fetch(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// A parsed RDF document
#[derive(Debug, Clone)]
pub struct Document {
    reader: QuadReader,
    format: RdfFormat,
    base: Option<String>,
}

impl Document {
    /// Parse document text given its media type
    pub fn parse(input: &str, media_type: &str, base: Option<&str>) -> DocumentResult<Self> {
        let format = RdfFormat::from_media_type(media_type)?;
        Self::parse_format(input, format, base)
    }

    /// Parse document text in a known syntax
    pub fn parse_format(input: &str, format: RdfFormat, base: Option<&str>) -> DocumentResult<Self> {
        let quads = RdfParser::parse(input, format, base)?;
        Ok(Self {
            reader: QuadReader::from(quads),
            format,
            base: base.map(str::to_string),
        })
    }

    /// Read and parse a file; the syntax comes from its extension and the
    /// base IRI is its `file://` URL
    pub fn open(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let format = RdfFormat::from_path(path)
            .ok_or_else(|| DocumentError::UnknownFormat(path.display().to_string()))?;
        let input = std::fs::read_to_string(path)?;
        let base = file_iri(&path.canonicalize()?);
        debug!(path = %path.display(), ?format, "opening document");
        Self::parse_format(&input, format, Some(&base))
    }

    /// Retrieve and parse a document over HTTP, using the URL as base IRI.
    ///
    /// The syntax follows the response's `Content-Type`, falling back to
    /// Turtle when the header is missing or names no RDF syntax.
    pub async fn fetch(url: &str) -> DocumentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DocumentError::Fetch(e.to_string()))?;

        let resp = client
            .get(url)
            .header(ACCEPT, ACCEPT_RDF)
            .send()
            .await
            .map_err(|e| DocumentError::Fetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DocumentError::Fetch(format!("{} returned {}", url, resp.status())));
        }

        let format = match resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            Some(media_type) => RdfFormat::from_media_type(media_type).unwrap_or_else(|_| {
                warn!(url, media_type, "unrecognised content type, reading as Turtle");
                RdfFormat::Turtle
            }),
            None => RdfFormat::Turtle,
        };

        let body = resp.text().await.map_err(|e| DocumentError::Fetch(e.to_string()))?;
        debug!(url, ?format, bytes = body.len(), "fetched document");
        Self::parse_format(&body, format, Some(url))
    }

    /// Reader over every quad of the document
    pub fn reader(&self) -> &QuadReader {
        &self.reader
    }

    pub fn format(&self) -> RdfFormat {
        self.format
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Objects of every quad with this subject and predicate, matched by id
    pub fn find_objects(&self, subject: impl Into<TermMatch>, predicate: impl Into<TermMatch>) -> Vec<Arc<Term>> {
        let pattern = QuadPattern::any()
            .with_subject(by_id(subject.into()))
            .with_predicate(by_id(predicate.into()));
        self.reader.scan(&pattern).map(|q| Arc::clone(&q.object)).collect()
    }

    /// The object when exactly one quad matches
    pub fn find_only_object(
        &self,
        subject: impl Into<TermMatch>,
        predicate: impl Into<TermMatch>,
    ) -> Option<Arc<Term>> {
        let mut objects = self.find_objects(subject, predicate);
        if objects.len() == 1 {
            objects.pop()
        } else {
            None
        }
    }

    /// Lexical value of the only object, when it is a literal of `datatype`
    /// (any datatype when `None`)
    pub fn read_literal(
        &self,
        subject: impl Into<TermMatch>,
        predicate: impl Into<TermMatch>,
        datatype: Option<&str>,
    ) -> Option<String> {
        let object = self.find_only_object(subject, predicate)?;
        let literal = object.as_literal()?;
        if let Some(datatype) = datatype {
            if literal.datatype() != Some(datatype) {
                return None;
            }
        }
        literal.lexical().map(str::to_string)
    }

    /// Predicate telling whether a subject is typed with `class`
    pub fn type_filter<'a>(&'a self, class: &'a str) -> impl Fn(&Term) -> bool + 'a {
        move |subject: &Term| {
            let pattern = QuadPattern::new(subject.id(), rdf::TYPE, class, TermMatch::Any);
            self.reader.scan(&pattern).next().is_some()
        }
    }
}

/// `file://` IRI of an absolute path, percent-encoded
fn file_iri(path: &Path) -> String {
    let path = path.to_string_lossy();
    let separator = if path.starts_with('/') { "" } else { "/" };
    format!("file://{}{}", separator, utf8_percent_encode(&path, FILE_PATH))
}

// Lookups compare by value: a term handle from another document still matches
fn by_id(constraint: TermMatch) -> TermMatch {
    match constraint {
        TermMatch::Term(term) => TermMatch::from(term.id()),
        other => other,
    }
}

impl From<Document> for QuadReader {
    fn from(document: Document) -> Self {
        document.reader
    }
}
