//! RDF parsing
//!
//! Supports:
//! - Turtle (TTL)
//! - TriG
//! - N-Triples (NT)
//! - N-Quads (NQ)

mod interner;
mod turtle;

pub use interner::TermInterner;

use crate::term::Quad;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// RDF syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfFormat {
    /// Turtle format (.ttl)
    Turtle,
    /// TriG format (.trig)
    TriG,
    /// N-Triples format (.nt)
    NTriples,
    /// N-Quads format (.nq)
    NQuads,
}

impl RdfFormat {
    /// Format for a media type; parameters such as `; charset=utf-8` are ignored
    pub fn from_media_type(media_type: &str) -> ParseResult<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/turtle" | "application/x-turtle" => Ok(RdfFormat::Turtle),
            "application/trig" => Ok(RdfFormat::TriG),
            "application/n-triples" | "text/plain" => Ok(RdfFormat::NTriples),
            "application/n-quads" => Ok(RdfFormat::NQuads),
            _ => Err(ParseError::UnsupportedMediaType(media_type.to_string())),
        }
    }

    /// Format for a file extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "ttl" | "turtle" => Some(RdfFormat::Turtle),
            "trig" => Some(RdfFormat::TriG),
            "nt" => Some(RdfFormat::NTriples),
            "nq" => Some(RdfFormat::NQuads),
            _ => None,
        }
    }

    /// Format for a path, by extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical media type
    pub fn media_type(self) -> &'static str {
        match self {
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::TriG => "application/trig",
            RdfFormat::NTriples => "application/n-triples",
            RdfFormat::NQuads => "application/n-quads",
        }
    }

    /// Whether documents in this format can name graphs
    pub fn supports_datasets(self) -> bool {
        matches!(self, RdfFormat::TriG | RdfFormat::NQuads)
    }
}

/// Parse errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax error
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Base IRI could not be parsed
    #[error("Invalid base IRI {iri}: {reason}")]
    InvalidBase { iri: String, reason: String },

    /// No parser for this media type
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Term kind with no counterpart (RDF-star triple terms)
    #[error("Unsupported term: {0}")]
    UnsupportedTerm(String),
}

impl From<rio_turtle::TurtleError> for ParseError {
    fn from(err: rio_turtle::TurtleError) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// RDF parser
pub struct RdfParser;

impl RdfParser {
    /// Parse RDF text into quads with interned terms
    pub fn parse(input: &str, format: RdfFormat, base: Option<&str>) -> ParseResult<Vec<Quad>> {
        let mut interner = TermInterner::new();
        Self::parse_with(input, format, base, &mut interner)
    }

    /// Parse with a caller-supplied interner, so several documents can share
    /// term handles
    pub fn parse_with(
        input: &str,
        format: RdfFormat,
        base: Option<&str>,
        interner: &mut TermInterner,
    ) -> ParseResult<Vec<Quad>> {
        let quads = turtle::parse(input.as_bytes(), format, base, interner)?;
        debug!(?format, quads = quads.len(), terms = interner.len(), "parsed RDF document");
        Ok(quads)
    }

    /// Parse RDF data from a file
    pub fn parse_file(path: &Path, format: RdfFormat, base: Option<&str>) -> ParseResult<Vec<Quad>> {
        let input = std::fs::read_to_string(path)?;
        Self::parse(&input, format, base)
    }
}
