//! Vocabulary constants and prefix handling
//!
//! Holds the handful of datatype IRIs the literal decoder understands, built
//! into a lookup table once, plus a small prefix map for compact IRIs.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// XML Schema datatypes
pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const HEX_BINARY: &str = "http://www.w3.org/2001/XMLSchema#hexBinary";
}

/// RDF core vocabulary
pub mod rdf {
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

/// Datatypes with a decoding rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Boolean,
    Integer,
    Decimal,
    Double,
    HexBinary,
}

static DATATYPES: LazyLock<FxHashMap<&'static str, Datatype>> = LazyLock::new(|| {
    [
        Datatype::Boolean,
        Datatype::Integer,
        Datatype::Decimal,
        Datatype::Double,
        Datatype::HexBinary,
    ]
    .into_iter()
    .map(|datatype| (datatype.iri(), datatype))
    .collect()
});

impl Datatype {
    /// Look up a datatype by its full IRI
    pub fn from_iri(iri: &str) -> Option<Self> {
        DATATYPES.get(iri).copied()
    }

    /// Full IRI of the datatype
    pub fn iri(self) -> &'static str {
        match self {
            Datatype::Boolean => xsd::BOOLEAN,
            Datatype::Integer => xsd::INTEGER,
            Datatype::Decimal => xsd::DECIMAL,
            Datatype::Double => xsd::DOUBLE,
            Datatype::HexBinary => xsd::HEX_BINARY,
        }
    }
}

/// Prefix errors
#[derive(Error, Debug)]
pub enum PrefixError {
    /// Unknown prefix
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// Not of the form `prefix:local`
    #[error("Not a compact IRI: {0}")]
    NotCompact(String),
}

pub type PrefixResult<T> = Result<T, PrefixError>;

/// Prefix → namespace IRI mappings, in registration order
#[derive(Debug, Clone)]
pub struct PrefixMap {
    prefixes: IndexMap<String, String>,
}

impl PrefixMap {
    /// Prefix map with the common RDF prefixes registered
    pub fn new() -> Self {
        let mut map = Self::empty();
        map.insert("rdf", rdf::NAMESPACE);
        map.insert("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        map.insert("xsd", xsd::NAMESPACE);
        map.insert("owl", "http://www.w3.org/2002/07/owl#");
        map.insert("foaf", "http://xmlns.com/foaf/0.1/");
        map.insert("dc", "http://purl.org/dc/elements/1.1/");
        map.insert("dcterms", "http://purl.org/dc/terms/");
        map
    }

    /// Prefix map with nothing registered
    pub fn empty() -> Self {
        Self {
            prefixes: IndexMap::new(),
        }
    }

    /// Register (or replace) a prefix
    pub fn insert(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    /// Namespace IRI for a prefix
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Expand `prefix:local` to a full IRI
    pub fn expand(&self, compact: &str) -> PrefixResult<String> {
        let (prefix, local) = compact
            .split_once(':')
            .ok_or_else(|| PrefixError::NotCompact(compact.to_string()))?;
        let iri = self
            .get(prefix)
            .ok_or_else(|| PrefixError::UnknownPrefix(prefix.to_string()))?;
        Ok(format!("{}{}", iri, local))
    }

    /// Expand when the text is a compact IRI with a known prefix, otherwise
    /// return it unchanged.
    pub fn resolve(&self, text: &str) -> String {
        if text.contains("://") || text.starts_with("_:") {
            return text.to_string();
        }
        self.expand(text).unwrap_or_else(|_| text.to_string())
    }

    /// Compact an IRI using the longest matching namespace
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, namespace)| !namespace.is_empty() && iri.starts_with(namespace.as_str()))
            .max_by_key(|(_, namespace)| namespace.len())
            .map(|(prefix, namespace)| format!("{}:{}", prefix, &iri[namespace.len()..]))
    }
}

impl Default for PrefixMap {
    fn default() -> Self {
        Self::new()
    }
}
