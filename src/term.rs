//! RDF term and quad definitions
//!
//! Terms are shared as `Arc<Term>` handles. Two handles denote the *same*
//! term when they point at the same allocation (`Arc::ptr_eq`); the textual
//! [`Term::id`] is what id-based matching compares. Parsers intern terms so
//! that every occurrence of one IRI within a document shares a handle.

use crate::vocab::{rdf, xsd};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, LazyLock};

static DEFAULT_GRAPH: LazyLock<Arc<Term>> =
    LazyLock::new(|| Arc::new(Term::NamedNode(NamedNode::new(""))));

/// Named node (IRI)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedNode {
    id: String,
}

impl NamedNode {
    /// Create a named node from its IRI
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        &self.id
    }
}

/// Blank node (anonymous node)
///
/// The id is only meaningful inside the quad collection it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlankNode {
    id: String,
}

impl BlankNode {
    /// Create a blank node from its id, conventionally `_:label`
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Get the blank node identifier
    pub fn as_str(&self) -> &str {
        &self.id
    }
}

/// RDF literal in its encoded lexical form
///
/// The encoding is `"value"`, `"value"@lang` or `"value"^^datatype`. The
/// value part is kept verbatim (no escaping), so the closing quote is always
/// the last `"` in the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    encoded: String,
}

impl Literal {
    /// Wrap an already encoded literal
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
        }
    }

    /// Create a simple literal (plain string)
    pub fn new_simple_literal(value: &str) -> Self {
        Self::from_encoded(encode_literal(value, None, None))
    }

    /// Create a literal with language tag
    pub fn new_language_tagged_literal(value: &str, language: &str) -> Self {
        Self::from_encoded(encode_literal(value, None, Some(language)))
    }

    /// Create a typed literal
    pub fn new_typed_literal(value: &str, datatype: &str) -> Self {
        Self::from_encoded(encode_literal(value, Some(datatype), None))
    }

    /// The full encoded form, which doubles as the literal's id
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The quoted value, or `None` when the encoding is not quoted
    pub fn lexical(&self) -> Option<&str> {
        let (value, _) = split_encoded(&self.encoded)?;
        Some(value)
    }

    /// Language tag, if the literal carries one
    pub fn language(&self) -> Option<&str> {
        let (_, suffix) = split_encoded(&self.encoded)?;
        suffix.strip_prefix('@')
    }

    /// Datatype IRI; plain literals report `xsd:string`, tagged ones `rdf:langString`
    pub fn datatype(&self) -> Option<&str> {
        let (_, suffix) = split_encoded(&self.encoded)?;
        if let Some(datatype) = suffix.strip_prefix("^^") {
            Some(datatype)
        } else if suffix.starts_with('@') {
            Some(rdf::LANG_STRING)
        } else {
            Some(xsd::STRING)
        }
    }
}

/// Split an encoded literal into its quoted value and whatever follows the
/// closing quote.
pub(crate) fn split_encoded(encoded: &str) -> Option<(&str, &str)> {
    if !encoded.starts_with('"') {
        return None;
    }
    // starts_with guarantees a match
    let end = encoded.rfind('"').unwrap_or(0);
    let value = if end > 0 { &encoded[1..end] } else { "" };
    Some((value, &encoded[end + 1..]))
}

/// Build the encoded form of a literal.
///
/// `xsd:string` typed literals are encoded like simple literals, and a
/// language tag wins over a datatype.
pub fn encode_literal(value: &str, datatype: Option<&str>, language: Option<&str>) -> String {
    match (language, datatype) {
        (Some(language), _) => format!("\"{}\"@{}", value, language),
        (None, Some(datatype)) if datatype != xsd::STRING => {
            format!("\"{}\"^^{}", value, datatype)
        }
        _ => format!("\"{}\"", value),
    }
}

/// RDF term (any RDF value)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
    /// Literal value
    Literal(Literal),
}

impl Term {
    /// New named node handle
    pub fn named(id: impl Into<String>) -> Arc<Term> {
        Arc::new(Term::NamedNode(NamedNode::new(id)))
    }

    /// New blank node handle
    pub fn blank(id: impl Into<String>) -> Arc<Term> {
        Arc::new(Term::BlankNode(BlankNode::new(id)))
    }

    /// New literal handle from its encoded form
    pub fn literal(encoded: impl Into<String>) -> Arc<Term> {
        Arc::new(Term::Literal(Literal::from_encoded(encoded)))
    }

    /// The shared default-graph handle (a named node with an empty id)
    pub fn default_graph() -> Arc<Term> {
        Arc::clone(&DEFAULT_GRAPH)
    }

    /// Textual id: the IRI, the blank node id, or the encoded literal
    pub fn id(&self) -> &str {
        match self {
            Term::NamedNode(n) => n.as_str(),
            Term::BlankNode(b) => b.as_str(),
            Term::Literal(l) => l.encoded(),
        }
    }

    /// Check if this is a named node
    pub fn is_named_node(&self) -> bool {
        matches!(self, Term::NamedNode(_))
    }

    /// Check if this is a blank node
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Check if this is the empty-id default graph
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Term::NamedNode(n) if n.as_str().is_empty())
    }

    /// Borrow the literal, if this term is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(n) => write!(f, "<{}>", n.as_str()),
            Term::BlankNode(b) => write!(f, "{}", b.as_str()),
            Term::Literal(l) => write!(f, "{}", l.encoded()),
        }
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Term::NamedNode(node)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::BlankNode(node)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

/// RDF quad (triple + graph)
///
/// Equality is structural; identity of the individual terms is checked with
/// `Arc::ptr_eq` where it matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    /// Subject
    pub subject: Arc<Term>,
    /// Predicate
    pub predicate: Arc<Term>,
    /// Object
    pub object: Arc<Term>,
    /// Graph (the empty-id named node for the default graph)
    pub graph: Arc<Term>,
}

impl Quad {
    /// Create a new quad
    pub fn new(subject: Arc<Term>, predicate: Arc<Term>, object: Arc<Term>, graph: Arc<Term>) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// Create a quad in the default graph
    pub fn in_default_graph(subject: Arc<Term>, predicate: Arc<Term>, object: Arc<Term>) -> Self {
        Self::new(subject, predicate, object, Term::default_graph())
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.graph.is_default_graph() {
            write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
        } else {
            write!(
                f,
                "{} {} {} {} .",
                self.subject, self.predicate, self.object, self.graph
            )
        }
    }
}
