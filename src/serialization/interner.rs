//! Term interning
//!
//! Parsers hand out borrowed term views; the interner turns them into
//! shared `Arc<Term>` handles so that every occurrence of one IRI, blank
//! label or encoded literal within a document is the same instance.
//!
//! # Example
//!
//! ```
//! use quad_reader::TermInterner;
//!
//! let mut interner = TermInterner::new();
//! let a = interner.named("http://example.org/a");
//! let b = interner.named("http://example.org/a");
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! ```

use crate::term::{encode_literal, Quad, Term};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Per-document term table
#[derive(Debug, Default)]
pub struct TermInterner {
    named: FxHashMap<String, Arc<Term>>,
    blank: FxHashMap<String, Arc<Term>>,
    literals: FxHashMap<String, Arc<Term>>,
}

impl TermInterner {
    /// Create a new empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle for an IRI; the empty IRI is the default graph
    pub fn named(&mut self, iri: &str) -> Arc<Term> {
        if iri.is_empty() {
            return Term::default_graph();
        }
        intern(&mut self.named, iri, Term::named)
    }

    /// Shared handle for a blank node id (`_:label`)
    pub fn blank(&mut self, id: &str) -> Arc<Term> {
        intern(&mut self.blank, id, Term::blank)
    }

    /// Shared handle for an already encoded literal
    pub fn literal(&mut self, encoded: &str) -> Arc<Term> {
        intern(&mut self.literals, encoded, Term::literal)
    }

    /// Shared handle for a literal given by its parts
    pub fn literal_parts(&mut self, value: &str, datatype: Option<&str>, language: Option<&str>) -> Arc<Term> {
        let encoded = encode_literal(value, datatype, language);
        self.literal(&encoded)
    }

    /// Number of distinct terms handed out
    pub fn len(&self) -> usize {
        self.named.len() + self.blank.len() + self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Intern an `oxrdf` term; RDF-star triple terms have no counterpart
    pub fn intern_oxrdf_term(&mut self, term: &oxrdf::Term) -> Option<Arc<Term>> {
        match term {
            oxrdf::Term::NamedNode(node) => Some(self.named(node.as_str())),
            oxrdf::Term::BlankNode(node) => Some(self.blank(&format!("_:{}", node.as_str()))),
            oxrdf::Term::Literal(lit) => Some(self.literal_parts(
                lit.value(),
                Some(lit.datatype().as_str()),
                lit.language(),
            )),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Intern every position of an `oxrdf` quad
    pub fn intern_oxrdf_quad(&mut self, quad: &oxrdf::Quad) -> Option<Quad> {
        let subject = match &quad.subject {
            oxrdf::Subject::NamedNode(node) => self.named(node.as_str()),
            oxrdf::Subject::BlankNode(node) => self.blank(&format!("_:{}", node.as_str())),
            #[allow(unreachable_patterns)]
            _ => return None,
        };
        let predicate = self.named(quad.predicate.as_str());
        let object = self.intern_oxrdf_term(&quad.object)?;
        let graph = match &quad.graph_name {
            oxrdf::GraphName::DefaultGraph => Term::default_graph(),
            oxrdf::GraphName::NamedNode(node) => self.named(node.as_str()),
            oxrdf::GraphName::BlankNode(node) => self.blank(&format!("_:{}", node.as_str())),
        };
        Some(Quad::new(subject, predicate, object, graph))
    }
}

fn intern(table: &mut FxHashMap<String, Arc<Term>>, key: &str, make: fn(String) -> Arc<Term>) -> Arc<Term> {
    if let Some(term) = table.get(key) {
        return Arc::clone(term);
    }
    let term = make(key.to_string());
    table.insert(key.to_string(), Arc::clone(&term));
    term
}
