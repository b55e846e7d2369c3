//! Quad Reader
//!
//! Pattern queries over an in-memory collection of RDF quads, and
//! materialization of a quad set into nested, possibly cyclic objects.
//!
//! # Architecture
//!
//! - [`term`]: `Arc<Term>` handles; identity is the allocation, id is the text
//! - [`filter`]: compiles up to four optional constraints into one predicate
//! - [`literal`] / [`value`]: literal decoding and term evaluation
//! - [`reader`]: immutable, composable filtered views over a quad snapshot
//! - [`pojo`]: cycle-safe materializer over a reader
//! - [`serialization`] / [`document`]: Turtle family parsing and retrieval
//!
//! ## Example Usage
//!
//! ```rust
//! use quad_reader::{PojoOption, Quad, QuadReader, Term, TermMatch};
//!
//! let (a, b) = (Term::named("A"), Term::named("B"));
//! let knows = Term::named("knows");
//!
//! let reader = QuadReader::new(vec![
//!     Quad::in_default_graph(a.clone(), knows.clone(), b.clone()),
//!     Quad::in_default_graph(b.clone(), knows.clone(), a.clone()),
//! ]);
//!
//! // identity match on the subject, id match on the predicate
//! let from_a = reader.filter(&a, "knows", TermMatch::Any, TermMatch::Any);
//! assert_eq!(from_a.len(), 1);
//!
//! // A and B point at each other; the result shares objects instead of looping
//! let pojo = reader.pojo(TermMatch::Any, &[PojoOption::Flatten, PojoOption::Objects]).unwrap();
//! assert_eq!(pojo.to_json()["A"]["knows"]["knows"], serde_json::json!({ "@id": "A" }));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod filter;
pub mod literal;
pub mod pojo;
pub mod reader;
pub mod serialization;
pub mod term;
pub mod value;
pub mod vocab;

// Re-export main types for convenience
pub use document::{Document, DocumentError, DocumentResult};

pub use filter::{FilterShape, QuadFilter, QuadPattern, TermMatch};

pub use literal::{LiteralError, LiteralResult, LiteralValue};

pub use pojo::{ObjectId, Pojo, PojoObject, PojoOption, PojoOptions, Root};

pub use reader::{QuadReader, Quads, ReaderError, ReaderResult};

pub use serialization::{ParseError, ParseResult, RdfFormat, RdfParser, TermInterner};

pub use term::{BlankNode, Literal, NamedNode, Quad, Term};

pub use value::{Aggregate, Properties, Value};

pub use vocab::{Datatype, PrefixError, PrefixMap};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
