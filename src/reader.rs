//! Quad reader
//!
//! An immutable, filterable view over a snapshot of quads. Filtering never
//! touches the snapshot: it produces a new reader over the quads the current
//! one yields, so successive filters narrow conjunctively.

use crate::filter::{QuadFilter, QuadPattern, TermMatch};
use crate::literal::LiteralError;
use crate::term::{Quad, Term};
use crate::value::{self, Properties, Value};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Quad reader errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// Caller passed an argument outside the accepted set
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A literal could not be decoded
    #[error(transparent)]
    Literal(#[from] LiteralError),
}

pub type ReaderResult<T> = Result<T, ReaderError>;

/// Iterator over the quads a reader yields
pub struct Quads<'a> {
    quads: std::slice::Iter<'a, Quad>,
    filter: Option<&'a QuadFilter>,
}

impl<'a> Iterator for Quads<'a> {
    type Item = &'a Quad;

    fn next(&mut self) -> Option<Self::Item> {
        match self.filter {
            None => self.quads.next(),
            Some(filter) => self.quads.find(|quad| filter.matches(quad)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (low, high) = self.quads.size_hint();
        match self.filter {
            None => (low, high),
            Some(_) => (0, high),
        }
    }
}

/// Immutable view over a quad snapshot plus an optional compiled filter
#[derive(Clone)]
pub struct QuadReader {
    quads: Arc<[Quad]>,
    filter: Option<QuadFilter>,
}

impl QuadReader {
    /// Create a reader over every quad
    pub fn new<I>(quads: I) -> Self
    where
        I: IntoIterator<Item = Quad>,
    {
        Self::from_snapshot(quads.into_iter().collect(), None)
    }

    /// Create a reader over the quads matching `pattern`
    pub fn with_pattern<I>(quads: I, pattern: &QuadPattern) -> Self
    where
        I: IntoIterator<Item = Quad>,
    {
        Self::from_snapshot(quads.into_iter().collect(), pattern.compile())
    }

    fn from_snapshot(quads: Arc<[Quad]>, filter: Option<QuadFilter>) -> Self {
        trace!(
            quads = quads.len(),
            filter = %filter.as_ref().map(|f| f.shape().to_string()).unwrap_or_default(),
            "created quad reader"
        );
        Self { quads, filter }
    }

    /// Iterate over matching quads in their original order
    pub fn iter(&self) -> Quads<'_> {
        Quads {
            quads: self.quads.iter(),
            filter: self.filter.as_ref(),
        }
    }

    /// New reader over this reader's quads, narrowed by four constraints
    pub fn filter(
        &self,
        subject: impl Into<TermMatch>,
        predicate: impl Into<TermMatch>,
        object: impl Into<TermMatch>,
        graph: impl Into<TermMatch>,
    ) -> QuadReader {
        self.matching(&QuadPattern::new(subject, predicate, object, graph))
    }

    /// New reader over this reader's quads, narrowed by `pattern`
    pub fn matching(&self, pattern: &QuadPattern) -> QuadReader {
        let filter = pattern.compile();
        match self.filter {
            // nothing filtered yet, so the snapshot already is the iteration
            None => Self::from_snapshot(Arc::clone(&self.quads), filter),
            Some(_) => Self::from_snapshot(self.iter().cloned().collect(), filter),
        }
    }

    /// Quads matching both this reader's filter and `pattern`, without
    /// building a new snapshot
    pub(crate) fn scan<'a>(&'a self, pattern: &QuadPattern) -> impl Iterator<Item = &'a Quad> + 'a {
        let filter = pattern.compile();
        self.iter()
            .filter(move |quad| filter.as_ref().map_or(true, |f| f.matches(quad)))
    }

    /// Number of matching quads
    pub fn len(&self) -> usize {
        match self.filter {
            None => self.quads.len(),
            Some(_) => self.iter().count(),
        }
    }

    /// Check if no quad matches
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// The compiled filter, if any
    pub fn compiled_filter(&self) -> Option<&QuadFilter> {
        self.filter.as_ref()
    }

    /// Distinct subject terms, in first-seen order
    pub fn subjects(&self) -> Vec<Arc<Term>> {
        unique_terms(self.iter().map(|q| &q.subject))
    }

    /// Distinct predicate terms, in first-seen order
    pub fn predicates(&self) -> Vec<Arc<Term>> {
        unique_terms(self.iter().map(|q| &q.predicate))
    }

    /// Distinct object values (object-value mode), in first-seen order
    pub fn objects(&self) -> ReaderResult<Vec<Value>> {
        let values = self
            .iter()
            .map(|q| value::object_value(&q.object))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = FxHashSet::default();
        let mut unique = Vec::new();
        for (index, value) in values.iter().enumerate() {
            if seen.insert(value.dedup_key()) {
                unique.push(index);
            }
        }
        Ok(unique.into_iter().map(|index| values[index].clone()).collect())
    }

    /// Predicate id → object values (term-value mode).
    ///
    /// Without `flatten` every entry is a sequence; with it, predicates seen
    /// once hold the bare value.
    pub fn all_po(&self, flatten: bool) -> ReaderResult<Properties> {
        let mut properties = Properties::new();
        for quad in self.iter() {
            let value = value::term_value(&quad.object)?;
            value::accumulate(&mut properties, quad.predicate.id(), value, flatten);
        }
        debug!(predicates = properties.len(), flatten, "collected predicate/object map");
        Ok(properties)
    }
}

fn unique_terms<'a>(terms: impl Iterator<Item = &'a Arc<Term>>) -> Vec<Arc<Term>> {
    let mut seen = FxHashSet::default();
    terms
        .filter(|term| seen.insert(Arc::as_ptr(term)))
        .cloned()
        .collect()
}

impl<'a> IntoIterator for &'a QuadReader {
    type Item = &'a Quad;
    type IntoIter = Quads<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Quad> for QuadReader {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Quad>> for QuadReader {
    fn from(quads: Vec<Quad>) -> Self {
        Self::from_snapshot(quads.into(), None)
    }
}

impl Default for QuadReader {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for QuadReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadReader")
            .field("snapshot", &self.quads.len())
            .field("filter", &self.filter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::LiteralValue;
    use crate::value::Aggregate;

    fn quad(s: &Arc<Term>, p: &Arc<Term>, o: &Arc<Term>) -> Quad {
        Quad::in_default_graph(s.clone(), p.clone(), o.clone())
    }

    #[test]
    fn test_empty_reader() {
        let reader = QuadReader::new(Vec::new());
        assert!(reader.is_empty());
        assert_eq!(reader.len(), 0);
        assert!(reader.subjects().is_empty());
    }

    #[test]
    fn test_reader_takes_a_snapshot() {
        let (a, knows, b) = (Term::named("A"), Term::named("knows"), Term::named("B"));
        let mut source = vec![quad(&a, &knows, &b)];
        let reader = QuadReader::new(source.clone());
        source.push(quad(&b, &knows, &a));
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn test_unfiltered_reader_has_no_compiled_filter() {
        let reader = QuadReader::default().filter(TermMatch::Any, None::<&str>, "", TermMatch::Any);
        assert!(reader.compiled_filter().is_none());
    }

    #[test]
    fn test_subjects_are_unique_by_identity() {
        let (a, knows, b, c) = (Term::named("A"), Term::named("knows"), Term::named("B"), Term::named("C"));
        let a_twin = Term::named("A");
        let reader = QuadReader::new(vec![
            quad(&a, &knows, &b),
            quad(&a, &knows, &c),
            quad(&a_twin, &knows, &c),
            quad(&b, &knows, &c),
        ]);

        let subjects = reader.subjects();
        assert_eq!(subjects.len(), 3);
        assert!(Arc::ptr_eq(&subjects[0], &a));
        assert!(Arc::ptr_eq(&subjects[1], &a_twin));
        assert!(Arc::ptr_eq(&subjects[2], &b));

        assert_eq!(reader.predicates().len(), 1);
    }

    #[test]
    fn test_objects_decode_literals_and_dedup() {
        let (a, named, b) = (Term::named("A"), Term::named("named"), Term::named("B"));
        let foo1 = Term::literal("\"foo\"");
        let foo2 = Term::literal("\"foo\"");
        let reader = QuadReader::new(vec![
            quad(&a, &named, &foo1),
            quad(&b, &named, &foo2),
            quad(&a, &named, &b),
            quad(&b, &named, &b),
        ]);

        let objects = reader.objects().unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0], Value::Literal(LiteralValue::String("foo".into())));
        assert_eq!(objects[1], Value::Node(b));
    }

    #[test]
    fn test_all_po_aborts_on_decode_error() {
        let (a, p) = (Term::named("A"), Term::named("p"));
        let reader = QuadReader::new(vec![
            quad(&a, &p, &Term::literal("\"1\"")),
            quad(&a, &p, &Term::literal("\"x\"^^http://example.org/unknown")),
        ]);
        assert!(matches!(reader.all_po(false), Err(ReaderError::Literal(_))));
        assert!(reader.objects().is_err());
    }

    #[test]
    fn test_all_po_keeps_predicate_order() {
        let (a, p, q, r) = (Term::named("A"), Term::named("p"), Term::named("q"), Term::named("r"));
        let reader = QuadReader::new(vec![quad(&a, &q, &r), quad(&a, &p, &r), quad(&a, &q, &p)]);
        let po = reader.all_po(true).unwrap();
        assert_eq!(po.keys().collect::<Vec<_>>(), vec!["q", "p"]);
        assert_eq!(po["p"], Aggregate::Single(Value::Id("r".into())));
    }

    #[test]
    fn test_scan_layers_on_existing_filter() {
        let (a, b, knows, is) = (Term::named("A"), Term::named("B"), Term::named("knows"), Term::named("is"));
        let reader = QuadReader::new(vec![quad(&a, &knows, &b), quad(&a, &is, &b), quad(&b, &knows, &a)])
            .filter(TermMatch::Any, &knows, TermMatch::Any, TermMatch::Any);
        let hits: Vec<_> = reader.scan(&QuadPattern::any().with_subject(&a)).collect();
        assert_eq!(hits.len(), 1);
        assert!(Arc::ptr_eq(&hits[0].predicate, &knows));
    }
}
