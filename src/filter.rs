//! Quad filter compilation
//!
//! A [`QuadPattern`] holds one [`TermMatch`] per quad position. Compiling it
//! picks, once, a predicate containing only the comparisons its shape needs:
//! an AND-chain of zero to four closures, each either a pointer comparison
//! (identity match) or a string comparison against the term id (id match).
//! A pattern with no constraint compiles to no filter at all.

use crate::term::{Quad, Term};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Constraint for one quad position
#[derive(Debug, Clone, Default)]
pub enum TermMatch {
    /// No constraint
    #[default]
    Any,
    /// The very same term instance
    Term(Arc<Term>),
    /// Any term whose id equals this text
    Id(String),
}

impl TermMatch {
    /// Check if this places no constraint; empty id text counts as none
    pub fn is_any(&self) -> bool {
        match self {
            TermMatch::Any => true,
            TermMatch::Term(_) => false,
            TermMatch::Id(id) => id.is_empty(),
        }
    }

    /// The same constraint, with empty id text turned into [`TermMatch::Any`]
    pub fn normalized(self) -> Self {
        if self.is_any() {
            TermMatch::Any
        } else {
            self
        }
    }

    fn mode(&self) -> MatchMode {
        match self {
            TermMatch::Term(_) => MatchMode::Identity,
            TermMatch::Id(id) if !id.is_empty() => MatchMode::ById,
            _ => MatchMode::Absent,
        }
    }

    /// Reference check of a single term, used by [`QuadPattern::matches`]
    fn accepts(&self, term: &Arc<Term>) -> bool {
        match self {
            TermMatch::Any => true,
            TermMatch::Term(expected) => Arc::ptr_eq(expected, term),
            TermMatch::Id(id) => id.is_empty() || term.id() == id.as_str(),
        }
    }
}

impl From<Arc<Term>> for TermMatch {
    fn from(term: Arc<Term>) -> Self {
        TermMatch::Term(term)
    }
}

impl From<&Arc<Term>> for TermMatch {
    fn from(term: &Arc<Term>) -> Self {
        TermMatch::Term(Arc::clone(term))
    }
}

// Empty text places no constraint
impl From<&str> for TermMatch {
    fn from(id: &str) -> Self {
        if id.is_empty() {
            TermMatch::Any
        } else {
            TermMatch::Id(id.to_string())
        }
    }
}

impl From<String> for TermMatch {
    fn from(id: String) -> Self {
        if id.is_empty() {
            TermMatch::Any
        } else {
            TermMatch::Id(id)
        }
    }
}

impl From<&String> for TermMatch {
    fn from(id: &String) -> Self {
        TermMatch::from(id.as_str())
    }
}

impl<T: Into<TermMatch>> From<Option<T>> for TermMatch {
    fn from(value: Option<T>) -> Self {
        value.map_or(TermMatch::Any, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    Absent,
    Identity,
    ById,
}

/// Which comparison each position of a compiled filter performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterShape([MatchMode; 4]);

// Rendered like `SpO`: S/P/O/G for identity, s/p/o/g for id, omitted when absent
impl fmt::Display for FilterShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (mode, letter) in self.0.iter().zip(['s', 'p', 'o', 'g']) {
            match mode {
                MatchMode::Absent => {}
                MatchMode::Identity => write!(f, "{}", letter.to_ascii_uppercase())?,
                MatchMode::ById => write!(f, "{}", letter)?,
            }
        }
        Ok(())
    }
}

type Predicate = Box<dyn Fn(&Quad) -> bool + Send + Sync>;

/// A compiled quad predicate
#[derive(Clone)]
pub struct QuadFilter {
    predicate: Arc<dyn Fn(&Quad) -> bool + Send + Sync>,
    shape: FilterShape,
}

impl QuadFilter {
    /// Test a quad
    #[inline]
    pub fn matches(&self, quad: &Quad) -> bool {
        (self.predicate)(quad)
    }

    /// The comparisons this filter performs
    pub fn shape(&self) -> FilterShape {
        self.shape
    }
}

impl fmt::Debug for QuadFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadFilter")
            .field("shape", &self.shape.to_string())
            .finish()
    }
}

fn subject_of(quad: &Quad) -> &Arc<Term> {
    &quad.subject
}

fn predicate_of(quad: &Quad) -> &Arc<Term> {
    &quad.predicate
}

fn object_of(quad: &Quad) -> &Arc<Term> {
    &quad.object
}

fn graph_of(quad: &Quad) -> &Arc<Term> {
    &quad.graph
}

/// Comparison for one position, or `None` when unconstrained
fn axis<F>(constraint: &TermMatch, position: F) -> Option<Predicate>
where
    F: Fn(&Quad) -> &Arc<Term> + Send + Sync + 'static,
{
    match constraint {
        TermMatch::Any => None,
        TermMatch::Id(id) if id.is_empty() => None,
        TermMatch::Term(term) => {
            let term = Arc::clone(term);
            Some(Box::new(move |quad: &Quad| Arc::ptr_eq(position(quad), &term)))
        }
        TermMatch::Id(id) => {
            let id = id.clone();
            Some(Box::new(move |quad: &Quad| position(quad).id() == id))
        }
    }
}

/// Quad pattern: one optional constraint per position
#[derive(Debug, Clone, Default)]
pub struct QuadPattern {
    /// Subject constraint
    pub subject: TermMatch,
    /// Predicate constraint
    pub predicate: TermMatch,
    /// Object constraint
    pub object: TermMatch,
    /// Graph constraint
    pub graph: TermMatch,
}

impl QuadPattern {
    /// Create a pattern from four constraints
    pub fn new(
        subject: impl Into<TermMatch>,
        predicate: impl Into<TermMatch>,
        object: impl Into<TermMatch>,
        graph: impl Into<TermMatch>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: graph.into(),
        }
    }

    /// Pattern matching every quad
    pub fn any() -> Self {
        Self::default()
    }

    /// Replace the subject constraint
    pub fn with_subject(mut self, subject: impl Into<TermMatch>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Replace the predicate constraint
    pub fn with_predicate(mut self, predicate: impl Into<TermMatch>) -> Self {
        self.predicate = predicate.into();
        self
    }

    /// Replace the object constraint
    pub fn with_object(mut self, object: impl Into<TermMatch>) -> Self {
        self.object = object.into();
        self
    }

    /// Replace the graph constraint
    pub fn with_graph(mut self, graph: impl Into<TermMatch>) -> Self {
        self.graph = graph.into();
        self
    }

    /// Check if no position is constrained
    pub fn is_unconstrained(&self) -> bool {
        self.subject.is_any() && self.predicate.is_any() && self.object.is_any() && self.graph.is_any()
    }

    /// The shape a compiled filter for this pattern has
    pub fn shape(&self) -> FilterShape {
        FilterShape([
            self.subject.mode(),
            self.predicate.mode(),
            self.object.mode(),
            self.graph.mode(),
        ])
    }

    /// Compile into a specialized predicate; `None` means "always passes"
    pub fn compile(&self) -> Option<QuadFilter> {
        let predicate = [
            axis(&self.subject, subject_of),
            axis(&self.predicate, predicate_of),
            axis(&self.object, object_of),
            axis(&self.graph, graph_of),
        ]
        .into_iter()
        .flatten()
        .reduce(|left, right| -> Predicate {
            Box::new(move |quad: &Quad| left(quad) && right(quad))
        })?;

        let shape = self.shape();
        trace!(shape = %shape, "compiled quad filter");

        Some(QuadFilter {
            predicate: Arc::from(predicate),
            shape,
        })
    }

    /// Check a single quad without compiling
    pub fn matches(&self, quad: &Quad) -> bool {
        self.subject.accepts(&quad.subject)
            && self.predicate.accepts(&quad.predicate)
            && self.object.accepts(&quad.object)
            && self.graph.accepts(&quad.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        a: Arc<Term>,
        b: Arc<Term>,
        knows: Arc<Term>,
        graph: Arc<Term>,
        quads: Vec<Quad>,
    }

    fn fixture() -> Fixture {
        let a = Term::named("A");
        let b = Term::named("B");
        let knows = Term::named("knows");
        let graph = Term::default_graph();
        // a second "A" instance that only id matching can see
        let other_a = Term::named("A");
        let quads = vec![
            Quad::new(a.clone(), knows.clone(), b.clone(), graph.clone()),
            Quad::new(b.clone(), knows.clone(), a.clone(), graph.clone()),
            Quad::new(other_a, knows.clone(), b.clone(), Term::named("G")),
        ];
        Fixture { a, b, knows, graph, quads }
    }

    #[test]
    fn test_unconstrained_compiles_to_none() {
        assert!(QuadPattern::any().compile().is_none());
        assert!(QuadPattern::new(None::<&str>, "", TermMatch::Any, None::<Arc<Term>>)
            .compile()
            .is_none());
    }

    #[test]
    fn test_empty_id_is_absent() {
        let f = fixture();
        let empty = TermMatch::Id(String::new());
        assert!(empty.is_any());
        assert!(matches!(empty.clone().normalized(), TermMatch::Any));

        let pattern = QuadPattern::new(empty.clone(), &f.knows, TermMatch::Any, empty);
        assert_eq!(pattern.shape().to_string(), "P");
        let filter = pattern.compile().unwrap();
        assert_eq!(f.quads.iter().filter(|q| filter.matches(q)).count(), 3);
        assert!(f.quads.iter().all(|q| pattern.matches(q)));

        let graph_only = QuadPattern::any().with_graph(TermMatch::Id(String::new()));
        assert!(graph_only.is_unconstrained());
        assert!(graph_only.compile().is_none());
    }

    #[test]
    fn test_identity_match() {
        let f = fixture();
        let filter = QuadPattern::any().with_subject(&f.a).compile().unwrap();
        let hits: Vec<_> = f.quads.iter().filter(|q| filter.matches(q)).collect();
        assert_eq!(hits.len(), 1);
        assert!(Arc::ptr_eq(&hits[0].subject, &f.a));
    }

    #[test]
    fn test_id_match_sees_every_instance() {
        let f = fixture();
        let filter = QuadPattern::any().with_subject("A").compile().unwrap();
        assert_eq!(f.quads.iter().filter(|q| filter.matches(q)).count(), 2);
    }

    #[test]
    fn test_conjunction() {
        let f = fixture();
        let filter = QuadPattern::new(&f.a, &f.knows, "B", &f.graph).compile().unwrap();
        assert_eq!(f.quads.iter().filter(|q| filter.matches(q)).count(), 1);

        let filter = QuadPattern::new("A", "knows", &f.b, "G").compile().unwrap();
        assert_eq!(f.quads.iter().filter(|q| filter.matches(q)).count(), 1);
    }

    #[test]
    fn test_shape_display() {
        let f = fixture();
        assert_eq!(QuadPattern::new(&f.a, "knows", TermMatch::Any, "G").shape().to_string(), "Spg");
        assert_eq!(QuadPattern::any().with_object(&f.b).shape().to_string(), "O");
        assert_eq!(QuadPattern::any().shape().to_string(), "");
    }

    #[test]
    fn test_every_shape_agrees_with_reference_check() {
        let f = fixture();
        let choices = |term: &Arc<Term>| {
            [
                TermMatch::Any,
                TermMatch::Term(Arc::clone(term)),
                TermMatch::Id(term.id().to_string()),
            ]
        };

        let mut shapes = std::collections::HashSet::new();
        for s in choices(&f.a) {
            for p in choices(&f.knows) {
                for o in choices(&f.b) {
                    for g in choices(&f.graph) {
                        let pattern = QuadPattern::new(s.clone(), p.clone(), o.clone(), g.clone());
                        shapes.insert(pattern.shape().to_string());
                        let compiled = pattern.compile();
                        assert_eq!(compiled.is_none(), pattern.is_unconstrained());
                        for quad in &f.quads {
                            let expected = pattern.matches(quad);
                            let actual = compiled.as_ref().map_or(true, |c| c.matches(quad));
                            assert_eq!(actual, expected, "shape {}", pattern.shape());
                        }
                    }
                }
            }
        }
        assert_eq!(shapes.len(), 81);
    }
}
