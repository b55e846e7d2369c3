//! Graph materialization
//!
//! Converts the quads of a reader into nested objects, one per subject.
//! Objects live in an arena and reference each other by [`ObjectId`], so a
//! cycle in the data becomes a cycle of ids rather than an infinite tree.
//!
//! Within one call every subject is materialized at most once. Its slot is
//! allocated and cached before any of its fields are filled, which is what
//! lets a descendant point back at an ancestor that is still being built.

use crate::filter::{QuadPattern, TermMatch};
use crate::reader::{QuadReader, ReaderError, ReaderResult};
use crate::term::{Quad, Term};
use crate::value::{self, Properties, Value};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, trace};

/// Materialization option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PojoOption {
    /// Predicates seen once hold a bare value instead of a sequence
    Flatten,
    /// Node values are replaced by nested objects
    Objects,
}

impl FromStr for PojoOption {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flatten" => Ok(PojoOption::Flatten),
            "objects" => Ok(PojoOption::Objects),
            _ => Err(ReaderError::InvalidArgument(format!("invalid option '{}'", s))),
        }
    }
}

impl fmt::Display for PojoOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PojoOption::Flatten => write!(f, "flatten"),
            PojoOption::Objects => write!(f, "objects"),
        }
    }
}

/// Option set for [`QuadReader::pojo_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PojoOptions {
    pub flatten: bool,
    pub objects: bool,
}

impl PojoOptions {
    /// Collect an option list; repeats are harmless
    pub fn from_options(options: &[PojoOption]) -> Self {
        Self {
            flatten: options.contains(&PojoOption::Flatten),
            objects: options.contains(&PojoOption::Objects),
        }
    }

    /// Parse option names, failing on the first unknown one
    pub fn parse<I, S>(names: I) -> ReaderResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let options = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<ReaderResult<Vec<PojoOption>>>()?;
        Ok(Self::from_options(&options))
    }
}

/// Index of an object inside a [`Pojo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One materialized subject
#[derive(Debug, Clone)]
pub struct PojoObject {
    subject: Arc<Term>,
    properties: Properties,
}

impl PojoObject {
    /// The subject this object was built from
    pub fn subject(&self) -> &Arc<Term> {
        &self.subject
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Aggregate stored under a predicate id
    pub fn get(&self, predicate: &str) -> Option<&value::Aggregate> {
        self.properties.get(predicate)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// What a materialization call returned
#[derive(Debug, Clone, PartialEq)]
pub enum Root {
    /// The requested subject was not found
    Empty,
    /// A single requested subject
    Object(ObjectId),
    /// Every named subject, keyed by id
    Subjects(IndexMap<String, ObjectId>),
}

/// Result of a materialization call: an arena of objects plus its root
#[derive(Debug, Clone)]
pub struct Pojo {
    arena: Vec<PojoObject>,
    root: Root,
}

impl Pojo {
    fn empty() -> Self {
        Self {
            arena: Vec::new(),
            root: Root::Empty,
        }
    }

    /// Check if the result has no entries at all
    pub fn is_empty(&self) -> bool {
        match &self.root {
            Root::Empty => true,
            Root::Object(id) => self[*id].is_empty(),
            Root::Subjects(subjects) => subjects.is_empty(),
        }
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    /// The object for a subject id, when every subject was requested
    pub fn subject(&self, id: &str) -> Option<&PojoObject> {
        match &self.root {
            Root::Subjects(subjects) => subjects.get(id).map(|object| &self[*object]),
            _ => None,
        }
    }

    /// Subject ids of the top-level mapping, in first-seen order
    pub fn subject_ids(&self) -> impl Iterator<Item = &str> {
        let subjects = match &self.root {
            Root::Subjects(subjects) => Some(subjects),
            _ => None,
        };
        subjects.into_iter().flat_map(|s| s.keys().map(String::as_str))
    }

    /// The root object, when a single subject was requested
    pub fn object(&self) -> Option<&PojoObject> {
        match &self.root {
            Root::Object(id) => Some(&self[*id]),
            _ => None,
        }
    }

    /// Number of objects built, including nested ones
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Keys of the root: predicate ids for a single object, subject ids for
    /// the full mapping
    pub fn keys(&self) -> Vec<&str> {
        match &self.root {
            Root::Empty => Vec::new(),
            Root::Object(id) => self[*id].properties.keys().map(String::as_str).collect(),
            Root::Subjects(subjects) => subjects.keys().map(String::as_str).collect(),
        }
    }

    /// JSON rendering.
    ///
    /// Each object is expanded at most once per call: any later reference to
    /// it, including one back to an ancestor, becomes `{"@id": subject}`.
    /// Every entry of a subject mapping is expanded at its own key.
    pub fn to_json(&self) -> serde_json::Value {
        let mut renderer = JsonRenderer::new(self);
        match &self.root {
            Root::Empty => serde_json::Value::Object(serde_json::Map::new()),
            Root::Object(id) => renderer.render(*id),
            Root::Subjects(subjects) => subjects
                .iter()
                .map(|(key, id)| (key.clone(), renderer.render(*id)))
                .collect::<serde_json::Map<_, _>>()
                .into(),
        }
    }

    fn reference_json(&self, id: ObjectId) -> serde_json::Value {
        serde_json::json!({ "@id": self[id].subject.id() })
    }
}

/// Position of a reference: owning object, property index, value index
type Site = (ObjectId, usize, usize);

/// State of one `to_json` call
struct JsonRenderer<'p> {
    pojo: &'p Pojo,
    expanded: FxHashSet<ObjectId>,
}

impl<'p> JsonRenderer<'p> {
    fn new(pojo: &'p Pojo) -> Self {
        Self {
            pojo,
            expanded: FxHashSet::default(),
        }
    }

    /// Object references held by `id`, in property order
    fn references(&self, id: ObjectId) -> impl Iterator<Item = (Site, ObjectId)> + 'p {
        let pojo = self.pojo;
        pojo[id]
            .properties
            .values()
            .enumerate()
            .flat_map(move |(p, aggregate)| {
                aggregate
                    .iter()
                    .enumerate()
                    .filter_map(move |(v, value)| value.as_object().map(|child| ((id, p, v), child)))
            })
    }

    /// Expand `root`, then every object first reached below it.
    ///
    /// A depth-first pass picks the one site at which each object expands;
    /// the JSON is then assembled bottom-up in reverse visiting order.
    fn render(&mut self, root: ObjectId) -> serde_json::Value {
        let pojo = self.pojo;
        self.expanded.insert(root);
        let mut order = vec![root];
        let mut sites: FxHashMap<ObjectId, Site> = FxHashMap::default();

        let mut stack: Vec<(Site, ObjectId)> = self.references(root).collect();
        stack.reverse();
        while let Some((site, id)) = stack.pop() {
            if !self.expanded.insert(id) {
                continue;
            }
            sites.insert(id, site);
            order.push(id);
            let start = stack.len();
            stack.extend(self.references(id));
            stack[start..].reverse();
        }

        let mut rendered: FxHashMap<ObjectId, serde_json::Value> = FxHashMap::default();
        for &id in order.iter().rev() {
            let mut map = serde_json::Map::new();
            for (p, (key, aggregate)) in pojo[id].properties.iter().enumerate() {
                let mut value_json = |v: usize, value: &Value| match value {
                    Value::Object(child) if sites.get(child) == Some(&(id, p, v)) => {
                        rendered.remove(child).unwrap_or_default()
                    }
                    Value::Object(child) => pojo.reference_json(*child),
                    other => other.to_json(),
                };
                let json = match aggregate {
                    value::Aggregate::Single(value) => value_json(0, value),
                    value::Aggregate::Many(values) => values
                        .iter()
                        .enumerate()
                        .map(|(v, value)| value_json(v, value))
                        .collect(),
                };
                map.insert(key.clone(), json);
            }
            rendered.insert(id, map.into());
        }

        rendered.remove(&root).unwrap_or_default()
    }
}

impl Index<ObjectId> for Pojo {
    type Output = PojoObject;

    fn index(&self, id: ObjectId) -> &Self::Output {
        &self.arena[id.0]
    }
}

/// Per-call materialization state
struct Materializer<'a> {
    options: PojoOptions,
    subjects: FxHashSet<*const Term>,
    by_subject: FxHashMap<*const Term, Vec<&'a Quad>>,
    cache: FxHashMap<*const Term, Value>,
    arena: Vec<PojoObject>,
    pending: Vec<ObjectId>,
}

impl<'a> Materializer<'a> {
    fn new(reader: &'a QuadReader, subjects: &[Arc<Term>], options: PojoOptions) -> Self {
        let mut by_subject: FxHashMap<*const Term, Vec<&'a Quad>> = FxHashMap::default();
        for quad in reader {
            by_subject.entry(Arc::as_ptr(&quad.subject)).or_default().push(quad);
        }
        Self {
            options,
            subjects: subjects.iter().map(Arc::as_ptr).collect(),
            by_subject,
            cache: FxHashMap::default(),
            arena: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Value standing for `node`: its object when it is a subject (allocated
    /// and queued on first sight), otherwise its id.
    fn enter(&mut self, node: &Arc<Term>) -> Value {
        let key = Arc::as_ptr(node);
        if let Some(value) = self.cache.get(&key) {
            return value.clone();
        }

        let value = if self.subjects.contains(&key) {
            let id = ObjectId(self.arena.len());
            self.arena.push(PojoObject {
                subject: Arc::clone(node),
                properties: Properties::new(),
            });
            self.pending.push(id);
            Value::Object(id)
        } else {
            Value::Id(node.id().to_string())
        };

        self.cache.insert(key, value.clone());
        value
    }

    /// Fill every queued object
    fn drain(&mut self) -> ReaderResult<()> {
        while let Some(id) = self.pending.pop() {
            let subject = Arc::clone(&self.arena[id.0].subject);
            let quads = self.by_subject.get(&Arc::as_ptr(&subject)).cloned().unwrap_or_default();

            let mut properties = Properties::new();
            for quad in quads {
                let candidate = value::object_value(&quad.object)?;
                let value = match candidate {
                    Value::Node(node) if self.options.objects => self.enter(&node),
                    Value::Node(node) if node.is_named_node() => Value::Id(node.id().to_string()),
                    other => other,
                };
                value::accumulate(&mut properties, quad.predicate.id(), value, self.options.flatten);
            }

            trace!(subject = subject.id(), predicates = properties.len(), "materialized subject");
            self.arena[id.0].properties = properties;
        }
        Ok(())
    }

    fn finish(self, root: Root) -> Pojo {
        Pojo {
            arena: self.arena,
            root,
        }
    }
}

impl QuadReader {
    /// Materialize this reader's quads.
    ///
    /// `subject` may be a term handle, a subject id, or [`TermMatch::Any`]
    /// for a mapping of every named subject.
    pub fn pojo(&self, subject: impl Into<TermMatch>, options: &[PojoOption]) -> ReaderResult<Pojo> {
        self.pojo_with(subject, PojoOptions::from_options(options))
    }

    /// Same as [`QuadReader::pojo`] with an already collected option set
    pub fn pojo_with(&self, subject: impl Into<TermMatch>, options: PojoOptions) -> ReaderResult<Pojo> {
        let subjects = self.subjects();

        let root = match subject.into().normalized() {
            TermMatch::Any => None,
            TermMatch::Term(term) => Some(term),
            TermMatch::Id(id) => {
                let pattern = QuadPattern::any().with_subject(id);
                match self.scan(&pattern).next() {
                    Some(quad) => Some(Arc::clone(&quad.subject)),
                    None => return Ok(Pojo::empty()),
                }
            }
        };

        let mut materializer = Materializer::new(self, &subjects, options);

        let pojo = match root {
            Some(root) => {
                if !materializer.subjects.contains(&Arc::as_ptr(&root)) {
                    debug!(subject = root.id(), "subject not in quad set");
                    return Ok(Pojo::empty());
                }
                let Value::Object(id) = materializer.enter(&root) else {
                    return Ok(Pojo::empty());
                };
                materializer.drain()?;
                materializer.finish(Root::Object(id))
            }
            None => {
                let mut entries = IndexMap::new();
                for subject in subjects.iter().filter(|s| s.is_named_node()) {
                    if let Value::Object(id) = materializer.enter(subject) {
                        materializer.drain()?;
                        entries.insert(subject.id().to_string(), id);
                    }
                }
                materializer.finish(Root::Subjects(entries))
            }
        };

        debug!(
            objects = pojo.len(),
            flatten = options.flatten,
            objects_option = options.objects,
            "materialized quads"
        );
        Ok(pojo)
    }
}
