//! Term evaluation and aggregated property values
//!
//! Two evaluation modes exist. [`object_value`] keeps nodes as handles so the
//! materializer can decide whether to nest them; [`term_value`] replaces named
//! nodes with their id. Both decode literals.

use crate::literal::{self, LiteralResult, LiteralValue};
use crate::pojo::ObjectId;
use crate::term::Term;
use indexmap::IndexMap;
use std::sync::Arc;

/// Predicate id → aggregated values, in first-seen order
pub type Properties = IndexMap<String, Aggregate>;

/// A value produced from a term
#[derive(Debug, Clone)]
pub enum Value {
    /// Decoded literal
    Literal(LiteralValue),
    /// Node replaced by its id
    Id(String),
    /// Node handle (blank nodes, and named nodes in object-value mode)
    Node(Arc<Term>),
    /// Nested object inside a materialized graph
    Object(ObjectId),
    /// Literal whose encoding could not be read
    Undefined,
}

// Node handles compare by identity, everything else by value
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Literal(a), Value::Literal(b)) => a == b,
            (Value::Id(a), Value::Id(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Undefined, Value::Undefined) => true,
            _ => false,
        }
    }
}

impl Value {
    /// Text of a string literal or an id
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Literal(lit) => lit.as_str(),
            Value::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Decoded literal, if any
    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match self {
            Value::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Node handle, if any
    pub fn as_node(&self) -> Option<&Arc<Term>> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Nested object id, if any
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// JSON form of a value that does not reference a materialized object.
    ///
    /// Nodes render as `{"@id": ...}`; objects need their arena, see
    /// [`crate::Pojo::to_json`], and render as `null` here.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Literal(lit) => lit.to_json(),
            Value::Id(id) => serde_json::Value::String(id.clone()),
            Value::Node(node) => serde_json::json!({ "@id": node.id() }),
            Value::Object(_) | Value::Undefined => serde_json::Value::Null,
        }
    }

    /// Whether a bare aggregate holding this value counts as holding nothing:
    /// `false`, zero, NaN, the empty string and undefined
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            Value::Literal(LiteralValue::String(s)) => s.is_empty(),
            Value::Literal(LiteralValue::Boolean(b)) => !b,
            Value::Literal(LiteralValue::Integer(i)) => *i == 0,
            Value::Literal(LiteralValue::Number(n)) => *n == 0.0 || n.is_nan(),
            Value::Literal(LiteralValue::Bytes(_)) => false,
            Value::Id(id) => id.is_empty(),
            Value::Node(_) | Value::Object(_) => false,
            Value::Undefined => true,
        }
    }

    /// Hashable key with set semantics: nodes by identity, NaN equal to NaN
    pub(crate) fn dedup_key(&self) -> ValueKey<'_> {
        match self {
            Value::Literal(LiteralValue::String(s)) => ValueKey::String(s),
            Value::Literal(LiteralValue::Boolean(b)) => ValueKey::Boolean(*b),
            Value::Literal(LiteralValue::Integer(i)) => ValueKey::Integer(*i),
            Value::Literal(LiteralValue::Number(n)) => ValueKey::Number(number_bits(*n)),
            Value::Literal(LiteralValue::Bytes(b)) => ValueKey::Bytes(b),
            Value::Id(id) => ValueKey::Id(id),
            Value::Node(node) => ValueKey::Node(Arc::as_ptr(node)),
            Value::Object(id) => ValueKey::Object(*id),
            Value::Undefined => ValueKey::Undefined,
        }
    }
}

fn number_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey<'a> {
    String(&'a str),
    Boolean(bool),
    Integer(i64),
    Number(u64),
    Bytes(&'a [u8]),
    Id(&'a str),
    Node(*const Term),
    Object(ObjectId),
    Undefined,
}

/// Values collected for one predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// A bare value (only produced when flattening)
    Single(Value),
    /// Every value seen, in order
    Many(Vec<Value>),
}

impl Aggregate {
    /// Start an aggregate for the first value of a predicate
    pub fn first(value: Value, flatten: bool) -> Self {
        if flatten {
            Aggregate::Single(value)
        } else {
            Aggregate::Many(vec![value])
        }
    }

    /// Add another value; a bare value turns into a two-element sequence
    pub fn append(&mut self, value: Value) {
        if let Aggregate::Many(values) = self {
            values.push(value);
            return;
        }
        let prior = std::mem::replace(self, Aggregate::Many(Vec::with_capacity(2)));
        if let (Aggregate::Many(values), Aggregate::Single(prior)) = (self, prior) {
            values.push(prior);
            values.push(value);
        }
    }

    /// All values as a slice
    pub fn values(&self) -> &[Value] {
        match self {
            Aggregate::Single(value) => std::slice::from_ref(value),
            Aggregate::Many(values) => values,
        }
    }

    /// The bare value, if this aggregate was flattened
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Aggregate::Single(value) => Some(value),
            Aggregate::Many(_) => None,
        }
    }

    /// Number of values held
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Whether no value is held
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Iterate over the held values
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values().iter()
    }

    /// Check whether any held value equals `value`
    pub fn contains(&self, value: &Value) -> bool {
        self.values().contains(value)
    }

    /// JSON form; see [`Value::to_json`]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Aggregate::Single(value) => value.to_json(),
            Aggregate::Many(values) => values.iter().map(Value::to_json).collect(),
        }
    }
}

/// Add `value` under `key` following the aggregation policy.
///
/// A bare value that is blank (see [`Value::is_blank`]) counts as no value
/// and is replaced rather than paired.
pub fn accumulate(properties: &mut Properties, key: &str, value: Value, flatten: bool) {
    match properties.get_mut(key) {
        Some(Aggregate::Single(prior)) if prior.is_blank() => *prior = value,
        Some(aggregate) => aggregate.append(value),
        None => {
            properties.insert(key.to_string(), Aggregate::first(value, flatten));
        }
    }
}

/// JSON object for a property map built by [`crate::QuadReader::all_po`]
pub fn properties_to_json(properties: &Properties) -> serde_json::Value {
    properties
        .iter()
        .map(|(key, aggregate)| (key.clone(), aggregate.to_json()))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn decoded(term: &Term) -> LiteralResult<Option<Value>> {
    match term {
        Term::Literal(lit) => Ok(Some(
            literal::decode(lit.encoded())?.map_or(Value::Undefined, Value::Literal),
        )),
        _ => Ok(None),
    }
}

/// Object-value mode: literals decode, nodes stay handles
pub fn object_value(term: &Arc<Term>) -> LiteralResult<Value> {
    Ok(decoded(term)?.unwrap_or_else(|| Value::Node(Arc::clone(term))))
}

/// Full term-value mode: literals decode, named nodes become their id,
/// blank nodes stay handles
pub fn term_value(term: &Arc<Term>) -> LiteralResult<Value> {
    if let Some(value) = decoded(term)? {
        return Ok(value);
    }
    Ok(match term.as_ref() {
        Term::NamedNode(node) => Value::Id(node.as_str().to_string()),
        _ => Value::Node(Arc::clone(term)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::LiteralError;
    use crate::vocab::xsd;

    #[test]
    fn test_object_value_modes() {
        let named = Term::named("A");
        let blank = Term::blank("_:b1");
        let lit = Term::literal(format!("\"42\"^^{}", xsd::INTEGER));

        assert_eq!(object_value(&named).unwrap(), Value::Node(Arc::clone(&named)));
        assert_eq!(object_value(&blank).unwrap(), Value::Node(Arc::clone(&blank)));
        assert_eq!(object_value(&lit).unwrap(), Value::Literal(LiteralValue::Integer(42)));
    }

    #[test]
    fn test_term_value_modes() {
        let named = Term::named("A");
        let blank = Term::blank("_:b1");

        assert_eq!(term_value(&named).unwrap(), Value::Id("A".into()));
        assert_eq!(term_value(&blank).unwrap(), Value::Node(Arc::clone(&blank)));
        assert_eq!(
            term_value(&Term::literal("\"foo\"")).unwrap(),
            Value::Literal(LiteralValue::String("foo".into()))
        );
    }

    #[test]
    fn test_unquoted_literal_is_undefined() {
        assert_eq!(term_value(&Term::literal("foo")).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_evaluation_propagates_decode_errors() {
        let lit = Term::literal("\"x\"^^http://example.org/custom");
        assert!(matches!(object_value(&lit), Err(LiteralError::UnsupportedDatatype(_))));
        assert!(matches!(term_value(&lit), Err(LiteralError::UnsupportedDatatype(_))));
    }

    #[test]
    fn test_node_values_compare_by_identity() {
        let a1 = Term::named("A");
        let a2 = Term::named("A");
        assert_ne!(Value::Node(a1.clone()), Value::Node(a2));
        assert_eq!(Value::Node(a1.clone()), Value::Node(a1));
    }

    #[test]
    fn test_accumulate_wraps_unless_flattening() {
        let mut props = Properties::new();
        accumulate(&mut props, "is", Value::Id("B".into()), false);
        assert_eq!(props["is"], Aggregate::Many(vec![Value::Id("B".into())]));

        let mut props = Properties::new();
        accumulate(&mut props, "is", Value::Id("B".into()), true);
        assert_eq!(props["is"], Aggregate::Single(Value::Id("B".into())));

        accumulate(&mut props, "is", Value::Id("C".into()), true);
        accumulate(&mut props, "is", Value::Id("D".into()), true);
        assert_eq!(
            props["is"],
            Aggregate::Many(vec![Value::Id("B".into()), Value::Id("C".into()), Value::Id("D".into())])
        );
    }

    #[test]
    fn test_blank_bare_value_is_replaced() {
        let mut props = Properties::new();
        accumulate(&mut props, "flag", Value::Literal(LiteralValue::Boolean(false)), true);
        accumulate(&mut props, "flag", Value::Literal(LiteralValue::Boolean(true)), true);
        assert_eq!(props["flag"], Aggregate::Single(Value::Literal(LiteralValue::Boolean(true))));

        for blank in [
            Value::Literal(LiteralValue::Integer(0)),
            Value::Literal(LiteralValue::Number(f64::NAN)),
            Value::Literal(LiteralValue::String(String::new())),
            Value::Undefined,
        ] {
            let mut props = Properties::new();
            accumulate(&mut props, "p", blank, true);
            accumulate(&mut props, "p", Value::Id("B".into()), true);
            accumulate(&mut props, "p", Value::Id("C".into()), true);
            assert_eq!(props["p"], Aggregate::Many(vec![Value::Id("B".into()), Value::Id("C".into())]));
        }
    }

    #[test]
    fn test_blank_values_still_pair_inside_sequences() {
        let mut props = Properties::new();
        accumulate(&mut props, "n", Value::Literal(LiteralValue::Integer(0)), false);
        accumulate(&mut props, "n", Value::Literal(LiteralValue::Integer(1)), false);
        assert_eq!(props["n"].len(), 2);

        // a blank value arriving second is kept
        let mut props = Properties::new();
        accumulate(&mut props, "n", Value::Literal(LiteralValue::Integer(1)), true);
        accumulate(&mut props, "n", Value::Literal(LiteralValue::Integer(0)), true);
        assert_eq!(props["n"].len(), 2);
    }

    #[test]
    fn test_dedup_key_treats_nan_as_equal() {
        let a = Value::Literal(LiteralValue::Number(f64::NAN));
        let b = Value::Literal(LiteralValue::Number(f64::NAN));
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_ne!(a, b);
    }

    #[test]
    fn test_aggregate_json() {
        let blank = Term::blank("_:b1");
        let agg = Aggregate::Many(vec![Value::Id("B".into()), Value::Node(blank)]);
        assert_eq!(agg.to_json(), serde_json::json!(["B", { "@id": "_:b1" }]));
    }
}
