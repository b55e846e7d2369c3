use quad_reader::{
    Aggregate, LiteralValue, PojoOption, PojoOptions, Quad, QuadReader, ReaderError, Root, Term, TermMatch, Value,
};
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    a: Arc<Term>,
    b1: Arc<Term>,
    reader: QuadReader,
}

// A knows B, B knows C, C named "foo", C is _:b1, _:b1 is A
fn fixture() -> Fixture {
    let (a, b, c) = (Term::named("A"), Term::named("B"), Term::named("C"));
    let (knows, is, named) = (Term::named("knows"), Term::named("is"), Term::named("named"));
    let b1 = Term::blank("_:b1");
    let reader = QuadReader::new(vec![
        Quad::in_default_graph(a.clone(), knows.clone(), b.clone()),
        Quad::in_default_graph(b.clone(), knows, c.clone()),
        Quad::in_default_graph(c.clone(), named, Term::literal("\"foo\"")),
        Quad::in_default_graph(c, is.clone(), b1.clone()),
        Quad::in_default_graph(b1.clone(), is, a.clone()),
    ]);
    Fixture { a, b1, reader }
}

#[test]
fn test_keys_are_named_subject_ids() {
    let f = fixture();
    let pojo = f.reader.pojo(TermMatch::Any, &[]).unwrap();
    assert_eq!(pojo.keys(), vec!["A", "B", "C"]);
    assert_eq!(pojo.subject("A").unwrap().properties().keys().collect::<Vec<_>>(), vec!["knows"]);
    assert_eq!(
        pojo.subject("C").unwrap().properties().keys().collect::<Vec<_>>(),
        vec!["named", "is"]
    );
}

#[test]
fn test_values_are_wrapped_ids_by_default() {
    let f = fixture();
    let pojo = f.reader.pojo(TermMatch::Any, &[]).unwrap();
    assert_eq!(pojo.subject("A").unwrap().get("knows"), Some(&Aggregate::Many(vec![Value::Id("B".into())])));
    assert_eq!(pojo.subject("B").unwrap().get("knows"), Some(&Aggregate::Many(vec![Value::Id("C".into())])));
    assert_eq!(
        pojo.subject("C").unwrap().get("named"),
        Some(&Aggregate::Many(vec![Value::Literal(LiteralValue::String("foo".into()))]))
    );
}

#[test]
fn test_single_subject_by_term_and_id() {
    let f = fixture();
    for pojo in [f.reader.pojo(&f.a, &[]).unwrap(), f.reader.pojo("A", &[]).unwrap()] {
        assert!(matches!(pojo.root(), Root::Object(_)));
        assert_eq!(pojo.keys(), vec!["knows"]);
        assert_eq!(pojo.to_json(), json!({ "knows": ["B"] }));
    }
}

#[test]
fn test_flatten() {
    let f = fixture();
    let pojo = f.reader.pojo(&f.a, &[PojoOption::Flatten]).unwrap();
    assert_eq!(pojo.to_json(), json!({ "knows": "B" }));
}

#[test]
fn test_descend_into_objects() {
    let f = fixture();
    let pojo = f.reader.pojo(&f.a, &[PojoOption::Flatten, PojoOption::Objects]).unwrap();
    let root = pojo.object().unwrap();

    let b = root.get("knows").unwrap().as_single().unwrap().as_object().unwrap();
    assert_eq!(pojo[b].properties().keys().collect::<Vec<_>>(), vec!["knows"]);

    let c = pojo[b].get("knows").unwrap().as_single().unwrap().as_object().unwrap();
    assert_eq!(pojo[c].properties().keys().collect::<Vec<_>>(), vec!["named", "is"]);
    assert_eq!(
        pojo[c].get("named").unwrap().as_single(),
        Some(&Value::Literal(LiteralValue::String("foo".into())))
    );
}

#[test]
fn test_circular_references_are_shared() {
    let f = fixture();
    let pojo = f
        .reader
        .pojo(TermMatch::Any, &[PojoOption::Flatten, PojoOption::Objects])
        .unwrap();
    let Root::Subjects(subjects) = pojo.root() else {
        panic!("expected a subject mapping");
    };

    let knows = |id: &str| pojo.subject(id).unwrap().get("knows").unwrap().as_single().cloned();
    assert_eq!(knows("A"), Some(Value::Object(subjects["B"])));
    assert_eq!(knows("B"), Some(Value::Object(subjects["C"])));

    // C is _:b1 is A, closing the loop through a blank node
    let blank = pojo.subject("C").unwrap().get("is").unwrap().as_single().unwrap().as_object().unwrap();
    assert!(Arc::ptr_eq(pojo[blank].subject(), &f.b1));
    assert_eq!(pojo[blank].get("is").unwrap().as_single(), Some(&Value::Object(subjects["A"])));

    // four objects: A, B, C and the blank node, each built once
    assert_eq!(pojo.len(), 4);
}

#[test]
fn test_cyclic_json_cuts_at_ancestors() {
    let f = fixture();
    let pojo = f.reader.pojo(&f.a, &[PojoOption::Flatten, PojoOption::Objects]).unwrap();
    assert_eq!(
        pojo.to_json(),
        json!({
            "knows": {
                "knows": {
                    "named": "foo",
                    "is": { "is": { "@id": "A" } }
                }
            }
        })
    );
}

#[test]
fn test_blank_node_without_objects_is_the_handle() {
    let f = fixture();
    let pojo = f.reader.pojo("C", &[PojoOption::Flatten]).unwrap();
    let value = pojo.object().unwrap().get("is").unwrap().as_single().unwrap();
    assert!(Arc::ptr_eq(value.as_node().unwrap(), &f.b1));
    assert_eq!(pojo.to_json()["is"], json!({ "@id": "_:b1" }));
}

#[test]
fn test_missing_subject_yields_empty_object() {
    let f = fixture();
    for pojo in [
        f.reader.pojo("X", &[]).unwrap(),
        f.reader.pojo(Term::named("X"), &[PojoOption::Objects]).unwrap(),
    ] {
        assert!(pojo.is_empty());
        assert_eq!(pojo.root(), &Root::Empty);
        assert_eq!(pojo.to_json(), json!({}));
    }
}

#[test]
fn test_invalid_option_fails_before_processing() {
    let err = PojoOptions::parse(["flatten", "deep"]).unwrap_err();
    assert_eq!(err, ReaderError::InvalidArgument("invalid option 'deep'".into()));
    assert_eq!(err.to_string(), "invalid argument: invalid option 'deep'");
}

#[test]
fn test_pojo_on_filtered_reader() {
    let f = fixture();
    let knows_only = f.reader.filter(TermMatch::Any, "knows", TermMatch::Any, TermMatch::Any);
    let pojo = knows_only.pojo(TermMatch::Any, &[PojoOption::Flatten, PojoOption::Objects]).unwrap();
    assert_eq!(pojo.keys(), vec!["A", "B"]);
    assert_eq!(pojo.to_json()["A"], json!({ "knows": { "knows": "C" } }));
}
