//! Turtle family parsers (Turtle, TriG, N-Triples, N-Quads) on top of rio

use super::{ParseError, ParseResult, RdfFormat, TermInterner};
use crate::term::{Quad, Term};
use oxiri::Iri;
use rio_api::model;
use rio_api::parser::{QuadsParser, TriplesParser};
use rio_turtle::{NQuadsParser, NTriplesParser, TriGParser, TurtleParser};
use std::io::BufRead;
use std::sync::Arc;

/// Collects rio statements as interned quads
struct QuadSink<'i> {
    interner: &'i mut TermInterner,
    quads: Vec<Quad>,
}

impl QuadSink<'_> {
    fn triple(&mut self, triple: model::Triple<'_>) -> ParseResult<()> {
        let subject = self.subject(triple.subject)?;
        let predicate = self.interner.named(triple.predicate.iri);
        let object = self.term(triple.object)?;
        self.quads.push(Quad::new(subject, predicate, object, Term::default_graph()));
        Ok(())
    }

    fn quad(&mut self, quad: model::Quad<'_>) -> ParseResult<()> {
        let subject = self.subject(quad.subject)?;
        let predicate = self.interner.named(quad.predicate.iri);
        let object = self.term(quad.object)?;
        let graph = match quad.graph_name {
            None => Term::default_graph(),
            Some(model::GraphName::NamedNode(node)) => self.interner.named(node.iri),
            Some(model::GraphName::BlankNode(node)) => self.blank(node),
        };
        self.quads.push(Quad::new(subject, predicate, object, graph));
        Ok(())
    }

    fn blank(&mut self, node: model::BlankNode<'_>) -> Arc<Term> {
        self.interner.blank(&format!("_:{}", node.id))
    }

    fn subject(&mut self, subject: model::Subject<'_>) -> ParseResult<Arc<Term>> {
        match subject {
            model::Subject::NamedNode(node) => Ok(self.interner.named(node.iri)),
            model::Subject::BlankNode(node) => Ok(self.blank(node)),
            #[allow(unreachable_patterns)]
            other => Err(ParseError::UnsupportedTerm(other.to_string())),
        }
    }

    fn term(&mut self, term: model::Term<'_>) -> ParseResult<Arc<Term>> {
        match term {
            model::Term::NamedNode(node) => Ok(self.interner.named(node.iri)),
            model::Term::BlankNode(node) => Ok(self.blank(node)),
            model::Term::Literal(model::Literal::Simple { value }) => {
                Ok(self.interner.literal_parts(value, None, None))
            }
            model::Term::Literal(model::Literal::LanguageTaggedString { value, language }) => {
                Ok(self.interner.literal_parts(value, None, Some(language)))
            }
            model::Term::Literal(model::Literal::Typed { value, datatype }) => {
                Ok(self.interner.literal_parts(value, Some(datatype.iri), None))
            }
            #[allow(unreachable_patterns)]
            other => Err(ParseError::UnsupportedTerm(other.to_string())),
        }
    }
}

fn parse_base(base: &str) -> ParseResult<Iri<String>> {
    Iri::parse(base.to_string()).map_err(|e| ParseError::InvalidBase {
        iri: base.to_string(),
        reason: e.to_string(),
    })
}

pub(super) fn parse<R: BufRead>(
    input: R,
    format: RdfFormat,
    base: Option<&str>,
    interner: &mut TermInterner,
) -> ParseResult<Vec<Quad>> {
    let base = base.map(parse_base).transpose()?;
    let mut sink = QuadSink {
        interner,
        quads: Vec::new(),
    };

    match format {
        RdfFormat::Turtle => TurtleParser::new(input, base)
            .parse_all(&mut |triple| -> ParseResult<()> { sink.triple(triple) })?,
        RdfFormat::NTriples => NTriplesParser::new(input)
            .parse_all(&mut |triple| -> ParseResult<()> { sink.triple(triple) })?,
        RdfFormat::TriG => TriGParser::new(input, base)
            .parse_all(&mut |quad| -> ParseResult<()> { sink.quad(quad) })?,
        RdfFormat::NQuads => NQuadsParser::new(input)
            .parse_all(&mut |quad| -> ParseResult<()> { sink.quad(quad) })?,
    }

    Ok(sink.quads)
}

#[cfg(test)]
mod tests {
    use super::super::RdfParser;
    use super::*;
    use crate::vocab::xsd;

    #[test]
    fn test_turtle_terms_are_interned() {
        let input = r#"
            @prefix ex: <http://example.org/> .
            ex:a ex:knows ex:b .
            ex:b ex:knows ex:a ;
                 ex:age 42 ;
                 ex:name "Bob"@en .
        "#;
        let quads = RdfParser::parse(input, RdfFormat::Turtle, None).unwrap();
        assert_eq!(quads.len(), 4);
        assert!(Arc::ptr_eq(&quads[0].subject, &quads[1].object));
        assert!(Arc::ptr_eq(&quads[0].predicate, &quads[1].predicate));
        assert_eq!(quads[2].object.id(), format!("\"42\"^^{}", xsd::INTEGER));
        assert_eq!(quads[3].object.id(), "\"Bob\"@en");
        assert!(quads.iter().all(|q| q.graph.is_default_graph()));
    }

    #[test]
    fn test_relative_iris_resolve_against_base() {
        let quads = RdfParser::parse("<a> <p> <b> .", RdfFormat::Turtle, Some("http://example.org/doc/")).unwrap();
        assert_eq!(quads[0].subject.id(), "http://example.org/doc/a");
    }

    #[test]
    fn test_invalid_base() {
        let err = RdfParser::parse("<a> <p> <b> .", RdfFormat::Turtle, Some("not an iri")).unwrap_err();
        assert!(matches!(err, ParseError::InvalidBase { .. }));
    }

    #[test]
    fn test_blank_nodes_are_prefixed_and_shared() {
        let input = "_:x <http://example.org/p> _:y .\n_:y <http://example.org/p> _:x .\n";
        let quads = RdfParser::parse(input, RdfFormat::NTriples, None).unwrap();
        assert_eq!(quads[0].subject.id(), "_:x");
        assert!(Arc::ptr_eq(&quads[0].subject, &quads[1].object));
    }

    #[test]
    fn test_nquads_graphs() {
        let input = concat!(
            "<http://example.org/a> <http://example.org/p> \"v\" <http://example.org/g> .\n",
            "<http://example.org/a> <http://example.org/p> \"w\" .\n",
        );
        let quads = RdfParser::parse(input, RdfFormat::NQuads, None).unwrap();
        assert_eq!(quads[0].graph.id(), "http://example.org/g");
        assert!(quads[1].graph.is_default_graph());
    }

    #[test]
    fn test_trig_graphs() {
        let input = r#"
            @prefix ex: <http://example.org/> .
            ex:g { ex:a ex:p ex:b . }
            ex:c ex:p ex:d .
        "#;
        let quads = RdfParser::parse(input, RdfFormat::TriG, None).unwrap();
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].graph.id(), "http://example.org/g");
        assert!(quads[1].graph.is_default_graph());
    }

    #[test]
    fn test_syntax_error() {
        let err = RdfParser::parse("<http://example.org/a> <http://example.org/p>", RdfFormat::Turtle, None)
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }
}
