//! Markup grammar using chumsky
//!
//! The grammar turns the token stream into a flat list of events (start tag,
//! end tag, text, comment). A stack-based pass then assembles the tree, which
//! is where void elements and tag mismatches are handled.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::lexer::{self, Token};
use super::tree::{is_void, Attr, Element, Node, Span, Spanned};
use crate::error::MarkupError;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Start {
        name: String,
        attrs: Vec<Attr>,
        self_closing: bool,
    },
    End(String),
    Text(String),
    Comment(String),
}

/// Parse a markup fragment into its top-level nodes
pub fn parse_fragment(input: &str) -> Result<Vec<Node>, MarkupError> {
    let len = input.len();
    let token_iter = lexer::lex(input)?
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let events = event_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .map(MarkupError::from)
                .next()
                .unwrap_or_else(|| MarkupError::lex(0..len))
        })?;
    build_tree(events)
}

fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn event_parser<'a, I>(
) -> impl Parser<'a, I, Vec<Spanned<Event>>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let name = select! { Token::AttrName(s) => s }.labelled("attribute name");
    let value = select! { Token::AttrValue(s) => s }.labelled("attribute value");

    let attr = name
        .then(just(Token::Equals).ignore_then(value).or_not())
        .map(|(key, value)| Attr::new(key, decode_entities(&value.unwrap_or_default())));

    let start = select! { Token::TagOpen(s) => s }
        .then(attr.repeated().collect::<Vec<_>>())
        .then(choice((
            just(Token::TagEnd).to(false),
            just(Token::SelfClose).to(true),
        )))
        .map(|((name, attrs), self_closing)| Event::Start {
            name,
            attrs,
            self_closing,
        });

    let other = select! {
        Token::TagClose(s) => Event::End(s),
        Token::Text(s) => Event::Text(decode_entities(&s)),
        Token::Comment(s) => Event::Comment(s),
    };

    choice((start, other))
        .map_with(|event, e| Spanned::new(event, span_range(&e.span())))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
}

fn build_tree(events: Vec<Spanned<Event>>) -> Result<Vec<Node>, MarkupError> {
    let mut roots = Vec::new();
    let mut open: Vec<(Element, Span)> = Vec::new();

    for Spanned { node: event, span } in events {
        match event {
            Event::Start {
                name,
                attrs,
                self_closing,
            } => {
                let mut element = Element::new(name);
                element.attrs = attrs;
                if self_closing || element.is_void() {
                    attach(&mut open, &mut roots, element.into());
                } else {
                    open.push((element, span));
                }
            }
            // `</br>` and friends are tolerated and ignored
            Event::End(name) if is_void(&name) => {}
            Event::End(name) => match open.pop() {
                Some((element, _)) if element.tag == name => {
                    attach(&mut open, &mut roots, element.into())
                }
                Some((element, _)) => {
                    return Err(MarkupError::mismatched_close(element.tag, name, span))
                }
                None => return Err(MarkupError::unexpected_close(name, span)),
            },
            Event::Text(text) => attach(&mut open, &mut roots, Node::Text(text)),
            Event::Comment(text) => attach(&mut open, &mut roots, Node::Comment(text)),
        }
    }

    match open.pop() {
        Some((element, span)) => Err(MarkupError::unclosed(element.tag, span)),
        None => Ok(roots),
    }
}

fn attach(open: &mut [(Element, Span)], roots: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some((parent, _)) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Decode the handful of entities the serializer produces
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        let entity = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&#39;", '\''),
        ]
        .into_iter()
        .find(|(name, _)| rest.starts_with(name));
        match entity {
            Some((name, c)) => {
                out.push(c);
                rest = &rest[name.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_elements() {
        let nodes = parse_fragment(r#"<ul id="todos"><li>A</li><li>B</li></ul>"#)
            .expect("Should parse");
        assert_eq!(
            nodes,
            vec![Element::new("ul")
                .with_attr("id", "todos")
                .with_child(Element::new("li").with_child(Node::text("A")))
                .with_child(Element::new("li").with_child(Node::text("B")))
                .into()]
        );
    }

    #[test]
    fn test_void_and_self_closing() {
        let nodes = parse_fragment(r#"<p>a<br>b<input disabled><x-item/></p>"#)
            .expect("Should parse");
        let p = nodes[0].as_element().unwrap();
        let tags: Vec<_> = p
            .children
            .iter()
            .map(|n| match n {
                Node::Element(e) => e.tag.clone(),
                Node::Text(t) => format!("#{t}"),
                Node::Comment(_) => "!".to_string(),
            })
            .collect();
        assert_eq!(tags, vec!["#a", "br", "#b", "input", "x-item"]);
        let input = p.children[3].as_element().unwrap();
        assert_eq!(input.attr("disabled"), Some(""));
    }

    #[test]
    fn test_entities_decoded() {
        let nodes = parse_fragment(r#"<a title="x &amp; &quot;y&quot;">1 &lt; 2 &copy;</a>"#)
            .expect("Should parse");
        let a = nodes[0].as_element().unwrap();
        assert_eq!(a.attr("title"), Some("x & \"y\""));
        assert_eq!(a.children, vec![Node::text("1 < 2 &copy;")]);
    }

    #[test]
    fn test_multiple_roots_and_comments() {
        let nodes = parse_fragment("<b>x</b><!--c--> tail").expect("Should parse");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1], Node::Comment("c".into()));
        assert_eq!(nodes[2], Node::text(" tail"));
    }

    #[test]
    fn test_mismatched_close() {
        let err = parse_fragment("<div><span></div>").unwrap_err();
        assert_eq!(
            err,
            MarkupError::mismatched_close("span".to_string(), "div".to_string(), 11..17)
        );
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse_fragment("<div><p>x</p>").unwrap_err();
        assert_eq!(err, MarkupError::unclosed("div".to_string(), 0..5));
    }

    #[test]
    fn test_unexpected_close() {
        let err = parse_fragment("x</p>").unwrap_err();
        assert!(matches!(err, MarkupError::UnexpectedClose { .. }));
    }

    #[test]
    fn test_equals_without_value_is_syntax_error() {
        let err = parse_fragment("<a href=>x</a>").unwrap_err();
        assert!(matches!(err, MarkupError::Syntax { .. }));
    }
}
