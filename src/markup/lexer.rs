//! Lexer for template markup using logos
//!
//! Markup is lexed in two modes: content (text, comments and tag openers)
//! and tag interior (attribute names, values and the closing `>`). The lexer
//! morphs between them when it enters and leaves a start tag.

use logos::Logos;

use super::tree::Span;
use crate::error::MarkupError;

/// Tokens handed to the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<name`, lower-cased
    TagOpen(String),
    /// `</name>`, lower-cased
    TagClose(String),
    Comment(String),
    Text(String),
    AttrName(String),
    AttrValue(String),
    Equals,
    /// `>` ending a start tag
    TagEnd,
    /// `/>` ending a start tag
    SelfClose,
}

#[derive(Logos, Debug, Clone, PartialEq)]
enum Content {
    #[regex(r"<[a-zA-Z][a-zA-Z0-9_\-]*", |lex| lex.slice()[1..].to_ascii_lowercase())]
    TagOpen(String),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9_\-]*[ \t\r\n]*>", |lex| close_name(lex.slice()))]
    TagClose(String),

    #[regex(r"<!--([^-]|-[^-])*-->", |lex| {
        let s = lex.slice();
        s[4..s.len() - 3].to_string()
    })]
    Comment(String),

    #[regex(r"[^<]+", |lex| lex.slice().to_string())]
    Text(String),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Inside {
    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, |lex| strip_quotes(lex.slice()))]
    #[regex(r"'[^']*'", |lex| strip_quotes(lex.slice()))]
    Quoted(String),

    #[regex(r#"[^ \t\r\n"'<>/=]+"#, |lex| lex.slice().to_string())]
    Bare(String),
}

fn close_name(slice: &str) -> String {
    slice[2..]
        .trim_end_matches('>')
        .trim_end()
        .to_ascii_lowercase()
}

fn strip_quotes(slice: &str) -> String {
    slice[1..slice.len() - 1].to_string()
}

/// Lex markup into tokens with spans
///
/// Attribute names are lower-cased here; whether a bare word is a name or an
/// unquoted value depends on the preceding `=`.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, MarkupError> {
    let mut tokens = Vec::new();
    let mut content = Content::lexer(input);

    while let Some(result) = content.next() {
        let span = content.span();
        let token = result.map_err(|()| MarkupError::lex(span.clone()))?;
        match token {
            Content::TagOpen(name) => {
                tokens.push((Token::TagOpen(name), span.clone()));
                let mut inside = content.morph::<Inside>();
                let mut after_equals = false;
                loop {
                    let Some(result) = inside.next() else {
                        return Err(MarkupError::unterminated_tag(span));
                    };
                    let part_span = inside.span();
                    let part = result.map_err(|()| MarkupError::lex(part_span.clone()))?;
                    let (token, done) = match part {
                        Inside::End => (Token::TagEnd, true),
                        Inside::SelfClose => (Token::SelfClose, true),
                        Inside::Equals => (Token::Equals, false),
                        Inside::Quoted(value) => (Token::AttrValue(value), false),
                        Inside::Bare(word) if after_equals => (Token::AttrValue(word), false),
                        Inside::Bare(word) => (Token::AttrName(word.to_ascii_lowercase()), false),
                    };
                    after_equals = token == Token::Equals;
                    tokens.push((token, part_span));
                    if done {
                        break;
                    }
                }
                content = inside.morph();
            }
            Content::TagClose(name) => tokens.push((Token::TagClose(name), span)),
            Content::Comment(text) => tokens.push((Token::Comment(text), span)),
            Content::Text(text) => tokens.push((Token::Text(text), span)),
        }
    }
    Ok(tokens)
}
