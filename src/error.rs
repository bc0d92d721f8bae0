//! Error types for markup parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::markup::{Span, Token};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkupError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("Unrecognized markup at {span:?}")]
    Lex { span: Span },

    #[error("Tag starting at {span:?} is never terminated")]
    UnterminatedTag { span: Span },

    #[error("Closing tag </{found}> at {span:?} does not match <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Unexpected closing tag </{tag}> at {span:?}")]
    UnexpectedClose { tag: String, span: Span },

    #[error("Element <{tag}> opened at {span:?} is never closed")]
    Unclosed { tag: String, span: Span },
}

impl MarkupError {
    pub fn lex(span: Span) -> Self {
        Self::Lex { span }
    }

    pub fn unterminated_tag(span: Span) -> Self {
        Self::UnterminatedTag { span }
    }

    pub fn mismatched_close(expected: String, found: String, span: Span) -> Self {
        Self::MismatchedClose {
            expected,
            found,
            span,
        }
    }

    pub fn unexpected_close(tag: String, span: Span) -> Self {
        Self::UnexpectedClose { tag, span }
    }

    pub fn unclosed(tag: String, span: Span) -> Self {
        Self::Unclosed { tag, span }
    }

    pub fn span(&self) -> &Span {
        match self {
            Self::Syntax { span, .. }
            | Self::Lex { span }
            | Self::UnterminatedTag { span }
            | Self::MismatchedClose { span, .. }
            | Self::UnexpectedClose { span, .. }
            | Self::Unclosed { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span().clone();
        let label = match self {
            Self::Syntax {
                message, expected, ..
            } if !expected.is_empty() => {
                format!("{}\nExpected: {}", message, expected.join(", "))
            }
            Self::Syntax { message, .. } => message.clone(),
            Self::Unclosed { tag, .. } => format!("<{tag}> opened here"),
            Self::MismatchedClose { expected, .. } => format!("expected </{expected}>"),
            _ => self.to_string(),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for MarkupError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        MarkupError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::TagOpen(name) => format!("'<{}'", name),
        Token::TagClose(name) => format!("'</{}>'", name),
        Token::Comment(_) => "comment".to_string(),
        Token::Text(_) => "text".to_string(),
        Token::AttrName(name) => format!("attribute '{}'", name),
        Token::AttrValue(value) => format!("value \"{}\"", value),
        Token::Equals => "'='".to_string(),
        Token::TagEnd => "'>'".to_string(),
        Token::SelfClose => "'/>'".to_string(),
    }
}
