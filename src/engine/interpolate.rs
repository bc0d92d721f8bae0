//! Text interpolation

use std::collections::BTreeMap;

use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemplateError {
    #[error("unterminated '{{{{' at offset {offset}")]
    Unterminated { offset: usize },

    #[error("empty placeholder at offset {offset}")]
    EmptyPlaceholder { offset: usize },
}

/// Names visible to a text template
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl Scope for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Renders one text node against a scope
pub trait TextTemplater: Send + Sync {
    fn render(&self, text: &str, scope: &dyn Scope) -> Result<String, TemplateError>;
}

/// Substitutes `{{ path }}` placeholders with the value's string form
///
/// Names missing from the scope render as the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpolator;

impl TextTemplater for Interpolator {
    fn render(&self, text: &str, scope: &dyn Scope) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut offset = 0;
        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let inner = &rest[open + 2..];
            let close = inner.find("}}").ok_or(TemplateError::Unterminated {
                offset: offset + open,
            })?;
            let name = inner[..close].trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder {
                    offset: offset + open,
                });
            }
            if let Some(value) = scope.lookup(name) {
                out.push_str(&value.to_string());
            }
            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> BTreeMap<String, Value> {
        let mut scope = BTreeMap::new();
        scope.insert("Title".to_string(), Value::from("A"));
        scope.insert("Count".to_string(), Value::from(3));
        scope
    }

    #[test]
    fn test_substitutes_placeholders() {
        let out = Interpolator
            .render("{{ Title }} has {{Count}} items", &scope())
            .unwrap();
        assert_eq!(out, "A has 3 items");
    }

    #[test]
    fn test_missing_names_render_empty() {
        assert_eq!(Interpolator.render("[{{ Nope }}]", &scope()).unwrap(), "[]");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(Interpolator.render("a } b {", &scope()).unwrap(), "a } b {");
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert_eq!(
            Interpolator.render("ok {{ Title", &scope()),
            Err(TemplateError::Unterminated { offset: 3 })
        );
        assert_eq!(
            Interpolator.render("{{A}} {{ }}", &scope()),
            Err(TemplateError::EmptyPlaceholder { offset: 6 })
        );
    }
}
