//! Directive attributes and their execution order

use super::DirectiveError;
use crate::markup::{Attr, Element};

/// A parsed directive attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `for="item in Items"`
    For { variable: String, collection: String },
    /// `if="Done"` or `if="!Done"`
    If { path: String, negate: bool },
    /// `model="Title"`
    Model { path: String },
    /// `on:click.stop="Save"`
    On {
        event: String,
        modifiers: Vec<String>,
        method: String,
    },
    /// `bind:class="Flags"`
    Bind { key: String, path: String },
    /// `html="Body"`
    Html { path: String },
}

impl Directive {
    /// Parse an attribute, returning `None` when it is not a directive
    pub fn from_attr(attr: &Attr, prefix: &str) -> Option<Result<Self, DirectiveError>> {
        let name = attr.key.strip_prefix(prefix)?;
        Some(Self::parse(name, attr.value.trim()))
    }

    /// Parse a directive from its unprefixed name and its value
    pub fn parse(name: &str, value: &str) -> Result<Self, DirectiveError> {
        let (base, argument) = match name.split_once(':') {
            Some((base, argument)) => (base, Some(argument)),
            None => (name, None),
        };
        let directive = match (base, argument) {
            ("for", None) => {
                let mut words = value.split_whitespace();
                match (words.next(), words.next(), words.next(), words.next()) {
                    (Some(variable), Some("in"), Some(collection), None) => Directive::For {
                        variable: variable.to_string(),
                        collection: collection.to_string(),
                    },
                    _ => {
                        return Err(DirectiveError::syntax(
                            "for",
                            value,
                            "expected 'item in path'",
                        ))
                    }
                }
            }
            ("if", None) => match value.strip_prefix('!') {
                Some(path) => Directive::If {
                    path: path.trim().to_string(),
                    negate: true,
                },
                None => Directive::If {
                    path: value.to_string(),
                    negate: false,
                },
            },
            ("model", None) => Directive::Model {
                path: value.to_string(),
            },
            ("html", None) => Directive::Html {
                path: value.to_string(),
            },
            ("on", Some(argument)) => {
                let mut parts = argument.split('.');
                let event = parts.next().unwrap_or_default().to_string();
                if event.is_empty() {
                    return Err(DirectiveError::syntax("on", argument, "missing event name"));
                }
                Directive::On {
                    event,
                    modifiers: parts.map(str::to_string).collect(),
                    method: value.to_string(),
                }
            }
            ("bind", Some(key)) if !key.is_empty() => Directive::Bind {
                key: key.to_string(),
                path: value.to_string(),
            },
            ("on" | "bind", _) => {
                return Err(DirectiveError::syntax(base, name, "missing argument after ':'"))
            }
            _ => {
                return Err(DirectiveError::UnknownDirective {
                    name: name.to_string(),
                })
            }
        };
        if directive.target().is_empty() {
            return Err(DirectiveError::syntax(directive.name(), value, "empty value"));
        }
        Ok(directive)
    }

    /// Lower runs first
    pub fn priority(&self) -> u8 {
        match self {
            Directive::For { .. } => 0,
            Directive::If { .. } => 1,
            Directive::Model { .. } => 2,
            Directive::On { .. } => 3,
            Directive::Bind { .. } => 4,
            Directive::Html { .. } => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Directive::For { .. } => "for",
            Directive::If { .. } => "if",
            Directive::Model { .. } => "model",
            Directive::On { .. } => "on",
            Directive::Bind { .. } => "bind",
            Directive::Html { .. } => "html",
        }
    }

    /// The path or method the directive refers to
    fn target(&self) -> &str {
        match self {
            Directive::For { collection, .. } => collection,
            Directive::If { path, .. }
            | Directive::Model { path }
            | Directive::Bind { path, .. }
            | Directive::Html { path } => path,
            Directive::On { method, .. } => method,
        }
    }

    /// Render the directive back into an attribute
    pub fn to_attr(&self, prefix: &str) -> Attr {
        match self {
            Directive::For {
                variable,
                collection,
            } => Attr::new(format!("{prefix}for"), format!("{variable} in {collection}")),
            Directive::If { path, negate } => Attr::new(
                format!("{prefix}if"),
                if *negate { format!("!{path}") } else { path.clone() },
            ),
            Directive::Model { path } => Attr::new(format!("{prefix}model"), path.clone()),
            Directive::On {
                event,
                modifiers,
                method,
            } => {
                let mut key = format!("{prefix}on:{event}");
                for modifier in modifiers {
                    key.push('.');
                    key.push_str(modifier);
                }
                Attr::new(key, method.clone())
            }
            Directive::Bind { key, path } => Attr::new(format!("{prefix}bind:{key}"), path.clone()),
            Directive::Html { path } => Attr::new(format!("{prefix}html"), path.clone()),
        }
    }
}

/// Remove every directive attribute from `element`, in execution order
///
/// All directives are validated before the element is touched, so a bad
/// directive leaves the element as it was.
pub fn take_directives(
    element: &mut Element,
    prefix: &str,
) -> Result<Vec<Directive>, DirectiveError> {
    let mut directives = Vec::new();
    for attr in &element.attrs {
        if let Some(directive) = Directive::from_attr(attr, prefix) {
            directives.push(directive?);
        }
    }
    if directives.is_empty() {
        return Ok(directives);
    }
    element.attrs.retain(|attr| !attr.key.starts_with(prefix));
    directives.sort_by_key(Directive::priority);
    Ok(directives)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_for() {
        assert_eq!(
            Directive::parse("for", "todo  in  Todos").unwrap(),
            Directive::For {
                variable: "todo".into(),
                collection: "Todos".into()
            }
        );
        assert!(Directive::parse("for", "todo of Todos").is_err());
        assert!(Directive::parse("for", "in Todos").is_err());
    }

    #[test]
    fn test_parse_if_negation() {
        assert_eq!(
            Directive::parse("if", "!done").unwrap(),
            Directive::If {
                path: "done".into(),
                negate: true
            }
        );
        assert!(Directive::parse("if", "!").is_err());
    }

    #[test]
    fn test_parse_on_with_modifiers() {
        assert_eq!(
            Directive::parse("on:keyup.enter.prevent", "Add").unwrap(),
            Directive::On {
                event: "keyup".into(),
                modifiers: vec!["enter".into(), "prevent".into()],
                method: "Add".into()
            }
        );
        assert!(Directive::parse("on", "Add").is_err());
    }

    #[test]
    fn test_unknown_directive() {
        let err = Directive::parse("show", "x").unwrap_err();
        assert!(matches!(err, DirectiveError::UnknownDirective { name } if name == "show"));
    }

    #[test]
    fn test_take_directives_orders_and_strips() {
        let mut element = Element::new("li")
            .with_attr("v-bind:class", "Flags")
            .with_attr("id", "x")
            .with_attr("v-if", "!Done")
            .with_attr("v-for", "t in Todos");
        let directives = take_directives(&mut element, "v-").expect("Should parse");
        let names: Vec<_> = directives.iter().map(Directive::name).collect();
        assert_eq!(names, vec!["for", "if", "bind"]);
        assert_eq!(element.attrs, vec![Attr::new("id", "x")]);
    }

    #[test]
    fn test_invalid_directive_leaves_element_untouched() {
        let mut element = Element::new("li")
            .with_attr("v-if", "Done")
            .with_attr("v-frobnicate", "x");
        let before = element.clone();
        assert!(take_directives(&mut element, "v-").is_err());
        assert_eq!(element, before);
    }

    #[test]
    fn test_to_attr_round_trips() {
        for (name, value) in [
            ("for", "t in Todos"),
            ("if", "!Done"),
            ("on:click.stop", "Save"),
            ("bind:class", "Flags"),
            ("html", "Body"),
        ] {
            let directive = Directive::parse(name, value).unwrap();
            let attr = directive.to_attr("v-");
            assert_eq!(attr.key, format!("v-{name}"));
            assert_eq!(Directive::from_attr(&attr, "v-").unwrap().unwrap(), directive);
        }
    }
}
