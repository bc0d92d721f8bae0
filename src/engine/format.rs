//! Attribute formatting for bound values

use crate::value::Value;

/// Space-separated names of the true boolean flags of a record
///
/// Each flag contributes its css name (override or lower-cased field name),
/// in declaration order. Non-record values yield `None`.
pub(crate) fn class_list(value: &Value) -> Option<String> {
    let record = value.as_record()?;
    let classes: Vec<String> = record
        .entries()
        .filter(|(_, v)| v.as_bool() == Some(true))
        .map(|(def, _)| def.css_name())
        .collect();
    Some(classes.join(" "))
}

/// `name: value` pairs of a record's public fields, joined by `; `
pub(crate) fn style_list(value: &Value) -> Option<String> {
    let record = value.as_record()?;
    let pairs: Vec<String> = record
        .entries()
        .map(|(def, v)| format!("{}: {}", def.css_name(), v))
        .collect();
    Some(pairs.join("; "))
}

/// `Title` form of a bind key, used to match declared sub-component props
pub(crate) fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace whole-token occurrences of `token` in `text`
///
/// An occurrence counts only when it is not preceded by an identifier
/// character or `.`, and not followed by an identifier character.
pub(crate) fn replace_token(text: &str, token: &str, replacement: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (at, _) in text.match_indices(token) {
        let before = text[..at].chars().next_back();
        let after = text[at + token.len()..].chars().next();
        if before.is_some_and(|c| is_ident(c) || c == '.') || after.is_some_and(is_ident) {
            continue;
        }
        out.push_str(&text[last..at]);
        out.push_str(replacement);
        last = at + token.len();
    }
    out.push_str(&text[last..]);
    out
}

/// Apply [`replace_token`] inside the `{{ .. }}` placeholders of `text` only
pub(crate) fn replace_in_placeholders(text: &str, token: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let inner_start = open + 2;
        let Some(close) = rest[inner_start..].find("}}") else {
            break;
        };
        out.push_str(&rest[..inner_start]);
        out.push_str(&replace_token(
            &rest[inner_start..inner_start + close],
            token,
            replacement,
        ));
        out.push_str("}}");
        rest = &rest[inner_start + close + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FieldDef, FieldKind, Schema, Shape};

    fn schema() -> Schema {
        Schema::new()
            .with_shape(
                Shape::new("Flags")
                    .field("Active", FieldKind::Bool)
                    .field("Big", FieldKind::Bool)
                    .with_field(FieldDef::new("Done", FieldKind::Bool).with_css("is-done")),
            )
            .and_then(|s| {
                s.with_shape(
                    Shape::new("Style")
                        .field("Color", FieldKind::Str)
                        .with_field(FieldDef::new("Size", FieldKind::Int).with_css("font-size")),
                )
            })
            .unwrap()
    }

    #[test]
    fn test_class_list() {
        let schema = schema();
        let flags = schema
            .record("Flags", [("Active", Value::from(true)), ("Big", Value::from(false))])
            .unwrap();
        assert_eq!(class_list(&flags).as_deref(), Some("active"));

        let flags = schema
            .record("Flags", [("Active", Value::from(true)), ("Done", Value::from(true))])
            .unwrap();
        assert_eq!(class_list(&flags).as_deref(), Some("active is-done"));
        assert_eq!(class_list(&Value::from("x")), None);
    }

    #[test]
    fn test_style_list() {
        let style = schema()
            .record("Style", [("Color", Value::from("red")), ("Size", Value::from(12))])
            .unwrap();
        assert_eq!(style_list(&style).as_deref(), Some("color: red; font-size: 12"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("todo"), "Todo");
        assert_eq!(title_case("Todo"), "Todo");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_replace_token_respects_boundaries() {
        assert_eq!(
            replace_token("{{ t.Title }} {{ tt }} {{ a.t }} {{t}}", "t", "Todos[0]"),
            "{{ Todos[0].Title }} {{ tt }} {{ a.t }} {{Todos[0]}}"
        );
        assert_eq!(replace_token("!t.Done", "t", "X[1]"), "!X[1].Done");
    }

    #[test]
    fn test_replace_in_placeholders_leaves_prose_alone() {
        assert_eq!(
            replace_in_placeholders(
                "todo: {{ todo.Title }} ({{todo}}) {{ todo",
                "todo",
                "Todos[2]"
            ),
            "todo: {{ Todos[2].Title }} ({{Todos[2]}}) {{ todo"
        );
    }
}
