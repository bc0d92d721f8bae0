//! Path segments, bracket accessors and resolved locations

use crate::value::{FieldKind, Value};

/// One hop from a container to a child value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Positional record field
    Field(usize),
    /// List element
    Index(usize),
    /// Map entry
    Key(String),
}

impl Step {
    pub(crate) fn apply<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match (self, value) {
            (Step::Field(i), Value::Record(record)) => record.field(*i),
            (Step::Index(i), Value::List(items)) => items.get(*i),
            (Step::Key(key), Value::Map(entries)) => entries.get(key),
            _ => None,
        }
    }

    pub(crate) fn apply_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        match (self, value) {
            (Step::Field(i), Value::Record(record)) => record.field_mut(*i),
            (Step::Index(i), Value::List(items)) => items.get_mut(*i),
            (Step::Key(key), Value::Map(entries)) => entries.get_mut(key),
            _ => None,
        }
    }
}

/// A resolved path: the chain of steps from a root value to a target
///
/// Pointers are followed before every step, so a location stays valid as
/// long as the containers along the way keep their layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    steps: Vec<Step>,
}

impl Location {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.steps
            .iter()
            .try_fold(root.indirect(), |current, step| step.apply(current.indirect()))
    }

    pub fn get_mut<'v>(&self, root: &'v mut Value) -> Option<&'v mut Value> {
        self.steps.iter().try_fold(root.indirect_mut(), |current, step| {
            step.apply_mut(current.indirect_mut())
        })
    }

    /// The declared kind of the target
    ///
    /// `None` when the last hop goes through an untyped container or the
    /// location is the root itself.
    pub fn declared_kind(&self, root: &Value) -> Option<FieldKind> {
        let mut current = root.indirect();
        let mut kind = None;
        for step in &self.steps {
            kind = match (step, current) {
                (Step::Field(i), Value::Record(record)) => {
                    Some(record.shape().fields().get(*i)?.kind.clone())
                }
                (Step::Index(_), _) => match kind.as_ref().map(FieldKind::pointee) {
                    Some(FieldKind::List(item)) => Some(item.as_ref().clone()),
                    _ => None,
                },
                (Step::Key(_), _) => match kind.as_ref().map(FieldKind::pointee) {
                    Some(FieldKind::Map(item)) => Some(item.as_ref().clone()),
                    _ => None,
                },
                _ => None,
            };
            current = step.apply(current)?.indirect();
        }
        kind
    }
}

/// A parsed bracket accessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Accessor {
    Index(usize),
    Key(String),
}

impl Accessor {
    pub(crate) fn into_step(self) -> Step {
        match self {
            Accessor::Index(i) => Step::Index(i),
            Accessor::Key(key) => Step::Key(key),
        }
    }
}

/// A path split at its first bracket
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bracketed<'p> {
    /// Everything before the `[`
    pub parent: &'p str,
    /// `None` when the bracket content is malformed or unterminated
    pub accessor: Option<Accessor>,
    /// Everything after the `]`, without a leading `.`
    pub rest: &'p str,
}

/// Split `path` at its first bracket accessor, if it has one
pub(crate) fn split_bracket(path: &str) -> Option<Bracketed<'_>> {
    let open = path.find('[')?;
    let parent = &path[..open];
    let inner = &path[open + 1..];
    let close = if inner.starts_with('"') {
        closing_quote(inner).and_then(|q| inner[q + 1..].starts_with(']').then_some(q + 1))
    } else {
        inner.find(']')
    };
    let Some(close) = close else {
        return Some(Bracketed {
            parent,
            accessor: None,
            rest: "",
        });
    };
    let rest = &inner[close + 1..];
    Some(Bracketed {
        parent,
        accessor: parse_accessor(&inner[..close]),
        rest: rest.strip_prefix('.').unwrap_or(rest),
    })
}

/// Parse bracket content: decimal digits or a double-quoted string
pub(crate) fn parse_accessor(raw: &str) -> Option<Accessor> {
    if let Some(quoted) = raw.strip_prefix('"') {
        let body = quoted.strip_suffix('"')?;
        return unquote(body).map(Accessor::Key);
    }
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().map(Accessor::Index)
}

/// Byte offset of the quote closing the string that opens `s`
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

fn unquote(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                escaped @ ('\\' | '"' | '\'') => out.push(escaped),
                _ => return None,
            },
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

/// Split a path into its first key and the remainder
///
/// The split happens at the first `.` or `[`; a leading `.` is dropped from
/// the remainder and a leading `[` is kept.
pub(crate) fn split_head(path: &str) -> (&str, &str) {
    match path.find(['.', '[']) {
        Some(at) if path[at..].starts_with('.') => (&path[..at], &path[at + 1..]),
        Some(at) => (&path[..at], &path[at..]),
        None => (path, ""),
    }
}
