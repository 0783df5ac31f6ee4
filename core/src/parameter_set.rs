//! Immutable hierarchical parameter sets.
//!
//! A [`ParameterSet`] maps simple names to [`Value`]s at one nesting level;
//! nested tables are themselves parameter sets. Binding order is the
//! document order in which names were inserted, and iteration is stable,
//! which is what lets validation diagnostics follow the order of the input
//! document.
//!
//! Each binding may carry a [`SourceLocation`] annotation (`file:line`)
//! recorded by the parser. Annotations feed the annotated print modes and
//! never affect semantics or equality.
//!
//! Sets are built once (by the parser or by hand) and read thereafter;
//! nothing mutates a set during validation, so concurrent readers need no
//! coordination.

use indexmap::IndexMap;
use thiserror::Error;

use crate::value::{AtomValue, Kind, Value, ValueError};

/// Where a binding came from in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Source file, when the document came from one.
    pub file: Option<String>,
    /// 1-based line number.
    pub line: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}", self.line),
            None => write!(f, "<string>:{}", self.line),
        }
    }
}

/// How [`ParameterSet::to_indented_string`] treats source annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    /// Bindings only.
    #[default]
    Raw,
    /// Source location appended after each assignment.
    Annotated,
    /// Source location on the line preceding each assignment.
    PrefixAnnotated,
}

/// A typed read of a parameter set failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// No binding exists at the requested key.
    #[error("no parameter named '{key}'")]
    MissingKey { key: String },

    /// A binding exists but has the wrong kind for the requested type.
    #[error("parameter '{key}' is {actual}, expected {expected}")]
    WrongKind {
        key: String,
        expected: &'static str,
        actual: Kind,
    },

    /// A numeric binding exists but converting it would lose information.
    #[error("parameter '{key}': value {value} does not fit: {bound}")]
    OutOfRange {
        key: String,
        value: String,
        bound: String,
    },
}

fn attach_key(err: ValueError, key: &str) -> LookupError {
    match err {
        ValueError::WrongKind { expected, actual } => LookupError::WrongKind {
            key: key.to_string(),
            expected,
            actual,
        },
        ValueError::OutOfRange { value, bound } => LookupError::OutOfRange {
            key: key.to_string(),
            value,
            bound,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Binding {
    value: Value,
    location: Option<SourceLocation>,
}

/// An insertion-ordered map of names to configuration values.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    bindings: IndexMap<String, Binding>,
}

/// One dotted-path segment: a name plus any `[i]` index suffixes.
struct PathSegment<'a> {
    name: &'a str,
    indices: Vec<usize>,
}

fn parse_path(key: &str) -> Option<Vec<PathSegment<'_>>> {
    let mut segments = Vec::new();
    for raw in key.split('.') {
        let (name, rest) = match raw.find('[') {
            Some(pos) => raw.split_at(pos),
            None => (raw, ""),
        };
        if name.is_empty() {
            return None;
        }
        let mut indices = Vec::new();
        let mut rest = rest;
        while !rest.is_empty() {
            let close = rest.find(']')?;
            let index = rest.get(1..close)?.parse().ok()?;
            indices.push(index);
            rest = &rest[close + 1..];
        }
        segments.push(PathSegment { name, indices });
    }
    Some(segments)
}

impl ParameterSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings at this nesting level.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// `true` when this level has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binds `name` to `value` at this level, replacing any previous
    /// binding for the same name (the replacement keeps the original
    /// binding's position).
    ///
    /// `name` is a simple name; nesting is expressed with
    /// [`Value::Table`] values, not dotted keys.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.insert_annotated(name, value, None);
    }

    /// [`insert`](Self::insert) with a source annotation.
    pub fn insert_annotated(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        location: Option<SourceLocation>,
    ) {
        let name = name.into();
        debug_assert!(
            !name.contains('.'),
            "parameter names are simple; got '{name}'"
        );
        self.bindings.insert(
            name,
            Binding {
                value: value.into(),
                location,
            },
        );
    }

    /// Removes the binding for `name` at this level. Returns whether a
    /// binding existed. Later bindings keep their relative order.
    pub fn erase(&mut self, name: &str) -> bool {
        self.bindings.shift_remove(name).is_some()
    }

    /// Tests whether a binding exists at the dotted path `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Looks up the value at the dotted path `key`.
    ///
    /// Path segments are separated by `.`; sequence elements are
    /// addressed with `[i]` suffixes, e.g. `outputs[1].path`.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        let segments = parse_path(key)?;
        let mut current: Option<&Value> = None;
        for segment in &segments {
            let table = match current {
                None => self,
                Some(Value::Table(pset)) => pset,
                Some(_) => return None,
            };
            let mut value = &table.bindings.get(segment.name)?.value;
            for &index in &segment.indices {
                match value {
                    Value::Sequence(items) => value = items.get(index)?,
                    _ => return None,
                }
            }
            current = Some(value);
        }
        current
    }

    /// Source annotation for a top-level binding, when the parser
    /// recorded one.
    pub fn annotation(&self, name: &str) -> Option<&SourceLocation> {
        self.bindings.get(name)?.location.as_ref()
    }

    /// Typed read of a primitive at `key`.
    pub fn get<T: AtomValue>(&self, key: &str) -> Result<T, LookupError> {
        let value = self.get_value(key).ok_or_else(|| LookupError::MissingKey {
            key: key.to_string(),
        })?;
        T::from_value(value).map_err(|e| attach_key(e, key))
    }

    /// Typed read of a homogeneous sequence of primitives at `key`.
    pub fn get_sequence<T: AtomValue>(&self, key: &str) -> Result<Vec<T>, LookupError> {
        let value = self.get_value(key).ok_or_else(|| LookupError::MissingKey {
            key: key.to_string(),
        })?;
        let Value::Sequence(items) = value else {
            return Err(LookupError::WrongKind {
                key: key.to_string(),
                expected: "a sequence",
                actual: value.kind(),
            });
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::from_value(item).map_err(|e| attach_key(e, &format!("{key}[{i}]"))))
            .collect()
    }

    /// Read of a nested table at `key`.
    pub fn get_table(&self, key: &str) -> Result<&ParameterSet, LookupError> {
        let value = self.get_value(key).ok_or_else(|| LookupError::MissingKey {
            key: key.to_string(),
        })?;
        match value {
            Value::Table(pset) => Ok(pset),
            other => Err(LookupError::WrongKind {
                key: key.to_string(),
                expected: "a table",
                actual: other.kind(),
            }),
        }
    }

    /// Mutable access to a nested table at a top-level `name`, for use
    /// while a set is being built. `None` when the name is unbound or
    /// bound to something other than a table.
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut ParameterSet> {
        match self.bindings.get_mut(name) {
            Some(Binding {
                value: Value::Table(pset),
                ..
            }) => Some(pset),
            _ => None,
        }
    }

    /// Top-level names at this nesting level, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Iterates `(name, value)` pairs at this level, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(k, b)| (k.as_str(), &b.value))
    }

    /// Renders this set as a document, indented by `indent` spaces.
    ///
    /// The output re-parses to an equivalent set. Annotated modes
    /// interleave each binding's recorded source location.
    pub fn to_indented_string(&self, indent: usize, mode: PrintMode) -> String {
        let mut out = String::new();
        self.render(&mut out, indent, mode);
        out
    }

    fn render(&self, out: &mut String, indent: usize, mode: PrintMode) {
        let pad = " ".repeat(indent);
        for (name, binding) in &self.bindings {
            if mode == PrintMode::PrefixAnnotated {
                match &binding.location {
                    Some(loc) => out.push_str(&format!("{pad}# {loc}\n")),
                    None => out.push_str(&format!("{pad}# <unknown>\n")),
                }
            }
            match &binding.value {
                Value::Table(pset) => {
                    out.push_str(&format!("{pad}{name}: {{"));
                    push_annotation(out, mode, binding);
                    out.push('\n');
                    pset.render(out, indent + 2, mode);
                    out.push_str(&format!("{pad}}}\n"));
                }
                other => {
                    out.push_str(&format!("{pad}{name}: "));
                    render_value(out, other);
                    push_annotation(out, mode, binding);
                    out.push('\n');
                }
            }
        }
    }
}

impl serde::Serialize for ParameterSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl PartialEq for ParameterSet {
    /// Binding equality ignores order and source annotations.
    fn eq(&self, other: &Self) -> bool {
        self.bindings.len() == other.bindings.len()
            && self
                .bindings
                .iter()
                .all(|(name, binding)| match other.bindings.get(name) {
                    Some(theirs) => binding.value == theirs.value,
                    None => false,
                })
    }
}

fn push_annotation(out: &mut String, mode: PrintMode, binding: &Binding) {
    if mode == PrintMode::Annotated {
        match &binding.location {
            Some(loc) => out.push_str(&format!("  # {loc}")),
            None => out.push_str("  # <unknown>"),
        }
    }
}

pub(crate) fn render_value(out: &mut String, value: &Value) {
    match value {
        Value::Nil => out.push_str("@nil"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Uint(u) => out.push_str(&u.to_string()),
        Value::Float(f) => out.push_str(&format!("{f:?}")),
        Value::String(s) => render_string(out, s),
        Value::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push(' ');
                render_value(out, item);
            }
            if !items.is_empty() {
                out.push(' ');
            }
            out.push(']');
        }
        Value::Table(pset) => {
            // Inline form, used inside sequences.
            out.push('{');
            for (name, binding) in &pset.bindings {
                out.push_str(&format!(" {name}: "));
                match &binding.value {
                    nested @ Value::Table(_) => render_value(out, nested),
                    other => render_value(out, other),
                }
            }
            out.push_str(" }");
        }
    }
}

fn is_bare_string(s: &str) -> bool {
    let mut chars = s.chars();
    let leading_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    leading_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && s != "true"
        && s != "false"
}

fn render_string(out: &mut String, s: &str) {
    if is_bare_string(s) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
}
