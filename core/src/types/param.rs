//! The abstract parameter descriptor.
//!
//! Every schema node carries a [`Metadata`] block (fully-qualified key,
//! leaf name, comment, category, presence) and implements [`Parameter`],
//! the object-safe trait the walker and the validation driver dispatch
//! through.

use crate::types::registry::{self, Frame};
use crate::types::validate::ErrorSink;
use crate::value::Value;

/// Structural category of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Atom,
    Sequence,
    Tuple,
    Table,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Atom => f.write_str("atom"),
            Category::Sequence => f.write_str("sequence"),
            Category::Tuple => f.write_str("tuple"),
            Category::Table => f.write_str("table"),
        }
    }
}

/// Presence contract of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must appear in the input.
    Required,
    /// Must appear when an enclosing condition holds. Reserved; no
    /// constructor currently produces it.
    RequiredConditional,
    /// May be absent; the construction-time default is used.
    Default,
    /// May be absent; absence is observable through the accessor.
    Optional,
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Presence::Required => f.write_str("required"),
            Presence::RequiredConditional => f.write_str("required (conditional)"),
            Presence::Default => f.write_str("defaulted"),
            Presence::Optional => f.write_str("optional"),
        }
    }
}

/// A parameter name: one path segment of a schema key.
///
/// Plain names are resolved against the construction-time name stack.
/// Sequence and tuple elements use synthetic `[i]` names anchored at
/// their parent's stored key, which also works after construction (an
/// unbounded sequence grows elements while validating).
#[derive(Debug, Clone)]
pub struct Name {
    text: String,
    anchor: Option<String>,
}

impl Name {
    /// A plain name. Must be non-empty and must not contain `.`;
    /// violating either is a programming error and panics.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        assert!(!text.is_empty(), "parameter names must be non-empty");
        assert!(
            !text.contains('.'),
            "parameter names are single segments; nest tables instead of writing '{text}'"
        );
        Self { text, anchor: None }
    }

    /// The synthetic name of element `index` under `parent_key`.
    pub(crate) fn sequence_element(parent_key: &str, index: usize) -> Self {
        Self {
            text: format!("[{index}]"),
            anchor: Some(parent_key.to_string()),
        }
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::new(text)
    }
}

/// Identity and contract of one schema node.
#[derive(Debug, Clone)]
pub struct Metadata {
    key: String,
    name: String,
    comment: String,
    category: Category,
    presence: Presence,
}

impl Metadata {
    /// Registers a descriptor under construction: pushes its name frame
    /// and records the resulting fully-qualified key. The matching
    /// constructor must call [`registry::end_of_ctor`] before returning.
    pub(crate) fn register(name: Name, category: Category, presence: Presence) -> Self {
        let frame = match &name.anchor {
            Some(anchor) => Frame::Anchor(format!("{anchor}{}", name.text)),
            None => Frame::Segment(name.text.clone()),
        };
        registry::push(frame);
        Self {
            key: registry::current_key(),
            name: name.text,
            comment: String::new(),
            category,
            presence,
        }
    }

    /// Metadata for a table fragment: no name frame of its own, its key
    /// is the enclosing table's path.
    pub(crate) fn fragment() -> Self {
        Self {
            key: registry::current_key(),
            name: String::new(),
            comment: String::new(),
            category: Category::Table,
            presence: Presence::Required,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub(crate) fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub(crate) fn set_presence(&mut self, presence: Presence) {
        self.presence = presence;
    }
}

/// Object-safe interface over every concrete descriptor.
///
/// `set_from_value` is the validation hook: it receives the input value
/// found at the descriptor's key and either materializes it or records
/// diagnostics in the sink. It never stops at the first problem.
pub trait Parameter {
    fn metadata(&self) -> &Metadata;

    /// Child descriptors, in declaration (or positional) order.
    fn children(&self) -> Vec<&dyn Parameter>;

    /// Mutable view of the children, same order as [`children`](Self::children).
    fn children_mut(&mut self) -> Vec<&mut dyn Parameter>;

    /// Materializes this descriptor from the matching input value,
    /// recording any diagnostics.
    fn set_from_value(&mut self, value: &Value, errors: &mut ErrorSink);

    /// Applies the construction-time default, if there is one. Returns
    /// whether a default exists.
    fn mark_default(&mut self) -> bool;

    /// Clears materialized state back to the post-construction state
    /// (defaults reapplied), so a schema can be validated again.
    fn reset(&mut self);

    /// Table fragments flatten into their parent and are transparent to
    /// walks and key reconciliation.
    fn is_fragment(&self) -> bool {
        false
    }

    fn key(&self) -> &str {
        self.metadata().key()
    }

    fn name(&self) -> &str {
        self.metadata().name()
    }

    fn comment(&self) -> &str {
        self.metadata().comment()
    }

    fn category(&self) -> Category {
        self.metadata().category()
    }

    fn presence(&self) -> Presence {
        self.metadata().presence()
    }

    fn has_default(&self) -> bool {
        self.presence() == Presence::Default
    }

    fn is_optional(&self) -> bool {
        self.presence() == Presence::Optional
    }

    /// Rendering of the construction-time default, for reference
    /// printing.
    fn default_display(&self) -> Option<String> {
        None
    }
}
