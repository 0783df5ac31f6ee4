//! Descriptor for a homogeneous ordered collection.

use crate::types::element::{AtomElement, Element};
use crate::types::param::{Category, Metadata, Name, Parameter, Presence};
use crate::types::registry;
use crate::types::validate::{ErrorSink, ValidationError};
use crate::value::{AtomValue, Value};

/// Element-count contract of a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Any number of elements.
    Unbounded,
    /// Exactly this many elements.
    Bounded(usize),
}

/// A parameter holding an ordered collection of one element type.
///
/// The element type may itself be structured: `Sequence<Table<C>>` and
/// `Sequence<Tuple<(String, u32)>>` compose the same way primitives do.
/// A bounded sequence accepts exactly its declared element count;
/// anything else is an arity mismatch.
///
/// # Examples
///
/// ```
/// use config_schema_core::{Name, Sequence};
///
/// let composers = Sequence::<String>::bounded(Name::new("composers"), 2)
///     .with_default(vec!["Mahler".into(), "Elgar".into()]);
/// assert_eq!(composers.value(0), "Mahler");
/// assert_eq!(composers.value(1), "Elgar");
/// ```
pub struct Sequence<E: Element> {
    md: Metadata,
    arity: Arity,
    elements: Vec<E::Descriptor>,
    default: Option<Vec<Value>>,
}

impl<E: Element> Sequence<E> {
    /// A required sequence accepting any number of elements.
    pub fn unbounded(name: Name) -> Self {
        Self::make(name, Arity::Unbounded, Presence::Required)
    }

    /// A required sequence accepting exactly `count` elements.
    pub fn bounded(name: Name, count: usize) -> Self {
        Self::make(name, Arity::Bounded(count), Presence::Required)
    }

    pub(crate) fn make(name: Name, arity: Arity, presence: Presence) -> Self {
        let md = Metadata::register(name, Category::Sequence, presence);
        let mut sequence = Self {
            md,
            arity,
            elements: Vec::new(),
            default: None,
        };
        if let Arity::Bounded(count) = arity {
            sequence.resize_elements(count);
        }
        registry::end_of_ctor();
        sequence
    }

    /// Attaches a documentation comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.md.set_comment(comment);
        self
    }

    /// Supplies a default element list, making the sequence defaulted
    /// instead of required. For a bounded sequence the default must
    /// have exactly the declared element count; anything else is a
    /// programming error and panics.
    pub fn with_default(mut self, defaults: Vec<E>) -> Self
    where
        E: AtomElement,
    {
        if let Arity::Bounded(count) = self.arity {
            assert!(
                defaults.len() == count,
                "sequence '{}' is bounded to {count} elements but its default has {}",
                self.md.key(),
                defaults.len()
            );
        }
        self.default = Some(defaults.iter().map(AtomValue::to_value).collect());
        self.md.set_presence(Presence::Default);
        self.apply_default();
        self
    }

    /// The arity declared at construction.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Number of materialized elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Positional read of one element's value.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of bounds or the element is read
    /// before a successful validation.
    pub fn value(&self, index: usize) -> E::Value {
        E::extract(&self.elements[index])
    }

    /// Reads the whole sequence.
    pub fn values(&self) -> Vec<E::Value> {
        self.elements.iter().map(E::extract).collect()
    }

    fn apply_default(&mut self) {
        let Some(values) = self.default.clone() else {
            return;
        };
        self.resize_elements(values.len());
        let mut sink = ErrorSink::new();
        for (element, value) in self.elements.iter_mut().zip(&values) {
            element.set_from_value(value, &mut sink);
        }
        debug_assert!(sink.is_empty(), "sequence defaults must convert cleanly");
    }

    fn resize_elements(&mut self, count: usize) {
        self.elements.truncate(count);
        while self.elements.len() < count {
            let name = Name::sequence_element(self.md.key(), self.elements.len());
            self.elements.push(E::make_descriptor(name));
        }
    }
}

impl<E: Element> Parameter for Sequence<E> {
    fn metadata(&self) -> &Metadata {
        &self.md
    }

    fn children(&self) -> Vec<&dyn Parameter> {
        self.elements
            .iter()
            .map(|element| element as &dyn Parameter)
            .collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Parameter> {
        self.elements
            .iter_mut()
            .map(|element| element as &mut dyn Parameter)
            .collect()
    }

    fn set_from_value(&mut self, value: &Value, errors: &mut ErrorSink) {
        let Value::Sequence(items) = value else {
            errors.push(ValidationError::TypeMismatch {
                key: self.md.key().to_string(),
                expected: "a sequence",
                actual: value.kind(),
            });
            return;
        };
        if let Arity::Bounded(count) = self.arity {
            if items.len() != count {
                errors.push(ValidationError::ArityMismatch {
                    key: self.md.key().to_string(),
                    expected: count,
                    actual: items.len(),
                });
                return;
            }
        }
        self.resize_elements(items.len());
        for (element, item) in self.elements.iter_mut().zip(items) {
            element.set_from_value(item, errors);
        }
    }

    fn mark_default(&mut self) -> bool {
        if self.default.is_some() {
            self.apply_default();
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        if self.default.is_some() {
            self.apply_default();
        } else {
            match self.arity {
                Arity::Bounded(count) => self.resize_elements(count),
                Arity::Unbounded => self.elements.clear(),
            }
        }
    }

    fn default_display(&self) -> Option<String> {
        self.default.as_ref().map(|values| {
            let mut out = String::new();
            crate::parameter_set::render_value(&mut out, &Value::Sequence(values.clone()));
            out
        })
    }
}

impl<E: Element> Element for Sequence<E> {
    type Descriptor = Sequence<E>;
    type Value = Vec<E::Value>;

    fn make_descriptor(name: Name) -> Self {
        Sequence::unbounded(name)
    }

    fn extract(descriptor: &Self) -> Vec<E::Value> {
        descriptor.values()
    }
}

impl<E: Element> Clone for Sequence<E> {
    fn clone(&self) -> Self {
        Self {
            md: self.md.clone(),
            arity: self.arity,
            elements: self.elements.clone(),
            default: self.default.clone(),
        }
    }
}

impl<E: Element> std::fmt::Debug for Sequence<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("md", &self.md)
            .field("arity", &self.arity)
            .field("elements", &self.elements)
            .field("default", &self.default)
            .finish()
    }
}
