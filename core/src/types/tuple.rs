//! Descriptor for a heterogeneous fixed-arity sequence.

use crate::types::element::{AtomElement, Element};
use crate::types::param::{Category, Metadata, Name, Parameter, Presence};
use crate::types::registry;
use crate::types::validate::{ErrorSink, ValidationError};
use crate::value::{AtomValue, Value};

/// Implemented for Rust tuples of [`Element`] types (arities 1 through
/// 6); carries the per-slot descriptor and value aggregates.
pub trait TupleElements {
    type Descriptors: Clone + std::fmt::Debug;
    type Values;
    const ARITY: usize;

    fn make_descriptors(parent_key: &str) -> Self::Descriptors;
    fn children(descriptors: &Self::Descriptors) -> Vec<&dyn Parameter>;
    fn children_mut(descriptors: &mut Self::Descriptors) -> Vec<&mut dyn Parameter>;
    fn extract(descriptors: &Self::Descriptors) -> Self::Values;
}

/// A parameter holding a fixed-arity sequence with one descriptor per
/// slot.
///
/// In the document a tuple is written as a sequence; the schema gives
/// each position its own type. The whole-tuple accessor returns the
/// positional aggregate.
///
/// # Examples
///
/// ```
/// use config_schema_core::{Name, Tuple};
///
/// let ages = Tuple::<(String, u32)>::new(Name::new("ages"))
///     .with_default(("David".to_string(), 9));
/// let (name, age) = ages.values();
/// assert_eq!(name, "David");
/// assert_eq!(age, 9);
/// ```
pub struct Tuple<T: TupleElements> {
    md: Metadata,
    slots: T::Descriptors,
    default: Option<Vec<Value>>,
}

impl<T: TupleElements> Tuple<T> {
    /// A required tuple.
    pub fn new(name: Name) -> Self {
        Self::make(name, Presence::Required)
    }

    pub(crate) fn make(name: Name, presence: Presence) -> Self {
        let md = Metadata::register(name, Category::Tuple, presence);
        let slots = T::make_descriptors(md.key());
        registry::end_of_ctor();
        Self {
            md,
            slots,
            default: None,
        }
    }

    /// Attaches a documentation comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.md.set_comment(comment);
        self
    }

    /// Number of slots.
    pub fn arity(&self) -> usize {
        T::ARITY
    }

    /// The per-slot descriptors, for positional typed access.
    pub fn slots(&self) -> &T::Descriptors {
        &self.slots
    }

    /// Reads the whole tuple as a positional aggregate.
    pub fn values(&self) -> T::Values {
        T::extract(&self.slots)
    }

    fn apply_default(&mut self) {
        let Some(values) = self.default.clone() else {
            return;
        };
        let mut sink = ErrorSink::new();
        for (slot, value) in T::children_mut(&mut self.slots).into_iter().zip(&values) {
            slot.set_from_value(value, &mut sink);
        }
        debug_assert!(sink.is_empty(), "tuple defaults must convert cleanly");
    }
}

impl<T: TupleElements> Parameter for Tuple<T> {
    fn metadata(&self) -> &Metadata {
        &self.md
    }

    fn children(&self) -> Vec<&dyn Parameter> {
        T::children(&self.slots)
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Parameter> {
        T::children_mut(&mut self.slots)
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
        if items.len() != T::ARITY {
            errors.push(ValidationError::ArityMismatch {
                key: self.md.key().to_string(),
                expected: T::ARITY,
                actual: items.len(),
            });
            return;
        }
        for (slot, item) in T::children_mut(&mut self.slots).into_iter().zip(items) {
            slot.set_from_value(item, errors);
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
        self.apply_default();
    }

    fn default_display(&self) -> Option<String> {
        self.default.as_ref().map(|values| {
            let mut out = String::new();
            crate::parameter_set::render_value(&mut out, &Value::Sequence(values.clone()));
            out
        })
    }
}

impl<T: TupleElements> Element for Tuple<T> {
    type Descriptor = Tuple<T>;
    type Value = T::Values;

    fn make_descriptor(name: Name) -> Self {
        Tuple::new(name)
    }

    fn extract(descriptor: &Self) -> T::Values {
        descriptor.values()
    }
}

impl<T: TupleElements> Clone for Tuple<T> {
    fn clone(&self) -> Self {
        Self {
            md: self.md.clone(),
            slots: self.slots.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T: TupleElements> std::fmt::Debug for Tuple<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tuple")
            .field("md", &self.md)
            .field("slots", &self.slots)
            .field("default", &self.default)
            .finish()
    }
}

macro_rules! impl_tuple_elements {
    ($($arity:literal => ($($ty:ident . $idx:tt),+)),+ $(,)?) => {$(
        impl<$($ty: Element),+> TupleElements for ($($ty,)+) {
            type Descriptors = ($($ty::Descriptor,)+);
            type Values = ($($ty::Value,)+);
            const ARITY: usize = $arity;

            fn make_descriptors(parent_key: &str) -> Self::Descriptors {
                ($($ty::make_descriptor(Name::sequence_element(parent_key, $idx)),)+)
            }

            fn children(descriptors: &Self::Descriptors) -> Vec<&dyn Parameter> {
                vec![$(&descriptors.$idx as &dyn Parameter,)+]
            }

            fn children_mut(descriptors: &mut Self::Descriptors) -> Vec<&mut dyn Parameter> {
                vec![$(&mut descriptors.$idx as &mut dyn Parameter,)+]
            }

            fn extract(descriptors: &Self::Descriptors) -> Self::Values {
                ($($ty::extract(&descriptors.$idx),)+)
            }
        }

        impl<$($ty: AtomElement),+> Tuple<($($ty,)+)> {
            /// Supplies per-slot defaults, making the tuple defaulted
            /// instead of required. Available when every slot is a
            /// primitive.
            pub fn with_default(mut self, default: ($($ty,)+)) -> Self {
                self.default = Some(vec![$(AtomValue::to_value(&default.$idx),)+]);
                self.md.set_presence(Presence::Default);
                self.apply_default();
                self
            }
        }
    )+};
}

impl_tuple_elements! {
    1 => (A.0),
    2 => (A.0, B.1),
    3 => (A.0, B.1, C.2),
    4 => (A.0, B.1, C.2, D.3),
    5 => (A.0, B.1, C.2, D.3, E.4),
    6 => (A.0, B.1, C.2, D.3, E.4, F.5),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_keys_are_positional() {
        let pair = Tuple::<(String, u32)>::new(Name::new("ages"));
        let children = pair.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].key(), "ages[0]");
        assert_eq!(children[1].key(), "ages[1]");
    }

    #[test]
    fn test_defaulted_tuple_reads_back() {
        let ages = Tuple::<(String, u32)>::new(Name::new("ages"))
            .with_default(("David".to_string(), 9));
        assert_eq!(ages.values(), ("David".to_string(), 9));
        assert_eq!(ages.slots().1.value(), &9);
    }

    #[test]
    fn test_input_overrides_default_per_slot() {
        let mut ages = Tuple::<(String, u32)>::new(Name::new("ages"))
            .with_default(("David".to_string(), 9));
        let mut sink = ErrorSink::new();
        ages.set_from_value(
            &Value::Sequence(vec![Value::String("Jenny".into()), Value::Int(11)]),
            &mut sink,
        );
        assert!(sink.is_empty());
        assert_eq!(ages.values(), ("Jenny".to_string(), 11));
    }

    #[test]
    fn test_wrong_arity_is_one_error() {
        let mut ages = Tuple::<(String, u32)>::new(Name::new("ages"));
        let mut sink = ErrorSink::new();
        ages.set_from_value(&Value::Sequence(vec![Value::String("Jenny".into())]), &mut sink);
        assert_eq!(
            sink.into_errors(),
            vec![ValidationError::ArityMismatch {
                key: "ages".into(),
                expected: 2,
                actual: 1,
            }]
        );
    }

    #[test]
    fn test_mixed_slot_errors_accumulate() {
        let mut triple = Tuple::<(i32, bool, String)>::new(Name::new("entry"));
        let mut sink = ErrorSink::new();
        triple.set_from_value(
            &Value::Sequence(vec![
                Value::String("one".into()),
                Value::Bool(true),
                Value::Int(3),
            ]),
            &mut sink,
        );
        let errors = sink.into_errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], ValidationError::TypeMismatch { key, .. } if key == "entry[0]"));
        assert!(matches!(&errors[1], ValidationError::TypeMismatch { key, .. } if key == "entry[2]"));
    }
}
