//! Optional variants of the descriptor family.
//!
//! An optional parameter's absence is not an error, and its accessor
//! makes absence observable: `None` when the key never appeared,
//! `Some(...)` when it did. None of these types offer a default, since
//! "absent" and "present with the default" would be indistinguishable;
//! a parameter wanting a fallback uses the non-optional variant with
//! `with_default` instead. Optional types also implement no
//! [`Element`](crate::Element), which makes an optional sequence
//! element or tuple slot a compile error rather than a runtime schema
//! defect.

use crate::parameter_set::ParameterSet;
use crate::types::atom::Atom;
use crate::types::element::Element;
use crate::types::param::{Metadata, Name, Parameter, Presence};
use crate::types::sequence::{Arity, Sequence};
use crate::types::table::{Table, TableMembers};
use crate::types::tuple::{Tuple, TupleElements};
use crate::types::validate::ErrorSink;
use crate::value::{AtomValue, Value};

macro_rules! delegate_parameter_impl {
    () => {
        fn metadata(&self) -> &Metadata {
            self.inner.metadata()
        }

        fn children(&self) -> Vec<&dyn Parameter> {
            self.inner.children()
        }

        fn children_mut(&mut self) -> Vec<&mut dyn Parameter> {
            self.inner.children_mut()
        }

        fn set_from_value(&mut self, value: &Value, errors: &mut ErrorSink) {
            let before = errors.len();
            self.inner.set_from_value(value, errors);
            if errors.len() == before {
                self.has_value = true;
            }
        }

        fn mark_default(&mut self) -> bool {
            false
        }

        fn reset(&mut self) {
            self.has_value = false;
            self.inner.reset();
        }
    };
}

/// An [`Atom`] whose absence is observable instead of an error.
///
/// # Examples
///
/// ```
/// use config_schema_core::{Name, OptionalAtom};
///
/// let n = OptionalAtom::<i32>::new(Name::new("n"));
/// assert_eq!(n.value(), None);
/// ```
#[derive(Debug, Clone)]
pub struct OptionalAtom<T: AtomValue> {
    inner: Atom<T>,
    has_value: bool,
}

impl<T: AtomValue> OptionalAtom<T> {
    pub fn new(name: Name) -> Self {
        Self {
            inner: Atom::make(name, Presence::Optional),
            has_value: false,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.inner = self.inner.with_comment(comment);
        self
    }

    /// `Some` with the materialized value when the key was present.
    pub fn value(&self) -> Option<&T> {
        if self.has_value {
            self.inner.value_opt()
        } else {
            None
        }
    }
}

impl<T: AtomValue> Parameter for OptionalAtom<T> {
    delegate_parameter_impl!();
}

/// A [`Sequence`] whose absence is observable instead of an error.
pub struct OptionalSequence<E: Element> {
    inner: Sequence<E>,
    has_value: bool,
}

impl<E: Element> OptionalSequence<E> {
    pub fn unbounded(name: Name) -> Self {
        Self {
            inner: Sequence::make(name, Arity::Unbounded, Presence::Optional),
            has_value: false,
        }
    }

    pub fn bounded(name: Name, count: usize) -> Self {
        Self {
            inner: Sequence::make(name, Arity::Bounded(count), Presence::Optional),
            has_value: false,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.inner = self.inner.with_comment(comment);
        self
    }

    /// `Some` with every element when the key was present.
    pub fn value(&self) -> Option<Vec<E::Value>> {
        if self.has_value {
            Some(self.inner.values())
        } else {
            None
        }
    }
}

impl<E: Element> Parameter for OptionalSequence<E> {
    delegate_parameter_impl!();
}

impl<E: Element> Clone for OptionalSequence<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            has_value: self.has_value,
        }
    }
}

impl<E: Element> std::fmt::Debug for OptionalSequence<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalSequence")
            .field("inner", &self.inner)
            .field("has_value", &self.has_value)
            .finish()
    }
}

/// A [`Tuple`] whose absence is observable instead of an error.
pub struct OptionalTuple<T: TupleElements> {
    inner: Tuple<T>,
    has_value: bool,
}

impl<T: TupleElements> OptionalTuple<T> {
    pub fn new(name: Name) -> Self {
        Self {
            inner: Tuple::make(name, Presence::Optional),
            has_value: false,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.inner = self.inner.with_comment(comment);
        self
    }

    /// `Some` with the positional aggregate when the key was present.
    pub fn value(&self) -> Option<T::Values> {
        if self.has_value {
            Some(self.inner.values())
        } else {
            None
        }
    }
}

impl<T: TupleElements> Parameter for OptionalTuple<T> {
    delegate_parameter_impl!();
}

impl<T: TupleElements> Clone for OptionalTuple<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            has_value: self.has_value,
        }
    }
}

impl<T: TupleElements> std::fmt::Debug for OptionalTuple<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalTuple")
            .field("inner", &self.inner)
            .field("has_value", &self.has_value)
            .finish()
    }
}

/// A [`Table`] whose absence is observable instead of an error.
pub struct OptionalTable<C: TableMembers> {
    inner: Table<C>,
    has_value: bool,
}

impl<C: TableMembers> OptionalTable<C> {
    pub fn new(name: Name) -> Self {
        Self {
            inner: Table::make(name, Presence::Optional),
            has_value: false,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.inner = self.inner.with_comment(comment);
        self
    }

    /// `Some` with the typed member view when the key was present.
    pub fn value(&self) -> Option<&C> {
        if self.has_value {
            Some(self.inner.value())
        } else {
            None
        }
    }

    /// The parameter set the table was populated from, when present.
    pub fn parameter_set(&self) -> Option<&ParameterSet> {
        if self.has_value {
            Some(self.inner.parameter_set())
        } else {
            None
        }
    }
}

impl<C: TableMembers> Parameter for OptionalTable<C> {
    delegate_parameter_impl!();
}

impl<C: TableMembers + Clone> Clone for OptionalTable<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            has_value: self.has_value,
        }
    }
}

impl<C: TableMembers + std::fmt::Debug> std::fmt::Debug for OptionalTable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalTable")
            .field("inner", &self.inner)
            .field("has_value", &self.has_value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_then_present() {
        let mut n = OptionalAtom::<i32>::new(Name::new("n"));
        assert!(n.is_optional());
        assert_eq!(n.value(), None);

        let mut sink = ErrorSink::new();
        n.set_from_value(&Value::Int(7), &mut sink);
        assert!(sink.is_empty());
        assert_eq!(n.value(), Some(&7));

        n.reset();
        assert_eq!(n.value(), None);
    }

    #[test]
    fn test_failed_set_stays_absent() {
        let mut n = OptionalAtom::<i32>::new(Name::new("n"));
        let mut sink = ErrorSink::new();
        n.set_from_value(&Value::String("seven".into()), &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(n.value(), None);
    }

    #[test]
    fn test_optional_sequence_reads_whole() {
        let mut tags = OptionalSequence::<String>::unbounded(Name::new("tags"));
        assert_eq!(tags.value(), None);

        let mut sink = ErrorSink::new();
        tags.set_from_value(&Value::from(vec!["a", "b"]), &mut sink);
        assert_eq!(
            tags.value(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_optional_tuple_aggregate() {
        let mut pair = OptionalTuple::<(String, u32)>::new(Name::new("pair"));
        assert!(pair.value().is_none());

        let mut sink = ErrorSink::new();
        pair.set_from_value(
            &Value::Sequence(vec![Value::String("x".into()), Value::Int(1)]),
            &mut sink,
        );
        assert_eq!(pair.value(), Some(("x".to_string(), 1)));
    }
}
