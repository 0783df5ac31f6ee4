//! Descriptor for a single primitive-typed leaf.

use crate::types::param::{Category, Metadata, Name, Parameter, Presence};
use crate::types::registry;
use crate::types::validate::{ErrorSink, ValidationError};
use crate::value::{AtomValue, Value, ValueError};

/// A leaf parameter holding one primitive value.
///
/// # Examples
///
/// ```
/// use config_schema_core::{Atom, Name, Parameter};
///
/// let threshold = Atom::<f64>::new(Name::new("threshold"))
///     .with_comment("Acceptance threshold")
///     .with_default(0.75);
/// assert_eq!(threshold.key(), "threshold");
/// assert_eq!(threshold.value(), &0.75);
/// ```
#[derive(Debug, Clone)]
pub struct Atom<T: AtomValue> {
    md: Metadata,
    default: Option<T>,
    value: Option<T>,
}

impl<T: AtomValue> Atom<T> {
    /// A required atom.
    pub fn new(name: Name) -> Self {
        Self::make(name, Presence::Required)
    }

    pub(crate) fn make(name: Name, presence: Presence) -> Self {
        let md = Metadata::register(name, Category::Atom, presence);
        registry::end_of_ctor();
        Self {
            md,
            default: None,
            value: None,
        }
    }

    /// Attaches a documentation comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.md.set_comment(comment);
        self
    }

    /// Supplies a default, making the atom defaulted instead of
    /// required. The default populates the value slot immediately; a
    /// matching input key overrides it.
    pub fn with_default(mut self, default: T) -> Self {
        self.value = Some(default.clone());
        self.default = Some(default);
        self.md.set_presence(Presence::Default);
        self
    }

    /// The materialized value.
    ///
    /// # Panics
    ///
    /// Panics when read before a successful validation on a
    /// non-defaulted atom; that is a caller contract violation.
    pub fn value(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => panic!("parameter '{}' read before validation", self.md.key()),
        }
    }

    pub(crate) fn value_opt(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

impl<T: AtomValue> Parameter for Atom<T> {
    fn metadata(&self) -> &Metadata {
        &self.md
    }

    fn children(&self) -> Vec<&dyn Parameter> {
        Vec::new()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Parameter> {
        Vec::new()
    }

    fn set_from_value(&mut self, value: &Value, errors: &mut ErrorSink) {
        match T::from_value(value) {
            Ok(converted) => self.value = Some(converted),
            Err(ValueError::WrongKind { expected, actual }) => {
                errors.push(ValidationError::TypeMismatch {
                    key: self.md.key().to_string(),
                    expected,
                    actual,
                });
            }
            Err(ValueError::OutOfRange { value, bound }) => {
                errors.push(ValidationError::OutOfRange {
                    key: self.md.key().to_string(),
                    value,
                    bound,
                });
            }
        }
    }

    fn mark_default(&mut self) -> bool {
        match &self.default {
            Some(default) => {
                self.value = Some(default.clone());
                true
            }
            None => false,
        }
    }

    fn reset(&mut self) {
        self.value = self.default.clone();
    }

    fn default_display(&self) -> Option<String> {
        self.default.as_ref().map(|d| {
            let mut out = String::new();
            crate::parameter_set::render_value(&mut out, &d.to_value());
            out
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;

    #[test]
    fn test_required_atom_sets_from_input() {
        let mut n = Atom::<i32>::new(Name::new("n"));
        assert_eq!(n.presence(), Presence::Required);

        let mut sink = ErrorSink::new();
        n.set_from_value(&Value::Int(7), &mut sink);
        assert!(sink.is_empty());
        assert_eq!(n.value(), &7);
    }

    #[test]
    fn test_default_populates_before_validation() {
        let mut n = Atom::<i32>::new(Name::new("n")).with_default(3);
        assert_eq!(n.presence(), Presence::Default);
        assert_eq!(n.value(), &3);

        let mut sink = ErrorSink::new();
        n.set_from_value(&Value::Int(9), &mut sink);
        assert_eq!(n.value(), &9);

        n.reset();
        assert_eq!(n.value(), &3);
    }

    #[test]
    fn test_type_mismatch_is_recorded_not_raised() {
        let mut n = Atom::<i32>::new(Name::new("n"));
        let mut sink = ErrorSink::new();
        n.set_from_value(&Value::String("seven".into()), &mut sink);
        assert_eq!(
            sink.into_errors(),
            vec![ValidationError::TypeMismatch {
                key: "n".into(),
                expected: "an int32",
                actual: Kind::String,
            }]
        );
    }

    #[test]
    #[should_panic(expected = "read before validation")]
    fn test_reading_unvalidated_required_atom_panics() {
        let n = Atom::<i32>::new(Name::new("n"));
        let _ = n.value();
    }
}
