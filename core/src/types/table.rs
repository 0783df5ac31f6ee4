//! Descriptor for a named group of parameters; the schema root.

use std::collections::HashMap;

use crate::parameter_set::ParameterSet;
use crate::types::element::Element;
use crate::types::param::{Category, Metadata, Name, Parameter, Presence};
use crate::types::print::render_reference;
use crate::types::registry;
use crate::types::validate::{
    self, ErrorSink, ValidateError, ValidationError, ValidationFailure,
};
use crate::value::Value;

/// A user schema type: a struct whose fields are parameter descriptors.
///
/// `describe()` builds the fields (each descriptor registers its key
/// against the construction-time name stack as it is created); the
/// `members` methods expose them to walks and validation in declaration
/// order. The [`config_table!`](crate::config_table) macro writes all
/// three for you.
pub trait TableMembers {
    fn describe() -> Self;
    fn members(&self) -> Vec<&dyn Parameter>;
    fn members_mut(&mut self) -> Vec<&mut dyn Parameter>;
}

/// A parameter grouping the members of a user schema type `C`.
///
/// The root of every schema is a `Table`; nested groups are tables all
/// the way down. After a successful
/// [`validate_parameter_set`](Table::validate_parameter_set), the typed
/// view is read through [`value`](Table::value).
///
/// # Examples
///
/// ```
/// use config_schema_core::{config_table, Atom, Name, Table};
///
/// config_table! {
///     struct Settings {
///         threshold: Atom<f64> = Atom::new(Name::new("threshold")).with_default(0.5),
///     }
/// }
///
/// let mut schema = Table::<Settings>::new(Name::new("settings"));
/// let input = config_schema_core::ParameterSet::new();
/// schema.validate_parameter_set(&input, &[]).unwrap();
/// assert_eq!(schema.value().threshold.value(), &0.5);
/// ```
pub struct Table<C: TableMembers> {
    md: Metadata,
    value: C,
    pset: ParameterSet,
}

impl<C: TableMembers> Table<C> {
    /// A required table.
    pub fn new(name: Name) -> Self {
        Self::make(name, Presence::Required)
    }

    pub(crate) fn make(name: Name, presence: Presence) -> Self {
        let md = Metadata::register(name, Category::Table, presence);
        let value = C::describe();
        registry::end_of_ctor();
        Self {
            md,
            value,
            pset: ParameterSet::new(),
        }
    }

    /// Attaches a documentation comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.md.set_comment(comment);
        self
    }

    /// The typed view over the members.
    pub fn value(&self) -> &C {
        &self.value
    }

    /// The parameter set this table was populated from.
    pub fn parameter_set(&self) -> &ParameterSet {
        &self.pset
    }

    /// Validates `pset` against this schema and materializes the typed
    /// view.
    ///
    /// The pass never stops early: every missing required key, every
    /// unrecognized key not listed in `keys_to_ignore`, and every type,
    /// arity, and range problem is collected, and the aggregate is
    /// returned as one [`ValidationFailure`] in input document order. A
    /// structural defect in the schema itself is reported as a
    /// [`SchemaError`](crate::SchemaError) before the input is touched.
    ///
    /// A name in `keys_to_ignore` that is also a declared member is
    /// validated normally; the ignore list only filters keys no
    /// descriptor matched.
    pub fn validate_parameter_set(
        &mut self,
        pset: &ParameterSet,
        keys_to_ignore: &[&str],
    ) -> Result<(), ValidateError> {
        validate::precheck(&*self)?;
        validate::reset_tree(self);

        let mut sink = ErrorSink::new();
        self.reconcile(pset, keys_to_ignore, &mut sink);
        self.pset = pset.clone();

        let prefix = format!("{}.", self.md.key());
        let errors: Vec<ValidationError> = sink
            .into_errors()
            .into_iter()
            .map(|error| error.strip_key_prefix(&prefix))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(errors).into())
        }
    }

    /// Renders reference documentation for this schema: every member
    /// with its comment, presence, and default, nested structure in
    /// declaration order. `indent` is the per-level indentation width.
    pub fn print_reference(
        &self,
        out: &mut dyn std::fmt::Write,
        indent: usize,
    ) -> std::fmt::Result {
        render_reference(self, out, indent)
    }

    /// One nesting level of the validate-then-set pass: match input
    /// keys to members in input document order, fall back to defaults,
    /// report required members with no match, and report leftover keys.
    fn reconcile(&mut self, input: &ParameterSet, keys_to_ignore: &[&str], errors: &mut ErrorSink) {
        let mut children = flatten_members(self.value.members_mut());
        let positions: HashMap<String, usize> = children
            .iter()
            .enumerate()
            .map(|(index, child)| (child.name().to_string(), index))
            .collect();

        let mut matched = vec![false; children.len()];
        for (name, value) in input.iter() {
            if let Some(&index) = positions.get(name) {
                matched[index] = true;
                children[index].set_from_value(value, errors);
            }
        }

        for (index, child) in children.iter_mut().enumerate() {
            if matched[index] || child.mark_default() || child.is_optional() {
                continue;
            }
            errors.push(ValidationError::MissingKey {
                key: child.key().to_string(),
            });
        }

        let unused: Vec<String> = input
            .keys()
            .filter(|name| !positions.contains_key(*name))
            .filter(|name| !keys_to_ignore.contains(name))
            .map(|name| format!("{}.{name}", self.md.key()))
            .collect();
        if !unused.is_empty() {
            errors.push(ValidationError::ExtraKeys { keys: unused });
        }
    }
}

fn flatten_members(members: Vec<&mut dyn Parameter>) -> Vec<&mut dyn Parameter> {
    let mut out = Vec::new();
    for member in members {
        if member.is_fragment() {
            out.extend(flatten_members(member.children_mut()));
        } else {
            out.push(member);
        }
    }
    out
}

impl<C: TableMembers> Parameter for Table<C> {
    fn metadata(&self) -> &Metadata {
        &self.md
    }

    fn children(&self) -> Vec<&dyn Parameter> {
        self.value.members()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Parameter> {
        self.value.members_mut()
    }

    fn set_from_value(&mut self, value: &Value, errors: &mut ErrorSink) {
        let Value::Table(pset) = value else {
            errors.push(ValidationError::TypeMismatch {
                key: self.md.key().to_string(),
                expected: "a table",
                actual: value.kind(),
            });
            return;
        };
        self.reconcile(pset, &[], errors);
        self.pset = pset.clone();
    }

    fn mark_default(&mut self) -> bool {
        false
    }

    fn reset(&mut self) {
        self.pset = ParameterSet::new();
    }
}

impl<C: TableMembers + Clone + std::fmt::Debug> Element for Table<C> {
    type Descriptor = Table<C>;
    type Value = C;

    fn make_descriptor(name: Name) -> Self {
        Table::new(name)
    }

    fn extract(descriptor: &Self) -> C {
        descriptor.value().clone()
    }
}

impl<C: TableMembers + Clone> Clone for Table<C> {
    fn clone(&self) -> Self {
        Self {
            md: self.md.clone(),
            value: self.value.clone(),
            pset: self.pset.clone(),
        }
    }
}

impl<C: TableMembers + std::fmt::Debug> std::fmt::Debug for Table<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("md", &self.md)
            .field("value", &self.value)
            .field("pset", &self.pset)
            .finish()
    }
}

/// A flattening helper: its members validate directly against the
/// enclosing table's bindings, with no extra nesting level. Fragments
/// belong only inside tables; the type has no [`Element`]
/// implementation, so sequences and tuples of fragments do not compile.
pub struct TableFragment<C: TableMembers> {
    md: Metadata,
    value: C,
}

impl<C: TableMembers> TableFragment<C> {
    pub fn new() -> Self {
        Self {
            md: Metadata::fragment(),
            value: C::describe(),
        }
    }

    /// The typed view over the flattened members.
    pub fn value(&self) -> &C {
        &self.value
    }
}

impl<C: TableMembers> Default for TableFragment<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TableMembers> Parameter for TableFragment<C> {
    fn metadata(&self) -> &Metadata {
        &self.md
    }

    fn children(&self) -> Vec<&dyn Parameter> {
        self.value.members()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Parameter> {
        self.value.members_mut()
    }

    fn set_from_value(&mut self, _value: &Value, _errors: &mut ErrorSink) {
        debug_assert!(false, "fragments flatten into their parent and are never set directly");
    }

    fn mark_default(&mut self) -> bool {
        false
    }

    fn reset(&mut self) {}

    fn is_fragment(&self) -> bool {
        true
    }
}

impl<C: TableMembers + Clone> Clone for TableFragment<C> {
    fn clone(&self) -> Self {
        Self {
            md: self.md.clone(),
            value: self.value.clone(),
        }
    }
}

impl<C: TableMembers + std::fmt::Debug> std::fmt::Debug for TableFragment<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableFragment")
            .field("md", &self.md)
            .field("value", &self.value)
            .finish()
    }
}

/// Declares a schema struct and implements
/// [`TableMembers`](crate::TableMembers) for it.
///
/// Each field is written `name: DescriptorType = constructor`, where the
/// constructor runs inside the enclosing table's construction so keys
/// nest correctly.
///
/// ```
/// use config_schema_core::{config_table, Atom, Name, Sequence};
///
/// config_table! {
///     pub struct Pipeline {
///         pub label: Atom<String> = Atom::new(Name::new("label")),
///         pub stages: Sequence<String> = Sequence::unbounded(Name::new("stages")),
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_table {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty = $field_init:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field : $field_ty,
            )*
        }

        impl $crate::TableMembers for $name {
            fn describe() -> Self {
                Self {
                    $($field : $field_init,)*
                }
            }

            fn members(&self) -> ::std::vec::Vec<&dyn $crate::Parameter> {
                ::std::vec![$(&self.$field as &dyn $crate::Parameter,)*]
            }

            fn members_mut(&mut self) -> ::std::vec::Vec<&mut dyn $crate::Parameter> {
                ::std::vec![$(&mut self.$field as &mut dyn $crate::Parameter,)*]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::atom::Atom;
    use crate::types::sequence::Sequence;

    config_table! {
        struct Inner {
            path: Atom<String> = Atom::new(Name::new("path")),
            level: Atom<i32> = Atom::new(Name::new("level")).with_default(1),
        }
    }

    config_table! {
        struct Outer {
            enabled: Atom<bool> = Atom::new(Name::new("enabled")),
            output: Table<Inner> = Table::new(Name::new("output")),
            tags: Sequence<String> = Sequence::unbounded(Name::new("tags")),
        }
    }

    fn input() -> ParameterSet {
        let mut inner = ParameterSet::new();
        inner.insert("path", "out.dat");

        let mut pset = ParameterSet::new();
        pset.insert("enabled", true);
        pset.insert("output", inner);
        pset.insert("tags", vec!["fast"]);
        pset
    }

    #[test]
    fn test_nested_keys_follow_declaration() {
        let schema = Table::<Outer>::new(Name::new("job"));
        let children = schema.children();
        assert_eq!(children[0].key(), "job.enabled");
        assert_eq!(children[1].key(), "job.output");
        assert_eq!(children[1].children()[0].key(), "job.output.path");
    }

    #[test]
    fn test_validate_and_read_back() {
        let mut schema = Table::<Outer>::new(Name::new("job"));
        schema.validate_parameter_set(&input(), &[]).unwrap();
        assert_eq!(schema.value().enabled.value(), &true);
        assert_eq!(schema.value().output.value().path.value(), "out.dat");
        assert_eq!(schema.value().output.value().level.value(), &1);
        assert_eq!(schema.value().tags.values(), vec!["fast"]);
        assert_eq!(schema.parameter_set(), &input());
    }

    #[test]
    fn test_missing_and_extra_aggregate() {
        let mut pset = input();
        pset.erase("enabled");
        pset.insert("stray", 1i64);

        let mut schema = Table::<Outer>::new(Name::new("job"));
        let err = schema.validate_parameter_set(&pset, &[]).unwrap_err();
        let ValidateError::Invalid(failure) = err else {
            panic!("expected a validation failure");
        };
        assert_eq!(
            failure.errors(),
            &[
                ValidationError::MissingKey {
                    key: "enabled".into()
                },
                ValidationError::ExtraKeys {
                    keys: vec!["stray".into()]
                },
            ]
        );
    }

    #[test]
    fn test_keys_to_ignore_filters_leftovers_only() {
        let mut pset = input();
        pset.insert("stray", 1i64);

        let mut schema = Table::<Outer>::new(Name::new("job"));
        schema.validate_parameter_set(&pset, &["stray"]).unwrap();
        // An ignored name that is also a member still validates normally.
        let mut schema = Table::<Outer>::new(Name::new("job"));
        schema
            .validate_parameter_set(&pset, &["stray", "enabled"])
            .unwrap();
        assert_eq!(schema.value().enabled.value(), &true);
    }

    #[test]
    fn test_revalidation_resets_prior_state() {
        let mut schema = Table::<Outer>::new(Name::new("job"));
        schema.validate_parameter_set(&input(), &[]).unwrap();

        let mut second = input();
        second.insert("tags", Vec::<String>::new());
        schema.validate_parameter_set(&second, &[]).unwrap();
        assert!(schema.value().tags.values().is_empty());
    }

    config_table! {
        struct Common {
            label: Atom<String> = Atom::new(Name::new("label")),
        }
    }

    config_table! {
        struct WithFragment {
            common: TableFragment<Common> = TableFragment::new(),
            count: Atom<i32> = Atom::new(Name::new("count")),
        }
    }

    #[test]
    fn test_fragment_members_flatten_into_parent() {
        let mut pset = ParameterSet::new();
        pset.insert("label", "run7");
        pset.insert("count", 3i64);

        let mut schema = Table::<WithFragment>::new(Name::new("job"));
        schema.validate_parameter_set(&pset, &[]).unwrap();
        assert_eq!(schema.value().common.value().label.value(), "run7");
        assert_eq!(schema.value().count.value(), &3);
        // Fragment members live at the parent's level.
        assert_eq!(schema.children()[0].children()[0].key(), "job.label");
    }
}
