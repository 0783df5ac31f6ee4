//! Validation diagnostics and the schema pre-check.
//!
//! Validation never stops at the first problem: descriptors record every
//! diagnostic in an [`ErrorSink`] and the driver raises one aggregated
//! [`ValidationFailure`] at the end, with errors ordered by the input
//! document. Defects in the schema itself (duplicate sibling names,
//! optionals nested under optionals, misplaced table fragments) are a
//! separate kind, [`SchemaError`], reported by [`precheck`] before the
//! input is touched.

use thiserror::Error;

use crate::types::param::Parameter;
use crate::types::walk::{walk, walk_mut, Visitor, VisitorMut};
use crate::value::Kind;

/// One validation diagnostic against an input parameter set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required descriptor has no matching input key.
    #[error("missing required parameter '{key}'")]
    MissingKey { key: String },

    /// Input keys matched by no descriptor and not explicitly ignored.
    #[error("unrecognized parameters: {}", keys.join(", "))]
    ExtraKeys { keys: Vec<String> },

    /// The input value at `key` has the wrong kind or type.
    #[error("parameter '{key}' is {actual}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: Kind,
    },

    /// A bounded sequence or tuple received the wrong number of
    /// elements.
    #[error("parameter '{key}' expects {expected} elements, got {actual}")]
    ArityMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// A numeric value matched the key but converting it would lose
    /// information.
    #[error("parameter '{key}': value {value} does not fit: {bound}")]
    OutOfRange {
        key: String,
        value: String,
        bound: String,
    },
}

impl ValidationError {
    /// Rewrites keys relative to the validation root, so diagnostics
    /// read the way the input document does.
    pub(crate) fn strip_key_prefix(self, prefix: &str) -> Self {
        let strip = |key: String| match key.strip_prefix(prefix) {
            Some(stripped) => stripped.to_string(),
            None => key,
        };
        match self {
            ValidationError::MissingKey { key } => ValidationError::MissingKey { key: strip(key) },
            ValidationError::ExtraKeys { keys } => ValidationError::ExtraKeys {
                keys: keys.into_iter().map(strip).collect(),
            },
            ValidationError::TypeMismatch {
                key,
                expected,
                actual,
            } => ValidationError::TypeMismatch {
                key: strip(key),
                expected,
                actual,
            },
            ValidationError::ArityMismatch {
                key,
                expected,
                actual,
            } => ValidationError::ArityMismatch {
                key: strip(key),
                expected,
                actual,
            },
            ValidationError::OutOfRange { key, value, bound } => ValidationError::OutOfRange {
                key: strip(key),
                value,
                bound,
            },
        }
    }
}

/// Every diagnostic from one validation pass, in input document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    errors: Vec<ValidationError>,
}

impl ValidationFailure {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "configuration validation failed with {} error(s):",
            self.errors.len()
        )?;
        for error in &self.errors {
            writeln!(f, "  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// A structural defect in the schema itself, detected before the input
/// is consulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two siblings in a table (including fragment-flattened members)
    /// share a name.
    #[error("duplicate parameter name '{name}' in table '{parent}'")]
    DuplicateName { parent: String, name: String },

    /// An optional descriptor contains another optional descriptor;
    /// the nested optionality would be meaningless.
    #[error("optional parameter '{key}' is nested inside another optional parameter")]
    NestedOptional { key: String },

    /// A table fragment appears under an optional parameter; fragments
    /// belong directly inside required tables.
    #[error("table '{key}' contains a fragment inside an optional parameter")]
    MisplacedFragment { key: String },
}

/// Outcome of [`Table::validate_parameter_set`][crate::Table::validate_parameter_set]:
/// either the schema itself is defective or the input failed validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
}

/// Accumulates validation diagnostics across a whole pass.
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Vec<ValidationError>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

/// Read-only schema pre-check: asserts the construction invariants the
/// type system cannot express, walking the whole tree once.
pub(crate) fn precheck(root: &dyn Parameter) -> Result<(), SchemaError> {
    let mut pass = Precheck {
        optional_depth: 0,
        error: None,
    };
    walk(root, &mut pass);
    match pass.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

struct Precheck {
    optional_depth: usize,
    error: Option<SchemaError>,
}

impl Precheck {
    fn enter(&mut self, parameter: &dyn Parameter) {
        if self.error.is_some() {
            return;
        }
        if parameter.is_optional() {
            if self.optional_depth > 0 {
                self.error = Some(SchemaError::NestedOptional {
                    key: parameter.key().to_string(),
                });
                return;
            }
            self.optional_depth += 1;
        }
    }

    fn leave(&mut self, parameter: &dyn Parameter) {
        if self.error.is_none() && parameter.is_optional() {
            self.optional_depth -= 1;
        }
    }
}

fn flattened_names(parameter: &dyn Parameter, out: &mut Vec<String>) {
    for child in parameter.children() {
        if child.is_fragment() {
            flattened_names(child, out);
        } else {
            out.push(child.name().to_string());
        }
    }
}

impl Visitor for Precheck {
    fn atom(&mut self, parameter: &dyn Parameter) {
        if self.error.is_none() && parameter.is_optional() && self.optional_depth > 0 {
            self.error = Some(SchemaError::NestedOptional {
                key: parameter.key().to_string(),
            });
        }
    }

    fn enter_table(&mut self, parameter: &dyn Parameter) {
        self.enter(parameter);
        if self.error.is_some() {
            return;
        }
        if self.optional_depth > 0
            && parameter
                .children()
                .iter()
                .any(|child| child.is_fragment())
        {
            self.error = Some(SchemaError::MisplacedFragment {
                key: parameter.key().to_string(),
            });
            return;
        }
        let mut names = Vec::new();
        flattened_names(parameter, &mut names);
        let mut seen = std::collections::HashSet::new();
        for name in names {
            if !seen.insert(name.clone()) {
                self.error = Some(SchemaError::DuplicateName {
                    parent: parameter.key().to_string(),
                    name,
                });
                return;
            }
        }
    }

    fn exit_table(&mut self, parameter: &dyn Parameter) {
        self.leave(parameter);
    }

    fn enter_sequence(&mut self, parameter: &dyn Parameter) {
        self.enter(parameter);
    }

    fn exit_sequence(&mut self, parameter: &dyn Parameter) {
        self.leave(parameter);
    }

    fn enter_tuple(&mut self, parameter: &dyn Parameter) {
        self.enter(parameter);
    }

    fn exit_tuple(&mut self, parameter: &dyn Parameter) {
        self.leave(parameter);
    }
}

/// Returns every descriptor to its post-construction state so the same
/// schema can be validated against a new input. Children reset before
/// their parent, letting parents reapply construction-time defaults on
/// top of cleared elements.
pub(crate) fn reset_tree(root: &mut dyn Parameter) {
    walk_mut(root, &mut ResetPass);
}

struct ResetPass;

impl VisitorMut for ResetPass {
    fn atom(&mut self, parameter: &mut dyn Parameter) {
        parameter.reset();
    }

    fn exit_table(&mut self, parameter: &mut dyn Parameter) {
        parameter.reset();
    }

    fn exit_sequence(&mut self, parameter: &mut dyn Parameter) {
        parameter.reset();
    }

    fn exit_tuple(&mut self, parameter: &mut dyn Parameter) {
        parameter.reset();
    }
}
