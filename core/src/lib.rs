//! Typed parameter sets and schema validation for hierarchical
//! configuration documents.
//!
//! This crate is the core of the toolkit: an immutable value tree and a
//! family of composable schema descriptors that validate it.
//!
//! - [`ParameterSet`] — an insertion-ordered tree of named configuration
//!   values, built by the document parser (or by hand) and read-only
//!   thereafter.
//! - [`Atom`], [`Sequence`], [`Tuple`], [`Table`] — descriptors for the
//!   expected shape of the configuration, with comments, defaults, and
//!   bounded arities.
//! - [`OptionalAtom`], [`OptionalSequence`], [`OptionalTuple`],
//!   [`OptionalTable`] — variants whose absence is observable instead of
//!   an error.
//! - [`Table::validate_parameter_set`] — the validate-then-set pass:
//!   checks the schema, reconciles input keys against descriptors, and
//!   either materializes the typed view or reports every problem at once
//!   as a [`ValidationFailure`].
//! - [`Table::print_reference`] — renders reference documentation for a
//!   schema.
//!
//! # Example
//!
//! ```
//! use config_schema_core::*;
//!
//! config_table! {
//!     struct JobConfig {
//!         label: Atom<String> = Atom::new(Name::new("label")),
//!         threshold: Atom<f64> = Atom::new(Name::new("threshold")).with_default(0.5),
//!         composers: Sequence<String> = Sequence::bounded(Name::new("composers"), 2)
//!             .with_default(vec!["Mahler".into(), "Elgar".into()]),
//!         retries: OptionalAtom<u32> = OptionalAtom::new(Name::new("retries")),
//!     }
//! }
//!
//! let mut input = ParameterSet::new();
//! input.insert("label", "nightly");
//!
//! let mut schema = Table::<JobConfig>::new(Name::new("job"));
//! schema.validate_parameter_set(&input, &[]).unwrap();
//!
//! assert_eq!(schema.value().label.value(), "nightly");
//! assert_eq!(schema.value().threshold.value(), &0.5);
//! assert_eq!(schema.value().composers.value(0), "Mahler");
//! assert_eq!(schema.value().retries.value(), None);
//! ```
//!
//! Schemas are built on one thread (construction uses a thread-local
//! name stack) and validated one input at a time; distinct schemas may
//! validate concurrently, and parameter sets may be read from any number
//! of threads.

mod parameter_set;
pub mod types;
mod value;

pub use parameter_set::{LookupError, ParameterSet, PrintMode, SourceLocation};
pub use types::*;
pub use value::{AtomValue, Kind, Value, ValueError};
