//! The schema descriptor family.
//!
//! A schema is a tree of parameter descriptors: [`Atom`] leaves,
//! [`Sequence`] and [`Tuple`] collections, [`Table`] groups, and the
//! `Optional*` variants of each. Descriptors register their
//! fully-qualified keys against a construction-time name stack as the
//! schema object is built, then a two-phase validate-then-set pass
//! materializes them from a [`ParameterSet`](crate::ParameterSet).

mod atom;
mod element;
mod optional;
mod param;
mod print;
mod registry;
mod sequence;
mod table;
mod tuple;
mod validate;
mod walk;

pub use atom::Atom;
pub use element::{AtomElement, Bounded, Element};
pub use optional::{OptionalAtom, OptionalSequence, OptionalTable, OptionalTuple};
pub use param::{Category, Metadata, Name, Parameter, Presence};
pub use sequence::{Arity, Sequence};
pub use table::{Table, TableFragment, TableMembers};
pub use tuple::{Tuple, TupleElements};
pub use validate::{
    ErrorSink, SchemaError, ValidateError, ValidationError, ValidationFailure,
};
pub use walk::{walk, walk_mut, Visitor, VisitorMut};
