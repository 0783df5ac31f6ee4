//! Mapping from Rust types to the descriptors that represent them as
//! sequence or tuple elements.
//!
//! Primitive types map to [`Atom`]; the structured descriptors map to
//! themselves, so sequences of tables, sequences of tuples, and tuples
//! mixing all of them compose freely. Optional descriptors and table
//! fragments intentionally have no [`Element`] implementation: an
//! optional element of a sequence and a fragment inside a tuple are
//! schema defects, and leaving the implementation out turns both into
//! compile errors.

use std::marker::PhantomData;

use crate::types::atom::Atom;
use crate::types::param::{Name, Parameter};
use crate::value::AtomValue;

/// A type usable as the element of a [`Sequence`][crate::Sequence] or a
/// slot of a [`Tuple`][crate::Tuple].
pub trait Element {
    /// The descriptor standing in for this element.
    type Descriptor: Parameter + Clone + std::fmt::Debug;
    /// What the accessor hands back for one element.
    type Value;

    /// Builds the element descriptor under the given (synthetic) name.
    fn make_descriptor(name: Name) -> Self::Descriptor;

    /// Reads the materialized value out of a validated descriptor.
    fn extract(descriptor: &Self::Descriptor) -> Self::Value;
}

macro_rules! impl_element_for_atom {
    ($($ty:ty),* $(,)?) => {$(
        impl Element for $ty {
            type Descriptor = Atom<$ty>;
            type Value = $ty;

            fn make_descriptor(name: Name) -> Atom<$ty> {
                Atom::new(name)
            }

            fn extract(descriptor: &Atom<$ty>) -> $ty {
                descriptor.value().clone()
            }
        }
    )*};
}

impl_element_for_atom!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String);

/// Marker selecting a bounded inner sequence as an element type:
/// `Sequence<Bounded<i32, 3>>` is a sequence whose elements are
/// sequences of exactly three integers.
pub struct Bounded<E, const N: usize>(pub PhantomData<E>);

impl<E: Element, const N: usize> Element for Bounded<E, N> {
    type Descriptor = crate::types::sequence::Sequence<E>;
    type Value = Vec<E::Value>;

    fn make_descriptor(name: Name) -> Self::Descriptor {
        crate::types::sequence::Sequence::bounded(name, N)
    }

    fn extract(descriptor: &Self::Descriptor) -> Self::Value {
        descriptor.values()
    }
}

/// A value usable as a sequence or tuple default: a primitive whose
/// element descriptor is an [`Atom`] of itself.
pub trait AtomElement: AtomValue + Element<Descriptor = Atom<Self>, Value = Self> {}

impl<T> AtomElement for T where T: AtomValue + Element<Descriptor = Atom<T>, Value = T> {}
