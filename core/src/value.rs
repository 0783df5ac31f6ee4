//! Configuration value representation.
//!
//! The document model contains the following value kinds:
//! - nil (explicit absence marker, legal in raw documents but rejected by
//!   the typed schema layer)
//! - boolean (`true`/`false`)
//! - integer (signed, `i64`) and unsigned integer (`u64`)
//! - floating point (`f64`)
//! - string (UTF-8)
//! - sequence (ordered list of values)
//! - table (a nested [`ParameterSet`])
//!
//! Non-negative integers that fit `i64` are canonically stored as
//! [`Value::Int`]; [`Value::Uint`] is reserved for magnitudes above
//! `i64::MAX`. Typed reads coerce among the numeric kinds only when the
//! conversion is exact; a lossy conversion is reported, never performed.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::parameter_set::ParameterSet;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Table(ParameterSet),
}

/// Discriminant of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Sequence,
    Table,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Kind::Nil => "nil",
            Kind::Bool => "a boolean",
            Kind::Int => "an integer",
            Kind::Uint => "an unsigned integer",
            Kind::Float => "a floating-point number",
            Kind::String => "a string",
            Kind::Sequence => "a sequence",
            Kind::Table => "a table",
        };
        f.write_str(text)
    }
}

impl Value {
    /// Returns the kind tag for this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Sequence(_) => Kind::Sequence,
            Value::Table(_) => Kind::Table,
        }
    }
}

/// A failed conversion between a [`Value`] and a Rust type.
///
/// Carries no key; callers attach the offending key when they know it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// The value has the wrong kind entirely (e.g., a string where a
    /// number is expected).
    #[error("expected {expected}, found {actual}")]
    WrongKind { expected: &'static str, actual: Kind },

    /// The value has a numeric kind but the conversion would lose
    /// information.
    #[error("value {value} does not fit: {bound}")]
    OutOfRange { value: String, bound: String },
}

/// A Rust type that maps onto a single primitive configuration value.
///
/// Implemented for `bool`, the fixed-width integers, `f32`/`f64`, and
/// `String`. Numeric conversions are exact or rejected; `from_value`
/// never rounds or truncates.
pub trait AtomValue: Clone + std::fmt::Debug {
    /// Human-readable type name used in diagnostics (e.g. `"int32"`).
    fn type_name() -> &'static str;

    /// Converts a document value into this type, exactly.
    fn from_value(value: &Value) -> Result<Self, ValueError>;

    /// Converts this value back into its canonical document form.
    fn to_value(&self) -> Value;
}

impl AtomValue for bool {
    fn type_name() -> &'static str {
        "a boolean"
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(ValueError::WrongKind {
                expected: Self::type_name(),
                actual: other.kind(),
            }),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl AtomValue for String {
    fn type_name() -> &'static str {
        "a string"
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(ValueError::WrongKind {
                expected: Self::type_name(),
                actual: other.kind(),
            }),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

fn float_is_exact_int(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 // 2^53
}

macro_rules! impl_atom_value_for_int {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl AtomValue for $ty {
            fn type_name() -> &'static str {
                $name
            }

            fn from_value(value: &Value) -> Result<Self, ValueError> {
                let out_of_range = |shown: String| ValueError::OutOfRange {
                    value: shown,
                    bound: format!("outside the range of {}", $name),
                };
                match value {
                    Value::Int(i) => {
                        <$ty>::try_from(*i).map_err(|_| out_of_range(i.to_string()))
                    }
                    Value::Uint(u) => {
                        <$ty>::try_from(*u).map_err(|_| out_of_range(u.to_string()))
                    }
                    Value::Float(f) if float_is_exact_int(*f) => {
                        let i = *f as i64;
                        <$ty>::try_from(i).map_err(|_| out_of_range(format!("{f:?}")))
                    }
                    Value::Float(f) => Err(ValueError::OutOfRange {
                        value: format!("{f:?}"),
                        bound: format!("not exactly representable as {}", $name),
                    }),
                    other => Err(ValueError::WrongKind {
                        expected: $name,
                        actual: other.kind(),
                    }),
                }
            }

            fn to_value(&self) -> Value {
                match i64::try_from(*self) {
                    Ok(i) => Value::Int(i),
                    // Only u64 values above i64::MAX land here.
                    Err(_) => Value::Uint(*self as u64),
                }
            }
        }
    )*};
}

impl_atom_value_for_int! {
    i8 => "an int8",
    i16 => "an int16",
    i32 => "an int32",
    i64 => "an int64",
    u8 => "a uint8",
    u16 => "a uint16",
    u32 => "a uint32",
    u64 => "a uint64",
}

macro_rules! impl_atom_value_for_float {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl AtomValue for $ty {
            fn type_name() -> &'static str {
                $name
            }

            fn from_value(value: &Value) -> Result<Self, ValueError> {
                let exact = |wide: f64, shown: String| {
                    let narrowed = wide as $ty;
                    if f64::from(narrowed) == wide {
                        Ok(narrowed)
                    } else {
                        Err(ValueError::OutOfRange {
                            value: shown,
                            bound: format!("not exactly representable as {}", $name),
                        })
                    }
                };
                match value {
                    Value::Float(f) => exact(*f, format!("{f:?}")),
                    Value::Int(i) => exact(*i as f64, i.to_string()).and_then(|v| {
                        if f64::from(v) as i64 == *i {
                            Ok(v)
                        } else {
                            Err(ValueError::OutOfRange {
                                value: i.to_string(),
                                bound: format!("not exactly representable as {}", $name),
                            })
                        }
                    }),
                    Value::Uint(u) => exact(*u as f64, u.to_string()).and_then(|v| {
                        if f64::from(v) as u64 == *u {
                            Ok(v)
                        } else {
                            Err(ValueError::OutOfRange {
                                value: u.to_string(),
                                bound: format!("not exactly representable as {}", $name),
                            })
                        }
                    }),
                    other => Err(ValueError::WrongKind {
                        expected: $name,
                        actual: other.kind(),
                    }),
                }
            }

            fn to_value(&self) -> Value {
                Value::Float(f64::from(*self))
            }
        }
    )*};
}

impl_atom_value_for_float! {
    f32 => "a float32",
    f64 => "a float64",
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Uint(value),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl From<ParameterSet> for Value {
    fn from(value: ParameterSet) -> Self {
        Value::Table(value)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Nil => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Uint(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Table(pset) => {
                let mut map = serializer.serialize_map(Some(pset.len()))?;
                for (name, value) in pset.iter() {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}
