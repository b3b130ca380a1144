//! The dynamic-typed [`Value`] union for INFO/FORMAT fields (spec §3, §4.C).

use crate::error::{Error, Result};
use crate::sentinel::Sentinel;
use crate::type_id::TypeId;

/// A dynamically-typed INFO/FORMAT value.
///
/// Twelve variants, tagged by [`TypeId`]. Integer variants are mutually
/// compatibility-convertible (any int-N slot promotes into any int-M slot
/// provided the values fit); the rest only convert to themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single character.
    Char(char),
    /// An 8-bit integer.
    Int8(i8),
    /// A 16-bit integer.
    Int16(i16),
    /// A 32-bit integer.
    Int32(i32),
    /// A 32-bit float.
    Float32(f32),
    /// A string.
    String(String),
    /// A vector of 8-bit integers.
    VectorInt8(Vec<i8>),
    /// A vector of 16-bit integers.
    VectorInt16(Vec<i16>),
    /// A vector of 32-bit integers.
    VectorInt32(Vec<i32>),
    /// A vector of 32-bit floats.
    VectorFloat32(Vec<f32>),
    /// A vector of strings.
    VectorString(Vec<String>),
    /// A presence-only flag; legal only for `Number=0` INFO fields.
    Flag,
}

impl Value {
    /// Initialize the default (missing, for scalars; empty, for vectors)
    /// value for a given [`TypeId`].
    ///
    /// Fails with [`Error::FlagCannotBeVector`] if `type_id` names a vector
    /// — flags are never legal as vectors (spec §4.C).
    pub fn construct_default(type_id: TypeId) -> Result<Self> {
        Ok(match type_id {
            TypeId::Char => Value::Char(char::MISSING),
            TypeId::Int8 => Value::Int8(i8::MISSING),
            TypeId::Int16 => Value::Int16(i16::MISSING),
            TypeId::Int32 => Value::Int32(i32::MISSING),
            TypeId::Float32 => Value::Float32(f32::MISSING),
            TypeId::String => Value::String(String::new()),
            TypeId::VectorInt8 => Value::VectorInt8(Vec::new()),
            TypeId::VectorInt16 => Value::VectorInt16(Vec::new()),
            TypeId::VectorInt32 => Value::VectorInt32(Vec::new()),
            TypeId::VectorFloat32 => Value::VectorFloat32(Vec::new()),
            TypeId::VectorString => Value::VectorString(Vec::new()),
            TypeId::Flag => Value::Flag,
        })
    }

    /// The [`TypeId`] tag of the currently-held variant.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        match self {
            Value::Char(_) => TypeId::Char,
            Value::Int8(_) => TypeId::Int8,
            Value::Int16(_) => TypeId::Int16,
            Value::Int32(_) => TypeId::Int32,
            Value::Float32(_) => TypeId::Float32,
            Value::String(_) => TypeId::String,
            Value::VectorInt8(_) => TypeId::VectorInt8,
            Value::VectorInt16(_) => TypeId::VectorInt16,
            Value::VectorInt32(_) => TypeId::VectorInt32,
            Value::VectorFloat32(_) => TypeId::VectorFloat32,
            Value::VectorString(_) => TypeId::VectorString,
            Value::Flag => TypeId::Flag,
        }
    }

    /// Invoke `f` with a reference to the currently-held variant.
    ///
    /// This is the `visit` operation from spec §4.C, used by the VCF/BCF
    /// writers to dispatch serialization without matching on every variant
    /// themselves.
    pub fn visit<R>(&self, mut f: impl FnMut(&Value) -> R) -> R {
        f(self)
    }

    /// Whether this value is the missing sentinel for its type.
    ///
    /// Vectors and [`Value::Flag`] are never "missing" in this sense — an
    /// empty vector renders as `.` on write but is a distinct state from a
    /// scalar missing sentinel.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Char(c) => c.is_missing(),
            Value::Int8(v) => v.is_missing(),
            Value::Int16(v) => v.is_missing(),
            Value::Int32(v) => v.is_missing(),
            Value::Float32(v) => v.is_missing(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Widen or narrow an integer scalar/vector value to `target`.
    ///
    /// Returns [`Error::IncompatibleTypes`] if `target` is not compatible
    /// with `self.type_id()` per [`crate::type_id_is_compatible`].
    /// Narrowing a value that does not fit in the target width returns
    /// [`Error::IntegerOutOfRange`]; sentinels (missing, end-of-vector)
    /// always convert losslessly regardless of width.
    pub fn convert_int(&self, target: TypeId) -> Result<Value> {
        if !crate::type_id::type_id_is_compatible(self.type_id(), target) {
            return Err(Error::IncompatibleTypes {
                from: self.type_id(),
                to: target,
            });
        }
        match self {
            Value::Int8(_) | Value::Int16(_) | Value::Int32(_) => {
                let n = self.as_i64_scalar();
                convert_int_scalar_raw(n, target)
            }
            Value::VectorInt8(_) | Value::VectorInt16(_) | Value::VectorInt32(_) => {
                let v = self.as_i64_vector();
                let converted: Result<Vec<_>> = v
                    .into_iter()
                    .map(|n| convert_int_scalar_raw(n, target))
                    .collect();
                let converted = converted?;
                Ok(pack_int_vector(converted, target))
            }
            _ => unreachable!("type_id_is_compatible guarantees an int scalar/vector"),
        }
    }

    fn as_i64_scalar(&self) -> i64 {
        match self {
            Value::Int8(v) => widen_i8(*v),
            Value::Int16(v) => widen_i16(*v),
            Value::Int32(v) => i64::from(*v),
            _ => unreachable!(),
        }
    }

    fn as_i64_vector(&self) -> Vec<i64> {
        match self {
            Value::VectorInt8(v) => v.iter().map(|x| widen_i8(*x)).collect(),
            Value::VectorInt16(v) => v.iter().map(|x| widen_i16(*x)).collect(),
            Value::VectorInt32(v) => v.iter().map(|x| i64::from(*x)).collect(),
            _ => unreachable!(),
        }
    }
}

/// Widen an `i8`, preserving sentinel identity (missing stays missing, eov
/// stays eov) rather than doing a naive numeric sign-extension comparison.
fn widen_i8(v: i8) -> i64 {
    if v.is_missing() {
        i64::from(i32::MIN)
    } else if v.is_end_of_vector() {
        i64::from(i32::MIN) + 1
    } else {
        i64::from(v)
    }
}

fn widen_i16(v: i16) -> i64 {
    if v.is_missing() {
        i64::from(i32::MIN)
    } else if v.is_end_of_vector() {
        i64::from(i32::MIN) + 1
    } else {
        i64::from(v)
    }
}

/// Shared narrowing core for both scalars and vector elements. `n` is a
/// "canonical" i64 where sentinels have already been normalized to
/// `i32::MIN`/`i32::MIN + 1` by the caller.
fn convert_int_scalar_raw(n: i64, target: TypeId) -> Result<Value> {
    let is_missing = n == i64::from(i32::MIN);
    let is_eov = n == i64::from(i32::MIN) + 1;
    match target {
        TypeId::Int8 | TypeId::VectorInt8 => {
            if is_missing {
                Ok(Value::Int8(i8::MISSING))
            } else if is_eov {
                Ok(Value::Int8(i8::END_OF_VECTOR))
            } else if (i64::from(i8::MIN + 2)..=i64::from(i8::MAX)).contains(&n) {
                Ok(Value::Int8(n as i8))
            } else {
                Err(Error::IntegerOutOfRange(n))
            }
        }
        TypeId::Int16 | TypeId::VectorInt16 => {
            if is_missing {
                Ok(Value::Int16(i16::MISSING))
            } else if is_eov {
                Ok(Value::Int16(i16::END_OF_VECTOR))
            } else if (i64::from(i16::MIN + 2)..=i64::from(i16::MAX)).contains(&n) {
                Ok(Value::Int16(n as i16))
            } else {
                Err(Error::IntegerOutOfRange(n))
            }
        }
        TypeId::Int32 | TypeId::VectorInt32 => {
            if is_missing {
                Ok(Value::Int32(i32::MISSING))
            } else if is_eov {
                Ok(Value::Int32(i32::END_OF_VECTOR))
            } else if (i64::from(i32::MIN) + 2..=i64::from(i32::MAX)).contains(&n) {
                Ok(Value::Int32(n as i32))
            } else {
                Err(Error::IntegerOutOfRange(n))
            }
        }
        _ => unreachable!("caller restricts target to int scalar/vector ids"),
    }
}

fn pack_int_vector(values: Vec<Value>, target: TypeId) -> Value {
    match target {
        TypeId::VectorInt8 | TypeId::Int8 => Value::VectorInt8(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Int8(x) => x,
                    _ => unreachable!(),
                })
                .collect(),
        ),
        TypeId::VectorInt16 | TypeId::Int16 => Value::VectorInt16(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Int16(x) => x,
                    _ => unreachable!(),
                })
                .collect(),
        ),
        TypeId::VectorInt32 | TypeId::Int32 => Value::VectorInt32(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Int32(x) => x,
                    _ => unreachable!(),
                })
                .collect(),
        ),
        _ => unreachable!(),
    }
}
