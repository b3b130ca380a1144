//! `smallest_int_descriptor`: the narrowest BCF integer width able to
//! encode a set of integers (spec §4.C).
//!
//! Grounded on `bio::io::var::detail::smallest_int_desc` in
//! `original_source/include/bio/io/var/misc.hpp`: a value equal to that
//! width's missing sentinel always fits in `int8`, since the sentinel
//! pattern is reserved identically at every width.

use crate::sentinel::Sentinel;
use crate::type_id::TypeId;

/// Narrowest integer [`TypeId`] (`Int8`/`Int16`/`Int32`) that can hold every
/// value in `values` without losing precision.
///
/// A value equal to `i32::MISSING` or `i32::END_OF_VECTOR` (the canonical
/// sentinels, carried at `i32` width regardless of the *target* width
/// until the final narrowing step) is always considered to fit in `Int8`,
/// matching [`crate::Value::convert_int`]'s own special-casing of both
/// sentinels regardless of magnitude. A value that merely happens to
/// collide with a *narrower* width's own end-of-vector pattern once
/// narrowed (`-127` for `Int8`, `-32767` for `Int16`) is not itself a
/// sentinel at `i32` width, so it does not fit that narrower width even
/// though its magnitude is in range: writing it there would make it
/// indistinguishable from padding on the next read, so it forces widening
/// to the next integer width, mirroring the usable range
/// [`crate::Value::convert_int`] itself enforces.
///
/// Returns `Int32` for an empty iterator (there is nothing to narrow).
#[must_use]
pub fn smallest_int_descriptor(values: impl IntoIterator<Item = i32>) -> TypeId {
    let mut needs_16 = false;
    let mut needs_32 = false;

    const I8_RANGE: std::ops::RangeInclusive<i64> = (i8::MIN as i64 + 2)..=(i8::MAX as i64);
    const I16_RANGE: std::ops::RangeInclusive<i64> = (i16::MIN as i64 + 2)..=(i16::MAX as i64);

    for v in values {
        if v == i32::MISSING || v == i32::END_OF_VECTOR {
            continue;
        }
        let n = i64::from(v);
        if !I16_RANGE.contains(&n) {
            needs_32 = true;
            break;
        } else if !I8_RANGE.contains(&n) {
            needs_16 = true;
        }
    }

    if needs_32 {
        TypeId::Int32
    } else if needs_16 {
        TypeId::Int16
    } else {
        TypeId::Int8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_small_values_fit_int8() {
        assert_eq!(smallest_int_descriptor([1, 2, -3, 100]), TypeId::Int8);
    }

    #[test]
    fn one_large_value_forces_int16() {
        assert_eq!(smallest_int_descriptor([1, 2, 1000]), TypeId::Int16);
    }

    #[test]
    fn one_huge_value_forces_int32() {
        assert_eq!(smallest_int_descriptor([1, 70_000]), TypeId::Int32);
    }

    #[test]
    fn missing_sentinel_does_not_force_widening() {
        assert_eq!(
            smallest_int_descriptor([1, 2, i32::MISSING]),
            TypeId::Int8
        );
    }

    #[test]
    fn end_of_vector_sentinel_does_not_force_widening() {
        // i32::END_OF_VECTOR (i32::MIN + 1) is a huge negative number by
        // magnitude, but convert_int special-cases it losslessly at every
        // width, so it must not push the descriptor to Int32.
        assert_eq!(
            smallest_int_descriptor([1, 2, i32::END_OF_VECTOR]),
            TypeId::Int8
        );
    }

    #[test]
    fn empty_defaults_to_int32() {
        assert_eq!(smallest_int_descriptor([]), TypeId::Int32);
    }

    #[test]
    fn value_colliding_with_int8_end_of_vector_is_widened() {
        // -127 is in [i8::MIN, i8::MAX] by magnitude but is Int8's reserved
        // end-of-vector sentinel, not a usable value; it must force Int16
        // so the wire narrowing step (which rejects -127 for Int8) never
        // sees a width it can't actually use.
        assert_eq!(smallest_int_descriptor([1, -127]), TypeId::Int16);
    }

    #[test]
    fn value_colliding_with_int16_end_of_vector_is_widened() {
        assert_eq!(smallest_int_descriptor([1, -32_767]), TypeId::Int32);
    }
}
