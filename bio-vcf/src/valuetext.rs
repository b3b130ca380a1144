//! Text ↔ [`Value`] conversion shared by VCF INFO and FORMAT field parsing
//! and rendering (spec §4.E).

use bio_value::{Sentinel, TypeId, Value};

use crate::error::{Error, Location, Result};
use crate::header::{Number, VcfType};

/// Parse one INFO/FORMAT token (already key-stripped) into a [`Value`] of
/// the type implied by `(number, ty)`.
///
/// `Type=Character` with a vector `number` collapses to a single
/// [`Value::String`] rather than [`Value::VectorString`] — VCF uses that
/// combination for multi-character single tokens, not arrays (spec §4.C,
/// `VcfType::value_type_id`).
pub fn parse_value(text: &str, number: Number, ty: VcfType) -> Result<Value> {
    let vector = number.is_vector();
    Ok(match ty {
        VcfType::Flag => Value::Flag,
        VcfType::Character if !vector => {
            Value::Char(text.chars().next().unwrap_or(char::MISSING))
        }
        VcfType::Character => Value::String(text.to_string()),
        VcfType::String if vector => {
            Value::VectorString(text.split(',').map(str_token).collect())
        }
        VcfType::String => Value::String(text.to_string()),
        VcfType::Integer if vector => {
            let values: Result<Vec<i32>> = text.split(',').map(int_token).collect();
            Value::VectorInt32(values?)
        }
        VcfType::Integer => Value::Int32(int_token(text)?),
        VcfType::Float if vector => {
            let values: Result<Vec<f32>> = text.split(',').map(float_token).collect();
            Value::VectorFloat32(values?)
        }
        VcfType::Float => Value::Float32(float_token(text)?),
    })
}

fn str_token(s: &str) -> String {
    if s == "." { String::new() } else { s.to_string() }
}

fn int_token(s: &str) -> Result<i32> {
    if s == "." {
        return Ok(i32::MISSING);
    }
    s.parse().map_err(|_| Error::Parse {
        location: Location::Line(0),
        message: format!("not an integer: {s:?}"),
    })
}

fn float_token(s: &str) -> Result<f32> {
    if s == "." {
        return Ok(f32::MISSING);
    }
    s.parse().map_err(|_| Error::Parse {
        location: Location::Line(0),
        message: format!("not a float: {s:?}"),
    })
}

/// Render a [`Value`] back to VCF text. Missing scalars render as `.`;
/// empty vectors render as `.` (spec §4.E "VCF output handler").
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Flag => String::new(),
        Value::Char(c) => {
            if c.is_missing() {
                ".".to_string()
            } else {
                c.to_string()
            }
        }
        Value::Int8(v) => render_int(i64::from(*v), v.is_missing()),
        Value::Int16(v) => render_int(i64::from(*v), v.is_missing()),
        Value::Int32(v) => render_int(i64::from(*v), v.is_missing()),
        Value::Float32(v) => render_float(*v),
        Value::String(s) => {
            if s.is_empty() {
                ".".to_string()
            } else {
                s.clone()
            }
        }
        Value::VectorInt8(v) => render_int_vec(v.iter().map(|x| (i64::from(*x), x.is_missing()))),
        Value::VectorInt16(v) => render_int_vec(v.iter().map(|x| (i64::from(*x), x.is_missing()))),
        Value::VectorInt32(v) => render_int_vec(v.iter().map(|x| (i64::from(*x), x.is_missing()))),
        Value::VectorFloat32(v) => {
            if v.is_empty() {
                ".".to_string()
            } else {
                v.iter().map(|f| render_float(*f)).collect::<Vec<_>>().join(",")
            }
        }
        Value::VectorString(v) => {
            if v.is_empty() {
                ".".to_string()
            } else {
                v.iter()
                    .map(|s| if s.is_empty() { "." } else { s })
                    .collect::<Vec<_>>()
                    .join(",")
            }
        }
    }
}

fn render_int(v: i64, missing: bool) -> String {
    if missing { ".".to_string() } else { v.to_string() }
}

fn render_float(v: f32) -> String {
    if v.is_missing() {
        ".".to_string()
    } else {
        v.to_string()
    }
}

fn render_int_vec(vals: impl Iterator<Item = (i64, bool)>) -> String {
    let rendered: Vec<String> = vals.map(|(v, missing)| render_int(v, missing)).collect();
    if rendered.is_empty() {
        ".".to_string()
    } else {
        rendered.join(",")
    }
}

/// The [`TypeId`] a `(number, ty)` pair parses into — re-exported here so
/// callers assembling a default value for a never-seen key don't need to
/// depend on `bio_vcf::header` directly.
#[must_use]
pub fn value_type_id(number: Number, ty: VcfType) -> TypeId {
    ty.value_type_id(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalar_float_with_missing() {
        assert_eq!(parse_value(".", Number::Count(1), VcfType::Float).unwrap(), Value::Float32(f32::MISSING));
        assert_eq!(
            parse_value("0.5", Number::Count(1), VcfType::Float).unwrap(),
            Value::Float32(0.5)
        );
    }

    #[test]
    fn parses_vector_float() {
        let v = parse_value("0.5,0.25", Number::AltAlleles, VcfType::Float).unwrap();
        assert_eq!(v, Value::VectorFloat32(vec![0.5, 0.25]));
    }

    #[test]
    fn character_vector_collapses_to_string() {
        let v = parse_value("ab", Number::Count(2), VcfType::Character).unwrap();
        assert_eq!(v, Value::String("ab".to_string()));
    }

    #[test]
    fn render_round_trips_missing_float() {
        let v = Value::Float32(f32::MISSING);
        assert_eq!(render_value(&v), ".");
    }

    #[test]
    fn render_empty_vector_is_dot() {
        assert_eq!(render_value(&Value::VectorInt32(vec![])), ".");
    }
}
