//! Low-level BCF typed-value primitives: the `(length<<4)|type_code`
//! descriptor byte, and int/float/string array encode/decode (spec §4.E
//! "BCF").

use std::io::{Read, Write};

use bio_value::{Sentinel, Value};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Location, Result};

const BT_NULL: u8 = 0;
const BT_INT8: u8 = 1;
const BT_INT16: u8 = 2;
const BT_INT32: u8 = 3;
const BT_FLOAT: u8 = 5;
const BT_CHAR: u8 = 7;

/// Write one `(length<<4)|type_code` descriptor; if `length >= 15`, the
/// nibble is set to `15` and the true length follows as a typed scalar
/// int (spec §4.E "typed-array-descriptor").
fn write_descriptor<W: Write>(w: &mut W, length: usize, type_code: u8) -> Result<()> {
    if length < 15 {
        w.write_u8(((length as u8) << 4) | type_code)?;
    } else {
        w.write_u8((15 << 4) | type_code)?;
        write_typed_int(w, length as i64)?;
    }
    Ok(())
}

fn read_descriptor<R: Read>(r: &mut R) -> Result<(usize, u8)> {
    let byte = r.read_u8()?;
    let type_code = byte & 0x0F;
    let raw_len = (byte >> 4) as usize;
    let length = if raw_len == 15 {
        read_typed_int(r)? as usize
    } else {
        raw_len
    };
    Ok((length, type_code))
}

fn narrowest_scalar_type(v: i64) -> u8 {
    if v == i64::from(i32::MIN) || v == i64::from(i32::MIN) + 1 {
        return BT_INT8; // sentinels always fit the narrowest width
    }
    if (i64::from(i8::MIN + 2)..=i64::from(i8::MAX)).contains(&v) {
        BT_INT8
    } else if (i64::from(i16::MIN + 2)..=i64::from(i16::MAX)).contains(&v) {
        BT_INT16
    } else {
        BT_INT32
    }
}

/// Write a scalar typed integer (used for key/filter indices and the
/// "length follows" escape).
pub fn write_typed_int<W: Write>(w: &mut W, v: i64) -> Result<()> {
    let type_code = narrowest_scalar_type(v);
    w.write_u8((1 << 4) | type_code)?;
    write_int_payload(w, &[v as i32], type_code)
}

/// Read a scalar typed integer.
pub fn read_typed_int<R: Read>(r: &mut R) -> Result<i64> {
    let (len, type_code) = read_descriptor(r)?;
    if len != 1 {
        return Err(Error::Format {
            location: Location::ByteOffset(0),
            message: format!("expected scalar typed int, got length {len}"),
        });
    }
    Ok(i64::from(read_int_payload(r, type_code)?[0]))
}

fn write_int_payload<W: Write>(w: &mut W, values: &[i32], type_code: u8) -> Result<()> {
    for &v in values {
        match type_code {
            BT_INT8 => w.write_i8(v as i8)?,
            BT_INT16 => w.write_i16::<LittleEndian>(v as i16)?,
            BT_INT32 => w.write_i32::<LittleEndian>(v)?,
            _ => {
                return Err(Error::Format {
                    location: Location::ByteOffset(0),
                    message: format!("not an integer type code: {type_code}"),
                })
            }
        }
    }
    Ok(())
}

/// Read one value of `type_code`'s width; callers loop this for arrays.
fn read_int_payload<R: Read>(r: &mut R, type_code: u8) -> Result<Vec<i32>> {
    Ok(vec![match type_code {
        BT_INT8 => i32::from(r.read_i8()?),
        BT_INT16 => i32::from(r.read_i16::<LittleEndian>()?),
        BT_INT32 => r.read_i32::<LittleEndian>()?,
        _ => {
            return Err(Error::Format {
                location: Location::ByteOffset(0),
                message: format!("not an integer type code: {type_code}"),
            })
        }
    }])
}

/// Write a typed integer array, choosing the narrowest width that fits
/// every value (spec §4.C `smallest_int_descriptor`) while preserving
/// sentinel identity.
pub fn write_int_array<W: Write>(w: &mut W, values: &[i32]) -> Result<()> {
    if values.is_empty() {
        write_descriptor(w, 0, BT_NULL)?;
        return Ok(());
    }
    let type_id = bio_value::smallest_int_descriptor(values.iter().copied());
    let type_code = match type_id {
        bio_value::TypeId::Int8 => BT_INT8,
        bio_value::TypeId::Int16 => BT_INT16,
        _ => BT_INT32,
    };
    write_descriptor(w, values.len(), type_code)?;
    for &v in values {
        let narrowed = narrow_one(v, type_code)?;
        write_int_payload(w, &[narrowed], type_code)?;
    }
    Ok(())
}

fn narrow_one(v: i32, type_code: u8) -> Result<i32> {
    let value = Value::Int32(v);
    let target = match type_code {
        BT_INT8 => bio_value::TypeId::Int8,
        BT_INT16 => bio_value::TypeId::Int16,
        _ => bio_value::TypeId::Int32,
    };
    match value.convert_int(target)? {
        Value::Int8(n) => Ok(i32::from(n)),
        Value::Int16(n) => Ok(i32::from(n)),
        Value::Int32(n) => Ok(n),
        _ => unreachable!(),
    }
}

/// Read a typed integer array, widening every element back to `i32`
/// (sentinels are preserved by the shared [`bio_value`] conversion rules).
pub fn read_int_array<R: Read>(r: &mut R) -> Result<Vec<i32>> {
    let (len, type_code) = read_descriptor(r)?;
    if type_code == BT_NULL || len == 0 {
        return Ok(Vec::new());
    }
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        let raw = read_int_payload(r, type_code)?[0];
        let widened = match type_code {
            BT_INT8 => Value::Int8(raw as i8).convert_int(bio_value::TypeId::Int32)?,
            BT_INT16 => Value::Int16(raw as i16).convert_int(bio_value::TypeId::Int32)?,
            _ => Value::Int32(raw),
        };
        let Value::Int32(v) = widened else { unreachable!() };
        out.push(v);
    }
    Ok(out)
}

/// Write a typed float array.
pub fn write_float_array<W: Write>(w: &mut W, values: &[f32]) -> Result<()> {
    write_descriptor(w, values.len(), BT_FLOAT)?;
    for &v in values {
        w.write_f32::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Read a typed float array.
pub fn read_float_array<R: Read>(r: &mut R) -> Result<Vec<f32>> {
    let (len, type_code) = read_descriptor(r)?;
    if type_code == BT_NULL || len == 0 {
        return Ok(Vec::new());
    }
    if type_code != BT_FLOAT {
        return Err(Error::Format {
            location: Location::ByteOffset(0),
            message: format!("expected float type code, got {type_code}"),
        });
    }
    (0..len).map(|_| Ok(r.read_f32::<LittleEndian>()?)).collect()
}

/// Write a typed string (a byte array tagged [`BT_CHAR`]).
pub fn write_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    write_descriptor(w, s.len(), BT_CHAR)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/// Write a string padded with trailing NULs to `width` bytes — the
/// convention BCF uses for per-sample FORMAT strings so every sample's
/// entry occupies the same width (spec §4.E "indiv").
pub fn write_string_padded<W: Write>(w: &mut W, s: &str, width: usize) -> Result<()> {
    let bytes = s.as_bytes();
    w.write_all(&bytes[..bytes.len().min(width)])?;
    for _ in bytes.len()..width {
        w.write_u8(0)?;
    }
    Ok(())
}

/// Write one descriptor-plus-payload character array holding every
/// sample's string NUL-padded to a common `width`, the layout BCF uses for
/// a `Type=String`/`Type=Character` FORMAT field (spec §4.E "indiv").
pub fn write_char_array<W: Write>(w: &mut W, width: usize, samples: &[String]) -> Result<()> {
    write_descriptor(w, width * samples.len(), BT_CHAR)?;
    for s in samples {
        write_string_padded(w, s, width)?;
    }
    Ok(())
}

/// Write a self-describing [`Value`] the way a BCF INFO entry stores it:
/// the wire picks the narrowest int width and collapses a flag to a
/// zero-length `NULL` array (spec §4.E "shared").
pub fn write_typed_value<W: Write>(w: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Flag => write_descriptor(w, 0, BT_NULL),
        Value::Int8(v) => write_int_array(w, &[i32::from(*v)]),
        Value::Int16(v) => write_int_array(w, &[i32::from(*v)]),
        Value::Int32(v) => write_int_array(w, &[*v]),
        Value::Float32(v) => write_float_array(w, &[*v]),
        Value::Char(c) => write_string(w, &c.to_string()),
        Value::String(s) => write_string(w, s),
        Value::VectorInt8(v) => write_int_array(w, &widen_narrow_vec_i8(v)?),
        Value::VectorInt16(v) => write_int_array(w, &widen_narrow_vec_i16(v)?),
        Value::VectorInt32(v) => write_int_array(w, v),
        Value::VectorFloat32(v) => write_float_array(w, v),
        Value::VectorString(v) => write_string(w, &v.join(",")),
    }
}

fn widen_narrow_vec_i8(values: &[i8]) -> Result<Vec<i32>> {
    values
        .iter()
        .map(|&v| match Value::Int8(v).convert_int(bio_value::TypeId::Int32)? {
            Value::Int32(w) => Ok(w),
            _ => unreachable!(),
        })
        .collect()
}

fn widen_narrow_vec_i16(values: &[i16]) -> Result<Vec<i32>> {
    values
        .iter()
        .map(|&v| match Value::Int16(v).convert_int(bio_value::TypeId::Int32)? {
            Value::Int32(w) => Ok(w),
            _ => unreachable!(),
        })
        .collect()
}

/// Read a typed string.
pub fn read_string<R: Read>(r: &mut R) -> Result<String> {
    let (len, type_code) = read_descriptor(r)?;
    if type_code == BT_NULL || len == 0 {
        return Ok(String::new());
    }
    if type_code != BT_CHAR {
        return Err(Error::Format {
            location: Location::ByteOffset(0),
            message: format!("expected char type code, got {type_code}"),
        });
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// A value read off the wire before it has been reconciled with the
/// header's declared `(Number, Type)` for its key — the generic decode
/// step used for INFO/FORMAT values, whose representation (scalar vs.
/// vector `Value`) depends on the header, not just the wire bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Ints(Vec<i32>),
    Floats(Vec<f32>),
    Str(String),
}

/// Read one self-describing typed value (the wire's own descriptor byte
/// names its type and length; the caller later reconciles scalar-vs-vector
/// against the header).
pub fn read_typed_value<R: Read>(r: &mut R) -> Result<WireValue> {
    let (len, type_code) = read_descriptor(r)?;
    match type_code {
        BT_NULL => Ok(WireValue::Ints(Vec::new())),
        BT_INT8 | BT_INT16 | BT_INT32 => {
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                let raw = read_int_payload(r, type_code)?[0];
                out.push(widen_i32(raw, type_code)?);
            }
            Ok(WireValue::Ints(out))
        }
        BT_FLOAT => {
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                out.push(r.read_f32::<LittleEndian>()?);
            }
            Ok(WireValue::Floats(out))
        }
        BT_CHAR => {
            let mut buf = vec![0u8; len];
            r.read_exact(&mut buf)?;
            let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            Ok(WireValue::Str(String::from_utf8_lossy(&buf[..end]).into_owned()))
        }
        other => Err(Error::Format {
            location: Location::ByteOffset(0),
            message: format!("unknown BCF type code {other}"),
        }),
    }
}

fn widen_i32(raw: i32, type_code: u8) -> Result<i32> {
    let widened = match type_code {
        BT_INT8 => Value::Int8(raw as i8).convert_int(bio_value::TypeId::Int32)?,
        BT_INT16 => Value::Int16(raw as i16).convert_int(bio_value::TypeId::Int32)?,
        _ => Value::Int32(raw),
    };
    let Value::Int32(v) = widened else { unreachable!() };
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn typed_int_round_trips_each_width() {
        for v in [0i64, 100, 1000, 100_000] {
            let mut buf = Vec::new();
            write_typed_int(&mut buf, v).unwrap();
            let back = read_typed_int(&mut Cursor::new(buf)).unwrap();
            assert_eq!(back, v);
        }
    }

    #[test]
    fn int_array_chooses_narrowest_width_and_preserves_sentinels() {
        let values = vec![1, 2, i32::MISSING, i32::END_OF_VECTOR];
        let mut buf = Vec::new();
        write_int_array(&mut buf, &values).unwrap();
        assert_eq!(buf[0] & 0x0F, BT_INT8); // all values fit int8
        let back = read_int_array(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn int_array_widens_type_for_large_values() {
        let values = vec![1, 70_000];
        let mut buf = Vec::new();
        write_int_array(&mut buf, &values).unwrap();
        assert_eq!(buf[0] & 0x0F, BT_INT32);
        let back = read_int_array(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn empty_int_array_round_trips() {
        let mut buf = Vec::new();
        write_int_array(&mut buf, &[]).unwrap();
        let back = read_int_array(&mut Cursor::new(buf)).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn string_round_trips() {
        let mut buf = Vec::new();
        write_string(&mut buf, "ACGT").unwrap();
        let back = read_string(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, "ACGT");
    }

    #[test]
    fn padded_string_trims_at_first_nul_on_read() {
        let mut buf = Vec::new();
        write_descriptor(&mut buf, 8, BT_CHAR).unwrap();
        write_string_padded(&mut buf, "GT", 8).unwrap();
        let back = read_string(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, "GT");
    }

    #[test]
    fn float_array_round_trips() {
        let values = vec![0.5f32, 0.25, f32::MISSING];
        let mut buf = Vec::new();
        write_float_array(&mut buf, &values).unwrap();
        let back = read_float_array(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[0], 0.5);
        assert!(back[2].is_missing());
    }
}
