//! BCF binary record reader (spec §4.E "BCF", §6).

use std::io::{Cursor, Read};

use bio_value::{Sentinel, TypeId, Value};
use byteorder::{LittleEndian, ReadBytesExt};

use crate::bcf::wire::{self, WireValue};
use crate::error::{Error, Location, Result};
use crate::genotype;
use crate::header::{FieldDescriptor, Header};
use crate::record::VcfRecord;

const MAGIC: &[u8; 5] = b"BCF\x02\x02";

/// Streaming reader over BCF binary records.
pub struct Reader<R> {
    inner: R,
}

impl<R: Read> Reader<R> {
    /// Read the `BCF\x02\x02` magic and length-prefixed header text,
    /// returning the reader positioned at the first record plus the
    /// parsed [`Header`].
    pub fn new(mut inner: R) -> Result<(Self, Header)> {
        let mut magic = [0u8; 5];
        inner.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::Format {
                location: Location::ByteOffset(0),
                message: "missing BCF\\x02\\x02 magic".to_string(),
            });
        }
        let l_text = inner.read_u32::<LittleEndian>()?;
        let mut text = vec![0u8; l_text as usize];
        inner.read_exact(&mut text)?;
        let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
        let header = Header::parse(Cursor::new(&text[..end]))?;
        Ok((Self { inner }, header))
    }

    /// Read the next binary record, resolving every numeric id against
    /// `header`'s idx dictionaries. Unlike the VCF handler, a dangling idx
    /// here is a hard error (spec §7): a well-formed BCF file's header
    /// dictionaries are always complete, so a miss means the two are out
    /// of sync, not a text file someone hand-edited.
    ///
    /// Returns `Ok(None)` at a clean EOF (no bytes remain before the next
    /// record's length prefix).
    pub fn read_record(&mut self, header: &mut Header) -> Result<Option<VcfRecord>> {
        let mut lens = [0u8; 8];
        if !try_read_exact(&mut self.inner, &mut lens)? {
            return Ok(None);
        }
        let l_shared = u32::from_le_bytes(lens[0..4].try_into().unwrap());
        let l_indiv = u32::from_le_bytes(lens[4..8].try_into().unwrap());

        let mut shared = vec![0u8; l_shared as usize];
        self.inner.read_exact(&mut shared)?;
        let mut indiv = vec![0u8; l_indiv as usize];
        self.inner.read_exact(&mut indiv)?;

        decode_record(&shared, &indiv, header).map(Some)
    }
}

fn try_read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0;
    while total < buf.len() {
        match r.read(&mut buf[total..])? {
            0 => {
                if total == 0 {
                    return Ok(false);
                }
                return Err(Error::UnexpectedEndOfInput {
                    location: Location::ByteOffset(total as u64),
                });
            }
            n => total += n,
        }
    }
    Ok(true)
}

fn decode_record(shared: &[u8], indiv: &[u8], header: &mut Header) -> Result<VcfRecord> {
    let mut sr = Cursor::new(shared);

    let chrom_idx = sr.read_i32::<LittleEndian>()?;
    let pos0 = sr.read_i32::<LittleEndian>()?;
    let rlen = sr.read_i32::<LittleEndian>()?;
    let qual = sr.read_f32::<LittleEndian>()?;
    let n_info_allele = sr.read_u32::<LittleEndian>()?;
    let n_allele = (n_info_allele >> 16) as usize;
    let n_info = (n_info_allele & 0xFFFF) as usize;
    let n_fmt_sample = sr.read_u32::<LittleEndian>()?;
    let n_fmt = (n_fmt_sample >> 24) as usize;
    let n_sample = (n_fmt_sample & 0x00FF_FFFF) as usize;

    let id_text = wire::read_string(&mut sr)?;
    let id = if id_text.is_empty() {
        Vec::new()
    } else {
        id_text.split(';').map(str::to_string).collect()
    };

    let mut alleles = Vec::with_capacity(n_allele);
    for _ in 0..n_allele {
        alleles.push(wire::read_string(&mut sr)?);
    }
    let reference = alleles.first().cloned().unwrap_or_default();
    let alt = alleles.get(1..).map(<[String]>::to_vec).unwrap_or_default();

    let filter_idx = wire::read_int_array(&mut sr)?;
    let mut filter = Vec::with_capacity(filter_idx.len());
    for idx in filter_idx {
        let descriptor = header
            .filter_by_idx(idx as u32)
            .ok_or_else(|| Error::UnknownFilter(idx.to_string()))?;
        filter.push(descriptor.id.clone());
    }

    let mut info = Vec::with_capacity(n_info);
    for _ in 0..n_info {
        let key_idx = wire::read_typed_int(&mut sr)? as u32;
        let descriptor = header
            .info_by_idx(key_idx)
            .cloned()
            .ok_or_else(|| Error::UnknownInfo(key_idx.to_string()))?;
        let value = decode_info_value(&mut sr, Some(&descriptor))?;
        info.push((descriptor.id, value));
    }

    let chrom = header
        .contig_by_idx(chrom_idx as u32)
        .ok_or_else(|| Error::UnknownContig(chrom_idx.to_string()))?
        .id
        .clone();

    let mut ir = Cursor::new(indiv);
    let mut format_keys = Vec::with_capacity(n_fmt);
    let mut genotypes = Vec::with_capacity(n_fmt);
    for _ in 0..n_fmt {
        let key_idx = wire::read_typed_int(&mut ir)? as u32;
        let descriptor = header
            .format_by_idx(key_idx)
            .cloned()
            .ok_or_else(|| Error::UnknownInfo(key_idx.to_string()))?;
        let values = decode_format_values(&mut ir, &descriptor.id, Some(&descriptor), n_sample)?;
        format_keys.push(descriptor.id.clone());
        genotypes.push((descriptor.id, values));
    }

    Ok(VcfRecord {
        chrom,
        pos: u64::from(pos0) + 1,
        rlen: rlen.max(0) as u64,
        id,
        reference,
        alt,
        qual,
        filter,
        info,
        format_keys,
        genotypes,
    })
}

fn decode_info_value(r: &mut Cursor<&[u8]>, descriptor: Option<&FieldDescriptor>) -> Result<Value> {
    let wire_value = wire::read_typed_value(r)?;
    Ok(match wire_value {
        WireValue::Ints(ints) if ints.is_empty() => Value::Flag,
        WireValue::Ints(ints) => to_int_value(&ints, descriptor),
        WireValue::Floats(floats) => to_float_value(&floats, descriptor),
        WireValue::Str(s) => to_string_value(&s, descriptor),
    })
}

fn to_int_value(ints: &[i32], descriptor: Option<&FieldDescriptor>) -> Value {
    let vector = descriptor.is_none_or(|d| d.number.is_vector()) || ints.len() != 1;
    if vector {
        Value::VectorInt32(ints.to_vec())
    } else {
        Value::Int32(ints[0])
    }
}

fn to_float_value(floats: &[f32], descriptor: Option<&FieldDescriptor>) -> Value {
    let vector = descriptor.is_none_or(|d| d.number.is_vector()) || floats.len() != 1;
    if vector {
        Value::VectorFloat32(floats.to_vec())
    } else {
        Value::Float32(floats[0])
    }
}

fn to_string_value(s: &str, descriptor: Option<&FieldDescriptor>) -> Value {
    match descriptor.map(FieldDescriptor::value_type_id) {
        Some(TypeId::Char) => Value::Char(s.chars().next().unwrap_or('\u{7}')),
        Some(TypeId::VectorString) => {
            Value::VectorString(s.split(',').map(str::to_string).collect())
        }
        _ => Value::String(s.to_string()),
    }
}

/// Decode one FORMAT field's per-sample values. `GT` is special-cased into
/// the per-allele integer encoding (spec §4.E, §8 testable property 4);
/// every other key is decoded generically against the header's declared
/// type.
fn decode_format_values(
    r: &mut Cursor<&[u8]>,
    key: &str,
    descriptor: Option<&FieldDescriptor>,
    n_sample: usize,
) -> Result<Vec<Value>> {
    let wire_value = wire::read_typed_value(r)?;
    match wire_value {
        WireValue::Ints(flat) => {
            if n_sample == 0 {
                return Ok(Vec::new());
            }
            let per_sample_len = flat.len() / n_sample.max(1);
            let mut out = Vec::with_capacity(n_sample);
            for sample_idx in 0..n_sample {
                let slice = &flat[sample_idx * per_sample_len..(sample_idx + 1) * per_sample_len];
                let trimmed = trim_trailing_eov(slice);
                if key == "GT" {
                    let alleles = genotype::decode(trimmed)?;
                    out.push(Value::String(genotype::render(&alleles)));
                } else {
                    out.push(to_int_value(trimmed, descriptor));
                }
            }
            Ok(out)
        }
        WireValue::Floats(flat) => {
            let per_sample_len = (flat.len() / n_sample.max(1)).max(1);
            Ok((0..n_sample)
                .map(|sample_idx| {
                    let slice = &flat[sample_idx * per_sample_len..((sample_idx + 1) * per_sample_len).min(flat.len())];
                    to_float_value(trim_trailing_eov_f32(slice), descriptor)
                })
                .collect())
        }
        WireValue::Str(s) => {
            let per_sample_len = (s.len() / n_sample.max(1)).max(1);
            let bytes = s.as_bytes();
            Ok((0..n_sample)
                .map(|sample_idx| {
                    let start = (sample_idx * per_sample_len).min(bytes.len());
                    let end = ((sample_idx + 1) * per_sample_len).min(bytes.len());
                    let text = String::from_utf8_lossy(&bytes[start..end]).into_owned();
                    to_string_value(&text, descriptor)
                })
                .collect())
        }
    }
}

fn trim_trailing_eov(values: &[i32]) -> &[i32] {
    let mut end = values.len();
    while end > 1 && values[end - 1] == i32::END_OF_VECTOR {
        end -= 1;
    }
    &values[..end]
}

fn trim_trailing_eov_f32(values: &[f32]) -> &[f32] {
    let mut end = values.len();
    while end > 1 && values[end - 1].is_end_of_vector() {
        end -= 1;
    }
    &values[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn minimal_header_text() -> Vec<u8> {
        let mut text = b"##fileformat=VCFv4.3\n\
            ##FILTER=<ID=PASS,Description=\"All filters passed\">\n\
            ##contig=<ID=20,length=1000>\n\
            #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n"
            .to_vec();
        text.push(0);
        text
    }

    fn bcf_bytes_with_header() -> Vec<u8> {
        let text = minimal_header_text();
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.write_u32::<LittleEndian>(text.len() as u32).unwrap();
        buf.extend_from_slice(&text);
        buf
    }

    #[test]
    fn rejects_wrong_magic() {
        let err = Reader::new(Cursor::new(b"not-a-bcf-file".to_vec())).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn header_only_file_reads_back_zero_records() {
        let buf = bcf_bytes_with_header();
        let (mut reader, mut header) = Reader::new(Cursor::new(buf)).unwrap();
        assert!(header.contig_by_id("20").is_some());
        assert!(reader.read_record(&mut header).unwrap().is_none());
    }

    #[test]
    fn dangling_contig_idx_is_an_error_not_a_warning() {
        let mut buf = bcf_bytes_with_header();
        let mut shared = Vec::new();
        shared.write_i32::<LittleEndian>(99).unwrap(); // no such contig idx
        shared.write_i32::<LittleEndian>(0).unwrap();
        shared.write_i32::<LittleEndian>(1).unwrap();
        shared.write_f32::<LittleEndian>(f32::MISSING).unwrap();
        shared.write_u32::<LittleEndian>(1 << 16).unwrap(); // 1 allele, 0 info
        shared.write_u32::<LittleEndian>(0).unwrap(); // 0 fmt, 0 samples
        wire::write_string(&mut shared, "").unwrap();
        wire::write_string(&mut shared, "A").unwrap();
        wire::write_int_array(&mut shared, &[]).unwrap();

        buf.write_u32::<LittleEndian>(shared.len() as u32).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.extend_from_slice(&shared);

        let (mut reader, mut header) = Reader::new(Cursor::new(buf)).unwrap();
        let err = reader.read_record(&mut header).unwrap_err();
        assert!(matches!(err, Error::UnknownContig(_)));
    }
}
