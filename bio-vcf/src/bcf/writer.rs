//! BCF binary record writer, the mirror image of [`super::reader`] (spec
//! §4.E "BCF", §6).

use std::io::Write;

use bio_value::{Sentinel, Value};
use byteorder::{LittleEndian, WriteBytesExt};

use crate::bcf::wire;
use crate::error::{Error, Location, Result};
use crate::genotype;
use crate::header::Header;
use crate::record::VcfRecord;

const MAGIC: &[u8; 5] = b"BCF\x02\x02";

/// Options controlling header serialization (mirrors
/// [`crate::vcf::WriterOptions`] minus the line-ending choice, which has
/// no meaning for a binary format).
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    /// Emit `IDX=` on structured header lines so a BCF produced from a
    /// read BCF keeps its numeric ids meaningful across a write-then-read
    /// round trip (spec §3 "idx values ... stable across read-write-read
    /// round trips", §8 testable property 2).
    pub preserve_idx: bool,
}

/// Streaming BCF binary writer.
pub struct Writer<W> {
    inner: W,
    header_written: bool,
    options: WriterOptions,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W, options: WriterOptions) -> Self {
        Self {
            inner,
            header_written: false,
            options,
        }
    }

    /// Unwrap the underlying sink, e.g. to call its own `finish`/`flush`.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write the `BCF\x02\x02` magic and NUL-terminated header text, if
    /// not already written.
    pub fn write_header_only(&mut self, header: &Header) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        let mut text = Vec::new();
        header.write(&mut text, self.options.preserve_idx)?;
        text.push(0);

        self.inner.write_all(MAGIC)?;
        self.inner.write_u32::<LittleEndian>(text.len() as u32)?;
        self.inner.write_all(&text)?;
        self.header_written = true;
        Ok(())
    }

    /// Encode one record's shared and individual-genotype blocks and write
    /// them behind their `l_shared`/`l_indiv` length prefixes, writing the
    /// header first if this is the first call.
    pub fn write_record(&mut self, header: &Header, record: &VcfRecord) -> Result<()> {
        self.write_header_only(header)?;

        let shared = encode_shared(header, record)?;
        let indiv = encode_indiv(header, record)?;

        self.inner.write_u32::<LittleEndian>(shared.len() as u32)?;
        self.inner.write_u32::<LittleEndian>(indiv.len() as u32)?;
        self.inner.write_all(&shared)?;
        self.inner.write_all(&indiv)?;
        Ok(())
    }
}

fn encode_shared(header: &Header, record: &VcfRecord) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    let contig = header
        .contig_by_id(&record.chrom)
        .ok_or_else(|| Error::UnknownContig(record.chrom.clone()))?;
    out.write_i32::<LittleEndian>(contig.idx as i32)?;
    out.write_i32::<LittleEndian>(record.pos as i32 - 1)?;
    out.write_i32::<LittleEndian>(record.rlen as i32)?;
    out.write_f32::<LittleEndian>(record.qual)?;

    let n_allele = 1 + record.alt.len();
    let n_info = record.info.len();
    out.write_u32::<LittleEndian>(((n_allele as u32) << 16) | (n_info as u32 & 0xFFFF))?;

    let n_fmt = record.format_keys.len();
    let n_sample = record.sample_count();
    out.write_u32::<LittleEndian>(((n_fmt as u32) << 24) | (n_sample as u32 & 0x00FF_FFFF))?;

    wire::write_string(&mut out, &record.id.join(";"))?;

    wire::write_string(&mut out, &record.reference)?;
    for alt in &record.alt {
        wire::write_string(&mut out, alt)?;
    }

    let filter_idx: Result<Vec<i32>> = record
        .filter
        .iter()
        .map(|id| {
            header
                .filter_by_id(id)
                .map(|d| d.idx as i32)
                .ok_or_else(|| Error::UnknownFilter(id.clone()))
        })
        .collect();
    wire::write_int_array(&mut out, &filter_idx?)?;

    for (key, value) in &record.info {
        let descriptor = header
            .info_by_id(key)
            .ok_or_else(|| Error::UnknownInfo(key.clone()))?;
        wire::write_typed_int(&mut out, i64::from(descriptor.idx))?;
        wire::write_typed_value(&mut out, value)?;
    }

    Ok(out)
}

fn encode_indiv(header: &Header, record: &VcfRecord) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (key, values) in &record.genotypes {
        let descriptor = header
            .format_by_id(key)
            .ok_or_else(|| Error::UnknownInfo(key.clone()))?;
        wire::write_typed_int(&mut out, i64::from(descriptor.idx))?;
        write_format_values(&mut out, key, values)?;
    }
    Ok(out)
}

/// Encode one FORMAT field's per-sample values into the flat,
/// uniform-width layout BCF requires. `GT` is special-cased through the
/// per-allele integer codec (spec §4.E, §8 testable property 4); every
/// other key is flattened by its runtime [`Value`] shape, padding short
/// samples out to the widest sample's length with the end-of-vector
/// sentinel (or, for character data, NUL bytes).
fn write_format_values<W: Write>(out: &mut W, key: &str, values: &[Value]) -> Result<()> {
    if key == "GT" {
        let per_sample: Result<Vec<Vec<i32>>> = values
            .iter()
            .map(|v| {
                let text = match v {
                    Value::String(s) => s.as_str(),
                    _ => {
                        return Err(Error::Format {
                            location: Location::ByteOffset(0),
                            message: "GT value must be a string".to_string(),
                        })
                    }
                };
                Ok(genotype::encode(&genotype::parse(text)))
            })
            .collect();
        return write_padded_ints(out, &per_sample?);
    }

    if values.iter().all(|v| matches!(v, Value::Flag)) {
        return Ok(());
    }

    match values.first() {
        Some(Value::Int32(_) | Value::VectorInt32(_)) => {
            let per_sample: Vec<Vec<i32>> = values.iter().map(value_as_ints).collect();
            write_padded_ints(out, &per_sample)
        }
        Some(Value::Float32(_) | Value::VectorFloat32(_)) => {
            let per_sample: Vec<Vec<f32>> = values.iter().map(value_as_floats).collect();
            write_padded_floats(out, &per_sample)
        }
        Some(Value::Char(_) | Value::String(_) | Value::VectorString(_)) => {
            let per_sample: Vec<String> = values.iter().map(value_as_string).collect();
            let width = per_sample.iter().map(String::len).max().unwrap_or(0);
            wire::write_char_array(out, width, &per_sample)
        }
        Some(Value::Flag) | None => Ok(()),
        _ => Err(Error::Format {
            location: Location::ByteOffset(0),
            message: format!("unsupported FORMAT value shape for {key:?}"),
        }),
    }
}

fn value_as_ints(v: &Value) -> Vec<i32> {
    match v {
        Value::Int32(x) => vec![*x],
        Value::VectorInt32(xs) => xs.clone(),
        _ => vec![i32::MISSING],
    }
}

fn value_as_floats(v: &Value) -> Vec<f32> {
    match v {
        Value::Float32(x) => vec![*x],
        Value::VectorFloat32(xs) => xs.clone(),
        _ => vec![f32::MISSING],
    }
}

fn value_as_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Char(c) => c.to_string(),
        Value::VectorString(xs) => xs.join(","),
        _ => String::new(),
    }
}

fn write_padded_ints<W: Write>(out: &mut W, per_sample: &[Vec<i32>]) -> Result<()> {
    let width = per_sample.iter().map(Vec::len).max().unwrap_or(0);
    let mut flat = Vec::with_capacity(width * per_sample.len());
    for sample in per_sample {
        flat.extend_from_slice(sample);
        flat.extend(std::iter::repeat_n(i32::END_OF_VECTOR, width - sample.len()));
    }
    wire::write_int_array(out, &flat)
}

fn write_padded_floats<W: Write>(out: &mut W, per_sample: &[Vec<f32>]) -> Result<()> {
    let width = per_sample.iter().map(Vec::len).max().unwrap_or(0);
    let mut flat = Vec::with_capacity(width * per_sample.len());
    for sample in per_sample {
        flat.extend_from_slice(sample);
        flat.extend(std::iter::repeat_n(f32::END_OF_VECTOR, width - sample.len()));
    }
    wire::write_float_array(out, &flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcf::reader::Reader as BcfReader;
    use std::io::Cursor;

    fn header_with_gt() -> Header {
        let text = "##fileformat=VCFv4.3\n\
                    ##FILTER=<ID=PASS,Description=\"All filters passed\">\n\
                    ##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
                    ##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n\
                    ##contig=<ID=20,length=1000>\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002\n";
        Header::parse(Cursor::new(text)).unwrap()
    }

    #[test]
    fn round_trips_record_with_genotypes_through_bcf_binary() {
        let header = header_with_gt();
        let mut record = VcfRecord::new("20", 100, "A");
        record.alt = vec!["G".to_string()];
        record.filter = vec!["PASS".to_string()];
        record.format_keys = vec!["GT".to_string(), "DP".to_string()];
        record.genotypes = vec![
            (
                "GT".to_string(),
                vec![
                    Value::String("0|1".to_string()),
                    Value::String("1/1".to_string()),
                ],
            ),
            (
                "DP".to_string(),
                vec![Value::Int32(10), Value::Int32(20)],
            ),
        ];

        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf, WriterOptions::default());
        writer.write_record(&header, &record).unwrap();

        let (mut reader, mut read_header) = BcfReader::new(Cursor::new(buf)).unwrap();
        let back = reader.read_record(&mut read_header).unwrap().unwrap();
        assert_eq!(back.chrom, "20");
        assert_eq!(back.pos, 100);
        assert_eq!(back.alt, vec!["G"]);
        assert_eq!(back.filter, vec!["PASS"]);
        assert_eq!(
            back.genotype_values("GT").unwrap(),
            &[
                Value::String("0|1".to_string()),
                Value::String("1/1".to_string())
            ]
        );
        assert_eq!(
            back.genotype_values("DP").unwrap(),
            &[Value::Int32(10), Value::Int32(20)]
        );
    }

    #[test]
    fn info_flag_round_trips_with_zero_length_wire_value() {
        let text = "##fileformat=VCFv4.3\n\
                    ##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">\n\
                    ##contig=<ID=20,length=1000>\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let header = Header::parse(Cursor::new(text)).unwrap();
        let mut record = VcfRecord::new("20", 1, "A");
        record.info = vec![("DB".to_string(), Value::Flag)];

        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf, WriterOptions::default());
        writer.write_record(&header, &record).unwrap();

        let (mut reader, mut read_header) = BcfReader::new(Cursor::new(buf)).unwrap();
        let back = reader.read_record(&mut read_header).unwrap().unwrap();
        assert_eq!(back.info, vec![("DB".to_string(), Value::Flag)]);
    }
}
