//! Textual header serialization (spec §4.D "Serialization contract").

use std::io::Write;

use crate::error::Result;
use crate::header::Header;

impl Header {
    /// Serialize this header as VCF text: meta lines in dictionary order,
    /// then the `#CHROM` column line. `write_idx` controls whether `IDX=`
    /// is emitted on structured lines (off by default per spec §4.D).
    pub fn write<W: Write>(&self, mut w: W, write_idx: bool) -> Result<()> {
        for (k, v) in &self.meta {
            writeln!(w, "##{k}={v}")?;
        }
        for info in &self.info {
            write!(
                w,
                "##INFO=<ID={},Number={},Type={},Description=\"{}\"",
                info.id,
                info.number.render(),
                info.ty.render(),
                info.description
            )?;
            for (k, v) in &info.extra {
                write!(w, ",{k}={v}")?;
            }
            if write_idx {
                write!(w, ",IDX={}", info.idx)?;
            }
            writeln!(w, ">")?;
        }
        for format in &self.format {
            write!(
                w,
                "##FORMAT=<ID={},Number={},Type={},Description=\"{}\"",
                format.id,
                format.number.render(),
                format.ty.render(),
                format.description
            )?;
            for (k, v) in &format.extra {
                write!(w, ",{k}={v}")?;
            }
            if write_idx {
                write!(w, ",IDX={}", format.idx)?;
            }
            writeln!(w, ">")?;
        }
        for filter in &self.filter {
            write!(
                w,
                "##FILTER=<ID={},Description=\"{}\"",
                filter.id, filter.description
            )?;
            if write_idx {
                write!(w, ",IDX={}", filter.idx)?;
            }
            writeln!(w, ">")?;
        }
        for contig in &self.contig {
            write!(w, "##contig=<ID={}", contig.id)?;
            if let Some(len) = contig.length {
                write!(w, ",length={len}")?;
            }
            for (k, v) in &contig.extra {
                write!(w, ",{k}={v}")?;
            }
            if write_idx {
                write!(w, ",IDX={}", contig.idx)?;
            }
            writeln!(w, ">")?;
        }

        write!(w, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")?;
        if !self.samples.is_empty() {
            write!(w, "\tFORMAT")?;
            for sample in &self.samples {
                write!(w, "\t{sample}")?;
            }
        }
        writeln!(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_through_parse_and_write() {
        let text = "##fileformat=VCFv4.3\n\
                    ##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\n";
        let header = Header::parse(Cursor::new(text)).unwrap();

        let mut out = Vec::new();
        header.write(&mut out, false).unwrap();
        let rewritten = String::from_utf8(out).unwrap();

        let header2 = Header::parse(Cursor::new(rewritten)).unwrap();
        assert_eq!(header2.info_by_id("AF").unwrap().number, header.info_by_id("AF").unwrap().number);
        assert_eq!(header2.samples, header.samples);
    }

    #[test]
    fn idx_omitted_by_default_and_present_when_requested() {
        let text = "##INFO=<ID=X,Number=1,Type=String,Description=\"d\">\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let header = Header::parse(Cursor::new(text)).unwrap();

        let mut without_idx = Vec::new();
        header.write(&mut without_idx, false).unwrap();
        assert!(!String::from_utf8_lossy(&without_idx).contains("IDX="));

        let mut with_idx = Vec::new();
        header.write(&mut with_idx, true).unwrap();
        assert!(String::from_utf8_lossy(&with_idx).contains("IDX=0"));
    }
}
