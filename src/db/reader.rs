// reader.rs - Streaming readers for the three positionally-aligned
// reference streams (profiles.xz, gap_profiles.xz, ST.txt.xz).

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use xz2::read::XzDecoder;

use crate::codec::{decode_gap_bits, decode_profile_bits, read_record};
use crate::error::Result;

/// One reference row, already decoded.
pub struct ReferenceRow {
    pub profile_bits: bitvec::prelude::BitVec<u8, bitvec::prelude::Msb0>,
    pub gap_bits: bitvec::prelude::BitVec<u8, bitvec::prelude::Msb0>,
    pub st_id: String,
    pub hiercc_codes: Vec<String>,
}

/// Streams decoded `ReferenceRow`s by reading one record from each of the
/// three files per step. Exhausts when any stream runs dry; a length
/// mismatch between the streams is reported as an `IoFailure` rather than
/// silently truncating.
pub struct ReferenceStream {
    profiles: XzDecoder<BufReader<File>>,
    gaps: XzDecoder<BufReader<File>>,
    st_lines: std::io::Lines<BufReader<XzDecoder<BufReader<File>>>>,
    array_size: usize,
    locus_count: usize,
}

impl ReferenceStream {
    pub fn open(db_dir: &Path, array_size: usize, locus_count: usize) -> Result<Self> {
        let profiles = XzDecoder::new(BufReader::new(File::open(db_dir.join("profiles.xz"))?));
        let gaps = XzDecoder::new(BufReader::new(File::open(db_dir.join("gap_profiles.xz"))?));
        let st_decoder = XzDecoder::new(BufReader::new(File::open(db_dir.join("ST.txt.xz"))?));
        let st_lines = BufReader::new(st_decoder).lines();
        Ok(Self { profiles, gaps, st_lines, array_size, locus_count })
    }

    fn next_row(&mut self) -> Result<Option<ReferenceRow>> {
        let profile_record = read_record(&mut self.profiles)?;
        let gap_record = read_record(&mut self.gaps)?;
        let st_line = self.st_lines.next().transpose()?;

        match (profile_record, gap_record, st_line) {
            (None, None, None) => Ok(None),
            (Some(p), Some(g), Some(line)) => {
                let profile_bits = decode_profile_bits(&p, self.array_size)?;
                let gap_bits = decode_gap_bits(&g, self.locus_count)?;
                let mut fields = line.split(',');
                let st_id = fields.next().unwrap_or_default().to_string();
                let hiercc_codes: Vec<String> = fields.map(|s| s.to_string()).collect();
                Ok(Some(ReferenceRow { profile_bits, gap_bits, st_id, hiercc_codes }))
            }
            _ => Err(crate::error::HcLinkError::IoFailure(
                "profile, gap, and ST streams are not positionally aligned".to_string(),
            )),
        }
    }
}

impl Iterator for ReferenceStream {
    type Item = Result<ReferenceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Decompress an arbitrary `.xz` file fully into memory. Used for the
/// (comparatively small) upstream HierCC JSON download, not the reference
/// streams.
pub fn read_xz_to_string(path: &Path) -> Result<String> {
    let mut decoder = XzDecoder::new(BufReader::new(File::open(path)?));
    let mut out = String::new();
    decoder.read_to_string(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_gap_bits, encode_profile_bits, write_record};
    use std::io::Write;
    use tempfile::tempdir;
    use xz2::write::XzEncoder;

    #[test]
    fn streams_three_aligned_rows() {
        let dir = tempdir().unwrap();

        let mut profile_enc = XzEncoder::new(File::create(dir.path().join("profiles.xz")).unwrap(), 6);
        let mut gap_enc = XzEncoder::new(File::create(dir.path().join("gap_profiles.xz")).unwrap(), 6);
        let mut st_enc = XzEncoder::new(File::create(dir.path().join("ST.txt.xz")).unwrap(), 6);

        for (st, bits_on, gap_on) in [("1", 0usize, None::<usize>), ("2", 2, Some(1))] {
            let mut bits: bitvec::prelude::BitVec<u8, bitvec::prelude::Msb0> =
                bitvec::prelude::BitVec::repeat(false, 4);
            bits.set(bits_on, true);
            let mut gaps: bitvec::prelude::BitVec<u8, bitvec::prelude::Msb0> =
                bitvec::prelude::BitVec::repeat(false, 2);
            if let Some(g) = gap_on {
                gaps.set(g, true);
            }
            write_record(&mut profile_enc, &encode_profile_bits(bits.as_bitslice())).unwrap();
            write_record(&mut gap_enc, &encode_gap_bits(gaps.as_bitslice())).unwrap();
            writeln!(st_enc, "{st},d0val,d2val").unwrap();
        }
        profile_enc.finish().unwrap();
        gap_enc.finish().unwrap();
        st_enc.finish().unwrap();

        let stream = ReferenceStream::open(dir.path(), 4, 2).unwrap();
        let rows: Vec<ReferenceRow> = stream.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].st_id, "1");
        assert_eq!(rows[1].st_id, "2");
        assert_eq!(rows[1].hiercc_codes, vec!["d0val".to_string(), "d2val".to_string()]);
        assert!(rows[1].gap_bits[1]);
    }
}
