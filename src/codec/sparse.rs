// sparse.rs - On-disk framing for profile and gap bitmaps.
//
// `profile_bits` carries exactly one set bit per locus (occasionally the
// novel bit instead of a normal allele bit), so across a few thousand loci
// it is overwhelmingly zero. Rather than writing `array_size` bits densely,
// we store the ascending list of set-bit positions: a "sparse count"
// encoding. `gap_bits` has no such guarantee -- a heavily fragmented sample
// can have most loci missing -- so it is serialized densely, one bit per
// locus, byte-packed.
//
// Every record (one profile, one gap bitmap, one ST line) is framed with a
// little-endian u32 length prefix ahead of its payload. The framed records
// for a whole reference database are then written as a single stream and
// LZMA-compressed end to end.

use std::io::{self, Read, Write};

use bitvec::prelude::*;

/// Sparse-encode the set-bit positions of `bits` as ascending little-endian
/// u32 values. The position count is implicit in the payload length (each
/// position is 4 bytes); the caller already frames payloads with a length
/// prefix, so no separate count field is stored here.
pub fn encode_profile_bits(bits: &BitSlice<u8, Msb0>) -> Vec<u8> {
    let mut out = Vec::with_capacity(bits.count_ones() * 4);
    for index in bits.iter_ones() {
        out.extend_from_slice(&(index as u32).to_le_bytes());
    }
    out
}

/// Reconstruct a profile bitmap of `array_size` bits from its sparse
/// encoding. `bytes.len()` must be a multiple of 4.
pub fn decode_profile_bits(bytes: &[u8], array_size: usize) -> io::Result<BitVec<u8, Msb0>> {
    if bytes.len() % 4 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("sparse profile payload length {} is not a multiple of 4", bytes.len()),
        ));
    }
    let mut bits: BitVec<u8, Msb0> = BitVec::repeat(false, array_size);
    for chunk in bytes.chunks_exact(4) {
        let index = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        if index >= array_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("sparse profile bit index {index} out of range for array_size {array_size}"),
            ));
        }
        bits.set(index, true);
    }
    Ok(bits)
}

/// Densely serialize `bits` to byte-packed form. The bit count is carried by
/// the caller (it equals the locus count, already known from the scheme
/// metadata), so the payload is exactly the underlying byte storage.
pub fn encode_gap_bits(bits: &BitSlice<u8, Msb0>) -> Vec<u8> {
    bits.to_bitvec().into_vec()
}

/// Reconstruct a gap bitmap of `locus_count` bits from its dense encoding.
pub fn decode_gap_bits(bytes: &[u8], locus_count: usize) -> io::Result<BitVec<u8, Msb0>> {
    let mut bits: BitVec<u8, Msb0> = BitVec::from_slice(bytes);
    bits.truncate(locus_count);
    if bits.len() != locus_count {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("gap payload too short for {locus_count} loci"),
        ));
    }
    Ok(bits)
}

/// Write one length-prefixed record: a little-endian u32 byte count followed
/// by the payload itself.
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(payload)
}

/// Read one length-prefixed record. Returns `Ok(None)` at a clean end of
/// stream (no bytes left before the next length prefix).
pub fn read_record<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_le_bytes(len_bytes) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_round_trip_matches_original_bits() {
        let mut bits: BitVec<u8, Msb0> = BitVec::repeat(false, 17);
        for i in [1usize, 8, 10, 16] {
            bits.set(i, true);
        }
        let encoded = encode_profile_bits(bits.as_bitslice());
        assert_eq!(encoded.len(), 4 * 4);
        let decoded = decode_profile_bits(&encoded, 17).unwrap();
        assert_eq!(decoded, bits);
    }

    #[test]
    fn sparse_decode_rejects_out_of_range_index() {
        let encoded = 100u32.to_le_bytes().to_vec();
        assert!(decode_profile_bits(&encoded, 17).is_err());
    }

    #[test]
    fn sparse_decode_rejects_truncated_payload() {
        let encoded = vec![0u8, 1, 2];
        assert!(decode_profile_bits(&encoded, 17).is_err());
    }

    #[test]
    fn gap_round_trip_matches_original_bits() {
        let mut bits: BitVec<u8, Msb0> = BitVec::repeat(false, 5);
        bits.set(1, true);
        let encoded = encode_gap_bits(bits.as_bitslice());
        let decoded = decode_gap_bits(&encoded, 5).unwrap();
        assert_eq!(decoded, bits);
    }

    #[test]
    fn record_framing_round_trips_several_records() {
        let mut buf = Vec::new();
        write_record(&mut buf, &[1, 2, 3]).unwrap();
        write_record(&mut buf, &[]).unwrap();
        write_record(&mut buf, &[9u8; 10]).unwrap();

        let mut cursor = io::Cursor::new(buf);
        assert_eq!(read_record(&mut cursor).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(read_record(&mut cursor).unwrap(), Some(vec![]));
        assert_eq!(read_record(&mut cursor).unwrap(), Some(vec![9u8; 10]));
        assert_eq!(read_record(&mut cursor).unwrap(), None);
    }
}
