// profile.rs - Allelic profile encoding and gap-aware comparison.
//
// A profile is a pair of fixed-width bitmaps. `profile_bits` is the
// concatenation of L per-locus sub-bitmaps, the i-th of width
// `family_sizes[i] + 1` (the extra bit is the "novel allele" bit).
// `gap_bits` is one bit per locus, set when that locus has no call.

use bitvec::prelude::*;

use crate::error::{HcLinkError, Result};
use crate::resolver::AlleleResolver;

/// A single encoded cgMLST profile: the allele bitmap plus the gap bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub profile_bits: BitVec<u8, Msb0>,
    pub gap_bits: BitVec<u8, Msb0>,
}

/// Result of comparing two profiles: raw allelic distance plus the three
/// gap categories needed by the HierCC distance transform and the search
/// reducer's tie-break rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub distance: usize,
    pub q_only_gaps: usize,
    pub r_only_gaps: usize,
    pub shared_gaps: usize,
}

impl Comparison {
    pub fn total_gaps(&self) -> usize {
        self.q_only_gaps + self.r_only_gaps + self.shared_gaps
    }
}

fn is_ascii_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Encode an underscore-delimited allelic code string into a `Profile`.
///
/// `family_sizes[i]` is the highest known allele ID at locus i; `array_size`
/// is `sum(family_sizes) + family_sizes.len()`, the total bit width.
pub fn encode(
    code_string: &str,
    family_sizes: &[u32],
    array_size: usize,
    resolver: &dyn AlleleResolver,
) -> Result<Profile> {
    let tokens: Vec<&str> = code_string.split('_').collect();
    if tokens.len() != family_sizes.len() {
        return Err(HcLinkError::InvalidProfile(format!(
            "expected {} tokens, got {}",
            family_sizes.len(),
            tokens.len()
        )));
    }

    let mut profile_bits: BitVec<u8, Msb0> = BitVec::repeat(false, array_size);
    let mut gap_bits: BitVec<u8, Msb0> = BitVec::repeat(false, family_sizes.len());

    let mut offset = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        let family_size = family_sizes[i] as usize;
        if token.is_empty() {
            gap_bits.set(i, true);
        } else if is_ascii_digits(token) {
            let value: u64 = token.parse().map_err(|_| {
                HcLinkError::InvalidProfile(format!("malformed numeric token '{token}' at locus {i}"))
            })?;
            if value == 0 {
                gap_bits.set(i, true);
            } else if (value as usize) <= family_size {
                profile_bits.set(offset + value as usize - 1, true);
            } else {
                profile_bits.set(offset + family_size, true);
            }
        } else {
            match resolver.lookup(token, i) {
                Some(allele_id) if (allele_id as usize) <= family_size && allele_id > 0 => {
                    profile_bits.set(offset + allele_id as usize - 1, true);
                }
                _ => profile_bits.set(offset + family_size, true),
            }
        }
        offset += family_size + 1;
    }

    debug_assert_eq!(offset, array_size, "family_sizes inconsistent with array_size");
    if profile_bits.len() != array_size {
        return Err(HcLinkError::InvalidProfile(format!(
            "encoded profile length {} != array_size {}",
            profile_bits.len(),
            array_size
        )));
    }

    Ok(Profile { profile_bits, gap_bits })
}

/// Compare two profiles, returning the raw Hamming-like distance corrected
/// for shared/unilateral gaps.
pub fn compare(query: &Profile, reference: &Profile) -> Comparison {
    let shared_gaps = (query.gap_bits.clone() & reference.gap_bits.as_bitslice()).count_ones();
    let q_gaps = query.gap_bits.count_ones();
    let r_gaps = reference.gap_bits.count_ones();
    let q_only_gaps = q_gaps - shared_gaps;
    let r_only_gaps = r_gaps - shared_gaps;

    let mut xor_bits = query.profile_bits.clone();
    xor_bits ^= reference.profile_bits.as_bitslice();
    let raw_bits = xor_bits.count_ones();

    let distance = (raw_bits - (q_only_gaps + r_only_gaps)) / 2;

    Comparison {
        distance,
        q_only_gaps,
        r_only_gaps,
        shared_gaps,
    }
}
