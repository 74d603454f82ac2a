// codec - Profile encoding/comparison (profile.rs) and its on-disk framing
// (sparse.rs).

mod profile;
mod sparse;

pub use profile::{compare, encode, Comparison, Profile};
pub use sparse::{
    decode_gap_bits, decode_profile_bits, encode_gap_bits, encode_profile_bits, read_record,
    write_record,
};
