// db - Scheme metadata, database writer, and streaming reference readers.

mod metadata;
mod reader;
mod writer;

pub use metadata::SchemeMetadata;
pub use reader::{read_xz_to_string, ReferenceRow, ReferenceStream};
pub use writer::{discover_family_sizes, parse_hiercc_json, write_database, HierccProfiles};
