// lib.rs - hclink library root

//! # hclink - nearest-ST assignment and HierCC clonal-complex inference for bacterial cgMLST data
//!
//! This library assigns a queried core-genome MLST (cgMLST) allelic profile to its nearest known
//! Sequence Type in a reference database, then projects the resulting HierCC distance onto the
//! database's threshold layers to report the isolate's clonal-complex membership at each level.
//!
//! ## Features
//!
//! - **Gap-aware distance**: a bit-packed profile codec that treats missing calls (gaps) and
//!   novel (previously unseen) alleles distinctly from ordinary allelic mismatches.
//! - **Streaming search**: the reference database is never fully materialized in memory; rows
//!   are decoded and compared in parallel batches as they stream off disk.
//! - **HierCC projection**: a continuous HierCC distance transform plus per-threshold clonal
//!   complex code inference.
//! - **Database tooling**: builders that turn upstream profile/HierCC downloads into the
//!   on-disk database layout the search engine reads.
//!
//! ## Basic usage
//!
//! ```rust,no_run
//! use hclink::prelude::*;
//!
//! let metadata = SchemeMetadata::load(std::path::Path::new("db/metadata.json"))?;
//! let query = encode("1_1_1_1_1", &metadata.family_sizes, metadata.array_size, &NullResolver)?;
//! let stream = ReferenceStream::open(std::path::Path::new("db"), metadata.array_size, metadata.locus_count())?;
//! let hit = search(&query, stream, metadata.locus_count(), metadata.max_gaps, 5000)?;
//! # Ok::<(), HcLinkError>(())
//! ```

pub mod alleles;
pub mod cli;
pub mod codec;
pub mod db;
pub mod download;
pub mod error;
pub mod hiercc;
pub mod output;
pub mod resolver;
pub mod search;

/// Convenience prelude for common imports.
pub mod prelude {
    pub use crate::alleles::{checksum_of, AlleleHashStore, StoreResolver};
    pub use crate::codec::{compare, encode, Comparison, Profile};
    pub use crate::db::{ReferenceRow, ReferenceStream, SchemeMetadata};
    pub use crate::error::{HcLinkError, Result};
    pub use crate::hiercc::{calculate_hiercc_distance, infer_hiercc_code};
    pub use crate::output::QueryResult;
    pub use crate::resolver::{AlleleResolver, NullResolver};
    pub use crate::search::{search, BestHit};
}

/// Library version, stamped into `metadata.json` and the query result JSON.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
