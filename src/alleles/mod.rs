// alleles - Persistent checksum/locus -> allele ID store and its FASTA
// ingestion path.

mod ingest;
mod store;

pub use ingest::ingest_fasta_directory;
pub use store::{checksum_of, AlleleHashStore, StoreResolver};
