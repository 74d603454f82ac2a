// ingest.rs - Build an AlleleHashStore from a directory of per-locus FASTA
// files, one gzip-compressed file per locus (`{locus}.fasta.gz`), headers
// of the form `>{locus}_{allele_id}`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bio::io::fasta;
use flate2::read::GzDecoder;

use crate::error::{HcLinkError, Result};

use super::store::{checksum_of, AlleleHashStore};

/// Populate `store` from `{locus}.fasta.gz` for each locus in `loci`, in
/// scheme order. `locus_index` is the FASTA file's position, matching the
/// profile codec's per-locus sub-bitmap ordering.
pub fn ingest_fasta_directory(store: &AlleleHashStore, alleles_dir: &Path, loci: &[String]) -> Result<()> {
    for (locus_index, locus) in loci.iter().enumerate() {
        let fasta_path = alleles_dir.join(format!("{locus}.fasta.gz"));
        if !fasta_path.exists() {
            continue;
        }
        ingest_locus_file(store, &fasta_path, locus, locus_index)?;
    }
    Ok(())
}

fn ingest_locus_file(store: &AlleleHashStore, path: &Path, locus: &str, locus_index: usize) -> Result<()> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let reader = fasta::Reader::new(BufReader::new(decoder));

    let header_prefix = format!("{locus}_");
    for record_result in reader.records() {
        let record = record_result.map_err(|e| {
            HcLinkError::InvalidProfile(format!("invalid FASTA record in {}: {e}", path.display()))
        })?;
        let allele_id: u32 = record
            .id()
            .strip_prefix(header_prefix.as_str())
            .ok_or_else(|| {
                HcLinkError::SchemaMismatch(format!(
                    "FASTA header '{}' in {} does not start with '{header_prefix}'",
                    record.id(),
                    path.display()
                ))
            })?
            .parse()
            .map_err(|_| {
                HcLinkError::SchemaMismatch(format!("non-numeric allele id in header '{}'", record.id()))
            })?;

        let lowercase_seq: Vec<u8> = record.seq().iter().map(u8::to_ascii_lowercase).collect();
        let checksum = checksum_of(&lowercase_seq);
        store.put(&checksum, locus_index, allele_id)?;
    }
    Ok(())
}
