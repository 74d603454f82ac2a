// download - Upstream collaborator: resolves a species to its scheme URLs
// and fetches profiles/HierCC/allele files over HTTP. A thin I/O wrapper --
// swapping the HTTP client must not change anything else in the crate.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::{retry, Error as BackoffError, ExponentialBackoff};
use serde::Deserialize;

use crate::error::{HcLinkError, Result};

/// `schemes.json` document: species key -> upstream scheme/profiles URLs.
#[derive(Debug, Deserialize)]
struct SchemesDocument {
    schemes: HashMap<String, String>,
    downloads: HashMap<String, String>,
}

/// The pair of upstream URLs needed to build a database for one species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesScheme {
    pub hiercc_url: String,
    pub profiles_url: String,
}

/// Resolve `species` against a `schemes.json` document at `path`.
pub fn get_species_scheme(species: &str, path: &Path) -> Result<SpeciesScheme> {
    let text = std::fs::read_to_string(path)?;
    let doc: SchemesDocument = serde_json::from_str(&text)?;
    let hiercc_url = doc
        .schemes
        .get(species)
        .ok_or_else(|| HcLinkError::SchemaMismatch(format!("species '{species}' not found in schemes.json")))?
        .clone();
    let profiles_url = doc.downloads.get(species).cloned().unwrap_or_default();
    Ok(SpeciesScheme { hiercc_url, profiles_url })
}

fn backoff_policy(max_attempts: u32) -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_secs(4),
        max_interval: Duration::from_secs(240),
        max_elapsed_time: Some(Duration::from_secs(240) * max_attempts),
        ..ExponentialBackoff::default()
    }
}

fn get_with_retry(url: &str, max_attempts: u32) -> Result<ureq::Response> {
    let mut attempt = 0u32;
    retry(backoff_policy(max_attempts), || {
        attempt += 1;
        ureq::get(url).call().map_err(|e| {
            if attempt >= max_attempts {
                BackoffError::Permanent(e)
            } else {
                BackoffError::Transient(e)
            }
        })
    })
    .map_err(|e| HcLinkError::UpstreamFailure(format!("GET {url} failed: {e}")))
}

/// Stream `{scheme_url}/profiles.list.gz` to disk, unmodified (still
/// gzip-compressed).
pub fn download_profiles(profiles_url: &str, dest_dir: &Path) -> Result<PathBuf> {
    let out_path = dest_dir.join("cgmlst_profiles.csv.gz");
    let response = get_with_retry(profiles_url, 2)?;
    let mut reader = response.into_reader();
    let mut file = File::create(&out_path)?;
    std::io::copy(&mut reader, &mut file)?;
    Ok(out_path)
}

/// Paginated fetch of HierCC profiles, accumulating a JSON array of
/// per-ST records until a page comes back with no `STs`, or `offset`
/// would exceed `safety_valve` (a hard backstop against a misbehaving
/// upstream that never terminates).
pub fn download_hiercc_profiles(
    hiercc_url: &str,
    api_key: &str,
    dest_dir: &Path,
    limit: u64,
    safety_valve: u64,
) -> Result<PathBuf> {
    let out_path = dest_dir.join("hiercc_profiles.json.gz");
    let mut sts: Vec<serde_json::Value> = Vec::new();
    let mut offset = 0u64;

    while offset < safety_valve {
        let url = format!("{hiercc_url}&limit={limit}&offset={offset}");
        let response = ureq::get(&url)
            .set("Authorization", &format!("Basic {api_key}"))
            .call()
            .map_err(|e| HcLinkError::UpstreamFailure(format!("GET {url} failed: {e}")))?;
        let batch: serde_json::Value = response
            .into_json()
            .map_err(|e| HcLinkError::UpstreamFailure(format!("invalid JSON from {url}: {e}")))?;
        let Some(batch_sts) = batch.get("STs").and_then(|v| v.as_array()) else {
            break;
        };
        if batch_sts.is_empty() {
            break;
        }
        sts.extend(batch_sts.iter().cloned());
        offset += limit;
    }

    let body = serde_json::to_vec(&sts)?;
    let file = File::create(&out_path)?;
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(&body)?;
    encoder.finish()?;
    Ok(out_path)
}

/// Download `{url}/{locus}.fasta.gz` for each locus into `dest_dir`,
/// skipping files that already exist so an interrupted build can resume.
pub fn download_alleles(url: &str, loci: &[String], dest_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dest_dir)?;
    for locus in loci {
        let out_path = dest_dir.join(format!("{locus}.fasta.gz"));
        if out_path.exists() {
            continue;
        }
        let locus_url = format!("{url}/{locus}.fasta.gz");
        let response = get_with_retry(&locus_url, 2)?;
        let mut reader = response.into_reader();
        let mut file = File::create(&out_path)?;
        std::io::copy(&mut reader, &mut file)?;
    }
    Ok(dest_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolves_known_species() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schemes.json");
        std::fs::write(
            &path,
            r#"{"schemes": {"ecoli": "https://example.test/Escherichia.cgMLSTv1"},
                "downloads": {"ecoli": "https://example.test/Escherichia.cgMLSTv1/profiles.list.gz"}}"#,
        )
        .unwrap();
        let scheme = get_species_scheme("ecoli", &path).unwrap();
        assert_eq!(scheme.hiercc_url, "https://example.test/Escherichia.cgMLSTv1");
        assert_eq!(scheme.profiles_url, "https://example.test/Escherichia.cgMLSTv1/profiles.list.gz");
    }

    #[test]
    fn unknown_species_is_schema_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schemes.json");
        std::fs::write(&path, r#"{"schemes": {}, "downloads": {}}"#).unwrap();
        let err = get_species_scheme("ghost", &path).unwrap_err();
        assert!(matches!(err, HcLinkError::SchemaMismatch(_)));
    }
}
