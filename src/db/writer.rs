// writer.rs - Builds a reference database directory from a downloaded
// profiles TSV, a HierCC JSON file, and a per-locus FASTA directory.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::Value;
use xz2::write::XzEncoder;

use crate::alleles::{ingest_fasta_directory, AlleleHashStore};
use crate::codec::{encode, encode_gap_bits, encode_profile_bits, write_record};
use crate::db::metadata::SchemeMetadata;
use crate::error::{HcLinkError, Result};
use crate::resolver::NullResolver;

const XZ_PRESET: u32 = 6;

/// Parsed HierCC JSON: per-ST ordered code lists, plus the threshold layout
/// they were parsed against.
pub struct HierccProfiles {
    pub by_st: HashMap<String, Vec<String>>,
    pub prepend: String,
    pub thresholds: Vec<u32>,
}

/// Parse the upstream HierCC JSON payload: a list of objects each carrying
/// `ST_id` and `info.hierCC` (a map from `"{prepend}{threshold}"` to cluster
/// label). The threshold layout is sampled from the first record that has
/// one.
pub fn parse_hiercc_json(text: &str) -> Result<HierccProfiles> {
    let records: Vec<Value> = serde_json::from_str(text)?;

    let first_hiercc = records
        .iter()
        .find_map(|r| r.get("info").and_then(|i| i.get("hierCC")).and_then(|h| h.as_object()))
        .ok_or_else(|| HcLinkError::SchemaMismatch("no record with info.hierCC found".to_string()))?;

    let first_key = first_hiercc
        .keys()
        .next()
        .ok_or_else(|| HcLinkError::SchemaMismatch("info.hierCC has no keys".to_string()))?;
    let prepend: String = first_key.chars().take_while(|c| !c.is_ascii_digit()).collect();

    let mut thresholds: Vec<u32> = first_hiercc
        .keys()
        .map(|k| {
            k.trim_start_matches(&prepend)
                .parse::<u32>()
                .map_err(|_| HcLinkError::SchemaMismatch(format!("non-numeric HierCC threshold key '{k}'")))
        })
        .collect::<Result<_>>()?;
    thresholds.sort_unstable();

    let mut by_st = HashMap::new();
    for record in &records {
        let Some(info) = record.get("info") else { continue };
        let Some(hiercc) = info.get("hierCC").and_then(|h| h.as_object()) else { continue };
        let Some(st_id) = record.get("ST_id").and_then(|s| s.as_str().map(str::to_string).or_else(|| s.as_i64().map(|n| n.to_string())))
        else {
            continue;
        };
        let Ok(st_num) = st_id.parse::<i64>() else { continue };
        if st_num < 1 {
            continue;
        }

        let mut pairs: Vec<(u32, String)> = hiercc
            .iter()
            .filter_map(|(k, v)| {
                let threshold = k.trim_start_matches(&prepend).parse::<u32>().ok()?;
                Some((threshold, v.as_str().unwrap_or_default().to_string()))
            })
            .collect();
        pairs.sort_by_key(|(t, _)| *t);
        by_st.insert(st_id, pairs.into_iter().map(|(_, code)| code).collect());
    }

    Ok(HierccProfiles { by_st, prepend, thresholds })
}

/// Scan a tab-separated profiles file (first column ST, remaining columns
/// allele calls) for `family_sizes[i]` = the highest positive integer seen
/// in column `i+1`. Values `<= 0` are gaps and do not count.
pub fn discover_family_sizes(profiles_text: &str) -> Result<Vec<u32>> {
    let mut lines = profiles_text.lines();
    let header = lines.next().ok_or_else(|| HcLinkError::InvalidProfile("empty profiles file".to_string()))?;
    let locus_count = header.split('\t').count().saturating_sub(1);
    let mut family_sizes = vec![0u32; locus_count];

    for line in lines {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != locus_count + 1 {
            return Err(HcLinkError::SchemaMismatch(format!(
                "row has {} columns, expected {}",
                fields.len(),
                locus_count + 1
            )));
        }
        for (i, value) in fields[1..].iter().enumerate() {
            if let Ok(parsed) = value.parse::<i64>() {
                if parsed > 0 && (parsed as u32) > family_sizes[i] {
                    family_sizes[i] = parsed as u32;
                }
            }
        }
    }
    Ok(family_sizes)
}

/// Build (or rebuild) the reference database at `db_dir` from the already
/// downloaded inputs. Returns the metadata record written.
#[allow(clippy::too_many_arguments)]
pub fn write_database(
    version: &str,
    profiles_text: &str,
    hiercc_json_text: &str,
    alleles_dir: Option<&Path>,
    loci_names: &[String],
    db_dir: &Path,
    max_gaps_override: Option<usize>,
) -> Result<SchemeMetadata> {
    std::fs::create_dir_all(db_dir)?;

    let metadata_path = db_dir.join("metadata.json");
    let hiercc = parse_hiercc_json(hiercc_json_text)?;

    // Reuse a pre-existing metadata.json's dimensions rather than
    // re-scanning the profiles file, letting a caller rebuild the ST/HierCC
    // table after a corrected download without a full rescan.
    let metadata = if metadata_path.exists() {
        let mut existing = SchemeMetadata::load(&metadata_path)?;
        existing.version = version.to_string();
        existing.thresholds = hiercc.thresholds.clone();
        existing.prepend = hiercc.prepend.clone();
        existing
    } else {
        let family_sizes = discover_family_sizes(profiles_text)?;
        SchemeMetadata::derive(version.to_string(), family_sizes, hiercc.thresholds.clone(), hiercc.prepend.clone(), max_gaps_override)
    };

    if let Some(alleles_dir) = alleles_dir {
        let store = AlleleHashStore::open(&db_dir.join("alleles.db"))?;
        ingest_fasta_directory(&store, alleles_dir, loci_names)?;
        let mut store = store;
        store.finalize()?;
    }

    let profile_file = BufWriter::new(File::create(db_dir.join("profiles.xz"))?);
    let gap_file = BufWriter::new(File::create(db_dir.join("gap_profiles.xz"))?);
    let st_file = BufWriter::new(File::create(db_dir.join("ST.txt.xz"))?);
    let mut profile_out = XzEncoder::new(profile_file, XZ_PRESET);
    let mut gap_out = XzEncoder::new(gap_file, XZ_PRESET);
    let mut st_out = XzEncoder::new(st_file, XZ_PRESET);

    let mut lines = profiles_text.lines();
    lines.next(); // header
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let st = fields[0];
        let code_string = fields[1..]
            .iter()
            .map(|v| if *v == "0" { "" } else { v })
            .collect::<Vec<_>>()
            .join("_");

        let profile = encode(&code_string, &metadata.family_sizes, metadata.array_size, &NullResolver)?;
        write_record(&mut profile_out, &encode_profile_bits(profile.profile_bits.as_bitslice()))?;
        write_record(&mut gap_out, &encode_gap_bits(profile.gap_bits.as_bitslice()))?;

        let codes = hiercc.by_st.get(st).cloned().unwrap_or_else(|| vec![String::new(); metadata.thresholds.len()]);
        writeln!(st_out, "{st},{}", codes.join(","))?;
    }

    profile_out.finish()?;
    gap_out.finish()?;
    st_out.finish()?;

    metadata.save(&metadata_path)?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PROFILES: &str = "ST\tlocusA\tlocusB\n1\t1\t2\n2\t2\t0\n";
    const HIERCC_JSON: &str = r#"[
        {"ST_id": "1", "info": {"hierCC": {"d0": "a", "d5": "b"}}},
        {"ST_id": "2", "info": {"hierCC": {"d0": "c", "d5": "d"}}}
    ]"#;

    #[test]
    fn discovers_family_sizes_from_profiles() {
        let sizes = discover_family_sizes(PROFILES).unwrap();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[test]
    fn parses_hiercc_json_thresholds_and_codes() {
        let parsed = parse_hiercc_json(HIERCC_JSON).unwrap();
        assert_eq!(parsed.prepend, "d");
        assert_eq!(parsed.thresholds, vec![0, 5]);
        assert_eq!(parsed.by_st["1"], vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn write_database_produces_all_expected_files() {
        let dir = tempdir().unwrap();
        let metadata = write_database("1.0", PROFILES, HIERCC_JSON, None, &[], dir.path(), None).unwrap();

        assert_eq!(metadata.family_sizes, vec![2, 2]);
        assert!(dir.path().join("profiles.xz").exists());
        assert!(dir.path().join("gap_profiles.xz").exists());
        assert!(dir.path().join("ST.txt.xz").exists());
        assert!(dir.path().join("metadata.json").exists());
    }

    #[test]
    fn write_database_reuses_existing_metadata_dimensions() {
        let dir = tempdir().unwrap();
        write_database("1.0", PROFILES, HIERCC_JSON, None, &[], dir.path(), None).unwrap();
        // Re-run with a profiles file that would discover different sizes
        // if rescanned; the existing metadata.json wins instead.
        let bigger_profiles = "ST\tlocusA\tlocusB\n1\t9\t9\n";
        let metadata = write_database("1.1", bigger_profiles, HIERCC_JSON, None, &[], dir.path(), None).unwrap();
        assert_eq!(metadata.family_sizes, vec![2, 2]);
        assert_eq!(metadata.version, "1.1");
    }
}
