// hiercc.rs - HierCC distance transform and threshold-layer code inference.

use crate::error::{HcLinkError, Result};

/// Convert a raw allelic `distance` plus its gap breakdown into a HierCC
/// distance, a continuous value on the same scale as the clustering
/// thresholds. All arithmetic happens in `f32`, matching the upstream
/// scheme's numeric precision.
///
/// `profile_size` is `L`, the number of loci (not `array_size`).
pub fn calculate_hiercc_distance(
    distance: usize,
    query_gaps: usize,
    reference_gaps: usize,
    shared_gaps: usize,
    profile_size: usize,
) -> f32 {
    let l = profile_size as f32;
    if distance >= profile_size {
        return l;
    }
    if distance == 0 && query_gaps == 0 && reference_gaps == 0 {
        return 0.0;
    }

    let distance = distance as f32;
    let query_gaps = query_gaps as f32;
    let reference_gaps = reference_gaps as f32;
    let shared_gaps = shared_gaps as f32;

    let query_core = (l - query_gaps - shared_gaps) - 0.03 * l;
    let common_core = l - query_gaps - reference_gaps - shared_gaps;

    if common_core >= query_core {
        if common_core == 0.0 {
            return l;
        }
        (l * distance) / common_core + 0.5
    } else {
        if query_core == 0.0 {
            return l;
        }
        (l * (distance + query_core - common_core)) / query_core + 0.5
    }
}

/// Project a HierCC distance onto each threshold layer: `(label, code)`
/// pairs where `label = prepend + threshold` and `code` is the reference
/// ST's code at that threshold, or empty if the distance exceeds it.
///
/// `st_hiercc_codes` may be empty (treated as all-absent); otherwise it must
/// have the same length as `thresholds`.
pub fn infer_hiercc_code(
    hiercc_distance: f32,
    thresholds: &[u32],
    st_hiercc_codes: &[String],
    prepend: &str,
) -> Result<Vec<(String, String)>> {
    let codes: Vec<String> = if st_hiercc_codes.is_empty() {
        vec![String::new(); thresholds.len()]
    } else {
        if st_hiercc_codes.len() != thresholds.len() {
            return Err(HcLinkError::SchemaMismatch(format!(
                "profile length {} does not match thresholds length {}",
                st_hiercc_codes.len(),
                thresholds.len()
            )));
        }
        st_hiercc_codes.to_vec()
    };

    Ok(thresholds
        .iter()
        .zip(codes.iter())
        .map(|(threshold, code)| {
            let label = format!("{prepend}{threshold}");
            let projected = if hiercc_distance <= *threshold as f32 {
                code.clone()
            } else {
                String::new()
            };
            (label, projected)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: usize = 5;

    #[test]
    fn zero_distance_and_no_gaps_is_zero() {
        assert_eq!(calculate_hiercc_distance(0, 0, 0, 0, L), 0.0);
    }

    #[test]
    fn distance_at_or_above_profile_size_returns_l() {
        assert_eq!(calculate_hiercc_distance(5, 0, 0, 0, L), 5.0);
        assert_eq!(calculate_hiercc_distance(9, 0, 0, 0, L), 5.0);
    }

    #[test]
    fn scenario_3_single_snp_matches_worked_example() {
        // distance=1, no gaps, L=5 => (5*1)/5 + 0.5 == 1.5
        let d = calculate_hiercc_distance(1, 0, 0, 0, L);
        assert!((d - 1.5).abs() < 1e-6);
    }

    #[test]
    fn scenario_4_two_snps_matches_worked_example() {
        // distance=2, no gaps, L=5 => (5*2)/5 + 0.5 == 2.5
        let d = calculate_hiercc_distance(2, 0, 0, 0, L);
        assert!((d - 2.5).abs() < 1e-6);
    }

    #[test]
    fn common_core_zero_returns_l() {
        // query_gaps + shared_gaps == L forces common_core to zero when
        // reference_gaps is also zero, and common_core >= query_core holds
        // because query_core is itself non-positive once gaps == L.
        let d = calculate_hiercc_distance(1, 5, 0, 0, L);
        assert_eq!(d, L as f32);
    }

    #[test]
    fn infer_code_empty_profile_yields_all_blank() {
        let codes = infer_hiercc_code(0.0, &[0, 2, 5], &[], "d").unwrap();
        assert_eq!(codes, vec![
            ("d0".to_string(), String::new()),
            ("d2".to_string(), String::new()),
            ("d5".to_string(), String::new()),
        ]);
    }

    #[test]
    fn infer_code_length_mismatch_is_schema_mismatch() {
        let err = infer_hiercc_code(0.0, &[0, 2], &["a".into()], "d").unwrap_err();
        assert!(matches!(err, HcLinkError::SchemaMismatch(_)));
    }

    #[test]
    fn monotonicity_non_empty_at_t_implies_non_empty_at_next_t() {
        let thresholds = vec![0u32, 2, 5, 10];
        let codes = vec!["c0".to_string(), "c2".to_string(), "c5".to_string(), "c10".to_string()];
        for dist in [0.0f32, 1.5, 3.0, 7.0, 12.0] {
            let result = infer_hiercc_code(dist, &thresholds, &codes, "d").unwrap();
            for window in result.windows(2) {
                let (_, code_i) = &window[0];
                let (_, code_next) = &window[1];
                if !code_i.is_empty() {
                    assert!(!code_next.is_empty());
                }
            }
        }
    }
}
