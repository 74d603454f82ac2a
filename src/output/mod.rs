// output - Query result JSON shape written to stdout by `assign`.

use serde::Serialize;

use crate::error::Result;
use crate::hiercc::infer_hiercc_code;
use crate::search::BestHit;

/// `versions` block: the CLI's own release tag alongside the reference
/// database's `datestamp`, so a result can always be traced back to the
/// scheme build that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Versions {
    pub hclink: String,
    pub library: String,
}

/// The JSON object `assign` writes to stdout.
///
/// `distance` and `hiercc_distance` are `None` for the sentinel hit (no
/// candidate passed the cutoff, or the query itself already exceeds
/// `max_gaps`): JSON has no infinity literal, and `i64::MAX`/`f32::INFINITY`
/// would either overflow a reader's integer type or fail to serialize at
/// all, so the "no match" case is represented as `null` rather than a
/// magic number a consumer could mistake for a real distance.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub versions: Versions,
    #[serde(rename = "closestST")]
    pub closest_st: String,
    pub distance: Option<i64>,
    #[serde(rename = "hierccDistance")]
    pub hiercc_distance: Option<f64>,
    #[serde(rename = "sharedGaps")]
    pub shared_gaps: i64,
    #[serde(rename = "queryGaps")]
    pub query_gaps: i64,
    #[serde(rename = "referenceGaps")]
    pub reference_gaps: i64,
    #[serde(rename = "hierCC")]
    pub hier_cc: Vec<(String, String)>,
}

impl QueryResult {
    /// Build the output record from a search result, the library's own
    /// version string, and the reference database's `datestamp`.
    ///
    /// `hier_cc` is re-derived from `hit.hiercc_distance` rather than the
    /// hit's raw code list verbatim: a threshold layer the hit's HierCC
    /// distance doesn't actually clear must report an empty code, which
    /// `infer_hiercc_code` already does correctly (including for the
    /// sentinel hit, whose infinite distance clears no threshold).
    pub fn from_best_hit(
        hit: &BestHit,
        hclink_version: &str,
        library_datestamp: &str,
        thresholds: &[u32],
        prepend: &str,
    ) -> Result<Self> {
        let is_sentinel = hit.distance == i64::MAX;
        let hier_cc = infer_hiercc_code(hit.hiercc_distance, thresholds, &hit.hiercc_codes, prepend)?;

        Ok(Self {
            versions: Versions { hclink: hclink_version.to_string(), library: library_datestamp.to_string() },
            closest_st: hit.st_id.clone(),
            distance: if is_sentinel { None } else { Some(hit.distance) },
            hiercc_distance: if is_sentinel { None } else { Some(round_to_two_dp(hit.hiercc_distance)) },
            shared_gaps: hit.shared_gaps,
            query_gaps: hit.q_only_gaps,
            reference_gaps: hit.r_only_gaps,
            hier_cc,
        })
    }
}

fn round_to_two_dp(value: f32) -> f64 {
    (f64::from(value) * 100.0).round() / 100.0
}
