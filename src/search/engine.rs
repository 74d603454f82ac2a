// engine.rs - Streaming, parallel, gap-aware nearest-neighbor search.
//
// The reference database is never loaded in full: rows are decoded off the
// main thread in batches of `chunk_size`, each batch is compared against the
// query in parallel across a rayon pool, and a single-threaded reducer folds
// the batch's results into the running best hit. Ordering between batches is
// not preserved, so the ST_id tie-break below is what keeps the result
// deterministic when several references tie exactly.

use rayon::prelude::*;

use crate::codec::{compare, Profile};
use crate::db::{ReferenceRow, ReferenceStream};
use crate::error::Result;
use crate::hiercc::calculate_hiercc_distance;

/// Best-hit record returned by [`search`]. `distance` is `i64::MAX` and
/// `r_only_gaps` is `-1` for the "no candidate passed the cutoff" sentinel,
/// matching the convention used when serializing the query result.
#[derive(Debug, Clone, PartialEq)]
pub struct BestHit {
    pub st_id: String,
    pub hiercc_codes: Vec<String>,
    pub distance: i64,
    pub hiercc_distance: f32,
    pub q_only_gaps: i64,
    pub r_only_gaps: i64,
    pub shared_gaps: i64,
}

impl BestHit {
    fn sentinel(query_gaps: usize) -> Self {
        Self {
            st_id: String::new(),
            hiercc_codes: Vec::new(),
            distance: i64::MAX,
            hiercc_distance: f32::INFINITY,
            q_only_gaps: query_gaps as i64,
            r_only_gaps: -1,
            shared_gaps: query_gaps as i64,
        }
    }

    fn total_gaps(&self) -> i64 {
        self.q_only_gaps + self.r_only_gaps + self.shared_gaps
    }
}

struct Candidate {
    st_id: String,
    hiercc_codes: Vec<String>,
    distance: usize,
    hiercc_distance: f32,
    q_only_gaps: usize,
    r_only_gaps: usize,
    shared_gaps: usize,
}

fn evaluate_row(query: &Profile, row: ReferenceRow, profile_size: usize) -> Candidate {
    let reference = Profile { profile_bits: row.profile_bits, gap_bits: row.gap_bits };
    let cmp = compare(query, &reference);
    let hiercc_distance =
        calculate_hiercc_distance(cmp.distance, cmp.q_only_gaps, cmp.r_only_gaps, cmp.shared_gaps, profile_size);
    Candidate {
        st_id: row.st_id,
        hiercc_codes: row.hiercc_codes,
        distance: cmp.distance,
        hiercc_distance,
        q_only_gaps: cmp.q_only_gaps,
        r_only_gaps: cmp.r_only_gaps,
        shared_gaps: cmp.shared_gaps,
    }
}

fn fold_candidate(best: &mut Option<BestHit>, candidate: Candidate, max_gaps: usize) {
    let total_gaps = candidate.q_only_gaps + candidate.r_only_gaps + candidate.shared_gaps;
    if total_gaps >= max_gaps {
        return;
    }

    let replace = match best {
        None => true,
        Some(current) => {
            if candidate.hiercc_distance < current.hiercc_distance {
                true
            } else if candidate.hiercc_distance == current.hiercc_distance {
                let candidate_total = total_gaps as i64;
                match candidate_total.cmp(&current.total_gaps()) {
                    std::cmp::Ordering::Less => true,
                    std::cmp::Ordering::Equal => candidate.st_id < current.st_id,
                    std::cmp::Ordering::Greater => false,
                }
            } else {
                false
            }
        }
    };

    if replace {
        *best = Some(BestHit {
            st_id: candidate.st_id,
            hiercc_codes: candidate.hiercc_codes,
            distance: candidate.distance as i64,
            hiercc_distance: candidate.hiercc_distance,
            q_only_gaps: candidate.q_only_gaps as i64,
            r_only_gaps: candidate.r_only_gaps as i64,
            shared_gaps: candidate.shared_gaps as i64,
        });
    }
}

/// Scan the reference database streamed from `stream`, returning the single
/// nearest ST under the HierCC-distance-then-total-gaps tie-break (ST_id
/// lexicographic as a final, deterministic tie-break).
///
/// Short-circuits to the sentinel hit if the query itself has too many gaps
/// to ever pass the cutoff, or if no reference in the database does.
pub fn search(
    query: &Profile,
    mut stream: ReferenceStream,
    profile_size: usize,
    max_gaps: usize,
    chunk_size: usize,
) -> Result<BestHit> {
    let query_gaps = query.gap_bits.count_ones();
    if query_gaps >= max_gaps {
        return Ok(BestHit::sentinel(query_gaps));
    }

    let mut best: Option<BestHit> = None;
    let mut batch: Vec<ReferenceRow> = Vec::with_capacity(chunk_size);

    loop {
        batch.clear();
        for _ in 0..chunk_size {
            match stream.next() {
                Some(row) => batch.push(row?),
                None => break,
            }
        }
        if batch.is_empty() {
            break;
        }

        let candidates: Vec<Candidate> =
            batch.drain(..).collect::<Vec<_>>().into_par_iter().map(|row| evaluate_row(query, row, profile_size)).collect();

        for candidate in candidates {
            fold_candidate(&mut best, candidate, max_gaps);
        }
    }

    Ok(best.unwrap_or_else(|| BestHit::sentinel(query_gaps)))
}
