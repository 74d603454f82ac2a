// end_to_end.rs - Exercises the public `hclink` API across the full
// build -> search -> output pipeline, against the seeded L=5 fixture from
// the scheme's worked examples (family_sizes = [3, 2, 1, 4, 2]).

use hclink::db::write_database;
use hclink::prelude::*;

const PROFILES: &str = "\
ST\tlocusA\tlocusB\tlocusC\tlocusD\tlocusE
1\t1\t1\t1\t1\t1
2\t2\t1\t1\t1\t1
3\t1\t2\t1\t1\t2
4\t3\t1\t1\t4\t1
";

const HIERCC_JSON: &str = r#"[
    {"ST_id": "1", "info": {"hierCC": {"d0": "c1", "d2": "c1", "d5": "c1"}}},
    {"ST_id": "2", "info": {"hierCC": {"d0": "c2", "d2": "c1", "d5": "c1"}}},
    {"ST_id": "3", "info": {"hierCC": {"d0": "c3", "d2": "c3", "d5": "c1"}}},
    {"ST_id": "4", "info": {"hierCC": {"d0": "c4", "d2": "c4", "d5": "c4"}}}
]"#;

fn build_fixture_db(dir: &std::path::Path, max_gaps: Option<usize>) -> SchemeMetadata {
    write_database("test-1.0", PROFILES, HIERCC_JSON, None, &[], dir, max_gaps).unwrap()
}

#[test]
fn scheme_dimensions_match_the_worked_example() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = build_fixture_db(dir.path(), None);
    assert_eq!(metadata.family_sizes, vec![3, 2, 1, 4, 2]);
    assert_eq!(metadata.array_size, 17);
    assert_eq!(metadata.thresholds, vec![0, 2, 5]);
    assert_eq!(metadata.prepend, "d");
}

#[test]
fn nearest_st_is_found_with_one_allelic_difference() {
    let dir = tempfile::tempdir().unwrap();
    // default max_gaps = floor(0.1*5)+1 = 1, too tight for a meaningful
    // scan once gap-bearing ST 3 is in the reference, so override it.
    let metadata = build_fixture_db(dir.path(), Some(5));

    // Query matches ST 1 exactly except locus A (value 2), same as ST 2.
    let query = encode("2_1_1_1_1", &metadata.family_sizes, metadata.array_size, &NullResolver).unwrap();
    let stream = ReferenceStream::open(dir.path(), metadata.array_size, metadata.locus_count()).unwrap();
    let hit = search(&query, stream, metadata.locus_count(), metadata.max_gaps, 2).unwrap();

    assert_eq!(hit.st_id, "2");
    assert_eq!(hit.distance, 0);
    assert_eq!(hit.hiercc_distance, 0.0);
}

#[test]
fn nearest_st_breaks_a_distance_tie_on_lexicographically_smaller_st_id() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = build_fixture_db(dir.path(), Some(5));

    // Differs from both ST 1 and ST 4 by exactly one allele (locus D), with
    // zero gaps on either side -- an exact tie on both HierCC distance and
    // total gaps, broken by the ST_id ordering rule in the search reducer.
    let query = encode("1_1_1_4_1", &metadata.family_sizes, metadata.array_size, &NullResolver).unwrap();
    let stream = ReferenceStream::open(dir.path(), metadata.array_size, metadata.locus_count()).unwrap();
    let hit = search(&query, stream, metadata.locus_count(), metadata.max_gaps, 4).unwrap();

    assert_eq!(hit.st_id, "1");
    assert_eq!(hit.distance, 1);
}

#[test]
fn query_result_json_projects_hiercc_codes_per_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = build_fixture_db(dir.path(), Some(5));

    let query = encode("1_1_1_1_1", &metadata.family_sizes, metadata.array_size, &NullResolver).unwrap();
    let stream = ReferenceStream::open(dir.path(), metadata.array_size, metadata.locus_count()).unwrap();
    let hit = search(&query, stream, metadata.locus_count(), metadata.max_gaps, 4).unwrap();

    let result =
        QueryResult::from_best_hit(&hit, "0.1.0", &metadata.datestamp, &metadata.thresholds, &metadata.prepend).unwrap();
    assert_eq!(result.closest_st, "1");
    assert_eq!(result.distance, Some(0));
    assert_eq!(result.hiercc_distance, Some(0.0));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["hierCC"][0][0], "d0");
    assert_eq!(json["hierCC"][0][1], "c1");
}

#[test]
fn max_gaps_cutoff_excludes_references_at_the_boundary_and_includes_one_below() {
    let dir = tempfile::tempdir().unwrap();
    // Query has 2 gaps of its own (loci B, C); the single reference (ST 1)
    // has 1 gap of its own (locus A, disjoint from the query's), for 3
    // combined gaps total. `max_gaps` is passed to `search` directly,
    // independent of the database's own derived default, mirroring
    // `assign --max-gaps`.
    let profiles = "ST\tlocusA\tlocusB\tlocusC\n1\t0\t1\t1\n";
    let hiercc_json = r#"[{"ST_id": "1", "info": {"hierCC": {"d0": "c1"}}}]"#;
    let metadata = write_database("test-1.0", profiles, hiercc_json, None, &[], dir.path(), None).unwrap();

    let query = encode("1__", &metadata.family_sizes, metadata.array_size, &NullResolver).unwrap();

    let stream_excluded = ReferenceStream::open(dir.path(), metadata.array_size, metadata.locus_count()).unwrap();
    let sentinel = search(&query, stream_excluded, metadata.locus_count(), 3, 4).unwrap();
    assert_eq!(sentinel.st_id, "", "combined gaps == max_gaps must be excluded");
    assert_eq!(sentinel.distance, i64::MAX);

    let stream_included = ReferenceStream::open(dir.path(), metadata.array_size, metadata.locus_count()).unwrap();
    let hit = search(&query, stream_included, metadata.locus_count(), 4, 4).unwrap();
    assert_eq!(hit.st_id, "1", "combined gaps == max_gaps - 1 must be included");
    assert_eq!(hit.distance, 0);
}

#[test]
fn query_with_too_many_gaps_short_circuits_to_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = build_fixture_db(dir.path(), Some(2));

    // All five loci are gaps -- well past any max_gaps cutoff. 5 loci need
    // 4 separating underscores to split into 5 empty tokens.
    let query = encode("____", &metadata.family_sizes, metadata.array_size, &NullResolver).unwrap();
    let stream = ReferenceStream::open(dir.path(), metadata.array_size, metadata.locus_count()).unwrap();
    let hit = search(&query, stream, metadata.locus_count(), metadata.max_gaps, 4).unwrap();

    assert_eq!(hit.distance, i64::MAX);
    assert_eq!(hit.r_only_gaps, -1);
    assert_eq!(hit.st_id, "");

    let result =
        QueryResult::from_best_hit(&hit, "0.1.0", &metadata.datestamp, &metadata.thresholds, &metadata.prepend).unwrap();
    assert_eq!(result.distance, None);
    assert_eq!(result.hiercc_distance, None);
}

#[test]
fn empty_reference_database_yields_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let empty_profiles = "ST\tlocusA\tlocusB\tlocusC\tlocusD\tlocusE\n";
    let metadata = write_database("test-1.0", empty_profiles, HIERCC_JSON, None, &[], dir.path(), Some(5)).unwrap();

    let query = encode("1_1_1_1_1", &metadata.family_sizes, metadata.array_size, &NullResolver).unwrap();
    let stream = ReferenceStream::open(dir.path(), metadata.array_size, metadata.locus_count()).unwrap();
    let hit = search(&query, stream, metadata.locus_count(), metadata.max_gaps, 4).unwrap();

    assert_eq!(hit.distance, i64::MAX);
    assert_eq!(hit.st_id, "");
}
