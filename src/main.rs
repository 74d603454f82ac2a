// main.rs - CLI entry point

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};

use hclink::alleles::{AlleleHashStore, StoreResolver};
use hclink::cli::{AssignArgs, BuildArgs, Command, Config, WriteDbArgs};
use hclink::db::{discover_family_sizes, parse_hiercc_json, write_database};
use hclink::download::{download_hiercc_profiles, download_profiles, get_species_scheme};
use hclink::prelude::*;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let args: hclink::cli::Args = argh::from_env();

    if args.generate_config {
        println!("{}", Config::generate_sample());
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    println!("🚀 hclink v{}", hclink::VERSION);

    match args.command {
        Some(Command::Build(build_args)) => run_build(build_args),
        Some(Command::WriteDb(write_db_args)) => run_write_db(write_db_args),
        Some(Command::Assign(assign_args)) => run_assign(assign_args),
        None => Err("no subcommand given; run with --help for usage".to_string()),
    }
}

/// Read a gzip-compressed file into a `String` in full. Every gzipped input
/// this crate ingests (profiles CSV, HierCC JSON) is small enough to hold in
/// memory at build time -- it's the reference streams (`profiles.xz` and
/// friends) that matter for query-time memory, and those are never loaded
/// whole.
fn read_gz_to_string(path: &Path) -> Result<String, String> {
    let file = File::open(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    let mut decoder = GzDecoder::new(file);
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|e| format!("decompressing {}: {e}", path.display()))?;
    Ok(text)
}

/// Locus names in scheme order, read off the profiles CSV's header row
/// (first column is `ST`, the rest are locus names).
fn locus_names_from_profiles(profiles_text: &str) -> Vec<String> {
    profiles_text
        .lines()
        .next()
        .map(|header| header.split('\t').skip(1).map(str::to_string).collect())
        .unwrap_or_default()
}

fn run_build(args: BuildArgs) -> Result<(), String> {
    let downloads_dir = PathBuf::from(&args.downloads);
    std::fs::create_dir_all(&downloads_dir).map_err(|e| format!("creating '{}': {e}", downloads_dir.display()))?;

    let schemes_path = Path::new("schemes.json");
    let scheme = get_species_scheme(&args.species, schemes_path).map_err(|e| e.to_string())?;
    println!("🧬 Species: {} ({})", args.species, scheme.hiercc_url);

    println!("⬇️  Downloading HierCC profiles...");
    let hiercc_path = download_hiercc_profiles(&scheme.hiercc_url, &args.api_key, &downloads_dir, 10_000, 1_000_000)
        .map_err(|e| e.to_string())?;
    println!("✅ Downloaded HierCC profiles to {}", hiercc_path.display());

    println!("⬇️  Downloading cgMLST profiles...");
    let profiles_path = download_profiles(&scheme.profiles_url, &downloads_dir).map_err(|e| e.to_string())?;
    println!("✅ Downloaded profiles to {}", profiles_path.display());

    let metadata = write_db_from_paths(&args.version, &profiles_path, &hiercc_path, None, &downloads_dir, None)?;
    println!("📦 Database written to {} ({} loci)", downloads_dir.display(), metadata.locus_count());

    if args.clean {
        let _ = std::fs::remove_file(&profiles_path);
        let _ = std::fs::remove_file(&hiercc_path);
        println!("🧹 Removed downloaded intermediates");
    }

    Ok(())
}

fn run_write_db(args: WriteDbArgs) -> Result<(), String> {
    let db_dir = PathBuf::from(&args.db_dir);
    std::fs::create_dir_all(&db_dir).map_err(|e| format!("creating '{}': {e}", db_dir.display()))?;

    let metadata = write_db_from_paths(
        &args.version,
        Path::new(&args.profiles_csv),
        Path::new(&args.hiercc_profiles_json),
        args.alleles_dir.as_deref().map(Path::new),
        &db_dir,
        args.max_gaps,
    )?;
    println!(
        "📦 Database written to {} ({} loci, max_gaps={})",
        db_dir.display(),
        metadata.locus_count(),
        metadata.max_gaps
    );
    Ok(())
}

fn write_db_from_paths(
    version: &str,
    profiles_csv_gz: &Path,
    hiercc_json_gz: &Path,
    alleles_dir: Option<&Path>,
    db_dir: &Path,
    max_gaps_override: Option<usize>,
) -> Result<hclink::prelude::SchemeMetadata, String> {
    let profiles_text = read_gz_to_string(profiles_csv_gz)?;
    let hiercc_text = read_gz_to_string(hiercc_json_gz)?;

    let loci = locus_names_from_profiles(&profiles_text);
    let family_sizes = discover_family_sizes(&profiles_text).map_err(|e| e.to_string())?;
    let hiercc = parse_hiercc_json(&hiercc_text).map_err(|e| e.to_string())?;
    println!(
        "📐 Scheme dimensions: {} loci, {} thresholds ({})",
        family_sizes.len(),
        hiercc.thresholds.len(),
        hiercc.prepend
    );

    if let Some(alleles_dir) = alleles_dir {
        println!("🔑 Ingesting allele checksums from {}...", alleles_dir.display());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} ({elapsed_precise})")
            .expect("static template is valid"),
    );
    pb.set_message("streaming profiles → database");
    pb.enable_steady_tick(Duration::from_millis(120));

    let start = Instant::now();
    let metadata = write_database(version, &profiles_text, &hiercc_text, alleles_dir, &loci, db_dir, max_gaps_override)
        .map_err(|e| e.to_string())?;

    pb.finish_and_clear();
    println!("⏱️  Wrote database in {:.1}s", start.elapsed().as_secs_f64());
    Ok(metadata)
}

fn run_assign(args: AssignArgs) -> Result<(), String> {
    let config_path = args.config.clone();
    let args = match config_path {
        Some(path) => args.with_config_file(&path)?,
        None => args,
    };

    let reference_db = PathBuf::from(args.reference_db.as_deref().unwrap_or("db"));
    let metadata_path = reference_db.join("metadata.json");
    let metadata = SchemeMetadata::load(&metadata_path).map_err(|e| e.to_string())?;
    let max_gaps = args.max_gaps.unwrap_or(metadata.max_gaps);

    if let Some(n) = args.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("configuring thread pool: {e}"))?;
        println!("🧵 Threads: {n}");
    } else {
        println!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads());
    }

    let query_text = read_query_input(&args.query)?;
    let query_json: serde_json::Value = serde_json::from_str(&query_text).map_err(|e| format!("parsing query JSON: {e}"))?;
    let code = query_json
        .get("code")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "query JSON is missing a string \"code\" field".to_string())?;

    let alleles_path = reference_db.join("alleles.db");
    let resolver: Box<dyn AlleleResolver> = if alleles_path.exists() {
        let store = AlleleHashStore::open_readonly(&alleles_path).map_err(|e| e.to_string())?;
        Box::new(StoreResolver::new(store))
    } else {
        Box::new(NullResolver)
    };

    let query = encode(code, &metadata.family_sizes, metadata.array_size, resolver.as_ref()).map_err(|e| e.to_string())?;

    let batch_size = args.batch_size.unwrap_or(5_000);
    let start = Instant::now();
    let stream = ReferenceStream::open(&reference_db, metadata.array_size, metadata.locus_count()).map_err(|e| e.to_string())?;
    let hit = search(&query, stream, metadata.locus_count(), max_gaps, batch_size).map_err(|e| e.to_string())?;
    eprintln!("🔍 Searched reference database in {:.2}s", start.elapsed().as_secs_f64());

    let result = QueryResult::from_best_hit(&hit, hclink::VERSION, &metadata.datestamp, &metadata.thresholds, &metadata.prepend)
        .map_err(|e| e.to_string())?;
    println!("{}", serde_json::to_string(&result).map_err(|e| e.to_string())?);

    Ok(())
}

fn read_query_input(query: &str) -> Result<String, String> {
    if query == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map_err(|e| format!("reading stdin: {e}"))?;
        Ok(text)
    } else {
        std::fs::read_to_string(query).map_err(|e| format!("reading '{query}': {e}"))
    }
}
