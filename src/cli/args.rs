// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// hclink - nearest-ST assignment and HierCC clonal-complex inference for bacterial cgMLST profiles
pub struct Args {
    /// print a commented sample TOML config to stdout and exit
    #[argh(switch, short = 'g')]
    pub generate_config: bool,

    #[argh(subcommand)]
    pub command: Option<Command>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
pub enum Command {
    Build(BuildArgs),
    WriteDb(WriteDbArgs),
    Assign(AssignArgs),
}

/// download upstream profiles/HierCC/alleles for a species, then write the database
#[derive(FromArgs)]
#[argh(subcommand, name = "build")]
pub struct BuildArgs {
    /// software release tag stamped into metadata.json
    #[argh(option)]
    pub version: String,

    /// API key for the HierCC endpoint (HTTP Basic auth)
    #[argh(option, long = "api-key")]
    pub api_key: String,

    /// species scheme key, looked up in schemes.json
    #[argh(option, short = 's')]
    pub species: String,

    /// directory to hold downloaded inputs and the built database
    #[argh(option, short = 'd', default = "String::from(\"db\")")]
    pub downloads: String,

    /// remove the downloaded profiles/HierCC files after a successful build
    #[argh(switch)]
    pub clean: bool,
}

/// write a database directory from already-downloaded inputs
#[derive(FromArgs)]
#[argh(subcommand, name = "write-db")]
pub struct WriteDbArgs {
    /// software release tag stamped into metadata.json
    #[argh(option)]
    pub version: String,

    /// gzipped profiles CSV/TSV location
    #[argh(option, long = "profiles-csv", default = "String::from(\"db/cgmlst_profiles.csv.gz\")")]
    pub profiles_csv: String,

    /// gzipped HierCC profiles JSON location
    #[argh(option, long = "hiercc-profiles-json", default = "String::from(\"db/hiercc_profiles.json.gz\")")]
    pub hiercc_profiles_json: String,

    /// directory to write the database into
    #[argh(option, short = 'd', long = "db-dir", default = "String::from(\"db\")")]
    pub db_dir: String,

    /// directory of gzipped per-locus FASTA files, for allele-hash store ingestion
    #[argh(option, long = "alleles-dir")]
    pub alleles_dir: Option<String>,

    /// override the derived max_gaps cutoff
    #[argh(option, long = "max-gaps")]
    pub max_gaps: Option<usize>,
}

/// assign a query cgMLST profile to its nearest ST and infer its HierCC code
#[derive(FromArgs)]
#[argh(subcommand, name = "assign")]
pub struct AssignArgs {
    /// query JSON file path, or '-' for JSON on stdin
    #[argh(positional)]
    pub query: String,

    /// TOML config file pre-populating the flags below
    #[argh(option)]
    pub config: Option<String>,

    /// reference database directory
    #[argh(option, long = "reference-db")]
    pub reference_db: Option<String>,

    /// number of worker threads (default: hardware concurrency)
    #[argh(option, long = "num-threads")]
    pub num_threads: Option<usize>,

    /// number of reference rows dispatched to workers per batch
    #[argh(option, long = "batch-size")]
    pub batch_size: Option<usize>,

    /// override the database's derived max_gaps cutoff
    #[argh(option, long = "max-gaps")]
    pub max_gaps: Option<usize>,
}
