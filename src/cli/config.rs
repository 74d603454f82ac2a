// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// TOML-loadable defaults for the `assign` subcommand's tunables. CLI flags
/// always win; see `merge.rs`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub reference_db: Option<String>,
    pub num_threads: Option<usize>,
    pub batch_size: Option<usize>,
    pub max_gaps: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content).map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# hclink.toml - Configuration file for the `assign` subcommand
# Command line arguments will override these settings

# Reference database directory (same as `assign`'s --reference-db)
reference_db = "db"

# Number of worker threads (omit for auto-detection)
num_threads = 8

# Number of reference rows dispatched to workers per batch
batch_size = 5000

# Override the database's derived max_gaps cutoff
# max_gaps = 301
"#
        .to_string()
    }
}
