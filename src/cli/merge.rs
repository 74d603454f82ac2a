// merge.rs - Merge configuration file with CLI arguments

use crate::cli::args::AssignArgs;
use crate::cli::Config;

impl AssignArgs {
    /// Merge with configuration from file.
    /// CLI arguments take precedence over config file values.
    pub fn merge_with_config(mut self, config: Config) -> Self {
        if self.reference_db.is_none() {
            self.reference_db = config.reference_db;
        }
        if self.num_threads.is_none() {
            self.num_threads = config.num_threads;
        }
        if self.batch_size.is_none() {
            self.batch_size = config.batch_size;
        }
        if self.max_gaps.is_none() {
            self.max_gaps = config.max_gaps;
        }
        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
