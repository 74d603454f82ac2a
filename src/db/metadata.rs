// metadata.rs - Scheme metadata record (metadata.json)

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One record per reference database: the dimensions and HierCC layout
/// needed to encode/decode profiles and project threshold-layer codes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemeMetadata {
    pub version: String,
    pub datestamp: String,
    pub family_sizes: Vec<u32>,
    pub array_size: usize,
    pub max_gaps: usize,
    pub thresholds: Vec<u32>,
    pub prepend: String,
}

impl SchemeMetadata {
    /// Derive `array_size` (`sum(family_sizes) + L`) and `max_gaps`
    /// (`floor(0.1*L) + 1`, unless `max_gaps_override` is given) from
    /// `family_sizes` and the already-parsed HierCC `thresholds`/`prepend`.
    pub fn derive(
        version: String,
        family_sizes: Vec<u32>,
        thresholds: Vec<u32>,
        prepend: String,
        max_gaps_override: Option<usize>,
    ) -> Self {
        let l = family_sizes.len();
        let array_size = family_sizes.iter().map(|&f| f as usize).sum::<usize>() + l;
        let max_gaps = max_gaps_override.unwrap_or_else(|| (l as f64 * 0.1).floor() as usize + 1);
        Self {
            version,
            datestamp: Utc::now().to_rfc3339(),
            family_sizes,
            array_size,
            max_gaps,
            thresholds,
            prepend,
        }
    }

    pub fn locus_count(&self) -> usize {
        self.family_sizes.len()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}
