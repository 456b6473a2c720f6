//! Source configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Tunables for a [`DatasetSource`](crate::source::DatasetSource).
///
/// Missing fields fall back to [`SourceOptions::default`], so a partial JSON
/// document such as `{"parallelism": 4}` is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Rows decoded per Parquet batch while a slot streams its partition.
    pub batch_size: usize,
    /// Number of execution slots.
    pub parallelism: usize,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            batch_size: 8 * 1024,
            parallelism: num_cpus::get().max(1),
        }
    }
}

impl SourceOptions {
    /// Parse options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this struct.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let opts = serde_json::from_str(s).map_err(anyhow::Error::from)?;
        Ok(opts)
    }
}
