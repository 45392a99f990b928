//! Shard discovery, shard reading, and summary persistence
//!
//! The job only talks to storage through [`ShardStore`]. Shards live next to
//! each other under a prediction path `P`:
//!
//! ```text
//! P/prediction.results-00000-of-00002
//! P/prediction.results-00001-of-00002
//! P/prediction.summary.json            <- written by the job
//! ```

pub mod local;
pub mod memory;

pub use local::LocalShardStore;
pub use memory::InMemoryShardStore;

use crate::error::Result;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// File name pattern of prediction result shards
pub const SHARD_PATTERN: &str = "prediction.results-*-of-*";

/// File name of the summary written next to the shards
pub const SUMMARY_FILE_NAME: &str = "prediction.summary.json";

/// Storage backend holding prediction shards and the summary
pub trait ShardStore: Send + Sync {
    /// List every shard under `prediction_path`, in a stable order
    ///
    /// A prefix with no matching shard yields an empty list, not an error.
    fn list_shards(&self, prediction_path: &Path) -> Result<Vec<PathBuf>>;

    /// Open one shard for line-by-line reading
    fn open_shard(&self, shard: &Path) -> Result<Box<dyn BufRead + Send>>;

    /// Replace the summary under `prediction_path` with `contents`
    ///
    /// Returns the location written.
    fn write_summary(&self, prediction_path: &Path, contents: &[u8]) -> Result<PathBuf>;
}

/// Location of the summary for a prediction path
pub fn summary_path(prediction_path: &Path) -> PathBuf {
    prediction_path.join(SUMMARY_FILE_NAME)
}

/// Whether a file name matches [`SHARD_PATTERN`]
pub fn is_shard_name(file_name: &str) -> bool {
    glob::Pattern::new(SHARD_PATTERN)
        .map(|pattern| pattern.matches(file_name))
        .unwrap_or(false)
}
