//! Local filesystem shard store

use super::{summary_path, ShardStore, SHARD_PATTERN};
use crate::error::{Result, SummaryError};
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Reads shards from and writes the summary to the local filesystem
///
/// Shards whose name ends in `.gz` are decompressed while reading. The
/// summary is written to a temporary file in the same directory and then
/// renamed over the target, so readers never observe a partial summary.
#[derive(Debug, Clone, Default)]
pub struct LocalShardStore;

impl LocalShardStore {
    pub fn new() -> Self {
        Self
    }

    /// Glob pattern matching the shards under `prediction_path`
    ///
    /// The prefix is escaped so that glob metacharacters in directory names
    /// are matched literally.
    pub fn shard_glob(prediction_path: &Path) -> String {
        let prefix = glob::Pattern::escape(&prediction_path.to_string_lossy());
        if prefix.is_empty() {
            SHARD_PATTERN.to_string()
        } else {
            format!("{}/{}", prefix.trim_end_matches('/'), SHARD_PATTERN)
        }
    }
}

impl ShardStore for LocalShardStore {
    fn list_shards(&self, prediction_path: &Path) -> Result<Vec<PathBuf>> {
        // A missing prefix is an input error, unlike an existing one with no shards
        if !prediction_path.as_os_str().is_empty() {
            fs::metadata(prediction_path).map_err(|e| SummaryError::io(prediction_path, e))?;
        }

        let pattern = Self::shard_glob(prediction_path);
        debug!("Listing shards matching {}", pattern);

        let entries = glob::glob(&pattern)
            .map_err(|e| SummaryError::config("prediction_path", e.to_string()))?;

        let mut shards = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                SummaryError::io(path, e.into_error())
            })?;
            if path.is_file() {
                shards.push(path);
            }
        }
        shards.sort();
        Ok(shards)
    }

    fn open_shard(&self, shard: &Path) -> Result<Box<dyn BufRead + Send>> {
        let file = File::open(shard).map_err(|e| SummaryError::io(shard, e))?;

        let is_gzip = shard
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
        if is_gzip {
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }

    fn write_summary(&self, prediction_path: &Path, contents: &[u8]) -> Result<PathBuf> {
        let target = summary_path(prediction_path);
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| SummaryError::io(dir, e))?;
        temp.write_all(contents)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| SummaryError::io(temp.path(), e))?;
        temp.persist(&target)
            .map_err(|e| SummaryError::io(&target, e.error))?;

        debug!("Wrote summary to {}", target.display());
        Ok(target)
    }
}
