//! In-memory shard store
//!
//! Keeps shards and summaries in a map so jobs can run without touching the
//! filesystem. Reads can be made to fail a fixed number of times to exercise
//! the runner's retry path.

use super::{is_shard_name, summary_path, ShardStore};
use crate::error::{Result, SummaryError};
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryShardStore {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    pending_failures: Mutex<HashMap<PathBuf, usize>>,
    opens: AtomicUsize,
    lists: AtomicUsize,
}

impl InMemoryShardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a shard built from one JSON line per entry
    pub fn with_shard<I, S>(self, shard: impl Into<PathBuf>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut contents = String::new();
        for line in lines {
            contents.push_str(line.as_ref());
            contents.push('\n');
        }
        self.insert(shard, contents.into_bytes());
        self
    }

    /// Store raw bytes at `path`
    pub fn insert(&self, path: impl Into<PathBuf>, contents: Vec<u8>) {
        lock(&self.files).insert(path.into(), contents);
    }

    /// Make the next `times` opens of `shard` fail with a transient error
    pub fn fail_next_reads(&self, shard: impl Into<PathBuf>, times: usize) {
        lock(&self.pending_failures).insert(shard.into(), times);
    }

    /// Contents of the summary under `prediction_path`, if one was written
    pub fn summary(&self, prediction_path: &Path) -> Option<String> {
        lock(&self.files)
            .get(&summary_path(prediction_path))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Number of `open_shard` calls so far, including failed ones
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of `list_shards` calls so far
    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

impl ShardStore for InMemoryShardStore {
    fn list_shards(&self, prediction_path: &Path) -> Result<Vec<PathBuf>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.files)
            .keys()
            .filter(|path| path.parent() == Some(prediction_path))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(is_shard_name)
            })
            .cloned()
            .collect())
    }

    fn open_shard(&self, shard: &Path) -> Result<Box<dyn BufRead + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        if let Some(remaining) = lock(&self.pending_failures).get_mut(shard) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SummaryError::io(
                    shard,
                    std::io::Error::new(ErrorKind::Interrupted, "injected read failure"),
                ));
            }
        }

        let contents = lock(&self.files)
            .get(shard)
            .cloned()
            .ok_or_else(|| SummaryError::io(shard, ErrorKind::NotFound.into()))?;
        Ok(Box::new(Cursor::new(contents)))
    }

    fn write_summary(&self, prediction_path: &Path, contents: &[u8]) -> Result<PathBuf> {
        let target = summary_path(prediction_path);
        self.insert(target.clone(), contents.to_vec());
        Ok(target)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
