//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The four records used throughout the end-to-end tests
pub const SAMPLE_SHARDS: [&[&str]; 2] = [
    &[
        r#"{"inputs": "1,x,y,z", "input_label": 1, "classes": 1, "scores": [0.1, 0.9]}"#,
        r#"{"inputs": "0,o,m,g", "input_label": 0, "classes": 0, "scores": [0.7, 0.3]}"#,
    ],
    &[
        r#"{"inputs": "1,o,m,w", "input_label": 1, "classes": 0, "scores": [0.6, 0.4]}"#,
        r#"{"inputs": "1,b,r,b", "input_label": 1, "classes": 1, "scores": [0.2, 0.8]}"#,
    ],
];

/// Mean log loss over [`SAMPLE_SHARDS`]
pub fn sample_log_loss() -> f64 {
    -(0.9f64.ln() + 0.7f64.ln() + 0.4f64.ln() + 0.8f64.ln()) / 4.0
}

/// A temporary prediction output folder
pub struct PredictionDir {
    temp_dir: TempDir,
    root: PathBuf,
}

impl PredictionDir {
    /// Create an empty prediction folder
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("predictions");
        fs::create_dir(&root)?;
        Ok(Self { temp_dir, root })
    }

    /// Create a folder holding [`SAMPLE_SHARDS`]
    pub fn with_sample() -> Result<Self> {
        let dir = Self::new()?;
        let total = SAMPLE_SHARDS.len();
        for (index, lines) in SAMPLE_SHARDS.iter().enumerate() {
            dir.write_shard(index, total, *lines)?;
        }
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Scratch space outside the prediction folder
    pub fn scratch(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn shard_path(&self, index: usize, total: usize) -> PathBuf {
        self.root
            .join(format!("prediction.results-{index:05}-of-{total:05}"))
    }

    /// Write a plain-text shard, one record per line
    pub fn write_shard<S: AsRef<str>>(
        &self,
        index: usize,
        total: usize,
        lines: &[S],
    ) -> Result<PathBuf> {
        let path = self.shard_path(index, total);
        fs::write(&path, join_lines(lines))?;
        Ok(path)
    }

    /// Write a gzip-compressed shard
    pub fn write_gz_shard<S: AsRef<str>>(
        &self,
        index: usize,
        total: usize,
        lines: &[S],
    ) -> Result<PathBuf> {
        let mut path = self.shard_path(index, total).into_os_string();
        path.push(".gz");
        let path = PathBuf::from(path);

        let mut encoder = GzEncoder::new(fs::File::create(&path)?, Compression::default());
        encoder.write_all(join_lines(lines).as_bytes())?;
        encoder.finish()?;
        Ok(path)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join("prediction.summary.json")
    }

    /// Contents of the written summary, if any
    pub fn summary(&self) -> Option<String> {
        fs::read_to_string(self.summary_path()).ok()
    }
}

fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines.iter().fold(String::new(), |mut contents, line| {
        contents.push_str(line.as_ref());
        contents.push('\n');
        contents
    })
}
