//! Prediction records and line-delimited JSON decoding
//!
//! A shard is a sequence of JSON objects, one per line. [`RecordReader`]
//! turns any buffered reader over a shard into a lazy sequence of decoded
//! records, tagging failures with the shard path and 1-based line number.

use crate::error::{Result, SummaryError};
use serde_json::{Map, Value};
use std::io::{BufRead, ErrorKind, Lines};
use std::path::{Path, PathBuf};

/// One prediction instance: a JSON object decoded from a single shard line
pub type Record = Map<String, Value>;

/// Decode a single line into a record
///
/// The line must hold exactly one JSON object. Arrays, scalars, and blank
/// lines are rejected so that a malformed shard is never silently skipped.
pub fn decode_line(line: &str) -> std::result::Result<Record, serde_json::Error> {
    serde_json::from_str(line)
}

/// Read a numeric value, accepting JSON numbers and numeric strings
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Lazy decoder over the lines of one shard
pub struct RecordReader<R> {
    shard: PathBuf,
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> RecordReader<R> {
    /// Create a reader for the shard at `shard`
    pub fn new(shard: &Path, reader: R) -> Self {
        Self {
            shard: shard.to_path_buf(),
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Line number of the most recently yielded record
    pub fn line(&self) -> usize {
        self.line
    }

    /// Path of the shard being read
    pub fn shard(&self) -> &Path {
        &self.shard
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line += 1;

        let decoded = match line {
            Ok(text) => decode_line(&text).map_err(|source| SummaryError::RecordDecode {
                shard: self.shard.clone(),
                line: self.line,
                source,
            }),
            // Invalid UTF-8 counts as a decode error, never retried
            Err(e) if e.kind() == ErrorKind::InvalidData => Err(SummaryError::RecordDecode {
                shard: self.shard.clone(),
                line: self.line,
                source: serde_json::Error::io(e),
            }),
            Err(e) => Err(SummaryError::io(&self.shard, e)),
        };
        Some(decoded)
    }
}
