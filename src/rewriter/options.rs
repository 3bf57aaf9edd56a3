// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Edit options and their resolution into an immutable [`EditConfig`].
//!
//! [`EditOptions`] is the raw, string-typed layer shared by the command line
//! and TOML edit plans:
//!
//! ```toml
//! delete = ["/debug"]
//! trim-start = "2024-05-01T10:00:00Z"
//! shift-log = "-1h"
//! compression = "lz4"
//!
//! [rename]
//! "/camera" = "/front_camera"
//! ```
//!
//! [`EditOptions::resolve`] parses every time string and validates every
//! value once, before any file is opened.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{parse_duration, parse_timestamp, EditError, Result};
use crate::io::writer::{Compression, CompressionLevel, WriterOptions};
use crate::transform::{TimeShift, TopicRenameTransform};

/// Raw edit options, as given on the command line or in a plan file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EditOptions {
    /// Topic renames: old topic -> new topic (must start with `/`)
    pub rename: BTreeMap<String, String>,
    /// Topics to remove
    pub delete: Vec<String>,
    /// Drop messages logged before this timestamp
    pub trim_start: Option<String>,
    /// Stop at the first message logged after this timestamp
    pub trim_end: Option<String>,
    /// Log time offset (duration string)
    pub shift_log: Option<String>,
    /// Publish time offset (duration string)
    pub shift_pub: Option<String>,
    /// Topics the shifts apply to (empty = all)
    pub topics: Vec<String>,
    /// Output compression: zstd, lz4 or none
    pub compression: Option<String>,
    /// Compression level ordinal: 0 default, 1 fastest, 2 better, 3 best
    pub compression_level: Option<u8>,
    /// Target chunk size in bytes
    pub chunk_size: Option<usize>,
    /// Write messages outside chunks
    pub no_chunking: bool,
    /// Skip CRC computation
    pub no_crc: bool,
    /// Skip message indexes, chunk indexes and summary offsets
    pub no_index: bool,
    /// Worker threads
    pub jobs: Option<usize>,
}

impl EditOptions {
    /// Load an edit plan from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| EditError::io(path, e))?;
        Self::from_toml_str(&contents)
            .map_err(|e| EditError::parse(format!("edit plan {}", path.display()), e.to_string()))
    }

    /// Parse an edit plan from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| EditError::parse("edit plan", e.to_string()))
    }

    /// Layer `overrides` on top of these options.
    ///
    /// Scalar values set in `overrides` win. Rename entries are merged by
    /// source topic. A non-empty list replaces the list. Flags are OR-ed.
    pub fn merge(mut self, overrides: EditOptions) -> EditOptions {
        self.rename.extend(overrides.rename);
        if !overrides.delete.is_empty() {
            self.delete = overrides.delete;
        }
        if !overrides.topics.is_empty() {
            self.topics = overrides.topics;
        }
        self.trim_start = overrides.trim_start.or(self.trim_start);
        self.trim_end = overrides.trim_end.or(self.trim_end);
        self.shift_log = overrides.shift_log.or(self.shift_log);
        self.shift_pub = overrides.shift_pub.or(self.shift_pub);
        self.compression = overrides.compression.or(self.compression);
        self.compression_level = overrides.compression_level.or(self.compression_level);
        self.chunk_size = overrides.chunk_size.or(self.chunk_size);
        self.jobs = overrides.jobs.or(self.jobs);
        self.no_chunking |= overrides.no_chunking;
        self.no_crc |= overrides.no_crc;
        self.no_index |= overrides.no_index;
        self
    }

    /// Add `old=/new` rename pairs.
    pub fn add_rename_pairs<I, S>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pair in pairs {
            let pair = pair.as_ref().trim();
            if pair.is_empty() {
                continue;
            }
            let (old, new) = pair.split_once('=').ok_or_else(|| {
                EditError::invalid_config("rename", format!("'{pair}', expected old=/new"))
            })?;
            self.rename
                .insert(old.trim().to_string(), new.trim().to_string());
        }
        Ok(())
    }

    /// Whether no edit or re-encoding was requested.
    pub fn nothing_to_do(&self) -> bool {
        self.rename.is_empty()
            && non_empty(&self.delete).next().is_none()
            && non_empty(&self.topics).next().is_none()
            && self.trim_start.is_none()
            && self.trim_end.is_none()
            && self.shift_log.is_none()
            && self.shift_pub.is_none()
            && self.compression.is_none()
            && self.compression_level.is_none()
            && self.chunk_size.is_none()
            && !self.no_chunking
            && !self.no_crc
            && !self.no_index
    }

    /// Validate and parse into an [`EditConfig`].
    pub fn resolve(&self) -> Result<EditConfig> {
        let delete: HashSet<String> = non_empty(&self.delete).map(str::to_string).collect();

        let mut rename = TopicRenameTransform::new();
        for (old, new) in &self.rename {
            rename.add_mapping(old.as_str(), new.as_str())?;
        }
        let overlapping: Vec<String> = rename
            .sources()
            .filter(|topic| delete.contains(*topic))
            .map(str::to_string)
            .collect();
        for topic in overlapping {
            warn!(topic = %topic, "topic is both renamed and deleted, deleting it");
            rename.remove(&topic);
        }

        let trim_start = parse_time_option("trim start", self.trim_start.as_deref())?;
        let trim_end = parse_time_option("trim end", self.trim_end.as_deref())?;
        let log_offset = parse_duration_option("shift log", self.shift_log.as_deref())?;
        let publish_offset = parse_duration_option("shift pub", self.shift_pub.as_deref())?;
        let topics: HashSet<String> = non_empty(&self.topics).map(str::to_string).collect();

        let mut writer = WriterOptions::default();
        if let Some(compression) = &self.compression {
            writer.compression = compression.parse::<Compression>()?;
        }
        if let Some(level) = self.compression_level {
            writer.compression_level = CompressionLevel::try_from(level)?;
        }
        if let Some(size) = self.chunk_size {
            if size == 0 {
                return Err(EditError::invalid_config(
                    "chunk size",
                    "must be greater than zero",
                ));
            }
            writer.chunk_size = size;
        }
        writer.chunked = !self.no_chunking;
        writer.include_crc = !self.no_crc;
        if self.no_index {
            writer = writer.indexed(false);
        }

        if self.jobs == Some(0) {
            return Err(EditError::invalid_config("jobs", "must be at least 1"));
        }

        Ok(EditConfig {
            rename,
            delete,
            trim_start,
            trim_end,
            time_shift: TimeShift::new(log_offset, publish_offset, topics),
            writer,
            jobs: self.jobs,
        })
    }
}

fn non_empty(list: &[String]) -> impl Iterator<Item = &str> {
    list.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn parse_time_option(option: &str, value: Option<&str>) -> Result<Option<i64>> {
    value
        .map(|s| parse_timestamp(s).map_err(|e| EditError::parse(option, e.to_string())))
        .transpose()
}

fn parse_duration_option(option: &str, value: Option<&str>) -> Result<Option<i64>> {
    value
        .map(|s| parse_duration(s).map_err(|e| EditError::parse(option, e.to_string())))
        .transpose()
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct EditConfig {
    /// Topic renames
    pub rename: TopicRenameTransform,
    /// Topics to remove
    pub delete: HashSet<String>,
    /// Trim start (Unix ns)
    pub trim_start: Option<i64>,
    /// Trim end (Unix ns)
    pub trim_end: Option<i64>,
    /// Log/publish time offsets
    pub time_shift: TimeShift,
    /// Output encoding
    pub writer: WriterOptions,
    /// Worker thread override
    pub jobs: Option<usize>,
}

impl EditConfig {
    /// Whether messages on `topic` are dropped.
    pub fn is_deleted(&self, topic: &str) -> bool {
        self.delete.contains(topic)
    }
}
