// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Log and publish time shifting.

use std::collections::HashSet;

use crate::core::{EditError, Result};

/// Signed nanosecond offsets for log and publish times.
///
/// Both offsets apply independently. With a non-empty topic filter only
/// messages on those topics are shifted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeShift {
    log_offset: Option<i64>,
    publish_offset: Option<i64>,
    topics: HashSet<String>,
}

impl TimeShift {
    /// Create a shift; an empty `topics` set selects every topic.
    pub fn new(log_offset: Option<i64>, publish_offset: Option<i64>, topics: HashSet<String>) -> Self {
        Self {
            log_offset,
            publish_offset,
            topics,
        }
    }

    /// Whether neither offset is configured.
    pub fn is_noop(&self) -> bool {
        self.log_offset.is_none() && self.publish_offset.is_none()
    }

    /// Whether messages on `topic` are shifted.
    pub fn applies_to(&self, topic: &str) -> bool {
        self.topics.is_empty() || self.topics.contains(topic)
    }

    /// Configured log time offset.
    pub fn log_offset(&self) -> Option<i64> {
        self.log_offset
    }

    /// Configured publish time offset.
    pub fn publish_offset(&self) -> Option<i64> {
        self.publish_offset
    }

    /// Shifted `(log_time, publish_time)` for a message on `topic`.
    pub fn apply(&self, topic: &str, log_time: u64, publish_time: u64) -> Result<(u64, u64)> {
        if self.is_noop() || !self.applies_to(topic) {
            return Ok((log_time, publish_time));
        }

        let log_time = match self.log_offset {
            Some(offset) => shift(topic, log_time, offset)?,
            None => log_time,
        };
        let publish_time = match self.publish_offset {
            Some(offset) => shift(topic, publish_time, offset)?,
            None => publish_time,
        };
        Ok((log_time, publish_time))
    }
}

fn shift(topic: &str, time: u64, offset: i64) -> Result<u64> {
    time.checked_add_signed(offset)
        .ok_or_else(|| EditError::time_overflow(topic, time, offset))
}
