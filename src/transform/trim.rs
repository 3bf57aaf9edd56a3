// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Time-window trimming.
//!
//! A window is resolved once per file against the file's first and last
//! message log times:
//!
//! - the start must satisfy `first <= start < last`, otherwise the file fails;
//! - an end beyond `last` is accepted with a warning;
//! - without an end the window closes at `last`.
//!
//! Messages before the start are skipped. The first message past the end
//! stops the whole file, so out-of-order messages after it are not read.

use tracing::warn;

use crate::core::{EditError, Result};

/// What to do with a message given its log time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimDecision {
    /// Inside the window
    Keep,
    /// Before the window start
    Skip,
    /// Past the window end; stop reading the file
    Stop,
}

/// Resolved trim window for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    start: Option<u64>,
    /// Inclusive end; `None` when no trim was requested
    end: Option<i128>,
}

impl TrimWindow {
    /// Window that keeps every message.
    pub fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Resolve the requested bounds against a file's message time range.
    pub fn resolve(
        trim_start: Option<i64>,
        trim_end: Option<i64>,
        message_start: u64,
        message_end: u64,
    ) -> Result<Self> {
        if trim_start.is_none() && trim_end.is_none() {
            return Ok(Self::unbounded());
        }

        let start = match trim_start {
            Some(start) => {
                let value = start as i128;
                if value < message_start as i128 || value >= message_end as i128 {
                    return Err(EditError::trim_out_of_range(start, message_start, message_end));
                }
                Some(start as u64)
            }
            None => None,
        };

        let end = match trim_end {
            Some(end) => {
                if end as i128 > message_end as i128 {
                    warn!(
                        trim_end = end,
                        message_end, "trim end time is after message end time"
                    );
                }
                end as i128
            }
            None => message_end as i128,
        };

        Ok(Self {
            start,
            end: Some(end),
        })
    }

    /// Whether this window can drop anything.
    pub fn is_active(&self) -> bool {
        self.end.is_some()
    }

    /// Decide the fate of a message.
    pub fn decide(&self, log_time: u64) -> TrimDecision {
        if let Some(start) = self.start {
            if log_time < start {
                return TrimDecision::Skip;
            }
        }
        match self.end {
            Some(end) if log_time as i128 > end => TrimDecision::Stop,
            _ => TrimDecision::Keep,
        }
    }
}
