// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for roboedit.
//!
//! Every failure that can abort a run or a single file is an [`EditError`]:
//! - Configuration errors (invalid compression, rename target, time strings)
//! - Filesystem errors (open/create/read/write/stat), always carrying the path
//! - Codec errors raised while reading or writing MCAP records
//! - Domain errors (trim start outside the file's message range, time overflow)
//! - Entropy errors from the random channel-id allocator
//! - Cancellation of a multi-file run

use std::fmt;
use std::path::Path;

/// Errors that can occur while editing MCAP files.
#[derive(Debug, Clone)]
pub enum EditError {
    /// An edit option has an invalid value
    InvalidConfig {
        /// Option name (e.g., "compression", "rename")
        option: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Parse error in a user-supplied value
    ParseError {
        /// What was being parsed
        context: String,
        /// Error message
        message: String,
    },

    /// Filesystem operation failed
    Io {
        /// Offending path
        path: String,
        /// Error message
        message: String,
    },

    /// MCAP record could not be read or written
    Codec {
        /// Codec context (e.g., "McapFileReader", "McapWriter")
        context: String,
        /// Error message
        message: String,
    },

    /// Trim start lies outside `[message_start, message_end)`
    TrimOutOfRange {
        /// Requested trim start (nanoseconds)
        trim_start: i64,
        /// First message log time of the file
        message_start: u64,
        /// Last message log time of the file
        message_end: u64,
    },

    /// A time shift pushed a timestamp outside the representable range
    TimeOverflow {
        /// Topic of the offending message
        topic: String,
        /// Original timestamp
        time: u64,
        /// Configured offset
        offset: i64,
    },

    /// The random source used for channel ids failed or the id space is full
    Entropy {
        /// Error message
        message: String,
    },

    /// The run was cancelled before every file was edited
    Cancelled {
        /// Files edited before the run stopped
        completed: usize,
        /// Files handed to the run
        total: usize,
    },

    /// Other error
    Other(String),
}

impl EditError {
    /// Create an invalid configuration error.
    pub fn invalid_config(option: impl Into<String>, reason: impl Into<String>) -> Self {
        EditError::InvalidConfig {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        EditError::ParseError {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a filesystem error for `path`.
    pub fn io(path: impl AsRef<Path>, err: impl fmt::Display) -> Self {
        EditError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Create a codec error.
    pub fn codec(context: impl Into<String>, message: impl Into<String>) -> Self {
        EditError::Codec {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a trim range error.
    pub fn trim_out_of_range(trim_start: i64, message_start: u64, message_end: u64) -> Self {
        EditError::TrimOutOfRange {
            trim_start,
            message_start,
            message_end,
        }
    }

    /// Create a time overflow error.
    pub fn time_overflow(topic: impl Into<String>, time: u64, offset: i64) -> Self {
        EditError::TimeOverflow {
            topic: topic.into(),
            time,
            offset,
        }
    }

    /// Create an entropy error.
    pub fn entropy(message: impl Into<String>) -> Self {
        EditError::Entropy {
            message: message.into(),
        }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            EditError::InvalidConfig { option, reason } => {
                vec![("option", option.clone()), ("reason", reason.clone())]
            }
            EditError::ParseError { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            EditError::Io { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            EditError::Codec { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            EditError::TrimOutOfRange {
                trim_start,
                message_start,
                message_end,
            } => vec![
                ("trim_start", trim_start.to_string()),
                ("message_start", message_start.to_string()),
                ("message_end", message_end.to_string()),
            ],
            EditError::TimeOverflow {
                topic,
                time,
                offset,
            } => vec![
                ("topic", topic.clone()),
                ("time", time.to_string()),
                ("offset", offset.to_string()),
            ],
            EditError::Entropy { message } => vec![("message", message.clone())],
            EditError::Cancelled { completed, total } => vec![
                ("completed", completed.to_string()),
                ("total", total.to_string()),
            ],
            EditError::Other(msg) => vec![("message", msg.clone())],
        }
    }

    /// Attach the file being processed to the error message.
    ///
    /// Errors that already name a path are returned unchanged.
    pub fn in_file(self, path: impl AsRef<Path>) -> Self {
        match self {
            err @ EditError::Io { .. } => err,
            err => EditError::Other(format!("{}: {err}", path.as_ref().display())),
        }
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::InvalidConfig { option, reason } => {
                write!(f, "Invalid {option}: {reason}")
            }
            EditError::ParseError { context, message } => {
                write!(f, "Parse error in {context}: {message}")
            }
            EditError::Io { path, message } => write!(f, "{path}: {message}"),
            EditError::Codec { context, message } => write!(f, "{context} error: {message}"),
            EditError::TrimOutOfRange {
                trim_start,
                message_start,
                message_end,
            } => {
                if *trim_start < 0 || (*trim_start as u64) < *message_start {
                    write!(
                        f,
                        "trim start time [{trim_start}] is before message start time [{message_start}]"
                    )
                } else {
                    write!(
                        f,
                        "trim start time [{trim_start}] is at or after message end time [{message_end}]"
                    )
                }
            }
            EditError::TimeOverflow {
                topic,
                time,
                offset,
            } => write!(
                f,
                "shifting time {time} by {offset}ns on topic '{topic}' leaves the valid range"
            ),
            EditError::Entropy { message } => {
                write!(f, "channel id generation failed: {message}")
            }
            EditError::Cancelled { completed, total } => {
                write!(f, "edit run cancelled after {completed} of {total} files")
            }
            EditError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EditError {}

impl From<std::io::Error> for EditError {
    fn from(err: std::io::Error) -> Self {
        EditError::Codec {
            context: "IO".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<mcap::McapError> for EditError {
    fn from(err: mcap::McapError) -> Self {
        EditError::Codec {
            context: "MCAP".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for roboedit operations.
pub type Result<T> = std::result::Result<T, EditError>;
