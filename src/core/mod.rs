// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout roboedit.
//!
//! - [`EditError`] - Error handling for configuration, I/O, codec and domain failures
//! - [`time`] - Timestamp and duration parsing

pub mod error;
pub mod time;

pub use error::{EditError, Result};
pub use time::{parse_duration, parse_timestamp, TimeParseError};
