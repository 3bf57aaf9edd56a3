// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Roboedit
//!
//! Bulk editor for MCAP robotics log files.
//!
//! Every input file is streamed into a new file in the output directory,
//! with any combination of:
//! - topic deletion and renaming
//! - trimming to a log-time window
//! - log/publish time shifts
//! - re-encoding (zstd, lz4 or uncompressed chunks, CRCs, indexes)
//!
//! Files are processed in parallel; the first failure cancels the run.
//!
//! ## Architecture
//!
//! - `core/` - Errors and time parsing
//! - `io/` - MCAP reader/writer, record types, file discovery
//! - `transform/` - Per-message primitives (trim, rename, time shift)
//! - `rewriter/` - Options, per-file engine and the worker pipeline
//!
//! ## Example
//!
//! ```rust,no_run
//! # fn main() -> roboedit::Result<()> {
//! use std::sync::Arc;
//! use roboedit::{collect_mcap_files, DispatchPipeline, EditOptions, McapEditor};
//!
//! let mut options = EditOptions::default();
//! options.delete.push("/camera/raw".to_string());
//! options.add_rename_pairs(["/imu=/imu/data"])?;
//!
//! let config = Arc::new(options.resolve()?);
//! let files = collect_mcap_files("recordings/")?;
//! let report = DispatchPipeline::new(McapEditor::new(config, "edited/")).run(&files)?;
//! println!("{} files, {} messages", report.completed.len(), report.messages_written());
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{EditError, Result};

// MCAP codec and file handling
pub mod io;

pub use io::{
    collect_edit_inputs, collect_mcap_files, ensure_distinct_output, ensure_output_dir,
    plan_outputs, McapFileReader, McapWriter, WriterOptions,
};

// Message transformations
pub mod transform;

// Edit engine and pipeline
pub mod rewriter;

pub use rewriter::{
    CancellationToken, DispatchPipeline, EditConfig, EditOptions, EditStats, McapEditor,
    PipelineReport,
};
