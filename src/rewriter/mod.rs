// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Edit engine and the parallel pipeline driving it.
//!
//! - [`options`] - Edit options (CLI/TOML) and the resolved [`EditConfig`]
//! - [`ids`] - Random channel IDs for renamed channels
//! - [`engine`] - Per-file streaming edit
//! - [`pipeline`] - Worker pool over many files

pub mod engine;
pub mod ids;
pub mod options;
pub mod pipeline;

pub use engine::{EditStats, EmissionState, McapEditor};
pub use ids::ChannelIdAllocator;
pub use options::{EditConfig, EditOptions};
pub use pipeline::{CancellationToken, DispatchPipeline, PipelineReport};
