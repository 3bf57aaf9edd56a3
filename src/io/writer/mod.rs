// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Output encoding configuration.
//!
//! [`WriterOptions`] is built once per run and shared, read-only, by every
//! file written in that run.

pub mod options;

pub use options::{Compression, CompressionLevel, WriterOptions};
