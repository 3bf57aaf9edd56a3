// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! File format implementations.
//!
//! - [`mcap`]: MCAP reading and writing

pub mod mcap;
