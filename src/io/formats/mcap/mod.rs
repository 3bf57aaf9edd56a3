// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP format implementation.
//!
//! - [`reader`]: memory-mapped reader on top of the `mcap` crate
//! - [`writer`]: record writer with explicit schema/channel IDs,
//!   zstd/lz4/uncompressed chunks, CRCs and a full summary section

pub mod constants;
pub mod reader;
pub mod writer;

pub use constants::{MCAP_EXTENSION, MCAP_MAGIC};
pub use reader::{
    FooterInfo, McapFileInfo, McapFileReader, MetadataIndexEntry, SummaryIndexes, TopicInfo,
};
pub use writer::{McapWriter, WriteSummary};
