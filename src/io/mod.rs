// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer: MCAP codec, record types and file discovery.

pub mod discovery;
pub mod formats;
pub mod metadata;
pub mod writer;

pub use discovery::{
    collect_edit_inputs, collect_mcap_files, ensure_distinct_output, ensure_output_dir,
    output_path_for, plan_outputs, same_file,
};
pub use formats::mcap::{McapFileReader, McapWriter};
pub use metadata::{ChannelRecord, FileStatistics, McapHeader, MessageRecord, SchemaRecord};
pub use writer::{Compression, CompressionLevel, WriterOptions};
