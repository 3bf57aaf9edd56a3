// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP format constants.
//!
//! Opcodes, magic bytes and the fixed sizes the writer needs to compute
//! record lengths, as laid out at <https://mcap.dev/spec>.

/// MCAP file magic bytes (at start and end of file).
pub const MCAP_MAGIC: [u8; 8] = [0x89, 0x4D, 0x43, 0x41, 0x50, 0x30, 0x0D, 0x0A];

/// File extension recognized by discovery.
pub const MCAP_EXTENSION: &str = "mcap";

/// Header record - must be first record after magic.
pub const OP_HEADER: u8 = 0x01;
/// Footer record - contains summary section offsets.
pub const OP_FOOTER: u8 = 0x02;
/// Schema record.
pub const OP_SCHEMA: u8 = 0x03;
/// Channel record.
pub const OP_CHANNEL: u8 = 0x04;
/// Message record.
pub const OP_MESSAGE: u8 = 0x05;
/// Chunk record - contains (optionally compressed) records.
pub const OP_CHUNK: u8 = 0x06;
/// Message index record - follows its chunk.
pub const OP_MESSAGE_INDEX: u8 = 0x07;
/// Chunk index record - summary section.
pub const OP_CHUNK_INDEX: u8 = 0x08;
/// Statistics record - summary section.
pub const OP_STATISTICS: u8 = 0x0B;
/// Summary offset record.
pub const OP_SUMMARY_OFFSET: u8 = 0x0E;
/// Data end record - marks end of data section.
pub const OP_DATA_END: u8 = 0x0F;

/// Length of a footer record body: summary_start + summary_offset_start + summary_crc.
pub const FOOTER_BODY_LEN: u64 = 8 + 8 + 4;

/// Length of a summary offset record body: opcode + group start + group length.
pub const SUMMARY_OFFSET_BODY_LEN: u64 = 1 + 8 + 8;

/// Fixed part of a message record body: channel_id + sequence + log_time + publish_time.
pub const MESSAGE_FIXED_LEN: u64 = 2 + 4 + 8 + 8;

/// Default uncompressed chunk size (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;
