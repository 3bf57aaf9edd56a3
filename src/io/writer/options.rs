// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Output encoding options for the MCAP writer.

use std::fmt;
use std::str::FromStr;

use crate::core::EditError;
use crate::io::formats::mcap::constants::DEFAULT_CHUNK_SIZE;

/// Chunk compression algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Uncompressed chunks
    None,
    /// Zstandard
    #[default]
    Zstd,
    /// LZ4 frame format
    Lz4,
}

impl Compression {
    /// Name stored in chunk records ("" for uncompressed).
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Zstd => "zstd",
            Compression::Lz4 => "lz4",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for Compression {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zstd" => Ok(Compression::Zstd),
            "lz4" => Ok(Compression::Lz4),
            "none" => Ok(Compression::None),
            other => Err(EditError::invalid_config(
                "compression",
                format!("'{other}', expected 'zstd', 'lz4' or 'none'"),
            )),
        }
    }
}

/// Compression level preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Algorithm default
    #[default]
    Default,
    /// Fastest encoding
    Fastest,
    /// Better ratio than default
    Better,
    /// Best ratio
    Best,
}

impl CompressionLevel {
    /// Level passed to the zstd encoder.
    pub fn zstd_level(&self) -> i32 {
        match self {
            CompressionLevel::Fastest => 1,
            CompressionLevel::Default => 3,
            CompressionLevel::Better => 7,
            CompressionLevel::Best => 11,
        }
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = EditError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        match ordinal {
            0 => Ok(CompressionLevel::Default),
            1 => Ok(CompressionLevel::Fastest),
            2 => Ok(CompressionLevel::Better),
            3 => Ok(CompressionLevel::Best),
            other => Err(EditError::invalid_config(
                "compression level",
                format!("{other}, expected 0:default 1:fastest 2:better 3:best"),
            )),
        }
    }
}

/// Structural and compression options for [`McapWriter`](crate::io::formats::mcap::McapWriter).
///
/// The default keeps every index and statistics feature enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Chunk compression
    pub compression: Compression,
    /// Compression level preset (lz4 has a single level)
    pub compression_level: CompressionLevel,
    /// Compute chunk, data section and summary CRCs
    pub include_crc: bool,
    /// Group messages into chunks
    pub chunked: bool,
    /// Target uncompressed chunk size in bytes
    pub chunk_size: usize,
    /// Write message index records after each chunk
    pub emit_message_indexes: bool,
    /// Write a statistics record in the summary
    pub emit_statistics: bool,
    /// Repeat schema and channel records in the summary
    pub emit_summary_records: bool,
    /// Write chunk index records in the summary
    pub emit_chunk_indexes: bool,
    /// Write summary offset records
    pub emit_summary_offsets: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Zstd,
            compression_level: CompressionLevel::Default,
            include_crc: true,
            chunked: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            emit_message_indexes: true,
            emit_statistics: true,
            emit_summary_records: true,
            emit_chunk_indexes: true,
            emit_summary_offsets: true,
        }
    }
}

impl WriterOptions {
    /// Set the compression algorithm.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the compression level.
    pub fn compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Set the target chunk size in bytes.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Enable or disable chunking.
    pub fn chunked(mut self, chunked: bool) -> Self {
        self.chunked = chunked;
        self
    }

    /// Enable or disable CRC computation.
    pub fn include_crc(mut self, include_crc: bool) -> Self {
        self.include_crc = include_crc;
        self
    }

    /// Enable or disable every index record (message, chunk, summary offsets).
    pub fn indexed(mut self, indexed: bool) -> Self {
        self.emit_message_indexes = indexed;
        self.emit_chunk_indexes = indexed;
        self.emit_summary_offsets = indexed;
        self
    }
}
