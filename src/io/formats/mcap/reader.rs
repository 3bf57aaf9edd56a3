// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Memory-mapped MCAP reader built on the `mcap` crate.
//!
//! Metadata (header, schemas, channels, statistics) is taken from the
//! summary section. Files without a usable summary are scanned once to
//! derive it. Messages are then streamed in file order with
//! [`McapFileReader::messages`].

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::core::{EditError, Result};
use crate::io::formats::mcap::constants::MCAP_MAGIC;
use crate::io::metadata::{ChannelRecord, FileStatistics, McapHeader, SchemaRecord};

const CONTEXT: &str = "McapFileReader";

fn codec_err(e: impl std::fmt::Display) -> EditError {
    EditError::codec(CONTEXT, e.to_string())
}

/// Footer fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FooterInfo {
    /// Offset of the summary section (0 = none)
    pub summary_start: u64,
    /// Offset of the summary offset section (0 = none)
    pub summary_offset_start: u64,
    /// CRC of the summary section (0 = not computed)
    pub summary_crc: u32,
}

/// One metadata index entry from the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataIndexEntry {
    /// Metadata record name
    pub name: String,
    /// Offset of the metadata record
    pub offset: u64,
    /// Length of the metadata record
    pub length: u64,
}

/// Index records found in the summary section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryIndexes {
    /// Number of chunk index records
    pub chunk_index_count: usize,
    /// Number of attachment index records
    pub attachment_index_count: usize,
    /// Metadata index records
    pub metadata_indexes: Vec<MetadataIndexEntry>,
    /// Distinct chunk compression names ("" = uncompressed)
    pub chunk_compressions: BTreeSet<String>,
}

/// Memory-mapped MCAP file.
pub struct McapFileReader {
    path: PathBuf,
    mmap: memmap2::Mmap,
    header: McapHeader,
    footer: Option<FooterInfo>,
    schemas: BTreeMap<u16, SchemaRecord>,
    channels: BTreeMap<u16, ChannelRecord>,
    statistics: FileStatistics,
    indexes: SummaryIndexes,
    has_summary: bool,
}

impl McapFileReader {
    /// Open and map an MCAP file, loading its metadata.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EditError::io(path, e))?;

        // SAFETY: the mapping is read-only and inputs are never edited in place.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| EditError::io(path, e))?;

        if mmap.len() < MCAP_MAGIC.len() || mmap[..MCAP_MAGIC.len()] != MCAP_MAGIC {
            let shown = &mmap[..mmap.len().min(MCAP_MAGIC.len())];
            return Err(EditError::codec(
                CONTEXT,
                format!("bad magic 0x{} in {}", hex::encode(shown), path.display()),
            ));
        }

        let header = read_header(&mmap)?;
        let footer = mcap::read::footer(&mmap).ok().map(|f| FooterInfo {
            summary_start: f.summary_start,
            summary_offset_start: f.summary_offset_start,
            summary_crc: f.summary_crc,
        });

        let summary = match mcap::Summary::read(&mmap) {
            Ok(Some(summary)) => Some(SummaryContents::from(&summary)),
            Ok(None) => {
                warn!(path = %path.display(), "MCAP file has no summary section, scanning messages");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read summary, scanning messages");
                None
            }
        };

        let mut reader = Self {
            path: path.to_path_buf(),
            mmap,
            header,
            footer,
            schemas: BTreeMap::new(),
            channels: BTreeMap::new(),
            statistics: FileStatistics::default(),
            indexes: SummaryIndexes::default(),
            has_summary: summary.is_some(),
        };

        let mut needs_scan = true;
        if let Some(contents) = summary {
            reader.schemas = contents.schemas;
            reader.channels = contents.channels;
            reader.indexes = contents.indexes;
            if let Some(stats) = contents.statistics {
                reader.statistics = stats;
                needs_scan = false;
            } else {
                warn!(path = %path.display(), "MCAP summary has no statistics, scanning messages");
            }
        }

        if needs_scan {
            reader.scan()?;
        }

        Ok(reader)
    }

    /// Derive channels, schemas and statistics from the message stream.
    fn scan(&mut self) -> Result<()> {
        let mut stats = FileStatistics {
            chunk_count: self.indexes.chunk_index_count as u32,
            ..FileStatistics::default()
        };

        let stream = mcap::MessageStream::new(&self.mmap).map_err(codec_err)?;
        for message in stream {
            let message = message.map_err(codec_err)?;
            let channel = &message.channel;

            if !self.channels.contains_key(&channel.id) {
                self.channels
                    .insert(channel.id, ChannelRecord::from(&**channel));
            }
            if let Some(schema) = &channel.schema {
                self.schemas
                    .entry(schema.id)
                    .or_insert_with(|| SchemaRecord::from(&**schema));
            }

            if stats.message_count == 0 {
                stats.message_start_time = message.log_time;
                stats.message_end_time = message.log_time;
            } else {
                stats.message_start_time = stats.message_start_time.min(message.log_time);
                stats.message_end_time = stats.message_end_time.max(message.log_time);
            }
            stats.message_count += 1;
            *stats.channel_message_counts.entry(channel.id).or_insert(0) += 1;
        }

        stats.schema_count = self.schemas.len() as u16;
        stats.channel_count = self.channels.len() as u32;
        self.statistics = stats;
        Ok(())
    }

    /// Stream every message in file order.
    pub fn messages(&self) -> Result<impl Iterator<Item = Result<mcap::Message<'_>>> + '_> {
        let stream = mcap::MessageStream::new(&self.mmap).map_err(codec_err)?;
        Ok(stream.map(|m| m.map_err(codec_err)))
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header record.
    pub fn header(&self) -> &McapHeader {
        &self.header
    }

    /// Footer, if one could be read.
    pub fn footer(&self) -> Option<&FooterInfo> {
        self.footer.as_ref()
    }

    /// Schemas by ID.
    pub fn schemas(&self) -> &BTreeMap<u16, SchemaRecord> {
        &self.schemas
    }

    /// Channels by ID.
    pub fn channels(&self) -> &BTreeMap<u16, ChannelRecord> {
        &self.channels
    }

    /// Every channel ID present in the file.
    pub fn channel_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.channels.keys().copied()
    }

    /// File statistics (from the summary, or derived by scanning).
    pub fn statistics(&self) -> &FileStatistics {
        &self.statistics
    }

    /// Summary index records.
    pub fn indexes(&self) -> &SummaryIndexes {
        &self.indexes
    }

    /// Whether the file had a readable summary section.
    pub fn has_summary(&self) -> bool {
        self.has_summary
    }

    /// File size in bytes.
    pub fn file_size(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Collect everything `roboedit info` reports.
    pub fn info(&self) -> McapFileInfo {
        let topics = self
            .channels
            .values()
            .map(|channel| {
                let schema = self.schemas.get(&channel.schema_id);
                TopicInfo {
                    id: channel.id,
                    topic: channel.topic.clone(),
                    message_count: self
                        .statistics
                        .channel_message_counts
                        .get(&channel.id)
                        .copied()
                        .unwrap_or(0),
                    message_encoding: channel.message_encoding.clone(),
                    schema_id: channel.schema_id,
                    schema_name: schema.map(|s| s.name.clone()).unwrap_or_default(),
                    schema_encoding: schema.map(|s| s.encoding.clone()).unwrap_or_default(),
                }
            })
            .collect();

        McapFileInfo {
            path: self.path.display().to_string(),
            file_size: self.file_size(),
            header: self.header.clone(),
            footer: self.footer.unwrap_or_default(),
            has_summary: self.has_summary,
            statistics: self.statistics.clone(),
            indexes: self.indexes.clone(),
            topics,
        }
    }
}

/// Owned copy of what the summary section provides.
struct SummaryContents {
    schemas: BTreeMap<u16, SchemaRecord>,
    channels: BTreeMap<u16, ChannelRecord>,
    statistics: Option<FileStatistics>,
    indexes: SummaryIndexes,
}

impl From<&mcap::Summary> for SummaryContents {
    fn from(summary: &mcap::Summary) -> Self {
        let mut schemas: BTreeMap<u16, SchemaRecord> = summary
            .schemas
            .iter()
            .map(|(id, schema)| (*id, SchemaRecord::from(&**schema)))
            .collect();

        let mut channels = BTreeMap::new();
        for (id, channel) in &summary.channels {
            channels.insert(*id, ChannelRecord::from(&**channel));
            if let Some(schema) = &channel.schema {
                schemas
                    .entry(schema.id)
                    .or_insert_with(|| SchemaRecord::from(&**schema));
            }
        }

        let indexes = SummaryIndexes {
            chunk_index_count: summary.chunk_indexes.len(),
            attachment_index_count: summary.attachment_indexes.len(),
            metadata_indexes: summary
                .metadata_indexes
                .iter()
                .map(|m| MetadataIndexEntry {
                    name: m.name.clone(),
                    offset: m.offset,
                    length: m.length,
                })
                .collect(),
            chunk_compressions: summary
                .chunk_indexes
                .iter()
                .map(|c| c.compression.clone())
                .collect(),
        };

        Self {
            schemas,
            channels,
            statistics: summary.stats.as_ref().map(FileStatistics::from),
            indexes,
        }
    }
}

/// Read the header record that follows the leading magic.
fn read_header(buf: &[u8]) -> Result<McapHeader> {
    let mut records = mcap::read::LinearReader::new(buf).map_err(codec_err)?;
    match records.next() {
        Some(Ok(mcap::records::Record::Header(header))) => Ok(McapHeader {
            profile: header.profile,
            library: header.library,
        }),
        Some(Ok(_)) => Err(EditError::codec(
            CONTEXT,
            "first record is not a header record",
        )),
        Some(Err(e)) => Err(codec_err(e)),
        None => Err(EditError::codec(CONTEXT, "file ends before header record")),
    }
}

/// Per-topic details for `roboedit info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicInfo {
    /// Channel ID
    pub id: u16,
    /// Topic name
    pub topic: String,
    /// Messages on this channel
    pub message_count: u64,
    /// Message encoding
    pub message_encoding: String,
    /// Schema ID (0 = none)
    pub schema_id: u16,
    /// Schema name
    pub schema_name: String,
    /// Schema encoding
    pub schema_encoding: String,
}

/// File overview printed by `roboedit info`.
#[derive(Debug, Clone, Serialize)]
pub struct McapFileInfo {
    /// File path
    pub path: String,
    /// File size in bytes
    pub file_size: u64,
    /// Header record
    pub header: McapHeader,
    /// Footer record (zeroed if unreadable)
    pub footer: FooterInfo,
    /// Whether a summary section was read
    pub has_summary: bool,
    /// Statistics
    pub statistics: FileStatistics,
    /// Summary index records
    pub indexes: SummaryIndexes,
    /// Channels, ordered by ID
    pub topics: Vec<TopicInfo>,
}
