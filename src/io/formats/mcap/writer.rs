// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP writer with explicit record IDs and manual chunk control.
//!
//! Schema and channel IDs are chosen by the caller, not assigned by the
//! writer, so an edit can keep source IDs and introduce new ones for
//! renamed channels.
//!
//! # Layout
//!
//! ```text
//! magic, Header
//! Schema/Channel records (data section, written when first registered)
//! Chunk, MessageIndex... (or bare Message records when unchunked)
//! DataEnd (data section CRC)
//! summary: Schema*, Channel*, Statistics, ChunkIndex*
//! SummaryOffset*
//! Footer (summary CRC), magic
//! ```
//!
//! # MCAP Format Compatibility
//!
//! Output is read back by the `mcap` crate v0.24 in the tests, including
//! chunk, data section and summary CRC validation.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::core::{EditError, Result};
use crate::io::formats::mcap::constants::{
    FOOTER_BODY_LEN, MCAP_MAGIC, MESSAGE_FIXED_LEN, OP_CHANNEL, OP_CHUNK, OP_CHUNK_INDEX,
    OP_DATA_END, OP_FOOTER, OP_HEADER, OP_MESSAGE, OP_MESSAGE_INDEX, OP_SCHEMA, OP_STATISTICS,
    OP_SUMMARY_OFFSET, SUMMARY_OFFSET_BODY_LEN,
};
use crate::io::metadata::{ChannelRecord, McapHeader, MessageRecord, SchemaRecord};
use crate::io::writer::{Compression, WriterOptions};

const CONTEXT: &str = "McapWriter";

/// Chunk index entry kept until the summary is written.
#[derive(Debug, Clone)]
struct ChunkIndexRecord {
    message_start_time: u64,
    message_end_time: u64,
    chunk_start_offset: u64,
    /// Includes opcode and length prefix
    chunk_length: u64,
    message_index_offsets: BTreeMap<u16, u64>,
    message_index_length: u64,
    compression: &'static str,
    compressed_size: u64,
    uncompressed_size: u64,
}

/// Messages of the chunk currently being filled, already serialized.
#[derive(Debug, Default)]
struct ChunkBuffer {
    records: Vec<u8>,
    message_start_time: u64,
    message_end_time: u64,
    /// channel -> (log_time, offset into `records`)
    message_indexes: BTreeMap<u16, Vec<(u64, u64)>>,
}

impl ChunkBuffer {
    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, message: &MessageRecord<'_>) -> Result<()> {
        if self.is_empty() {
            self.message_start_time = message.log_time;
            self.message_end_time = message.log_time;
        } else {
            self.message_start_time = self.message_start_time.min(message.log_time);
            self.message_end_time = self.message_end_time.max(message.log_time);
        }

        let offset = self.records.len() as u64;
        self.message_indexes
            .entry(message.channel_id)
            .or_default()
            .push((message.log_time, offset));

        encode_message(&mut self.records, message)
    }
}

/// Totals reported by [`McapWriter::finish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Messages written
    pub message_count: u64,
    /// Schemas written
    pub schema_count: usize,
    /// Channels written
    pub channel_count: usize,
    /// Chunks written
    pub chunk_count: u32,
    /// Earliest log time (0 when empty)
    pub message_start_time: u64,
    /// Latest log time (0 when empty)
    pub message_end_time: u64,
    /// Total file size in bytes
    pub bytes_written: u64,
}

/// MCAP writer.
///
/// Records must be registered before use: a channel's schema before the
/// channel, a channel before its messages. Messages are buffered into
/// chunks of roughly [`WriterOptions::chunk_size`] uncompressed bytes.
pub struct McapWriter<W: Write> {
    writer: W,
    options: WriterOptions,
    /// Bytes written so far (BufWriter doesn't expose stream_position)
    position: u64,
    /// Running CRC of the current section
    crc: crc32fast::Hasher,

    schemas: BTreeMap<u16, SchemaRecord>,
    channels: BTreeMap<u16, ChannelRecord>,
    channel_message_counts: BTreeMap<u16, u64>,
    message_count: u64,
    message_start_time: u64,
    message_end_time: u64,

    chunk: ChunkBuffer,
    chunk_indexes: Vec<ChunkIndexRecord>,
    chunk_count: u32,
    finished: bool,
}

impl McapWriter<BufWriter<File>> {
    /// Create a buffered writer for a new file at `path`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        header: &McapHeader,
        options: WriterOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| EditError::io(path, e))?;
        Self::new(BufWriter::new(file), header, options)
    }
}

impl<W: Write> McapWriter<W> {
    /// Create a writer and emit the magic and header record.
    pub fn new(writer: W, header: &McapHeader, options: WriterOptions) -> Result<Self> {
        if options.chunked && options.chunk_size == 0 {
            return Err(EditError::invalid_config(
                "chunk size",
                "must be greater than zero when chunking",
            ));
        }

        let mut slf = Self {
            writer,
            options,
            position: 0,
            crc: crc32fast::Hasher::new(),
            schemas: BTreeMap::new(),
            channels: BTreeMap::new(),
            channel_message_counts: BTreeMap::new(),
            message_count: 0,
            message_start_time: 0,
            message_end_time: 0,
            chunk: ChunkBuffer::default(),
            chunk_indexes: Vec::new(),
            chunk_count: 0,
            finished: false,
        };

        slf.write_bytes(&MCAP_MAGIC)?;
        let mut body = Vec::new();
        put_str(&mut body, &header.profile)?;
        put_str(&mut body, &header.library)?;
        slf.write_record(OP_HEADER, &body)?;

        Ok(slf)
    }

    /// Options this writer was created with.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Write bytes, tracking position and section CRC.
    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        if self.options.include_crc {
            self.crc.update(data);
        }
        self.position += data.len() as u64;
        Ok(())
    }

    /// Write opcode, length prefix and body.
    fn write_record(&mut self, opcode: u8, body: &[u8]) -> Result<()> {
        self.write_record_prefix(opcode, body.len() as u64)?;
        self.write_bytes(body)
    }

    fn write_record_prefix(&mut self, opcode: u8, len: u64) -> Result<()> {
        let mut prefix = [0u8; 9];
        prefix[0] = opcode;
        prefix[1..].copy_from_slice(&len.to_le_bytes());
        self.write_bytes(&prefix)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(EditError::codec(CONTEXT, "writer already finished"));
        }
        Ok(())
    }

    /// Register a schema and write its record.
    ///
    /// Re-registering an identical schema is a no-op; a different schema
    /// under an existing ID is an error. ID 0 is reserved.
    pub fn write_schema(&mut self, schema: &SchemaRecord) -> Result<()> {
        self.ensure_open()?;
        if schema.id == 0 {
            return Err(EditError::codec(CONTEXT, "schema id 0 is reserved"));
        }
        if let Some(existing) = self.schemas.get(&schema.id) {
            if existing == schema {
                return Ok(());
            }
            return Err(EditError::codec(
                CONTEXT,
                format!("schema id {} already used by '{}'", schema.id, existing.name),
            ));
        }

        let mut body = Vec::with_capacity(schema.data.len() + 64);
        encode_schema(&mut body, schema)?;
        self.write_record(OP_SCHEMA, &body)?;

        self.schemas.insert(schema.id, schema.clone());
        Ok(())
    }

    /// Register a channel and write its record.
    ///
    /// The channel's schema must already be registered unless `schema_id`
    /// is 0. Channel IDs cannot be reused.
    pub fn write_channel(&mut self, channel: &ChannelRecord) -> Result<()> {
        self.ensure_open()?;
        if channel.schema_id != 0 && !self.schemas.contains_key(&channel.schema_id) {
            return Err(EditError::codec(
                CONTEXT,
                format!(
                    "channel {} ('{}') references unknown schema {}",
                    channel.id, channel.topic, channel.schema_id
                ),
            ));
        }
        if let Some(existing) = self.channels.get(&channel.id) {
            return Err(EditError::codec(
                CONTEXT,
                format!(
                    "channel id {} already used by '{}'",
                    channel.id, existing.topic
                ),
            ));
        }

        let mut body = Vec::with_capacity(64);
        encode_channel(&mut body, channel)?;
        self.write_record(OP_CHANNEL, &body)?;

        self.channels.insert(channel.id, channel.clone());
        self.channel_message_counts.insert(channel.id, 0);
        Ok(())
    }

    /// Whether a channel ID has been registered.
    pub fn has_channel(&self, id: u16) -> bool {
        self.channels.contains_key(&id)
    }

    /// Whether a schema ID has been registered.
    pub fn has_schema(&self, id: u16) -> bool {
        self.schemas.contains_key(&id)
    }

    /// Write a message on a registered channel.
    pub fn write_message(&mut self, message: &MessageRecord<'_>) -> Result<()> {
        self.ensure_open()?;
        let Some(count) = self.channel_message_counts.get_mut(&message.channel_id) else {
            return Err(EditError::codec(
                CONTEXT,
                format!("message on unknown channel {}", message.channel_id),
            ));
        };
        *count += 1;

        if self.message_count == 0 {
            self.message_start_time = message.log_time;
            self.message_end_time = message.log_time;
        } else {
            self.message_start_time = self.message_start_time.min(message.log_time);
            self.message_end_time = self.message_end_time.max(message.log_time);
        }
        self.message_count += 1;

        if self.options.chunked {
            self.chunk.push(message)?;
            if self.chunk.records.len() >= self.options.chunk_size {
                self.flush_chunk()?;
            }
            Ok(())
        } else {
            let mut record = Vec::with_capacity(message.data.len() + 32);
            encode_message(&mut record, message)?;
            self.write_bytes(&record)
        }
    }

    /// Compress chunk records according to the options.
    fn compress<'a>(&self, records: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        match self.options.compression {
            Compression::None => Ok(Cow::Borrowed(records)),
            Compression::Zstd => {
                let level = self.options.compression_level.zstd_level();
                zstd::bulk::compress(records, level)
                    .map(Cow::Owned)
                    .map_err(|e| EditError::codec(CONTEXT, format!("zstd compression failed: {e}")))
            }
            Compression::Lz4 => {
                let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
                encoder.write_all(records)?;
                encoder
                    .finish()
                    .map(Cow::Owned)
                    .map_err(|e| EditError::codec(CONTEXT, format!("lz4 compression failed: {e}")))
            }
        }
    }

    /// Write the buffered chunk, its message indexes, and remember its index.
    fn flush_chunk(&mut self) -> Result<()> {
        if self.chunk.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::take(&mut self.chunk);

        let uncompressed_crc = if self.options.include_crc {
            crc32fast::hash(&chunk.records)
        } else {
            0
        };
        let compression = self.options.compression.as_str();
        let compressed = self.compress(&chunk.records)?;

        let chunk_start_offset = self.position;
        let mut header = Vec::with_capacity(40 + compression.len());
        header.write_u64::<LittleEndian>(chunk.message_start_time)?;
        header.write_u64::<LittleEndian>(chunk.message_end_time)?;
        header.write_u64::<LittleEndian>(chunk.records.len() as u64)?;
        header.write_u32::<LittleEndian>(uncompressed_crc)?;
        put_str(&mut header, compression)?;
        header.write_u64::<LittleEndian>(compressed.len() as u64)?;

        self.write_record_prefix(OP_CHUNK, (header.len() + compressed.len()) as u64)?;
        self.write_bytes(&header)?;
        self.write_bytes(&compressed)?;
        let chunk_length = self.position - chunk_start_offset;

        let message_index_start = self.position;
        let mut message_index_offsets = BTreeMap::new();
        if self.options.emit_message_indexes {
            for (channel_id, entries) in &chunk.message_indexes {
                message_index_offsets.insert(*channel_id, self.position);
                let mut body = Vec::with_capacity(6 + entries.len() * 16);
                body.write_u16::<LittleEndian>(*channel_id)?;
                body.write_u32::<LittleEndian>((entries.len() * 16) as u32)?;
                for (log_time, offset) in entries {
                    body.write_u64::<LittleEndian>(*log_time)?;
                    body.write_u64::<LittleEndian>(*offset)?;
                }
                self.write_record(OP_MESSAGE_INDEX, &body)?;
            }
        }
        let message_index_length = self.position - message_index_start;

        self.chunk_indexes.push(ChunkIndexRecord {
            message_start_time: chunk.message_start_time,
            message_end_time: chunk.message_end_time,
            chunk_start_offset,
            chunk_length,
            message_index_offsets,
            message_index_length,
            compression,
            compressed_size: compressed.len() as u64,
            uncompressed_size: chunk.records.len() as u64,
        });
        self.chunk_count += 1;

        Ok(())
    }

    /// Flush the last chunk, write the summary and footer, and flush.
    pub fn finish(&mut self) -> Result<WriteSummary> {
        self.ensure_open()?;
        self.flush_chunk()?;

        let data_crc = if self.options.include_crc {
            std::mem::replace(&mut self.crc, crc32fast::Hasher::new()).finalize()
        } else {
            0
        };
        self.write_record(OP_DATA_END, &data_crc.to_le_bytes())?;

        self.crc = crc32fast::Hasher::new();
        let summary_start = self.position;
        let mut groups: Vec<(u8, u64, u64)> = Vec::new();

        if self.options.emit_summary_records {
            let schemas: Vec<SchemaRecord> = self.schemas.values().cloned().collect();
            let start = self.position;
            for schema in &schemas {
                let mut body = Vec::new();
                encode_schema(&mut body, schema)?;
                self.write_record(OP_SCHEMA, &body)?;
            }
            push_group(&mut groups, OP_SCHEMA, start, self.position);

            let channels: Vec<ChannelRecord> = self.channels.values().cloned().collect();
            let start = self.position;
            for channel in &channels {
                let mut body = Vec::new();
                encode_channel(&mut body, channel)?;
                self.write_record(OP_CHANNEL, &body)?;
            }
            push_group(&mut groups, OP_CHANNEL, start, self.position);
        }

        if self.options.emit_statistics {
            let start = self.position;
            let body = self.encode_statistics()?;
            self.write_record(OP_STATISTICS, &body)?;
            push_group(&mut groups, OP_STATISTICS, start, self.position);
        }

        if self.options.emit_chunk_indexes {
            let indexes = std::mem::take(&mut self.chunk_indexes);
            let start = self.position;
            for index in &indexes {
                let body = encode_chunk_index(index)?;
                self.write_record(OP_CHUNK_INDEX, &body)?;
            }
            push_group(&mut groups, OP_CHUNK_INDEX, start, self.position);
            self.chunk_indexes = indexes;
        }

        let summary_offset_start = if self.options.emit_summary_offsets && !groups.is_empty() {
            let start = self.position;
            for (opcode, group_start, group_length) in &groups {
                let mut body = Vec::with_capacity(SUMMARY_OFFSET_BODY_LEN as usize);
                body.write_u8(*opcode)?;
                body.write_u64::<LittleEndian>(*group_start)?;
                body.write_u64::<LittleEndian>(*group_length)?;
                self.write_record(OP_SUMMARY_OFFSET, &body)?;
            }
            start
        } else {
            0
        };

        let has_summary = self.position > summary_start;
        let footer_summary_start = if has_summary { summary_start } else { 0 };

        self.write_record_prefix(OP_FOOTER, FOOTER_BODY_LEN)?;
        let mut footer = Vec::with_capacity(16);
        footer.write_u64::<LittleEndian>(footer_summary_start)?;
        footer.write_u64::<LittleEndian>(summary_offset_start)?;
        self.write_bytes(&footer)?;

        let summary_crc = if self.options.include_crc && has_summary {
            self.crc.clone().finalize()
        } else {
            0
        };
        self.write_bytes(&summary_crc.to_le_bytes())?;
        self.write_bytes(&MCAP_MAGIC)?;
        self.writer.flush()?;
        self.finished = true;

        debug!(
            schemas = self.schemas.len(),
            channels = self.channels.len(),
            chunks = self.chunk_count,
            messages = self.message_count,
            bytes = self.position,
            "MCAP summary written"
        );

        Ok(WriteSummary {
            message_count: self.message_count,
            schema_count: self.schemas.len(),
            channel_count: self.channels.len(),
            chunk_count: self.chunk_count,
            message_start_time: self.message_start_time,
            message_end_time: self.message_end_time,
            bytes_written: self.position,
        })
    }

    fn encode_statistics(&self) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(48 + self.channel_message_counts.len() * 10);
        body.write_u64::<LittleEndian>(self.message_count)?;
        body.write_u16::<LittleEndian>(self.schemas.len() as u16)?;
        body.write_u32::<LittleEndian>(self.channels.len() as u32)?;
        // attachments, metadata
        body.write_u32::<LittleEndian>(0)?;
        body.write_u32::<LittleEndian>(0)?;
        body.write_u32::<LittleEndian>(self.chunk_count)?;
        body.write_u64::<LittleEndian>(self.message_start_time)?;
        body.write_u64::<LittleEndian>(self.message_end_time)?;
        put_int_map(&mut body, &self.channel_message_counts)?;
        Ok(body)
    }

    /// Messages written so far.
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Get the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn push_group(groups: &mut Vec<(u8, u64, u64)>, opcode: u8, start: u64, end: u64) {
    if end > start {
        groups.push((opcode, start, end - start));
    }
}

fn put_str(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    buf.write_u32::<LittleEndian>(s.len() as u32)?;
    buf.write_all(s.as_bytes())?;
    Ok(())
}

/// Byte-length prefixed map of u16 -> u64.
fn put_int_map(buf: &mut Vec<u8>, map: &BTreeMap<u16, u64>) -> Result<()> {
    buf.write_u32::<LittleEndian>((map.len() * 10) as u32)?;
    for (key, value) in map {
        buf.write_u16::<LittleEndian>(*key)?;
        buf.write_u64::<LittleEndian>(*value)?;
    }
    Ok(())
}

/// Byte-length prefixed map of string pairs.
fn put_str_map(buf: &mut Vec<u8>, map: &BTreeMap<String, String>) -> Result<()> {
    let total: usize = map.iter().map(|(k, v)| 8 + k.len() + v.len()).sum();
    buf.write_u32::<LittleEndian>(total as u32)?;
    for (key, value) in map {
        put_str(buf, key)?;
        put_str(buf, value)?;
    }
    Ok(())
}

fn encode_schema(buf: &mut Vec<u8>, schema: &SchemaRecord) -> Result<()> {
    buf.write_u16::<LittleEndian>(schema.id)?;
    put_str(buf, &schema.name)?;
    put_str(buf, &schema.encoding)?;
    buf.write_u32::<LittleEndian>(schema.data.len() as u32)?;
    buf.write_all(&schema.data)?;
    Ok(())
}

fn encode_channel(buf: &mut Vec<u8>, channel: &ChannelRecord) -> Result<()> {
    buf.write_u16::<LittleEndian>(channel.id)?;
    buf.write_u16::<LittleEndian>(channel.schema_id)?;
    put_str(buf, &channel.topic)?;
    put_str(buf, &channel.message_encoding)?;
    put_str_map(buf, &channel.metadata)
}

/// Append a complete message record (opcode and length included).
fn encode_message(buf: &mut Vec<u8>, message: &MessageRecord<'_>) -> Result<()> {
    buf.write_u8(OP_MESSAGE)?;
    buf.write_u64::<LittleEndian>(MESSAGE_FIXED_LEN + message.data.len() as u64)?;
    buf.write_u16::<LittleEndian>(message.channel_id)?;
    buf.write_u32::<LittleEndian>(message.sequence)?;
    buf.write_u64::<LittleEndian>(message.log_time)?;
    buf.write_u64::<LittleEndian>(message.publish_time)?;
    buf.write_all(message.data)?;
    Ok(())
}

fn encode_chunk_index(index: &ChunkIndexRecord) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(80 + index.message_index_offsets.len() * 10);
    body.write_u64::<LittleEndian>(index.message_start_time)?;
    body.write_u64::<LittleEndian>(index.message_end_time)?;
    body.write_u64::<LittleEndian>(index.chunk_start_offset)?;
    body.write_u64::<LittleEndian>(index.chunk_length)?;
    put_int_map(&mut body, &index.message_index_offsets)?;
    body.write_u64::<LittleEndian>(index.message_index_length)?;
    put_str(&mut body, index.compression)?;
    body.write_u64::<LittleEndian>(index.compressed_size)?;
    body.write_u64::<LittleEndian>(index.uncompressed_size)?;
    Ok(body)
}
