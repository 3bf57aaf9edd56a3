// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record types shared by the MCAP reader, writer and the edit engine.
//!
//! These are owned copies of what the `mcap` crate hands out, so the writer
//! does not depend on the reader's borrowed lifetimes.

use std::collections::BTreeMap;

use serde::Serialize;

/// Header record (profile and library strings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct McapHeader {
    /// Profile, e.g. "ros2"
    pub profile: String,
    /// Library that wrote the file
    pub library: String,
}

/// Schema record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRecord {
    /// Schema ID, unique within a file (0 is reserved for "no schema")
    pub id: u16,
    /// Schema name, usually the message type (e.g., "sensor_msgs/msg/Imu")
    pub name: String,
    /// Schema encoding (e.g., "ros2msg", "protobuf")
    pub encoding: String,
    /// Raw schema definition bytes
    pub data: Vec<u8>,
}

impl SchemaRecord {
    /// Create a new schema record.
    pub fn new(
        id: u16,
        name: impl Into<String>,
        encoding: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            encoding: encoding.into(),
            data: data.into(),
        }
    }
}

impl From<&mcap::Schema<'_>> for SchemaRecord {
    fn from(schema: &mcap::Schema<'_>) -> Self {
        Self {
            id: schema.id,
            name: schema.name.clone(),
            encoding: schema.encoding.clone(),
            data: schema.data.to_vec(),
        }
    }
}

/// Channel record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    /// Channel ID, unique within a file
    pub id: u16,
    /// Owning schema ID (0 = schemaless channel)
    pub schema_id: u16,
    /// Topic name (e.g., "/joint_states")
    pub topic: String,
    /// Message encoding (e.g., "cdr", "json")
    pub message_encoding: String,
    /// Free-form channel metadata
    pub metadata: BTreeMap<String, String>,
}

impl ChannelRecord {
    /// Create a new channel record with empty metadata.
    pub fn new(
        id: u16,
        schema_id: u16,
        topic: impl Into<String>,
        message_encoding: impl Into<String>,
    ) -> Self {
        Self {
            id,
            schema_id,
            topic: topic.into(),
            message_encoding: message_encoding.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Set a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Copy of this channel under a new ID and topic.
    pub fn renamed(&self, id: u16, topic: impl Into<String>) -> Self {
        Self {
            id,
            schema_id: self.schema_id,
            topic: topic.into(),
            message_encoding: self.message_encoding.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

impl From<&mcap::Channel<'_>> for ChannelRecord {
    fn from(channel: &mcap::Channel<'_>) -> Self {
        Self {
            id: channel.id,
            schema_id: channel.schema.as_ref().map(|s| s.id).unwrap_or(0),
            topic: channel.topic.clone(),
            message_encoding: channel.message_encoding.clone(),
            metadata: channel
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// A message ready to be written, borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRecord<'a> {
    /// Channel ID in the output file
    pub channel_id: u16,
    /// Per-channel sequence number
    pub sequence: u32,
    /// Log timestamp (nanoseconds since Unix epoch)
    pub log_time: u64,
    /// Publish timestamp (nanoseconds since Unix epoch)
    pub publish_time: u64,
    /// Opaque payload
    pub data: &'a [u8],
}

/// File-level statistics, as stored in the summary Statistics record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStatistics {
    /// Total message count
    pub message_count: u64,
    /// Number of schemas
    pub schema_count: u16,
    /// Number of channels
    pub channel_count: u32,
    /// Number of attachments
    pub attachment_count: u32,
    /// Number of metadata records
    pub metadata_count: u32,
    /// Number of chunks
    pub chunk_count: u32,
    /// Earliest message log time
    pub message_start_time: u64,
    /// Latest message log time
    pub message_end_time: u64,
    /// Message count per channel ID
    pub channel_message_counts: BTreeMap<u16, u64>,
}

impl From<&mcap::records::Statistics> for FileStatistics {
    fn from(stats: &mcap::records::Statistics) -> Self {
        Self {
            message_count: stats.message_count,
            schema_count: stats.schema_count,
            channel_count: stats.channel_count,
            attachment_count: stats.attachment_count,
            metadata_count: stats.metadata_count,
            chunk_count: stats.chunk_count,
            message_start_time: stats.message_start_time,
            message_end_time: stats.message_end_time,
            channel_message_counts: stats
                .channel_message_counts
                .iter()
                .map(|(k, v)| (*k, *v))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_renamed_keeps_schema_and_metadata() {
        let channel = ChannelRecord::new(3, 1, "/camera", "cdr").with_metadata("offered_qos", "x");
        let renamed = channel.renamed(4242, "/front_camera");

        assert_eq!(renamed.id, 4242);
        assert_eq!(renamed.topic, "/front_camera");
        assert_eq!(renamed.schema_id, 1);
        assert_eq!(renamed.message_encoding, "cdr");
        assert_eq!(renamed.metadata.get("offered_qos"), Some(&"x".to_string()));
        assert_eq!(channel.id, 3);
    }

    #[test]
    fn test_schema_record_new() {
        let schema = SchemaRecord::new(1, "std_msgs/String", "ros1msg", b"string data".to_vec());
        assert_eq!(schema.id, 1);
        assert_eq!(schema.data, b"string data");
    }
}
