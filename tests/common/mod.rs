// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use roboedit::io::{ChannelRecord, McapHeader, MessageRecord, SchemaRecord};
use roboedit::{McapWriter, WriterOptions};

// ============================================================================
// Temp directories
// ============================================================================

/// Unique temporary directory for one test.
pub fn temp_dir(name: &str) -> (PathBuf, CleanupGuard) {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "roboedit_test_{name}_{}_{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    let guard = CleanupGuard(dir.clone());
    (dir, guard)
}

/// Cleanup guard for test temporary files.
#[derive(Debug)]
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// First message log time of [`standard_fixture`].
pub const FIRST_LOG_TIME: u64 = 1_000;
/// Last message log time of [`standard_fixture`].
pub const LAST_LOG_TIME: u64 = 1_900;
/// Log time step of [`standard_fixture`].
pub const STEP: u64 = 100;
/// Publish time is this much earlier than log time.
pub const PUBLISH_LAG: u64 = 5;

/// Contents of a fixture file.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub schemas: Vec<SchemaRecord>,
    pub channels: Vec<ChannelRecord>,
    /// (channel id, log time, publish time, payload)
    pub messages: Vec<(u16, u64, u64, Vec<u8>)>,
}

impl Fixture {
    /// Write this fixture to `path`.
    pub fn write(&self, path: &Path, options: WriterOptions) {
        let header = McapHeader {
            profile: "ros2".to_string(),
            library: "roboedit-tests".to_string(),
        };
        let mut writer = McapWriter::create(path, &header, options).unwrap();
        for schema in &self.schemas {
            writer.write_schema(schema).unwrap();
        }
        for channel in &self.channels {
            writer.write_channel(channel).unwrap();
        }

        let mut sequences: BTreeMap<u16, u32> = BTreeMap::new();
        for (channel_id, log_time, publish_time, data) in &self.messages {
            let sequence = sequences.entry(*channel_id).or_insert(0);
            *sequence += 1;
            writer
                .write_message(&MessageRecord {
                    channel_id: *channel_id,
                    sequence: *sequence,
                    log_time: *log_time,
                    publish_time: *publish_time,
                    data: data.as_slice(),
                })
                .unwrap();
        }
        writer.finish().unwrap();
    }
}

/// Three channels sharing two schemas, ten ticks each.
///
/// - channel 0 `/imu` and channel 1 `/imu_back` use schema 1
/// - channel 2 `/chatter` uses schema 2
/// - ticks at log time 1000, 1100, ..., 1900; one message per channel per tick
pub fn standard_fixture() -> Fixture {
    let schemas = vec![
        SchemaRecord::new(1, "sensor_msgs/msg/Imu", "ros2msg", b"float64 x".to_vec()),
        SchemaRecord::new(2, "std_msgs/msg/String", "ros2msg", b"string data".to_vec()),
    ];
    let channels = vec![
        ChannelRecord::new(0, 1, "/imu", "cdr").with_metadata("offered_qos_profiles", ""),
        ChannelRecord::new(1, 1, "/imu_back", "cdr"),
        ChannelRecord::new(2, 2, "/chatter", "cdr"),
    ];

    let mut messages = Vec::new();
    let mut log_time = FIRST_LOG_TIME;
    while log_time <= LAST_LOG_TIME {
        for channel in &channels {
            let payload = format!("{}@{log_time}", channel.topic).into_bytes();
            messages.push((channel.id, log_time, log_time - PUBLISH_LAG, payload));
        }
        log_time += STEP;
    }

    Fixture {
        schemas,
        channels,
        messages,
    }
}

/// Write [`standard_fixture`] to `<dir>/<name>`.
pub fn write_standard_fixture(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    standard_fixture().write(&path, WriterOptions::default());
    path
}

// ============================================================================
// Reading back
// ============================================================================

/// A message read back with the `mcap` crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadMessage {
    pub channel_id: u16,
    pub topic: String,
    pub schema_name: Option<String>,
    pub sequence: u32,
    pub log_time: u64,
    pub publish_time: u64,
    pub data: Vec<u8>,
}

/// All messages of `path`, in file order.
pub fn read_messages(path: &Path) -> Vec<ReadMessage> {
    let buf = fs::read(path).unwrap();
    mcap::MessageStream::new(&buf)
        .unwrap()
        .map(|m| {
            let m = m.unwrap();
            ReadMessage {
                channel_id: m.channel.id,
                topic: m.channel.topic.clone(),
                schema_name: m.channel.schema.as_ref().map(|s| s.name.clone()),
                sequence: m.sequence,
                log_time: m.log_time,
                publish_time: m.publish_time,
                data: m.data.to_vec(),
            }
        })
        .collect()
}

/// Summary section of `path`; panics if absent.
pub fn read_summary(path: &Path) -> mcap::Summary {
    let buf = fs::read(path).unwrap();
    mcap::Summary::read(&buf).unwrap().expect("file has a summary")
}

/// Messages on `topic`.
pub fn messages_on<'a>(messages: &'a [ReadMessage], topic: &str) -> Vec<&'a ReadMessage> {
    messages.iter().filter(|m| m.topic == topic).collect()
}
