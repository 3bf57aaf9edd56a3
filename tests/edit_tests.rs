// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end tests for the per-file edit engine.

mod common;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::*;
use roboedit::{EditError, EditOptions, EditStats, McapEditor, McapFileReader, WriterOptions};

fn edit(input: &Path, out_dir: &Path, options: EditOptions) -> roboedit::Result<EditStats> {
    let config = Arc::new(options.resolve()?);
    McapEditor::new(config, out_dir).process(input)
}

fn setup(name: &str) -> (PathBuf, PathBuf, CleanupGuard) {
    let (dir, guard) = temp_dir(name);
    let input = write_standard_fixture(&dir, "input.mcap");
    let out_dir = dir.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    (input, out_dir, guard)
}

// ============================================================================
// Pass-through
// ============================================================================

#[test]
fn test_passthrough_preserves_messages() {
    let (input, out_dir, _guard) = setup("passthrough");

    let stats = edit(&input, &out_dir, EditOptions::default()).unwrap();
    let output = out_dir.join("input.mcap");
    assert_eq!(stats.output, output);
    assert_eq!(stats.messages_read, 30);
    assert_eq!(stats.messages_written, 30);
    assert_eq!(stats.schemas_written, 2);
    assert_eq!(stats.channels_written, 3);
    assert!(!stats.stopped_early);

    assert_eq!(read_messages(&input), read_messages(&output));

    let summary = read_summary(&output);
    let imu = &summary.channels[&0];
    assert_eq!(imu.topic, "/imu");
    assert_eq!(
        imu.metadata.get("offered_qos_profiles").map(String::as_str),
        Some("")
    );
    let stats = summary.stats.unwrap();
    assert_eq!(stats.message_count, 30);
    assert_eq!(stats.message_start_time, FIRST_LOG_TIME);
    assert_eq!(stats.message_end_time, LAST_LOG_TIME);
}

#[test]
fn test_header_is_carried_over() {
    let (input, out_dir, _guard) = setup("header");
    edit(&input, &out_dir, EditOptions::default()).unwrap();

    let reader = McapFileReader::open(out_dir.join("input.mcap")).unwrap();
    assert_eq!(reader.header().profile, "ros2");
    assert_eq!(reader.header().library, "roboedit-tests");
}

// ============================================================================
// Trim
// ============================================================================

#[test]
fn test_trim_window() {
    let (input, out_dir, _guard) = setup("trim");
    let options = EditOptions {
        trim_start: Some("1300".to_string()),
        trim_end: Some("1600".to_string()),
        ..EditOptions::default()
    };

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.messages_trimmed, 9);
    assert_eq!(stats.messages_written, 12);
    // the first message past the end is read, then reading stops
    assert_eq!(stats.messages_read, 22);
    assert!(stats.stopped_early);

    let messages = read_messages(&out_dir.join("input.mcap"));
    assert_eq!(messages.len(), 12);
    assert!(messages
        .iter()
        .all(|m| (1300..=1600).contains(&m.log_time)));
}

#[test]
fn test_trim_end_only() {
    let (input, out_dir, _guard) = setup("trim_end");
    let options = EditOptions {
        trim_end: Some("1250".to_string()),
        ..EditOptions::default()
    };

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.messages_written, 9);
    assert_eq!(stats.messages_trimmed, 0);
    assert!(stats.stopped_early);
}

#[test]
fn test_trim_end_stops_at_first_late_message() {
    let (dir, _guard) = temp_dir("trim_stop");
    let out_dir = dir.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();

    // /chatter at 1050 arrives after /imu at 1300 and must not be written
    let base = standard_fixture();
    let fixture = Fixture {
        messages: [(0u16, 1000u64), (1, 1100), (0, 1300), (2, 1050), (1, 1150)]
            .into_iter()
            .map(|(channel, t)| (channel, t, t - PUBLISH_LAG, b"x".to_vec()))
            .collect(),
        ..base
    };
    let input = dir.join("unordered.mcap");
    fixture.write(&input, WriterOptions::default());

    let options = EditOptions {
        trim_end: Some("1200".to_string()),
        ..EditOptions::default()
    };
    let stats = edit(&input, &out_dir, options).unwrap();
    assert!(stats.stopped_early);
    assert_eq!(stats.messages_read, 3);
    assert_eq!(stats.messages_written, 2);

    let times: Vec<u64> = read_messages(&out_dir.join("unordered.mcap"))
        .iter()
        .map(|m| m.log_time)
        .collect();
    assert_eq!(times, vec![1000, 1100]);
}

#[test]
fn test_trim_end_after_last_message_keeps_everything() {
    let (input, out_dir, _guard) = setup("trim_end_late");
    let options = EditOptions {
        trim_end: Some("5000".to_string()),
        ..EditOptions::default()
    };

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.messages_written, 30);
    assert!(!stats.stopped_early);
}

#[test]
fn test_trim_start_out_of_range() {
    let (input, out_dir, _guard) = setup("trim_range");

    for start in ["900", "1900", "2500"] {
        let options = EditOptions {
            trim_start: Some(start.to_string()),
            ..EditOptions::default()
        };
        let err = edit(&input, &out_dir, options).unwrap_err();
        match err {
            EditError::TrimOutOfRange {
                trim_start,
                message_start,
                message_end,
            } => {
                assert_eq!(trim_start.to_string(), start);
                assert_eq!(message_start, FIRST_LOG_TIME);
                assert_eq!(message_end, LAST_LOG_TIME);
            }
            other => panic!("unexpected error for {start}: {other}"),
        }
    }
}

#[test]
fn test_trim_start_at_first_message() {
    let (input, out_dir, _guard) = setup("trim_first");
    let options = EditOptions {
        trim_start: Some(FIRST_LOG_TIME.to_string()),
        ..EditOptions::default()
    };

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.messages_written, 30);
    assert_eq!(stats.messages_trimmed, 0);
}

// ============================================================================
// Delete
// ============================================================================

#[test]
fn test_delete_keeps_shared_schema() {
    let (input, out_dir, _guard) = setup("delete");
    let options = EditOptions {
        delete: vec!["/imu".to_string()],
        ..EditOptions::default()
    };

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.messages_deleted, 10);
    assert_eq!(stats.messages_written, 20);
    assert_eq!(stats.schemas_written, 2);
    assert_eq!(stats.channels_written, 2);

    let output = out_dir.join("input.mcap");
    let messages = read_messages(&output);
    assert!(messages_on(&messages, "/imu").is_empty());
    assert_eq!(messages_on(&messages, "/imu_back").len(), 10);

    let summary = read_summary(&output);
    assert_eq!(summary.schemas.len(), 2);
    assert!(!summary.channels.contains_key(&0));
}

#[test]
fn test_delete_all_users_drops_schema() {
    let (input, out_dir, _guard) = setup("delete_schema");
    let options = EditOptions {
        delete: vec!["/imu".to_string(), "/imu_back".to_string()],
        ..EditOptions::default()
    };

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.schemas_written, 1);

    let summary = read_summary(&out_dir.join("input.mcap"));
    assert!(!summary.schemas.contains_key(&1));
    assert!(summary.schemas.contains_key(&2));
}

#[test]
fn test_delete_everything() {
    let (input, out_dir, _guard) = setup("delete_all");
    let options = EditOptions {
        delete: vec![
            "/imu".to_string(),
            "/imu_back".to_string(),
            "/chatter".to_string(),
        ],
        ..EditOptions::default()
    };

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.messages_written, 0);
    assert_eq!(stats.channels_written, 0);
    assert!(read_messages(&out_dir.join("input.mcap")).is_empty());
}

// ============================================================================
// Rename
// ============================================================================

#[test]
fn test_rename_allocates_fresh_distinct_ids() {
    let (input, out_dir, _guard) = setup("rename");
    let mut options = EditOptions::default();
    options
        .add_rename_pairs(["/imu=/imu/data", "/chatter=/chat"])
        .unwrap();

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.channels_renamed, 2);
    assert_eq!(stats.messages_written, 30);

    let output = out_dir.join("input.mcap");
    let messages = read_messages(&output);
    assert!(messages_on(&messages, "/imu").is_empty());
    assert!(messages_on(&messages, "/chatter").is_empty());

    let imu = messages_on(&messages, "/imu/data");
    let chat = messages_on(&messages, "/chat");
    assert_eq!(imu.len(), 10);
    assert_eq!(chat.len(), 10);

    let imu_id = imu[0].channel_id;
    let chat_id = chat[0].channel_id;
    assert_ne!(imu_id, chat_id);
    for id in [imu_id, chat_id] {
        assert!(![0, 1, 2].contains(&id), "renamed channel reused id {id}");
    }
    assert!(imu.iter().all(|m| m.channel_id == imu_id));
    assert_eq!(imu[0].schema_name.as_deref(), Some("sensor_msgs/msg/Imu"));

    let sequences: Vec<u32> = imu.iter().map(|m| m.sequence).collect();
    assert_eq!(sequences, (1..=10).collect::<Vec<_>>());

    // untouched channel keeps its id
    assert!(messages_on(&messages, "/imu_back")
        .iter()
        .all(|m| m.channel_id == 1));

    let summary = read_summary(&output);
    let topics: BTreeSet<&str> = summary.channels.values().map(|c| c.topic.as_str()).collect();
    assert_eq!(topics, BTreeSet::from(["/chat", "/imu/data", "/imu_back"]));
    let ids: HashSet<u16> = summary.channels.keys().copied().collect();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_rename_and_delete_same_topic_deletes() {
    let (input, out_dir, _guard) = setup("rename_delete");
    let mut options = EditOptions {
        delete: vec!["/imu".to_string()],
        ..EditOptions::default()
    };
    options.add_rename_pairs(["/imu=/imu/data"]).unwrap();

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.channels_renamed, 0);
    assert_eq!(stats.messages_deleted, 10);

    let messages = read_messages(&out_dir.join("input.mcap"));
    assert!(messages_on(&messages, "/imu").is_empty());
    assert!(messages_on(&messages, "/imu/data").is_empty());
}

#[test]
fn test_invalid_rename_target_rejected_before_editing() {
    let mut options = EditOptions::default();
    options.add_rename_pairs(["/imu=imu_data"]).unwrap();
    let err = options.resolve().unwrap_err();
    assert!(err.to_string().contains("invalid new topic name: imu_data"));
}

// ============================================================================
// Time shift
// ============================================================================

#[test]
fn test_shift_filtered_topics() {
    let (input, out_dir, _guard) = setup("shift");
    let options = EditOptions {
        shift_log: Some("1us".to_string()),
        shift_pub: Some("-5ns".to_string()),
        topics: vec!["/chatter".to_string()],
        ..EditOptions::default()
    };

    edit(&input, &out_dir, options).unwrap();

    let before = read_messages(&input);
    let after = read_messages(&out_dir.join("input.mcap"));
    assert_eq!(before.len(), after.len());

    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.topic, new.topic);
        assert_eq!(old.data, new.data);
        if old.topic == "/chatter" {
            assert_eq!(new.log_time, old.log_time + 1_000);
            assert_eq!(new.publish_time, old.publish_time - 5);
        } else {
            assert_eq!(new.log_time, old.log_time);
            assert_eq!(new.publish_time, old.publish_time);
        }
    }
}

#[test]
fn test_shift_applies_after_trim() {
    let (input, out_dir, _guard) = setup("shift_trim");
    let options = EditOptions {
        trim_start: Some("1500".to_string()),
        shift_log: Some("1s".to_string()),
        ..EditOptions::default()
    };

    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.messages_written, 15);

    let messages = read_messages(&out_dir.join("input.mcap"));
    assert_eq!(messages[0].log_time, 1_000_000_000 + 1_500);
    assert_eq!(messages[0].publish_time, 1_500 - PUBLISH_LAG);
}

#[test]
fn test_shift_below_zero_fails() {
    let (input, out_dir, _guard) = setup("shift_overflow");
    let options = EditOptions {
        shift_log: Some("-2us".to_string()),
        ..EditOptions::default()
    };

    let err = edit(&input, &out_dir, options).unwrap_err();
    assert!(matches!(err, EditError::TimeOverflow { .. }));
}

// ============================================================================
// Output encoding
// ============================================================================

fn compressions(path: &Path) -> BTreeSet<String> {
    McapFileReader::open(path)
        .unwrap()
        .indexes()
        .chunk_compressions
        .clone()
}

#[test]
fn test_compression_selection_visible_in_chunk_indexes() {
    for (name, expected) in [("lz4", "lz4"), ("none", ""), ("zstd", "zstd")] {
        let (input, out_dir, _guard) = setup(&format!("compression_{name}"));
        let options = EditOptions {
            compression: Some(name.to_string()),
            chunk_size: Some(256),
            ..EditOptions::default()
        };

        edit(&input, &out_dir, options).unwrap();
        let output = out_dir.join("input.mcap");
        assert_eq!(compressions(&output), BTreeSet::from([expected.to_string()]));
        assert!(read_summary(&output).chunk_indexes.len() > 1);
        assert_eq!(read_messages(&input), read_messages(&output));
    }
}

#[test]
fn test_no_chunking() {
    let (input, out_dir, _guard) = setup("no_chunking");
    let options = EditOptions {
        no_chunking: true,
        ..EditOptions::default()
    };

    edit(&input, &out_dir, options).unwrap();
    let output = out_dir.join("input.mcap");
    let summary = read_summary(&output);
    assert!(summary.chunk_indexes.is_empty());
    assert_eq!(summary.stats.unwrap().message_count, 30);
    assert_eq!(read_messages(&output).len(), 30);
}

#[test]
fn test_no_index_and_no_crc() {
    let (input, out_dir, _guard) = setup("no_index");
    let options = EditOptions {
        no_index: true,
        no_crc: true,
        ..EditOptions::default()
    };

    edit(&input, &out_dir, options).unwrap();
    let output = out_dir.join("input.mcap");
    let reader = McapFileReader::open(&output).unwrap();
    assert_eq!(reader.indexes().chunk_index_count, 0);
    assert_eq!(reader.footer().unwrap().summary_crc, 0);
    assert_eq!(reader.statistics().message_count, 30);
    assert_eq!(read_messages(&output).len(), 30);
}

// ============================================================================
// Sources without a summary
// ============================================================================

#[test]
fn test_source_without_summary_is_scanned() {
    let (dir, _guard) = temp_dir("no_summary");
    let input = dir.join("bare.mcap");
    let bare = WriterOptions {
        emit_statistics: false,
        emit_summary_records: false,
        emit_chunk_indexes: false,
        emit_summary_offsets: false,
        ..WriterOptions::default()
    };
    standard_fixture().write(&input, bare);

    let reader = McapFileReader::open(&input).unwrap();
    assert!(!reader.has_summary());
    assert_eq!(reader.statistics().message_count, 30);
    assert_eq!(reader.statistics().message_start_time, FIRST_LOG_TIME);
    assert_eq!(reader.channels().len(), 3);

    let out_dir = dir.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let options = EditOptions {
        trim_start: Some("1100".to_string()),
        ..EditOptions::default()
    };
    let stats = edit(&input, &out_dir, options).unwrap();
    assert_eq!(stats.messages_written, 27);
    assert_eq!(read_summary(&out_dir.join("bare.mcap")).stats.unwrap().message_count, 27);
}

#[test]
fn test_output_over_input_rejected() {
    let (input, _out_dir, _guard) = setup("self_overwrite");
    let same_dir = input.parent().unwrap();

    let err = edit(&input, same_dir, EditOptions::default()).unwrap_err();
    assert!(matches!(err, EditError::InvalidConfig { .. }));
    assert!(err.to_string().contains("would overwrite its own input"));
    assert_eq!(read_messages(&input).len(), 30);
}

#[test]
fn test_missing_input_is_io_error() {
    let (dir, _guard) = temp_dir("missing");
    let err = edit(&dir.join("absent.mcap"), &dir, EditOptions::default()).unwrap_err();
    assert!(matches!(err, EditError::Io { .. }));
}
