// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-file edit engine.
//!
//! [`McapEditor`] streams one source file into a new output file, applying
//! the run's [`EditConfig`] message by message:
//!
//! 1. trim window (skip before start, stop after end)
//! 2. topic deletion
//! 3. schema/channel emission on first use, with renamed channels moved to
//!    a freshly allocated ID
//! 4. log/publish time shift
//! 5. message write (sequence and payload unchanged)
//!
//! Nothing is buffered beyond the writer's current chunk.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::TryRngCore;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::{EditError, Result};
use crate::io::discovery::{output_path_for, same_file};
use crate::io::formats::mcap::{McapFileReader, McapWriter};
use crate::io::metadata::{ChannelRecord, MessageRecord, SchemaRecord};
use crate::rewriter::ids::ChannelIdAllocator;
use crate::rewriter::options::EditConfig;
use crate::transform::{TopicRenameTransform, TrimDecision, TrimWindow};

/// Statistics for one edited file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditStats {
    /// Source file
    pub input: PathBuf,
    /// Written file
    pub output: PathBuf,
    /// Messages read from the source (including the one that stopped a trim)
    pub messages_read: u64,
    /// Messages written
    pub messages_written: u64,
    /// Messages before the trim start
    pub messages_trimmed: u64,
    /// Messages on deleted topics
    pub messages_deleted: u64,
    /// Reading stopped at the trim end
    pub stopped_early: bool,
    /// Channel records written
    pub channels_written: usize,
    /// Channels written under a new topic
    pub channels_renamed: usize,
    /// Schema records written
    pub schemas_written: usize,
    /// Output size in bytes
    pub bytes_written: u64,
}

/// Which schemas and channels have been written to the current output.
///
/// Created per file and dropped with it. A channel's presence in the
/// remap table means its record has been written.
#[derive(Debug)]
pub struct EmissionState<R = OsRng> {
    schemas_written: HashSet<u16>,
    /// original channel id -> output channel id
    channel_map: HashMap<u16, u16>,
    channels_renamed: usize,
    allocator: Option<ChannelIdAllocator<R>>,
}

impl<R: TryRngCore> EmissionState<R> {
    /// Create empty state; `allocator` is required when renames are configured.
    pub fn new(allocator: Option<ChannelIdAllocator<R>>) -> Self {
        Self {
            schemas_written: HashSet::new(),
            channel_map: HashMap::new(),
            channels_renamed: 0,
            allocator,
        }
    }

    /// Output ID of an already written channel.
    pub fn output_id(&self, original: u16) -> Option<u16> {
        self.channel_map.get(&original).copied()
    }

    /// Write `schema` (once) and `channel`, returning the channel's output ID.
    ///
    /// A channel whose topic is renamed is written under the new topic and
    /// a newly allocated ID.
    pub fn emit_channel<W: Write>(
        &mut self,
        writer: &mut McapWriter<W>,
        channel: &ChannelRecord,
        schema: Option<&SchemaRecord>,
        rename: &TopicRenameTransform,
    ) -> Result<u16> {
        if let Some(id) = self.output_id(channel.id) {
            return Ok(id);
        }

        if let Some(schema) = schema {
            if !self.schemas_written.contains(&schema.id) {
                writer.write_schema(schema)?;
                self.schemas_written.insert(schema.id);
            }
        }

        let output_id = match rename.rename(&channel.topic) {
            Some(new_topic) => {
                let allocator = self.allocator.as_mut().ok_or_else(|| {
                    EditError::Other("rename configured without an id allocator".to_string())
                })?;
                let renamed = channel.renamed(allocator.allocate()?, new_topic);
                writer.write_channel(&renamed)?;
                self.channels_renamed += 1;
                debug!(
                    from = %channel.topic,
                    to = %renamed.topic,
                    original_id = channel.id,
                    new_id = renamed.id,
                    "channel renamed"
                );
                renamed.id
            }
            None => {
                writer.write_channel(channel)?;
                channel.id
            }
        };

        self.channel_map.insert(channel.id, output_id);
        Ok(output_id)
    }

    /// Schemas written so far.
    pub fn schemas_written(&self) -> usize {
        self.schemas_written.len()
    }

    /// Channels written so far.
    pub fn channels_written(&self) -> usize {
        self.channel_map.len()
    }

    /// Channels written under a new topic.
    pub fn channels_renamed(&self) -> usize {
        self.channels_renamed
    }
}

/// Edits MCAP files according to one [`EditConfig`].
///
/// Cheap to clone; every worker of a run holds one.
#[derive(Debug, Clone)]
pub struct McapEditor {
    config: Arc<EditConfig>,
    output_dir: PathBuf,
}

impl McapEditor {
    /// Create an editor writing into `output_dir`.
    pub fn new(config: Arc<EditConfig>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Edit `input` into `<output_dir>/<file name>`.
    pub fn process<P: AsRef<Path>>(&self, input: P) -> Result<EditStats> {
        let input = input.as_ref();
        let output = output_path_for(input, &self.output_dir)?;
        self.edit_file(input, output)
    }

    /// Edit `input` into `output`.
    pub fn edit_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<EditStats> {
        let input = input.as_ref();
        let output = output.as_ref();
        info!(path = %input.display(), "Processing");

        // the reader maps the input; truncating it underneath is fatal
        if same_file(input, output) {
            return Err(EditError::invalid_config(
                "output",
                format!("{} would overwrite its own input", output.display()),
            ));
        }

        let reader = McapFileReader::open(input)?;
        let file_stats = reader.statistics();
        let window = TrimWindow::resolve(
            self.config.trim_start,
            self.config.trim_end,
            file_stats.message_start_time,
            file_stats.message_end_time,
        )?;

        let allocator =
            (!self.config.rename.is_empty()).then(|| ChannelIdAllocator::new(reader.channel_ids()));
        let mut state = EmissionState::new(allocator);

        let mut writer = McapWriter::create(output, reader.header(), self.config.writer.clone())?;

        let mut stats = EditStats {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            ..EditStats::default()
        };
        self.copy_messages(&reader, &mut writer, &mut state, &window, &mut stats)?;

        let summary = writer.finish()?;
        stats.channels_written = state.channels_written();
        stats.channels_renamed = state.channels_renamed();
        stats.schemas_written = state.schemas_written();
        stats.bytes_written = summary.bytes_written;

        info!(
            path = %input.display(),
            output = %output.display(),
            read = stats.messages_read,
            written = stats.messages_written,
            trimmed = stats.messages_trimmed,
            deleted = stats.messages_deleted,
            stopped_early = stats.stopped_early,
            "Finished"
        );
        Ok(stats)
    }

    fn copy_messages<W: Write, R: TryRngCore>(
        &self,
        reader: &McapFileReader,
        writer: &mut McapWriter<W>,
        state: &mut EmissionState<R>,
        window: &TrimWindow,
        stats: &mut EditStats,
    ) -> Result<()> {
        let config = &*self.config;

        for message in reader.messages()? {
            let message = message?;
            stats.messages_read += 1;

            match window.decide(message.log_time) {
                TrimDecision::Keep => {}
                TrimDecision::Skip => {
                    stats.messages_trimmed += 1;
                    continue;
                }
                TrimDecision::Stop => {
                    stats.stopped_early = true;
                    break;
                }
            }

            let channel = &message.channel;
            if config.is_deleted(&channel.topic) {
                stats.messages_deleted += 1;
                continue;
            }

            let channel_id = match state.output_id(channel.id) {
                Some(id) => id,
                None => {
                    let record = reader
                        .channels()
                        .get(&channel.id)
                        .cloned()
                        .unwrap_or_else(|| ChannelRecord::from(&**channel));
                    let schema = channel.schema.as_ref().map(|s| {
                        reader
                            .schemas()
                            .get(&s.id)
                            .cloned()
                            .unwrap_or_else(|| SchemaRecord::from(&**s))
                    });
                    state.emit_channel(writer, &record, schema.as_ref(), &config.rename)?
                }
            };

            let (log_time, publish_time) =
                config
                    .time_shift
                    .apply(&channel.topic, message.log_time, message.publish_time)?;

            writer.write_message(&MessageRecord {
                channel_id,
                sequence: message.sequence,
                log_time,
                publish_time,
                data: &message.data[..],
            })?;
            stats.messages_written += 1;
        }

        Ok(())
    }
}
