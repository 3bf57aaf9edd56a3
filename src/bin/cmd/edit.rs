// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Edit command - delete, rename, trim, time-shift and recompress topics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use tracing::info;

use crate::common::{format_bytes, format_duration, ProgressBar, Result};
use roboedit::{
    collect_edit_inputs, ensure_distinct_output, ensure_output_dir, DispatchPipeline, EditOptions,
    McapEditor,
};

/// Edit MCAP files into an output directory.
#[derive(Args, Clone, Debug)]
pub struct EditCmd {
    /// Input .mcap file, or a directory scanned recursively
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Output directory (created if missing; must differ from the input directory)
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Rename topics (format: /old=/new)
    #[arg(short, long, value_name = "OLD=NEW", value_delimiter = ',')]
    rename: Vec<String>,

    /// Delete topics
    #[arg(short, long, value_name = "TOPIC", value_delimiter = ',')]
    delete: Vec<String>,

    /// Drop messages logged before this time (Unix ns or date string)
    #[arg(short = 's', long, value_name = "TIME")]
    trim_start: Option<String>,

    /// Stop at the first message logged after this time
    #[arg(short = 'e', long, value_name = "TIME")]
    trim_end: Option<String>,

    /// Shift log times (e.g. "1.5s", "-250ms")
    #[arg(short = 'l', long, value_name = "DURATION", allow_hyphen_values = true)]
    shift_log: Option<String>,

    /// Shift publish times
    #[arg(short = 'p', long, value_name = "DURATION", allow_hyphen_values = true)]
    shift_pub: Option<String>,

    /// Restrict time shifts to these topics
    #[arg(short, long, value_name = "TOPIC", value_delimiter = ',')]
    topics: Vec<String>,

    /// Chunk compression: zstd, lz4 or none
    #[arg(short, long, value_name = "ALGO")]
    compression: Option<String>,

    /// Compression level: 0 default, 1 fastest, 2 better, 3 best
    #[arg(short = 'n', long, value_name = "LEVEL")]
    compression_level: Option<u8>,

    /// Target uncompressed chunk size in bytes
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Write messages outside chunks
    #[arg(long)]
    no_chunking: bool,

    /// Skip data, chunk and summary CRCs
    #[arg(long)]
    no_crc: bool,

    /// Skip message indexes, chunk indexes and summary offsets
    #[arg(long)]
    no_index: bool,

    /// Worker threads (default: 2 x CPUs + 1)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// TOML edit plan; command-line flags override its values
    #[arg(long, value_name = "PLAN")]
    config: Option<PathBuf>,
}

impl EditCmd {
    pub fn run(self) -> Result<()> {
        let options = self.edit_options()?;
        if options.nothing_to_do() {
            info!("Nothing to do");
            return Ok(());
        }
        let config = Arc::new(options.resolve()?);

        ensure_distinct_output(&self.input, &self.output)?;
        let files = collect_edit_inputs(&self.input, &self.output)?;
        if files.is_empty() {
            info!(path = %self.input.display(), "No .mcap files found");
            return Ok(());
        }
        if ensure_output_dir(&self.output)? {
            info!(path = %self.output.display(), "Created output directory");
        }

        let started = Instant::now();
        let pipeline = DispatchPipeline::new(McapEditor::new(config, &self.output));
        let progress = ProgressBar::new(files.len() as u64, "edit");
        let report = pipeline.run_with(&files, |stats| {
            let name = stats
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.file_done(&name);
        })?;

        let elapsed = started.elapsed();
        progress.finish_with_message(format!("{} files", report.completed.len()));
        info!(
            files = report.completed.len(),
            workers = report.workers,
            messages = report.messages_written(),
            bytes = %format_bytes(report.bytes_written()),
            elapsed = %format_duration(elapsed.as_nanos() as u64),
            "Done"
        );
        Ok(())
    }

    /// Plan file (if any) overridden by command-line flags.
    fn edit_options(&self) -> Result<EditOptions> {
        let mut cli = EditOptions {
            delete: self.delete.clone(),
            topics: self.topics.clone(),
            trim_start: self.trim_start.clone(),
            trim_end: self.trim_end.clone(),
            shift_log: self.shift_log.clone(),
            shift_pub: self.shift_pub.clone(),
            compression: self.compression.clone(),
            compression_level: self.compression_level,
            chunk_size: self.chunk_size,
            no_chunking: self.no_chunking,
            no_crc: self.no_crc,
            no_index: self.no_index,
            jobs: self.jobs,
            ..EditOptions::default()
        };
        cli.add_rename_pairs(&self.rename)?;

        Ok(match &self.config {
            Some(plan) => EditOptions::load(plan)?.merge(cli),
            None => cli,
        })
    }
}
