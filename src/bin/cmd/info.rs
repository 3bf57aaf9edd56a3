// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Info command - show header, summary and topic details.

use std::path::PathBuf;

use clap::Args;

use crate::common::Result;
use roboedit::McapFileReader;

/// Show file details.
#[derive(Args, Clone, Debug)]
pub struct InfoCmd {
    /// Input .mcap file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl InfoCmd {
    pub fn run(self) -> Result<()> {
        let info = McapFileReader::open(&self.file)?.info();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
            return Ok(());
        }

        let stats = &info.statistics;
        println!("Header Library:         {}", info.header.library);
        println!("Header Profile:         {}", info.header.profile);
        println!("Summary Start:          {}", info.footer.summary_start);
        println!("Summary Offset Start:   {}", info.footer.summary_offset_start);
        println!("Summary CRC:            {}", info.footer.summary_crc);
        println!("Schema Count:           {}", stats.schema_count);
        println!("Chunk Count:            {}", stats.chunk_count);
        println!("Metadata Count:         {}", stats.metadata_count);
        println!("Attachment Count:       {}", stats.attachment_count);
        println!("Message Start Time:     {}", stats.message_start_time);
        println!("Message End Time:       {}", stats.message_end_time);
        println!("Message Count:          {}", stats.message_count);
        println!("Metadata Index Count:   {}", info.indexes.metadata_indexes.len());
        println!("Attachment Index Count: {}", info.indexes.attachment_index_count);
        println!("Chunk Index Count:      {}", info.indexes.chunk_index_count);
        println!("Topic Count:            {}", stats.channel_count);

        for metadata in &info.indexes.metadata_indexes {
            println!(
                "Metadata Name: {} | Offset: {} | Length: {}",
                metadata.name, metadata.offset, metadata.length
            );
        }

        for topic in &info.topics {
            println!(
                "Topic ID: {} | Topic: {} | Message Count: {} | Topic Encoding: {} | \
                 Schema ID: {} | Schema Name: {} | Schema Encoding: {}",
                topic.id,
                topic.topic,
                topic.message_count,
                topic.message_encoding,
                topic.schema_id,
                topic.schema_name,
                topic.schema_encoding
            );
        }

        Ok(())
    }
}
