// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Convert command - copy a dataset into whichever format accepts the output.

use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;
use tracing::info;
use voxio::{Request, LAYOUT_KEY};

use crate::common::{Context, Result};

/// Copy every unit and the metadata of a dataset.
#[derive(Args, Clone, Debug)]
pub struct ConvertCmd {
    /// Source dataset
    #[arg(value_name = "INPUT")]
    input: String,

    /// Destination dataset; its location picks the output format
    #[arg(value_name = "OUTPUT")]
    output: String,

    /// Replace an existing dataset at the destination
    #[arg(long)]
    overwrite: bool,

    /// Create missing parent directories of the destination
    #[arg(long)]
    create_parents: bool,

    /// Compression level for compressing formats
    #[arg(long, value_name = "LEVEL")]
    compression_level: Option<i32>,

    /// Driver option as key=value (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    extra: Vec<String>,
}

impl ConvertCmd {
    pub fn run(self, ctx: &Context) -> Result<()> {
        let mut reader = ctx
            .registry
            .open_reader(Arc::new(Request::new(self.input.as_str())), &ctx.options)?;
        let layout = reader
            .layout()
            .with_context(|| format!("reading layout of {}", self.input))?;

        let mut options = ctx.options.clone().layout(layout);
        options.overwrite |= self.overwrite;
        options.create_parents |= self.create_parents;
        if let Some(level) = self.compression_level {
            options.compression_level = Some(level);
        }
        for pair in &self.extra {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Invalid option '{pair}', expected key=value"))?;
            options.extra.insert(key.to_string(), value.to_string());
        }

        let mut writer = ctx
            .registry
            .open_writer(Arc::new(Request::new(self.output.as_str())), &options)?;

        let mut metadata = reader.get_metadata(None)?;
        metadata.remove(LAYOUT_KEY);

        let mut copied = 0usize;
        writer.scoped(|writer| {
            for item in reader.iter()? {
                let (index, unit) = item?;
                writer.set_data(unit, &index)?;
                copied += 1;
            }
            writer.set_metadata(metadata)
        })?;
        reader.close()?;

        info!(units = copied, input = %self.input, output = %self.output, "converted");
        println!(
            "Converted {} units: {} ({}) -> {} ({})",
            copied,
            self.input,
            reader.format().name(),
            self.output,
            writer.format().name()
        );
        Ok(())
    }
}
