// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - show format, index space and metadata of a dataset.

use std::sync::Arc;

use clap::Args;
use voxio::Request;

use crate::common::{format_metadata, parse_index, Context, Result};

/// Inspect a dataset.
#[derive(Args, Clone, Debug)]
pub struct InspectCmd {
    /// Dataset location (path or mem://name)
    #[arg(value_name = "LOCATION")]
    input: String,

    /// Show metadata of one unit, given as dim=coord pairs (e.g. "c=0,z=3")
    #[arg(short, long, value_name = "INDEX")]
    unit: Option<String>,

    /// List every unit with its metadata
    #[arg(long)]
    units: bool,
}

impl InspectCmd {
    pub fn run(self, ctx: &Context) -> Result<()> {
        let request = Arc::new(Request::new(self.input.as_str()));
        let mut reader = ctx.registry.open_reader(request, &ctx.options)?;

        println!("=== {} ===", self.input);
        println!("Format: {}", reader.format().name());
        println!("Index space: {}", reader.index_space());
        println!("Units: {}", reader.len());
        println!();
        println!("Metadata:");
        println!("{}", format_metadata(&reader.get_metadata(None)?));

        if let Some(unit) = &self.unit {
            let index = parse_index(unit)?;
            println!();
            println!("Unit {index}:");
            println!("{}", format_metadata(&reader.get_metadata(Some(&index))?));
        }

        if self.units {
            println!();
            let indices: Vec<_> = reader.index_space().iter().collect();
            for index in indices {
                let meta = reader.get_metadata(Some(&index))?;
                println!("  {index} {}", serde_json::Value::Object(meta));
            }
        }

        reader.close()?;
        Ok(())
    }
}
