// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Formats command - list the registry.

use clap::Args;

use crate::common::{Context, Result};

/// List registered formats.
#[derive(Args, Clone, Debug)]
pub struct FormatsCmd {
    /// Print names only, one per line
    #[arg(long)]
    names: bool,
}

impl FormatsCmd {
    pub fn run(self, ctx: &Context) -> Result<()> {
        if self.names {
            for name in ctx.registry.names() {
                println!("{name}");
            }
        } else {
            println!("{}", ctx.registry);
        }
        Ok(())
    }
}
