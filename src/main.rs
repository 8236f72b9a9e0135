// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! `convert-sort-replace <source_file> <target_file>`
//!
//! Loads the configuration, applies command-line overrides and runs the
//! pipeline. Missing arguments are a usage error and leave every file
//! untouched.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use convert_sort_replace::{
    cli::Args,
    config,
    logging,
    pipeline::{self, Options},
};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level());

    let mut config = config::load_config(args.config.as_deref());
    args.apply(&mut config);

    if args.save_config {
        let path = config::save_config(&config, args.config.as_deref()).context("Failed to save configuration")?;
        info!(path = %path.display(), "Saved configuration");
    }

    let converter = pipeline::build_converter(&config).context("Invalid configuration")?;

    let summary = pipeline::run(converter.as_ref(), &Options::from(&config), &args.source, &args.target)
        .with_context(|| format!("Failed to convert {}", args.source.display()))?;

    info!(rows = summary.rows, source_removed = summary.source_removed, "Done");

    Ok(())
}
