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

//! `convert-datetimes -d <cols>... -t <cols>...`
//!
//! Reads CSV rows from standard input and writes them to standard output with
//! date columns replaced by `YYYYMMDD` integers and timestamp columns by epoch
//! seconds. This is the converter protocol the main tool speaks to external
//! programs, so it can also serve as one.

use std::{
    io::{self, BufWriter},
    process::ExitCode,
};

use clap::{CommandFactory, Parser, error::ErrorKind};
use tracing::debug;

use convert_sort_replace::{
    cli::ConvertArgs,
    convert::{self, ColumnSpec},
    logging,
};

// Matches the status of the converter this tool replaces.
const FAILURE: u8 = 255;

fn main() -> ExitCode {
    let args = ConvertArgs::parse();
    logging::init(args.log_level());

    let spec = ColumnSpec::new(args.date_columns, args.timestamp_columns, args.naive_zone);
    if let Err(e) = spec.validate() {
        ConvertArgs::command().error(ErrorKind::MissingRequiredArgument, e).exit();
    }

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());

    match convert::convert_stream(&spec, stdin, stdout) {
        Ok(rows) => {
            debug!(rows, "Converted");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(FAILURE)
        }
    }
}
