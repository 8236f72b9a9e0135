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

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
    process::{Command, Stdio},
};

use csv::StringRecord;
use tracing::debug;

use super::{ColumnSpec, Converter, csv_reader};
use crate::error::ConvertError;

/// Runs the conversion in an external program.
///
/// The program is started with its configured arguments followed by the
/// `-d`/`-t` flags of the column selection. The source file is its standard
/// input, and its standard output is parsed as CSV while it runs.
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    spec: ColumnSpec,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>, spec: ColumnSpec) -> Self {
        Self {
            program: program.into(),
            args,
            spec,
        }
    }
}

impl Converter for CommandConverter {
    fn convert(&self, source: &Path) -> Result<Vec<StringRecord>, ConvertError> {
        let input = File::open(source)?;

        // Collected in a file so a chatty converter cannot stall on a full
        // stderr pipe while stdout is being read.
        let mut stderr_file = tempfile::tempfile()?;

        let column_args = self.spec.command_args();
        debug!(program = %self.program, args = ?self.args, columns = ?column_args, "starting converter");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(&column_args)
            .stdin(Stdio::from(input))
            .stdout(Stdio::piped())
            .stderr(Stdio::from(stderr_file.try_clone()?))
            .spawn()
            .map_err(|source| ConvertError::ConverterSpawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("converter stdout was not captured"))?;

        // The reader owns stdout and closes it before waiting on the child.
        let parsed: Result<Vec<StringRecord>, csv::Error> = csv_reader(stdout).records().collect();
        let status = child.wait()?;

        if !status.success() {
            let mut captured = Vec::new();
            stderr_file.seek(SeekFrom::Start(0))?;
            stderr_file.read_to_end(&mut captured)?;
            let stderr = String::from_utf8_lossy(&captured).trim().to_string();

            // A silent failure after unreadable output is most likely the
            // converter dying on the pipe closed by the parse error.
            return Err(match parsed {
                Err(e) if stderr.is_empty() => ConvertError::Csv(e),
                _ => ConvertError::ConverterFailed { status, stderr },
            });
        }

        Ok(parsed?)
    }

    fn describe(&self) -> String {
        format!("external converter {:?}", self.program)
    }
}
