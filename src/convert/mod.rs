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

//! Row-wise datetime conversion.
//!
//! A [`ColumnSpec`] selects which fields of each CSV row hold dates and which
//! hold timestamps. Rows are converted one at a time: date columns first, then
//! timestamp columns, with every other field passed through untouched.
//!
//! The pipeline reaches a converter through the [`Converter`] trait, so the
//! conversion can run in process ([`NativeConverter`]) or in an external
//! program that speaks the same `-d`/`-t` flags ([`CommandConverter`]).

mod command;
mod native;

pub use command::CommandConverter;
pub use native::NativeConverter;

use std::{
    collections::HashSet,
    io::{Read, Write},
    path::Path,
};

use csv::StringRecord;

use crate::{
    datetime::{self, DateTimeError, NaiveZone},
    error::ConvertError,
};

/// Produces converted records from a source file.
pub trait Converter {
    /// Reads `source` and returns its rows with all selected columns
    /// converted, in input order.
    fn convert(&self, source: &Path) -> Result<Vec<StringRecord>, ConvertError>;

    /// Short description used in log output.
    fn describe(&self) -> String;
}

/// Selection of date and timestamp columns, all 0-based.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    pub date_columns: Vec<usize>,
    pub timestamp_columns: Vec<usize>,
    pub naive_zone: NaiveZone,
}

impl ColumnSpec {
    pub fn new(date_columns: Vec<usize>, timestamp_columns: Vec<usize>, naive_zone: NaiveZone) -> Self {
        Self {
            date_columns,
            timestamp_columns,
            naive_zone,
        }
    }

    /// Checks that at least one column is selected and that no column is
    /// selected as both a date and a timestamp.
    pub fn validate(&self) -> Result<(), String> {
        if self.date_columns.is_empty() && self.timestamp_columns.is_empty() {
            return Err("no date or timestamp columns selected".to_string());
        }

        let dates: HashSet<usize> = self.date_columns.iter().copied().collect();
        if let Some(col) = self.timestamp_columns.iter().find(|c| dates.contains(c)) {
            return Err(format!("column {col} is selected as both a date and a timestamp"));
        }

        Ok(())
    }

    /// Converts the selected fields of a single row.
    ///
    /// # Arguments
    ///
    /// * `record` - The row as read from the input.
    /// * `line` - The 1-based row number, used in error reports.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::MissingField`] if the row is too short to hold a
    /// selected column, or [`ConvertError::InvalidValue`] if a selected field is
    /// not a valid ISO-8601 value.
    pub fn convert_record(&self, record: &StringRecord, line: u64) -> Result<StringRecord, ConvertError> {
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();

        for &col in &self.date_columns {
            let value = fields
                .get(col)
                .ok_or(ConvertError::MissingField { line, column: col + 1 })?;
            let converted = datetime::to_date_int(value).map_err(|e| invalid(line, col, e))?;
            fields[col] = converted;
        }

        for &col in &self.timestamp_columns {
            let value = fields
                .get(col)
                .ok_or(ConvertError::MissingField { line, column: col + 1 })?;
            let converted = datetime::to_epoch(value, self.naive_zone).map_err(|e| invalid(line, col, e))?;
            fields[col] = converted.to_string();
        }

        Ok(StringRecord::from(fields))
    }

    /// The flags an external converter program expects for this selection.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if !self.date_columns.is_empty() {
            args.push("-d".to_string());
            args.extend(self.date_columns.iter().map(ToString::to_string));
        }
        if !self.timestamp_columns.is_empty() {
            args.push("-t".to_string());
            args.extend(self.timestamp_columns.iter().map(ToString::to_string));
        }

        args
    }
}

fn invalid(line: u64, col: usize, e: DateTimeError) -> ConvertError {
    ConvertError::InvalidValue {
        line,
        column: col + 1,
        message: e.to_string(),
    }
}

/// Converts CSV rows from `input` and writes them to `output` as they are
/// read, returning the number of rows written.
///
/// Stops at the first row that fails to convert; rows before it have already
/// been written.
pub fn convert_stream<R: Read, W: Write>(spec: &ColumnSpec, input: R, output: W) -> Result<u64, ConvertError> {
    let mut reader = csv_reader(input);
    let mut writer = csv_writer(output);
    let mut rows = 0;

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let converted = spec.convert_record(&record, input_line(&record, i))?;
        writer.write_record(&converted)?;
        rows += 1;
    }

    writer.flush()?;
    Ok(rows)
}

/// The line a record starts on in the input, which differs from its index once
/// blank lines have been skipped.
pub(crate) fn input_line(record: &StringRecord, index: usize) -> u64 {
    record.position().map_or(index as u64 + 1, |p| p.line())
}

/// Reader for header-less rows of varying length.
pub(crate) fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

/// Writer with minimal quoting and `\n` line endings.
pub(crate) fn csv_writer<W: Write>(output: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(output)
}
