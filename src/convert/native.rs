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

use std::{fs::File, io::BufReader, path::Path};

use csv::StringRecord;

use super::{ColumnSpec, Converter, csv_reader, input_line};
use crate::error::ConvertError;

/// Runs the conversion in process.
pub struct NativeConverter {
    spec: ColumnSpec,
}

impl NativeConverter {
    pub fn new(spec: ColumnSpec) -> Self {
        Self { spec }
    }
}

impl Converter for NativeConverter {
    fn convert(&self, source: &Path) -> Result<Vec<StringRecord>, ConvertError> {
        let file = File::open(source)?;
        let mut reader = csv_reader(BufReader::new(file));

        reader
            .records()
            .enumerate()
            .map(|(i, result)| {
                let record = result?;
                self.spec.convert_record(&record, input_line(&record, i))
            })
            .collect()
    }

    fn describe(&self) -> String {
        "built-in converter".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::datetime::NaiveZone;

    #[test]
    fn converts_file_rows_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "b,2,2021-01-01T00:00:00,x\na,1,2021-01-02T00:00:00,y\n").unwrap();

        let converter = NativeConverter::new(ColumnSpec::new(vec![], vec![2], NaiveZone::Utc));
        let records = converter.convert(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(&records[0], vec!["b", "2", "1609459200", "x"]);
        assert_eq!(&records[1], vec!["a", "1", "1609545600", "y"]);
    }

    #[test]
    fn error_line_matches_file_line() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a,1,2021-01-01T00:00:00\n\n\nb,2,soon\n").unwrap();

        let converter = NativeConverter::new(ColumnSpec::new(vec![], vec![2], NaiveZone::Utc));
        let err = converter.convert(file.path()).unwrap_err();

        assert!(matches!(err, ConvertError::InvalidValue { line: 4, column: 3, .. }));
    }

    #[test]
    fn missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let converter = NativeConverter::new(ColumnSpec::new(vec![0], vec![], NaiveZone::Utc));

        let err = converter.convert(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
    }
}
