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

//! Error types.
//!
//! Conversion failures are reported in the same shape the converter filter
//! prints them, `Line <n>, column <c>: <message>.`, with both numbers 1-based.

use std::{io, path::PathBuf, process::ExitStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Line {line}, column {column}: {message}.")]
    InvalidValue {
        line: u64,
        column: usize,
        message: String,
    },

    #[error("Line {line}, column {column}: missing field.")]
    MissingField { line: u64, column: usize },

    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to start converter {program:?}: {source}")]
    ConverterSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("converter exited with {status}: {stderr}")]
    ConverterFailed { status: ExitStatus, stderr: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source file {0:?} does not exist")]
    SourceMissing(PathBuf),

    #[error("cannot access {path:?}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("source {0:?} is not a regular file")]
    SourceNotFile(PathBuf),

    #[error("source and target both refer to {0:?}")]
    SamePath(PathBuf),

    #[error("invalid column selection: {0}")]
    InvalidColumns(String),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("failed to write target {path:?}: {source}")]
    WriteTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove source {path:?}: {source}")]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
