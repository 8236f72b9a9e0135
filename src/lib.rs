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

//! # Convert, sort and replace CSV files.
//!
//! Normalizes the date and timestamp columns of a header-less CSV file, sorts
//! the rows by their leading key fields and writes them to a target file,
//! removing the source once the target is in place.
//!
//! * [`datetime`] holds the ISO-8601 rules: dates become `YYYYMMDD` integers
//!   and timestamps become epoch seconds.
//! * [`convert`] applies those rules to rows, either in process or through an
//!   external converter program.
//! * [`sort`] orders the converted rows.
//! * [`pipeline`] ties the steps together and decides the fate of the source.

pub mod cli;
pub mod config;
pub mod convert;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod sort;
