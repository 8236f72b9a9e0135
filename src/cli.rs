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

//! Command-line arguments for both binaries.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::{config::AppConfig, datetime::NaiveZone, pipeline::SourcePolicy};

/// Convert datetime columns of a CSV file, sort it into a target file and
/// remove the source.
#[derive(Parser, Debug)]
#[command(name = "convert-sort-replace", version)]
pub struct Args {
    /// Input CSV file, removed once the target has been written.
    pub source: PathBuf,

    /// Output file, created or replaced.
    pub target: PathBuf,

    /// Date columns (0-based, comma separated). Giving -d or -t replaces the
    /// configured column selection.
    #[arg(short = 'd', long, value_delimiter = ',', value_name = "COLS")]
    pub date_columns: Option<Vec<usize>>,

    /// Timestamp columns (0-based, comma separated).
    #[arg(short = 't', long, value_delimiter = ',', value_name = "COLS")]
    pub timestamp_columns: Option<Vec<usize>>,

    /// Sort key fields (0-based, comma separated).
    #[arg(short = 'k', long, value_delimiter = ',', value_name = "COLS")]
    pub key_fields: Option<Vec<usize>>,

    /// Zone for timestamps written without a UTC offset.
    #[arg(long, value_enum)]
    pub naive_zone: Option<NaiveZone>,

    /// Run this program as the converter instead of the built-in one.
    #[arg(long, value_name = "PROGRAM")]
    pub converter: Option<String>,

    /// Extra argument for the converter program, placed before the column flags.
    #[arg(long = "converter-arg", value_name = "ARG", allow_hyphen_values = true, requires = "converter")]
    pub converter_args: Vec<String>,

    /// Never remove the source.
    #[arg(long, conflicts_with = "delete_on_failure")]
    pub keep_source: bool,

    /// Remove the source even when the run fails.
    #[arg(long)]
    pub delete_on_failure: bool,

    /// Configuration file to use instead of the per-user one.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Store the effective settings as the new configuration.
    #[arg(long)]
    pub save_config: bool,

    /// More log output; repeat for trace level.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Overrides configuration values with those given on the command line.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if self.date_columns.is_some() || self.timestamp_columns.is_some() {
            cfg.date_columns = self.date_columns.clone().unwrap_or_default();
            cfg.timestamp_columns = self.timestamp_columns.clone().unwrap_or_default();
        }

        if let Some(key_fields) = &self.key_fields {
            cfg.key_fields = key_fields.clone();
        }
        if let Some(zone) = self.naive_zone {
            cfg.naive_zone = zone;
        }
        if let Some(converter) = &self.converter {
            cfg.converter = Some(converter.clone());
            cfg.converter_args = self.converter_args.clone();
        }

        if self.keep_source {
            cfg.source_policy = SourcePolicy::Never;
        } else if self.delete_on_failure {
            cfg.source_policy = SourcePolicy::Always;
        }
    }

    pub fn log_level(&self) -> &'static str {
        level(self.verbose, self.quiet)
    }
}

/// Replace dates with YYYYMMDD integers and timestamps with epoch seconds in
/// CSV read from standard input.
#[derive(Parser, Debug)]
#[command(name = "convert-datetimes", version)]
pub struct ConvertArgs {
    /// Date columns (0-based).
    #[arg(short = 'd', num_args = 0.., value_name = "COL")]
    pub date_columns: Vec<usize>,

    /// Timestamp columns (0-based).
    #[arg(short = 't', num_args = 0.., value_name = "COL")]
    pub timestamp_columns: Vec<usize>,

    /// Zone for timestamps written without a UTC offset.
    #[arg(long, value_enum, default_value_t = NaiveZone::Utc)]
    pub naive_zone: NaiveZone,

    /// More log output; repeat for trace level.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl ConvertArgs {
    pub fn log_level(&self) -> &'static str {
        // Quiet unless asked, the output stream is data.
        match self.verbose {
            0 => "warn",
            n => level(n - 1, false),
        }
    }
}

fn level(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_paths_are_required() {
        assert!(Args::try_parse_from(["convert-sort-replace"]).is_err());
        assert!(Args::try_parse_from(["convert-sort-replace", "in.csv"]).is_err());
        assert!(Args::try_parse_from(["convert-sort-replace", "in.csv", "out.csv"]).is_ok());
    }

    #[test]
    fn column_options_replace_configured_selection() {
        let args = Args::try_parse_from(["convert-sort-replace", "-t", "2,3", "in.csv", "out.csv"]).unwrap();
        let mut cfg = AppConfig::default();
        args.apply(&mut cfg);

        assert!(cfg.date_columns.is_empty());
        assert_eq!(cfg.timestamp_columns, [2, 3]);
    }

    #[test]
    fn no_options_keep_configuration() {
        let args = Args::try_parse_from(["convert-sort-replace", "in.csv", "out.csv"]).unwrap();
        let mut cfg = AppConfig::default();
        args.apply(&mut cfg);

        assert_eq!(cfg, AppConfig::default());
        assert_eq!(args.log_level(), "info");
    }

    #[test]
    fn source_policy_flags() {
        let mut cfg = AppConfig::default();
        Args::try_parse_from(["convert-sort-replace", "--delete-on-failure", "a", "b"])
            .unwrap()
            .apply(&mut cfg);
        assert_eq!(cfg.source_policy, SourcePolicy::Always);

        Args::try_parse_from(["convert-sort-replace", "--keep-source", "a", "b"])
            .unwrap()
            .apply(&mut cfg);
        assert_eq!(cfg.source_policy, SourcePolicy::Never);

        assert!(Args::try_parse_from(["convert-sort-replace", "--keep-source", "--delete-on-failure", "a", "b"]).is_err());
    }

    #[test]
    fn converter_arguments_may_look_like_flags() {
        let args = Args::try_parse_from([
            "convert-sort-replace",
            "--converter",
            "python3",
            "--converter-arg",
            "-u",
            "--converter-arg",
            "convert-datetimes.py",
            "in.csv",
            "out.csv",
        ])
        .unwrap();
        let mut cfg = AppConfig::default();
        args.apply(&mut cfg);

        assert_eq!(cfg.converter.as_deref(), Some("python3"));
        assert_eq!(cfg.converter_args, ["-u", "convert-datetimes.py"]);
    }

    #[test]
    fn filter_flags_take_several_values() {
        let args = ConvertArgs::try_parse_from(["convert-datetimes", "-d", "0", "-t", "2", "3"]).unwrap();

        assert_eq!(args.date_columns, [0]);
        assert_eq!(args.timestamp_columns, [2, 3]);
        assert_eq!(args.log_level(), "warn");
    }
}
