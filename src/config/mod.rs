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

//! Application configuration.
//!
//! This module manages the configuration file holding the defaults for column
//! selection, sort key, source handling and the converter to run. Every
//! setting can be overridden on the command line.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    convert::ColumnSpec,
    datetime::NaiveZone,
    pipeline::SourcePolicy,
    sort::DEFAULT_KEY_FIELDS,
};

const CONFIG_NAME: &str = "convert-sort-replace";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    pub date_columns: Vec<usize>,
    pub timestamp_columns: Vec<usize>,
    pub key_fields: Vec<usize>,
    pub naive_zone: NaiveZone,
    pub source_policy: SourcePolicy,

    /// External converter program; the built-in converter is used when unset.
    pub converter: Option<String>,
    pub converter_args: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            date_columns: vec![0],
            timestamp_columns: vec![2, 3],
            key_fields: DEFAULT_KEY_FIELDS.to_vec(),
            naive_zone: NaiveZone::Utc,
            source_policy: SourcePolicy::DeleteOnSuccess,
            converter: None,
            converter_args: vec![],
        }
    }
}

impl AppConfig {
    pub fn column_spec(&self) -> ColumnSpec {
        ColumnSpec::new(
            self.date_columns.clone(),
            self.timestamp_columns.clone(),
            self.naive_zone,
        )
    }
}

/// Loads the configuration from `path`, or from the per-user location when no
/// path is given, falling back to defaults if it cannot be read.
pub fn load_config(path: Option<&Path>) -> AppConfig {
    let loaded = match path {
        Some(path) => confy::load_path(path),
        None => confy::load(CONFIG_NAME, None),
    };

    loaded.unwrap_or_else(|e| {
        warn!("Using default configuration: {}", e);
        AppConfig::default()
    })
}

/// Stores `cfg` at `path`, or at the per-user location when no path is
/// given, and returns where it was written.
pub fn save_config(cfg: &AppConfig, path: Option<&Path>) -> Result<PathBuf, confy::ConfyError> {
    match path {
        Some(path) => {
            confy::store_path(path, cfg)?;
            Ok(path.to_path_buf())
        }
        None => {
            confy::store(CONFIG_NAME, None, cfg)?;
            confy::get_configuration_file_path(CONFIG_NAME, None)
        }
    }
}
