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

//! Convert, sort and replace.
//!
//! A run performs the following steps in order:
//!
//! 1. **Checks**: the source must be an existing regular file and must not be
//!    the same file as the target. Nothing is touched if a check fails.
//! 2. **Convert**: the [`Converter`] turns the source rows into converted
//!    records.
//! 3. **Sort**: records are ordered by the configured key fields.
//! 4. **Write**: the target is written to a temporary file in its own
//!    directory and renamed into place, so readers never observe a partial
//!    target.
//! 5. **Remove**: the source is deleted according to the [`SourcePolicy`].
//!
//! # Source handling
//!
//! By default the source is only deleted once the target has been written.
//! [`SourcePolicy::Always`] deletes it even after a failed run, which loses the
//! input data whenever conversion fails.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    convert::{CommandConverter, Converter, NativeConverter, csv_writer},
    error::PipelineError,
    sort,
};

/// What happens to the source file at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourcePolicy {
    /// Delete the source only after the target has been written.
    #[default]
    DeleteOnSuccess,

    /// Delete the source whether or not the run succeeded.
    Always,

    /// Never delete the source.
    Never,
}

impl SourcePolicy {
    fn should_remove(self, succeeded: bool) -> bool {
        match self {
            SourcePolicy::DeleteOnSuccess => succeeded,
            SourcePolicy::Always => true,
            SourcePolicy::Never => false,
        }
    }
}

/// Settings for a single run that are independent of the converter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub key_fields: Vec<usize>,
    pub source_policy: SourcePolicy,
}

impl From<&AppConfig> for Options {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            key_fields: cfg.key_fields.clone(),
            source_policy: cfg.source_policy,
        }
    }
}

/// Outcome of a successful run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub rows: usize,
    pub source_removed: bool,
}

/// Creates the converter selected by the configuration.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidColumns`] if the column selection is empty
/// or overlapping.
pub fn build_converter(cfg: &AppConfig) -> Result<Box<dyn Converter>, PipelineError> {
    let spec = cfg.column_spec();
    spec.validate().map_err(PipelineError::InvalidColumns)?;

    Ok(match &cfg.converter {
        Some(program) => Box::new(CommandConverter::new(program.clone(), cfg.converter_args.clone(), spec)),
        None => Box::new(NativeConverter::new(spec)),
    })
}

/// Converts `source`, sorts the result into `target` and removes `source`.
///
/// # Arguments
///
/// * `converter` - Produces the converted rows of the source.
/// * `options` - Sort key and source policy.
/// * `source` - The input file.
/// * `target` - The output file, created or replaced.
///
/// # Errors
///
/// Returns an error if a pre-run check fails, if conversion or writing the
/// target fails, or if the source cannot be removed after a successful run.
/// When the run fails under [`SourcePolicy::Always`] the source is still
/// removed and the original failure is returned.
pub fn run(converter: &dyn Converter, options: &Options, source: &Path, target: &Path) -> Result<Summary, PipelineError> {
    check_paths(source, target)?;

    info!(
        source = %source.display(),
        target = %target.display(),
        "Converting with {}",
        converter.describe()
    );

    let result = convert_sort_write(converter, options, source, target);

    if !options.source_policy.should_remove(result.is_ok()) {
        if result.is_err() {
            info!(source = %source.display(), "Keeping source after failed run");
        }
        return result.map(|rows| Summary {
            rows,
            source_removed: false,
        });
    }

    match result {
        Ok(rows) => {
            remove_source(source)?;
            info!(rows, target = %target.display(), "Replaced source with sorted output");
            Ok(Summary {
                rows,
                source_removed: true,
            })
        }
        Err(e) => {
            warn!(source = %source.display(), "Removing source after failed run");
            if let Err(remove_err) = remove_source(source) {
                warn!("{}", remove_err);
            }
            Err(e)
        }
    }
}

fn convert_sort_write(
    converter: &dyn Converter,
    options: &Options,
    source: &Path,
    target: &Path,
) -> Result<usize, PipelineError> {
    let mut records = converter.convert(source)?;
    debug!(rows = records.len(), "Converted");

    sort::sort_records(&mut records, &options.key_fields);

    write_target(&records, target).map_err(|source| PipelineError::WriteTarget {
        path: target.to_path_buf(),
        source,
    })?;

    Ok(records.len())
}

fn check_paths(source: &Path, target: &Path) -> Result<(), PipelineError> {
    let meta = fs::metadata(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PipelineError::SourceMissing(source.to_path_buf()),
        _ => PipelineError::Access {
            path: source.to_path_buf(),
            source: e,
        },
    })?;

    if !meta.is_file() {
        return Err(PipelineError::SourceNotFile(source.to_path_buf()));
    }

    if let Some(path) = same_file(source, target) {
        return Err(PipelineError::SamePath(path));
    }

    Ok(())
}

// Only an existing target can alias the source.
fn same_file(source: &Path, target: &Path) -> Option<PathBuf> {
    let source = fs::canonicalize(source).ok()?;
    let target = fs::canonicalize(target).ok()?;
    (source == target).then_some(source)
}

fn write_target(records: &[StringRecord], target: &Path) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv_writer(tmp.as_file_mut());
        for record in records {
            writer.write_record(record)?;
        }
        writer.flush()?;
    }

    if let Some(permissions) = target_permissions(target)? {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;

    Ok(())
}

/// Keeps the permissions of a target being replaced; new targets get the
/// usual `rw-r--r--` rather than the private mode of a temporary file.
fn target_permissions(target: &Path) -> io::Result<Option<fs::Permissions>> {
    match fs::metadata(target) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(default_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

fn remove_source(source: &Path) -> Result<(), PipelineError> {
    fs::remove_file(source).map_err(|e| PipelineError::RemoveSource {
        path: source.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{datetime::NaiveZone, error::ConvertError};

    struct FailingConverter;

    impl Converter for FailingConverter {
        fn convert(&self, _source: &Path) -> Result<Vec<StringRecord>, ConvertError> {
            Err(ConvertError::InvalidValue {
                line: 1,
                column: 3,
                message: "Invalid isoformat string: 'x'".to_string(),
            })
        }

        fn describe(&self) -> String {
            "failing converter".to_string()
        }
    }

    fn options(policy: SourcePolicy) -> Options {
        Options {
            key_fields: vec![0, 1],
            source_policy: policy,
        }
    }

    fn native() -> NativeConverter {
        NativeConverter::new(crate::convert::ColumnSpec::new(vec![], vec![2], NaiveZone::Utc))
    }

    #[test]
    fn replaces_source_with_sorted_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        let target = dir.path().join("out.csv");
        fs::write(&source, "b,2,2021-01-01T00:00:00,x\na,1,2021-01-02T00:00:00,y\n").unwrap();

        let summary = run(&native(), &options(SourcePolicy::DeleteOnSuccess), &source, &target).unwrap();

        assert_eq!(
            summary,
            Summary {
                rows: 2,
                source_removed: true
            }
        );
        assert!(!source.exists());
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "a,1,1609545600,y\nb,2,1609459200,x\n"
        );
    }

    #[test]
    fn failed_conversion_keeps_source_and_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        let target = dir.path().join("out.csv");
        fs::write(&source, "a,1,x\n").unwrap();
        fs::write(&target, "previous\n").unwrap();

        let err = run(&FailingConverter, &options(SourcePolicy::DeleteOnSuccess), &source, &target).unwrap_err();

        assert!(matches!(err, PipelineError::Convert(_)));
        assert!(source.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "previous\n");
    }

    #[test]
    fn always_policy_removes_source_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        fs::write(&source, "a,1,x\n").unwrap();

        let err = run(
            &FailingConverter,
            &options(SourcePolicy::Always),
            &source,
            &dir.path().join("out.csv"),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Convert(_)));
        assert!(!source.exists());
    }

    #[test]
    fn never_policy_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        let target = dir.path().join("out.csv");
        fs::write(&source, "a,1,2021-01-01\n").unwrap();

        let summary = run(&native(), &options(SourcePolicy::Never), &source, &target).unwrap();

        assert!(!summary.source_removed);
        assert!(source.exists());
        assert!(target.exists());
    }

    #[test]
    fn missing_source_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");

        let err = run(
            &native(),
            &options(SourcePolicy::Always),
            &dir.path().join("absent.csv"),
            &target,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::SourceMissing(_)));
        assert!(!target.exists());
    }

    #[test]
    fn directory_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let err = run(
            &native(),
            &options(SourcePolicy::Always),
            dir.path(),
            &dir.path().join("out.csv"),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::SourceNotFile(_)));
        assert!(dir.path().exists());
    }

    #[test]
    fn same_source_and_target_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        fs::write(&source, "a,1,2021-01-01\n").unwrap();
        let alias = dir.path().join(".").join("in.csv");

        let err = run(&native(), &options(SourcePolicy::Always), &source, &alias).unwrap_err();

        assert!(matches!(err, PipelineError::SamePath(_)));
        assert_eq!(fs::read_to_string(&source).unwrap(), "a,1,2021-01-01\n");
    }

    #[test]
    fn build_converter_validates_columns() {
        let cfg = AppConfig {
            date_columns: vec![],
            timestamp_columns: vec![],
            ..AppConfig::default()
        };

        assert!(matches!(build_converter(&cfg), Err(PipelineError::InvalidColumns(_))));
        assert!(build_converter(&AppConfig::default()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn new_target_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        let target = dir.path().join("out.csv");
        fs::write(&source, "a,1,2021-01-01\n").unwrap();

        run(&native(), &options(SourcePolicy::Never), &source, &target).unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
