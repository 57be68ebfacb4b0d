//! Work item planning: where each clip lands on disk.
//!
//! Pure path arithmetic; directory creation happens in the batch coordinator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::manifest::ManifestRow;

/// Directory used when the manifest carries no labels.
pub const FLAT_DIR: &str = "test";

/// Length of an external video key.
pub const IDENTIFIER_LEN: usize = 11;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("trim format {0:?} must contain exactly one integer conversion like %06d")]
    InvalidTrimFormat(String),
    #[error("row for {0} has no label but the output is organised by label")]
    MissingLabel(String),
    #[error("label {0:?} has no output directory")]
    UnknownLabel(String),
}

/// printf-style integer conversion used for start/end times in file names
/// (`%d`, `%6d`, `%06d`, with optional literal text around it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimFormat {
    prefix: String,
    suffix: String,
    width: usize,
    zero_pad: bool,
}

impl TrimFormat {
    pub fn parse(spec: &str) -> Result<Self, PlanError> {
        let invalid = || PlanError::InvalidTrimFormat(spec.to_string());
        let (prefix, rest) = spec.split_once('%').ok_or_else(invalid)?;
        let zero_pad = rest.starts_with('0');
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let rest = &rest[digits.len()..];
        let suffix = rest.strip_prefix('d').ok_or_else(invalid)?;
        if suffix.contains('%') || prefix.contains('%') {
            return Err(invalid());
        }
        let width = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| invalid())?
        };
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            width,
            zero_pad,
        })
    }

    /// Format `seconds` truncated toward zero.
    pub fn format(&self, seconds: f64) -> String {
        let value = seconds.trunc() as i64;
        let body = if self.zero_pad {
            format!("{:0width$}", value, width = self.width)
        } else {
            format!("{:>width$}", value, width = self.width)
        };
        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

impl Default for TrimFormat {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            width: 6,
            zero_pad: true,
        }
    }
}

/// Output directory per label, or a single flat directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelDirs {
    Flat(PathBuf),
    PerLabel(HashMap<String, PathBuf>),
}

impl LabelDirs {
    /// `<output_dir>/test` when `labels` is `None`, otherwise `<output_dir>/<label>` per label.
    pub fn new<'a>(output_dir: &Path, labels: Option<impl IntoIterator<Item = &'a str>>) -> Self {
        match labels {
            None => LabelDirs::Flat(output_dir.join(FLAT_DIR)),
            Some(labels) => LabelDirs::PerLabel(
                labels
                    .into_iter()
                    .map(|l| (l.to_string(), output_dir.join(l)))
                    .collect(),
            ),
        }
    }

    /// Every directory that must exist before clips are written.
    pub fn dirs(&self) -> Vec<&Path> {
        match self {
            LabelDirs::Flat(dir) => vec![dir.as_path()],
            LabelDirs::PerLabel(map) => map.values().map(PathBuf::as_path).collect(),
        }
    }

    fn dir_for(&self, row: &ManifestRow) -> Result<&Path, PlanError> {
        match self {
            LabelDirs::Flat(dir) => Ok(dir.as_path()),
            LabelDirs::PerLabel(map) => {
                let label = row
                    .label
                    .as_deref()
                    .ok_or_else(|| PlanError::MissingLabel(row.video_id.clone()))?;
                map.get(label)
                    .map(PathBuf::as_path)
                    .ok_or_else(|| PlanError::UnknownLabel(label.to_string()))
            }
        }
    }
}

/// One clip to produce. Immutable once planned.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub identifier: String,
    pub start_time: f64,
    pub end_time: f64,
    pub output_path: PathBuf,
}

impl WorkItem {
    /// `<id>_<start>_<end>`: the output file name without extension.
    pub fn clip_id(&self) -> String {
        self.output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.identifier.clone())
    }
}

/// Plan the output path for one manifest row.
pub fn plan(row: &ManifestRow, dirs: &LabelDirs, trim_format: &TrimFormat) -> Result<WorkItem, PlanError> {
    let basename = format!(
        "{}_{}_{}.mp4",
        row.video_id,
        trim_format.format(row.start_time),
        trim_format.format(row.end_time)
    );
    Ok(WorkItem {
        identifier: row.video_id.clone(),
        start_time: row.start_time,
        end_time: row.end_time,
        output_path: dirs.dir_for(row)?.join(basename),
    })
}
