//! Dataset manifest: one labeled time range per row.
//!
//! Two header layouts are accepted. The canonical one,
//! `video-id,start-time,end-time,label-name`, and the layout the dataset is
//! published in, `youtube_id,time_start,time_end,label[,is_cc]`, recognised
//! by the presence of a `youtube_id` column. The label column is optional;
//! without it clips go to a flat directory.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Canonical column names rows are normalized to.
pub const VIDEO_ID: &str = "video-id";
pub const START_TIME: &str = "start-time";
pub const END_TIME: &str = "end-time";
pub const LABEL_NAME: &str = "label-name";

/// `(source column, canonical column)` pairs for the published layout.
const SOURCE_SCHEMA: &[(&str, &str)] = &[
    ("youtube_id", VIDEO_ID),
    ("time_start", START_TIME),
    ("time_end", END_TIME),
    ("label", LABEL_NAME),
];

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest is missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("manifest row {row}: column {column:?} value {value:?} is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("manifest row {row} has no {column:?} field")]
    ShortRow { row: usize, column: &'static str },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    pub video_id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub rows: Vec<ManifestRow>,
    /// False when the manifest has no label column.
    pub has_labels: bool,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, ManifestError> {
        let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, ManifestError> {
        let headers = normalize_headers(reader.headers()?);
        let position = |name: &str| headers.iter().position(|h| h == name);

        let id_col = position(VIDEO_ID).ok_or(ManifestError::MissingColumn(VIDEO_ID))?;
        let start_col = position(START_TIME).ok_or(ManifestError::MissingColumn(START_TIME))?;
        let end_col = position(END_TIME).ok_or(ManifestError::MissingColumn(END_TIME))?;
        let label_col = position(LABEL_NAME);

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            // Header is line 1.
            let row = idx + 2;
            let field = |col: usize, column: &'static str| {
                record.get(col).ok_or(ManifestError::ShortRow { row, column })
            };
            let number = |col: usize, column: &'static str| -> Result<f64, ManifestError> {
                let value = field(col, column)?;
                value.parse::<f64>().map_err(|_| ManifestError::InvalidNumber {
                    row,
                    column,
                    value: value.to_string(),
                })
            };
            rows.push(ManifestRow {
                video_id: field(id_col, VIDEO_ID)?.to_string(),
                start_time: number(start_col, START_TIME)?,
                end_time: number(end_col, END_TIME)?,
                label: match label_col {
                    Some(col) => Some(field(col, LABEL_NAME)?.to_string()),
                    None => None,
                },
            });
        }

        Ok(Self {
            rows,
            has_labels: label_col.is_some(),
        })
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|r| r.label.as_deref())
            .filter(|label| seen.insert(*label))
            .collect()
    }

    /// Drop rows whose video id satisfies `skip`. Returns how many were dropped.
    pub fn retain_unseen(&mut self, mut skip: impl FnMut(&str) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| !skip(&r.video_id));
        before - self.rows.len()
    }
}

fn normalize_headers(raw: &csv::StringRecord) -> Vec<String> {
    let is_source = raw.iter().any(|h| h == "youtube_id");
    raw.iter()
        .map(|h| {
            if is_source {
                if let Some((_, canonical)) = SOURCE_SCHEMA.iter().find(|(src, _)| *src == h) {
                    return canonical.to_string();
                }
            }
            h.to_string()
        })
        .collect()
}
