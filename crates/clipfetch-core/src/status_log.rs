//! Append-only status log used to resume a batch.
//!
//! Two columns, `video_identifier, status`, one record per finished clip.
//! Every identifier present in the log is skipped on the next run, whatever
//! its status; clips that were rate-limited or found the proxy pool empty
//! are never written so they get another chance.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const HEADER: &str = "video_identifier, status";

/// Identifiers already recorded in the log at `path` (empty if it does not exist yet).
pub fn load_skip_set(path: &Path) -> Result<HashSet<String>> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e).with_context(|| format!("read status log: {}", path.display())),
    };
    Ok(parse_identifiers(&text))
}

fn parse_identifiers(text: &str) -> HashSet<String> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let id = line.split(',').next()?.trim();
            (!id.is_empty()).then(|| id.to_string())
        })
        .collect()
}

/// Commas would shift columns and line breaks would start new records.
fn sanitize(message: &str) -> String {
    message
        .trim()
        .chars()
        .map(|c| match c {
            ',' => '.',
            '\r' | '\n' => ' ',
            c => c,
        })
        .collect()
}

/// Open status log. Appends are serialized so concurrent workers never interleave records.
#[derive(Debug)]
pub struct StatusLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl StatusLog {
    /// Open `path` for appending, writing the header first if the file is new.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open status log: {}", path.display()))?;
        let is_new = file
            .metadata()
            .with_context(|| format!("stat status log: {}", path.display()))?
            .len()
            == 0;
        if is_new {
            file.write_all(HEADER.as_bytes())
                .with_context(|| format!("write status log header: {}", path.display()))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Append one `identifier, message` record.
    pub fn append(&self, identifier: &str, message: &str) -> Result<()> {
        let record = format!("\n{}, {}", identifier, sanitize(message));
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(record.as_bytes())
            .and_then(|_| file.flush())
            .with_context(|| format!("append status log: {}", self.path.display()))
    }
}
