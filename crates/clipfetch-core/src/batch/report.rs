//! JSON run report: a list of `[clip_id, succeeded, message]` triples.

use anyhow::{Context, Result};
use std::path::Path;

use super::outcome::FetchOutcome;

pub fn write_report(path: &Path, outcomes: &[FetchOutcome]) -> Result<()> {
    let rows: Vec<(&str, bool, &str)> = outcomes
        .iter()
        .map(|o| (o.item_id.as_str(), o.succeeded, o.message.as_str()))
        .collect();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let json = serde_json::to_string(&rows).context("serialize download report")?;
    std::fs::write(path, json).with_context(|| format!("write download report: {}", path.display()))?;
    Ok(())
}

pub fn read_report(path: &Path) -> Result<Vec<(String, bool, String)>> {
    let bytes = std::fs::read(path).with_context(|| format!("read download report: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse download report: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FailureKind;

    #[test]
    fn report_is_list_of_triples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("download_report.json");
        let outcomes = vec![
            FetchOutcome::exists("abcdefghijk_000010_000015".into(), "abcdefghijk"),
            FetchOutcome::failed(
                "bcdefghijkl_000000_000010".into(),
                "bcdefghijkl",
                FailureKind::ResolutionFailed,
                "ERROR: Video unavailable".into(),
            ),
        ];
        write_report(&path, &outcomes).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"[["abcdefghijk_000010_000015",true,"Exists"],["bcdefghijkl_000000_000010",false,"ERROR: Video unavailable"]]"#
        );
        let back = read_report(&path).unwrap();
        assert_eq!(back[1].2, "ERROR: Video unavailable");
    }
}
