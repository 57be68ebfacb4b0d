//! Read and atomically rewrite the newline-separated proxy list.

use std::io::Write;
use std::path::Path;

use super::error::PoolError;

/// Host component of a proxy URI (the machine running the relay).
pub fn relay_host(proxy: &str) -> Option<String> {
    let parsed = url::Url::parse(proxy).ok()?;
    parsed.host_str().map(|h| h.trim_matches(|c| c == '[' || c == ']').to_string())
}

/// Parse list contents: one URI per line, surrounding whitespace trimmed, blank lines ignored.
pub fn parse_list(text: &str) -> Result<Vec<String>, PoolError> {
    let mut proxies = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let entry = raw.trim();
        if entry.is_empty() {
            continue;
        }
        if relay_host(entry).is_none() {
            return Err(PoolError::InvalidEntry {
                line: idx + 1,
                entry: entry.to_string(),
            });
        }
        proxies.push(entry.to_string());
    }
    Ok(proxies)
}

pub fn load(path: &Path) -> Result<Vec<String>, PoolError> {
    let text = std::fs::read_to_string(path).map_err(|source| PoolError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let proxies = parse_list(&text)?;
    if proxies.is_empty() {
        return Err(PoolError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(proxies)
}

/// Replace the list on disk with `proxies`. Written to a sibling temp file and
/// renamed over the original so a reader never sees a half-written list.
pub fn save(path: &Path, proxies: &[String]) -> Result<(), PoolError> {
    let persist_err = |source| PoolError::Persist {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(persist_err)?;
    for proxy in proxies {
        writeln!(tmp, "{}", proxy).map_err(persist_err)?;
    }
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(path).map_err(|e| persist_err(e.error))?;
    Ok(())
}
