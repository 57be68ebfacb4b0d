//! Classify a failed tool run into a retry [`ErrorKind`].
//!
//! Resolver and encoder only report HTTP trouble through their diagnostic
//! text, so the status code is recovered from the usual phrasings
//! ("HTTP Error 429: Too Many Requests", "Server returned 429", "429 Too Many Requests").

use crate::retry::ErrorKind;

use super::runner::ProcessOutput;

const STATUS_PREFIXES: &[&str] = &["HTTP Error ", "Server returned ", "HTTP error "];

/// Extract every HTTP status code mentioned in `text` using the known phrasings.
pub fn http_status_in(text: &str) -> Vec<u16> {
    let mut codes = Vec::new();
    for prefix in STATUS_PREFIXES {
        for (idx, _) in text.match_indices(prefix) {
            if let Some(code) = leading_status(&text[idx + prefix.len()..]) {
                codes.push(code);
            }
        }
    }
    if text.contains("Too Many Requests") && !codes.contains(&429) {
        codes.push(429);
    }
    codes
}

fn leading_status(rest: &str) -> Option<u16> {
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 3 {
        return None;
    }
    digits.parse().ok()
}

/// Classify an HTTP status code mentioned by a tool.
fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        429 => ErrorKind::Throttled,
        _ => ErrorKind::Failed,
    }
}

/// Classify a non-successful process output.
pub fn classify_output(out: &ProcessOutput) -> ErrorKind {
    let text = format!("{}\n{}", out.stdout, out.stderr);
    if http_status_in(&text)
        .into_iter()
        .any(|code| classify_http_status(code) == ErrorKind::Throttled)
    {
        return ErrorKind::Throttled;
    }
    ErrorKind::Failed
}
