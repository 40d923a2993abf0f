use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputEntry {
    Url(String),
    Record { url: String },
}

/// Read the url list. A file starting with `[` is a JSON array of strings or of
/// objects carrying a `url` field; anything else is one url per line, with blank
/// lines and `#` comments skipped. Order is preserved, duplicates are kept.
pub fn read_urls(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read input {}", path.display()))?;
    let urls = parse_urls(&text).with_context(|| format!("invalid input {}", path.display()))?;
    if urls.is_empty() {
        tracing::warn!(path = %path.display(), "input lists no urls, the index will be empty");
    }
    Ok(urls)
}

fn parse_urls(text: &str) -> Result<Vec<String>> {
    if text.trim_start().starts_with('[') {
        let entries: Vec<InputEntry> = serde_json::from_str(text)?;
        return Ok(entries
            .into_iter()
            .map(|e| match e {
                InputEntry::Url(u) | InputEntry::Record { url: u } => u.trim().to_string(),
            })
            .filter(|u| !u.is_empty())
            .collect());
    }
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}
