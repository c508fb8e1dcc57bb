//! Event script loading
//!
//! A script lists one event per line in the form accepted by
//! [`keychord_core::Event`]'s `FromStr`. Blank lines and lines starting with
//! `#` are skipped.

use std::path::Path;

use anyhow::{Context, Result};
use keychord_core::Event;

/// An event together with the script line it came from (1-indexed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub event: Event,
}

pub fn parse_script(content: &str) -> Result<Vec<ScriptLine>> {
    let mut events = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let line = index + 1;
        let event = trimmed
            .parse::<Event>()
            .with_context(|| format!("line {}: invalid event '{}'", line, trimmed))?;
        events.push(ScriptLine { line, event });
    }

    Ok(events)
}

pub fn read_script(path: &Path) -> Result<Vec<ScriptLine>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event script {}", path.display()))?;
    parse_script(&content).with_context(|| format!("in {}", path.display()))
}
