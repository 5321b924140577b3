// src/history/report.rs
//! Plain-text history report, one file per app id + name.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::types::AggregatedHistory;

#[derive(Debug, Clone)]
pub struct ReportSink {
    dir: PathBuf,
}

impl ReportSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// `<dir>/<appId>_<sanitizedName>_history.txt`
    pub fn path_for(&self, history: &AggregatedHistory) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_history.txt",
            history.app_id,
            sanitize_name(&history.name)
        ))
    }

    /// Render and write the report, replacing any previous one.
    pub fn write(&self, history: &AggregatedHistory, raw_input: Option<&str>) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(history);
        fs::write(&path, render(history, raw_input))?;
        tracing::debug!(path = %path.display(), "history report written");
        Ok(path)
    }
}

/// Replace characters that are unsafe in file names with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// `raw_input` is only shown when the id came from a URL.
pub fn render(history: &AggregatedHistory, raw_input: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "App ID: {} | {} | bundleId: {}",
        history.app_id,
        history.name,
        history.bundle_id.as_deref().unwrap_or("none")
    );
    if let Some(raw) = raw_input {
        let _ = writeln!(out, "Original input: {raw}");
    }
    if let Some(cur) = &history.current {
        let _ = writeln!(out, "Current version: {} -> {}", cur.version, cur.version_id);
    }
    if history.versions.is_empty() {
        out.push_str("No historical versions found\n");
    } else {
        let _ = writeln!(out, "Found {} historical versions:", history.versions.len());
        for (i, v) in history.versions.iter().enumerate() {
            let _ = writeln!(out, "[{}] {} -> {}", i + 1, v.version, v.version_id);
        }
    }
    out
}
