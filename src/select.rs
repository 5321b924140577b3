// src/select.rs
//! Pick one version out of an aggregated history.

use crate::history::types::VersionRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub record: VersionRecord,
    /// The answer matched nothing and the first entry was used instead.
    pub fell_back: bool,
}

impl Selection {
    fn exact(record: &VersionRecord) -> Self {
        Self {
            record: record.clone(),
            fell_back: false,
        }
    }
}

/// Resolve an operator answer against `versions`.
///
/// Order: a matching `preferred` id, empty answer (first entry), 1-based index,
/// version id, version label. Anything else falls back to the first entry.
pub fn select_version(
    versions: &[VersionRecord],
    preferred: Option<&str>,
    answer: &str,
) -> Option<Selection> {
    let first = versions.first()?;

    if let Some(want) = preferred.map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(v) = versions.iter().find(|v| v.version_id == want) {
            return Some(Selection::exact(v));
        }
    }

    let answer = answer.trim();
    if answer.is_empty() {
        return Some(Selection::exact(first));
    }
    if let Ok(idx) = answer.parse::<usize>() {
        if (1..=versions.len()).contains(&idx) {
            return Some(Selection::exact(&versions[idx - 1]));
        }
    }
    if let Some(v) = versions.iter().find(|v| v.version_id == answer) {
        return Some(Selection::exact(v));
    }
    if let Some(v) = versions.iter().find(|v| v.version == answer) {
        return Some(Selection::exact(v));
    }

    Some(Selection {
        record: first.clone(),
        fell_back: true,
    })
}

/// True when `preferred` names a listed version id, so no prompt is needed.
pub fn has_version_id(versions: &[VersionRecord], preferred: &str) -> bool {
    versions.iter().any(|v| v.version_id == preferred.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> Vec<VersionRecord> {
        vec![
            VersionRecord::new("3.0", "300"),
            VersionRecord::new("2.0", "200"),
            VersionRecord::new("1.0", "2"),
        ]
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(select_version(&[], None, "1").is_none());
    }

    #[test]
    fn preferred_id_wins_over_answer() {
        let s = select_version(&list(), Some("200"), "3").unwrap();
        assert_eq!(s.record.version_id, "200");
    }

    #[test]
    fn index_is_tried_before_version_id() {
        // "2" is both a valid index and the id of the third entry.
        let s = select_version(&list(), None, "2").unwrap();
        assert_eq!(s.record.version_id, "200");
    }

    #[test]
    fn id_then_label_then_fallback() {
        assert_eq!(select_version(&list(), None, "300").unwrap().record.version, "3.0");
        assert_eq!(select_version(&list(), None, "1.0").unwrap().record.version_id, "2");
        let s = select_version(&list(), None, "nope").unwrap();
        assert!(s.fell_back);
        assert_eq!(s.record.version_id, "300");
    }

    #[test]
    fn blank_answer_is_latest() {
        let s = select_version(&list(), None, "  ").unwrap();
        assert_eq!(s.record.version_id, "300");
        assert!(!s.fell_back);
    }
}
