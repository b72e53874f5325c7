//! Activity log: one JSON object per line in `activity.jsonl`.
//!
//! The log is append-only and advisory. Appends are best-effort; callers
//! turn a failed append into a warning rather than failing the mutation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ACTIVITY_FILE;
use crate::error::Result;
use crate::fields::Action;

/// A single logged mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(with = "crate::date::instant")]
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub task_id: u32,
    #[serde(default)]
    pub detail: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, action: Action, task_id: u32, detail: impl Into<String>) -> Self {
        LogEntry {
            timestamp,
            action,
            task_id,
            detail: detail.into(),
        }
    }
}

/// Filters for [`read_log`]. Empty `actions` matches every action.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub actions: Vec<Action>,
    pub task_id: Option<u32>,
}

impl LogFilter {
    fn matches(&self, entry: &LogEntry) -> bool {
        self.since.map_or(true, |since| entry.timestamp >= since)
            && (self.actions.is_empty() || self.actions.contains(&entry.action))
            && self.task_id.map_or(true, |id| entry.task_id == id)
    }
}

/// Append one entry to the board's activity log.
pub fn append_log(board_dir: &Path, entry: &LogEntry) -> Result<()> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(board_dir.join(ACTIVITY_FILE))?;
    file.write_all(line.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Append several entries, collecting failures as warning strings.
pub fn append_all(board_dir: &Path, entries: &[LogEntry]) -> Vec<String> {
    let mut warnings = Vec::new();
    for entry in entries {
        if let Err(e) = append_log(board_dir, entry) {
            tracing::warn!(error = %e, action = entry.action.as_str(), "activity log append failed");
            warnings.push(format!("activity log: {e}"));
        }
    }
    warnings
}

/// Read the log in chronological order, applying `filter`.
///
/// `limit` keeps the most recent entries. Lines that do not parse are
/// skipped and reported in the returned warnings.
pub fn read_log(board_dir: &Path, filter: &LogFilter) -> Result<(Vec<LogEntry>, Vec<String>)> {
    let path = board_dir.join(ACTIVITY_FILE);
    if !path.exists() {
        return Ok((Vec::new(), Vec::new()));
    }

    let content = fs::read_to_string(&path)?;
    let mut warnings = Vec::new();
    let mut entries = Vec::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogEntry>(line) {
            Ok(entry) if filter.matches(&entry) => entries.push(entry),
            Ok(_) => {}
            Err(e) => warnings.push(format!("{}:{}: skipping malformed line: {e}", path.display(), n + 1)),
        }
    }

    if let Some(limit) = filter.limit {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }
    Ok((entries, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap()
    }

    fn seed(dir: &Path) {
        append_log(dir, &LogEntry::new(t(1), Action::Create, 1, "Fix login")).unwrap();
        append_log(dir, &LogEntry::new(t(2), Action::Move, 1, "backlog -> todo")).unwrap();
        append_log(dir, &LogEntry::new(t(3), Action::Create, 2, "Write docs")).unwrap();
        append_log(dir, &LogEntry::new(t(4), Action::Claim, 2, "alice")).unwrap();
    }

    #[test]
    fn test_append_and_read() {
        let temp = TempDir::new().unwrap();
        seed(temp.path());
        let (entries, warnings) = read_log(temp.path(), &LogFilter::default()).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(warnings.is_empty());
        assert_eq!(entries[0].action, Action::Create);
        assert_eq!(entries[3].detail, "alice");
    }

    #[test]
    fn test_line_format() {
        let temp = TempDir::new().unwrap();
        append_log(temp.path(), &LogEntry::new(t(1), Action::Move, 7, "a -> b")).unwrap();
        let raw = fs::read_to_string(temp.path().join(ACTIVITY_FILE)).unwrap();
        assert_eq!(
            raw,
            "{\"timestamp\":\"2025-01-01T01:00:00Z\",\"action\":\"move\",\"task_id\":7,\"detail\":\"a -> b\"}\n"
        );
    }

    #[test]
    fn test_filters() {
        let temp = TempDir::new().unwrap();
        seed(temp.path());

        let filter = LogFilter {
            actions: vec![Action::Create],
            ..Default::default()
        };
        let (entries, _) = read_log(temp.path(), &filter).unwrap();
        assert_eq!(entries.iter().map(|e| e.task_id).collect::<Vec<_>>(), vec![1, 2]);

        let filter = LogFilter {
            task_id: Some(2),
            limit: Some(1),
            ..Default::default()
        };
        let (entries, _) = read_log(temp.path(), &filter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, Action::Claim);

        let filter = LogFilter {
            since: Some(t(3) - Duration::minutes(1)),
            ..Default::default()
        };
        let (entries, _) = read_log(temp.path(), &filter).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let temp = TempDir::new().unwrap();
        seed(temp.path());
        let path = temp.path().join(ACTIVITY_FILE);
        let mut raw = fs::read_to_string(&path).unwrap();
        raw.push_str("not json\n");
        fs::write(&path, raw).unwrap();

        let (entries, warnings) = read_log(temp.path(), &LogFilter::default()).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains(":5:"));
    }

    #[test]
    fn test_missing_log_is_empty() {
        let temp = TempDir::new().unwrap();
        let (entries, warnings) = read_log(temp.path(), &LogFilter::default()).unwrap();
        assert!(entries.is_empty() && warnings.is_empty());
    }

    #[test]
    fn test_append_failure_becomes_warning() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let warnings = append_all(&missing, &[LogEntry::new(t(1), Action::Edit, 1, "")]);
        assert_eq!(warnings.len(), 1);
    }
}
