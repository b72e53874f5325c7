//! Context digest: a markdown summary of the board for embedding elsewhere.
//!
//! The digest is a pure function of (config, tasks, options, now).
//! [`write_context_to_file`] splices it between marker comments so the
//! rest of the target document is left byte-for-byte intact.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::board::deps_satisfied;
use crate::config::Config;
use crate::date::format_instant;
use crate::error::Result;
use crate::fields::ContextSection;
use crate::store::atomic_write;
use crate::task::Task;

pub const BEGIN_MARKER: &str = "<!-- BEGIN kanban-md context -->";
pub const END_MARKER: &str = "<!-- END kanban-md context -->";

/// Default lookback for recently completed tasks.
pub const DEFAULT_DAYS: u32 = 7;

#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Sections in output order; empty means all.
    pub sections: Vec<ContextSection>,
    pub days: u32,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            sections: Vec::new(),
            days: DEFAULT_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub name: &'static str,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Context {
    pub board: String,
    #[serde(with = "crate::date::instant")]
    pub generated_at: DateTime<Utc>,
    pub days: u32,
    pub sections: Vec<Section>,
}

fn in_section(
    cfg: &Config,
    task: &Task,
    section: ContextSection,
    statuses: &HashMap<u32, String>,
    days: u32,
    now: DateTime<Utc>,
) -> bool {
    let terminal = cfg.is_terminal(&task.status);
    let queued = cfg.is_queue(&task.status);
    match section {
        ContextSection::InProgress => !queued && !terminal && !task.blocked,
        ContextSection::Blocked => task.blocked && !terminal,
        ContextSection::Ready => {
            queued
                && !terminal
                && !task.blocked
                && deps_satisfied(cfg, task, statuses)
                && (!task.is_claimed() || task.claim_expired(cfg.claim_timeout(), now))
        }
        ContextSection::Overdue => !terminal && task.is_overdue(now),
        ContextSection::RecentlyCompleted => task
            .completed
            .is_some_and(|c| c > window_start(now, days) && c <= now),
    }
}

/// Start of the recently-completed window. Windows reaching past the
/// earliest representable instant cover all history.
fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Build the digest for `tasks`.
pub fn generate_context(cfg: &Config, tasks: &[Task], opts: &ContextOptions, now: DateTime<Utc>) -> Context {
    let statuses: HashMap<u32, String> = tasks.iter().map(|t| (t.id, t.status.clone())).collect();
    let wanted: Vec<ContextSection> = if opts.sections.is_empty() {
        ContextSection::ALL.to_vec()
    } else {
        opts.sections.clone()
    };

    let sections = wanted
        .into_iter()
        .map(|section| {
            let mut picked: Vec<Task> = tasks
                .iter()
                .filter(|t| in_section(cfg, t, section, &statuses, opts.days, now))
                .cloned()
                .collect();
            // Most urgent first, then oldest id.
            picked.sort_by(|a, b| {
                cfg.priority_index(&b.priority)
                    .cmp(&cfg.priority_index(&a.priority))
                    .then(a.id.cmp(&b.id))
            });
            Section {
                name: section.as_str(),
                tasks: picked,
            }
        })
        .collect();

    Context {
        board: cfg.board.name.clone(),
        generated_at: now,
        days: opts.days,
        sections,
    }
}

fn section_title(name: &str) -> &'static str {
    ContextSection::ALL
        .iter()
        .find(|s| s.as_str() == name)
        .map(|s| s.title())
        .unwrap_or("Tasks")
}

/// Stable markdown rendering of a digest.
pub fn render_context_markdown(ctx: &Context) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Board: {}", ctx.board);
    let _ = writeln!(out);
    let _ = writeln!(out, "_Generated {}_", format_instant(&ctx.generated_at));

    for section in &ctx.sections {
        let _ = writeln!(out);
        let _ = writeln!(out, "### {} ({})", section_title(section.name), section.tasks.len());
        let _ = writeln!(out);
        if section.tasks.is_empty() {
            let _ = writeln!(out, "_None._");
            continue;
        }
        for task in &section.tasks {
            let _ = write!(out, "- #{} {} ({}, {})", task.id, task.title, task.status, task.priority);
            if !task.claimed_by.is_empty() {
                let _ = write!(out, " @{}", task.claimed_by);
            } else if !task.assignee.is_empty() {
                let _ = write!(out, " @{}", task.assignee);
            }
            if task.blocked {
                let _ = write!(out, " [blocked: {}]", task.block_reason);
            }
            if let Some(due) = task.due {
                let _ = write!(out, " due {}", due.format("%Y-%m-%d"));
            }
            let _ = writeln!(out);
        }
    }
    out
}

/// Splice `md` into the file at `path` between the context markers.
///
/// An existing marker pair has only its interior replaced. A file without
/// markers gets a new block appended; a missing file is created holding
/// just the block.
pub fn write_context_to_file(path: &Path, md: &str) -> Result<()> {
    let mut inner = md.to_string();
    if !inner.ends_with('\n') {
        inner.push('\n');
    }
    let block = format!("{BEGIN_MARKER}\n{inner}{END_MARKER}\n");

    let updated = match fs::read_to_string(path) {
        Ok(existing) => match marker_span(&existing) {
            Some((start, end)) => format!("{}\n{inner}{}", &existing[..start], &existing[end..]),
            None if existing.is_empty() => block,
            None => {
                let sep = if existing.ends_with('\n') { "\n" } else { "\n\n" };
                format!("{existing}{sep}{block}")
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => block,
        Err(e) => return Err(e.into()),
    };

    atomic_write(path, updated.as_bytes())
}

/// Byte offsets of the end of the BEGIN marker and the start of the END marker.
fn marker_span(content: &str) -> Option<(usize, usize)> {
    let begin = content.find(BEGIN_MARKER)? + BEGIN_MARKER.len();
    let end = begin + content[begin..].find(END_MARKER)?;
    Some((begin, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()
    }

    fn cfg() -> Config {
        Config::new_default(Path::new("/tmp/board"), "Demo")
    }

    fn task(id: u32, status: &str) -> Task {
        let mut t = Task::new(id, format!("Task {id}"), now() - Duration::days(3));
        t.status = status.into();
        t.priority = "medium".into();
        t
    }

    #[test]
    fn test_sections() {
        let cfg = cfg();
        let mut working = task(1, "in-progress");
        working.started = Some(now() - Duration::days(1));
        let mut stuck = task(2, "todo");
        stuck.block("vendor");
        let ready = task(3, "todo");
        let mut late = task(4, "review");
        late.started = Some(now() - Duration::days(2));
        late.due = Some(now() - Duration::days(1));
        let mut shipped = task(5, "done");
        shipped.completed = Some(now() - Duration::days(2));
        let mut old = task(6, "done");
        old.completed = Some(now() - Duration::days(30));

        let tasks = vec![working, stuck, ready, late, shipped, old];
        let ctx = generate_context(&cfg, &tasks, &ContextOptions::default(), now());
        let ids = |name: &str| -> Vec<u32> {
            ctx.sections
                .iter()
                .find(|s| s.name == name)
                .unwrap()
                .tasks
                .iter()
                .map(|t| t.id)
                .collect()
        };
        assert_eq!(ids("in-progress"), vec![1, 4]);
        assert_eq!(ids("blocked"), vec![2]);
        assert_eq!(ids("ready"), vec![3]);
        assert_eq!(ids("overdue"), vec![4]);
        assert_eq!(ids("recently-completed"), vec![5]);
    }

    #[test]
    fn test_huge_window_covers_all_history() {
        let cfg = cfg();
        let mut old = task(1, "done");
        old.completed = Some(now() - Duration::days(3650));
        let opts = ContextOptions {
            sections: vec![ContextSection::RecentlyCompleted],
            days: u32::MAX,
        };
        let ctx = generate_context(&cfg, &[old], &opts, now());
        assert_eq!(ctx.sections[0].tasks.len(), 1);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let cfg = cfg();
        let tasks = vec![task(1, "todo"), task(2, "in-progress")];
        let opts = ContextOptions {
            sections: vec![ContextSection::Ready, ContextSection::InProgress],
            days: 3,
        };
        let a = render_context_markdown(&generate_context(&cfg, &tasks, &opts, now()));
        let b = render_context_markdown(&generate_context(&cfg, &tasks, &opts, now()));
        assert_eq!(a, b);
        assert!(a.find("### Ready to Start").unwrap() < a.find("### In Progress").unwrap());
    }

    #[test]
    fn test_write_replaces_between_markers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("README.md");
        fs::write(
            &path,
            "# Readme\n<!-- BEGIN kanban-md context -->\nold\n<!-- END kanban-md context -->\ntail",
        )
        .unwrap();
        write_context_to_file(&path, "new").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# Readme\n<!-- BEGIN kanban-md context -->\nnew\n<!-- END kanban-md context -->\ntail"
        );
    }

    #[test]
    fn test_write_appends_block_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AGENTS.md");
        fs::write(&path, "# Notes\n").unwrap();
        write_context_to_file(&path, "digest\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!("# Notes\n\n{BEGIN_MARKER}\ndigest\n{END_MARKER}\n")
        );

        // A second write replaces rather than appends again.
        write_context_to_file(&path, "digest 2").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(BEGIN_MARKER).count(), 1);
        assert!(content.contains("digest 2\n"));
    }

    #[test]
    fn test_write_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CONTEXT.md");
        write_context_to_file(&path, "x").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!("{BEGIN_MARKER}\nx\n{END_MARKER}\n")
        );
    }
}
