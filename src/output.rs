//! Output formatters for the three output modes.
//!
//! Every renderer writes to a caller-supplied writer so commands can be
//! tested against a buffer. Table mode is fixed-width and coloured unless
//! colour is disabled; compact mode is one uncoloured line per row; JSON
//! mode pretty-prints the serde shape of the value.

use std::io::Write;

use chrono::Duration;
use crossterm::style::{Color, Stylize};
use serde::Serialize;
use serde_json::Value;

use crate::activity::LogEntry;
use crate::board::{BoardSummary, Group};
use crate::config::Config;
use crate::context::{render_context_markdown, Context};
use crate::date::{format_age, format_instant};
use crate::error::{ErrorBody, KanbanError, Result};
use crate::fields::OutputFormat;
use crate::metrics::Metrics;
use crate::store::ReadWarning;
use crate::task::Task;

/// Truncate `s` to `width` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Pretty JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized>(w: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?;
    Ok(())
}

fn priority_color(priority: &str) -> Option<Color> {
    match priority {
        "critical" => Some(Color::Red),
        "high" => Some(Color::Yellow),
        "low" => Some(Color::DarkGrey),
        _ => None,
    }
}

fn tags_suffix(task: &Task) -> String {
    if task.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", task.tags.join(","))
    }
}

fn due_str(task: &Task) -> String {
    task.due
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into())
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn hours_str(h: Option<f64>) -> String {
    h.map_or_else(|| "-".into(), |h| format!("{h:.1}h"))
}

/// Output settings resolved from the global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub format: OutputFormat,
    pub color: bool,
}

impl Output {
    /// Colour only ever applies to table mode.
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Output {
            format,
            color: color && format == OutputFormat::Table,
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn paint(&self, s: String, color: Option<Color>) -> String {
        match color {
            Some(c) if self.color => s.with(c).to_string(),
            _ => s,
        }
    }

    fn bold(&self, s: String) -> String {
        if self.color {
            s.bold().to_string()
        } else {
            s
        }
    }

    // -------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------

    /// A task collection: array in JSON mode, one row per task otherwise.
    pub fn tasks(&self, w: &mut dyn Write, tasks: &[Task]) -> Result<()> {
        match self.format {
            OutputFormat::Json => write_json(w, tasks),
            OutputFormat::Compact => {
                for t in tasks {
                    writeln!(w, "{}", compact_task(t))?;
                }
                Ok(())
            }
            OutputFormat::Table => {
                if tasks.is_empty() {
                    writeln!(w, "No tasks found.")?;
                    return Ok(());
                }
                let header = format!(
                    "{:<5} {:<12} {:<9} {:<12} {:<10} {}",
                    "ID", "Status", "Priority", "Assignee", "Due", "Title [tags]"
                );
                writeln!(w, "{}", self.bold(header))?;
                for t in tasks {
                    self.task_row(w, t)?;
                }
                Ok(())
            }
        }
    }

    fn task_row(&self, w: &mut dyn Write, t: &Task) -> Result<()> {
        let owner = if t.claimed_by.is_empty() {
            &t.assignee
        } else {
            &t.claimed_by
        };
        let blocked = if t.blocked {
            self.paint(" (blocked)".into(), Some(Color::Red))
        } else {
            String::new()
        };
        writeln!(
            w,
            "{:<5} {:<12} {} {:<12} {:<10} {}{}{}",
            t.id,
            truncate(&t.status, 12),
            self.paint(format!("{:<9}", truncate(&t.priority, 9)), priority_color(&t.priority)),
            truncate(or_dash(owner), 12),
            due_str(t),
            t.title,
            tags_suffix(t),
            blocked,
        )?;
        Ok(())
    }

    /// Grouped list: array of `{key, count, tasks}` in JSON mode.
    pub fn groups(&self, w: &mut dyn Write, groups: &[Group]) -> Result<()> {
        if self.is_json() {
            return write_json(w, groups);
        }
        for (i, group) in groups.iter().enumerate() {
            if self.format == OutputFormat::Table && i > 0 {
                writeln!(w)?;
            }
            let heading = format!("{} ({})", group.key, group.count);
            match self.format {
                OutputFormat::Compact => writeln!(w, "== {heading}")?,
                _ => writeln!(w, "{}", self.bold(heading))?,
            }
            self.tasks(w, &group.tasks)?;
        }
        Ok(())
    }

    /// Full detail of one task.
    pub fn task(&self, w: &mut dyn Write, t: &Task) -> Result<()> {
        match self.format {
            OutputFormat::Json => write_json(w, t),
            OutputFormat::Compact => {
                writeln!(w, "{}", compact_task(t))?;
                Ok(())
            }
            OutputFormat::Table => {
                writeln!(w, "{}", self.bold(format!("#{} {}", t.id, t.title)))?;
                let mut field = |label: &str, value: String| -> Result<()> {
                    writeln!(w, "{:<13} {}", format!("{label}:"), value)?;
                    Ok(())
                };
                field("Status", t.status.clone())?;
                field("Priority", self.paint(t.priority.clone(), priority_color(&t.priority)))?;
                if !t.class.is_empty() {
                    field("Class", t.class.clone())?;
                }
                if !t.assignee.is_empty() {
                    field("Assignee", t.assignee.clone())?;
                }
                if !t.tags.is_empty() {
                    field("Tags", t.tags.join(", "))?;
                }
                if let Some(due) = t.due {
                    field("Due", due.format("%Y-%m-%d").to_string())?;
                }
                if !t.estimate.is_empty() {
                    field("Estimate", t.estimate.clone())?;
                }
                if let Some(parent) = t.parent {
                    field("Parent", format!("#{parent}"))?;
                }
                if !t.depends_on.is_empty() {
                    let deps: Vec<String> = t.depends_on.iter().map(|d| format!("#{d}")).collect();
                    field("Depends on", deps.join(", "))?;
                }
                if t.blocked {
                    field("Blocked", self.paint(or_dash(&t.block_reason).to_string(), Some(Color::Red)))?;
                }
                if !t.claimed_by.is_empty() {
                    let at = t.claimed_at.map(|a| format!(" since {}", format_instant(&a))).unwrap_or_default();
                    field("Claimed by", format!("{}{at}", t.claimed_by))?;
                }
                field("Created", format_instant(&t.created))?;
                field("Updated", format_instant(&t.updated))?;
                if let Some(s) = t.started {
                    field("Started", format_instant(&s))?;
                }
                if let Some(c) = t.completed {
                    field("Completed", format_instant(&c))?;
                }
                if !t.body.trim().is_empty() {
                    writeln!(w)?;
                    writeln!(w, "{}", t.body.trim_end())?;
                }
                Ok(())
            }
        }
    }

    /// Result of a mutation: the task in JSON mode, `message` otherwise.
    pub fn task_result(&self, w: &mut dyn Write, t: &Task, message: &str) -> Result<()> {
        if self.is_json() {
            return write_json(w, t);
        }
        writeln!(w, "{message}")?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Board views
    // -------------------------------------------------------------------

    pub fn board(&self, w: &mut dyn Write, summary: &BoardSummary) -> Result<()> {
        match self.format {
            OutputFormat::Json => write_json(w, summary),
            OutputFormat::Compact => {
                let cols: Vec<String> = summary
                    .statuses
                    .iter()
                    .map(|s| match s.wip_limit {
                        Some(limit) => format!("{}:{}/{}", s.name, s.count, limit),
                        None => format!("{}:{}", s.name, s.count),
                    })
                    .collect();
                writeln!(w, "{} total:{} {}", summary.board, summary.total, cols.join(" "))?;
                Ok(())
            }
            OutputFormat::Table => {
                writeln!(w, "{}", self.bold(format!("Board: {} ({} tasks)", summary.board, summary.total)))?;
                writeln!(w)?;
                writeln!(
                    w,
                    "{}",
                    self.bold(format!("{:<14} {:<6} {:<6} {:<8} {}", "Status", "Count", "WIP", "Blocked", "Overdue"))
                )?;
                for s in &summary.statuses {
                    let wip = s.wip_limit.map_or_else(|| "-".to_string(), |l| l.to_string());
                    let full = s.wip_limit.is_some_and(|l| s.count >= l as usize);
                    let wip = self.paint(format!("{wip:<6}"), full.then_some(Color::Red));
                    let blocked = self.paint(format!("{:<8}", s.blocked), (s.blocked > 0).then_some(Color::Red));
                    let overdue = self.paint(s.overdue.to_string(), (s.overdue > 0).then_some(Color::Yellow));
                    writeln!(w, "{:<14} {:<6} {} {} {}", truncate(&s.name, 14), s.count, wip, blocked, overdue)?;
                }
                writeln!(w)?;
                writeln!(w, "{}", self.bold(format!("{:<14} {}", "Priority", "Count")))?;
                for p in &summary.priorities {
                    let name = self.paint(format!("{:<14}", truncate(&p.name, 14)), priority_color(&p.name));
                    writeln!(w, "{} {}", name, p.count)?;
                }
                Ok(())
            }
        }
    }

    pub fn metrics(&self, w: &mut dyn Write, m: &Metrics) -> Result<()> {
        match self.format {
            OutputFormat::Json => write_json(w, m),
            OutputFormat::Compact => {
                writeln!(
                    w,
                    "throughput_7d:{} throughput_30d:{} completed:{} lead:{} cycle:{} efficiency:{}",
                    m.throughput_7d,
                    m.throughput_30d,
                    m.completed,
                    hours_str(m.avg_lead_time_hours),
                    hours_str(m.avg_cycle_time_hours),
                    m.flow_efficiency.map_or_else(|| "-".into(), |e| format!("{e:.2}")),
                )?;
                Ok(())
            }
            OutputFormat::Table => {
                writeln!(w, "{:<26} {}", "Throughput (7d):", m.throughput_7d)?;
                writeln!(w, "{:<26} {}", "Throughput (30d):", m.throughput_30d)?;
                writeln!(w, "{:<26} {}", "Completed:", m.completed)?;
                writeln!(
                    w,
                    "{:<26} {} / {}",
                    "Lead time (avg / median):",
                    hours_str(m.avg_lead_time_hours),
                    hours_str(m.median_lead_time_hours)
                )?;
                writeln!(
                    w,
                    "{:<26} {} / {}",
                    "Cycle time (avg / median):",
                    hours_str(m.avg_cycle_time_hours),
                    hours_str(m.median_cycle_time_hours)
                )?;
                let eff = m
                    .flow_efficiency
                    .map_or_else(|| "-".into(), |e| format!("{:.0}%", e * 100.0));
                writeln!(w, "{:<26} {}", "Flow efficiency:", eff)?;

                if !m.aging.is_empty() {
                    writeln!(w)?;
                    writeln!(w, "{}", self.bold(format!("{:<5} {:<12} {:<6} {}", "ID", "Status", "Age", "Title")))?;
                    for item in &m.aging {
                        let age = format_age(Duration::seconds((item.age_hours * 3600.0) as i64));
                        writeln!(w, "{:<5} {:<12} {:<6} {}", item.id, truncate(&item.status, 12), age, item.title)?;
                    }
                }
                Ok(())
            }
        }
    }

    pub fn log(&self, w: &mut dyn Write, entries: &[LogEntry]) -> Result<()> {
        match self.format {
            OutputFormat::Json => write_json(w, entries),
            OutputFormat::Compact => {
                for e in entries {
                    writeln!(w, "{} {} #{} {}", format_instant(&e.timestamp), e.action.as_str(), e.task_id, e.detail)?;
                }
                Ok(())
            }
            OutputFormat::Table => {
                if entries.is_empty() {
                    writeln!(w, "No activity.")?;
                    return Ok(());
                }
                writeln!(
                    w,
                    "{}",
                    self.bold(format!("{:<21} {:<9} {:<5} {}", "Timestamp", "Action", "Task", "Detail"))
                )?;
                for e in entries {
                    writeln!(
                        w,
                        "{:<21} {:<9} {:<5} {}",
                        format_instant(&e.timestamp),
                        e.action.as_str(),
                        e.task_id,
                        e.detail
                    )?;
                }
                Ok(())
            }
        }
    }

    /// Context digest: the markdown itself outside JSON mode.
    pub fn context(&self, w: &mut dyn Write, ctx: &Context) -> Result<()> {
        if self.is_json() {
            return write_json(w, ctx);
        }
        write!(w, "{}", render_context_markdown(ctx))?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Config
    // -------------------------------------------------------------------

    pub fn config(&self, w: &mut dyn Write, cfg: &Config) -> Result<()> {
        if self.is_json() {
            return write_json(w, cfg);
        }
        write!(w, "{}", serde_yaml_ng::to_string(cfg)?)?;
        Ok(())
    }

    /// A single `config get` value. Scalars print bare outside JSON mode.
    pub fn value(&self, w: &mut dyn Write, value: &Value) -> Result<()> {
        if self.is_json() {
            return write_json(w, value);
        }
        match value {
            Value::String(s) => writeln!(w, "{s}")?,
            Value::Null => writeln!(w)?,
            Value::Array(items) if items.iter().all(Value::is_string) => {
                let names: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                writeln!(w, "{}", names.join(","))?;
            }
            other => writeln!(w, "{other}")?,
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Errors and warnings
    // -------------------------------------------------------------------

    /// Report a failed command: JSON body on `out` in JSON mode, a human
    /// line on `err` otherwise.
    pub fn error(&self, out: &mut dyn Write, err: &mut dyn Write, e: &KanbanError) {
        if self.is_json() {
            let _ = write_json(out, &ErrorBody::from(e));
        } else {
            let prefix = self.paint("error:".into(), Some(Color::Red));
            let _ = writeln!(err, "{prefix} {e}");
        }
    }

    pub fn warnings(&self, err: &mut dyn Write, warnings: &[String]) {
        for warning in warnings {
            let prefix = self.paint("warning:".into(), Some(Color::Yellow));
            let _ = writeln!(err, "{prefix} {warning}");
        }
    }

    pub fn read_warnings(&self, err: &mut dyn Write, warnings: &[ReadWarning]) {
        let lines: Vec<String> = warnings.iter().map(ToString::to_string).collect();
        self.warnings(err, &lines);
    }
}

fn compact_task(t: &Task) -> String {
    let mut line = format!("{} {} {} {}", t.id, t.status, t.priority, t.title);
    if !t.claimed_by.is_empty() {
        line.push_str(&format!(" @{}", t.claimed_by));
    } else if !t.assignee.is_empty() {
        line.push_str(&format!(" @{}", t.assignee));
    }
    if !t.tags.is_empty() {
        line.push_str(&format!(" #{}", t.tags.join(",#")));
    }
    if let Some(due) = t.due {
        line.push_str(&format!(" due:{}", due.format("%Y-%m-%d")));
    }
    if t.blocked {
        line.push_str(" blocked");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KanbanError;
    use chrono::{TimeZone, Utc};

    fn sample() -> Task {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
        let mut t = Task::new(7, "Fix login", now);
        t.status = "in-progress".into();
        t.priority = "high".into();
        t.tags = vec!["auth".into(), "bug".into()];
        t
    }

    fn render(out: Output, f: impl Fn(&Output, &mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&out, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }

    #[test]
    fn test_table_has_no_color_when_disabled() {
        let out = Output::new(OutputFormat::Table, false);
        let text = render(out, |o, w| o.tasks(w, &[sample()]));
        assert!(text.starts_with("ID    Status"));
        assert!(text.contains("Fix login [auth,bug]"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_compact_is_never_colored() {
        let out = Output::new(OutputFormat::Compact, true);
        assert!(!out.color);
        let text = render(out, |o, w| o.tasks(w, &[sample()]));
        assert_eq!(text, "7 in-progress high Fix login #auth,#bug\n");
    }

    #[test]
    fn test_json_list_is_array() {
        let out = Output::new(OutputFormat::Json, true);
        let text = render(out, |o, w| o.tasks(w, &[sample()]));
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v[0]["id"], 7);
        assert_eq!(v[0]["tags"], serde_json::json!(["auth", "bug"]));
        assert!(v[0].get("due").is_none());
        assert_eq!(v[0]["created"], "2025-01-02T12:00:00Z");
    }

    #[test]
    fn test_json_error_body() {
        let out = Output::new(OutputFormat::Json, false);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        out.error(&mut stdout, &mut stderr, &KanbanError::TaskNotFound { id: 9 });
        let v: Value = serde_json::from_slice(&stdout).unwrap();
        assert_eq!(v["error_code"], "TASK_NOT_FOUND");
        assert!(stderr.is_empty());
    }

    #[test]
    fn test_human_error_goes_to_stderr() {
        let out = Output::new(OutputFormat::Table, false);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        out.error(&mut stdout, &mut stderr, &KanbanError::NothingToPick);
        assert!(stdout.is_empty());
        assert!(String::from_utf8(stderr).unwrap().starts_with("error: "));
    }

    #[test]
    fn test_config_value_scalars() {
        let out = Output::new(OutputFormat::Table, false);
        let text = render(out, |o, w| o.value(w, &serde_json::json!(["a", "b"])));
        assert_eq!(text, "a,b\n");
        let text = render(out, |o, w| o.value(w, &serde_json::json!("Demo")));
        assert_eq!(text, "Demo\n");
    }
}
