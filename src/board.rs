//! Board engine: the rules that turn a directory of task files into a board.
//!
//! Listing, sorting and grouping; status moves with WIP and claim
//! enforcement; pick; handoff; create, edit, delete and archive; and the
//! board summary. Every mutating operation writes at most one task file and
//! then appends its activity-log entries.
//!
//! Dependency cycles are not detected on write. A task is only "unblocked"
//! when every dependency sits in a terminal status, so tasks in a cycle
//! simply never become unblocked.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::activity::{append_all, LogEntry};
use crate::config::{Config, ARCHIVED, REVIEW};
use crate::date::format_instant;
use crate::error::{KanbanError, Result};
use crate::fields::{Action, GroupBy, SortKey};
use crate::store::{self, ReadWarning};
use crate::task::Task;

/// Parse a task id argument (`7`, `007` or `#7`).
pub fn parse_id(input: &str) -> Result<u32> {
    match input.trim().trim_start_matches('#').parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(KanbanError::InvalidTaskId {
            input: input.to_string(),
        }),
    }
}

fn warning_strings(warnings: Vec<ReadWarning>) -> Vec<String> {
    warnings.into_iter().map(|w| w.to_string()).collect()
}

/// Status of every task, keyed by id.
fn status_index(tasks: &[Task]) -> HashMap<u32, String> {
    tasks.iter().map(|t| (t.id, t.status.clone())).collect()
}

/// Every dependency of `task` is in a terminal status. Dependencies that
/// no longer exist do not hold a task back.
pub fn deps_satisfied(cfg: &Config, task: &Task, statuses: &HashMap<u32, String>) -> bool {
    task.depends_on
        .iter()
        .all(|dep| statuses.get(dep).map_or(true, |s| cfg.is_terminal(s)))
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Filters and ordering for [`list`]. Empty vectors match everything.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub class: Option<String>,
    pub blocked: Option<bool>,
    pub parent: Option<u32>,
    pub unblocked: bool,
    pub include_archived: bool,
    pub sort: SortKey,
    pub reverse: bool,
    pub limit: Option<usize>,
}

/// Apply `opts` to `tasks`: filters in fixed order, then sort, then limit.
pub fn filter_tasks(cfg: &Config, tasks: Vec<Task>, opts: &ListOptions) -> Vec<Task> {
    let statuses = status_index(&tasks);
    let show_archived = opts.include_archived || opts.statuses.iter().any(|s| s == ARCHIVED);

    let mut out: Vec<Task> = tasks
        .into_iter()
        .filter(|t| opts.statuses.is_empty() || opts.statuses.contains(&t.status))
        .filter(|t| opts.priorities.is_empty() || opts.priorities.contains(&t.priority))
        .filter(|t| opts.assignee.as_ref().map_or(true, |a| &t.assignee == a))
        .filter(|t| opts.tags.is_empty() || opts.tags.iter().any(|tag| t.tags.contains(tag)))
        .filter(|t| opts.class.as_ref().map_or(true, |c| &t.class == c))
        .filter(|t| opts.blocked.map_or(true, |b| t.blocked == b))
        .filter(|t| opts.parent.map_or(true, |p| t.parent == Some(p)))
        .filter(|t| !opts.unblocked || deps_satisfied(cfg, t, &statuses))
        .filter(|t| show_archived || !cfg.is_archived(&t.status))
        .collect();

    sort_tasks(cfg, &mut out, opts.sort, opts.reverse);
    if let Some(limit) = opts.limit {
        out.truncate(limit);
    }
    out
}

/// Read the board leniently and apply `opts`.
pub fn list(cfg: &Config, opts: &ListOptions) -> Result<(Vec<Task>, Vec<ReadWarning>)> {
    let (tasks, warnings) = store::read_all_lenient(cfg)?;
    Ok((filter_tasks(cfg, tasks, opts), warnings))
}

fn rank(index: Option<usize>) -> usize {
    index.unwrap_or(usize::MAX)
}

/// Stable sort by `key`; ties break on id ascending. Tasks without a due
/// date sort last whichever way the list runs.
pub fn sort_tasks(cfg: &Config, tasks: &mut [Task], key: SortKey, reverse: bool) {
    let flip = |ord: Ordering| if reverse { ord.reverse() } else { ord };
    tasks.sort_by(|a, b| {
        let ord = match key {
            SortKey::Id => flip(a.id.cmp(&b.id)),
            SortKey::Status => flip(rank(cfg.status_index(&a.status)).cmp(&rank(cfg.status_index(&b.status)))),
            SortKey::Priority => {
                flip(rank(cfg.priority_index(&a.priority)).cmp(&rank(cfg.priority_index(&b.priority))))
            }
            SortKey::Created => flip(a.created.cmp(&b.created)),
            SortKey::Updated => flip(a.updated.cmp(&b.updated)),
            SortKey::Due => match (a.due, b.due) {
                (Some(x), Some(y)) => flip(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        ord.then(a.id.cmp(&b.id))
    });
}

/// A bucket of tasks sharing one value of the grouping field.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub key: String,
    pub count: usize,
    pub tasks: Vec<Task>,
}

/// Group `tasks` by `by`. Configured fields follow config order; free-text
/// fields are alphabetical; the empty bucket comes last.
pub fn group_tasks(cfg: &Config, tasks: Vec<Task>, by: GroupBy) -> Vec<Group> {
    const NONE: &str = "(none)";
    let mut buckets: BTreeMap<(usize, String), Vec<Task>> = BTreeMap::new();

    for task in tasks {
        let keys: Vec<(usize, String)> = match by {
            GroupBy::Status => vec![(rank(cfg.status_index(&task.status)), task.status.clone())],
            GroupBy::Priority => vec![(rank(cfg.priority_index(&task.priority)), task.priority.clone())],
            GroupBy::Class if task.class.is_empty() => vec![(usize::MAX, NONE.to_string())],
            GroupBy::Class => vec![(rank(cfg.class_index(&task.class)), task.class.clone())],
            GroupBy::Assignee if task.assignee.is_empty() => vec![(usize::MAX, NONE.to_string())],
            GroupBy::Assignee => vec![(0, task.assignee.clone())],
            GroupBy::Tag if task.tags.is_empty() => vec![(usize::MAX, NONE.to_string())],
            GroupBy::Tag => task.tags.iter().map(|t| (0, t.clone())).collect(),
        };
        for key in keys {
            buckets.entry(key).or_default().push(task.clone());
        }
    }

    buckets
        .into_iter()
        .map(|((_, key), tasks)| Group {
            key,
            count: tasks.len(),
            tasks,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Board summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub name: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
    pub blocked: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrioritySummary {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardSummary {
    pub board: String,
    pub total: usize,
    pub statuses: Vec<StatusSummary>,
    pub priorities: Vec<PrioritySummary>,
}

/// Per-status and per-priority counts. Archived tasks are left out unless
/// `include_archived` is set.
pub fn summary(cfg: &Config, tasks: &[Task], include_archived: bool, now: DateTime<Utc>) -> BoardSummary {
    let visible: Vec<&Task> = tasks
        .iter()
        .filter(|t| include_archived || !cfg.is_archived(&t.status))
        .collect();

    let statuses = cfg
        .statuses
        .iter()
        .filter(|s| include_archived || !cfg.is_archived(&s.name))
        .map(|s| {
            let in_status: Vec<&&Task> = visible.iter().filter(|t| t.status == s.name).collect();
            let limit = cfg.wip_limit(&s.name);
            StatusSummary {
                name: s.name.clone(),
                count: in_status.len(),
                wip_limit: (limit > 0).then_some(limit),
                blocked: in_status.iter().filter(|t| t.blocked).count(),
                overdue: in_status
                    .iter()
                    .filter(|t| !cfg.is_terminal(&t.status) && t.is_overdue(now))
                    .count(),
            }
        })
        .collect();

    let priorities = cfg
        .priorities
        .iter()
        .map(|p| PrioritySummary {
            name: p.clone(),
            count: visible.iter().filter(|t| &t.priority == p).count(),
        })
        .collect();

    BoardSummary {
        board: cfg.board.name.clone(),
        total: visible.len(),
        statuses,
        priorities,
    }
}

// ---------------------------------------------------------------------------
// Rules shared by every mutation
// ---------------------------------------------------------------------------

/// Validate that `actor` may modify `task`.
///
/// Returns a warning when the claim is overridden with `force`.
pub fn check_claim(
    task: &Task,
    actor: Option<&str>,
    force: bool,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    if !task.is_claimed() || actor == Some(task.claimed_by.as_str()) || task.claim_expired(timeout, now) {
        return Ok(None);
    }
    if force {
        return Ok(Some(format!(
            "overriding claim on task #{} held by {}",
            task.id, task.claimed_by
        )));
    }
    Err(KanbanError::TaskClaimed {
        id: task.id,
        claimed_by: task.claimed_by.clone(),
    })
}

/// Validate that `task` may enter `target` given the rest of the board.
///
/// Returns a warning when a limit is overridden with `force`.
pub fn check_wip(cfg: &Config, tasks: &[Task], task: &Task, target: &str, force: bool) -> Result<Option<String>> {
    let violation = wip_violation(cfg, tasks, task, target);
    match violation {
        None => Ok(None),
        Some(err) if force => Ok(Some(format!("{err} (forced)"))),
        Some(err) => Err(err),
    }
}

fn wip_violation(cfg: &Config, tasks: &[Task], task: &Task, target: &str) -> Option<KanbanError> {
    let others = || tasks.iter().filter(|t| t.id != task.id);
    let class = (!task.class.is_empty()).then(|| cfg.class(&task.class)).flatten();

    if let Some(class) = class {
        let limit = cfg.class_wip_limit(&class.name);
        // Moves into archived are not limited by class.
        if limit > 0 && !cfg.is_archived(target) {
            let current = others()
                .filter(|t| t.class == class.name && !cfg.is_archived(&t.status))
                .count();
            if current >= limit as usize {
                return Some(KanbanError::WipLimitExceeded {
                    scope: format!("class {}", class.name),
                    limit,
                    current,
                });
            }
        }
        if class.bypass_column_wip {
            return None;
        }
    }

    let limit = cfg.wip_limit(target);
    if limit > 0 {
        let current = others().filter(|t| t.status == target).count();
        if current >= limit as usize {
            return Some(KanbanError::WipLimitExceeded {
                scope: format!("status {target}"),
                limit,
                current,
            });
        }
    }
    None
}

/// Set `task.status` to `to` and maintain `started`/`completed`.
pub fn apply_transition(cfg: &Config, task: &mut Task, to: &str, now: DateTime<Utc>) {
    let was_terminal = cfg.is_terminal(&task.status);
    task.status = to.to_string();

    let initial = cfg.statuses.first().map(|s| s.name.as_str());
    if Some(to) != initial && task.started.is_none() {
        task.started = Some(now);
    }
    if cfg.is_terminal(to) {
        if !was_terminal || task.completed.is_none() {
            task.completed = Some(now);
        }
    } else if was_terminal {
        task.completed = None;
    }
}

/// Check `parent` and `depends_on` references for task `id`.
pub fn validate_refs(cfg: &Config, id: u32, parent: Option<u32>, depends_on: &[u32]) -> Result<()> {
    if parent == Some(id) {
        return Err(KanbanError::SelfReference { id, field: "parent" });
    }
    if depends_on.contains(&id) {
        return Err(KanbanError::SelfReference { id, field: "depends_on" });
    }
    let dir = cfg.tasks_path();
    for dep in parent.iter().chain(depends_on) {
        if store::find_by_id(&dir, *dep).is_err() {
            return Err(KanbanError::DependencyNotFound { id: *dep });
        }
    }
    Ok(())
}

fn check_if_status(task: &Task, expected: Option<&str>) -> Result<()> {
    match expected {
        Some(expected) if expected != task.status => Err(KanbanError::StatusConflict {
            id: task.id,
            expected: expected.to_string(),
            actual: task.status.clone(),
        }),
        _ => Ok(()),
    }
}

/// Write the task and append `entries`, returning any log warnings.
fn commit(cfg: &Config, task: &mut Task, entries: &[LogEntry]) -> Result<Vec<String>> {
    store::write_task(cfg, task)?;
    Ok(append_all(cfg.dir(), entries))
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// Where a move goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Status(String),
    Next,
    Prev,
}

#[derive(Debug, Clone)]
pub struct MoveOptions {
    pub target: Target,
    pub claim: Option<String>,
    pub force: bool,
    pub if_status: Option<String>,
}

impl MoveOptions {
    pub fn to(status: impl Into<String>) -> Self {
        MoveOptions {
            target: Target::Status(status.into()),
            claim: None,
            force: false,
            if_status: None,
        }
    }
}

/// Result of a mutation that may be a no-op.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub task: Task,
    pub from: String,
    pub changed: bool,
    pub warnings: Vec<String>,
}

/// Resolve a move target against the configured order.
///
/// `Next` never steps into `archived`; use archive for that.
pub fn resolve_target(cfg: &Config, task: &Task, target: &Target) -> Result<String> {
    let current = cfg.status_index(&task.status);
    let boundary = |edge| KanbanError::StatusBoundary {
        id: task.id,
        status: task.status.clone(),
        edge,
    };
    match target {
        Target::Status(name) => {
            cfg.check_status(name)?;
            Ok(name.clone())
        }
        Target::Next => {
            let next = current
                .map(|i| i + 1)
                .and_then(|i| cfg.statuses.get(i))
                .filter(|s| !cfg.is_archived(&s.name))
                .ok_or_else(|| boundary("last"))?;
            Ok(next.name.clone())
        }
        Target::Prev => {
            let prev = current
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| cfg.statuses.get(i))
                .ok_or_else(|| boundary("first"))?;
            Ok(prev.name.clone())
        }
    }
}

/// Move task `id` according to `opts`.
pub fn move_task(cfg: &Config, id: u32, opts: &MoveOptions, now: DateTime<Utc>) -> Result<MoveOutcome> {
    let (tasks, read_warnings) = store::read_all_lenient(cfg)?;
    let mut task = store::load(cfg, id)?;
    let mut warnings = warning_strings(read_warnings);
    let from = task.status.clone();

    check_if_status(&task, opts.if_status.as_deref())?;
    let target = resolve_target(cfg, &task, &opts.target)?;

    let actor = opts.claim.as_deref().filter(|a| !a.is_empty());
    let reclaim = actor.is_some_and(|a| a != task.claimed_by);
    if target == task.status && !reclaim {
        return Ok(MoveOutcome {
            task,
            from,
            changed: false,
            warnings,
        });
    }

    let timeout = cfg.claim_timeout();
    warnings.extend(check_claim(&task, actor, opts.force, timeout, now)?);
    if target != task.status {
        warnings.extend(check_wip(cfg, &tasks, &task, &target, opts.force)?);
    }
    if cfg.requires_claim(&target) && actor.is_none() {
        return Err(KanbanError::ClaimRequired { id, status: target });
    }

    let mut entries = Vec::new();
    if target != task.status {
        apply_transition(cfg, &mut task, &target, now);
        entries.push(LogEntry::new(now, Action::Move, id, format!("{from} -> {target}")));
    }
    if let Some(actor) = actor {
        if reclaim {
            entries.push(LogEntry::new(now, Action::Claim, id, actor));
        }
        task.claim(actor, now);
    }
    task.updated = now;

    warnings.extend(commit(cfg, &mut task, &entries)?);
    Ok(MoveOutcome {
        task,
        from,
        changed: true,
        warnings,
    })
}

/// Soft-delete task `id` by moving it to `archived`.
pub fn archive(cfg: &Config, id: u32, force: bool, now: DateTime<Utc>) -> Result<MoveOutcome> {
    if !cfg.has_archived() {
        return Err(KanbanError::invalid_input(format!(
            "board has no {ARCHIVED:?} status to archive into"
        )));
    }
    let opts = MoveOptions {
        force,
        ..MoveOptions::to(ARCHIVED)
    };
    move_task(cfg, id, &opts, now)
}

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PickOptions {
    pub claim: String,
    pub statuses: Vec<String>,
    pub tags: Vec<String>,
    pub move_to: Option<String>,
    pub force: bool,
}

/// Choose the next task to work on, or `None` when nothing is eligible.
///
/// Eligible tasks are unblocked, have every dependency done, are unclaimed
/// or hold an expired claim, and sit in one of `statuses` (any
/// non-terminal status when empty). Highest priority wins, then oldest
/// `created`, then lowest id.
pub fn select_pick<'a>(
    cfg: &Config,
    tasks: &'a [Task],
    statuses: &[String],
    tags: &[String],
    now: DateTime<Utc>,
) -> Option<&'a Task> {
    let index = status_index(tasks);
    let timeout = cfg.claim_timeout();

    tasks
        .iter()
        .filter(|t| {
            if statuses.is_empty() {
                !cfg.is_terminal(&t.status)
            } else {
                statuses.contains(&t.status)
            }
        })
        .filter(|t| !cfg.is_archived(&t.status))
        .filter(|t| tags.is_empty() || tags.iter().any(|tag| t.tags.contains(tag)))
        .filter(|t| !t.blocked)
        .filter(|t| deps_satisfied(cfg, t, &index))
        .filter(|t| !t.is_claimed() || t.claim_expired(timeout, now))
        .min_by(|a, b| {
            priority_desc(cfg, a, b)
                .then_with(|| a.created.cmp(&b.created))
                .then_with(|| a.id.cmp(&b.id))
        })
}

fn priority_desc(cfg: &Config, a: &Task, b: &Task) -> Ordering {
    let pa = cfg.priority_index(&a.priority);
    let pb = cfg.priority_index(&b.priority);
    // Higher index is more urgent; unknown priorities rank lowest.
    pb.cmp(&pa)
}

/// Pick, claim and optionally move the next task in one write.
pub fn pick(cfg: &Config, opts: &PickOptions, now: DateTime<Utc>) -> Result<MoveOutcome> {
    if opts.claim.trim().is_empty() {
        return Err(KanbanError::invalid_input("pick requires --claim <name>"));
    }
    for status in &opts.statuses {
        cfg.check_status(status)?;
    }

    let (tasks, read_warnings) = store::read_all_lenient(cfg)?;
    let mut warnings = warning_strings(read_warnings);
    let mut task = select_pick(cfg, &tasks, &opts.statuses, &opts.tags, now)
        .cloned()
        .ok_or(KanbanError::NothingToPick)?;
    let from = task.status.clone();
    let id = task.id;

    let mut entries = vec![LogEntry::new(now, Action::Claim, id, opts.claim.as_str())];
    task.claim(&opts.claim, now);

    if let Some(target) = opts.move_to.as_deref().filter(|t| *t != task.status) {
        cfg.check_status(target)?;
        warnings.extend(check_wip(cfg, &tasks, &task, target, opts.force)?);
        apply_transition(cfg, &mut task, target, now);
        entries.push(LogEntry::new(now, Action::Move, id, format!("{from} -> {target}")));
    }
    task.updated = now;

    warnings.extend(commit(cfg, &mut task, &entries)?);
    Ok(MoveOutcome {
        task,
        from,
        changed: true,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Handoff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct HandoffOptions {
    pub claim: String,
    pub block: Option<String>,
    pub note: Option<String>,
    pub release: bool,
    pub force: bool,
}

/// Move a claimed task to review with an optional block, note and release.
pub fn handoff(cfg: &Config, id: u32, opts: &HandoffOptions, now: DateTime<Utc>) -> Result<MoveOutcome> {
    if opts.claim.trim().is_empty() {
        return Err(KanbanError::invalid_input("handoff requires --claim <name>"));
    }
    if cfg.status_index(REVIEW).is_none() {
        return Err(KanbanError::invalid_input(format!(
            "board has no {REVIEW:?} status to hand off to"
        )));
    }
    if opts.block.as_deref().is_some_and(|r| r.trim().is_empty()) {
        return Err(KanbanError::invalid_input("block reason must not be empty"));
    }

    let (tasks, read_warnings) = store::read_all_lenient(cfg)?;
    let mut warnings = warning_strings(read_warnings);
    let mut task = store::load(cfg, id)?;
    let from = task.status.clone();

    warnings.extend(check_claim(&task, Some(&opts.claim), opts.force, cfg.claim_timeout(), now)?);
    if task.status != REVIEW {
        warnings.extend(check_wip(cfg, &tasks, &task, REVIEW, opts.force)?);
    }

    let mut entries = Vec::new();
    if task.status != REVIEW {
        apply_transition(cfg, &mut task, REVIEW, now);
        entries.push(LogEntry::new(now, Action::Move, id, format!("{from} -> {REVIEW}")));
    }
    if task.claimed_by != opts.claim {
        task.claim(&opts.claim, now);
    }
    entries.push(LogEntry::new(
        now,
        Action::Handoff,
        id,
        opts.note.clone().unwrap_or_else(|| opts.claim.clone()),
    ));
    if let Some(reason) = &opts.block {
        task.block(reason);
        entries.push(LogEntry::new(now, Action::Block, id, reason.as_str()));
    }
    if let Some(note) = &opts.note {
        append_note(&mut task, &opts.claim, note, now);
    }
    if opts.release {
        task.release();
        entries.push(LogEntry::new(now, Action::Release, id, opts.claim.as_str()));
    }
    task.updated = now;

    warnings.extend(commit(cfg, &mut task, &entries)?);
    Ok(MoveOutcome {
        task,
        from,
        changed: true,
        warnings,
    })
}

/// Append `**<timestamp>** <actor>: <note>` as its own line.
fn append_note(task: &mut Task, actor: &str, note: &str, now: DateTime<Utc>) {
    if !task.body.is_empty() && !task.body.ends_with('\n') {
        task.body.push('\n');
    }
    task.body
        .push_str(&format!("\n**{}** {actor}: {}\n", format_instant(&now), note.trim()));
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub title: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub class: Option<String>,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub due: Option<DateTime<Utc>>,
    pub estimate: Option<String>,
    pub parent: Option<u32>,
    pub depends_on: Vec<u32>,
    pub body: Option<String>,
    pub claim: Option<String>,
    pub force: bool,
}

/// Create a task, assigning `next_id` and saving the config first.
pub fn create_task(cfg: &mut Config, opts: &CreateOptions, now: DateTime<Utc>) -> Result<(Task, Vec<String>)> {
    let title = opts.title.trim();
    if title.is_empty() {
        return Err(KanbanError::invalid_input("title must not be empty"));
    }
    let status = opts.status.clone().unwrap_or_else(|| cfg.defaults.status.clone());
    let priority = opts.priority.clone().unwrap_or_else(|| cfg.defaults.priority.clone());
    let class = opts.class.clone().unwrap_or_else(|| cfg.defaults.class.clone());
    cfg.check_status(&status)?;
    cfg.check_priority(&priority)?;
    cfg.check_class(&class)?;

    let id = cfg.next_id;
    let mut task = Task::new(id, title, now);
    task.priority = priority;
    task.class = class;
    task.assignee = opts.assignee.clone().unwrap_or_default();
    task.add_tags(&opts.tags);
    task.due = opts.due;
    task.estimate = opts.estimate.clone().unwrap_or_default();
    task.parent = opts.parent;
    task.set_depends_on(opts.depends_on.clone());
    task.body = opts.body.clone().unwrap_or_default();
    validate_refs(cfg, id, task.parent, &task.depends_on)?;

    let (tasks, read_warnings) = store::read_all_lenient(cfg)?;
    let mut warnings = warning_strings(read_warnings);
    warnings.extend(check_wip(cfg, &tasks, &task, &status, opts.force)?);
    let actor = opts.claim.as_deref().filter(|a| !a.is_empty());
    if cfg.requires_claim(&status) && actor.is_none() {
        return Err(KanbanError::ClaimRequired { id, status });
    }

    // The initial status counts as a transition out of nothing.
    task.status = cfg.statuses.first().map(|s| s.name.clone()).unwrap_or_default();
    apply_transition(cfg, &mut task, &status, now);

    let mut entries = vec![LogEntry::new(now, Action::Create, id, title)];
    if let Some(actor) = actor {
        task.claim(actor, now);
        entries.push(LogEntry::new(now, Action::Claim, id, actor));
    }

    cfg.next_id += 1;
    cfg.save()?;
    warnings.extend(commit(cfg, &mut task, &entries)?);
    Ok((task, warnings))
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub class: Option<String>,
    pub assignee: Option<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub due: Option<DateTime<Utc>>,
    pub clear_due: bool,
    pub estimate: Option<String>,
    pub parent: Option<u32>,
    pub clear_parent: bool,
    pub add_deps: Vec<u32>,
    pub remove_deps: Vec<u32>,
    pub block: Option<String>,
    pub unblock: bool,
    pub body: Option<String>,
    pub append_body: Option<String>,
    pub claim: Option<String>,
    pub release: bool,
    pub force: bool,
    pub if_status: Option<String>,
}

impl EditOptions {
    fn check_conflicts(&self) -> Result<()> {
        let conflict = |a: &str, b: &str| Err(KanbanError::invalid_input(format!("{a} and {b} cannot be combined")));
        if self.block.is_some() && self.unblock {
            return conflict("--block", "--unblock");
        }
        if self.due.is_some() && self.clear_due {
            return conflict("--due", "--clear-due");
        }
        if self.parent.is_some() && self.clear_parent {
            return conflict("--parent", "--clear-parent");
        }
        if self.body.is_some() && self.append_body.is_some() {
            return conflict("--body", "--append-body");
        }
        if self.block.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(KanbanError::invalid_input("block reason must not be empty"));
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(KanbanError::invalid_input("title must not be empty"));
        }
        Ok(())
    }
}

/// Apply `opts` to task `id`. A request that changes nothing fails with
/// `NO_CHANGES`.
pub fn edit_task(cfg: &Config, id: u32, opts: &EditOptions, now: DateTime<Utc>) -> Result<(Task, Vec<String>)> {
    opts.check_conflicts()?;
    let (tasks, read_warnings) = store::read_all_lenient(cfg)?;
    let mut warnings = warning_strings(read_warnings);
    let original = store::load(cfg, id)?;
    check_if_status(&original, opts.if_status.as_deref())?;

    // With --release, --claim names the holder giving the claim up.
    let actor = opts.claim.as_deref().filter(|a| !a.is_empty());
    warnings.extend(check_claim(&original, actor, opts.force, cfg.claim_timeout(), now)?);

    let mut task = original.clone();
    let mut entries = Vec::new();
    let mut changed: Vec<&str> = Vec::new();

    if let Some(title) = &opts.title {
        task.title = title.trim().to_string();
    }
    if let Some(priority) = &opts.priority {
        cfg.check_priority(priority)?;
        task.priority = priority.clone();
    }
    if let Some(class) = &opts.class {
        cfg.check_class(class)?;
        task.class = class.clone();
    }
    if let Some(assignee) = &opts.assignee {
        task.assignee = assignee.clone();
    }
    task.add_tags(&opts.add_tags);
    task.remove_tags(&opts.remove_tags);
    if opts.clear_due {
        task.due = None;
    } else if opts.due.is_some() {
        task.due = opts.due;
    }
    if let Some(estimate) = &opts.estimate {
        task.estimate = estimate.clone();
    }
    if opts.clear_parent {
        task.parent = None;
    } else if opts.parent.is_some() {
        task.parent = opts.parent;
    }
    if !opts.add_deps.is_empty() || !opts.remove_deps.is_empty() {
        let mut deps = task.depends_on.clone();
        deps.extend(&opts.add_deps);
        deps.retain(|d| !opts.remove_deps.contains(d));
        task.set_depends_on(deps);
    }
    if task.parent != original.parent || task.depends_on != original.depends_on {
        validate_refs(cfg, id, task.parent, &task.depends_on)?;
    }
    if let Some(body) = &opts.body {
        task.body = body.clone();
    }
    if let Some(extra) = &opts.append_body {
        if !task.body.is_empty() && !task.body.ends_with('\n') {
            task.body.push('\n');
        }
        task.body.push_str(extra);
        if !task.body.ends_with('\n') {
            task.body.push('\n');
        }
    }

    for (field, differs) in [
        ("title", task.title != original.title),
        ("priority", task.priority != original.priority),
        ("class", task.class != original.class),
        ("assignee", task.assignee != original.assignee),
        ("tags", task.tags != original.tags),
        ("due", task.due != original.due),
        ("estimate", task.estimate != original.estimate),
        ("parent", task.parent != original.parent),
        ("depends_on", task.depends_on != original.depends_on),
        ("body", task.body != original.body),
    ] {
        if differs {
            changed.push(field);
        }
    }

    if let Some(status) = opts.status.as_deref().filter(|s| *s != original.status) {
        cfg.check_status(status)?;
        warnings.extend(check_wip(cfg, &tasks, &task, status, opts.force)?);
        if cfg.requires_claim(status) && (actor.is_none() || opts.release) {
            return Err(KanbanError::ClaimRequired {
                id,
                status: status.to_string(),
            });
        }
        apply_transition(cfg, &mut task, status, now);
        changed.push("status");
        entries.push(LogEntry::new(now, Action::Move, id, format!("{} -> {status}", original.status)));
    }

    if let Some(reason) = &opts.block {
        if !task.blocked || task.block_reason != *reason {
            task.block(reason);
            changed.push("blocked");
            entries.push(LogEntry::new(now, Action::Block, id, reason.as_str()));
        }
    } else if opts.unblock && task.blocked {
        task.unblock();
        changed.push("blocked");
        entries.push(LogEntry::new(now, Action::Unblock, id, ""));
    }

    if opts.release {
        if task.is_claimed() {
            let previous = task.claimed_by.clone();
            task.release();
            changed.push("claim");
            entries.push(LogEntry::new(now, Action::Release, id, previous));
        }
    } else if let Some(actor) = actor {
        if task.claimed_by != actor {
            task.claim(actor, now);
            changed.push("claim");
            entries.push(LogEntry::new(now, Action::Claim, id, actor));
        }
    }

    if changed.is_empty() {
        return Err(KanbanError::NoChanges { id });
    }
    task.updated = now;
    entries.insert(0, LogEntry::new(now, Action::Edit, id, changed.join(", ")));

    warnings.extend(commit(cfg, &mut task, &entries)?);
    Ok((task, warnings))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Ids of tasks that reference `id` as parent or dependency.
pub fn dependants(tasks: &[Task], id: u32) -> Vec<u32> {
    tasks
        .iter()
        .filter(|t| t.id != id && (t.parent == Some(id) || t.depends_on.contains(&id)))
        .map(|t| t.id)
        .collect()
}

/// Remove task `id`'s file. References from other tasks are reported as
/// warnings and left in place.
pub fn delete_task(cfg: &Config, id: u32, now: DateTime<Utc>) -> Result<(Task, Vec<String>)> {
    let (tasks, read_warnings) = store::read_all_lenient(cfg)?;
    let mut warnings = warning_strings(read_warnings);
    let task = store::load(cfg, id)?;

    for other in dependants(&tasks, id) {
        warnings.push(format!("task #{other} still references deleted task #{id}"));
    }

    store::delete_task(cfg, &task)?;
    warnings.extend(append_all(
        cfg.dir(),
        &[LogEntry::new(now, Action::Delete, id, task.title.as_str())],
    ));
    Ok((task, warnings))
}
