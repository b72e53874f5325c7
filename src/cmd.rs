//! Command implementations for the CLI interface.
//!
//! Each handler resolves the board, turns its arguments into the engine's
//! option structs, calls one engine operation and renders the result.
//! Handlers never exit; errors bubble up to `main`, which renders them in
//! the selected output format and picks the exit code.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::activity::{read_log, LogFilter};
use crate::board::{self, parse_id, CreateOptions, EditOptions, HandoffOptions, ListOptions, MoveOptions, PickOptions, Target};
use crate::config::{self, Config, ARCHIVED, CONFIG_FILE, DEFAULT_DIR};
use crate::context::{generate_context, render_context_markdown, write_context_to_file, ContextOptions, DEFAULT_DAYS};
use crate::date::{now_utc, parse_date};
use crate::error::{KanbanError, Result};
use crate::fields::{Action, ContextSection, GroupBy, SortKey};
use crate::metrics;
use crate::output::Output;
use crate::store;
use crate::task::split_tags;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new board in ./kanban (or --dir).
    Init {
        /// Board name. Defaults to the current directory's name.
        #[arg(long)]
        name: Option<String>,
        /// Comma-separated status columns, in order.
        #[arg(long, value_delimiter = ',')]
        statuses: Vec<String>,
        /// Column WIP limit as status=n. May be repeated.
        #[arg(long)]
        wip: Vec<String>,
    },

    /// Create a new task.
    Create {
        /// Short title for the task.
        title: String,
        /// Initial status (defaults to the board default).
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Class of service.
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tags", alias = "tag")]
        tags: Vec<String>,
        /// Due date: YYYY-MM-DD, RFC 3339, today, tomorrow, +3d.
        #[arg(long)]
        due: Option<String>,
        /// Free-form estimate, e.g. "3h" or "5pt".
        #[arg(long)]
        estimate: Option<String>,
        /// Parent task id.
        #[arg(long)]
        parent: Option<String>,
        /// Comma-separated ids this task depends on.
        #[arg(long, value_delimiter = ',')]
        depends_on: Vec<String>,
        /// Markdown body.
        #[arg(long)]
        body: Option<String>,
        /// Claim the new task for this actor.
        #[arg(long)]
        claim: Option<String>,
        /// Override WIP limits (with a warning).
        #[arg(long)]
        force: bool,
    },

    /// List tasks with optional filters.
    List {
        /// Filter by status. Comma-separated or repeated.
        #[arg(long, value_delimiter = ',')]
        status: Vec<String>,
        /// Filter by priority. Comma-separated or repeated.
        #[arg(long, value_delimiter = ',')]
        priority: Vec<String>,
        #[arg(long)]
        assignee: Option<String>,
        /// Match tasks carrying any of these tags.
        #[arg(long = "tags", alias = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        class: Option<String>,
        /// Only blocked tasks.
        #[arg(long, conflicts_with = "not_blocked")]
        blocked: bool,
        /// Only tasks that are not blocked.
        #[arg(long)]
        not_blocked: bool,
        /// Only children of this task.
        #[arg(long)]
        parent: Option<String>,
        /// Only tasks whose dependencies are all done.
        #[arg(long)]
        unblocked: bool,
        /// Include archived tasks.
        #[arg(long)]
        archived: bool,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Id)]
        sort: SortKey,
        #[arg(long)]
        reverse: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
        /// Group rows by a field.
        #[arg(long, value_enum)]
        group_by: Option<GroupBy>,
    },

    /// Show a single task.
    Show {
        /// Task id (7, 007 or #7).
        id: String,
    },

    /// Change fields of a task.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// New status; goes through the move rules.
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        #[arg(long = "remove-tag")]
        remove_tags: Vec<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        estimate: Option<String>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        clear_parent: bool,
        #[arg(long = "add-dep", value_delimiter = ',')]
        add_deps: Vec<String>,
        #[arg(long = "remove-dep", value_delimiter = ',')]
        remove_deps: Vec<String>,
        /// Mark blocked with this reason.
        #[arg(long)]
        block: Option<String>,
        #[arg(long)]
        unblock: bool,
        /// Replace the body.
        #[arg(long)]
        body: Option<String>,
        /// Append a line to the body.
        #[arg(long)]
        append_body: Option<String>,
        /// Act as (and claim for) this actor.
        #[arg(long)]
        claim: Option<String>,
        /// Drop the current claim. Pass --claim with the holder's name
        /// unless the claim has expired or --force is given.
        #[arg(long)]
        release: bool,
        /// Override WIP limits and foreign claims.
        #[arg(long)]
        force: bool,
        /// Only apply if the task is currently in this status.
        #[arg(long)]
        if_status: Option<String>,
    },

    /// Move a task to another status.
    Move {
        id: String,
        /// Target status.
        #[arg(required_unless_present_any = ["next", "prev"], conflicts_with_all = ["next", "prev"])]
        status: Option<String>,
        /// Move to the next status.
        #[arg(long, conflicts_with = "prev")]
        next: bool,
        /// Move to the previous status.
        #[arg(long)]
        prev: bool,
        /// Act as (and claim for) this actor.
        #[arg(long)]
        claim: Option<String>,
        /// Override WIP limits and foreign claims.
        #[arg(long)]
        force: bool,
        /// Only move if the task is currently in this status.
        #[arg(long)]
        if_status: Option<String>,
    },

    /// Claim the next eligible task.
    Pick {
        /// Actor claiming the task.
        #[arg(long)]
        claim: String,
        /// Only consider these statuses. Comma-separated or repeated.
        #[arg(long, value_delimiter = ',')]
        status: Vec<String>,
        /// Only consider tasks with any of these tags.
        #[arg(long = "tags", alias = "tag")]
        tags: Vec<String>,
        /// Move the picked task to this status.
        #[arg(long = "move")]
        move_to: Option<String>,
        #[arg(long)]
        force: bool,
    },

    /// Hand a claimed task over for review.
    Handoff {
        id: String,
        /// Actor handing off.
        #[arg(long)]
        claim: String,
        /// Mark blocked with this reason.
        #[arg(long)]
        block: Option<String>,
        /// Note appended to the body.
        #[arg(long)]
        note: Option<String>,
        /// Drop the claim after handing off.
        #[arg(long)]
        release: bool,
        #[arg(long)]
        force: bool,
    },

    /// Move a task to the archived status, keeping its file.
    Archive {
        id: String,
        #[arg(long)]
        force: bool,
    },

    /// Permanently delete a task file.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Per-status and per-priority summary.
    Board {
        /// Include the archived column.
        #[arg(long)]
        archived: bool,
    },

    /// Flow metrics: throughput, lead and cycle time, aging work.
    Metrics,

    /// Show the activity log.
    Log {
        /// Only entries at or after this date.
        #[arg(long)]
        since: Option<String>,
        /// Keep only the most recent n entries.
        #[arg(long)]
        limit: Option<usize>,
        /// Filter by action. Comma-separated or repeated.
        #[arg(long, value_enum, value_delimiter = ',')]
        action: Vec<Action>,
        /// Filter by task id.
        #[arg(long)]
        task: Option<String>,
    },

    /// Markdown digest of the board.
    Context {
        /// Sections to include, in order. Comma-separated.
        #[arg(long, value_enum, value_delimiter = ',')]
        sections: Vec<ContextSection>,
        /// Lookback for recently completed tasks.
        #[arg(long, default_value_t = DEFAULT_DAYS)]
        days: u32,
        /// Splice the digest into this file between marker comments.
        #[arg(long)]
        write_to: Option<PathBuf>,
    },

    /// Read or change board configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Launch the interactive board.
    Tui,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the whole config.
    Show,
    /// Print one key.
    Get { key: String },
    /// Set one key and save.
    Set { key: String, value: String },
}

/// Resolved global options shared by every handler.
pub struct Session {
    pub dir: Option<PathBuf>,
    pub out: Output,
}

impl Session {
    pub fn new(dir: Option<PathBuf>, out: Output) -> Self {
        Session { dir, out }
    }

    /// `--dir` if given (accepting a project root holding `kanban/`),
    /// otherwise the nearest board above the working directory.
    pub fn board_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) if !dir.join(CONFIG_FILE).is_file() && dir.join(DEFAULT_DIR).join(CONFIG_FILE).is_file() => {
                Ok(dir.join(DEFAULT_DIR))
            }
            Some(dir) => Ok(dir.clone()),
            None => config::find_dir(&std::env::current_dir()?),
        }
    }

    pub fn load(&self) -> Result<Config> {
        let dir = self.board_dir()?;
        tracing::debug!(dir = %dir.display(), "loading board");
        Config::load(&dir)
    }

    fn warn(&self, warnings: &[String]) {
        self.out.warnings(&mut io::stderr(), warnings);
    }
}

fn parse_ids(inputs: &[String]) -> Result<Vec<u32>> {
    inputs
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_id(s))
        .collect()
}

fn parse_opt_id(input: Option<&str>) -> Result<Option<u32>> {
    input.map(parse_id).transpose()
}

fn parse_opt_date(input: Option<&str>) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    input.map(parse_date).transpose()
}

/// Parse a `status=n` WIP limit.
fn parse_wip(input: &str) -> Result<(String, i64)> {
    let (status, limit) = input
        .split_once('=')
        .ok_or_else(|| KanbanError::invalid_input(format!("--wip expects status=n, got {input:?}")))?;
    let limit: u32 = limit
        .trim()
        .parse()
        .map_err(|_| KanbanError::invalid_input(format!("invalid WIP limit {limit:?} for {status:?}")))?;
    Ok((status.trim().to_string(), i64::from(limit)))
}

/// Initialise a board.
pub fn cmd_init(session: &Session, name: Option<String>, statuses: Vec<String>, wip: Vec<String>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let dir = session.dir.clone().unwrap_or_else(|| cwd.join(DEFAULT_DIR));
    let name = name.unwrap_or_else(|| {
        cwd.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Kanban")
            .to_string()
    });

    let mut statuses: Vec<String> = statuses
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !statuses.is_empty() && !statuses.iter().any(|s| s == ARCHIVED) {
        statuses.push(ARCHIVED.to_string());
    }
    let limits = wip.iter().map(|w| parse_wip(w)).collect::<Result<Vec<_>>>()?;

    // Validate the customised layout before anything touches the disk.
    let mut draft = Config::new_default(&dir, &name);
    if !statuses.is_empty() {
        draft.statuses = statuses.iter().map(config::StatusConfig::new).collect();
        draft.defaults.status = statuses[0].clone();
    }
    for (status, limit) in &limits {
        draft.check_status(status)?;
        draft.wip_limits.insert(status.clone(), *limit);
    }
    draft.validate()?;

    let mut cfg = config::init(&dir, &name)?;
    cfg.statuses = draft.statuses;
    cfg.defaults = draft.defaults;
    cfg.wip_limits = draft.wip_limits;
    cfg.save()?;
    tracing::info!(dir = %cfg.dir().display(), "initialised board");

    let mut stdout = io::stdout().lock();
    if session.out.is_json() {
        return session.out.config(&mut stdout, &cfg);
    }
    writeln!(stdout, "Initialized board {:?} in {}", cfg.board.name, cfg.dir().display())?;
    Ok(())
}

/// Create a task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_create(
    session: &Session,
    title: String,
    status: Option<String>,
    priority: Option<String>,
    class: Option<String>,
    assignee: Option<String>,
    tags: Vec<String>,
    due: Option<String>,
    estimate: Option<String>,
    parent: Option<String>,
    depends_on: Vec<String>,
    body: Option<String>,
    claim: Option<String>,
    force: bool,
) -> Result<()> {
    let mut cfg = session.load()?;
    let opts = CreateOptions {
        title,
        status,
        priority,
        class,
        assignee,
        tags: split_tags(&tags),
        due: parse_opt_date(due.as_deref())?,
        estimate,
        parent: parse_opt_id(parent.as_deref())?,
        depends_on: parse_ids(&depends_on)?,
        body,
        claim,
        force,
    };
    let (task, warnings) = board::create_task(&mut cfg, &opts, now_utc())?;
    session.warn(&warnings);
    session
        .out
        .task_result(&mut io::stdout().lock(), &task, &format!("Created task #{}: {}", task.id, task.title))
}

/// List tasks with optional filtering, sorting and grouping.
#[allow(clippy::too_many_arguments)]
pub fn cmd_list(
    session: &Session,
    status: Vec<String>,
    priority: Vec<String>,
    assignee: Option<String>,
    tags: Vec<String>,
    class: Option<String>,
    blocked: bool,
    not_blocked: bool,
    parent: Option<String>,
    unblocked: bool,
    archived: bool,
    sort: SortKey,
    reverse: bool,
    limit: Option<usize>,
    group_by: Option<GroupBy>,
) -> Result<()> {
    let cfg = session.load()?;
    for s in &status {
        cfg.check_status(s)?;
    }
    for p in &priority {
        cfg.check_priority(p)?;
    }
    if let Some(c) = &class {
        cfg.check_class(c)?;
    }

    let opts = ListOptions {
        statuses: status,
        priorities: priority,
        assignee,
        tags: split_tags(&tags),
        class,
        blocked: match (blocked, not_blocked) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        parent: parse_opt_id(parent.as_deref())?,
        unblocked,
        include_archived: archived,
        sort,
        reverse,
        limit,
    };
    let (tasks, warnings) = board::list(&cfg, &opts)?;
    session.out.read_warnings(&mut io::stderr(), &warnings);

    let mut stdout = io::stdout().lock();
    match group_by {
        Some(by) => session.out.groups(&mut stdout, &board::group_tasks(&cfg, tasks, by)),
        None => session.out.tasks(&mut stdout, &tasks),
    }
}

/// Show a single task.
pub fn cmd_show(session: &Session, id: String) -> Result<()> {
    let cfg = session.load()?;
    let task = store::load(&cfg, parse_id(&id)?)?;
    session.out.task(&mut io::stdout().lock(), &task)
}

/// Edit a task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    session: &Session,
    id: String,
    title: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    class: Option<String>,
    assignee: Option<String>,
    add_tags: Vec<String>,
    remove_tags: Vec<String>,
    due: Option<String>,
    clear_due: bool,
    estimate: Option<String>,
    parent: Option<String>,
    clear_parent: bool,
    add_deps: Vec<String>,
    remove_deps: Vec<String>,
    block: Option<String>,
    unblock: bool,
    body: Option<String>,
    append_body: Option<String>,
    claim: Option<String>,
    release: bool,
    force: bool,
    if_status: Option<String>,
) -> Result<()> {
    let cfg = session.load()?;
    let id = parse_id(&id)?;
    let opts = EditOptions {
        title,
        status,
        priority,
        class,
        assignee,
        add_tags: split_tags(&add_tags),
        remove_tags: split_tags(&remove_tags),
        due: parse_opt_date(due.as_deref())?,
        clear_due,
        estimate,
        parent: parse_opt_id(parent.as_deref())?,
        clear_parent,
        add_deps: parse_ids(&add_deps)?,
        remove_deps: parse_ids(&remove_deps)?,
        block,
        unblock,
        body,
        append_body,
        claim,
        release,
        force,
        if_status,
    };
    let (task, warnings) = board::edit_task(&cfg, id, &opts, now_utc())?;
    session.warn(&warnings);
    session
        .out
        .task_result(&mut io::stdout().lock(), &task, &format!("Updated task #{}: {}", task.id, task.title))
}

/// Move a task to another status.
#[allow(clippy::too_many_arguments)]
pub fn cmd_move(
    session: &Session,
    id: String,
    status: Option<String>,
    next: bool,
    prev: bool,
    claim: Option<String>,
    force: bool,
    if_status: Option<String>,
) -> Result<()> {
    let cfg = session.load()?;
    let target = match (status, next, prev) {
        (Some(s), _, _) => Target::Status(s),
        (None, true, _) => Target::Next,
        (None, _, true) => Target::Prev,
        (None, false, false) => return Err(KanbanError::invalid_input("move needs a status, --next or --prev")),
    };
    let opts = MoveOptions {
        target,
        claim,
        force,
        if_status,
    };
    let outcome = board::move_task(&cfg, parse_id(&id)?, &opts, now_utc())?;
    session.warn(&outcome.warnings);

    let task = &outcome.task;
    let message = if !outcome.changed {
        format!("Task #{} is already in {} (unchanged)", task.id, task.status)
    } else if outcome.from == task.status {
        format!("Claimed task #{} for {}", task.id, task.claimed_by)
    } else {
        format!("Moved task #{}: {} -> {}", task.id, outcome.from, task.status)
    };
    session.out.task_result(&mut io::stdout().lock(), task, &message)
}

/// Claim the next eligible task.
pub fn cmd_pick(
    session: &Session,
    claim: String,
    status: Vec<String>,
    tags: Vec<String>,
    move_to: Option<String>,
    force: bool,
) -> Result<()> {
    let cfg = session.load()?;
    let opts = PickOptions {
        claim,
        statuses: status,
        tags: split_tags(&tags),
        move_to,
        force,
    };
    let outcome = board::pick(&cfg, &opts, now_utc())?;
    session.warn(&outcome.warnings);

    let task = &outcome.task;
    let mut message = format!("Picked task #{}: {} (claimed by {})", task.id, task.title, task.claimed_by);
    if outcome.from != task.status {
        message.push_str(&format!(", moved {} -> {}", outcome.from, task.status));
    }
    session.out.task_result(&mut io::stdout().lock(), task, &message)
}

/// Hand a task over for review.
pub fn cmd_handoff(
    session: &Session,
    id: String,
    claim: String,
    block: Option<String>,
    note: Option<String>,
    release: bool,
    force: bool,
) -> Result<()> {
    let cfg = session.load()?;
    let opts = HandoffOptions {
        claim,
        block,
        note,
        release,
        force,
    };
    let outcome = board::handoff(&cfg, parse_id(&id)?, &opts, now_utc())?;
    session.warn(&outcome.warnings);
    let task = &outcome.task;
    session.out.task_result(
        &mut io::stdout().lock(),
        task,
        &format!("Handed off task #{}: {} -> {}", task.id, outcome.from, task.status),
    )
}

/// Archive a task.
pub fn cmd_archive(session: &Session, id: String, force: bool) -> Result<()> {
    let cfg = session.load()?;
    let outcome = board::archive(&cfg, parse_id(&id)?, force, now_utc())?;
    session.warn(&outcome.warnings);
    let task = &outcome.task;
    let message = if outcome.changed {
        format!("Archived task #{}: {}", task.id, task.title)
    } else {
        format!("Task #{} is already archived (unchanged)", task.id)
    };
    session.out.task_result(&mut io::stdout().lock(), task, &message)
}

/// Ask on the terminal; anything but y/yes declines.
fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt} [y/N] ")?;
    stderr.flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Delete a task file.
pub fn cmd_delete(session: &Session, id: String, yes: bool) -> Result<()> {
    let cfg = session.load()?;
    let id = parse_id(&id)?;
    let task = store::load(&cfg, id)?;

    if !yes {
        let prompt = format!("Delete task #{} {:?}?", task.id, task.title);
        if !io::stdin().is_terminal() {
            return Err(KanbanError::ConfirmationRequired {
                message: format!("{prompt} Pass --yes to confirm."),
            });
        }
        if !confirm(&prompt)? {
            writeln!(io::stderr(), "Aborted.")?;
            return Ok(());
        }
    }

    let (task, warnings) = board::delete_task(&cfg, id, now_utc())?;
    session.warn(&warnings);
    session
        .out
        .task_result(&mut io::stdout().lock(), &task, &format!("Deleted task #{}: {}", task.id, task.title))
}

/// Board summary.
pub fn cmd_board(session: &Session, archived: bool) -> Result<()> {
    let cfg = session.load()?;
    let (tasks, warnings) = store::read_all_lenient(&cfg)?;
    session.out.read_warnings(&mut io::stderr(), &warnings);
    let summary = board::summary(&cfg, &tasks, archived, now_utc());
    session.out.board(&mut io::stdout().lock(), &summary)
}

/// Flow metrics.
pub fn cmd_metrics(session: &Session) -> Result<()> {
    let cfg = session.load()?;
    let (tasks, warnings) = store::read_all_lenient(&cfg)?;
    session.out.read_warnings(&mut io::stderr(), &warnings);
    let m = metrics::compute(&cfg, &tasks, now_utc());
    session.out.metrics(&mut io::stdout().lock(), &m)
}

/// Activity log.
pub fn cmd_log(
    session: &Session,
    since: Option<String>,
    limit: Option<usize>,
    action: Vec<Action>,
    task: Option<String>,
) -> Result<()> {
    let cfg = session.load()?;
    let filter = LogFilter {
        since: parse_opt_date(since.as_deref())?,
        limit,
        actions: action,
        task_id: parse_opt_id(task.as_deref())?,
    };
    let (entries, warnings) = read_log(cfg.dir(), &filter)?;
    session.warn(&warnings);
    session.out.log(&mut io::stdout().lock(), &entries)
}

/// Context digest, printed or spliced into a file.
pub fn cmd_context(
    session: &Session,
    sections: Vec<ContextSection>,
    days: u32,
    write_to: Option<PathBuf>,
) -> Result<()> {
    let cfg = session.load()?;
    let (tasks, warnings) = store::read_all_lenient(&cfg)?;
    session.out.read_warnings(&mut io::stderr(), &warnings);
    let ctx = generate_context(&cfg, &tasks, &ContextOptions { sections, days }, now_utc());

    let mut stdout = io::stdout().lock();
    match write_to {
        Some(path) => {
            write_context_to_file(&path, &render_context_markdown(&ctx))?;
            if session.out.is_json() {
                return session.out.context(&mut stdout, &ctx);
            }
            writeln!(stdout, "Wrote context to {}", path.display())?;
            Ok(())
        }
        None => session.out.context(&mut stdout, &ctx),
    }
}

/// `config show|get|set`.
pub fn cmd_config(session: &Session, action: ConfigAction) -> Result<()> {
    let mut cfg = session.load()?;
    let mut stdout = io::stdout().lock();
    match action {
        ConfigAction::Show => session.out.config(&mut stdout, &cfg),
        ConfigAction::Get { key } => session.out.value(&mut stdout, &config::get_key(&cfg, &key)?),
        ConfigAction::Set { key, value } => {
            config::set_key(&mut cfg, &key, &value)?;
            cfg.save()?;
            tracing::info!(key = %key, "config updated");
            session.out.value(&mut stdout, &config::get_key(&cfg, &key)?)
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

/// Launch the terminal board. Terminal failures exit with status 1.
pub fn cmd_tui(session: &Session) -> Result<()> {
    let cfg = session.load()?;
    run_tui(cfg).map_err(KanbanError::Terminal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wip() {
        assert_eq!(parse_wip("in-progress=3").unwrap(), ("in-progress".to_string(), 3));
        assert!(parse_wip("in-progress").is_err());
        assert!(parse_wip("review=-1").is_err());
    }

    #[test]
    fn test_parse_ids_skips_blanks() {
        let ids = parse_ids(&["1".into(), "".into(), "#3".into()]).unwrap();
        assert_eq!(ids, vec![1, 3]);
        assert!(parse_ids(&["x".into()]).is_err());
    }
}
