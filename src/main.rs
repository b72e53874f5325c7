//! # kanban-md - Markdown-file kanban board
//!
//! A command-line kanban board where every task is one markdown file with
//! YAML frontmatter, so the board lives happily in a git repository and
//! can be edited by hand, by scripts or by coding agents.
//!
//! ## Key Features
//!
//! - **Plain files**: `kanban/config.yml`, `kanban/tasks/NNN-slug.md` and an
//!   append-only `kanban/activity.jsonl`
//! - **Flow rules**: per-column and per-class WIP limits, claims with
//!   expiry, dependencies and blocked markers
//! - **Agent friendly**: `pick` and `handoff` for claim-based work queues,
//!   `--json` everywhere with stable error codes and exit codes
//! - **Views**: board summary, flow metrics, activity log, a markdown
//!   context digest and an interactive terminal board with live refresh
//!
//! ## Quick Start
//!
//! ```bash
//! kanban-md init --name "My Project"
//! kanban-md create "Fix login" --priority high --tags bug
//! kanban-md move 1 in-progress --claim alice
//! kanban-md board
//! kanban-md tui
//! ```
//!
//! Set `KANBAN_LOG=debug` to see diagnostics on stderr.

use std::io;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod activity;
pub mod board;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod context;
pub mod date;
pub mod error;
pub mod fields;
pub mod metrics;
pub mod migrate;
pub mod output;
pub mod store;
pub mod task;
pub mod watcher;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use error::{ErrorCode, Result};
use output::Output;

/// Install the stderr subscriber. The terminal board owns the screen, so
/// logging is switched off while it runs.
fn init_logging(color: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_env("KANBAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_ansi(color).with_target(false))
        .try_init();
}

fn run(cli: Cli, out: Output) -> Result<()> {
    let session = Session::new(cli.dir, out);

    match cli.command {
        Commands::Init { name, statuses, wip } => cmd_init(&session, name, statuses, wip),

        Commands::Create {
            title, status, priority, class, assignee, tags, due, estimate,
            parent, depends_on, body, claim, force,
        } => cmd_create(&session, title, status, priority, class, assignee, tags, due,
                        estimate, parent, depends_on, body, claim, force),

        Commands::List {
            status, priority, assignee, tags, class, blocked, not_blocked, parent,
            unblocked, archived, sort, reverse, limit, group_by,
        } => cmd_list(&session, status, priority, assignee, tags, class, blocked, not_blocked,
                      parent, unblocked, archived, sort, reverse, limit, group_by),

        Commands::Show { id } => cmd_show(&session, id),

        Commands::Edit {
            id, title, status, priority, class, assignee, add_tags, remove_tags, due,
            clear_due, estimate, parent, clear_parent, add_deps, remove_deps, block,
            unblock, body, append_body, claim, release, force, if_status,
        } => cmd_edit(&session, id, title, status, priority, class, assignee, add_tags,
                      remove_tags, due, clear_due, estimate, parent, clear_parent, add_deps,
                      remove_deps, block, unblock, body, append_body, claim, release, force,
                      if_status),

        Commands::Move { id, status, next, prev, claim, force, if_status } =>
            cmd_move(&session, id, status, next, prev, claim, force, if_status),

        Commands::Pick { claim, status, tags, move_to, force } =>
            cmd_pick(&session, claim, status, tags, move_to, force),

        Commands::Handoff { id, claim, block, note, release, force } =>
            cmd_handoff(&session, id, claim, block, note, release, force),

        Commands::Archive { id, force } => cmd_archive(&session, id, force),

        Commands::Delete { id, yes } => cmd_delete(&session, id, yes),

        Commands::Board { archived } => cmd_board(&session, archived),

        Commands::Metrics => cmd_metrics(&session),

        Commands::Log { since, limit, action, task } => cmd_log(&session, since, limit, action, task),

        Commands::Context { sections, days, write_to } => cmd_context(&session, sections, days, write_to),

        Commands::Config { action } => cmd_config(&session, action),

        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }

        Commands::Tui => cmd_tui(&session),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Help and version exit 0; usage errors get the INVALID_INPUT code.
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(ErrorCode::InvalidInput.exit_code());
        }
    };

    let out = Output::new(cli.format(), cli.color());
    init_logging(cli.color(), matches!(cli.command, Commands::Tui));

    if let Err(e) = run(cli, out) {
        tracing::debug!(error = ?e, "command failed");
        out.error(&mut io::stdout(), &mut io::stderr(), &e);
        std::process::exit(e.exit_code());
    }
}
