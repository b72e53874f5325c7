use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::fields::OutputFormat;

/// File-backed kanban board for humans and agents.
/// The board lives in ./kanban (or the nearest ancestor that has one),
/// or in the directory passed via --dir.
#[derive(Parser)]
#[command(name = "kanban-md", version, about = "Markdown-file kanban board CLI")]
pub struct Cli {
    /// Board directory (the one holding config.yml).
    #[arg(long, short = 'd', global = true, env = "KANBAN_DIR")]
    pub dir: Option<PathBuf>,

    /// Emit JSON.
    #[arg(long, global = true, conflicts_with_all = ["table", "compact"])]
    pub json: bool,

    /// Emit a fixed-width table (default).
    #[arg(long, global = true, conflicts_with = "compact")]
    pub table: bool,

    /// Emit one line per row.
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable ANSI colour.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Explicit flag, then `KANBAN_OUTPUT`, then table.
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.compact {
            OutputFormat::Compact
        } else if self.table {
            OutputFormat::Table
        } else {
            std::env::var("KANBAN_OUTPUT")
                .ok()
                .and_then(|v| OutputFormat::from_env_value(&v))
                .unwrap_or_default()
        }
    }

    /// Colour is on unless `--no-color` or a non-empty `NO_COLOR` is set.
    pub fn color(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
    }
}
