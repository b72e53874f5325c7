//! Enumerations shared by the command line and the board engine.
//!
//! These are the closed sets of values a user can pick from: output
//! formats, sort keys, grouping fields, context sections and activity-log
//! actions. Statuses, priorities and classes are board-configured and live
//! in [`crate::config`] instead.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Rendering format for command output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Compact,
    Json,
}

impl OutputFormat {
    /// Parse the `KANBAN_OUTPUT` environment value.
    pub fn from_env_value(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "compact" | "oneline" => Some(OutputFormat::Compact),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Id,
    Status,
    Priority,
    Created,
    Updated,
    Due,
}

/// Fields a task list can be grouped by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    Assignee,
    Tag,
    Class,
    Priority,
    Status,
}

/// Sections of the context digest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ContextSection {
    InProgress,
    Blocked,
    Ready,
    Overdue,
    RecentlyCompleted,
}

impl ContextSection {
    pub const ALL: [ContextSection; 5] = [
        ContextSection::InProgress,
        ContextSection::Blocked,
        ContextSection::Ready,
        ContextSection::Overdue,
        ContextSection::RecentlyCompleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContextSection::InProgress => "in-progress",
            ContextSection::Blocked => "blocked",
            ContextSection::Ready => "ready",
            ContextSection::Overdue => "overdue",
            ContextSection::RecentlyCompleted => "recently-completed",
        }
    }

    /// Heading used in the markdown digest.
    pub fn title(self) -> &'static str {
        match self {
            ContextSection::InProgress => "In Progress",
            ContextSection::Blocked => "Blocked",
            ContextSection::Ready => "Ready to Start",
            ContextSection::Overdue => "Overdue",
            ContextSection::RecentlyCompleted => "Recently Completed",
        }
    }
}

/// Mutation recorded in the activity log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Edit,
    Move,
    Delete,
    Block,
    Unblock,
    Claim,
    Release,
    Handoff,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Move => "move",
            Action::Delete => "delete",
            Action::Block => "block",
            Action::Unblock => "unblock",
            Action::Claim => "claim",
            Action::Release => "release",
            Action::Handoff => "handoff",
        }
    }
}
