//! Board configuration: model, load/save, validation and lookups.
//!
//! The config lives in `config.yml` at the board root. Loading always runs
//! the [`crate::migrate`] chain first, validates the result, and rewrites the
//! file when any migration ran. Migrations rewrite the whole file, so they
//! should be run from a single terminal; a concurrent writer would race.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::date::parse_duration;
use crate::error::{KanbanError, Result};
use crate::migrate;

/// Latest config schema version this binary understands.
pub const CURRENT_VERSION: u32 = 6;

/// Name of the config file inside a board directory.
pub const CONFIG_FILE: &str = "config.yml";

/// Conventional board directory name, looked up from the working directory.
pub const DEFAULT_DIR: &str = "kanban";

/// Name of the activity log inside a board directory.
pub const ACTIVITY_FILE: &str = "activity.jsonl";

/// Reserved soft-delete status.
pub const ARCHIVED: &str = "archived";

/// Status handoff moves tasks into.
pub const REVIEW: &str = "review";

/// Conventional queue column following the backlog.
pub const TODO: &str = "todo";

/// Board name and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoardInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// One board column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "StatusRepr")]
pub struct StatusConfig {
    pub name: String,
    pub require_claim: bool,
    pub show_duration: Option<bool>,
}

/// On-disk forms of a status: a bare name, or a mapping with flags.
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        require_claim: bool,
        #[serde(default)]
        show_duration: Option<bool>,
    },
}

impl From<StatusRepr> for StatusConfig {
    fn from(repr: StatusRepr) -> Self {
        match repr {
            StatusRepr::Name(name) => StatusConfig::new(name),
            StatusRepr::Full {
                name,
                require_claim,
                show_duration,
            } => StatusConfig {
                name,
                require_claim,
                show_duration,
            },
        }
    }
}

impl Serialize for StatusConfig {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Full<'a> {
            name: &'a str,
            #[serde(skip_serializing_if = "std::ops::Not::not")]
            require_claim: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            show_duration: Option<bool>,
        }

        if !self.require_claim && self.show_duration.is_none() {
            s.serialize_str(&self.name)
        } else {
            Full {
                name: &self.name,
                require_claim: self.require_claim,
                show_duration: self.show_duration,
            }
            .serialize(s)
        }
    }
}

impl StatusConfig {
    pub fn new(name: impl Into<String>) -> Self {
        StatusConfig {
            name: name.into(),
            require_claim: false,
            show_duration: None,
        }
    }
}

/// Values applied to new tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Defaults {
    pub status: String,
    pub priority: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
}

/// Class-of-service policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bypass_column_wip: bool,
}

/// Card age colouring step for the TUI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeThreshold {
    pub after: String,
    pub color: String,
}

/// Terminal UI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuiConfig {
    #[serde(default = "default_title_lines")]
    pub title_lines: u8,
    #[serde(default)]
    pub age_thresholds: Vec<AgeThreshold>,
}

fn default_title_lines() -> u8 {
    2
}

impl Default for TuiConfig {
    fn default() -> Self {
        TuiConfig {
            title_lines: default_title_lines(),
            age_thresholds: default_age_thresholds(),
        }
    }
}

/// Per-board configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    pub board: BoardInfo,
    pub tasks_dir: String,
    pub statuses: Vec<StatusConfig>,
    pub priorities: Vec<String>,
    pub defaults: Defaults,
    #[serde(default)]
    pub wip_limits: BTreeMap<String, i64>,
    #[serde(default)]
    pub classes: Vec<ClassConfig>,
    #[serde(default)]
    pub claim_timeout: String,
    #[serde(default)]
    pub tui: TuiConfig,
    pub next_id: u32,

    /// Absolute board directory; never serialized.
    #[serde(skip)]
    dir: PathBuf,
}

pub fn default_statuses() -> Vec<String> {
    ["backlog", "todo", "in-progress", "review", "done", ARCHIVED]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_priorities() -> Vec<String> {
    ["low", "medium", "high", "critical"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_classes() -> Vec<ClassConfig> {
    vec![
        ClassConfig {
            name: "expedite".into(),
            wip_limit: Some(1),
            bypass_column_wip: true,
        },
        ClassConfig {
            name: "fixed-date".into(),
            wip_limit: None,
            bypass_column_wip: false,
        },
        ClassConfig {
            name: "standard".into(),
            wip_limit: None,
            bypass_column_wip: false,
        },
        ClassConfig {
            name: "intangible".into(),
            wip_limit: None,
            bypass_column_wip: false,
        },
    ]
}

pub fn default_age_thresholds() -> Vec<AgeThreshold> {
    vec![
        AgeThreshold {
            after: "1d".into(),
            color: "yellow".into(),
        },
        AgeThreshold {
            after: "3d".into(),
            color: "red".into(),
        },
    ]
}

impl Config {
    /// Build a fresh current-version config for `dir`.
    pub fn new_default(dir: &Path, name: &str) -> Self {
        Config {
            version: CURRENT_VERSION,
            board: BoardInfo {
                name: name.to_string(),
                description: String::new(),
            },
            tasks_dir: "tasks".into(),
            statuses: default_statuses().into_iter().map(StatusConfig::new).collect(),
            priorities: default_priorities(),
            defaults: Defaults {
                status: "backlog".into(),
                priority: "medium".into(),
                class: String::new(),
            },
            wip_limits: BTreeMap::new(),
            classes: default_classes(),
            claim_timeout: "1h".into(),
            tui: TuiConfig::default(),
            next_id: 1,
            dir: dir.to_path_buf(),
        }
    }

    /// Load, migrate and validate the config in board directory `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Err(KanbanError::BoardNotFound {
                path: dir.to_path_buf(),
            });
        }

        let raw = fs::read_to_string(&path)?;
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&raw)
            .map_err(|e| KanbanError::invalid_config(format!("{}: {e}", path.display())))?;
        let (value, migrated) = migrate::migrate(value)?;

        let mut cfg: Config = serde_yaml_ng::from_value(value)
            .map_err(|e| KanbanError::invalid_config(format!("{}: {e}", path.display())))?;
        cfg.dir = absolute(dir)?;
        cfg.validate()?;

        if migrated {
            tracing::info!(path = %path.display(), version = CURRENT_VERSION, "rewriting migrated config");
            cfg.save()?;
        }
        Ok(cfg)
    }

    /// Write the config atomically.
    pub fn save(&self) -> Result<()> {
        let data = serde_yaml_ng::to_string(self)?;
        crate::store::atomic_write(&self.config_path(), data.as_bytes())?;
        Ok(())
    }

    /// Check every cross-field invariant.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(KanbanError::invalid_config(msg));

        if self.version != CURRENT_VERSION {
            return bad(format!("version {} is not current ({CURRENT_VERSION})", self.version));
        }
        if self.tasks_dir.trim().is_empty() {
            return bad("tasks_dir must not be empty".into());
        }
        if self.statuses.len() < 2 {
            return bad("at least two statuses are required".into());
        }
        if let Some(dup) = first_duplicate(self.statuses.iter().map(|s| s.name.as_str())) {
            return bad(format!("duplicate status {dup:?}"));
        }
        if self.statuses.iter().any(|s| s.name.trim().is_empty()) {
            return bad("status names must not be empty".into());
        }
        if self.priorities.is_empty() {
            return bad("at least one priority is required".into());
        }
        if let Some(dup) = first_duplicate(self.priorities.iter().map(String::as_str)) {
            return bad(format!("duplicate priority {dup:?}"));
        }
        if self.status_index(&self.defaults.status).is_none() {
            return bad(format!("default status {:?} is not a configured status", self.defaults.status));
        }
        if self.priority_index(&self.defaults.priority).is_none() {
            return bad(format!(
                "default priority {:?} is not a configured priority",
                self.defaults.priority
            ));
        }
        if !self.defaults.class.is_empty() && self.class(&self.defaults.class).is_none() {
            return bad(format!("default class {:?} is not a configured class", self.defaults.class));
        }
        for (status, limit) in &self.wip_limits {
            if self.status_index(status).is_none() {
                return bad(format!("wip_limits references unknown status {status:?}"));
            }
            if *limit < 0 {
                return bad(format!("wip_limits.{status} must not be negative"));
            }
        }
        if let Some(dup) = first_duplicate(self.classes.iter().map(|c| c.name.as_str())) {
            return bad(format!("duplicate class {dup:?}"));
        }
        for class in &self.classes {
            if class.wip_limit.is_some_and(|l| l < 0) {
                return bad(format!("class {:?} wip_limit must not be negative", class.name));
            }
        }
        if parse_duration(&self.claim_timeout).is_none() {
            return bad(format!("claim_timeout {:?} is not a duration", self.claim_timeout));
        }
        if !(1..=3).contains(&self.tui.title_lines) {
            return bad(format!("tui.title_lines must be 1, 2 or 3 (got {})", self.tui.title_lines));
        }
        for threshold in &self.tui.age_thresholds {
            if parse_duration(&threshold.after).is_none() {
                return bad(format!("tui.age_thresholds after {:?} is not a duration", threshold.after));
            }
        }
        if self.next_id == 0 {
            return bad("next_id must be positive".into());
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Paths
    // -------------------------------------------------------------------

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join(&self.tasks_dir)
    }

    pub fn activity_path(&self) -> PathBuf {
        self.dir.join(ACTIVITY_FILE)
    }

    // -------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------

    pub fn status_names(&self) -> Vec<String> {
        self.statuses.iter().map(|s| s.name.clone()).collect()
    }

    pub fn status_index(&self, name: &str) -> Option<usize> {
        self.statuses.iter().position(|s| s.name == name)
    }

    pub fn priority_index(&self, name: &str) -> Option<usize> {
        self.priorities.iter().position(|p| p == name)
    }

    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.name == name)
    }

    pub fn class(&self, name: &str) -> Option<&ClassConfig> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn status(&self, name: &str) -> Option<&StatusConfig> {
        self.statuses.iter().find(|s| s.name == name)
    }

    /// The last configured status that is not `archived`.
    pub fn done_status(&self) -> &str {
        self.statuses
            .iter()
            .rev()
            .find(|s| s.name != ARCHIVED)
            .map(|s| s.name.as_str())
            .unwrap_or(ARCHIVED)
    }

    pub fn is_terminal(&self, status: &str) -> bool {
        status == ARCHIVED || status == self.done_status()
    }

    /// Waiting columns: the first status, and `todo` when configured.
    pub fn is_queue(&self, status: &str) -> bool {
        status == TODO || self.statuses.first().is_some_and(|s| s.name == status)
    }

    pub fn is_archived(&self, status: &str) -> bool {
        status == ARCHIVED
    }

    pub fn has_archived(&self) -> bool {
        self.status_index(ARCHIVED).is_some()
    }

    pub fn requires_claim(&self, status: &str) -> bool {
        self.status(status).is_some_and(|s| s.require_claim)
    }

    pub fn shows_duration(&self, status: &str) -> bool {
        self.status(status)
            .map(|s| s.show_duration.unwrap_or(!self.is_terminal(status)))
            .unwrap_or(false)
    }

    /// Column limit for `status`; 0 means unlimited.
    pub fn wip_limit(&self, status: &str) -> u32 {
        self.wip_limits
            .get(status)
            .copied()
            .map(|l| u32::try_from(l).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Board-wide limit for `class`; 0 means unlimited.
    pub fn class_wip_limit(&self, class: &str) -> u32 {
        self.class(class)
            .and_then(|c| c.wip_limit)
            .map(|l| u32::try_from(l).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Claim expiry; zero means claims never expire.
    pub fn claim_timeout(&self) -> Duration {
        parse_duration(&self.claim_timeout).unwrap_or_else(Duration::zero)
    }

    // -------------------------------------------------------------------
    // Validation helpers for user input
    // -------------------------------------------------------------------

    pub fn check_status(&self, status: &str) -> Result<()> {
        match self.status_index(status) {
            Some(_) => Ok(()),
            None => Err(KanbanError::InvalidStatus {
                status: status.to_string(),
                allowed: self.status_names(),
            }),
        }
    }

    pub fn check_priority(&self, priority: &str) -> Result<()> {
        match self.priority_index(priority) {
            Some(_) => Ok(()),
            None => Err(KanbanError::InvalidPriority {
                priority: priority.to_string(),
                allowed: self.priorities.clone(),
            }),
        }
    }

    pub fn check_class(&self, class: &str) -> Result<()> {
        if class.is_empty() || self.class_index(class).is_some() {
            return Ok(());
        }
        Err(KanbanError::InvalidClass {
            class: class.to_string(),
            allowed: self.classes.iter().map(|c| c.name.clone()).collect(),
        })
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().find(|n| !seen.insert(*n))
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(dir))
}

/// Locate a board directory by walking upward from `start`.
///
/// At every level `<dir>/kanban/config.yml` is tried; at the starting
/// directory only, `<start>/config.yml` is accepted too.
pub fn find_dir(start: &Path) -> Result<PathBuf> {
    let start = absolute(start)?;

    if start.join(DEFAULT_DIR).join(CONFIG_FILE).is_file() {
        return Ok(start.join(DEFAULT_DIR));
    }
    if start.join(CONFIG_FILE).is_file() {
        return Ok(start);
    }

    let mut current = start.clone();
    while current.pop() {
        let candidate = current.join(DEFAULT_DIR);
        if candidate.join(CONFIG_FILE).is_file() {
            return Ok(candidate);
        }
    }

    Err(KanbanError::BoardNotFound { path: start })
}

/// Create a new board under `dir`, failing if one already exists.
pub fn init(dir: &Path, name: &str) -> Result<Config> {
    if dir.join(CONFIG_FILE).exists() {
        return Err(KanbanError::BoardAlreadyExists {
            path: dir.to_path_buf(),
        });
    }
    fs::create_dir_all(dir)?;
    let cfg = Config::new_default(&absolute(dir)?, name);
    fs::create_dir_all(cfg.tasks_path())?;
    cfg.save()?;
    Ok(cfg)
}

// -----------------------------------------------------------------------
// `config get/set` key table
// -----------------------------------------------------------------------

type Getter = fn(&Config) -> Value;
type Setter = fn(&mut Config, &str) -> Result<()>;

/// A user-addressable config key.
pub struct ConfigKey {
    pub key: &'static str,
    pub get: Getter,
    /// `None` for read-only keys.
    pub set: Option<Setter>,
}

pub static CONFIG_KEYS: &[ConfigKey] = &[
    ConfigKey {
        key: "version",
        get: |c| json!(c.version),
        set: None,
    },
    ConfigKey {
        key: "board.name",
        get: |c| json!(c.board.name),
        set: Some(|c, v| {
            if v.trim().is_empty() {
                return Err(KanbanError::invalid_input("board.name must not be empty"));
            }
            c.board.name = v.trim().to_string();
            Ok(())
        }),
    },
    ConfigKey {
        key: "board.description",
        get: |c| json!(c.board.description),
        set: Some(|c, v| {
            c.board.description = v.to_string();
            Ok(())
        }),
    },
    ConfigKey {
        key: "tasks_dir",
        get: |c| json!(c.tasks_dir),
        set: None,
    },
    ConfigKey {
        key: "statuses",
        get: |c| json!(c.status_names()),
        set: None,
    },
    ConfigKey {
        key: "priorities",
        get: |c| json!(c.priorities),
        set: None,
    },
    ConfigKey {
        key: "classes",
        get: |c| json!(c.classes.iter().map(|k| k.name.clone()).collect::<Vec<_>>()),
        set: None,
    },
    ConfigKey {
        key: "defaults.status",
        get: |c| json!(c.defaults.status),
        set: Some(|c, v| {
            c.check_status(v)?;
            c.defaults.status = v.to_string();
            Ok(())
        }),
    },
    ConfigKey {
        key: "defaults.priority",
        get: |c| json!(c.defaults.priority),
        set: Some(|c, v| {
            c.check_priority(v)?;
            c.defaults.priority = v.to_string();
            Ok(())
        }),
    },
    ConfigKey {
        key: "defaults.class",
        get: |c| json!(c.defaults.class),
        set: Some(|c, v| {
            c.check_class(v)?;
            c.defaults.class = v.to_string();
            Ok(())
        }),
    },
    ConfigKey {
        key: "claim_timeout",
        get: |c| json!(c.claim_timeout),
        set: Some(|c, v| {
            if parse_duration(v).is_none() {
                return Err(KanbanError::invalid_input(format!(
                    "claim_timeout {v:?} is not a duration (e.g. 30m, 1h, 2d)"
                )));
            }
            c.claim_timeout = v.trim().to_string();
            Ok(())
        }),
    },
    ConfigKey {
        key: "tui.title_lines",
        get: |c| json!(c.tui.title_lines),
        set: Some(|c, v| match v.trim().parse::<u8>() {
            Ok(n @ 1..=3) => {
                c.tui.title_lines = n;
                Ok(())
            }
            _ => Err(KanbanError::invalid_input("tui.title_lines must be 1, 2 or 3")),
        }),
    },
    ConfigKey {
        key: "next_id",
        get: |c| json!(c.next_id),
        set: None,
    },
];

fn lookup_key(key: &str) -> Result<&'static ConfigKey> {
    CONFIG_KEYS.iter().find(|k| k.key == key).ok_or_else(|| {
        let known: Vec<&str> = CONFIG_KEYS.iter().map(|k| k.key).collect();
        KanbanError::invalid_input(format!("unknown config key {key:?} (known: {})", known.join(", ")))
    })
}

/// Read one config key.
pub fn get_key(cfg: &Config, key: &str) -> Result<Value> {
    Ok((lookup_key(key)?.get)(cfg))
}

/// Set one config key in memory and re-validate; the caller saves.
pub fn set_key(cfg: &mut Config, key: &str, value: &str) -> Result<()> {
    let entry = lookup_key(key)?;
    let setter = entry
        .set
        .ok_or_else(|| KanbanError::invalid_input(format!("config key {key:?} is read-only")))?;
    setter(cfg, value)?;
    cfg.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let temp = TempDir::new().unwrap();
        let cfg = init(&temp.path().join(DEFAULT_DIR), "Test").unwrap();
        (temp, cfg)
    }

    #[test]
    fn test_init_and_load_round_trip() {
        let (temp, cfg) = setup();
        let loaded = Config::load(&temp.path().join(DEFAULT_DIR)).unwrap();
        assert_eq!(loaded, cfg);
        assert!(loaded.tasks_path().is_dir());
    }

    #[test]
    fn test_init_twice_fails() {
        let (temp, _cfg) = setup();
        let err = init(&temp.path().join(DEFAULT_DIR), "Again").unwrap_err();
        assert!(matches!(err, KanbanError::BoardAlreadyExists { .. }));
    }

    #[test]
    fn test_load_missing_board() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(temp.path()).unwrap_err();
        assert!(matches!(err, KanbanError::BoardNotFound { .. }));
    }

    #[test]
    fn test_load_rejects_future_version() {
        let (temp, cfg) = setup();
        let raw = fs::read_to_string(cfg.config_path()).unwrap();
        let raw = raw.replace(&format!("version: {CURRENT_VERSION}"), "version: 99");
        fs::write(cfg.config_path(), raw).unwrap();
        let err = Config::load(&temp.path().join(DEFAULT_DIR)).unwrap_err();
        assert!(matches!(err, KanbanError::InvalidConfig { .. }));
    }

    #[test]
    fn test_find_dir_walks_upward() {
        let (temp, _cfg) = setup();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let found = find_dir(&nested).unwrap();
        assert_eq!(found, temp.path().join(DEFAULT_DIR));
    }

    #[test]
    fn test_find_dir_accepts_board_dir_itself() {
        let (temp, _cfg) = setup();
        let board = temp.path().join(DEFAULT_DIR);
        assert_eq!(find_dir(&board).unwrap(), board);
    }

    #[test]
    fn test_find_dir_not_found() {
        let temp = TempDir::new().unwrap();
        let err = find_dir(temp.path()).unwrap_err();
        assert!(matches!(err, KanbanError::BoardNotFound { .. }));
    }

    #[test]
    fn test_terminal_statuses() {
        let (_temp, cfg) = setup();
        assert_eq!(cfg.done_status(), "done");
        assert!(cfg.is_terminal("done"));
        assert!(cfg.is_terminal(ARCHIVED));
        assert!(!cfg.is_terminal("review"));
        assert!(cfg.shows_duration("in-progress"));
        assert!(!cfg.shows_duration("done"));
    }

    #[test]
    fn test_validate_rejects_bad_wip_limits() {
        let (_temp, mut cfg) = setup();
        cfg.wip_limits.insert("nope".into(), 2);
        assert!(cfg.validate().is_err());

        cfg.wip_limits.clear();
        cfg.wip_limits.insert("todo".into(), -1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_status() {
        let (_temp, mut cfg) = setup();
        cfg.statuses.push(StatusConfig::new("todo"));
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate status"));
    }

    #[test]
    fn test_status_flags_serialize_compactly() {
        let mut cfg = Config::new_default(Path::new("/tmp"), "x");
        cfg.statuses[2].require_claim = true;
        let yaml = serde_yaml_ng::to_string(&cfg).unwrap();
        assert!(yaml.contains("- backlog\n"));
        assert!(yaml.contains("require_claim: true"));

        let back: Config = serde_yaml_ng::from_str(&yaml).unwrap();
        assert!(back.requires_claim("in-progress"));
        assert!(!back.requires_claim("todo"));
    }

    #[test]
    fn test_config_keys() {
        let (_temp, mut cfg) = setup();
        assert_eq!(get_key(&cfg, "defaults.status").unwrap(), json!("backlog"));

        set_key(&mut cfg, "defaults.priority", "high").unwrap();
        assert_eq!(cfg.defaults.priority, "high");

        let err = set_key(&mut cfg, "defaults.priority", "urgent").unwrap_err();
        assert!(matches!(err, KanbanError::InvalidPriority { .. }));

        let err = set_key(&mut cfg, "next_id", "5").unwrap_err();
        assert!(matches!(err, KanbanError::InvalidInput { .. }));

        let err = get_key(&cfg, "bogus").unwrap_err();
        assert!(matches!(err, KanbanError::InvalidInput { .. }));

        set_key(&mut cfg, "claim_timeout", "2h").unwrap();
        assert_eq!(cfg.claim_timeout(), Duration::hours(2));
    }
}
