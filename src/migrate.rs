//! Versioned config migrations.
//!
//! Each step upgrades a raw YAML document from version `v` to `v + 1` by
//! filling in new fields with their defaults and bumping `version`. Steps
//! work on [`serde_yaml_ng::Value`] so that older shapes never have to be
//! representable by the current [`crate::config::Config`] type.

use serde_yaml_ng::{Mapping, Value};

use crate::config::{
    default_age_thresholds, default_classes, ARCHIVED, CURRENT_VERSION,
};
use crate::error::{KanbanError, Result};

type Step = fn(&mut Mapping) -> Result<()>;

/// Upgrade steps, indexed by the version they upgrade *from*.
const STEPS: &[(u32, Step)] = &[
    (1, add_wip_limits),
    (2, add_claim_timeout),
    (3, add_classes),
    (4, add_tui),
    (5, add_description_and_archived),
];

/// Run every pending step; returns the upgraded document and whether any ran.
pub fn migrate(value: Value) -> Result<(Value, bool)> {
    let Value::Mapping(mut map) = value else {
        return Err(KanbanError::invalid_config("config must be a YAML mapping"));
    };

    let mut version = read_version(&map)?;
    if version > CURRENT_VERSION {
        return Err(KanbanError::invalid_config(format!(
            "config version {version} is newer than this binary supports ({CURRENT_VERSION}); upgrade kanban-md"
        )));
    }

    let start = version;
    while version < CURRENT_VERSION {
        let (_, step) = STEPS
            .iter()
            .find(|(from, _)| *from == version)
            .ok_or_else(|| KanbanError::internal(format!("no migration from version {version}")))?;
        step(&mut map)?;
        version += 1;
        map.insert(key("version"), Value::from(version));
        tracing::debug!(from = version - 1, to = version, "applied config migration");
    }

    Ok((Value::Mapping(map), version != start))
}

fn read_version(map: &Mapping) -> Result<u32> {
    let version = map
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);
    if version < 1 {
        return Err(KanbanError::invalid_config("config version must be a positive integer"));
    }
    Ok(version)
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn insert_default(map: &mut Mapping, name: &str, value: Value) {
    if !map.contains_key(name) {
        map.insert(key(name), value);
    }
}

fn to_value<T: serde::Serialize>(v: T) -> Result<Value> {
    Ok(serde_yaml_ng::to_value(v)?)
}

fn add_wip_limits(map: &mut Mapping) -> Result<()> {
    insert_default(map, "wip_limits", Value::Mapping(Mapping::new()));
    Ok(())
}

fn add_claim_timeout(map: &mut Mapping) -> Result<()> {
    insert_default(map, "claim_timeout", key("1h"));
    Ok(())
}

fn add_classes(map: &mut Mapping) -> Result<()> {
    insert_default(map, "classes", to_value(default_classes())?);
    Ok(())
}

fn add_tui(map: &mut Mapping) -> Result<()> {
    let mut tui = Mapping::new();
    tui.insert(key("title_lines"), Value::from(2u8));
    tui.insert(key("age_thresholds"), to_value(default_age_thresholds())?);
    insert_default(map, "tui", Value::Mapping(tui));
    Ok(())
}

fn add_description_and_archived(map: &mut Mapping) -> Result<()> {
    if let Some(Value::Mapping(board)) = map.get_mut("board") {
        insert_default(board, "description", key(""));
    }

    if let Some(Value::Sequence(statuses)) = map.get_mut("statuses") {
        let has_archived = statuses.iter().any(|s| match s {
            Value::String(name) => name == ARCHIVED,
            Value::Mapping(m) => m.get("name").and_then(Value::as_str) == Some(ARCHIVED),
            _ => false,
        });
        if !has_archived {
            statuses.push(key(ARCHIVED));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    macro_rules! fixture {
        ($name:literal) => {
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/config/", $name))
        };
    }

    const FIXTURES: &[(&str, &str)] = &[
        ("v1", fixture!("v1.yml")),
        ("v2", fixture!("v2.yml")),
        ("v3", fixture!("v3.yml")),
        ("v4", fixture!("v4.yml")),
        ("v5", fixture!("v5.yml")),
    ];

    fn load_fixture(raw: &str) -> (TempDir, Config) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("config.yml"), raw).unwrap();
        let cfg = Config::load(temp.path()).unwrap();
        (temp, cfg)
    }

    #[test]
    fn test_every_fixture_reaches_current_version() {
        for (name, raw) in FIXTURES {
            let (temp, cfg) = load_fixture(raw);
            assert_eq!(cfg.version, CURRENT_VERSION, "{name}");
            assert!(cfg.has_archived(), "{name}");

            // The migrated file was rewritten and loads back identically.
            let reloaded = Config::load(temp.path()).unwrap();
            assert_eq!(reloaded, cfg, "{name}");
            let on_disk = fs::read_to_string(temp.path().join("config.yml")).unwrap();
            assert!(on_disk.contains(&format!("version: {CURRENT_VERSION}")), "{name}");
        }
    }

    #[test]
    fn test_migration_keeps_user_data() {
        let (_temp, cfg) = load_fixture(fixture!("v1.yml"));
        assert_eq!(cfg.board.name, "Legacy Board");
        assert_eq!(cfg.next_id, 12);
        assert_eq!(cfg.priorities, vec!["low", "normal", "urgent"]);
        assert_eq!(cfg.defaults.priority, "normal");
        assert_eq!(cfg.claim_timeout, "1h");
        assert_eq!(cfg.tui.title_lines, 2);
        assert_eq!(cfg.status_names().last().map(String::as_str), Some(ARCHIVED));
    }

    #[test]
    fn test_migration_does_not_override_existing_fields() {
        let (_temp, cfg) = load_fixture(fixture!("v3.yml"));
        assert_eq!(cfg.wip_limits.get("doing"), Some(&2));
        assert_eq!(cfg.claim_timeout, "30m");
    }

    #[test]
    fn test_archived_not_duplicated() {
        let (_temp, cfg) = load_fixture(fixture!("v5.yml"));
        let archived = cfg.statuses.iter().filter(|s| s.name == ARCHIVED).count();
        assert_eq!(archived, 1);
        assert!(cfg.requires_claim("in-progress"));
    }

    #[test]
    fn test_current_version_is_untouched() {
        let raw = Value::Mapping({
            let mut m = Mapping::new();
            m.insert(key("version"), Value::from(CURRENT_VERSION));
            m
        });
        let (_, migrated) = migrate(raw).unwrap();
        assert!(!migrated);
    }

    #[test]
    fn test_rejects_bad_versions() {
        for version in [0u32, 99] {
            let mut m = Mapping::new();
            m.insert(key("version"), Value::from(version));
            let err = migrate(Value::Mapping(m)).unwrap_err();
            assert!(matches!(err, KanbanError::InvalidConfig { .. }), "{version}");
        }
        let err = migrate(Value::Mapping(Mapping::new())).unwrap_err();
        assert!(matches!(err, KanbanError::InvalidConfig { .. }));
    }
}
