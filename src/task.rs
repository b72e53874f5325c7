//! Task data structure and the markdown-with-frontmatter file format.
//!
//! A task file is `---\n<yaml>---\n<body>`. Known keys map onto [`Task`];
//! unknown keys are carried along in [`Task::extra`] and written back after
//! the known ones so hand-added metadata survives a rewrite.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};

use crate::error::{KanbanError, Result};

/// Maximum length of the slug part of a filename.
pub const SLUG_MAX_LEN: usize = 50;

/// A single unit of work stored as one markdown file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub status: String,
    pub priority: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub assignee: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(with = "crate::date::opt_instant", skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(with = "crate::date::opt_instant", skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    #[serde(with = "crate::date::opt_instant", skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,
    #[serde(with = "crate::date::instant")]
    pub created: DateTime<Utc>,
    #[serde(with = "crate::date::instant")]
    pub updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub estimate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub blocked: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub block_reason: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub claimed_by: String,
    #[serde(with = "crate::date::opt_instant", skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,

    /// Frontmatter keys this version does not know about.
    #[serde(skip)]
    pub extra: Mapping,

    /// File the task was read from, if any.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

/// Frontmatter keys owned by [`Task`].
const KNOWN_KEYS: &[&str] = &[
    "id",
    "title",
    "status",
    "priority",
    "class",
    "assignee",
    "tags",
    "due",
    "started",
    "completed",
    "created",
    "updated",
    "estimate",
    "parent",
    "depends_on",
    "blocked",
    "block_reason",
    "claimed_by",
    "claimed_at",
    "body",
];

impl Task {
    pub fn new(id: u32, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Task {
            id,
            title: title.into(),
            created: now,
            updated: now,
            ..Task::default()
        }
    }

    // -------------------------------------------------------------------
    // File format
    // -------------------------------------------------------------------

    /// Parse file contents. `filename` is used to recover `id` and `title`
    /// when the frontmatter does not carry them.
    pub fn parse(content: &str, filename: Option<&str>) -> Result<Self> {
        let (frontmatter, body) = split_frontmatter(content)?;

        let mut map = match frontmatter {
            Some(yaml) if !yaml.trim().is_empty() => match serde_yaml_ng::from_str::<Value>(yaml)? {
                Value::Mapping(m) => m,
                Value::Null => Mapping::new(),
                _ => return Err(KanbanError::internal("frontmatter is not a YAML mapping")),
            },
            _ => Mapping::new(),
        };
        map.remove("body");
        let has_created = map.contains_key("created");
        let has_updated = map.contains_key("updated");

        let mut extra = Mapping::new();
        let mut known = Mapping::new();
        for (k, v) in map {
            let is_known = k.as_str().is_some_and(|name| KNOWN_KEYS.contains(&name));
            if is_known {
                known.insert(k, v);
            } else {
                extra.insert(k, v);
            }
        }

        let mut task: Task = serde_yaml_ng::from_value(Value::Mapping(known))?;
        task.body = body.to_string();
        task.extra = extra;
        if !has_updated && has_created {
            task.updated = task.created;
        }

        if let Some((id, slug)) = filename.and_then(parse_filename) {
            if task.id == 0 {
                task.id = id;
            }
            if task.title.trim().is_empty() {
                task.title = title_from_slug(slug);
            }
        }
        if task.id == 0 {
            return Err(KanbanError::internal("task has no id"));
        }
        if task.title.trim().is_empty() {
            return Err(KanbanError::internal("task has no title"));
        }
        // An absent `created` stays at the epoch default; the store substitutes the mtime.
        Ok(task)
    }

    /// Whether `created` was absent from the file.
    pub fn missing_created(&self) -> bool {
        self.created == DateTime::<Utc>::default()
    }

    /// Render the task as file contents.
    pub fn render(&self) -> Result<String> {
        let Value::Mapping(mut map) = serde_yaml_ng::to_value(self)? else {
            return Err(KanbanError::internal("task did not serialize to a mapping"));
        };
        map.remove("body");
        for (k, v) in &self.extra {
            if !map.contains_key(k) {
                map.insert(k.clone(), v.clone());
            }
        }
        let mut yaml = String::new();
        for (k, v) in map {
            match v {
                Value::Sequence(items) if items.iter().all(is_scalar) => {
                    let key = serde_yaml_ng::to_string(&k)?;
                    let items = items.iter().map(flow_item).collect::<Result<Vec<_>>>()?;
                    yaml.push_str(&format!("{}: [{}]\n", key.trim_end(), items.join(", ")));
                }
                v => {
                    let mut entry = Mapping::new();
                    entry.insert(k, v);
                    yaml.push_str(&serde_yaml_ng::to_string(&entry)?);
                }
            }
        }
        Ok(format!("---\n{yaml}---\n{}", self.body))
    }

    /// `<id>-<slug>.md` for the current title.
    pub fn filename(&self) -> String {
        filename(self.id, &self.title)
    }

    // -------------------------------------------------------------------
    // Claims and blocking
    // -------------------------------------------------------------------

    pub fn is_claimed(&self) -> bool {
        !self.claimed_by.is_empty()
    }

    /// A zero timeout never expires.
    pub fn claim_expired(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        if timeout <= Duration::zero() {
            return false;
        }
        match self.claimed_at {
            Some(at) => now - at >= timeout,
            None => true,
        }
    }

    pub fn claim(&mut self, actor: &str, now: DateTime<Utc>) {
        self.claimed_by = actor.to_string();
        self.claimed_at = Some(now);
    }

    pub fn release(&mut self) {
        self.claimed_by.clear();
        self.claimed_at = None;
    }

    pub fn block(&mut self, reason: &str) {
        self.blocked = true;
        self.block_reason = reason.to_string();
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
        self.block_reason.clear();
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due.is_some_and(|d| d < now)
    }

    /// Add tags, preserving order and skipping duplicates.
    pub fn add_tags(&mut self, tags: &[String]) {
        for tag in split_tags(tags) {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }

    pub fn remove_tags(&mut self, tags: &[String]) {
        let remove = split_tags(tags);
        self.tags.retain(|t| !remove.contains(t));
    }

    pub fn set_depends_on(&mut self, mut ids: Vec<u32>) {
        ids.sort_unstable();
        ids.dedup();
        self.depends_on = ids;
    }
}

fn is_scalar(v: &Value) -> bool {
    matches!(v, Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_))
}

/// One element of a `[a, b]` sequence. Anything that would break the flow
/// syntax is written as a double-quoted string.
fn flow_item(v: &Value) -> Result<String> {
    let plain = serde_yaml_ng::to_string(v)?;
    let plain = plain.trim_end();
    if plain.contains([',', '[', ']', '{', '}', '\n', '#']) {
        return Ok(serde_json::to_string(v)?);
    }
    Ok(plain.to_string())
}

/// Split `---` frontmatter from the body. A file with no leading `---`
/// line is all body.
fn split_frontmatter(content: &str) -> Result<(Option<&str>, &str)> {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return Ok((None, content));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Ok((Some(&rest[..offset]), &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(KanbanError::internal("unterminated frontmatter (missing closing ---)"))
}

/// Normalise a tag by trimming, lowercasing and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag arguments, normalising and de-duplicating in order.
pub fn split_tags(inputs: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ś' | 'š' | 'ß' => 's',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        'ł' => 'l',
        c if c.is_ascii_alphanumeric() => c,
        _ => return None,
    };
    Some(folded)
}

/// Lowercased, ASCII-folded, dash-separated prefix of `title`.
pub fn slug(title: &str) -> String {
    let mut out = String::new();
    for c in title.chars().flat_map(char::to_lowercase) {
        match fold_char(c) {
            Some(c) => out.push(c),
            None if !out.ends_with('-') && !out.is_empty() => out.push('-'),
            None => {}
        }
    }
    if out.len() > SLUG_MAX_LEN {
        out.truncate(SLUG_MAX_LEN);
    }
    let out = out.trim_matches('-');
    if out.is_empty() {
        "task".to_string()
    } else {
        out.to_string()
    }
}

/// Filename for task `id` with `title`.
pub fn filename(id: u32, title: &str) -> String {
    format!("{:03}-{}.md", id, slug(title))
}

/// Split `<digits>-<slug>.md` into its id and slug.
pub fn parse_filename(name: &str) -> Option<(u32, &str)> {
    let stem = name.strip_suffix(".md")?;
    let digits_end = stem.find(|c: char| !c.is_ascii_digit()).unwrap_or(stem.len());
    if digits_end == 0 {
        return None;
    }
    let id: u32 = stem[..digits_end].parse().ok()?;
    let rest = &stem[digits_end..];
    if rest.is_empty() {
        return Some((id, ""));
    }
    rest.strip_prefix('-').map(|slug| (id, slug))
}

fn title_from_slug(slug: &str) -> String {
    let words = slug.replace('-', " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = "---\nid: 7\ntitle: Fix login\nstatus: in-progress\npriority: high\ntags: [auth, bug]\ncreated: 2025-01-02T12:00:00Z\nupdated: 2025-01-03T09:15:00Z\n---\nSome **markdown** body.\n";

    #[test]
    fn test_parse_sample() {
        let task = Task::parse(SAMPLE, Some("007-fix-login.md")).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.title, "Fix login");
        assert_eq!(task.tags, vec!["auth", "bug"]);
        assert_eq!(task.created, Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap());
        assert_eq!(task.body, "Some **markdown** body.\n");
        assert!(task.due.is_none());
    }

    #[test]
    fn test_render_round_trips() {
        let task = Task::parse(SAMPLE, None).unwrap();
        assert_eq!(task.render().unwrap(), SAMPLE);
    }

    #[test]
    fn test_block_style_tags_accepted() {
        let raw = SAMPLE.replace("tags: [auth, bug]\n", "tags:\n- auth\n- bug\n");
        let task = Task::parse(&raw, None).unwrap();
        assert_eq!(task.tags, vec!["auth", "bug"]);
        assert_eq!(task.render().unwrap(), SAMPLE);
    }

    #[test]
    fn test_sequences_render_in_flow_style() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut task = Task::new(3, "Thing", now);
        task.status = "todo".into();
        task.priority = "low".into();
        task.tags = vec!["ui".into(), "a[b]".into()];
        task.set_depends_on(vec![2, 1]);
        let rendered = task.render().unwrap();
        assert!(rendered.contains("\ntags: [ui, \"a[b]\"]\n"), "{rendered}");
        assert!(rendered.contains("\ndepends_on: [1, 2]\n"), "{rendered}");
        assert_eq!(Task::parse(&rendered, None).unwrap().tags, task.tags);
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let raw = SAMPLE.replace("priority: high\n", "priority: high\nsprint: 12\n");
        let task = Task::parse(&raw, None).unwrap();
        assert_eq!(task.extra.get("sprint").and_then(Value::as_u64), Some(12));
        let rendered = task.render().unwrap();
        assert!(rendered.contains("sprint: 12\n"));
        let again = Task::parse(&rendered, None).unwrap();
        assert_eq!(again.extra, task.extra);
    }

    #[test]
    fn test_empty_optionals_omitted() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut task = Task::new(3, "Thing", now);
        task.status = "todo".into();
        task.priority = "low".into();
        let rendered = task.render().unwrap();
        for key in ["class:", "assignee:", "tags:", "due:", "blocked:", "claimed_by:", "parent:"] {
            assert!(!rendered.contains(key), "{key} should be omitted");
        }
        assert!(rendered.ends_with("---\n"));
    }

    #[test]
    fn test_body_only_file_recovers_identity() {
        let task = Task::parse("just some notes\n", Some("042-write-the-docs.md")).unwrap();
        assert_eq!(task.id, 42);
        assert_eq!(task.title, "Write the docs");
        assert_eq!(task.body, "just some notes\n");
        assert!(task.missing_created());

        let task = Task::parse("---\n---\nbody\n", Some("005-x.md")).unwrap();
        assert_eq!(task.id, 5);
        assert_eq!(task.body, "body\n");
    }

    #[test]
    fn test_missing_identity_is_an_error() {
        assert!(Task::parse("---\ntitle: x\n---\n", Some("notes.md")).is_err());
        assert!(Task::parse("---\nid: 1\ntitle: x\n", None).is_err());
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Fix login"), "fix-login");
        assert_eq!(slug("  Café: crème brûlée!! "), "cafe-creme-brulee");
        assert_eq!(slug("???"), "task");
        assert_eq!(slug("a--b__c"), "a-b-c");
        let long = "word ".repeat(30);
        assert!(slug(&long).len() <= SLUG_MAX_LEN);
        assert!(!slug(&long).ends_with('-'));
    }

    #[test]
    fn test_filename() {
        assert_eq!(filename(7, "Fix login"), "007-fix-login.md");
        assert_eq!(filename(1234, "Big"), "1234-big.md");
        assert_eq!(parse_filename("007-fix-login.md"), Some((7, "fix-login")));
        assert_eq!(parse_filename("1234.md"), Some((1234, "")));
        assert_eq!(parse_filename("abc-7.md"), None);
        assert_eq!(parse_filename("007-fix-login.txt"), None);
        assert_eq!(parse_filename("12x.md"), None);
    }

    #[test]
    fn test_claim_expiry() {
        let now = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();
        let mut task = Task::new(1, "x", now);
        task.claim("a", now - Duration::hours(1));
        assert!(task.claim_expired(Duration::hours(1), now));
        assert!(!task.claim_expired(Duration::hours(2), now));
        assert!(!task.claim_expired(Duration::zero(), now));
        task.release();
        assert!(!task.is_claimed());
        assert!(task.claimed_at.is_none());
    }

    #[test]
    fn test_tags_normalised() {
        let mut task = Task::default();
        task.add_tags(&["Bug, UI".into(), "bug".into(), "needs review".into()]);
        assert_eq!(task.tags, vec!["bug", "ui", "needs-review"]);
        task.remove_tags(&["ui".into()]);
        assert_eq!(task.tags, vec!["bug", "needs-review"]);
    }
}
