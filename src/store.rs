//! Task-file persistence.
//!
//! Each task is one file in the board's tasks directory. Writes go through a
//! temp file in the same directory followed by a rename, so readers never
//! observe a half-written task.
//!
//! Renaming a task on title change is the one multi-step operation here.
//! When the new filename is unused the old file is renamed onto it and then
//! rewritten in place. Otherwise the new file is written and the old one
//! removed; if the process dies between the two steps, both files remain
//! for the same id. The next lenient read reports them as duplicates and the
//! operator deletes the stale one by hand.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::{KanbanError, Result};
use crate::task::{parse_filename, Task};

/// A file a lenient read could not use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadWarning {
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for ReadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Write `data` to `path` via a temp file and rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| KanbanError::internal(format!("{} has no parent directory", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{name}.{}.tmp", std::process::id()));

    let result = (|| -> std::io::Result<()> {
        let mut f = File::create(&tmp)?;
        f.write_all(data)?;
        f.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote file");
    Ok(())
}

/// Task files in `dir`, sorted by name.
fn task_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_task = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".md") && !n.starts_with('.'));
        if is_task && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(crate::date::truncate(DateTime::<Utc>::from(modified)))
}

/// Read one task file.
///
/// Missing `status`/`priority` fall back to the config defaults and a
/// missing `created` falls back to the file's modification time.
pub fn read_task(cfg: &Config, path: &Path) -> Result<Task> {
    let content = fs::read_to_string(path)?;
    let name = path.file_name().and_then(|n| n.to_str());
    let mut task = Task::parse(&content, name)
        .map_err(|e| KanbanError::internal(format!("{}: {e}", path.display())))?;

    if task.status.is_empty() {
        task.status = cfg.defaults.status.clone();
    }
    if task.priority.is_empty() {
        task.priority = cfg.defaults.priority.clone();
    }
    if task.missing_created() {
        if let Some(mtime) = file_mtime(path) {
            task.created = mtime;
            if task.updated == DateTime::<Utc>::default() {
                task.updated = mtime;
            }
        }
    }
    task.path = Some(path.to_path_buf());
    Ok(task)
}

/// Read every task, failing on the first unreadable file.
pub fn read_all(cfg: &Config) -> Result<Vec<Task>> {
    task_files(&cfg.tasks_path())?
        .iter()
        .map(|path| read_task(cfg, path))
        .collect()
}

/// Read every task that parses, collecting a warning for each file that
/// does not and for each duplicated id.
pub fn read_all_lenient(cfg: &Config) -> Result<(Vec<Task>, Vec<ReadWarning>)> {
    let mut tasks: Vec<Task> = Vec::new();
    let mut warnings = Vec::new();
    let mut seen: HashMap<u32, PathBuf> = HashMap::new();

    for path in task_files(&cfg.tasks_path())? {
        match read_task(cfg, &path) {
            Ok(task) => {
                if let Some(first) = seen.get(&task.id) {
                    tracing::warn!(id = task.id, first = %first.display(), second = %path.display(), "duplicate task id");
                    warnings.push(ReadWarning {
                        path: path.clone(),
                        message: format!("duplicate id {} (also in {})", task.id, first.display()),
                    });
                    continue;
                }
                seen.insert(task.id, path);
                tasks.push(task);
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable task file");
                warnings.push(ReadWarning {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }
    Ok((tasks, warnings))
}

/// Path of the file holding task `id`.
pub fn find_by_id(tasks_dir: &Path, id: u32) -> Result<PathBuf> {
    task_files(tasks_dir)?
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_filename)
                .is_some_and(|(file_id, _)| file_id == id)
        })
        .ok_or(KanbanError::TaskNotFound { id })
}

/// Load task `id` strictly.
pub fn load(cfg: &Config, id: u32) -> Result<Task> {
    let path = find_by_id(&cfg.tasks_path(), id)?;
    read_task(cfg, &path)
}

/// Write `task`, moving its file when the title changed.
pub fn write_task(cfg: &Config, task: &mut Task) -> Result<PathBuf> {
    let dir = cfg.tasks_path();
    fs::create_dir_all(&dir)?;
    let target = dir.join(task.filename());
    let data = task.render()?;

    match task.path.clone() {
        Some(old) if old != target && old.exists() => {
            if target.exists() {
                atomic_write(&target, data.as_bytes())?;
                fs::remove_file(&old)?;
            } else {
                fs::rename(&old, &target)?;
                atomic_write(&target, data.as_bytes())?;
            }
            tracing::debug!(from = %old.display(), to = %target.display(), "renamed task file");
        }
        _ => atomic_write(&target, data.as_bytes())?,
    }

    task.path = Some(target.clone());
    Ok(target)
}

/// Remove the file for `task`.
pub fn delete_task(cfg: &Config, task: &Task) -> Result<()> {
    let path = match &task.path {
        Some(p) => p.clone(),
        None => find_by_id(&cfg.tasks_path(), task.id)?,
    };
    fs::remove_file(&path)?;
    tracing::debug!(path = %path.display(), "deleted task file");
    Ok(())
}
