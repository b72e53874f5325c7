//! Debounced board watcher for live refresh.
//!
//! Directories are watched non-recursively. A file path is watched through
//! its parent directory and filtered by name, so atomic replace-by-rename
//! of that file keeps being seen. Bursts of events collapse into one
//! callback once the board has been quiet for the debounce period.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{KanbanError, Result};

/// Quiet period before a change is reported.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

enum Msg {
    Event(notify::Result<Event>),
    Stop,
}

/// What a single watch registration should report.
#[derive(Debug, Clone)]
enum Scope {
    Dir(PathBuf),
    File(PathBuf),
}

impl Scope {
    fn matches(&self, path: &Path) -> bool {
        if is_temp(path) {
            return false;
        }
        match self {
            Scope::Dir(dir) => path.parent() == Some(dir.as_path()) || path == dir,
            Scope::File(file) => path == file,
        }
    }
}

fn is_temp(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".tmp"))
}

/// Running watcher. Dropping it stops the debounce thread and releases the
/// OS watch handles.
pub struct BoardWatcher {
    watcher: Option<RecommendedWatcher>,
    tx: Sender<Msg>,
    thread: Option<JoinHandle<()>>,
}

impl BoardWatcher {
    /// Watch `paths` and call `on_change` after each quiet period.
    ///
    /// Fails if any path cannot be watched. Later watcher errors are
    /// logged and do not stop the loop.
    pub fn start<F>(paths: &[PathBuf], debounce: Duration, mut on_change: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Msg>();
        let event_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(Msg::Event(res));
        })?;

        let mut scopes = Vec::new();
        for path in paths {
            let (target, scope) = if path.is_dir() {
                let dir = path.canonicalize()?;
                (dir.clone(), Scope::Dir(dir))
            } else {
                let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                    return Err(KanbanError::internal(format!("cannot watch {}", path.display())));
                };
                let parent = if parent.as_os_str().is_empty() {
                    std::env::current_dir()?
                } else {
                    parent.canonicalize()?
                };
                (parent.clone(), Scope::File(parent.join(name)))
            };
            watcher.watch(&target, RecursiveMode::NonRecursive)?;
            tracing::debug!(path = %target.display(), "watching");
            scopes.push(scope);
        }

        let relevant = move |msg: &notify::Result<Event>| match msg {
            Ok(event) => event.paths.iter().any(|p| scopes.iter().any(|s| s.matches(p))),
            Err(e) => {
                tracing::warn!(error = %e, "watch error");
                false
            }
        };

        let thread = thread::Builder::new()
            .name("kanban-watch".into())
            .spawn(move || loop {
                match rx.recv() {
                    Ok(Msg::Event(ev)) if relevant(&ev) => {}
                    Ok(Msg::Event(_)) => continue,
                    Ok(Msg::Stop) | Err(_) => return,
                }

                let mut deadline = Instant::now() + debounce;
                loop {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(wait) {
                        Ok(Msg::Event(ev)) => {
                            if relevant(&ev) {
                                deadline = Instant::now() + debounce;
                            }
                        }
                        Ok(Msg::Stop) | Err(RecvTimeoutError::Disconnected) => return,
                        Err(RecvTimeoutError::Timeout) => break,
                    }
                }
                tracing::debug!("board changed");
                on_change();
            })?;

        Ok(BoardWatcher {
            watcher: Some(watcher),
            tx,
            thread: Some(thread),
        })
    }

    /// Stop watching and wait for the debounce thread to exit.
    pub fn stop(&mut self) {
        // Dropping the watcher releases the OS handles.
        self.watcher.take();
        let _ = self.tx.send(Msg::Stop);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for BoardWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_reports_changes() {
        let temp = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel();
        let _watcher = BoardWatcher::start(&[temp.path().to_path_buf()], DEBOUNCE, move || {
            let _ = tx.send(());
        })
        .unwrap();

        fs::write(temp.path().join("001-a.md"), "x").unwrap();
        assert!(rx.recv_timeout(WAIT).is_ok());
    }

    #[test]
    fn test_file_scope_ignores_siblings() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.yml");
        fs::write(&config, "a").unwrap();
        let (tx, rx) = mpsc::channel();
        let _watcher = BoardWatcher::start(&[config.clone()], DEBOUNCE, move || {
            let _ = tx.send(());
        })
        .unwrap();

        fs::write(temp.path().join("activity.jsonl"), "{}\n").unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());

        fs::write(&config, "b").unwrap();
        assert!(rx.recv_timeout(WAIT).is_ok());
    }

    #[test]
    fn test_missing_path_fails_at_start() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope").join("deeper");
        assert!(BoardWatcher::start(&[missing], DEBOUNCE, || {}).is_err());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut watcher = BoardWatcher::start(&[temp.path().to_path_buf()], DEBOUNCE, || {}).unwrap();
        watcher.stop();
        watcher.stop();
    }

    #[test]
    fn test_temp_files_ignored() {
        assert!(is_temp(Path::new("/x/.001-a.md.123.tmp")));
        assert!(!Scope::Dir(PathBuf::from("/x")).matches(Path::new("/x/.001-a.md.1.tmp")));
        assert!(Scope::Dir(PathBuf::from("/x")).matches(Path::new("/x/001-a.md")));
        assert!(!Scope::Dir(PathBuf::from("/x")).matches(Path::new("/y/001-a.md")));
    }
}
