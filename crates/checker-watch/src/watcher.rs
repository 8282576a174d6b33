//! Filesystem watch subscription.

use crate::error::WatchError;
use crate::events::WatchEvent;
use crate::ignore::IgnoreMatcher;
use camino::{Utf8Path, Utf8PathBuf};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use walkdir::WalkDir;

/// Default channel capacity for watch events.
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// A recursive watch on a matcher's root, streaming [`WatchEvent`]s.
///
/// Events for ignored paths are dropped on the notify thread. A directory
/// that appears (e.g. moved in) is expanded into a change for each watched
/// file below it. Dropping the watcher releases the subscription and closes
/// the channel.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    event_rx: mpsc::Receiver<WatchEvent>,
    queued: VecDeque<WatchEvent>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Starts watching `matcher.root()` recursively.
    ///
    /// The root should be canonical so that event paths line up with the
    /// paths checkers report.
    pub fn new(matcher: IgnoreMatcher) -> Result<Self, WatchError> {
        let root = matcher.root().to_owned();
        if !root.exists() {
            return Err(WatchError::PathNotFound(root));
        }

        let (tx, event_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let events = WatchEvent::from_notify(event)
                        .into_iter()
                        .flat_map(|event| relevant_events(&matcher, event));
                    for event in events {
                        // The receiver is gone once the session ends.
                        if tx.blocking_send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "file watcher error"),
            },
            Config::default(),
        )?;

        watcher.watch(root.as_std_path(), RecursiveMode::Recursive)?;
        tracing::debug!(%root, "watching");

        Ok(Self {
            _watcher: watcher,
            event_rx,
            queued: VecDeque::new(),
        })
    }

    /// Receives the next event; `None` once the watcher is gone.
    ///
    /// Events already waiting in the channel are coalesced: an event equal to
    /// the last queued event for the same path is dropped. Backends that
    /// report both sides of a rename plus the pair would otherwise cause
    /// every file to be checked twice.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        if self.queued.is_empty() {
            let first = self.event_rx.recv().await?;
            self.queued.push_back(first);
            while let Ok(event) = self.event_rx.try_recv() {
                push_coalesced(&mut self.queued, event);
            }
        }
        self.queued.pop_front()
    }
}

fn push_coalesced(queue: &mut VecDeque<WatchEvent>, event: WatchEvent) {
    let last_for_path = queue.iter().rev().find(|queued| queued.path() == event.path());
    if last_for_path != Some(&event) {
        queue.push_back(event);
    }
}

/// Filters one event through the matcher, expanding directory changes.
fn relevant_events(matcher: &IgnoreMatcher, event: WatchEvent) -> Vec<WatchEvent> {
    match event {
        WatchEvent::Change(path) if path.is_dir() => {
            if matcher.is_ignored(&path, Some(true)) {
                return Vec::new();
            }
            files_below(&path)
                .filter(|file| !matcher.is_ignored(file, Some(false)))
                .map(WatchEvent::Change)
                .collect()
        }
        WatchEvent::Change(path) => {
            if matcher.is_ignored(&path, Some(false)) {
                Vec::new()
            } else {
                vec![WatchEvent::Change(path)]
            }
        }
        WatchEvent::Unlink(path) => {
            if is_relevant_unlink(matcher, &path) {
                vec![WatchEvent::Unlink(path)]
            } else {
                Vec::new()
            }
        }
    }
}

/// A removed path can no longer be stat'ed. An extensionless path may have
/// been a directory holding watched files, so it is let through as well.
fn is_relevant_unlink(matcher: &IgnoreMatcher, path: &Utf8Path) -> bool {
    !matcher.is_ignored(path, Some(false))
        || (path.extension().is_none() && !matcher.is_ignored(path, Some(true)))
}

fn files_below(dir: &Utf8Path) -> impl Iterator<Item = Utf8PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != "node_modules")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn next_event_for(watcher: &mut FileWatcher, path: &Utf8Path) -> Option<WatchEvent> {
        let wait = async {
            while let Some(event) = watcher.recv().await {
                if event.path() == path {
                    return Some(event);
                }
            }
            None
        };
        tokio::time::timeout(Duration::from_secs(10), wait)
            .await
            .ok()
            .flatten()
    }

    fn project() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().canonicalize().unwrap()).unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        (dir, root)
    }

    #[test]
    fn test_unlink_relevance_does_not_stat() {
        let root = Utf8PathBuf::from("/nonexistent-project");
        let matcher = IgnoreMatcher::new(&root, &["src/**/*.ts"]).unwrap();

        assert!(is_relevant_unlink(&matcher, &root.join("src/a.ts")));
        assert!(!is_relevant_unlink(&matcher, &root.join("node_modules/a.ts")));
        assert!(!is_relevant_unlink(&matcher, &root.join("a.md")));
        // possibly a directory of watched files
        assert!(is_relevant_unlink(&matcher, &root.join("src/components")));
        assert!(!is_relevant_unlink(&matcher, &root.join("node_modules/pkg")));
    }

    #[test]
    fn test_directory_change_expands_to_watched_files() {
        let (_dir, root) = project();
        let moved = root.join("src/moved");
        std::fs::create_dir_all(moved.join("nested")).unwrap();
        std::fs::write(moved.join("App.ts"), "").unwrap();
        std::fs::write(moved.join("nested/Button.ts"), "").unwrap();
        std::fs::write(moved.join("notes.md"), "").unwrap();

        let matcher = IgnoreMatcher::new(&root, &["src/**/*.ts"]).unwrap();
        let mut events = relevant_events(&matcher, WatchEvent::Change(moved.clone()));
        events.sort_by(|a, b| a.path().cmp(b.path()));

        assert_eq!(
            events,
            vec![
                WatchEvent::Change(moved.join("App.ts")),
                WatchEvent::Change(moved.join("nested/Button.ts")),
            ]
        );
    }

    #[test]
    fn test_change_of_ignored_file_is_dropped() {
        let (_dir, root) = project();
        std::fs::write(root.join("src/a.ts"), "").unwrap();
        std::fs::write(root.join("README.md"), "").unwrap();
        let matcher = IgnoreMatcher::new(&root, &["src"]).unwrap();

        let kept = relevant_events(&matcher, WatchEvent::Change(root.join("src/a.ts")));
        let dropped = relevant_events(&matcher, WatchEvent::Change(root.join("README.md")));

        assert_eq!(kept, vec![WatchEvent::Change(root.join("src/a.ts"))]);
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_coalesces_repeated_events_per_path() {
        let mut queue = VecDeque::new();
        for event in [
            WatchEvent::Unlink("/app/old.ts".into()),
            WatchEvent::Change("/app/new.ts".into()),
            // the same rename reported again as a pair
            WatchEvent::Unlink("/app/old.ts".into()),
            WatchEvent::Change("/app/new.ts".into()),
            WatchEvent::Unlink("/app/new.ts".into()),
            WatchEvent::Change("/app/new.ts".into()),
        ] {
            push_coalesced(&mut queue, event);
        }

        assert_eq!(
            Vec::from(queue),
            vec![
                WatchEvent::Unlink("/app/old.ts".into()),
                WatchEvent::Change("/app/new.ts".into()),
                WatchEvent::Unlink("/app/new.ts".into()),
                WatchEvent::Change("/app/new.ts".into()),
            ]
        );
    }

    #[test]
    fn test_missing_root() {
        let matcher = IgnoreMatcher::new(Utf8Path::new("/nonexistent-project"), &["src"]).unwrap();
        assert!(matches!(
            FileWatcher::new(matcher),
            Err(WatchError::PathNotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reports_created_file() {
        let (_dir, root) = project();

        let matcher = IgnoreMatcher::new(&root, &["src"]).unwrap();
        let mut watcher = FileWatcher::new(matcher).unwrap();

        let file = root.join("src/a.ts");
        std::fs::write(&file, "let a = 1;\n").unwrap();

        let event = next_event_for(&mut watcher, &file).await;
        assert_eq!(event, Some(WatchEvent::Change(file)));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_reports_files_of_renamed_directory() {
        let (_dir, root) = project();
        let components = root.join("src/components");
        std::fs::create_dir_all(&components).unwrap();
        std::fs::write(components.join("App.ts"), "let a = 1;\n").unwrap();

        let matcher = IgnoreMatcher::new(&root, &["src"]).unwrap();
        let mut watcher = FileWatcher::new(matcher).unwrap();

        let moved = root.join("src/moved");
        std::fs::rename(&components, &moved).unwrap();

        let unlinked = next_event_for(&mut watcher, &components).await;
        assert_eq!(unlinked, Some(WatchEvent::Unlink(components)));

        let file = moved.join("App.ts");
        let changed = next_event_for(&mut watcher, &file).await;
        assert_eq!(changed, Some(WatchEvent::Change(file)));
    }
}
