//! Watch events.

use camino::{Utf8Path, Utf8PathBuf};
use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;

/// A file event relevant to a checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The file was created or its contents changed.
    Change(Utf8PathBuf),
    /// The file was removed or renamed away.
    Unlink(Utf8PathBuf),
}

impl WatchEvent {
    /// Returns the absolute path of the file.
    pub fn path(&self) -> &Utf8Path {
        match self {
            WatchEvent::Change(path) | WatchEvent::Unlink(path) => path,
        }
    }

    /// Translates a notify event; events with no file meaning map to nothing.
    pub(crate) fn from_notify(event: notify::Event) -> Vec<WatchEvent> {
        let paths: Vec<Utf8PathBuf> = event
            .paths
            .into_iter()
            .filter_map(|path| match Utf8PathBuf::from_path_buf(path) {
                Ok(path) => Some(path),
                Err(path) => {
                    tracing::debug!(path = %path.display(), "skipping non-UTF-8 path");
                    None
                }
            })
            .collect();

        match event.kind {
            EventKind::Create(_) => paths.into_iter().map(WatchEvent::Change).collect(),
            EventKind::Remove(_) => paths.into_iter().map(WatchEvent::Unlink).collect(),
            EventKind::Modify(ModifyKind::Name(mode)) => rename_events(mode, paths),
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(_) => paths.into_iter().map(WatchEvent::Change).collect(),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
        }
    }
}

fn rename_events(mode: RenameMode, paths: Vec<Utf8PathBuf>) -> Vec<WatchEvent> {
    match mode {
        RenameMode::From => paths.into_iter().map(WatchEvent::Unlink).collect(),
        RenameMode::To => paths.into_iter().map(WatchEvent::Change).collect(),
        RenameMode::Both => {
            let mut paths = paths.into_iter();
            let mut events = Vec::new();
            if let Some(from) = paths.next() {
                events.push(WatchEvent::Unlink(from));
            }
            events.extend(paths.map(WatchEvent::Change));
            events
        }
        // The backend could not tell which side of the rename this is.
        RenameMode::Any | RenameMode::Other => paths
            .into_iter()
            .map(|path| {
                if path.exists() {
                    WatchEvent::Change(path)
                } else {
                    WatchEvent::Unlink(path)
                }
            })
            .collect(),
    }
}
