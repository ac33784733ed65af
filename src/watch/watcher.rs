// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::ChangeKind;

/// One raw notification for one path, before any debouncing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl RawEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Map a `notify` event kind onto the two kinds we report.
///
/// Pure access events carry no change and yield `None`.
pub fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Access(_) => None,
        EventKind::Create(_) | EventKind::Remove(_) => Some(ChangeKind::Rename),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Rename),
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => Some(ChangeKind::Change),
    }
}

/// Directories to watch for `dir`: itself, plus every subdirectory that
/// exists right now when `recursive` is set.
///
/// Directories created later are not picked up.
pub fn discover_dirs(fs: &dyn FileSystem, dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut dirs = vec![dir.to_path_buf()];
    if !recursive {
        return Ok(dirs);
    }

    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for path in fs.read_dir(&current)? {
            if fs.is_dir(&path) {
                dirs.push(path.clone());
                stack.push(path);
            }
        }
    }
    Ok(dirs)
}

/// Open one non-recursive `notify` watch per directory, all forwarding into
/// `event_tx`.
///
/// Dropping the returned watchers closes the underlying OS handles.
pub fn open_raw_watches(
    dirs: &[PathBuf],
    event_tx: mpsc::UnboundedSender<RawEvent>,
) -> Result<Vec<RecommendedWatcher>> {
    let mut watchers = Vec::with_capacity(dirs.len());

    for dir in dirs {
        let tx = event_tx.clone();
        // Closure called synchronously by notify whenever an event arrives.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let Some(kind) = change_kind(&event.kind) else {
                        return;
                    };
                    for path in event.paths {
                        // The receiver is gone once the coalescer stopped.
                        let _ = tx.send(RawEvent { kind, path });
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        debug!(?dir, "raw watch opened");
        watchers.push(watcher);
    }

    info!(count = watchers.len(), "raw file watches opened");
    Ok(watchers)
}
