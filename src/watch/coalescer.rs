// src/watch/coalescer.rs

//! Debounced watch over a directory tree or a single file.
//!
//! Raw events flow from `notify` (or any other sender of [`RawEvent`]s) into
//! one Tokio task. That task filters them, lets the [`Debouncer`] admit or
//! drop them, arms one timer per admitted path and, when a timer fires,
//! calls the [`SettledChangeHandler`] inline. Handler invocations therefore
//! never overlap.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{FreshenError, Result};
use crate::fs::FileSystem;
use crate::types::ChangeKind;
use crate::watch::debounce::Debouncer;
use crate::watch::path_utils::relative_str;
use crate::watch::watcher::{discover_dirs, open_raw_watches, RawEvent};

/// Consumer of settled changes.
///
/// `rel_path` is relative to the watched directory (for a single-file watch,
/// it is the file name). Errors are logged and do not stop the watch.
pub trait SettledChangeHandler: Send + 'static {
    fn on_settled_change<'a>(
        &'a mut self,
        kind: ChangeKind,
        rel_path: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Construction-time configuration of a [`WatchCoalescer`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub root: PathBuf,
    /// Relative to `root`; `"."` (or empty) watches `root` itself. May name a
    /// single file.
    pub subpath: PathBuf,
    pub timeout: Duration,
    /// Also watch subdirectories that exist at construction time.
    pub recursive: bool,
    pub description: String,
}

impl WatchOptions {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            subpath: PathBuf::from("."),
            timeout,
            recursive: true,
            description: "project".to_string(),
        }
    }

    pub fn subpath(mut self, subpath: impl Into<PathBuf>) -> Self {
        self.subpath = subpath.into();
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn target(&self) -> PathBuf {
        crate::templates::normalize_path(&self.root.join(&self.subpath))
    }
}

/// What is being watched, decided once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchTarget {
    /// Forward file events below `dir`; ignore directory events.
    Directory { dir: PathBuf },
    /// Forward only events whose name is exactly `file_name` inside `dir`.
    File { dir: PathBuf, file_name: String },
}

impl WatchTarget {
    fn resolve(fs: &dyn FileSystem, target: &Path) -> Result<Self> {
        if fs.is_dir(target) {
            return Ok(WatchTarget::Directory {
                dir: target.to_path_buf(),
            });
        }
        if fs.is_file(target) {
            let dir = target
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Ok(WatchTarget::File { dir, file_name });
        }
        Err(FreshenError::PathNotFound(target.to_path_buf()))
    }

    fn dir(&self) -> &Path {
        match self {
            WatchTarget::Directory { dir } | WatchTarget::File { dir, .. } => dir,
        }
    }

    /// Relative path to report for `path`, or `None` if the event is ignored.
    fn accept(&self, fs: &dyn FileSystem, path: &Path) -> Option<String> {
        let rel = relative_str(self.dir(), path)?;
        match self {
            WatchTarget::Directory { .. } => (!fs.is_dir(path)).then_some(rel),
            WatchTarget::File { file_name, .. } => (rel == *file_name).then_some(rel),
        }
    }
}

/// A running debounced watch.
///
/// Must be created inside a Tokio runtime. Call [`stop`](Self::stop) to shut
/// it down; dropping it aborts the event loop without waiting.
pub struct WatchCoalescer {
    description: String,
    watched_dirs: Vec<PathBuf>,
    raw_watches: Vec<RecommendedWatcher>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl fmt::Debug for WatchCoalescer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchCoalescer")
            .field("description", &self.description)
            .field("watched_dirs", &self.watched_dirs)
            .finish_non_exhaustive()
    }
}

impl WatchCoalescer {
    /// Open OS-level watches and start the debounce loop.
    pub fn start<H: SettledChangeHandler>(
        fs: Arc<dyn FileSystem>,
        options: WatchOptions,
        handler: H,
    ) -> Result<Self> {
        // OS events carry absolute, resolved paths; match them against a
        // canonical base.
        let requested = options.target();
        let canonical = requested.canonicalize().unwrap_or(requested);
        let target = WatchTarget::resolve(fs.as_ref(), &canonical)?;
        let dirs = match &target {
            WatchTarget::Directory { dir } => discover_dirs(fs.as_ref(), dir, options.recursive)?,
            WatchTarget::File { dir, .. } => vec![dir.clone()],
        };

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let raw_watches = open_raw_watches(&dirs, raw_tx)?;

        let mut coalescer = Self::spawn_loop(fs, options, target, handler, raw_rx);
        coalescer.watched_dirs = dirs;
        coalescer.raw_watches = raw_watches;
        Ok(coalescer)
    }

    /// Start the debounce loop fed by `raw_rx` instead of OS watches.
    ///
    /// The directory/file target is still resolved through `fs`.
    pub fn spawn_with_receiver<H: SettledChangeHandler>(
        fs: Arc<dyn FileSystem>,
        options: WatchOptions,
        handler: H,
        raw_rx: mpsc::UnboundedReceiver<RawEvent>,
    ) -> Result<Self> {
        let target = WatchTarget::resolve(fs.as_ref(), &options.target())?;
        let dirs = match &target {
            WatchTarget::Directory { dir } => discover_dirs(fs.as_ref(), dir, options.recursive)?,
            WatchTarget::File { dir, .. } => vec![dir.clone()],
        };

        let mut coalescer = Self::spawn_loop(fs, options, target, handler, raw_rx);
        coalescer.watched_dirs = dirs;
        Ok(coalescer)
    }

    fn spawn_loop<H: SettledChangeHandler>(
        fs: Arc<dyn FileSystem>,
        options: WatchOptions,
        target: WatchTarget,
        handler: H,
        raw_rx: mpsc::UnboundedReceiver<RawEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        info!(
            description = %options.description,
            dir = ?target.dir(),
            timeout_ms = options.timeout.as_millis() as u64,
            "watch started"
        );

        let event_loop = EventLoop {
            fs,
            target,
            timeout: options.timeout,
            description: options.description.clone(),
            debouncer: Debouncer::new(),
        };
        let task = tokio::spawn(event_loop.run(handler, raw_rx, shutdown_rx));

        Self {
            description: options.description,
            watched_dirs: Vec::new(),
            raw_watches: Vec::new(),
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Directories watched, as discovered at construction time.
    pub fn watched_dirs(&self) -> &[PathBuf] {
        &self.watched_dirs
    }

    /// Close every raw watch, cancel pending timers and wait for the loop to
    /// exit. No handler call starts after this returns.
    pub async fn stop(mut self) -> Result<()> {
        self.raw_watches.clear();
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.map_err(anyhow::Error::from)?;
        }
        info!(description = %self.description, "watch stopped");
        Ok(())
    }
}

impl Drop for WatchCoalescer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct EventLoop {
    fs: Arc<dyn FileSystem>,
    target: WatchTarget,
    timeout: Duration,
    description: String,
    debouncer: Debouncer,
}

impl EventLoop {
    async fn run<H: SettledChangeHandler>(
        mut self,
        mut handler: H,
        mut raw_rx: mpsc::UnboundedReceiver<RawEvent>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<(String, ChangeKind)>();

        loop {
            // A fired timer settles before newer raw events for its path.
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => break,
                Some((rel, kind)) = settled_rx.recv() => {
                    // Idle again before the handler runs.
                    self.debouncer.settle(&rel);
                    debug!(description = %self.description, path = %rel, %kind, "change settled");
                    if let Err(err) = handler.on_settled_change(kind, &rel).await {
                        warn!(path = %rel, error = %err, "settled-change handler failed");
                    }
                }
                event = raw_rx.recv() => {
                    let Some(event) = event else {
                        debug!("raw event channel closed");
                        break;
                    };
                    self.on_raw_event(event, &settled_tx);
                }
            }
        }

        self.debouncer.cancel_all();
        debug!(description = %self.description, "watch event loop finished");
    }

    fn on_raw_event(&mut self, event: RawEvent, settled_tx: &mpsc::UnboundedSender<(String, ChangeKind)>) {
        let Some(rel) = self.target.accept(self.fs.as_ref(), &event.path) else {
            return;
        };

        let timeout = self.timeout;
        let kind = event.kind;
        let admitted = self.debouncer.admit(&rel, || {
            let tx = settled_tx.clone();
            let rel = rel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                let _ = tx.send((rel, kind));
            })
            .abort_handle()
        });

        if admitted {
            debug!(path = %rel, %kind, "debounce armed");
        }
    }
}
