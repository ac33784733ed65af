// src/engine/session.rs

//! Settled-change handler that re-plans affected pipelines.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::engine::planner::BuildPlanner;
use crate::engine::report::PlanReporter;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::templates::normalize_path;
use crate::types::ChangeKind;
use crate::watch::SettledChangeHandler;

/// Re-plans the pipelines a settled change can affect.
///
/// Every settled change opens a fresh [`BuildPlanner`], so template edits
/// between changes are always seen.
#[derive(Debug)]
pub struct WatchSession<W: Write + Send + 'static> {
    fs: Arc<dyn FileSystem>,
    config: Arc<ConfigFile>,
    watch_dir: PathBuf,
    reporter: PlanReporter<W>,
}

impl<W: Write + Send + 'static> WatchSession<W> {
    pub fn new(fs: Arc<dyn FileSystem>, config: Arc<ConfigFile>, reporter: PlanReporter<W>) -> Self {
        let watch_dir = config.resolve(&config.watch.path);
        Self {
            fs,
            config,
            watch_dir,
            reporter,
        }
    }

    pub fn reporter(&self) -> &PlanReporter<W> {
        &self.reporter
    }

    pub fn into_reporter(self) -> PlanReporter<W> {
        self.reporter
    }

    /// Pipelines whose output may depend on `path`.
    ///
    /// A pipeline is affected if `path` is inside its source directory; every
    /// template pipeline is affected if `path` is inside a search path.
    pub fn affected_pipelines(&self, path: &Path) -> Vec<String> {
        let in_search_path = self
            .config
            .search_paths()
            .iter()
            .any(|dir| path.starts_with(dir));

        self.config
            .pipelines()
            .iter()
            .filter(|(_, p)| {
                path.starts_with(self.config.resolve(&p.source)) || (p.templates && in_search_path)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Re-plan and report for one settled relative path.
    pub fn handle_change(&mut self, kind: ChangeKind, rel_path: &str) -> Result<()> {
        let path = normalize_path(&self.watch_dir.join(rel_path));
        let affected = self.affected_pipelines(&path);
        if affected.is_empty() {
            debug!(?path, %kind, "change affects no pipeline");
            return Ok(());
        }

        info!(path = %rel_path, %kind, pipelines = ?affected, "re-planning");

        let mut planner = BuildPlanner::for_config(Arc::clone(&self.fs), &self.config);
        for name in &affected {
            let plan = planner.plan_pipeline(&self.config, name)?;
            self.reporter.report(&plan)?;
        }

        let dependents = planner.graph().dependents_of(&path);
        if !dependents.is_empty() {
            info!(template = %rel_path, count = dependents.len(), "template change affects pages");
        }

        let warnings = planner.graph_mut().take_warnings();
        self.reporter.report_warnings(&warnings)?;
        Ok(())
    }
}

impl<W: Write + Send + 'static> SettledChangeHandler for WatchSession<W> {
    fn on_settled_change<'a>(
        &'a mut self,
        kind: ChangeKind,
        rel_path: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { self.handle_change(kind, rel_path) })
    }
}
