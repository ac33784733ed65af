// src/engine/planner.rs

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{classify, ChangeRecord, ClassifyRequest};
use crate::config::ConfigFile;
use crate::errors::{FreshenError, Result};
use crate::fs::FileSystem;
use crate::templates::TemplateGraph;
use crate::types::ChangeStatus;

/// One classified source, possibly upgraded by the template graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub record: ChangeRecord,
    /// Status to act on. Equals `record.status` unless an ancestor template
    /// or include forced an `unchanged` page to `modified`.
    pub effective: ChangeStatus,
    /// The newer template or fragment that forced the rebuild.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidated_by: Option<PathBuf>,
}

impl PlannedChange {
    fn unforced(record: ChangeRecord) -> Self {
        Self {
            effective: record.status,
            record,
            invalidated_by: None,
        }
    }

    pub fn forced(&self) -> bool {
        self.invalidated_by.is_some()
    }

    pub fn needs_build(&self) -> bool {
        self.effective.needs_build()
    }
}

/// Plan for one named pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
    pub pipeline: String,
    pub changes: Vec<PlannedChange>,
}

impl PipelinePlan {
    pub fn pending(&self) -> impl Iterator<Item = &PlannedChange> {
        self.changes.iter().filter(|c| c.needs_build())
    }
}

/// Classifier + template graph for one build session.
///
/// The graph lives exactly as long as the planner: make a new planner to
/// see template edits made after the first query.
#[derive(Debug)]
pub struct BuildPlanner {
    fs: Arc<dyn FileSystem>,
    graph: TemplateGraph,
}

impl BuildPlanner {
    pub fn new(fs: Arc<dyn FileSystem>, search_paths: Vec<PathBuf>) -> Self {
        let graph = TemplateGraph::new(Arc::clone(&fs), search_paths);
        Self { fs, graph }
    }

    pub fn for_config(fs: Arc<dyn FileSystem>, cfg: &ConfigFile) -> Self {
        Self::new(fs, cfg.search_paths())
    }

    pub fn graph(&self) -> &TemplateGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut TemplateGraph {
        &mut self.graph
    }

    /// Classify one request; with `templates`, also force pages whose
    /// ancestors or includes are newer than their rendered output.
    pub fn plan(&mut self, request: &ClassifyRequest, templates: bool) -> Result<Vec<PlannedChange>> {
        let records = classify(self.fs.as_ref(), request)?;
        let mut planned = Vec::with_capacity(records.len());

        for record in records {
            if !templates || record.status != ChangeStatus::Unchanged {
                planned.push(PlannedChange::unforced(record));
                continue;
            }

            let file_name = record.source_file_name().to_string();
            let cause = self
                .graph
                .stale_cause(&record.source_dir, &file_name, record.target_modified)?;

            match cause {
                Some(cause) => {
                    debug!(page = %record.relative, ?cause, "page forced by template graph");
                    planned.push(PlannedChange {
                        record,
                        effective: ChangeStatus::Modified,
                        invalidated_by: Some(cause),
                    });
                }
                None => planned.push(PlannedChange::unforced(record)),
            }
        }

        Ok(planned)
    }

    /// Plan a named pipeline from `cfg`.
    pub fn plan_pipeline(&mut self, cfg: &ConfigFile, name: &str) -> Result<PipelinePlan> {
        let pipeline = cfg.pipelines().get(name).ok_or_else(|| {
            FreshenError::ConfigError(format!("unknown pipeline '{}'", name))
        })?;
        let request = cfg.classify_request(pipeline)?;
        let changes = self.plan(&request, pipeline.templates)?;

        info!(
            pipeline = %name,
            total = changes.len(),
            pending = changes.iter().filter(|c| c.needs_build()).count(),
            forced = changes.iter().filter(|c| c.forced()).count(),
            "pipeline planned"
        );

        Ok(PipelinePlan {
            pipeline: name.to_string(),
            changes,
        })
    }

    /// Plan every pipeline in `cfg`, in name order.
    pub fn plan_all(&mut self, cfg: &ConfigFile) -> Result<Vec<PipelinePlan>> {
        let names: Vec<String> = cfg.pipelines().keys().cloned().collect();
        names
            .iter()
            .map(|name| self.plan_pipeline(cfg, name))
            .collect()
    }
}
