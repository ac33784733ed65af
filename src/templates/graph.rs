// src/templates/graph.rs

use std::collections::{HashMap, HashSet};
use std::iter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Dfs, Reversed};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::templates::expr::eval_literal;
use crate::templates::parser::{
    parse_blocks, parse_extends, parse_includes, parse_sets, strip_dependency_tags,
};
use crate::templates::{
    normalize_path, IncludeRef, ReferenceKind, ResolutionWarning, TemplateMetadata,
    TemplateRecord, TemplateRef,
};
use crate::types::Timestamp;

/// Cache of parsed templates for one build session.
///
/// - Entries are keyed by normalized path, so two `base.njk` files in
///   different directories never share an entry.
/// - Entries are never evicted; drop the graph (or call [`invalidate`]) to
///   observe edits made after a template was first parsed.
/// - References are resolved against `search_paths` in order, then against
///   the referencing template's own directory. First match wins.
///
/// [`invalidate`]: TemplateGraph::invalidate
#[derive(Debug)]
pub struct TemplateGraph {
    fs: Arc<dyn FileSystem>,
    search_paths: Vec<PathBuf>,
    records: HashMap<PathBuf, TemplateRecord>,
    warnings: Vec<ResolutionWarning>,
}

impl TemplateGraph {
    pub fn new(fs: Arc<dyn FileSystem>, search_paths: Vec<PathBuf>) -> Self {
        Self {
            fs,
            search_paths,
            records: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cached record for a normalized path, without parsing anything.
    pub fn get(&self, path: &Path) -> Option<&TemplateRecord> {
        self.records.get(&normalize_path(path))
    }

    /// Warnings recorded so far for references treated as missing edges.
    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ResolutionWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Drop one cached entry. Returns true if it was present.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.records.remove(&normalize_path(path)).is_some()
    }

    /// Create-or-return the record for `dir/filename`.
    ///
    /// The first lookup reads the file and resolves its `extends` tag. Asking
    /// again with `extract_includes` (or `strip_found_tags`) upgrades the
    /// existing entry in place; flags already applied are never undone.
    pub fn lookup(
        &mut self,
        dir: &Path,
        filename: &str,
        extract_includes: bool,
        strip_found_tags: bool,
    ) -> Result<&TemplateRecord> {
        let key = normalize_path(&dir.join(filename));

        if !self.records.contains_key(&key) {
            let record = self.parse_record(&key, dir, filename)?;
            self.records.insert(key.clone(), record);
        }

        if extract_includes {
            self.extract_includes(&key)?;
        }

        if strip_found_tags {
            if let Some(record) = self.records.get_mut(&key) {
                if !record.stripped {
                    record.content = strip_dependency_tags(&record.raw);
                    record.stripped = true;
                }
            }
        }

        self.records
            .get(&key)
            .ok_or_else(|| anyhow::anyhow!("template {:?} vanished from cache", key).into())
    }

    /// True if the page at `dir/filename` or anything it depends on is newer
    /// than `reference`.
    pub fn is_stale(&mut self, dir: &Path, filename: &str, reference: Timestamp) -> Result<bool> {
        Ok(self.stale_cause(dir, filename, reference)?.is_some())
    }

    /// Like [`is_stale`](Self::is_stale), but names the first file found to
    /// be newer than `reference`.
    ///
    /// Walk: the template itself, then its includes, then its parent, then
    /// the parent's includes, and so on up the `extends` chain.
    pub fn stale_cause(
        &mut self,
        dir: &Path,
        filename: &str,
        reference: Timestamp,
    ) -> Result<Option<PathBuf>> {
        let start = self.lookup(dir, filename, true, false)?.path.clone();
        let mut current = start.clone();
        let mut visited = HashSet::new();

        let cause = loop {
            visited.insert(current.clone());
            let Some(record) = self.records.get(&current) else {
                break None;
            };

            if record.last_modified > reference {
                break Some(record.path.clone());
            }
            if let Some(include) = record.includes.iter().find(|i| i.last_modified > reference) {
                break Some(include.path.clone());
            }

            let Some(parent) = record.extends.clone() else {
                break None;
            };
            if visited.contains(&parent.path) {
                warn!(template = ?record.path, parent = ?parent.path, "extends cycle; stopping walk");
                let warning = ResolutionWarning {
                    template: record.path.clone(),
                    reference: parent.filename.clone(),
                    kind: ReferenceKind::Extends,
                    reason: "extends cycle".to_string(),
                };
                self.warnings.push(warning);
                break None;
            }

            match self.lookup(&parent.dir, &parent.filename, true, false) {
                Ok(parent_record) => current = parent_record.path.clone(),
                Err(err) => {
                    warn!(template = ?current, parent = ?parent.path, error = %err, "unreadable parent template; treating as absent");
                    self.warnings.push(ResolutionWarning {
                        template: current.clone(),
                        reference: parent.filename,
                        kind: ReferenceKind::Extends,
                        reason: err.to_string(),
                    });
                    break None;
                }
            }
        };

        debug!(page = ?start, reference, ?cause, "staleness check");

        if let Some(record) = self.records.get_mut(&start) {
            record.changed_ancestor = cause.clone().filter(|c| *c != start);
        }
        Ok(cause)
    }

    /// Paths of the `extends` chain starting at `dir/filename`, root-most last.
    pub fn extends_chain(&mut self, dir: &Path, filename: &str) -> Result<Vec<PathBuf>> {
        let mut chain = vec![self.lookup(dir, filename, false, false)?.path.clone()];
        let mut next = self.records.get(&chain[0]).and_then(|r| r.extends.clone());

        while let Some(parent) = next {
            if chain.contains(&parent.path) {
                break;
            }
            let record = self.lookup(&parent.dir, &parent.filename, false, false)?;
            next = record.extends.clone();
            chain.push(record.path.clone());
        }
        Ok(chain)
    }

    /// Blocks and `set` variables of a template, extracted on first request.
    ///
    /// `set` values must be literals; others are skipped with a warning.
    pub fn metadata(&mut self, dir: &Path, filename: &str) -> Result<&TemplateMetadata> {
        let key = self.lookup(dir, filename, false, false)?.path.clone();

        let needs_pass = self.records.get(&key).is_some_and(|r| r.metadata.is_none());
        if needs_pass {
            if let Some(record) = self.records.get_mut(&key) {
                let mut metadata = TemplateMetadata {
                    blocks: parse_blocks(&record.raw),
                    ..TemplateMetadata::default()
                };
                for (name, expr) in parse_sets(&record.raw) {
                    match eval_literal(&expr) {
                        Ok(value) => {
                            metadata.variables.insert(name, value);
                        }
                        Err(err) => {
                            warn!(template = ?record.path, variable = %name, error = %err, "skipping non-literal set");
                        }
                    }
                }
                record.metadata = Some(metadata);
            }
        }

        self.records
            .get(&key)
            .and_then(|r| r.metadata.as_ref())
            .ok_or_else(|| anyhow::anyhow!("template {:?} has no metadata", key).into())
    }

    /// Every cached template that extends or includes `path`, transitively.
    ///
    /// Only edges already parsed into the cache are considered.
    pub fn dependents_of(&self, path: &Path) -> Vec<PathBuf> {
        let target = normalize_path(path);

        let mut graph: DiGraphMap<&Path, ()> = DiGraphMap::new();
        for record in self.records.values() {
            graph.add_node(record.path.as_path());
            if let Some(parent) = &record.extends {
                graph.add_edge(record.path.as_path(), parent.path.as_path(), ());
            }
            for include in &record.includes {
                graph.add_edge(record.path.as_path(), include.path.as_path(), ());
            }
        }

        if !graph.contains_node(target.as_path()) {
            return Vec::new();
        }

        let reversed = Reversed(&graph);
        let mut dfs = Dfs::new(reversed, target.as_path());
        let mut dependents = Vec::new();
        while let Some(node) = dfs.next(reversed) {
            if node != target.as_path() {
                dependents.push(node.to_path_buf());
            }
        }
        dependents.sort();
        dependents
    }

    /// Find `reference` on the search paths, then in `own_dir`.
    pub fn resolve(&self, reference: &str, own_dir: &Path) -> Option<TemplateRef> {
        self.search_paths
            .iter()
            .map(PathBuf::as_path)
            .chain(iter::once(own_dir))
            .find_map(|base| {
                let candidate = normalize_path(&base.join(reference));
                self.fs.is_file(&candidate).then(|| TemplateRef {
                    dir: base.to_path_buf(),
                    filename: reference.to_string(),
                    path: candidate,
                })
            })
    }

    fn parse_record(&mut self, key: &Path, dir: &Path, filename: &str) -> Result<TemplateRecord> {
        let raw = self.fs.read_to_string(key)?;
        let last_modified = self.fs.modified(key)?;
        let own_dir = key.parent().unwrap_or(dir).to_path_buf();

        let extends = match parse_extends(&raw) {
            Some(reference) => {
                self.resolve_or_warn(key, &own_dir, &reference, ReferenceKind::Extends)
            }
            None => None,
        };

        debug!(template = ?key, parent = ?extends.as_ref().map(|p| &p.path), "parsed template");

        Ok(TemplateRecord {
            path: key.to_path_buf(),
            dir: dir.to_path_buf(),
            filename: filename.to_string(),
            content: raw.clone(),
            raw,
            last_modified,
            extends,
            includes: Vec::new(),
            changed_ancestor: None,
            includes_extracted: false,
            stripped: false,
            metadata: None,
        })
    }

    fn extract_includes(&mut self, key: &Path) -> Result<()> {
        let Some(record) = self.records.get(key) else {
            return Ok(());
        };
        if record.includes_extracted {
            return Ok(());
        }

        let own_dir = key.parent().unwrap_or(&record.dir).to_path_buf();
        let references = parse_includes(&record.raw);

        let mut includes = Vec::with_capacity(references.len());
        for reference in references {
            let Some(found) = self.resolve_or_warn(key, &own_dir, &reference, ReferenceKind::Include)
            else {
                continue;
            };
            let last_modified = self.fs.modified(&found.path)?;
            includes.push(IncludeRef {
                dir: found.dir,
                filename: found.filename,
                path: found.path,
                last_modified,
            });
        }

        if let Some(record) = self.records.get_mut(key) {
            record.includes = includes;
            record.includes_extracted = true;
        }
        Ok(())
    }

    fn resolve_or_warn(
        &mut self,
        template: &Path,
        own_dir: &Path,
        reference: &str,
        kind: ReferenceKind,
    ) -> Option<TemplateRef> {
        let resolved = self.resolve(reference, own_dir);
        if resolved.is_none() {
            warn!(
                template = ?template,
                %kind,
                reference,
                "unresolved template reference; treating edge as absent"
            );
            self.warnings.push(ResolutionWarning {
                template: template.to_path_buf(),
                reference: reference.to_string(),
                kind,
                reason: "not found on any search path".to_string(),
            });
        }
        resolved
    }
}
