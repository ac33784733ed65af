// src/classify/classifier.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::classify::{normalize_extension, ChangeRecord, ClassifyRequest, SourceFile};
use crate::errors::{FreshenError, Result};
use crate::fs::FileSystem;
use crate::types::ChangeStatus;

/// Classify every matching source file under `req.source_dir`.
///
/// - Files are visited depth-first in the order `read_dir` reports them and
///   records come back in that same order.
/// - A missing source directory fails with [`FreshenError::PathNotFound`].
/// - Any failing stat aborts the whole pass; no partial list is returned.
pub fn classify(fs: &dyn FileSystem, req: &ClassifyRequest) -> Result<Vec<ChangeRecord>> {
    if !fs.is_dir(&req.source_dir) {
        return Err(FreshenError::PathNotFound(req.source_dir.clone()));
    }

    let extensions: Vec<String> = req
        .source_extensions
        .iter()
        .map(|e| normalize_extension(e))
        .filter(|e| !e.is_empty())
        .collect();
    let target_extension = normalize_extension(&req.target_extension);

    let mut files = Vec::new();
    walk(fs, &req.source_dir, &mut files)?;

    let mut records = Vec::new();
    for path in files {
        let Some(source) = discover_source(fs, &req.source_dir, &path, &extensions)? else {
            continue;
        };

        if req.exclude.is_excluded(&source.relative, &source.file_name) {
            debug!(file = %source.relative, "excluded from classification");
            continue;
        }

        let target_path = target_path_for(req, &source, &target_extension);
        let target_modified = if fs.exists(&target_path) {
            Some(fs.modified(&target_path)?)
        } else {
            None
        };
        let status = ChangeStatus::from_timestamps(source.modified, target_modified);

        debug!(
            file = %source.relative,
            source_mtime = source.modified,
            target_mtime = target_modified.unwrap_or(0),
            %status,
            "classified"
        );

        let target_dir = target_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| req.target_dir.clone());

        records.push(ChangeRecord {
            source_path: source.path(),
            relative: source.relative,
            source_dir: source.dir,
            source_extension: source.extension,
            source_modified: source.modified,
            target_path,
            target_dir,
            target_extension: target_extension.clone(),
            target_modified: target_modified.unwrap_or(0),
            status,
        });
    }

    info!(
        source = ?req.source_dir,
        total = records.len(),
        pending = records.iter().filter(|r| r.status.needs_build()).count(),
        "classification pass complete"
    );

    Ok(records)
}

/// Collect every file below `dir`, depth-first, in listing order.
fn walk(fs: &dyn FileSystem, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for path in fs.read_dir(dir)? {
        if fs.is_dir(&path) {
            walk(fs, &path, out)?;
        } else if fs.is_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Turn a discovered path into a [`SourceFile`] if its extension is wanted.
///
/// The longest matching extension wins so that `.min.js` beats `.js`.
fn discover_source(
    fs: &dyn FileSystem,
    root: &Path,
    path: &Path,
    extensions: &[String],
) -> Result<Option<SourceFile>> {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };

    let matched = extensions
        .iter()
        .filter(|ext| file_name.len() > ext.len() && file_name.ends_with(ext.as_str()))
        .max_by_key(|ext| ext.len());
    let Some(extension) = matched else {
        return Ok(None);
    };

    let relative = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());

    Ok(Some(SourceFile {
        relative,
        dir,
        file_name: file_name.to_string(),
        extension: extension.clone(),
        modified: fs.modified(path)?,
    }))
}

fn target_path_for(req: &ClassifyRequest, source: &SourceFile, target_extension: &str) -> PathBuf {
    let name = format!("{}{}", source.stem(), target_extension);
    if req.flatten {
        return req.target_dir.join(name);
    }

    match Path::new(&source.relative).parent() {
        Some(sub) if !sub.as_os_str().is_empty() => req.target_dir.join(sub).join(name),
        _ => req.target_dir.join(name),
    }
}
