// src/lib.rs

pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod templates;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, OutputArgs, PlanArgs, StaleArgs};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{BuildPlanner, PlanReporter, WatchSession};
use crate::errors::FreshenError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::templates::TemplateGraph;
use crate::watch::{WatchCoalescer, WatchOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - classifier / template graph / planner
/// - (for `watch`) the debounced file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match args.command {
        Command::Check => {
            print_config(&cfg);
            Ok(())
        }
        Command::Plan(plan_args) => run_plan(fs, &cfg, &plan_args),
        Command::Stale(stale_args) => run_stale(fs, &cfg, &stale_args),
        Command::Watch(output) => run_watch(fs, cfg, &output).await,
    }
}

fn run_plan(fs: Arc<dyn FileSystem>, cfg: &ConfigFile, args: &PlanArgs) -> Result<()> {
    let mut planner = BuildPlanner::for_config(fs, cfg);
    let plans = match &args.pipeline {
        Some(name) => vec![planner.plan_pipeline(cfg, name)?],
        None => planner.plan_all(cfg)?,
    };

    let mut reporter = PlanReporter::stdout(args.output.format, args.output.all);
    for plan in &plans {
        reporter.report(plan)?;
    }
    reporter.report_warnings(planner.graph().warnings())?;
    Ok(())
}

fn run_stale(fs: Arc<dyn FileSystem>, cfg: &ConfigFile, args: &StaleArgs) -> Result<()> {
    let reference = match (&args.since, &args.against) {
        (Some(ms), _) => *ms,
        (None, Some(target)) => {
            if !fs.exists(target) {
                println!("stale (no output at {})", target.display());
                return Ok(());
            }
            fs.modified(target)?
        }
        (None, None) => {
            return Err(FreshenError::ConfigError(
                "either --since or --against is required".to_string(),
            )
            .into());
        }
    };

    let (dir, filename) = split_template_path(&args.template)?;
    let mut graph = TemplateGraph::new(fs, cfg.search_paths());
    match graph.stale_cause(&dir, &filename, reference)? {
        Some(cause) => println!("stale (via {})", cause.display()),
        None => println!("fresh"),
    }
    for warning in graph.warnings() {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

async fn run_watch(fs: Arc<dyn FileSystem>, cfg: ConfigFile, output: &OutputArgs) -> Result<()> {
    let cfg = Arc::new(cfg);
    let options = WatchOptions::new(cfg.root().to_path_buf(), cfg.watch.timeout())
        .subpath(cfg.watch.path.clone())
        .recursive(cfg.watch.recursive)
        .description(cfg.watch.description.clone());

    let reporter = PlanReporter::stdout(output.format, output.all);
    let session = WatchSession::new(Arc::clone(&fs), Arc::clone(&cfg), reporter);
    let coalescer = WatchCoalescer::start(fs, options, session)?;
    info!(dirs = coalescer.watched_dirs().len(), "watching; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    debug!("Ctrl-C received");
    coalescer.stop().await?;
    Ok(())
}

fn split_template_path(path: &Path) -> Result<(PathBuf, String)> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FreshenError::PathNotFound(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, filename))
}

/// Simple check output: print pipelines and watch settings.
fn print_config(cfg: &ConfigFile) {
    println!("freshen config (root {})", cfg.root().display());
    println!(
        "  watch.path = {}  timeout_ms = {}  recursive = {}",
        cfg.watch.path.display(),
        cfg.watch.timeout_ms,
        cfg.watch.recursive
    );
    if !cfg.templates.search_paths.is_empty() {
        println!("  templates.search_paths = {:?}", cfg.templates.search_paths);
    }
    println!();

    println!("pipelines ({}):", cfg.pipelines().len());
    for (name, p) in cfg.pipelines() {
        println!("  - {name}");
        println!(
            "      {} {:?} -> {} {}",
            p.source.display(),
            p.source_extensions,
            p.target.display(),
            p.target_extension
        );
        if !p.exclude.is_empty() {
            println!("      exclude: {:?} ({:?})", p.exclude, p.exclude_match);
        }
        if p.flatten {
            println!("      flatten: true");
        }
        if p.templates {
            println!("      templates: true");
        }
    }

    debug!("check complete (no files classified)");
}
