// src/engine/report.rs

//! Printing plans to stdout, as text or JSON lines.

use std::io::{self, Write};

use anyhow::Context;
use clap::ValueEnum;
use serde::Serialize;

use crate::engine::planner::{PipelinePlan, PlannedChange};
use crate::errors::Result;
use crate::templates::ResolutionWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Writes plans somewhere; stdout in production, a buffer in tests.
#[derive(Debug)]
pub struct PlanReporter<W: Write> {
    out: W,
    format: OutputFormat,
    show_unchanged: bool,
}

impl PlanReporter<io::Stdout> {
    pub fn stdout(format: OutputFormat, show_unchanged: bool) -> Self {
        Self::new(io::stdout(), format, show_unchanged)
    }
}

impl<W: Write> PlanReporter<W> {
    pub fn new(out: W, format: OutputFormat, show_unchanged: bool) -> Self {
        Self {
            out,
            format,
            show_unchanged,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn report(&mut self, plan: &PipelinePlan) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.report_text(plan),
            OutputFormat::Json => self.report_json(plan),
        }
    }

    pub fn report_warnings(&mut self, warnings: &[ResolutionWarning]) -> Result<()> {
        for warning in warnings {
            match self.format {
                OutputFormat::Text => writeln!(self.out, "warning: {warning}")
                    .context("writing warning")?,
                OutputFormat::Json => {
                    self.write_json_line(&JsonLine::Warning { warning })?;
                }
            }
        }
        Ok(())
    }

    fn report_text(&mut self, plan: &PipelinePlan) -> Result<()> {
        let pending = plan.pending().count();
        writeln!(
            self.out,
            "{} ({} of {} to build):",
            plan.pipeline,
            pending,
            plan.changes.len()
        )
        .context("writing plan header")?;

        for change in &plan.changes {
            if !self.show_unchanged && !change.needs_build() {
                continue;
            }
            writeln!(self.out, "  {}", text_line(change)).context("writing plan line")?;
        }
        Ok(())
    }

    fn report_json(&mut self, plan: &PipelinePlan) -> Result<()> {
        for change in &plan.changes {
            if !self.show_unchanged && !change.needs_build() {
                continue;
            }
            self.write_json_line(&JsonLine::Change {
                pipeline: &plan.pipeline,
                change,
            })?;
        }
        Ok(())
    }

    fn write_json_line(&mut self, line: &JsonLine<'_>) -> Result<()> {
        let json = serde_json::to_string(line).context("serializing plan line")?;
        writeln!(self.out, "{json}").context("writing plan line")?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonLine<'a> {
    Change {
        pipeline: &'a str,
        change: &'a PlannedChange,
    },
    Warning {
        warning: &'a ResolutionWarning,
    },
}

fn text_line(change: &PlannedChange) -> String {
    let mut line = format!(
        "{:<9} {} -> {}",
        change.effective.to_string(),
        change.record.relative,
        change.record.target_path.display()
    );
    if let Some(cause) = &change.invalidated_by {
        line.push_str(&format!(" (via {})", cause.display()));
    }
    line
}
