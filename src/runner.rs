//! Run driver
//!
//! Wires the phases together: cache the input logs, classify and extract every
//! file into category buffers, then write one report per category. Failures are
//! contained at the smallest scope and tallied in the returned [`RunSummary`].

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::classifier::{classify_file, Category, ClassifiedUnit};
use crate::config::ParserConfig;
use crate::error_handling::{CacheError, DiagnosticKind, Diagnostics};
use crate::extract::RecordExtractor;
use crate::file_cache::{cache_logs, LogFile};
use crate::record::CategoryBuffers;
use crate::report::{CategoryReport, ReportOutcome, ReportWriter};
use crate::stats::{Phase, ProcessingStats};

/// Everything a run needs, created once at entry and passed to every phase
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: ParserConfig,
    pub started: Instant,
    pub started_at: DateTime<Local>,
}

impl RunContext {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            started_at: Local::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Outcome of a complete run
#[derive(Debug)]
pub struct RunSummary {
    pub stats: ProcessingStats,
    pub diagnostics: Diagnostics,
    pub reports: Vec<CategoryReport>,
}

impl RunSummary {
    /// Paths of the report files created by this run, in report order
    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.reports
            .iter()
            .filter_map(|report| match &report.result {
                Ok(ReportOutcome::Written { path, .. }) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Categories skipped because they had no records
    pub fn skipped_categories(&self) -> Vec<Category> {
        self.reports
            .iter()
            .filter(|report| matches!(report.result, Ok(ReportOutcome::Skipped)))
            .map(|report| report.category)
            .collect()
    }

    /// True when at least one report was attempted and every attempt failed
    pub fn output_unavailable(&self) -> bool {
        let mut attempted = self
            .reports
            .iter()
            .filter(|report| !matches!(report.result, Ok(ReportOutcome::Skipped)))
            .peekable();
        attempted.peek().is_some() && attempted.all(|report| report.result.is_err())
    }

    /// Convert total output unavailability into an error for the process boundary
    pub fn ensure_output_available(&self, output_dir: &std::path::Path) -> Result<()> {
        if self.output_unavailable() {
            bail!(
                "no report could be written to '{}' ({} failures)",
                output_dir.display(),
                self.diagnostics.count(DiagnosticKind::ReportError)
            );
        }
        Ok(())
    }
}

/// Execute a full run. Never fails as a whole: every problem is logged and
/// recorded in the summary's diagnostics.
pub fn run(ctx: &RunContext) -> RunSummary {
    info!(
        "run started at {}",
        ctx.started_at.format("%d%b%y_%H:%M:%S%.3f")
    );

    let mut stats = ProcessingStats::new();
    let mut diagnostics = Diagnostics::new();

    let logs = stats.time_phase(Phase::Cache, |stats| {
        let logs = cache_phase(ctx, &mut diagnostics);
        stats.files_found = logs.len();
        logs
    });

    let buffers = stats.time_phase(Phase::Classify, |stats| {
        classify_phase(ctx, &logs, stats, &mut diagnostics)
    });

    let reports = stats.time_phase(Phase::Write, |stats| {
        write_phase(ctx, &buffers, stats, &mut diagnostics)
    });

    stats.total_time = ctx.elapsed();
    info!("{}", stats.format_stats());
    if diagnostics.is_empty() {
        info!("no diagnostics recorded");
    } else {
        info!("{} diagnostics recorded", diagnostics.total());
        for line in diagnostics.summary_lines() {
            info!("diagnostics: {}", line);
        }
    }

    RunSummary {
        stats,
        diagnostics,
        reports,
    }
}

fn cache_phase(ctx: &RunContext, diagnostics: &mut Diagnostics) -> Vec<LogFile> {
    match cache_logs(&ctx.config.input) {
        Ok(logs) => logs,
        Err(err @ CacheError::MissingDirectory(_)) => {
            warn!("{}; continuing with no input", err);
            diagnostics.record(DiagnosticKind::MissingDirectory, err.to_string());
            Vec::new()
        }
        Err(err) => {
            error!("{}", err);
            diagnostics.record(DiagnosticKind::InputError, err.to_string());
            Vec::new()
        }
    }
}

fn classify_phase(
    ctx: &RunContext,
    logs: &[LogFile],
    stats: &mut ProcessingStats,
    diagnostics: &mut Diagnostics,
) -> CategoryBuffers {
    let mut buffers = CategoryBuffers::new();

    if logs.is_empty() {
        warn!("log cache is empty");
        return buffers;
    }

    let extractor = RecordExtractor::new(&ctx.config.markers);
    for (index, log) in logs.iter().enumerate() {
        process_file(ctx, log, &extractor, &mut buffers, stats, diagnostics);
        info!(
            "finished processing file {}/{}: {}",
            index + 1,
            logs.len(),
            log.name
        );
    }

    info!(
        "buffered {} records: {} hitch, {} memory, {} error",
        buffers.total(),
        buffers.len(Category::Hitch),
        buffers.len(Category::MemorySample),
        buffers.len(Category::ErrorBlock)
    );
    buffers
}

/// Classify one file into `buffers`. A read failure ends this file only.
pub fn process_file(
    ctx: &RunContext,
    log: &LogFile,
    extractor: &RecordExtractor,
    buffers: &mut CategoryBuffers,
    stats: &mut ProcessingStats,
    diagnostics: &mut Diagnostics,
) {
    let result = classify_file(&log.path, &ctx.config.markers, &log.name, |unit| {
        accept_unit(unit, extractor, buffers, stats, diagnostics)
    });

    match result {
        Ok(lines) => {
            stats.lines_read += lines;
            stats.files_processed += 1;
        }
        Err(err) => {
            error!("{}; skipping the rest of the file", err);
            stats.lines_read += err.line.saturating_sub(1);
            stats.files_failed += 1;
            diagnostics.record(DiagnosticKind::ClassificationError, err.to_string());
        }
    }
}

fn accept_unit(
    unit: ClassifiedUnit,
    extractor: &RecordExtractor,
    buffers: &mut CategoryBuffers,
    stats: &mut ProcessingStats,
    diagnostics: &mut Diagnostics,
) {
    stats.add_unit(unit.category);
    if !unit.terminated {
        diagnostics.record(
            DiagnosticKind::UnterminatedErrorBlock,
            format!("{}:{}", unit.file, unit.line),
        );
    }

    match extractor.extract(&unit) {
        Ok(Some(record)) => {
            debug!(
                "{} data found in {} on line {}",
                unit.category, unit.file, unit.line
            );
            stats.add_record(record.category());
            buffers.push(record);
        }
        Ok(None) => {
            debug!(
                "no reportable criteria found in {} on line {}",
                unit.file, unit.line
            );
        }
        Err(err) => {
            warn!(
                file = %unit.file,
                line = unit.line,
                field = err.field(),
                "dropping {} record: {}",
                unit.category,
                err
            );
            stats.records_dropped += 1;
            diagnostics.record(err.kind(), err.to_string());
        }
    }
}

fn write_phase(
    ctx: &RunContext,
    buffers: &CategoryBuffers,
    stats: &mut ProcessingStats,
    diagnostics: &mut Diagnostics,
) -> Vec<CategoryReport> {
    if buffers.is_empty() {
        warn!("no reportable records found in any log");
    }

    let writer = ReportWriter::new(ctx.config.output.clone());
    let reports = writer.write_all(buffers);

    for report in &reports {
        match &report.result {
            Ok(ReportOutcome::Written {
                path, collisions, ..
            }) => {
                stats.reports_written += 1;
                for _ in 0..*collisions {
                    diagnostics.record(
                        DiagnosticKind::DuplicateOutputFile,
                        format!("{} report renamed to {}", report.category, path.display()),
                    );
                }
            }
            Ok(ReportOutcome::Skipped) => {}
            Err(err) => {
                error!("{}", err);
                diagnostics.record(DiagnosticKind::ReportError, err.to_string());
            }
        }
    }

    reports
}
