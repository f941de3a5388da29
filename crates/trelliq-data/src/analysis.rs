//! Main report pipeline for Trelliq.
//!
//! Orchestrates extraction, the optional activity window, and aggregation,
//! returning a [`PipelineResult`] ready for the UI and export layers.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};
use trelliq_core::config::ReportConfig;
use trelliq_core::error::{ReportError, Result};
use trelliq_core::models::{BoardExport, TaskRecord};

use crate::aggregator::{SummaryTables, TaskAggregator};
use crate::extractor::{ExtractionStats, TaskExtractor};
use crate::reader::load_export;

// ── Public types ──────────────────────────────────────────────────────────────

/// Optional from/to date bounds, both inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ActivityWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(ReportError::Config(format!(
                    "activity window start {f} is after its end {t}"
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }

    /// Whether `record` falls inside the window.
    ///
    /// A bounded window never keeps archived tasks. Finished tasks are placed
    /// by their due date and are dropped when they have none; every other
    /// task is placed by its last activity. Tasks without the relevant date
    /// are outside any bounded window.
    pub fn keeps(&self, record: &TaskRecord, tz: Tz) -> bool {
        if self.is_unbounded() {
            return true;
        }
        if record.archived {
            return false;
        }
        let reference = if record.is_done() {
            record.due
        } else {
            record.last_activity
        };
        reference
            .map(|ts| ts.with_timezone(&tz).date_naive())
            .is_some_and(|date| self.contains(date))
    }
}

/// Fixed options of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Timezone used for calendar dates (buckets, window, overdue).
    pub timezone: Tz,
    /// Reference date for overdue checks.
    pub as_of: NaiveDate,
    pub window: ActivityWindow,
}

impl PipelineOptions {
    /// Options with no window and `as_of` set to today in `timezone`.
    pub fn today_in(timezone: Tz) -> Self {
        Self {
            timezone,
            as_of: Utc::now().with_timezone(&timezone).date_naive(),
            window: ActivityWindow::default(),
        }
    }
}

/// Metadata produced alongside the pipeline result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PipelineMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Board name from the export, when present.
    pub board_name: Option<String>,
    /// IANA name of the display timezone.
    pub timezone: String,
    pub as_of: NaiveDate,
    /// Records produced by extraction, before the activity window.
    pub records_extracted: usize,
    /// Records removed by the activity window.
    pub records_filtered: usize,
    /// Wall-clock seconds spent extracting records.
    pub extract_time_seconds: f64,
    /// Wall-clock seconds spent building summary tables.
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Canonical records that passed the activity window.
    pub records: Vec<TaskRecord>,
    pub tables: SummaryTables,
    pub stats: ExtractionStats,
    pub metadata: PipelineMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full report pipeline over an already-parsed export.
///
/// 1. Extract one record per unique card via [`TaskExtractor`].
/// 2. Drop records outside the activity window, if one is set.
/// 3. Build summary tables via [`TaskAggregator`].
pub fn run_pipeline(
    export: &BoardExport,
    config: &ReportConfig,
    options: &PipelineOptions,
) -> Result<PipelineResult> {
    // ── Step 1: Extract ───────────────────────────────────────────────────────
    let extract_start = std::time::Instant::now();
    let extraction = TaskExtractor::new(config).extract(export)?;
    let extract_time = extract_start.elapsed().as_secs_f64();
    let records_extracted = extraction.records.len();

    // ── Step 2: Activity window ───────────────────────────────────────────────
    let records: Vec<TaskRecord> = if options.window.is_unbounded() {
        extraction.records
    } else {
        extraction
            .records
            .into_iter()
            .filter(|r| options.window.keeps(r, options.timezone))
            .collect()
    };
    let records_filtered = records_extracted - records.len();
    if records_filtered > 0 {
        debug!(
            "Activity window {:?}..{:?} dropped {} records",
            options.window.from, options.window.to, records_filtered
        );
    }

    // ── Step 3: Aggregate ─────────────────────────────────────────────────────
    let aggregate_start = std::time::Instant::now();
    let tables = TaskAggregator::new(&config.groups, options.timezone, options.as_of)
        .summarize(&records);
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    info!(
        "Pipeline finished: {} records ({} outside window), {} collaborators",
        records.len(),
        records_filtered,
        tables.collaborators.len()
    );

    let metadata = PipelineMetadata {
        generated_at: Utc::now().to_rfc3339(),
        board_name: export.name.clone().filter(|n| !n.trim().is_empty()),
        timezone: options.timezone.name().to_string(),
        as_of: options.as_of,
        records_extracted,
        records_filtered,
        extract_time_seconds: extract_time,
        aggregate_time_seconds: aggregate_time,
    };

    Ok(PipelineResult {
        records,
        tables,
        stats: extraction.stats,
        metadata,
    })
}

/// Load the export at `path` and run the pipeline over it.
pub fn analyze_export(
    path: &Path,
    config: &ReportConfig,
    options: &PipelineOptions,
) -> Result<PipelineResult> {
    let export = load_export(path)?;
    run_pipeline(&export, config, options)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
