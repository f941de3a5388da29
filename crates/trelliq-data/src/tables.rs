//! Presentation-neutral tables.
//!
//! Summary structs are flattened into [`Table`]s of typed [`Cell`]s once, and
//! every consumer (CSV, spreadsheet, plain-text report, dashboard) renders
//! from the same rows, so column order and labels stay consistent.

use std::fmt;

use chrono_tz::Tz;
use trelliq_core::formatting::{format_count, format_date, format_names, format_number, EMPTY_CELL};
use trelliq_core::models::{StatusCategory, TaskRecord};

use crate::aggregator::{BucketRow, SummaryTables};

// ── Cell ──────────────────────────────────────────────────────────────────────

/// One table value; numbers stay numbers until rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(usize),
    /// A percentage value in `0.0..=100.0`, one decimal.
    Percent(f64),
    /// A plain decimal, one decimal place.
    Decimal(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Value without display decoration (no `%`, no thousands separator),
    /// as written to CSV.
    pub fn plain(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Count(n) => n.to_string(),
            Cell::Percent(v) | Cell::Decimal(v) => format!("{v:.1}"),
        }
    }

    /// Numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Text(_) => None,
            Cell::Count(n) => Some(*n as f64),
            Cell::Percent(v) | Cell::Decimal(v) => Some(*v),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) if s.is_empty() => f.write_str(EMPTY_CELL),
            Cell::Text(s) => f.write_str(s),
            Cell::Count(n) => f.write_str(&format_count(*n)),
            Cell::Percent(v) => write!(f, "{}%", format_number(*v, 1)),
            Cell::Decimal(v) => f.write_str(&format_number(*v, 1)),
        }
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// A named, rectangular table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Title, also used as sheet name and (lower-cased) CSV file stem.
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// `"Collaborators"` → `"collaborators"`.
    pub fn file_stem(&self) -> String {
        self.name.to_lowercase().replace(' ', "_")
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Every summary table, in report order.
pub fn summary_tables(summary: &SummaryTables) -> Vec<Table> {
    vec![
        overview_table(summary),
        groups_table(summary),
        status_table(summary),
        collaborators_table(summary),
        days_table(summary),
        weeks_table(summary),
    ]
}

pub fn overview_table(summary: &SummaryTables) -> Table {
    let o = &summary.overview;
    let mut table = Table::new("Overview", &["Metric", "Value"]);
    let mut push = |metric: &str, value: Cell| table.rows.push(vec![Cell::text(metric), value]);

    push("Tasks", Cell::Count(o.total_tasks));
    for status in StatusCategory::ALL {
        push(status.label(), Cell::Count(o.statuses.get(status)));
    }
    push("Completion rate", Cell::Percent(o.completion_rate));
    push("Overdue", Cell::Count(o.overdue));
    push("Unassigned", Cell::Count(o.unassigned));
    push("Archived", Cell::Count(o.archived));
    push("Without collaborators", Cell::Count(o.without_collaborators));
    push("Collaborators", Cell::Count(o.unique_collaborators));
    push(
        "Most active collaborator",
        Cell::text(o.most_active_collaborator.clone().unwrap_or_default()),
    );
    table
}

pub fn groups_table(summary: &SummaryTables) -> Table {
    let mut headers = vec!["Group", "Members", "Tasks", "%"];
    headers.extend(StatusCategory::ALL.iter().map(|s| s.label()));
    headers.extend(["Overdue", "On time", "Late", "Completion"]);

    let mut table = Table::new("Groups", &headers);
    for row in &summary.groups {
        let mut cells = vec![
            Cell::text(&row.group_name),
            Cell::text(row.members.join(", ")),
            Cell::Count(row.tasks),
            Cell::Percent(row.percentage),
        ];
        cells.extend(
            StatusCategory::ALL
                .iter()
                .map(|&s| Cell::Count(row.statuses.get(s))),
        );
        cells.push(Cell::Count(row.overdue));
        cells.push(Cell::Count(row.on_time));
        cells.push(Cell::Count(row.late_deliveries));
        cells.push(Cell::Percent(row.completion_rate));
        table.rows.push(cells);
    }
    table
}

pub fn status_table(summary: &SummaryTables) -> Table {
    let mut table = Table::new("Status", &["Status", "Tasks", "%"]);
    for row in &summary.statuses {
        table.rows.push(vec![
            Cell::text(row.status.label()),
            Cell::Count(row.tasks),
            Cell::Percent(row.percentage),
        ]);
    }
    table
}

pub fn collaborators_table(summary: &SummaryTables) -> Table {
    let mut table = Table::new(
        "Collaborators",
        &[
            "Collaborator",
            "Tasks",
            "%",
            "Done",
            "Overdue",
            "Completion",
            "Avg days late",
        ],
    );
    for row in &summary.collaborators {
        table.rows.push(vec![
            Cell::text(&row.name),
            Cell::Count(row.tasks),
            Cell::Percent(row.percentage),
            Cell::Count(row.done),
            Cell::Count(row.overdue),
            Cell::Percent(row.completion_rate),
            Cell::Decimal(row.avg_days_late),
        ]);
    }
    table
}

pub fn days_table(summary: &SummaryTables) -> Table {
    bucket_table("Days", "Day", &summary.days)
}

pub fn weeks_table(summary: &SummaryTables) -> Table {
    bucket_table("Weeks", "Week", &summary.weeks)
}

fn bucket_table(name: &str, key_header: &str, rows: &[BucketRow]) -> Table {
    let mut table = Table::new(name, &[key_header, "Tasks", "%"]);
    for row in rows {
        table.rows.push(vec![
            Cell::text(&row.bucket),
            Cell::Count(row.tasks),
            Cell::Percent(row.percentage),
        ]);
    }
    table
}

/// Raw canonical records, dates rendered in `tz`.
pub fn records_table(records: &[TaskRecord], tz: Tz) -> Table {
    let mut table = Table::new(
        "Tasks",
        &[
            "Id",
            "Title",
            "Group",
            "Status",
            "List",
            "Collaborators",
            "Created",
            "Last activity",
            "Due",
            "Archived",
            "URL",
        ],
    );
    for r in records {
        table.rows.push(vec![
            Cell::text(&r.id),
            Cell::text(&r.title),
            Cell::text(&r.group_name),
            Cell::text(r.status.label()),
            Cell::text(&r.list_name),
            Cell::text(if r.collaborators.is_empty() {
                String::new()
            } else {
                format_names(&r.collaborators)
            }),
            Cell::text(date_or_blank(r.created_at, tz)),
            Cell::text(date_or_blank(r.last_activity, tz)),
            Cell::text(date_or_blank(r.due, tz)),
            Cell::text(if r.archived { "yes" } else { "no" }),
            Cell::text(r.url.clone().unwrap_or_default()),
        ]);
    }
    table
}

fn date_or_blank(dt: Option<chrono::DateTime<chrono::Utc>>, tz: Tz) -> String {
    dt.map(|d| format_date(Some(d), tz)).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
