//! Summary tables over a canonical record set.
//!
//! [`TaskAggregator::summarize`] is a pure function of the records and of the
//! aggregator's fixed options (group registry, display timezone, as-of date),
//! so two runs over the same records produce identical tables.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use trelliq_core::formatting::percentage;
use trelliq_core::groups::{GroupRegistry, UNASSIGNED_GROUP_ID};
use trelliq_core::models::{StatusCategory, TaskRecord};
use trelliq_core::time_utils::{day_key, week_key};

/// Bucket key for records without a last-activity timestamp.
pub const UNKNOWN_BUCKET: &str = "unknown";

// ── StatusCounts ──────────────────────────────────────────────────────────────

/// Task counts per status category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub backlog: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: StatusCategory) {
        *self.slot(status) += 1;
    }

    pub fn get(&self, status: StatusCategory) -> usize {
        match status {
            StatusCategory::Backlog => self.backlog,
            StatusCategory::InProgress => self.in_progress,
            StatusCategory::Review => self.review,
            StatusCategory::Done => self.done,
            StatusCategory::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.backlog + self.in_progress + self.review + self.done + self.unknown
    }

    fn slot(&mut self, status: StatusCategory) -> &mut usize {
        match status {
            StatusCategory::Backlog => &mut self.backlog,
            StatusCategory::InProgress => &mut self.in_progress,
            StatusCategory::Review => &mut self.review,
            StatusCategory::Done => &mut self.done,
            StatusCategory::Unknown => &mut self.unknown,
        }
    }
}

// ── Rows ──────────────────────────────────────────────────────────────────────

/// One row of the per-group table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    pub group_id: String,
    pub group_name: String,
    /// Configured member names; empty for groups outside the registry.
    pub members: Vec<String>,
    pub tasks: usize,
    /// Share of all tasks, one decimal.
    pub percentage: f64,
    #[serde(flatten)]
    pub statuses: StatusCounts,
    pub overdue: usize,
    /// Done tasks with a due date delivered no later than it.
    pub on_time: usize,
    /// Done tasks with a due date delivered after it.
    pub late_deliveries: usize,
    /// Done tasks as a share of the group's tasks, one decimal.
    pub completion_rate: f64,
}

/// One row of the per-status table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRow {
    pub status: StatusCategory,
    pub tasks: usize,
    pub percentage: f64,
}

/// One row of the per-collaborator table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaboratorRow {
    pub name: String,
    pub tasks: usize,
    pub percentage: f64,
    pub done: usize,
    pub overdue: usize,
    pub completion_rate: f64,
    /// Mean days late over the collaborator's overdue tasks, one decimal.
    pub avg_days_late: f64,
}

/// One day or ISO-week bucket of last activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRow {
    pub bucket: String,
    pub tasks: usize,
    pub percentage: f64,
}

/// Board-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_tasks: usize,
    #[serde(flatten)]
    pub statuses: StatusCounts,
    pub unassigned: usize,
    pub overdue: usize,
    pub archived: usize,
    pub without_collaborators: usize,
    pub unique_collaborators: usize,
    pub completion_rate: f64,
    /// Collaborator with the most tasks; ties break by name.
    pub most_active_collaborator: Option<String>,
}

/// Every summary table derived from one record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTables {
    pub overview: Overview,
    pub groups: Vec<GroupRow>,
    pub statuses: Vec<StatusRow>,
    pub collaborators: Vec<CollaboratorRow>,
    pub days: Vec<BucketRow>,
    pub weeks: Vec<BucketRow>,
}

// ── TaskAggregator ────────────────────────────────────────────────────────────

/// Builds [`SummaryTables`] from task records.
pub struct TaskAggregator<'a> {
    groups: &'a GroupRegistry,
    timezone: Tz,
    as_of: NaiveDate,
}

#[derive(Clone, Copy, Default)]
struct GroupAcc {
    statuses: StatusCounts,
    overdue: usize,
    on_time: usize,
    late_deliveries: usize,
}

#[derive(Default)]
struct CollaboratorAcc {
    tasks: usize,
    done: usize,
    overdue: usize,
    days_late: i64,
}

impl<'a> TaskAggregator<'a> {
    /// `timezone` decides calendar dates of timestamps; `as_of` is the
    /// reference date for overdue checks.
    pub fn new(groups: &'a GroupRegistry, timezone: Tz, as_of: NaiveDate) -> Self {
        Self {
            groups,
            timezone,
            as_of,
        }
    }

    pub fn summarize(&self, records: &[TaskRecord]) -> SummaryTables {
        let total = records.len();
        let groups = self.group_rows(records);
        let statuses = status_rows(records);
        let collaborators = self.collaborator_rows(records);
        let days = self.bucket_rows(records, day_key);
        let weeks = self.bucket_rows(records, week_key);

        let mut overview = Overview {
            total_tasks: total,
            unique_collaborators: collaborators.len(),
            most_active_collaborator: collaborators.first().map(|c| c.name.clone()),
            ..Overview::default()
        };
        for record in records {
            overview.statuses.add(record.status);
            if record.group_id == UNASSIGNED_GROUP_ID {
                overview.unassigned += 1;
            }
            if self.is_overdue(record) {
                overview.overdue += 1;
            }
            if record.archived {
                overview.archived += 1;
            }
            if record.collaborators.is_empty() {
                overview.without_collaborators += 1;
            }
        }
        overview.completion_rate = rate(overview.statuses.done, total);

        SummaryTables {
            overview,
            groups,
            statuses,
            collaborators,
            days,
            weeks,
        }
    }

    /// Not done, not archived, and due strictly before the as-of date.
    pub fn is_overdue(&self, record: &TaskRecord) -> bool {
        self.days_late(record).is_some()
    }

    /// Whole days between the due date and the as-of date for overdue tasks.
    pub fn days_late(&self, record: &TaskRecord) -> Option<i64> {
        if record.is_done() || record.archived {
            return None;
        }
        let due = record.due?.with_timezone(&self.timezone).date_naive();
        (due < self.as_of).then(|| (self.as_of - due).num_days())
    }

    /// Days between the due date and the as-of date for a finished task.
    ///
    /// `None` unless the task is Done and has a due date. Zero means on time;
    /// archived tasks always count as on time.
    pub fn delivery_days_late(&self, record: &TaskRecord) -> Option<i64> {
        if !record.is_done() {
            return None;
        }
        let due = record.due?.with_timezone(&self.timezone).date_naive();
        if record.archived || due >= self.as_of {
            return Some(0);
        }
        Some((self.as_of - due).num_days())
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn group_rows(&self, records: &[TaskRecord]) -> Vec<GroupRow> {
        let total = records.len();

        let mut order: Vec<(String, String)> = self
            .groups
            .groups()
            .iter()
            .map(|g| (g.id.clone(), self.groups.display_name(&g.id).to_string()))
            .collect();
        // Records from another registry keep their own rows, sorted by id.
        let mut foreign: BTreeMap<&str, &str> = BTreeMap::new();
        for record in records {
            if record.group_id != UNASSIGNED_GROUP_ID && self.groups.get(&record.group_id).is_none()
            {
                foreign.insert(&record.group_id, &record.group_name);
            }
        }
        order.extend(
            foreign
                .into_iter()
                .map(|(id, name)| (id.to_string(), name.to_string())),
        );
        order.push((
            UNASSIGNED_GROUP_ID.to_string(),
            self.groups.display_name(UNASSIGNED_GROUP_ID).to_string(),
        ));

        let mut by_group: HashMap<&str, GroupAcc> = HashMap::new();
        for record in records {
            let entry = by_group.entry(record.group_id.as_str()).or_default();
            entry.statuses.add(record.status);
            if self.is_overdue(record) {
                entry.overdue += 1;
            }
            match self.delivery_days_late(record) {
                Some(0) => entry.on_time += 1,
                Some(_) => entry.late_deliveries += 1,
                None => {}
            }
        }

        order
            .into_iter()
            .map(|(group_id, group_name)| {
                let acc = by_group
                    .get(group_id.as_str())
                    .copied()
                    .unwrap_or_default();
                let tasks = acc.statuses.total();
                let members = self
                    .groups
                    .get(&group_id)
                    .map(|g| g.member_names())
                    .unwrap_or_default();
                GroupRow {
                    group_id,
                    group_name,
                    members,
                    tasks,
                    percentage: rate(tasks, total),
                    statuses: acc.statuses,
                    overdue: acc.overdue,
                    on_time: acc.on_time,
                    late_deliveries: acc.late_deliveries,
                    completion_rate: rate(acc.statuses.done, tasks),
                }
            })
            .collect()
    }

    fn collaborator_rows(&self, records: &[TaskRecord]) -> Vec<CollaboratorRow> {
        let total = records.len();
        let mut acc: BTreeMap<&str, CollaboratorAcc> = BTreeMap::new();

        for record in records {
            let late = self.days_late(record);
            for name in &record.collaborators {
                let entry = acc.entry(name.as_str()).or_default();
                entry.tasks += 1;
                if record.is_done() {
                    entry.done += 1;
                }
                if let Some(days) = late {
                    entry.overdue += 1;
                    entry.days_late += days;
                }
            }
        }

        let mut rows: Vec<CollaboratorRow> = acc
            .into_iter()
            .map(|(name, a)| CollaboratorRow {
                name: name.to_string(),
                tasks: a.tasks,
                percentage: rate(a.tasks, total),
                done: a.done,
                overdue: a.overdue,
                completion_rate: rate(a.done, a.tasks),
                avg_days_late: if a.overdue == 0 {
                    0.0
                } else {
                    round1(a.days_late as f64 / a.overdue as f64)
                },
            })
            .collect();

        // BTreeMap iteration already yields names ascending; a stable sort on
        // the count keeps that as the tie-break.
        rows.sort_by(|a, b| b.tasks.cmp(&a.tasks));
        rows
    }

    fn bucket_rows(&self, records: &[TaskRecord], key: fn(NaiveDate) -> String) -> Vec<BucketRow> {
        let total = records.len();
        let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
        let mut unknown = 0usize;

        for record in records {
            match record.last_activity {
                Some(ts) => {
                    let date = ts.with_timezone(&self.timezone).date_naive();
                    *buckets.entry(key(date)).or_default() += 1;
                }
                None => unknown += 1,
            }
        }

        let mut rows: Vec<BucketRow> = buckets
            .into_iter()
            .map(|(bucket, tasks)| BucketRow {
                bucket,
                tasks,
                percentage: rate(tasks, total),
            })
            .collect();
        if unknown > 0 {
            rows.push(BucketRow {
                bucket: UNKNOWN_BUCKET.to_string(),
                tasks: unknown,
                percentage: rate(unknown, total),
            });
        }
        rows
    }
}

fn status_rows(records: &[TaskRecord]) -> Vec<StatusRow> {
    let mut counts = StatusCounts::default();
    for record in records {
        counts.add(record.status);
    }
    StatusCategory::ALL
        .iter()
        .map(|&status| StatusRow {
            status,
            tasks: counts.get(status),
            percentage: rate(counts.get(status), records.len()),
        })
        .collect()
}

fn rate(part: usize, whole: usize) -> f64 {
    percentage(part as f64, whole as f64, 1)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ── Tests ─────────────────────────────────────────────────────────────────────
