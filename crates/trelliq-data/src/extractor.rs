//! Deduplicating task extraction.
//!
//! Walks every card source of a [`BoardExport`] in a fixed order and emits one
//! [`TaskRecord`] per unique card id, attributed to exactly one group and one
//! status. Card sources, in order:
//!
//! 1. top-level `cards`;
//! 2. `lists[i].cards`, in list order;
//! 3. the `archived` section.
//!
//! The first occurrence of an id wins; later ones are counted and skipped.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use trelliq_core::config::ReportConfig;
use trelliq_core::error::{ReportError, Result};
use trelliq_core::groups::{GroupRegistry, UNASSIGNED_GROUP_ID, UNASSIGNED_GROUP_NAME};
use trelliq_core::models::{
    ArchivedSection, BoardExport, RawCard, RawList, RawMember, StatusCategory, TaskRecord,
};
use trelliq_core::status::StatusClassifier;
use trelliq_core::time_utils::{timestamp_from_object_id, TimezoneHandler};

// ── Public types ──────────────────────────────────────────────────────────────

/// Counters describing one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Card entries visited across all sources, duplicates included.
    pub cards_seen: usize,
    /// Entries skipped because their id was already emitted.
    pub duplicates_skipped: usize,
    /// Records attributed to the `unassigned` sentinel.
    pub unassigned: usize,
    /// Records whose list name no status rule matched.
    pub unclassified: usize,
}

/// Records plus the counters of the run that produced them.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<TaskRecord>,
    pub stats: ExtractionStats,
}

// ── TaskExtractor ─────────────────────────────────────────────────────────────

/// Turns a board export into canonical task records.
pub struct TaskExtractor<'a> {
    groups: &'a GroupRegistry,
    classifier: &'a StatusClassifier,
    timestamps: TimezoneHandler,
}

/// One card together with where it was found.
struct CardSource<'e> {
    path: String,
    card: &'e RawCard,
    parent_list: Option<&'e RawList>,
    from_archive: bool,
}

/// Lookup tables built once per export.
struct BoardIndex<'e> {
    list_names: HashMap<&'e str, &'e str>,
    members: HashMap<&'e str, &'e RawMember>,
    created: HashMap<&'e str, DateTime<Utc>>,
}

impl<'a> TaskExtractor<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self::with_parts(&config.groups, &config.classifier)
    }

    pub fn with_parts(groups: &'a GroupRegistry, classifier: &'a StatusClassifier) -> Self {
        Self {
            groups,
            classifier,
            // Trello timestamps carry a `Z` suffix; UTC only matters for
            // offset-less values.
            timestamps: TimezoneHandler::new(Tz::UTC),
        }
    }

    /// Extract one record per unique card id.
    ///
    /// Fails with [`ReportError::MalformedInput`] when the export has no card
    /// list or a card has no id. Never drops a card for classification
    /// reasons: unmatched groups and statuses go to the sentinels.
    pub fn extract(&self, export: &BoardExport) -> Result<Extraction> {
        let sources = collect_sources(export)?;
        let index = self.index(export);

        let mut seen: HashSet<&str> = HashSet::with_capacity(sources.len());
        let mut stats = ExtractionStats::default();
        let mut records = Vec::new();

        for source in &sources {
            stats.cards_seen += 1;
            let id = card_id(source)?;
            if !seen.insert(id) {
                stats.duplicates_skipped += 1;
                debug!("Skipping duplicate card {} at {}", id, source.path);
                continue;
            }

            let record = self.build_record(id, source, &index);
            if record.group_id == UNASSIGNED_GROUP_ID {
                stats.unassigned += 1;
            }
            if record.status == StatusCategory::Unknown {
                stats.unclassified += 1;
            }
            records.push(record);
        }

        info!(
            "Extracted {} tasks from {} cards ({} duplicates, {} unassigned, {} unclassified)",
            records.len(),
            stats.cards_seen,
            stats.duplicates_skipped,
            stats.unassigned,
            stats.unclassified
        );

        Ok(Extraction { records, stats })
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn index<'e>(&self, export: &'e BoardExport) -> BoardIndex<'e> {
        let list_names = export
            .lists
            .iter()
            .filter(|l| !l.id.is_empty())
            .map(|l| (l.id.as_str(), l.name.as_str()))
            .collect();

        let members = export
            .members
            .iter()
            .filter(|m| !m.id.is_empty())
            .map(|m| (m.id.as_str(), m))
            .collect();

        let mut created: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for action in export.actions.iter().filter(|a| a.action_type == "createCard") {
            let Some(card_id) = action.data.card.as_ref().and_then(|c| c.id.as_deref()) else {
                continue;
            };
            let Some(date) = action
                .date
                .as_deref()
                .and_then(|d| self.timestamps.parse_timestamp(d))
            else {
                continue;
            };
            created
                .entry(card_id)
                .and_modify(|existing| *existing = (*existing).min(date))
                .or_insert(date);
        }

        BoardIndex {
            list_names,
            members,
            created,
        }
    }

    fn build_record(&self, id: &str, source: &CardSource<'_>, index: &BoardIndex<'_>) -> TaskRecord {
        let card = source.card;

        let list_id = card
            .id_list
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| source.parent_list.map(|l| l.id.as_str()).filter(|s| !s.is_empty()));
        let list_name = self.resolve_list_name(card, list_id, source, index);
        let status = self.classifier.classify(&list_name);

        let (usernames, collaborators) = self.resolve_members(card, index);

        let group = self
            .groups
            .group_for_any_member(usernames.iter().copied())
            .or_else(|| self.groups.group_for_list(list_id, &list_name));
        let (group_id, group_name) = match group {
            Some(g) => (g.id.clone(), g.name.clone()),
            None => (
                UNASSIGNED_GROUP_ID.to_string(),
                UNASSIGNED_GROUP_NAME.to_string(),
            ),
        };

        debug!(
            "Card {} ({:?}): list={:?} status={} group={}",
            id, card.name, list_name, status, group_id
        );

        TaskRecord {
            id: id.to_string(),
            title: card.name.trim().to_string(),
            group_id,
            group_name,
            status,
            list_name,
            collaborators,
            created_at: timestamp_from_object_id(id).or_else(|| index.created.get(id).copied()),
            last_activity: self.parse_optional(card.date_last_activity.as_deref()),
            due: self.parse_optional(card.due.as_deref()),
            archived: card.closed || source.from_archive,
            url: card.url.clone().filter(|u| !u.is_empty()),
        }
    }

    fn resolve_list_name(
        &self,
        card: &RawCard,
        list_id: Option<&str>,
        source: &CardSource<'_>,
        index: &BoardIndex<'_>,
    ) -> String {
        let name = list_id
            .and_then(|id| index.list_names.get(id).copied())
            .or_else(|| card.list.as_ref().map(|l| l.name.as_str()))
            .or_else(|| source.parent_list.map(|l| l.name.as_str()))
            .unwrap_or_default();

        if name.trim().is_empty() {
            if let Some(id) = list_id {
                warn!("Card at {} references unknown list {}", source.path, id);
            }
        }
        name.trim().to_string()
    }

    /// Usernames (for group attribution) and display names (for the record).
    fn resolve_members<'e>(
        &self,
        card: &'e RawCard,
        index: &BoardIndex<'e>,
    ) -> (Vec<&'e str>, BTreeSet<String>) {
        let mut usernames = Vec::new();
        let mut names = BTreeSet::new();

        let referenced = card.id_members.iter().map(|member_id| {
            (
                member_id.as_str(),
                index.members.get(member_id.as_str()).copied(),
            )
        });
        let embedded = card.members.iter().map(|m| (m.id.as_str(), Some(m)));

        for (member_id, member) in referenced.chain(embedded) {
            let username = member
                .and_then(|m| m.username.as_deref())
                .filter(|u| !u.is_empty());
            if let Some(u) = username {
                usernames.push(u);
            }
            let name = username
                .and_then(|u| self.groups.member_display_name(u))
                .map(str::to_string)
                .or_else(|| {
                    member
                        .and_then(|m| m.full_name.as_deref())
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .map(str::to_string)
                })
                .or_else(|| username.map(str::to_string))
                .unwrap_or_else(|| member_id.to_string());
            if !name.is_empty() {
                names.insert(name);
            }
        }

        (usernames, names)
    }

    fn parse_optional(&self, value: Option<&str>) -> Option<DateTime<Utc>> {
        value.and_then(|v| self.timestamps.parse_timestamp(v))
    }
}

// ── Source walk ───────────────────────────────────────────────────────────────

fn collect_sources(export: &BoardExport) -> Result<Vec<CardSource<'_>>> {
    let Some(cards) = export.cards.as_ref() else {
        return Err(ReportError::malformed("cards", "missing list of cards"));
    };

    let mut sources: Vec<CardSource<'_>> = cards
        .iter()
        .enumerate()
        .map(|(i, card)| CardSource {
            path: format!("cards[{i}]"),
            card,
            parent_list: None,
            from_archive: false,
        })
        .collect();

    for (li, list) in export.lists.iter().enumerate() {
        sources.extend(list.cards.iter().enumerate().map(|(ci, card)| CardSource {
            path: format!("lists[{li}].cards[{ci}]"),
            card,
            parent_list: Some(list),
            from_archive: false,
        }));
    }

    if let Some(archived) = &export.archived {
        let prefix = match archived {
            ArchivedSection::Cards(_) => "archived",
            ArchivedSection::Nested { .. } => "archived.cards",
        };
        sources.extend(archived.cards().iter().enumerate().map(|(i, card)| CardSource {
            path: format!("{prefix}[{i}]"),
            card,
            parent_list: None,
            from_archive: true,
        }));
    }

    Ok(sources)
}

fn card_id<'e>(source: &CardSource<'e>) -> Result<&'e str> {
    source
        .card
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ReportError::malformed(format!("{}.id", source.path), "card has no id"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
