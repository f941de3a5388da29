use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ── Raw board export ──────────────────────────────────────────────────────────

/// A Trello board export as uploaded by the user.
///
/// Only the fields relevant to grouping, status, and collaborators are
/// modelled; everything else in the document is ignored by serde.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardExport {
    /// Board name, when present.
    #[serde(default)]
    pub name: Option<String>,
    /// Top-level card list. `None` when the field is absent entirely.
    #[serde(default)]
    pub cards: Option<Vec<RawCard>>,
    /// Board columns.
    #[serde(default)]
    pub lists: Vec<RawList>,
    /// Board members referenced by `idMembers`.
    #[serde(default)]
    pub members: Vec<RawMember>,
    /// Board activity log.
    #[serde(default)]
    pub actions: Vec<RawAction>,
    /// Archived cards, either as a bare array or wrapped in `{ "cards": [...] }`.
    #[serde(default)]
    pub archived: Option<ArchivedSection>,
}

/// The two shapes an `archived` section appears in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArchivedSection {
    Cards(Vec<RawCard>),
    Nested {
        #[serde(default)]
        cards: Vec<RawCard>,
    },
}

impl ArchivedSection {
    /// The archived cards regardless of shape.
    pub fn cards(&self) -> &[RawCard] {
        match self {
            ArchivedSection::Cards(cards) => cards,
            ArchivedSection::Nested { cards } => cards,
        }
    }
}

/// A board column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawList {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    /// Some exports nest the list's cards directly inside it.
    #[serde(default)]
    pub cards: Vec<RawCard>,
}

/// Embedded `{ "name": ... }` list reference carried by some card shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListRef {
    #[serde(default)]
    pub name: String,
}

/// A single card (task) as it appears in the export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id_list: Option<String>,
    #[serde(default)]
    pub id_members: Vec<String>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub date_last_activity: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub list: Option<RawListRef>,
    /// Embedded member objects (alternative to `idMembers`).
    #[serde(default)]
    pub members: Vec<RawMember>,
}

/// A board member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMember {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// An entry of the board activity log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type", default)]
    pub action_type: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub data: RawActionData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawActionData {
    #[serde(default)]
    pub card: Option<RawActionCard>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawActionCard {
    #[serde(default)]
    pub id: Option<String>,
}

// ── Status ────────────────────────────────────────────────────────────────────

/// Normalized task state derived from the card's list name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Backlog,
    InProgress,
    Review,
    Done,
    /// No classifier rule matched the list name.
    Unknown,
}

impl StatusCategory {
    /// Every category in report order.
    pub const ALL: [StatusCategory; 5] = [
        StatusCategory::Backlog,
        StatusCategory::InProgress,
        StatusCategory::Review,
        StatusCategory::Done,
        StatusCategory::Unknown,
    ];

    /// Human-readable label used in tables and exports.
    pub fn label(self) -> &'static str {
        match self {
            StatusCategory::Backlog => "Backlog",
            StatusCategory::InProgress => "In Progress",
            StatusCategory::Review => "Review",
            StatusCategory::Done => "Done",
            StatusCategory::Unknown => "Unknown",
        }
    }

    /// Parse the snake_case config spelling (`"in_progress"`) or the label
    /// (`"In Progress"`), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "backlog" => Some(StatusCategory::Backlog),
            "inprogress" => Some(StatusCategory::InProgress),
            "review" => Some(StatusCategory::Review),
            "done" => Some(StatusCategory::Done),
            "unknown" => Some(StatusCategory::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Canonical task record ─────────────────────────────────────────────────────

/// The deduplicated, normalized representation of one task.
///
/// Exactly one record exists per task id in an extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Trello card id; unique across the record set and never empty.
    pub id: String,
    /// Card title.
    pub title: String,
    /// A configured group id or the `unassigned` sentinel.
    pub group_id: String,
    /// Display name of `group_id`.
    pub group_name: String,
    /// Normalized status.
    pub status: StatusCategory,
    /// Name of the card's current list (empty when it could not be resolved).
    pub list_name: String,
    /// Collaborator display names, ordered and duplicate-free.
    pub collaborators: BTreeSet<String>,
    /// Creation time decoded from the card id or its `createCard` action.
    pub created_at: Option<DateTime<Utc>>,
    /// `dateLastActivity` of the card.
    pub last_activity: Option<DateTime<Utc>>,
    /// Card due date.
    pub due: Option<DateTime<Utc>>,
    /// `closed` flag of the card.
    pub archived: bool,
    /// Link back to the card, when the export carries one.
    pub url: Option<String>,
}

impl TaskRecord {
    /// Whether the task counts as completed for reporting purposes.
    pub fn is_done(&self) -> bool {
        self.status == StatusCategory::Done
    }
}
