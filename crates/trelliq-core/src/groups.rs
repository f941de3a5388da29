//! Static registry of the marketing groups tasks are attributed to.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ReportError, Result};

/// Group id assigned to tasks that no configured group claims.
pub const UNASSIGNED_GROUP_ID: &str = "unassigned";

/// Display name of the [`UNASSIGNED_GROUP_ID`] sentinel.
pub const UNASSIGNED_GROUP_NAME: &str = "Unassigned";

/// A person responsible for a group's tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Trello username, matched case-insensitively.
    pub username: String,
    /// Name shown in reports instead of the Trello full name.
    pub name: String,
}

impl GroupMember {
    pub fn new(username: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
        }
    }
}

/// One marketing group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Stable identifier, e.g. `"grupo-1"`.
    pub id: String,
    /// Display name, e.g. `"Grupo 1"`.
    pub name: String,
    /// Optional hex colour used by the dashboard charts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// List ids or list names whose cards belong to this group when none of
    /// the card's members does.
    #[serde(default)]
    pub lists: Vec<String>,
    /// Members in display order.
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

impl Group {
    /// Member display names in configured order.
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    fn has_member(&self, username: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.username.eq_ignore_ascii_case(username))
    }

    fn routes_list(&self, list_id: Option<&str>, list_name: &str) -> bool {
        let wanted_name = normalize_list_name(list_name);
        self.lists.iter().any(|route| {
            list_id.is_some_and(|id| !id.is_empty() && route == id)
                || (!wanted_name.is_empty() && normalize_list_name(route) == wanted_name)
        })
    }
}

/// Ordered, immutable set of groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRegistry {
    groups: Vec<Group>,
}

impl GroupRegistry {
    /// Build a registry, rejecting empty, duplicate, or reserved ids.
    pub fn new(groups: Vec<Group>) -> Result<Self> {
        let mut seen = HashSet::new();
        for group in &groups {
            let id = group.id.trim();
            if id.is_empty() {
                return Err(ReportError::Config(format!(
                    "group {:?} has an empty id",
                    group.name
                )));
            }
            if id.eq_ignore_ascii_case(UNASSIGNED_GROUP_ID) {
                return Err(ReportError::Config(format!(
                    "group id {:?} is reserved",
                    UNASSIGNED_GROUP_ID
                )));
            }
            if !seen.insert(id.to_lowercase()) {
                return Err(ReportError::Config(format!("duplicate group id {:?}", id)));
            }
        }
        Ok(Self { groups })
    }

    /// The four marketing groups the dashboard ships with.
    pub fn builtin() -> Self {
        Self {
            groups: vec![
                Group {
                    id: "grupo-1".to_string(),
                    name: "Grupo 1".to_string(),
                    members: vec![
                        GroupMember::new("jamillyfreitass", "Jamily"),
                        GroupMember::new("leonardoferreiracardoso5", "Leo"),
                    ],
                    lists: vec!["EM PROCESSO DE CONTEÚDO".to_string()],
                    color: Some("#4F8EF7".to_string()),
                },
                Group {
                    id: "grupo-2".to_string(),
                    name: "Grupo 2".to_string(),
                    members: vec![
                        GroupMember::new("fazstudioart", "Luiz"),
                        GroupMember::new("miguelluis30", "Miguel"),
                    ],
                    lists: vec!["PROCESSO DE CRIAÇÃO".to_string()],
                    color: Some("#00B894".to_string()),
                },
                Group {
                    id: "grupo-3".to_string(),
                    name: "Grupo 3".to_string(),
                    members: vec![GroupMember::new("samuelpiske1", "Samuel")],
                    lists: vec![
                        "PROCESSO DE GRAVAÇÃO".to_string(),
                        "EDIÇÃO".to_string(),
                    ],
                    color: Some("#FDCB6E".to_string()),
                },
                Group {
                    id: "grupo-4".to_string(),
                    name: "Grupo 4".to_string(),
                    members: vec![
                        GroupMember::new("flaviasilva", "Flávia"),
                        GroupMember::new("coordenacao", "Coordenação"),
                    ],
                    lists: vec![
                        "EM PROCESSO DE QUALIDADE".to_string(),
                        "EM PROCESSO DE EDIÇÃO E REVISÃO".to_string(),
                    ],
                    color: Some("#E17055".to_string()),
                },
            ],
        }
    }

    /// Groups in configured order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Look up a group by id.
    pub fn get(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Display name for a group id, including the unassigned sentinel.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        if id == UNASSIGNED_GROUP_ID {
            return UNASSIGNED_GROUP_NAME;
        }
        self.get(id).map(|g| g.name.as_str()).unwrap_or(id)
    }

    /// The first group (in registry order) that lists `username` as a member.
    pub fn group_for_member(&self, username: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.has_member(username))
    }

    /// The first group (in registry order) with any of `usernames` as a member.
    ///
    /// Registry order, not card order, decides, so the result does not depend
    /// on how the export happens to order a card's members.
    pub fn group_for_any_member<'u>(
        &self,
        usernames: impl IntoIterator<Item = &'u str> + Clone,
    ) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| usernames.clone().into_iter().any(|u| g.has_member(u)))
    }

    /// The first group routing the given list, by exact id or by
    /// case-insensitive trimmed name.
    pub fn group_for_list(&self, list_id: Option<&str>, list_name: &str) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.routes_list(list_id, list_name))
    }

    /// The configured display name of a member, if any group lists them.
    pub fn member_display_name(&self, username: &str) -> Option<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter())
            .find(|m| m.username.eq_ignore_ascii_case(username))
            .map(|m| m.name.as_str())
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_list_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str) -> Group {
        Group {
            id: id.to_string(),
            name: id.to_uppercase(),
            members: vec![],
            lists: vec![],
            color: None,
        }
    }

    #[test]
    fn test_builtin_has_four_groups_in_order() {
        let registry = GroupRegistry::builtin();
        let names: Vec<&str> = registry.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Grupo 1", "Grupo 2", "Grupo 3", "Grupo 4"]);
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let err = GroupRegistry::new(vec![group("a"), group("A")]).unwrap_err();
        assert!(err.to_string().contains("duplicate group id"));
    }

    #[test]
    fn test_new_rejects_empty_id() {
        assert!(GroupRegistry::new(vec![group("  ")]).is_err());
    }

    #[test]
    fn test_new_rejects_reserved_sentinel_id() {
        let err = GroupRegistry::new(vec![group("Unassigned")]).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_group_for_member_is_case_insensitive() {
        let registry = GroupRegistry::builtin();
        let g = registry.group_for_member("SamuelPiske1").unwrap();
        assert_eq!(g.id, "grupo-3");
        assert!(registry.group_for_member("nobody").is_none());
    }

    #[test]
    fn test_group_for_any_member_uses_registry_order() {
        let registry = GroupRegistry::builtin();
        // Grupo 4 member listed first on the card, Grupo 2 member second.
        let g = registry
            .group_for_any_member(["flaviasilva", "miguelluis30"])
            .unwrap();
        assert_eq!(g.id, "grupo-2");
    }

    #[test]
    fn test_group_for_list_by_name_and_id() {
        let mut g = group("video");
        g.lists = vec!["list-42".to_string(), "Edição".to_string()];
        let registry = GroupRegistry::new(vec![g]).unwrap();

        assert!(registry.group_for_list(Some("list-42"), "").is_some());
        assert!(registry.group_for_list(None, "  EDIÇÃO ").is_some());
        assert!(registry.group_for_list(Some("other"), "Backlog").is_none());
        assert!(registry.group_for_list(None, "").is_none());
    }

    #[test]
    fn test_display_name_handles_sentinel_and_unknown_ids() {
        let registry = GroupRegistry::builtin();
        assert_eq!(registry.display_name("grupo-1"), "Grupo 1");
        assert_eq!(registry.display_name(UNASSIGNED_GROUP_ID), "Unassigned");
        assert_eq!(registry.display_name("ghost"), "ghost");
    }

    #[test]
    fn test_member_display_name() {
        let registry = GroupRegistry::builtin();
        assert_eq!(registry.member_display_name("fazstudioart"), Some("Luiz"));
        assert_eq!(registry.member_display_name("stranger"), None);
    }
}
