//! List-name → [`StatusCategory`] classification.
//!
//! Rules are tried in order and the first match wins, so the order of the
//! rule list *is* the priority order. The built-in rules check Done first,
//! then Review, then In Progress, then Backlog: a list called
//! `"EM PROCESSO DE EDIÇÃO E REVISÃO"` is a review column, and
//! `"Review done"` is finished work.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::models::StatusCategory;

/// One `(category, pattern)` pair as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRule {
    pub category: StatusCategory,
    /// Regular expression matched case-insensitively against the list name.
    pub pattern: String,
}

impl StatusRule {
    pub fn new(category: StatusCategory, pattern: impl Into<String>) -> Self {
        Self {
            category,
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: StatusRule,
    regex: Regex,
}

/// Ordered, compiled status rules.
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    rules: Vec<CompiledRule>,
}

impl StatusClassifier {
    /// Compile `rules`, keeping their order as the match priority.
    pub fn new(rules: Vec<StatusRule>) -> Result<Self> {
        let compiled = rules
            .into_iter()
            .map(|rule| {
                let regex = compile(&rule.pattern).map_err(|source| ReportError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    source,
                })?;
                Ok(CompiledRule { rule, regex })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules: compiled })
    }

    /// Classifier with the built-in English/Portuguese rules.
    pub fn builtin() -> Self {
        Self::new(builtin_rules()).expect("built-in status patterns are valid")
    }

    /// Map a list name to its status. Never fails: names no rule matches
    /// (including the empty name) are [`StatusCategory::Unknown`].
    pub fn classify(&self, list_name: &str) -> StatusCategory {
        let normalized = list_name.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return StatusCategory::Unknown;
        }
        self.rules
            .iter()
            .find(|r| r.regex.is_match(&normalized))
            .map(|r| r.rule.category)
            .unwrap_or(StatusCategory::Unknown)
    }

    /// The rules in priority order, as configured.
    pub fn rules(&self) -> Vec<StatusRule> {
        self.rules.iter().map(|r| r.rule.clone()).collect()
    }
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// The built-in rule list in priority order.
pub fn builtin_rules() -> Vec<StatusRule> {
    use StatusCategory::*;
    vec![
        StatusRule::new(Done, r"\b(done|finished|completed?|shipped)\b"),
        StatusRule::new(
            Done,
            r"\b(feit[oa]s?|conclu[íi]d[oa]s?|finalizad[oa]s?|complet[oa]s?)\b",
        ),
        StatusRule::new(Done, r"\baguardando retorno de terceiros?\b"),
        StatusRule::new(Review, r"\b(review|reviewing|qa|testing|approval)\b"),
        StatusRule::new(Review, r"\b(revis[ãa]o|qualidade|aprova[çc][ãa]o)\b"),
        StatusRule::new(InProgress, r"\b(in progress|doing|wip|working)\b"),
        StatusRule::new(InProgress, r"\bem (processo|andamento|progresso)\b"),
        StatusRule::new(
            InProgress,
            r"\b(processo de|edi[çc][ãa]o|montagem|envio|grava[çc][ãa]o|cria[çc][ãa]o|produ[çc][ãa]o)\b",
        ),
        StatusRule::new(Backlog, r"\b(backlog|to ?do|ideas?|icebox)\b"),
        StatusRule::new(Backlog, r"\b(a fazer|pendentes?|ideias?|recorrentes?)\b"),
        StatusRule::new(Backlog, r"\bplanej"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str) -> StatusCategory {
        StatusClassifier::builtin().classify(name)
    }

    #[test]
    fn test_basic_english_lists() {
        assert_eq!(classify("Backlog"), StatusCategory::Backlog);
        assert_eq!(classify("Doing"), StatusCategory::InProgress);
        assert_eq!(classify("In Progress"), StatusCategory::InProgress);
        assert_eq!(classify("Code Review"), StatusCategory::Review);
        assert_eq!(classify("Done"), StatusCategory::Done);
        assert_eq!(classify("To Do"), StatusCategory::Backlog);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("DONE"), StatusCategory::Done);
        assert_eq!(classify("dOiNg"), StatusCategory::InProgress);
    }

    #[test]
    fn test_portuguese_board_lists() {
        assert_eq!(classify("FEITOS"), StatusCategory::Done);
        assert_eq!(classify("Concluído"), StatusCategory::Done);
        assert_eq!(classify("EM PROCESSO DE CONTEÚDO"), StatusCategory::InProgress);
        assert_eq!(classify("EM PROCESSO DE MONTAGEM"), StatusCategory::InProgress);
        assert_eq!(classify("EM PROCESSO DE QUALIDADE"), StatusCategory::Review);
        assert_eq!(classify("PLANEJANDO ESTRATÉGIAS"), StatusCategory::Backlog);
        assert_eq!(classify("ATIVIDADES RECORRENTES"), StatusCategory::Backlog);
        assert_eq!(
            classify("AGUARDANDO RETORNO DE TERCEIROS"),
            StatusCategory::Done
        );
    }

    #[test]
    fn test_unmatched_names_are_unknown() {
        assert_eq!(classify("Esperando Cliente"), StatusCategory::Unknown);
        assert_eq!(
            classify("AGUARDANDO RETORNO DE CORREÇÕES"),
            StatusCategory::Unknown
        );
        assert_eq!(classify(""), StatusCategory::Unknown);
        assert_eq!(classify("   "), StatusCategory::Unknown);
    }

    #[test]
    fn test_priority_done_beats_review() {
        assert_eq!(classify("Review done"), StatusCategory::Done);
    }

    #[test]
    fn test_priority_review_beats_in_progress() {
        assert_eq!(
            classify("EM PROCESSO DE EDIÇÃO E REVISÃO"),
            StatusCategory::Review
        );
    }

    #[test]
    fn test_priority_in_progress_beats_backlog() {
        assert_eq!(classify("Doing (from backlog)"), StatusCategory::InProgress);
    }

    #[test]
    fn test_whitespace_is_collapsed_before_matching() {
        assert_eq!(classify("  in    progress  "), StatusCategory::InProgress);
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(classify("Undone ideas"), StatusCategory::Backlog);
    }

    #[test]
    fn test_custom_rules_follow_their_own_order() {
        let classifier = StatusClassifier::new(vec![
            StatusRule::new(StatusCategory::Backlog, "esperando"),
            StatusRule::new(StatusCategory::Done, "cliente"),
        ])
        .unwrap();
        assert_eq!(
            classifier.classify("Esperando Cliente"),
            StatusCategory::Backlog
        );
        assert_eq!(classifier.classify("Cliente aprovou"), StatusCategory::Done);
        assert_eq!(classifier.classify("Doing"), StatusCategory::Unknown);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = StatusClassifier::new(vec![StatusRule::new(StatusCategory::Done, "(oops")])
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidPattern { .. }));
    }

    #[test]
    fn test_rules_round_trip_in_order() {
        let classifier = StatusClassifier::builtin();
        assert_eq!(classifier.rules(), builtin_rules());
        assert_eq!(classifier.rules()[0].category, StatusCategory::Done);
    }
}
