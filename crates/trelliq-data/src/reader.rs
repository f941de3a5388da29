//! Board export loading and structural validation.
//!
//! The JSON document is untrusted. It is first checked as a generic
//! [`serde_json::Value`] so that a missing or malformed field is reported by
//! path (`lists[2].cards[0].id`) instead of as an opaque decode error, and
//! only then decoded into a typed [`BoardExport`].

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};
use trelliq_core::error::{ReportError, Result};
use trelliq_core::models::BoardExport;

// ── Public API ────────────────────────────────────────────────────────────────

/// Read and parse the board export at `path`.
pub fn load_export(path: &Path) -> Result<BoardExport> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let export = parse_export(&bytes)?;
    info!(
        "Loaded board export {} ({} bytes)",
        path.display(),
        bytes.len()
    );
    Ok(export)
}

/// Parse and validate a board export from raw bytes.
pub fn parse_export(bytes: &[u8]) -> Result<BoardExport> {
    let value: Value = serde_json::from_slice(bytes)?;
    validate(&value)?;
    let export: BoardExport = serde_json::from_value(value)?;
    debug!(
        "Parsed board export: {} top-level cards, {} lists, {} members, {} actions",
        export.cards.as_ref().map_or(0, Vec::len),
        export.lists.len(),
        export.members.len(),
        export.actions.len()
    );
    Ok(export)
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Check the minimal structure extraction depends on.
fn validate(root: &Value) -> Result<()> {
    let Some(obj) = root.as_object() else {
        return Err(ReportError::malformed("$", "expected a JSON object"));
    };

    match obj.get("cards") {
        None => return Err(ReportError::malformed("cards", "missing list of cards")),
        Some(cards) => validate_cards(cards, "cards")?,
    }

    for key in ["members", "actions"] {
        if let Some(v) = obj.get(key) {
            expect_array(v, key)?;
        }
    }

    if let Some(lists) = obj.get("lists") {
        for (i, list) in expect_array(lists, "lists")?.iter().enumerate() {
            let path = format!("lists[{i}]");
            let Some(list) = list.as_object() else {
                return Err(ReportError::malformed(path, "expected an object"));
            };
            if let Some(cards) = list.get("cards") {
                validate_cards(cards, &format!("{path}.cards"))?;
            }
        }
    }

    match obj.get("archived") {
        None | Some(Value::Null) => {}
        Some(Value::Object(section)) => {
            if let Some(cards) = section.get("cards") {
                validate_cards(cards, "archived.cards")?;
            }
        }
        Some(other) => validate_cards(other, "archived")?,
    }

    Ok(())
}

fn validate_cards(value: &Value, path: &str) -> Result<()> {
    for (i, card) in expect_array(value, path)?.iter().enumerate() {
        let card_path = format!("{path}[{i}]");
        let Some(card) = card.as_object() else {
            return Err(ReportError::malformed(card_path, "expected an object"));
        };
        match card.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => {}
            Some(Value::String(_)) => {
                return Err(ReportError::malformed(
                    format!("{card_path}.id"),
                    "card id is empty",
                ))
            }
            Some(_) => {
                return Err(ReportError::malformed(
                    format!("{card_path}.id"),
                    "card id must be a string",
                ))
            }
            None => {
                return Err(ReportError::malformed(
                    format!("{card_path}.id"),
                    "card has no id",
                ))
            }
        }
    }
    Ok(())
}

fn expect_array<'v>(value: &'v Value, path: &str) -> Result<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| ReportError::malformed(path, "expected an array"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
