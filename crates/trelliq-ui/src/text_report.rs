//! Plain-text report written to stdout by the `report` view.
//!
//! Each table is printed as a title, an underline and space-padded columns
//! aligned by display width. Numeric columns are right-aligned.

use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

use trelliq_core::formatting::format_count;
use trelliq_data::analysis::PipelineResult;
use trelliq_data::tables::{self, Cell, Table};

/// Gap between columns.
const COLUMN_GAP: &str = "  ";

/// Tables printed by the report, in order.
pub fn report_tables(result: &PipelineResult) -> Vec<Table> {
    let summary = &result.tables;
    vec![
        tables::overview_table(summary),
        tables::groups_table(summary),
        tables::status_table(summary),
        tables::collaborators_table(summary),
        tables::weeks_table(summary),
    ]
}

/// Render one table as aligned text lines (no trailing newline).
pub fn format_table(table: &Table) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(Cell::to_string).collect())
        .collect();
    let widths: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.width())
                .chain(std::iter::once(h.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let numeric: Vec<bool> = (0..table.headers.len())
        .map(|i| {
            !table.rows.is_empty()
                && table
                    .rows
                    .iter()
                    .all(|row| row.get(i).is_some_and(Cell::is_numeric))
        })
        .collect();

    let line = |values: &[String]| -> String {
        let padded: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, v)| pad(v, widths[i], numeric[i]))
            .collect();
        padded.join(COLUMN_GAP).trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(table.rows.len() + 4);
    lines.push(table.name.clone());
    lines.push("=".repeat(table.name.width()));
    lines.push(line(&table.headers));
    let rule_width = widths.iter().sum::<usize>() + COLUMN_GAP.len() * widths.len().saturating_sub(1);
    lines.push("-".repeat(rule_width));
    if cells.is_empty() {
        lines.push("(no rows)".to_string());
    }
    for row in &cells {
        lines.push(line(row));
    }
    lines.join("\n")
}

fn pad(value: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(value.width()));
    if right {
        format!("{fill}{value}")
    } else {
        format!("{value}{fill}")
    }
}

/// Write the full report (context lines, then every report table).
pub fn write_report<W: Write>(out: &mut W, result: &PipelineResult) -> io::Result<()> {
    let meta = &result.metadata;
    let board = meta.board_name.as_deref().unwrap_or("Untitled board");
    writeln!(out, "{board}")?;
    writeln!(
        out,
        "As of {} ({}), generated {}",
        meta.as_of.format("%Y-%m-%d"),
        meta.timezone,
        meta.generated_at
    )?;
    writeln!(
        out,
        "{} tasks from {} cards ({} duplicates skipped, {} filtered out by date)",
        format_count(result.records.len()),
        format_count(result.stats.cards_seen),
        format_count(result.stats.duplicates_skipped),
        format_count(meta.records_filtered),
    )?;

    for table in report_tables(result) {
        writeln!(out)?;
        writeln!(out, "{}", format_table(&table))?;
    }
    Ok(())
}

/// The full report as a `String`.
pub fn render_report(result: &PipelineResult) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_report(&mut buf, result);
    String::from_utf8_lossy(&buf).into_owned()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use trelliq_core::config::ReportConfig;
    use trelliq_data::analysis::{run_pipeline, ActivityWindow, PipelineOptions};
    use trelliq_data::reader::parse_export;

    fn result() -> PipelineResult {
        let doc = json!({
            "name": "Agência",
            "lists": [
                { "id": "l1", "name": "Backlog" },
                { "id": "l2", "name": "EM PROCESSO DE CONTEÚDO" },
                { "id": "l3", "name": "FEITOS" }
            ],
            "members": [{ "id": "m1", "username": "jamillyfreitass" }],
            "cards": [
                { "id": "c1", "name": "Roteiro", "idList": "l1", "idMembers": [],
                  "dateLastActivity": "2024-12-10T12:00:00.000Z" },
                { "id": "c2", "name": "Reels", "idList": "l2", "idMembers": ["m1"],
                  "dateLastActivity": "2024-12-16T12:00:00.000Z" },
                { "id": "c3", "name": "Post", "idList": "l3", "idMembers": ["m1"],
                  "dateLastActivity": "2024-12-17T12:00:00.000Z" }
            ],
            "archived": [
                { "id": "c3", "name": "Post", "idList": "l3" }
            ]
        });
        let export = parse_export(doc.to_string().as_bytes()).unwrap();
        let options = PipelineOptions {
            timezone: chrono_tz::Tz::UTC,
            as_of: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            window: ActivityWindow::default(),
        };
        run_pipeline(&export, &ReportConfig::builtin(), &options).unwrap()
    }

    fn sample_table() -> Table {
        Table {
            name: "Status".to_string(),
            headers: vec!["Status".to_string(), "Tasks".to_string()],
            rows: vec![
                vec![Cell::text("Revisão"), Cell::Count(1_200)],
                vec![Cell::text("Done"), Cell::Count(7)],
            ],
        }
    }

    #[test]
    fn test_format_table_aligns_columns() {
        let text = format_table(&sample_table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Status");
        assert_eq!(lines[1], "======");
        assert_eq!(lines[2], "Status   Tasks");
        assert_eq!(lines[3], "--------------");
        assert_eq!(lines[4], "Revisão  1,200");
        assert_eq!(lines[5], "Done         7");
    }

    #[test]
    fn test_format_table_without_rows() {
        let mut table = sample_table();
        table.rows.clear();
        assert!(format_table(&table).ends_with("(no rows)"));
    }

    #[test]
    fn test_report_tables_order() {
        let names: Vec<String> = report_tables(&result()).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Overview", "Groups", "Status", "Collaborators", "Weeks"]);
    }

    #[test]
    fn test_render_report_contents() {
        let text = render_report(&result());
        assert!(text.starts_with("Agência\n"), "{text}");
        assert!(text.contains("As of 2024-12-20 (UTC)"), "{text}");
        assert!(text.contains("3 tasks from 4 cards (1 duplicates skipped"), "{text}");
        assert!(text.contains("Collaborators\n============="), "{text}");
        assert!(text.contains("Jamily"), "{text}");
        assert!(text.contains("2024-W51"), "{text}");
    }

    #[test]
    fn test_write_report_to_writer() {
        let mut buf = Vec::new();
        write_report(&mut buf, &result()).unwrap();
        assert!(!buf.is_empty());
        assert!(String::from_utf8(buf).unwrap().contains("In Progress"));
    }
}
