//! Serialization of records and summary tables into downloadable files.
//!
//! The exporter has no side effects: it returns an [`ExportPayload`] of named
//! byte buffers and leaves writing them anywhere to the caller.

use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use tracing::{debug, info};
use trelliq_core::error::{ReportError, Result};
use trelliq_core::models::TaskRecord;

use crate::aggregator::SummaryTables;
use crate::tables::{records_table, summary_tables, Table};

/// Default stem of exported file names.
pub const DEFAULT_BASE_NAME: &str = "trelliq-report";

// ── ExportFormat ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One `.xlsx` workbook.
    Spreadsheet,
    /// One CSV file per table.
    TabularText,
    /// One JSON document.
    StructuredText,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::Spreadsheet,
        ExportFormat::TabularText,
        ExportFormat::StructuredText,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "spreadsheet",
            ExportFormat::TabularText => "tabular-text",
            ExportFormat::StructuredText => "structured-text",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::TabularText => "csv",
            ExportFormat::StructuredText => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::TabularText => "text/csv",
            ExportFormat::StructuredText => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ReportError;

    /// Accepts the format name or its file extension, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| key == f.name() || key == f.extension())
            .ok_or_else(|| ReportError::UnsupportedFormat(s.trim().to_string()))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Everything one export call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportPayload {
    pub files: Vec<ExportedFile>,
}

impl ExportPayload {
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.bytes.len()).sum()
    }
}

#[derive(Serialize)]
struct StructuredExport<'a> {
    records: &'a [TaskRecord],
    summary: &'a SummaryTables,
}

// ── Exporter ──────────────────────────────────────────────────────────────────

/// Renders records and summary tables in one of the [`ExportFormat`]s.
pub struct Exporter {
    base_name: String,
    timezone: Tz,
}

impl Exporter {
    /// `timezone` is used for dates in the raw task table.
    pub fn new(timezone: Tz) -> Self {
        Self {
            base_name: DEFAULT_BASE_NAME.to_string(),
            timezone,
        }
    }

    /// Override the stem of exported file names.
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// Parse `format` and export. Unknown formats fail before any work is done.
    pub fn export_as(
        &self,
        records: &[TaskRecord],
        summary: &SummaryTables,
        format: &str,
    ) -> Result<ExportPayload> {
        let format: ExportFormat = format.parse()?;
        self.export(records, summary, format)
    }

    pub fn export(
        &self,
        records: &[TaskRecord],
        summary: &SummaryTables,
        format: ExportFormat,
    ) -> Result<ExportPayload> {
        let files = match format {
            ExportFormat::StructuredText => vec![self.json_file(records, summary)?],
            ExportFormat::TabularText => self.csv_files(records, summary)?,
            ExportFormat::Spreadsheet => vec![self.xlsx_file(records, summary)?],
        };
        let payload = ExportPayload { files };
        info!(
            "Exported {} records as {} ({} files, {} bytes)",
            records.len(),
            format,
            payload.files.len(),
            payload.total_bytes()
        );
        Ok(payload)
    }

    // ── Backends ──────────────────────────────────────────────────────────────

    fn json_file(&self, records: &[TaskRecord], summary: &SummaryTables) -> Result<ExportedFile> {
        let doc = StructuredExport { records, summary };
        let mut bytes = serde_json::to_vec_pretty(&doc)?;
        bytes.push(b'\n');
        Ok(self.file(ExportFormat::StructuredText, None, bytes))
    }

    fn csv_files(
        &self,
        records: &[TaskRecord],
        summary: &SummaryTables,
    ) -> Result<Vec<ExportedFile>> {
        self.all_tables(records, summary)
            .iter()
            .map(|table| -> Result<ExportedFile> {
                let bytes = table_to_csv(table)?;
                debug!("CSV table {}: {} rows", table.name, table.rows.len());
                Ok(self.file(ExportFormat::TabularText, Some(&table.file_stem()), bytes))
            })
            .collect()
    }

    fn xlsx_file(&self, records: &[TaskRecord], summary: &SummaryTables) -> Result<ExportedFile> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        for table in self.all_tables(records, summary) {
            write_sheet(&mut workbook, &table, &header).map_err(xlsx_error)?;
        }

        let bytes = workbook.save_to_buffer().map_err(xlsx_error)?;
        Ok(self.file(ExportFormat::Spreadsheet, None, bytes))
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn all_tables(&self, records: &[TaskRecord], summary: &SummaryTables) -> Vec<Table> {
        let mut tables = summary_tables(summary);
        tables.push(records_table(records, self.timezone));
        tables
    }

    fn file(&self, format: ExportFormat, suffix: Option<&str>, bytes: Vec<u8>) -> ExportedFile {
        let name = match suffix {
            Some(suffix) => format!("{}-{}.{}", self.base_name, suffix, format.extension()),
            None => format!("{}.{}", self.base_name, format.extension()),
        };
        ExportedFile {
            name,
            content_type: format.content_type(),
            bytes,
        }
    }
}

fn table_to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.headers)
        .map_err(|e| ReportError::Export(e.to_string()))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|c| c.plain()))
            .map_err(|e| ReportError::Export(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ReportError::Export(e.to_string()))
}

fn write_sheet(
    workbook: &mut Workbook,
    table: &Table,
    header: &Format,
) -> std::result::Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(&table.name)?;

    for (col, title) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, title, header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let row_num = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell.as_number() {
                Some(n) => {
                    sheet.write_number(row_num, col as u16, n)?;
                }
                None => {
                    let text = cell.plain();
                    if !text.is_empty() {
                        sheet.write_string(row_num, col as u16, text)?;
                    }
                }
            }
        }
    }
    sheet.autofit();
    Ok(())
}

fn xlsx_error(e: XlsxError) -> ReportError {
    ReportError::Export(e.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::TaskAggregator;
    use chrono::{NaiveDate, TimeZone as _, Utc};
    use std::collections::BTreeSet;
    use trelliq_core::groups::GroupRegistry;
    use trelliq_core::models::StatusCategory;

    fn records() -> Vec<TaskRecord> {
        vec![
            TaskRecord {
                id: "c1".to_string(),
                title: "Carrossel, parte 1".to_string(),
                group_id: "grupo-2".to_string(),
                group_name: "Grupo 2".to_string(),
                status: StatusCategory::Done,
                list_name: "FEITOS".to_string(),
                collaborators: BTreeSet::from(["Luiz".to_string()]),
                created_at: None,
                last_activity: Some(Utc.with_ymd_and_hms(2024, 12, 10, 12, 0, 0).unwrap()),
                due: None,
                archived: false,
                url: None,
            },
            TaskRecord {
                id: "c2".to_string(),
                title: "Roteiro".to_string(),
                group_id: "unassigned".to_string(),
                group_name: "Unassigned".to_string(),
                status: StatusCategory::Unknown,
                list_name: "Esperando Cliente".to_string(),
                collaborators: BTreeSet::new(),
                created_at: None,
                last_activity: None,
                due: None,
                archived: false,
                url: None,
            },
        ]
    }

    fn summary(records: &[TaskRecord]) -> SummaryTables {
        let registry = GroupRegistry::builtin();
        TaskAggregator::new(&registry, Tz::UTC, NaiveDate::from_ymd_opt(2024, 12, 20).unwrap())
            .summarize(records)
    }

    fn exporter() -> Exporter {
        Exporter::new(Tz::UTC)
    }

    // ── ExportFormat ──────────────────────────────────────────────────────────

    #[test]
    fn test_format_names_and_aliases() {
        assert_eq!("spreadsheet".parse::<ExportFormat>().unwrap(), ExportFormat::Spreadsheet);
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Spreadsheet);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::TabularText);
        assert_eq!(
            " tabular-text ".parse::<ExportFormat>().unwrap(),
            ExportFormat::TabularText
        );
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::StructuredText);
    }

    #[test]
    fn test_pdf_is_unsupported_and_produces_nothing() {
        let recs = records();
        let err = exporter()
            .export_as(&recs, &summary(&recs), "pdf")
            .unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedFormat(ref f) if f == "pdf"));
    }

    // ── structured-text ───────────────────────────────────────────────────────

    #[test]
    fn test_json_export_shape() {
        let recs = records();
        let payload = exporter().export_as(&recs, &summary(&recs), "json").unwrap();
        assert_eq!(payload.files.len(), 1);
        let file = &payload.files[0];
        assert_eq!(file.name, "trelliq-report.json");
        assert_eq!(file.content_type, "application/json");

        let doc: serde_json::Value = serde_json::from_slice(&file.bytes).unwrap();
        assert_eq!(doc["records"].as_array().unwrap().len(), 2);
        assert_eq!(doc["records"][0]["status"], "done");
        assert_eq!(doc["summary"]["overview"]["total_tasks"], 2);
        assert_eq!(doc["summary"]["statuses"].as_array().unwrap().len(), 5);
        assert_eq!(doc["summary"]["groups"][0]["members"][0], "Jamily");
        assert!(doc["summary"]["groups"][0]["late_deliveries"].is_u64());
    }

    #[test]
    fn test_json_export_is_byte_identical_across_runs() {
        let recs = records();
        let a = exporter().export_as(&recs, &summary(&recs), "json").unwrap();
        let b = exporter().export_as(&recs, &summary(&recs), "json").unwrap();
        assert_eq!(a, b);
    }

    // ── tabular-text ──────────────────────────────────────────────────────────

    #[test]
    fn test_csv_export_one_file_per_table() {
        let recs = records();
        let payload = exporter()
            .with_base_name("board")
            .export_as(&recs, &summary(&recs), "csv")
            .unwrap();
        let names: Vec<&str> = payload.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "board-overview.csv",
                "board-groups.csv",
                "board-status.csv",
                "board-collaborators.csv",
                "board-days.csv",
                "board-weeks.csv",
                "board-tasks.csv",
            ]
        );
        assert!(payload.files.iter().all(|f| f.content_type == "text/csv"));
    }

    #[test]
    fn test_csv_status_table_content() {
        let recs = records();
        let payload = exporter().export_as(&recs, &summary(&recs), "csv").unwrap();
        let status = payload
            .files
            .iter()
            .find(|f| f.name.ends_with("-status.csv"))
            .unwrap();
        let text = String::from_utf8(status.bytes.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Status,Tasks,%");
        assert_eq!(lines[1], "Backlog,0,0.0");
        assert_eq!(lines[4], "Done,1,50.0");
        assert_eq!(lines[5], "Unknown,1,50.0");
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let recs = records();
        let payload = exporter().export_as(&recs, &summary(&recs), "csv").unwrap();
        let tasks = payload.files.last().unwrap();
        let text = String::from_utf8(tasks.bytes.clone()).unwrap();
        assert!(text.contains("\"Carrossel, parte 1\""));
    }

    // ── spreadsheet ───────────────────────────────────────────────────────────

    #[test]
    fn test_xlsx_export_is_a_zip_container() {
        let recs = records();
        let payload = exporter()
            .export_as(&recs, &summary(&recs), "spreadsheet")
            .unwrap();
        assert_eq!(payload.files.len(), 1);
        let file = &payload.files[0];
        assert_eq!(file.name, "trelliq-report.xlsx");
        assert!(file.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_xlsx_export_with_no_records() {
        let payload = exporter().export(&[], &summary(&[]), ExportFormat::Spreadsheet).unwrap();
        assert!(!payload.files[0].bytes.is_empty());
    }
}
