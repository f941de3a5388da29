use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by Trelliq.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The board export lacks the minimal structure needed for extraction.
    ///
    /// `field` is the path of the offending field, e.g. `cards[3].id`.
    #[error("Malformed board export at `{field}`: {reason}")]
    MalformedInput { field: String, reason: String },

    /// The requested export format is not one of the supported formats.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// A status-rule pattern is not a valid regular expression.
    #[error("Invalid status pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serializer backend failed while producing an export payload.
    #[error("Export failed: {0}")]
    Export(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    /// Shorthand for [`ReportError::MalformedInput`].
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the Trelliq crates.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ReportError::FileRead {
            path: PathBuf::from("/uploads/board.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/uploads/board.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_malformed_names_field() {
        let err = ReportError::malformed("cards[2].id", "card has no id");
        assert_eq!(
            err.to_string(),
            "Malformed board export at `cards[2].id`: card has no id"
        );
    }

    #[test]
    fn test_error_display_unsupported_format() {
        let err = ReportError::UnsupportedFormat("pdf".to_string());
        assert_eq!(err.to_string(), "Unsupported export format: pdf");
    }

    #[test]
    fn test_error_display_invalid_pattern() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = ReportError::InvalidPattern {
            pattern: "(unclosed".to_string(),
            source,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid status pattern \"(unclosed\""));
    }

    #[test]
    fn test_error_display_timestamp_parse() {
        let err = ReportError::TimestampParse("not-a-timestamp".to_string());
        assert_eq!(err.to_string(), "Invalid timestamp format: not-a-timestamp");
    }

    #[test]
    fn test_error_display_config() {
        let err = ReportError::Config("duplicate group id".to_string());
        assert_eq!(err.to_string(), "Configuration error: duplicate group id");
    }

    #[test]
    fn test_error_display_export() {
        let err = ReportError::Export("sheet name too long".to_string());
        assert_eq!(err.to_string(), "Export failed: sheet name too long");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ReportError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: ReportError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
