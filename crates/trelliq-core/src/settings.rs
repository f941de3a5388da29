use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Task reports for Trello board exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "trelliq",
    about = "Group, summarize and export tasks from a Trello board export",
    version
)]
pub struct Settings {
    /// Trello board export (JSON)
    pub input: Option<PathBuf>,

    /// View mode
    #[arg(long, default_value = "report", value_parser = ["report", "dashboard", "none"])]
    pub view: String,

    /// Export format (xlsx, csv, json)
    #[arg(long)]
    pub export: Option<String>,

    /// Directory export files are written to
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Group and status-rule configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Timezone (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Keep only tasks active on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Keep only tasks active on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Reference date for overdue calculations (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.trelliq/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
}

impl LastUsedParams {
    /// Return the default path to the persisted params file.
    /// Uses `~/.trelliq/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the params path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".trelliq").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the params file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit params path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        params_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(params_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(params_path);

        // CLI always wins. Note that clap ids are field names (underscores).
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if settings.output.is_none() {
            settings.output = last.output;
        }
        // A remembered config file that has since been removed is forgotten
        // rather than failing the run.
        if settings.config.is_none() {
            settings.config = last.config.filter(|p| p.exists());
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(params_path);

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone.eq_ignore_ascii_case("auto") {
            settings.timezone = crate::time_utils::get_system_timezone();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            view: Some(s.view.clone()),
            theme: Some(s.theme.clone()),
            timezone: Some(s.timezone.clone()),
            output: s.output.as_deref().map(absolute_path),
            config: s.config.as_deref().map(absolute_path),
        }
    }
}

/// Resolve `path` against the current directory so a remembered path means
/// the same file from any working directory. Paths that do not exist yet are
/// made absolute without touching the filesystem.
fn absolute_path(path: &std::path::Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_params_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        let params = LastUsedParams {
            view: Some("dashboard".to_string()),
            theme: Some("dark".to_string()),
            timezone: Some("America/Sao_Paulo".to_string()),
            output: Some(PathBuf::from("/tmp/reports")),
            config: Some(PathBuf::from("/etc/trelliq.toml")),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.view, Some("dashboard".to_string()));
        assert_eq!(loaded.theme, Some("dark".to_string()));
        assert_eq!(loaded.timezone, Some("America/Sao_Paulo".to_string()));
        assert_eq!(loaded.output, Some(PathBuf::from("/tmp/reports")));
        assert_eq!(loaded.config, Some(PathBuf::from("/etc/trelliq.toml")));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        LastUsedParams {
            theme: Some("light".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        assert!(LastUsedParams::load_from(&path).view.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).theme.is_none());
    }

    // ── CLI parsing ───────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["trelliq"]);

        assert!(settings.input.is_none());
        assert_eq!(settings.view, "report");
        assert!(settings.export.is_none());
        assert!(settings.output.is_none());
        assert!(settings.config.is_none());
        assert!(!settings.print_config);
        assert_eq!(settings.timezone, "auto");
        assert!(settings.from.is_none());
        assert!(settings.to.is_none());
        assert!(settings.as_of.is_none());
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_input_and_export() {
        let settings = Settings::parse_from([
            "trelliq",
            "board.json",
            "--export",
            "csv",
            "--output",
            "out",
        ]);
        assert_eq!(settings.input, Some(PathBuf::from("board.json")));
        assert_eq!(settings.export.as_deref(), Some("csv"));
        assert_eq!(settings.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_settings_cli_export_accepts_any_string() {
        // Unknown formats are rejected by the exporter, not by clap.
        let settings = Settings::parse_from(["trelliq", "--export", "pdf"]);
        assert_eq!(settings.export.as_deref(), Some("pdf"));
    }

    #[test]
    fn test_settings_cli_dates() {
        let settings = Settings::parse_from([
            "trelliq",
            "--from",
            "2024-12-01",
            "--to",
            "2024-12-31",
            "--as-of",
            "2024-12-20",
        ]);
        assert_eq!(settings.from, NaiveDate::from_ymd_opt(2024, 12, 1));
        assert_eq!(settings.to, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(settings.as_of, NaiveDate::from_ymd_opt(2024, 12, 20));
    }

    #[test]
    fn test_settings_cli_rejects_bad_date() {
        assert!(Settings::try_parse_from(["trelliq", "--from", "31/12/2024"]).is_err());
    }

    #[test]
    fn test_settings_cli_rejects_unknown_view() {
        assert!(Settings::try_parse_from(["trelliq", "--view", "daily"]).is_err());
    }

    // ── load_with_last_used ───────────────────────────────────────────────────

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        LastUsedParams {
            view: Some("dashboard".to_string()),
            theme: Some("dark".to_string()),
            timezone: Some("UTC".to_string()),
            output: Some(PathBuf::from("reports")),
            config: None,
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(vec!["trelliq".into()], &path);
        assert_eq!(settings.view, "dashboard");
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.timezone, "UTC");
        assert_eq!(settings.output, Some(PathBuf::from("reports")));
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        LastUsedParams {
            theme: Some("dark".to_string()),
            view: Some("dashboard".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec![
                "trelliq".into(),
                "--theme".into(),
                "light".into(),
                "--view".into(),
                "report".into(),
            ],
            &path,
        );
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.view, "report");
    }

    #[test]
    fn test_load_with_last_used_persists_absolute_paths() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        let config = tmp.path().join("groups.toml");
        std::fs::write(&config, "").unwrap();

        let settings = Settings::load_with_last_used_impl(
            vec![
                "trelliq".into(),
                "--output".into(),
                "relative-reports".into(),
                "--config".into(),
                config.clone().into_os_string(),
            ],
            &path,
        );
        // The run itself keeps the path as given.
        assert_eq!(settings.output, Some(PathBuf::from("relative-reports")));

        let saved = LastUsedParams::load_from(&path);
        let output = saved.output.expect("output persisted");
        assert!(output.is_absolute(), "{}", output.display());
        assert_eq!(
            output,
            std::env::current_dir().unwrap().join("relative-reports")
        );
        assert_eq!(saved.config, Some(config.canonicalize().unwrap()));
    }

    #[test]
    fn test_load_with_last_used_forgets_missing_config_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        LastUsedParams {
            timezone: Some("UTC".to_string()),
            config: Some(tmp.path().join("gone.toml")),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(vec!["trelliq".into()], &path);
        assert!(settings.config.is_none());
    }

    #[test]
    fn test_load_with_last_used_keeps_existing_config_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        let config = tmp.path().join("groups.toml");
        std::fs::write(&config, "").unwrap();
        LastUsedParams {
            timezone: Some("UTC".to_string()),
            config: Some(config.clone()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(vec!["trelliq".into()], &path);
        assert_eq!(settings.config, Some(config));
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        LastUsedParams {
            theme: Some("classic".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["trelliq".into(), "--clear".into()], &path);

        assert!(!path.exists(), "file must be gone after --clear");
        assert_eq!(settings.theme, "auto");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        let settings =
            Settings::load_with_last_used_impl(vec!["trelliq".into(), "--debug".into()], &path);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_resolves_auto_timezone() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);
        let settings = Settings::load_with_last_used_impl(vec!["trelliq".into()], &path);
        assert_ne!(settings.timezone, "auto");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_params_path(&tmp);

        Settings::load_with_last_used_impl(
            vec!["trelliq".into(), "--view".into(), "dashboard".into()],
            &path,
        );

        assert!(path.exists(), "params file must be persisted after run");
        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.view, Some("dashboard".to_string()));
    }
}
