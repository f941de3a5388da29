use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trelliq_core::config::ReportConfig;
use trelliq_data::exporter::ExportPayload;

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.trelliq/` exists (it holds `last_used.json` and the optional
/// `config.toml`).
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

pub fn ensure_directories_in(home: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(home.join(".trelliq"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a Python-style level name to an [`EnvFilter`] directive.
///
/// `CRITICAL` has no tracing counterpart and maps to `error`. Unknown names
/// are passed through so that full directives (`trelliq_data=debug`) work.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, or appends to `log_file` (without ANSI colours)
/// when one is given. Falls back to `"info"` if the level is not recognised.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            (Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

// ── Config discovery ───────────────────────────────────────────────────────────

/// Pick the configuration file for this run.
///
/// 1. An explicit `--config` path is always used (loading fails later if it
///    is missing).
/// 2. Otherwise `~/.trelliq/config.toml` when it exists.
/// 3. Otherwise `None`, meaning the built-in groups and status rules.
pub fn discover_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    let home = dirs::home_dir();
    discover_config_path_in(explicit, home.as_deref())
}

pub fn discover_config_path_in(explicit: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    home.map(ReportConfig::default_path_in)
        .filter(|p| p.is_file())
}

// ── Export output ──────────────────────────────────────────────────────────────

/// Write every file of `payload` into `dir`, creating it if needed.
///
/// Returns the written paths in payload order.
pub fn write_payload(dir: &Path, payload: &ExportPayload) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(payload.files.len());
    for file in &payload.files {
        let path = dir.join(&file.name);
        std::fs::write(&path, &file.bytes)?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), file.bytes.len());
        written.push(path);
    }
    Ok(written)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
