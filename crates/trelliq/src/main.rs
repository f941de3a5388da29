mod bootstrap;

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use trelliq_core::config::ReportConfig;
use trelliq_core::settings::Settings;
use trelliq_core::time_utils::resolve_timezone;
use trelliq_data::analysis::{analyze_export, ActivityWindow, PipelineOptions};
use trelliq_data::exporter::Exporter;
use trelliq_ui::app::{self, App};
use trelliq_ui::text_report;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("trelliq v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Theme: {}, Timezone: {}",
        settings.view,
        settings.theme,
        settings.timezone
    );

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = bootstrap::discover_config_path(settings.config.as_deref());
    let config = ReportConfig::load(config_path.as_deref())?;

    if settings.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let Some(input) = settings.input.as_deref() else {
        bail!("no board export given; pass the path to a Trello JSON export");
    };

    let timezone = resolve_timezone(&settings.timezone);
    let mut options = PipelineOptions::today_in(timezone);
    if let Some(as_of) = settings.as_of {
        options.as_of = as_of;
    }
    options.window = ActivityWindow::new(settings.from, settings.to)?;

    let result = analyze_export(input, &config, &options)
        .with_context(|| format!("failed to build report from {}", input.display()))?;

    // ── Export ────────────────────────────────────────────────────────────────
    if let Some(format) = settings.export.as_deref() {
        let payload = Exporter::new(timezone).export_as(&result.records, &result.tables, format)?;
        let dir = settings.output.clone().unwrap_or_else(|| PathBuf::from("."));
        let written = bootstrap::write_payload(&dir, &payload)?;
        for path in &written {
            eprintln!("Wrote {}", path.display());
        }
    }

    // ── View ──────────────────────────────────────────────────────────────────
    match settings.view.as_str() {
        "report" => {
            let mut stdout = std::io::stdout().lock();
            text_report::write_report(&mut stdout, &result)?;
            stdout.flush()?;
        }
        "dashboard" => {
            tracing::info!("Starting dashboard...");
            let dashboard = App::new(result, config.groups.clone(), timezone, &settings.theme);

            // The dashboard handles Ctrl+C as a key press in raw mode; the
            // signal branch covers the moments before raw mode is entered.
            tokio::select! {
                outcome = dashboard.run() => outcome?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; restoring terminal");
                    app::restore_terminal()?;
                }
            }
        }
        "none" => {}
        unknown => bail!("unknown view: {unknown}"),
    }

    Ok(())
}
