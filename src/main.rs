//! ClinicDesk: terminal front desk for the clinical records API.
//!
//! Main entry point for the terminal application.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clinicdesk::adapters::sanitize::SanitizingMakeWriter;
use clinicdesk::adapters::ClinicalBackend;
use clinicdesk::config::{ClinicConfig, LogMode};
use clinicdesk::tui::{App, ClinicServices};

fn main() -> Result<()> {
    let config = ClinicConfig::from_env().context("Invalid CLINICDESK_* configuration")?;

    // Initialize logging.
    //
    // IMPORTANT: writing logs to the terminal will corrupt the TUI (alternate screen).
    // Auto mode logs to a file when interactive and to stdout otherwise.
    let use_file = match config.log_mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => std::io::stdout().is_terminal(),
    };

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: a missing directory surfaces when the file is opened.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("Cannot open log file {}", config.log_file.display()))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting ClinicDesk...");

    let backend = Arc::new(ClinicalBackend::from_config(&config)?);
    let label = backend.describe();
    let services = Arc::new(ClinicServices::new(backend, config.doctor_id.clone()));

    let mut app = App::with_services(services, label);
    app.run()?;

    tracing::info!("ClinicDesk shutdown complete.");
    Ok(())
}
