use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use arcvault_core::ArcvaultConfig;

/// arcvault: terminal dashboard for the ArcVault clinical assistant.
///
/// Lists the strategies served by the backend (home triage, pharmacy check,
/// consultation, patient intake, monitoring), renders each one and submits
/// actions for the backend to run.
#[derive(Parser, Debug)]
#[command(name = "arcvault", version, about)]
struct Cli {
    /// Backend base URL (overrides the config file).
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Strategy to open first instead of the head of the list.
    #[arg(short, long)]
    strategy: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging.
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Log to a file so the TUI's alternate screen stays clean.
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("arcvault");
    let _ = std::fs::create_dir_all(&log_dir);
    let log_path = log_dir.join("arcvault.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    match log_file {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
                )
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("off"))
                .with_writer(std::io::sink)
                .init();
        }
    }

    let mut config = ArcvaultConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
        ArcvaultConfig::default()
    });
    if let Some(url) = cli.backend_url {
        config = config.with_base_url(url);
    }

    tracing::info!(
        backend = %config.backend.base_url,
        "Starting arcvault v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut app = arcvault_tui::App::new(&config)?.with_initial_strategy(cli.strategy);
    app.run().await?;

    tracing::info!("arcvault exited cleanly");
    Ok(())
}
