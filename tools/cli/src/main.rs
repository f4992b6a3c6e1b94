//! ODK Services CLI - runs the verify-server-settings flow from a terminal.
//!
//! The sync service is simulated in memory, so the tool exercises the poller,
//! its retry policy, and the outcome table without an Android device.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use odkservices_common::AppName;
use odkservices_sync::{
    render_outcome, MemorySyncService, PollerConfig, PollerDriver, RunOutcome, ScriptedRun,
    ServiceConnection, SyncPresenter, SyncProgressEvent, SyncProgressState, SyncStatus,
    SyncStatusPoller,
};

#[derive(Parser)]
#[command(name = "odkservices")]
#[command(about = "ODK Services - verify sync server settings")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify server settings against a simulated sync service.
    Verify {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Application name (overrides the configuration).
        #[arg(short, long)]
        app: Option<String>,

        /// Sync server URL (overrides the configuration).
        #[arg(short, long)]
        server_url: Option<String>,

        /// Status the simulated verify ends with, e.g. AUTHENTICATION_ERROR.
        #[arg(short, long, default_value = "SYNC_COMPLETE")]
        outcome: String,

        /// Number of progress frames the simulated verify reports.
        #[arg(short, long, default_value_t = 3)]
        frames: i32,

        /// Delay before the simulated service binds, in milliseconds.
        #[arg(short, long, default_value_t = 0)]
        bind_delay_ms: u64,

        /// Release the app synchronizer after the outcome is shown.
        #[arg(long)]
        complete: bool,
    },

    /// Print the outcome shown for every sync status.
    Outcomes,

    /// Print the default configuration as JSON.
    Config,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Verify {
            config,
            app,
            server_url,
            outcome,
            frames,
            bind_delay_ms,
            complete,
        } => {
            let config = load_config(config.as_deref(), app, server_url)?;
            let final_status: SyncStatus = outcome.parse().context("Invalid --outcome")?;
            cmd_verify(
                config,
                final_status,
                frames,
                Duration::from_millis(bind_delay_ms),
                complete,
            )
            .await
        }

        Commands::Outcomes => cmd_outcomes(),

        Commands::Config => cmd_config(),

        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "odkservices",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Build the configuration from an optional file plus flag overrides.
fn load_config(
    path: Option<&Path>,
    app: Option<String>,
    server_url: Option<String>,
) -> Result<PollerConfig> {
    let mut config = match path {
        Some(path) => PollerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PollerConfig::default(),
    };

    if let Some(app) = app {
        config.app_name = AppName::new(app).context("Invalid app name")?;
    }
    if let Some(url) = server_url {
        config.server.server_url = Some(url);
    }

    Ok(config)
}

/// Presenter that writes progress and outcomes to the terminal.
struct TerminalPresenter;

impl SyncPresenter for TerminalPresenter {
    fn set_input_enabled(&self, _enabled: bool) {}

    fn on_progress(
        &self,
        status: SyncStatus,
        progress_state: SyncProgressState,
        message: &str,
        step: i32,
        max_step: i32,
    ) {
        let counter = if step < 0 {
            "...".to_string()
        } else {
            format!("{}/{}", step, max_step)
        };
        println!(
            "  [{:<7}] {:<12} {} {}",
            counter,
            format!("{:?}", progress_state),
            message,
            if status == SyncStatus::Syncing { "" } else { "(waiting)" }
        );
        let _ = std::io::stdout().flush();
    }

    fn on_outcome(&self, title: &str, message: &str) {
        println!();
        println!("{}", title);
        println!("  {}", message);
    }
}

/// Run a verify against the simulated service.
async fn cmd_verify(
    config: PollerConfig,
    final_status: SyncStatus,
    frames: i32,
    bind_delay: Duration,
    complete: bool,
) -> Result<()> {
    if !config.server.are_credentials_configured() {
        anyhow::bail!("No sync server configured. Pass --server-url or set server.server_url");
    }

    info!(
        "Verifying {} against {}",
        config.app_name,
        config.server.server_url.as_deref().unwrap_or_default()
    );

    let service = Arc::new(MemorySyncService::new());
    let frames = (0..frames.max(0))
        .map(|i| {
            SyncProgressEvent::new(
                SyncProgressState::AppFiles,
                format!("Checking server settings ({})", i + 1),
                i,
                frames,
            )
        })
        .collect();
    service.plan_run(ScriptedRun::verify(final_status).with_frames(frames));

    let connection = Arc::new(ServiceConnection::new());
    connection.begin_binding();
    let binder = connection.clone();
    let bound_service = service.clone();
    tokio::spawn(async move {
        tokio::time::sleep(bind_delay).await;
        binder.bind(bound_service);
    });

    let poller = SyncStatusPoller::new(&config, connection.clone(), Arc::new(TerminalPresenter));
    let (mut driver, shutdown) = PollerDriver::new(poller, connection.subscribe());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown();
        }
    });

    if driver.verify().await.context("Verify failed")? == RunOutcome::Shutdown {
        println!("Interrupted.");
        return Ok(());
    }

    if complete {
        driver
            .poller()
            .complete_sync()
            .await
            .context("Failed to release app synchronizer")?;
        println!("App synchronizer released.");
    }

    Ok(())
}

/// Print the outcome table.
fn cmd_outcomes() -> Result<()> {
    for status in SyncStatus::ALL {
        let outcome = render_outcome(status);
        println!("{:<48} {}", status.name(), outcome.title);
        println!("{:<48} {}", "", outcome.message);
    }
    Ok(())
}

/// Print the default configuration.
fn cmd_config() -> Result<()> {
    let config = PollerConfig::default();
    println!("{}", config.to_json()?);
    Ok(())
}
