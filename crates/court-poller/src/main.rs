use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use court_poller::config::Config;
use court_poller::notifier::{self, Notification};
use court_poller::scheduler::PollingScheduler;
use court_poller::service::CourtMonitor;

#[derive(Parser)]
#[command(name = "court-poller")]
#[command(about = "Watches court availability and notifies when new slots open up")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        default_value = "court-monitor.toml",
        env = "COURT_MONITOR_CONFIG"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll forever (the default)
    Run,
    /// Run a single cycle and print its report, without a startup message
    Once,
    /// Send a test message through the configured channel
    TestNotify,
    /// Print a starter configuration file
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "court_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Run);
    if let Commands::ExampleConfig = command {
        print!("{}", toml::to_string_pretty(&Config::example())?);
        return Ok(());
    }

    let config = Config::load(&cli.config)?;
    let notifier = notifier::from_config(
        &config.notifier,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("Failed to set up notification channel")?;
    let mut monitor = CourtMonitor::new(&config, notifier).context("Failed to create monitor")?;

    match command {
        Commands::Once => {
            let report = monitor.run_cycle().await?;
            println!("{:#?}", report);
        }
        Commands::TestNotify => {
            if !monitor.send_direct(&Notification::test()).await {
                anyhow::bail!("test notification was not delivered");
            }
            println!("Test notification sent via {}", monitor.channel_name());
        }
        _ => run_forever(&config, monitor).await?,
    }

    Ok(())
}

async fn run_forever(config: &Config, monitor: CourtMonitor) -> Result<()> {
    tracing::info!("Starting court monitor");
    tracing::info!(tenants = ?config.tenant_ids, days_ahead = config.days_ahead, "watching");
    tracing::info!("Filtering: {}", config.filter_summary());
    tracing::info!("Checking every {} seconds", config.check_interval_secs);
    tracing::info!("Notifications via {}", config.notifier.channel_name());

    monitor.announce_startup().await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = PollingScheduler::new(
        monitor,
        Duration::from_secs(config.check_interval_secs),
        Duration::from_secs(config.retry_delay_secs),
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    tracing::info!("Court monitor running. Press Ctrl+C to stop.");
    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, finishing current cycle...");
    shutdown_tx.send(true).ok();

    let summary = scheduler_handle.await.context("Scheduler task panicked")?;
    tracing::info!(
        cycles = summary.cycles,
        failed_cycles = summary.failed_cycles,
        "Court monitor stopped"
    );
    Ok(())
}
