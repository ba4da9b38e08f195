//! # FlowDesk — Lead & Shipment Automation
//!
//! Polls the CRM and carrier snapshots on fixed intervals, evaluates the
//! automation rules and fires webhooks for matches.
//!
//! Usage:
//!   flowdesk                                   # Run until Ctrl-C
//!   flowdesk --once                            # One lead + shipment cycle, then exit
//!   flowdesk --webhook-url https://hooks/x     # Override the sink URL
//!   flowdesk --dry-run --once                  # Log payloads instead of POSTing
//!   flowdesk --init-config                     # Write default config and exit

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use flowdesk_core::{Clock, FlowdeskConfig, SystemClock};
use flowdesk_scheduler::{
    AutomationPipeline, FailureLog, LogSink, Scheduler, WebhookDispatcher, WebhookSink,
};
use flowdesk_sources::{MockCarrier, MockCrm};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "flowdesk",
    version,
    about = "📦 FlowDesk — lead and shipment automation"
)]
struct Cli {
    /// Config file (default: ~/.flowdesk/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Webhook sink URL (overrides config and FLOWDESK_WEBHOOK_URL)
    #[arg(long)]
    webhook_url: Option<String>,

    /// Lead polling interval in seconds
    #[arg(long)]
    lead_interval: Option<u64>,

    /// Shipment polling interval in seconds
    #[arg(long)]
    shipment_interval: Option<u64>,

    /// Run one cycle of each pipeline and exit
    #[arg(long)]
    once: bool,

    /// Log webhook payloads instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Write the default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

fn load_config(cli: &Cli) -> Result<FlowdeskConfig> {
    let mut config = match &cli.config {
        Some(path) => FlowdeskConfig::load_from(std::path::Path::new(&expand_path(path)))?,
        None => FlowdeskConfig::load()?,
    };
    config.apply_env();

    if let Some(url) = &cli.webhook_url {
        config.webhook.url = url.clone();
    }
    if let Some(secs) = cli.lead_interval {
        config.automation.lead_poll_secs = secs;
    }
    if let Some(secs) = cli.shipment_interval {
        config.automation.shipment_poll_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "flowdesk=debug" } else { "flowdesk=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // --init-config: write defaults and exit
    if cli.init_config {
        let path = match &cli.config {
            Some(p) => std::path::PathBuf::from(expand_path(p)),
            None => FlowdeskConfig::default_path(),
        };
        if path.exists() {
            println!("⚠️  Config already exists: {}", path.display());
        } else {
            FlowdeskConfig::default().save_to(&path)?;
            println!("✅ Default config written to {}", path.display());
        }
        return Ok(());
    }

    let config = load_config(&cli)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let failures = Arc::new(FailureLog::default());
    let sink: Arc<dyn WebhookSink> = if cli.dry_run {
        Arc::new(LogSink)
    } else {
        Arc::new(
            WebhookDispatcher::from_config(&config.webhook)
                .context("cannot start without a webhook URL (or use --dry-run)")?,
        )
    };

    let crm = MockCrm::seeded(clock.clone()).with_snapshot_limit(config.sources.lead_snapshot_limit);
    let carrier =
        MockCarrier::seeded(clock.as_ref()).with_snapshot_limit(config.sources.shipment_snapshot_limit);
    let pipeline = Arc::new(AutomationPipeline::new(
        Arc::new(crm),
        Arc::new(carrier),
        sink,
        failures.clone(),
        clock.clone(),
    ));

    if cli.once {
        let summary = pipeline.run_once().await?;
        println!("✅ One cycle done: {summary}");
        if !failures.is_empty() {
            println!("⚠️  {} failure(s):", failures.len());
            for report in failures.recent() {
                println!("   {}: {}", report.origin, report.message);
            }
        }
        return Ok(());
    }

    if !config.automation.enabled {
        tracing::warn!("⏸️ Automation is disabled in config (automation.enabled = false)");
        return Ok(());
    }

    let scheduler = Scheduler::new(failures.clone(), clock);
    let handle = pipeline.start(&scheduler, &config.automation)?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("🛑 Shutting down...");
    for id in [handle.lead_task, handle.shipment_task] {
        if let Some(task) = scheduler.task(id) {
            tracing::info!(
                "📊 {}: {} run(s), {} failed, {} tick(s) skipped",
                task.name,
                task.run_count,
                task.failure_count,
                task.skipped_ticks
            );
        }
    }
    // Waits for a cycle that is still running.
    scheduler.shutdown().await;

    tracing::info!("📊 {} failure(s) recorded this session", failures.len());
    Ok(())
}
