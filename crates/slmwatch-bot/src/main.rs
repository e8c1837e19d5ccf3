//! Stop-loss-market order watcher - Entry Point
//!
//! Watches the given orders until they reach a final state, placing a
//! market exit whenever the exchange cancels one for being outside the
//! permitted execution range.

use anyhow::{bail, Context, Result};
use clap::Parser;
use slmwatch_core::{AccountContext, InitialJobData, OrderId, WatcherJobInput};
use tracing::{info, warn};

/// Order the scripted fake broker knows about in mock mode.
const MOCK_ORDER_ID: &str = "SLM-1";

/// Stop-loss-market order watcher
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SLMWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Order id to watch (repeatable)
    #[arg(long = "order-id")]
    order_ids: Vec<String>,

    /// Order tag carried along the watch chain
    #[arg(long)]
    tag: Option<String>,

    /// Full initial job data as a JSON object (must contain `orderTag`)
    #[arg(long, conflicts_with = "tag")]
    job_data: Option<String>,

    /// Broker user id (overrides `[account] user_id`)
    #[arg(long)]
    user: Option<String>,
}

impl Args {
    fn initial_job_data(&self) -> Result<InitialJobData> {
        if let Some(raw) = &self.job_data {
            let value: serde_json::Value =
                serde_json::from_str(raw).context("--job-data is not valid JSON")?;
            return Ok(InitialJobData::from_value(value)?);
        }
        match &self.tag {
            Some(tag) => Ok(InitialJobData::new(tag.clone())),
            None => bail!("either --tag or --job-data is required"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    slmwatch_telemetry::init_logging()?;

    info!("Starting slmwatch v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > SLMWATCH_CONFIG env var > default
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("SLMWATCH_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = slmwatch_bot::AppConfig::load(&config_path)?;
    if let Some(user) = &args.user {
        config.account.user_id = user.clone();
    }
    info!(
        mock_orders = config.broker.mock_orders,
        watch_manual_cancellations = config.watcher.watch_manual_cancellations,
        poll_interval_ms = config.scheduler.poll_interval_ms,
        "Configuration loaded"
    );

    let mut order_ids = args.order_ids.clone();
    if order_ids.is_empty() {
        if !config.broker.mock_orders {
            bail!("at least one --order-id is required");
        }
        warn!(order_id = MOCK_ORDER_ID, "No order given, watching the mock fixture order");
        order_ids.push(MOCK_ORDER_ID.to_string());
    }

    let job_data = args.initial_job_data()?;
    let account = AccountContext::new(config.account.user_id.clone());
    let initial = order_ids
        .iter()
        .map(|raw| {
            let order_id = OrderId::parse(raw)?;
            Ok(WatcherJobInput::new(order_id, account.clone(), job_data.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    // Create application
    let app = slmwatch_bot::Application::new(config)?;

    // Run main application loop
    let summary = app.run(initial).await?;

    if summary.attention_count() > 0 {
        warn!(
            needs_attention = summary.attention_count(),
            "Some watches ended in a state that needs manual attention"
        );
    }

    Ok(())
}
