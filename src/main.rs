use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use liquidity_watch::alert::format::{format_timestamp, test_message};
use liquidity_watch::alert::sink::{build_notifiers, Notifier};
use liquidity_watch::alert::telegram::TelegramClient;
use liquidity_watch::config::{parse_address, AdapterConfig, Config};
use liquidity_watch::logging::init_tracing;
use liquidity_watch::output::json::render_json;
use liquidity_watch::output::table::{render_chats_table, render_cycle, render_readings_table};
use liquidity_watch::scheduler::{Scheduler, Trigger};
use liquidity_watch::sources::aave::AaveSource;
use liquidity_watch::sources::SourceRegistry;
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "liquidity-watch",
    about = "Utilization and yield alerts for AAVE V3 reserves and Morpho vaults"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll on the configured interval and send the daily digest until Ctrl-C.
    Run,
    /// Fetch every entity once and print the readings.
    Once {
        /// Run a full alert cycle, including notifications.
        #[arg(long)]
        notify: bool,
    },
    /// Build the daily digest now.
    Digest {
        #[arg(long)]
        dry_run: bool,
    },
    /// Send a test message through every configured sink.
    NotifyTest,
    /// List chats the Telegram bot has seen recently.
    ChatIds,
    /// Check the RPC endpoint and the configured AAVE pool contracts.
    CheckRpc,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::read(Some(config_path.as_path()))?;
    init_tracing(&config.logging)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    if !matches!(cli.command, Commands::Config { .. }) {
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", config_path.display()))?;
    }

    match &cli.command {
        Commands::Run => {
            let scheduler = build_scheduler(&config, build_notifiers(&config)?)?;
            scheduler.run().await;
        }
        Commands::Once { notify } => {
            let notifiers = if *notify {
                build_notifiers(&config)?
            } else {
                Vec::new()
            };
            let scheduler = build_scheduler(&config, notifiers)?;
            if *notify {
                let report = scheduler.run_alert_cycle(Trigger::Manual).await;
                match cli.output {
                    OutputFormat::Table => {
                        println!("{}", render_cycle(&report, &config.alerts.thresholds));
                        println!(
                            "alerts dispatched: {}, deliveries ok: {}, failed: {}",
                            report.dispatched(),
                            report.delivery.delivered,
                            report.delivery.failed
                        );
                    }
                    OutputFormat::Json => println!("{}", render_json(&report)?),
                }
            } else {
                let collected = scheduler.collect().await;
                match cli.output {
                    OutputFormat::Table => {
                        println!(
                            "{}",
                            render_readings_table(&collected.assessments, &config.alerts.thresholds)
                        );
                        for failure in &collected.failures {
                            println!("{}: {}", failure.display_name, failure.reason);
                        }
                    }
                    OutputFormat::Json => println!("{}", render_json(&collected)?),
                }
            }
        }
        Commands::Digest { dry_run } => {
            if *dry_run {
                let scheduler = build_scheduler(&config, Vec::new())?;
                let collected = scheduler.collect().await;
                let message = scheduler.digest_text(&collected, Utc::now());
                match cli.output {
                    OutputFormat::Table => println!("{message}"),
                    OutputFormat::Json => println!(
                        "{}",
                        render_json(&json!({ "collected": collected, "message": message }))?
                    ),
                }
            } else {
                let scheduler = build_scheduler(&config, build_notifiers(&config)?)?;
                let report = scheduler.run_digest().await;
                match cli.output {
                    OutputFormat::Table => println!(
                        "digest sent to {} sink(s), {} failed",
                        report.delivery.delivered, report.delivery.failed
                    ),
                    OutputFormat::Json => println!("{}", render_json(&report)?),
                }
            }
        }
        Commands::NotifyTest => {
            let notifiers = build_notifiers(&config)?;
            if notifiers.is_empty() {
                bail!("no notification sinks configured");
            }
            let offset = config
                .utc_offset()
                .ok_or_else(|| anyhow!("invalid utc offset"))?;
            let message = test_message(&format_timestamp(Utc::now(), offset));
            send_to_all(&notifiers, &message).await?;
        }
        Commands::ChatIds => {
            let token = config.telegram.bot_token.trim();
            if token.is_empty() {
                bail!("telegram.bot_token (or TELEGRAM_BOT_TOKEN) is required");
            }
            let chats = TelegramClient::new(token)?
                .recent_chats()
                .await
                .context("getUpdates failed")?;
            if chats.is_empty() {
                println!("No chats found. Send a message to the bot or add it to a group, then retry.");
                return Ok(());
            }
            match cli.output {
                OutputFormat::Table => println!("{}", render_chats_table(&chats)),
                OutputFormat::Json => println!("{}", render_json(&chats)?),
            }
        }
        Commands::CheckRpc => check_rpc(&config, cli.output).await?,
        Commands::Config { init, show } => {
            handle_config_command(*init, *show, &config, &config_path)?
        }
    }
    Ok(())
}

fn build_scheduler(config: &Config, notifiers: Vec<Arc<dyn Notifier>>) -> Result<Scheduler> {
    let registry = SourceRegistry::from_config(config)?;
    Ok(Scheduler::from_config(config, registry, notifiers)?)
}

async fn send_to_all(notifiers: &[Arc<dyn Notifier>], message: &str) -> Result<()> {
    let mut failures = 0;
    for notifier in notifiers {
        match notifier.send(message).await {
            Ok(()) => info!(sink = notifier.name(), "test message sent"),
            Err(err) => {
                failures += 1;
                warn!(sink = notifier.name(), "failed sending test message: {err}");
            }
        }
    }
    if failures == notifiers.len() {
        bail!("test message was not delivered by any sink");
    }
    Ok(())
}

async fn check_rpc(config: &Config, format: OutputFormat) -> Result<()> {
    if config.rpc.url.trim().is_empty() {
        bail!("rpc.url (or RPC_URL) is not set");
    }
    let source = AaveSource::connect(&config.rpc.url)?;
    let chain_id = source.chain_id().await?;

    let mut pools = Vec::new();
    for entity in &config.entities {
        let AdapterConfig::Aave { pool, .. } = &entity.adapter else {
            continue;
        };
        let address = parse_address(&entity.id, "pool", pool)?;
        let code_size = source.code_size(address).await?;
        pools.push(json!({
            "entity": entity.id,
            "pool": address.to_string(),
            "code_bytes": code_size,
            "deployed": code_size > 0,
        }));
    }

    match format {
        OutputFormat::Table => {
            println!("chain id: {chain_id}");
            for pool in &pools {
                let marker = if pool["deployed"].as_bool().unwrap_or(false) {
                    "✅"
                } else {
                    "❌ no contract code"
                };
                println!(
                    "{} {}: {} bytes {marker}",
                    pool["entity"].as_str().unwrap_or_default(),
                    pool["pool"].as_str().unwrap_or_default(),
                    pool["code_bytes"]
                );
            }
        }
        OutputFormat::Json => println!(
            "{}",
            render_json(&json!({ "chain_id": chain_id, "pools": pools }))?
        ),
    }
    Ok(())
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)
            .with_context(|| format!("failed writing {}", config_path.display()))?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(&config.redacted())?);
    }
    Ok(())
}
