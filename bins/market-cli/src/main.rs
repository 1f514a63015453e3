//! Prediction market deployment CLI
//!
//! Commands:
//! - `deploy`: Deploy a market from a form JSON file and register it with the catalog
//! - `gas`: Show the gas price a deployment would use
//! - `ids`: Compute question and condition ids locally
//! - `slug`: Show the catalog slug for a title
//! - `whoami`: Show the catalog user behind MARKET_CATALOG_TOKEN
//! - `balance`: Show the signing wallet's native balance
//!
//! # Usage
//! ```bash
//! # Deploy (requires env vars)
//! MARKET_ENVIRONMENT=mainnet MARKET_PRIVATE_KEY=0x... MARKET_CATALOG_TOKEN=...
//! market_cli deploy --form market.json
//!
//! # Deploy with a fixed gas price, skip catalog registration
//! market_cli deploy --form market.json --gas-gwei 45 --skip-catalog
//!
//! # Ids for a question
//! market_cli ids --title "Will it rain tomorrow?" --description "..." --outcomes 2
//! ```

use alloy_primitives::utils::format_ether;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

use market_deployer::catalog::{slugify, CatalogClient};
use market_deployer::chain::RpcChain;
use market_deployer::creation::MarketCreation;
use market_deployer::form::MarketForm;
use market_deployer::gas::{GasPriceResolver, GasStationClient};
use market_deployer::network::{Environment, NetworkConfig};
use market_deployer::session::{Session, SessionCredentials};
use market_deployer::{identity, parse_address, DeployPhase, WEI_PER_GWEI};

#[derive(Parser)]
#[command(name = "market_cli")]
#[command(about = "Prediction market deployment CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Network (mainnet, mumbai); defaults to MARKET_ENVIRONMENT
    #[arg(long, global = true)]
    environment: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a market (requires MARKET_PRIVATE_KEY, and MARKET_CATALOG_TOKEN unless --skip-catalog)
    Deploy {
        /// Market form JSON file
        #[arg(long)]
        form: PathBuf,

        /// Gas price in gwei (overrides the form; 0 = resolve automatically)
        #[arg(long)]
        gas_gwei: Option<Decimal>,

        /// Deploy only, do not register with the catalog
        #[arg(long, default_value = "false")]
        skip_catalog: bool,
    },

    /// Show the gas price a deployment would use
    Gas {
        /// User gas price in gwei (skips the network lookups)
        #[arg(long)]
        gas_gwei: Option<Decimal>,
    },

    /// Compute question and condition ids
    Ids {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Oracle address (default: the network's default oracle)
        #[arg(long)]
        oracle: Option<String>,

        /// Number of outcomes
        #[arg(long, default_value = "2")]
        outcomes: usize,
    },

    /// Show the catalog slug for a title
    Slug {
        #[arg(long)]
        title: String,
    },

    /// Show the catalog user for MARKET_CATALOG_TOKEN
    Whoami,

    /// Show the native balance of the MARKET_PRIVATE_KEY wallet
    Balance,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();

    match cli.command {
        Commands::Deploy { form, gas_gwei, skip_catalog } => {
            let network = load_network(cli.environment.as_deref())?;
            run_deploy(network, form, gas_gwei, skip_catalog).await
        }
        Commands::Gas { gas_gwei } => {
            let network = load_network(cli.environment.as_deref())?;
            run_gas(network, gas_gwei).await
        }
        Commands::Ids { title, description, oracle, outcomes } => {
            let network = load_network(cli.environment.as_deref())?;
            run_ids(network, &title, &description, oracle.as_deref(), outcomes)
        }
        Commands::Slug { title } => {
            println!("{}", slugify(&title));
            Ok(())
        }
        Commands::Whoami => {
            let network = load_network(cli.environment.as_deref())?;
            run_whoami(network).await
        }
        Commands::Balance => {
            let network = load_network(cli.environment.as_deref())?;
            run_balance(network).await
        }
    }
}

fn load_network(environment: Option<&str>) -> Result<NetworkConfig> {
    let network = match environment {
        Some(name) => {
            let environment: Environment = name.parse()?;
            NetworkConfig::for_environment(environment).with_overrides(|key| std::env::var(key).ok())?
        }
        None => NetworkConfig::from_env()?,
    };

    info!("Network: {} (chain {}, rpc {})", network.environment, network.chain_id, network.rpc_url);
    Ok(network)
}

async fn run_deploy(
    network: NetworkConfig,
    form_path: PathBuf,
    gas_gwei: Option<Decimal>,
    skip_catalog: bool,
) -> Result<()> {
    info!("=== Deploy Market ===");
    info!("Form: {}", form_path.display());

    let raw = tokio::fs::read_to_string(&form_path)
        .await
        .with_context(|| format!("Failed to read {}", form_path.display()))?;
    let mut form: MarketForm = serde_json::from_str(&raw).context("Failed to parse market form")?;
    if let Some(gwei) = gas_gwei {
        form.user_defined_gas = gwei;
    }

    let problems = form.problems();
    if !problems.is_empty() {
        for problem in &problems {
            warn!("Form problem: {}", problem);
        }
        anyhow::bail!("market form has {} problem(s)", problems.len());
    }

    let credentials = SessionCredentials::from_env().context("MARKET_PRIVATE_KEY is not set")?;
    let session = Session::from_credentials(network, credentials)?;
    if !skip_catalog && !session.has_token() {
        warn!("MARKET_CATALOG_TOKEN is not set; the market will deploy but not be registered");
    }
    match session.balance().await {
        Ok(balance) if balance.is_zero() => {
            warn!("Wallet {} has no native balance to pay gas", session.signer_address())
        }
        Ok(balance) => info!("Wallet {} balance: {}", session.signer_address(), format_ether(balance)),
        Err(e) => warn!("{:#}", e),
    }

    let mut creation = MarketCreation::new(session, GasStationClient::new()?);
    if skip_catalog {
        info!("Catalog registration skipped");
    } else {
        let catalog = CatalogClient::new(creation.session().network().require_catalog_url()?)?;
        creation = creation.with_catalog(catalog);
    }

    let mut phases = creation.deployer().subscribe();
    let watcher = tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase = phases.borrow_and_update().clone();
            log_phase(&phase);
            if phase.is_terminal() {
                break;
            }
        }
    });

    let result = tokio::select! {
        result = creation.submit(&form) => result,
        _ = tokio::signal::ctrl_c() => {
            let phase = creation.deployer().phase();
            warn!("Interrupted during {:?}; submitted transactions may still confirm", phase);
            if let Some(tx) = phase.committed_condition() {
                warn!("Condition already prepared in tx {}", tx);
            }
            anyhow::bail!("interrupted");
        }
    };

    let explorer = creation.session().network().clone();
    let session = creation.into_session();
    watcher.await.ok();
    session.close();

    let outcome = result?;

    let registration = match &outcome.registration {
        None => json!("skipped"),
        Some(Ok(response)) => json!({"status": response.status, "body": response.body}),
        Some(Err(e)) => json!({"error": e.to_string()}),
    };
    let summary = json!({
        "marketMakerAddress": outcome.market_maker().to_checksum(None),
        "explorer": explorer.explorer_address_url(outcome.market_maker()),
        "prepareTx": outcome.deployment.prepare_tx.to_string(),
        "createTx": outcome.deployment.create_tx.to_string(),
        "registration": registration,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(Err(e)) = &outcome.registration {
        warn!("Market is live on-chain but missing from the catalog: {}", e);
    }

    Ok(())
}

fn log_phase(phase: &DeployPhase) {
    match phase {
        DeployPhase::NotStarted => {}
        DeployPhase::PreparingCondition => info!("[1/2] Preparing condition..."),
        DeployPhase::PreparedConfirmed { prepare_tx } => {
            info!("[1/2] Condition prepared: {}", prepare_tx)
        }
        DeployPhase::CreatingMarketMaker { .. } => info!("[2/2] Creating market maker..."),
        DeployPhase::Deployed(deployment) => {
            info!("[2/2] Market maker deployed: {}", deployment.market_maker)
        }
        DeployPhase::Failed { stage, committed, message } => {
            warn!("{} failed: {}", stage, message);
            if let Some(tx) = committed {
                warn!("Condition remains prepared (tx {})", tx);
            }
        }
    }
}

async fn run_gas(network: NetworkConfig, gas_gwei: Option<Decimal>) -> Result<()> {
    info!("=== Gas Price ===");

    let chain = RpcChain::read_only(&network.rpc_url, network.contracts)?;
    let resolver =
        GasPriceResolver::standard(gas_gwei, GasStationClient::new()?, std::sync::Arc::new(chain));

    let wei = resolver.resolve().await?;
    let gwei = format_gwei(wei);

    println!("{}", serde_json::to_string_pretty(&json!({"wei": wei.to_string(), "gwei": gwei}))?);
    Ok(())
}

/// wei -> gwei string, exact when it fits a Decimal, whole gwei otherwise
fn format_gwei(wei: u128) -> String {
    i128::try_from(wei)
        .ok()
        .and_then(|wei| Decimal::try_from_i128_with_scale(wei, 9).ok())
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|| format!("{}", wei / WEI_PER_GWEI))
}

fn run_ids(
    network: NetworkConfig,
    title: &str,
    description: &str,
    oracle: Option<&str>,
    outcomes: usize,
) -> Result<()> {
    let oracle = match oracle {
        Some(value) => parse_address(value)?,
        None => network.contracts.default_oracle,
    };

    let question_id = identity::question_id(title, description);
    let condition_id = identity::condition_id(oracle, question_id, outcomes);

    let ids = json!({
        "questionId": question_id.to_string(),
        "conditionId": condition_id.to_string(),
        "oracle": oracle.to_checksum(None),
        "outcomeCount": outcomes,
        "slug": slugify(title),
    });
    println!("{}", serde_json::to_string_pretty(&ids)?);
    Ok(())
}

async fn run_whoami(network: NetworkConfig) -> Result<()> {
    let token = std::env::var("MARKET_CATALOG_TOKEN").context("MARKET_CATALOG_TOKEN is not set")?;
    let catalog = CatalogClient::new(network.require_catalog_url()?)?;

    info!("GET {}/users/me", catalog.base_url());
    let user = catalog.current_user(&token).await?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

async fn run_balance(network: NetworkConfig) -> Result<()> {
    let credentials = SessionCredentials::from_env().context("MARKET_PRIVATE_KEY is not set")?;
    let session = Session::from_credentials(network, credentials)?;

    let balance = session.balance().await?;
    let summary = json!({
        "address": session.signer_address().to_checksum(None),
        "wei": balance.to_string(),
        "native": format_ether(balance),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    session.close();
    Ok(())
}
