//! stake-cli: inspect stake policies, positions and quotes from a terminal.
//!
//! The wallet is watch-only: quotes are printed, never approved.

mod wallet;

use alloy_primitives::Address;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use stake_plugin::{PluginConfig, StakePlugin};
use stake_policies::{ChangeQuoteRequest, StakePositionRequest};
use stake_types::{NativeAmount, PositionAllocation, QuoteAllocation, StakeAction, Timestamp};
use stake_utils::{format_duration, init_logging};

use crate::wallet::WatchOnlyWallet;

#[derive(Parser)]
#[command(name = "stake-cli", about = "Staking quote and position inspector")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long, env = "STAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error". Overrides the file.
    #[arg(long, env = "STAKE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List the enabled stake policies.
    Policies,

    /// Show a wallet's position in one policy.
    Position {
        #[arg(long)]
        policy: String,
        #[arg(long)]
        address: Address,
    },

    /// Preview the allocations and fee of an action.
    Quote {
        #[arg(long)]
        policy: String,
        /// "stake", "unstake" or "claim".
        #[arg(long)]
        action: StakeAction,
        #[arg(long)]
        currency: String,
        /// Smallest-unit integer amount.
        #[arg(long, default_value = "0")]
        amount: NativeAmount,
        #[arg(long)]
        address: Address,
    },
}

/// A position allocation plus how long until it unlocks.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocationView<'a> {
    #[serde(flatten)]
    allocation: &'a PositionAllocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    unlocks_in: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PositionView<'a> {
    allocations: Vec<AllocationView<'a>>,
    can_stake: bool,
    can_unstake: bool,
    can_claim: bool,
}

#[derive(Serialize)]
struct QuoteView<'a> {
    allocations: &'a [QuoteAllocation],
}

fn unlocks_in(locktime: Option<Timestamp>, now: Timestamp) -> Option<String> {
    locktime
        .filter(|t| t.is_after(now))
        .map(|t| format_duration(t.as_secs() - now.as_secs()))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PluginConfig::from_toml_file(path)?,
        None => PluginConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logging(config.log_format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let plugin = StakePlugin::new(&config)?;

    match cli.command {
        Command::Policies => print_json(&plugin.get_stake_policies())?,
        Command::Position { policy, address } => {
            let details = plugin
                .fetch_stake_details(StakePositionRequest {
                    stake_policy_id: policy,
                    wallet: WatchOnlyWallet::shared(address),
                })
                .await?;
            let now = Timestamp::now();
            let position = &details.position;
            print_json(&PositionView {
                allocations: position
                    .allocations
                    .iter()
                    .map(|allocation| AllocationView {
                        allocation,
                        unlocks_in: unlocks_in(allocation.locktime, now),
                    })
                    .collect(),
                can_stake: position.can_stake,
                can_unstake: position.can_unstake,
                can_claim: position.can_claim,
            })?;
        }
        Command::Quote {
            policy,
            action,
            currency,
            amount,
            address,
        } => {
            let quote = plugin
                .fetch_change_quote(ChangeQuoteRequest {
                    action,
                    stake_policy_id: policy,
                    currency_code: currency,
                    token_id: None,
                    native_amount: amount,
                    wallet: WatchOnlyWallet::shared(address),
                })
                .await?;
            print_json(&QuoteView {
                allocations: &quote.allocations,
            })?;
        }
    }

    Ok(())
}
