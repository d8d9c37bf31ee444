use alloy::primitives::{Address, U256};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use snipe_bot::Sniper;
use snipe_chain::NodeClient;
use snipe_core::config::AppConfig;
use snipe_core::units::{to_display_unit, to_display_unit_with, to_smallest_unit};
use snipe_core::utils::parse_address;
use snipe_executor::{BuyOutcome, BuyReport};
use std::future::Future;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/bsc.toml";

#[derive(Parser)]
#[command(name = "sniper", version, about = "PancakeSwap v2 token sniper")]
struct Cli {
    /// Hex signing key. Defaults to the variable named by `executor.private_key_env`.
    #[arg(long = "private-key", visible_alias = "pk", global = true)]
    private_key: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Buy a token with native currency right away.
    #[command(visible_alias = "b")]
    Buy {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,
        #[arg(short = 't', long, visible_alias = "token")]
        contract: String,
        /// Amount of native currency to spend, e.g. 0.05
        #[arg(long)]
        amount: String,
    },
    /// Log pair creations on the factory.
    Watch {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Buy a token as soon as it is paired with the wrapped native currency.
    Snipe {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,
        #[arg(short = 't', long, visible_alias = "token")]
        contract: String,
        #[arg(long)]
        amount: String,
    },
    PrintConfig {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,
    },
}

enum Action {
    Buy { token: Address, budget: U256 },
    Watch { token: Option<Address> },
    Snipe { token: Address, budget: U256 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, action) = match cli.command {
        Commands::PrintConfig { config } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let json = serde_json::to_string_pretty(&cfg)?;
            println!("{json}");
            return Ok(());
        }
        Commands::Buy {
            config,
            contract,
            amount,
        } => (
            config,
            Action::Buy {
                token: parse_address(&contract)?,
                budget: to_smallest_unit(&amount)?,
            },
        ),
        Commands::Watch { config, token } => (
            config,
            Action::Watch {
                token: token.as_deref().map(parse_address).transpose()?,
            },
        ),
        Commands::Snipe {
            config,
            contract,
            amount,
        } => (
            config,
            Action::Snipe {
                token: parse_address(&contract)?,
                budget: to_smallest_unit(&amount)?,
            },
        ),
    };

    let cfg = AppConfig::load(&config)?;
    init_tracing(&cfg.observability.log_level);
    let key = match cli.private_key {
        Some(key) => key,
        None => std::env::var(&cfg.executor.private_key_env).map_err(|_| {
            anyhow!(
                "no private key: pass --private-key or set {}",
                cfg.executor.private_key_env
            )
        })?,
    };

    let client = NodeClient::connect(&cfg.chain, &key).await?;
    drop(key);
    let result = run(&cfg, &client, action).await;
    client.close();
    result?;

    info!("done");
    Ok(())
}

async fn run(cfg: &AppConfig, client: &NodeClient, action: Action) -> Result<()> {
    let sniper = Sniper::new(cfg, client)?;
    let work = async {
        match action {
            Action::Buy { token, budget } => print_report(&sniper.buy(token, budget).await?),
            Action::Watch { token } => sniper.watch(token).await?,
            Action::Snipe { token, budget } => print_report(&sniper.snipe(token, budget).await?),
        }
        Ok::<_, anyhow::Error>(())
    };
    until_interrupted(work, signal::ctrl_c()).await
}

/// Runs `work` unless `interrupt` fires first, in which case the command
/// fails so an aborted buy can't exit as a success.
async fn until_interrupted<I: Future>(
    work: impl Future<Output = Result<()>>,
    interrupt: I,
) -> Result<()> {
    tokio::select! {
        result = work => result,
        _ = interrupt => {
            warn!("interrupted");
            Err(anyhow!("interrupted"))
        }
    }
}

fn print_report(report: &BuyReport) {
    println!("tx:       {}", report.tx.hash);
    println!("status:   {}", report.settlement.status.as_str());
    println!("spent:    {}", to_display_unit(report.spent));
    println!("min out:  {}", report.min_amount_out);
    match &report.outcome {
        BuyOutcome::Filled {
            holdings: Some(held),
            ..
        } => println!(
            "balance:  {} {}",
            to_display_unit_with(held.balance, held.decimals),
            held.name
        ),
        BuyOutcome::Filled {
            reporting_error: Some(err),
            ..
        } => println!("balance:  unavailable ({err})"),
        BuyOutcome::Filled { .. } => println!("balance:  unavailable"),
        BuyOutcome::Reverted => println!("received: 0"),
    }
}

fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        Err(_) => EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn buy_accepts_aliases_and_global_key() {
        let cli = Cli::try_parse_from([
            "sniper", "b", "--token", "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c", "--amount",
            "0.5", "--pk", "0xabc",
        ])
        .unwrap();
        assert_eq!(cli.private_key.as_deref(), Some("0xabc"));
        match cli.command {
            Commands::Buy {
                config,
                contract,
                amount,
            } => {
                assert_eq!(config, DEFAULT_CONFIG);
                assert_eq!(contract, "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");
                assert_eq!(amount, "0.5");
            }
            _ => panic!("expected buy"),
        }
    }

    #[test]
    fn watch_token_is_optional() {
        let cli = Cli::try_parse_from(["sniper", "watch"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { token: None, .. }));
    }

    #[tokio::test]
    async fn interrupt_fails_the_command() {
        let err = until_interrupted(std::future::pending(), std::future::ready(()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "interrupted");
    }

    #[tokio::test]
    async fn finished_work_wins_over_pending_interrupt() {
        let result = until_interrupted(async { Ok(()) }, std::future::pending::<()>()).await;
        assert!(result.is_ok());
    }
}
