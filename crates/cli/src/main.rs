use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod paths;

use commands::{Context, CreditCommands};
use paths::CashwisePaths;

#[derive(Parser)]
#[command(
    name = "cashwise",
    version,
    about = "Personal cash-flow analysis: duplicates, recurring payments, budgets and debt payoff",
    long_about = "Cashwise imports bank CSV exports into a local SQLite ledger, flags \
                  likely duplicates, mines recurring payments, projects the coming \
                  months and plans debt payoff with the avalanche method."
)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true, env = "CASHWISE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, env = "CASHWISE_DB")]
    db: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a bank CSV export
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Name of a [[profiles]] entry in the config
        #[arg(short, long)]
        profile: String,
        /// Account the rows belong to
        #[arg(short, long, default_value = "1")]
        account: i64,
    },

    /// List likely duplicate transactions
    #[command(alias = "dups")]
    Duplicates,

    /// Detect recurring payments in the stored history
    Detect {
        /// Store patterns at or above the configured confidence threshold
        #[arg(long)]
        save: bool,
    },

    /// List stored and configured recurring patterns
    Patterns {
        /// Deactivate a stored pattern before listing
        #[arg(long, value_name = "ID")]
        deactivate: Option<i64>,
    },

    /// Show this month's budget and the next three months
    Budget {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Recommend savings, investment and debt payments
    Recommend {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
        /// Current emergency fund balance; remembered for later runs
        #[arg(long)]
        emergency_fund: Option<String>,
    },

    /// Credit and loan management
    #[command(subcommand)]
    Credit(CreditCommands),

    /// Show resolved config and database paths
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = CashwisePaths::resolve(cli.config, cli.db)?;

    if let Commands::Paths = cli.command {
        output::print_paths(&paths, cli.json)?;
        return Ok(());
    }

    let ctx = Context::open(&paths, cli.json).await?;
    let today_or_now = |today: Option<NaiveDate>| {
        today.unwrap_or_else(|| chrono::Local::now().date_naive())
    };

    match cli.command {
        Commands::Import {
            file,
            profile,
            account,
        } => commands::import(&ctx, &file, &profile, account).await?,
        Commands::Duplicates => commands::duplicates(&ctx).await?,
        Commands::Detect { save } => commands::detect(&ctx, save).await?,
        Commands::Patterns { deactivate } => commands::patterns(&ctx, deactivate).await?,
        Commands::Budget { today } => commands::budget(&ctx, today_or_now(today)).await?,
        Commands::Recommend {
            today,
            emergency_fund,
        } => {
            commands::recommend(&ctx, today_or_now(today), emergency_fund.as_deref()).await?
        }
        Commands::Credit(cmd) => commands::credit(&ctx, cmd).await?,
        Commands::Paths => {}
    }

    ctx.db.close().await;
    Ok(())
}
