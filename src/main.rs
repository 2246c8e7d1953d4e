use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use trade_journal::analytics::{
    round_for_display, t_track_points, t_track_score, DailyTradeData, JournalAnalytics,
    RATIO_SENTINEL,
};
use trade_journal::config::AnalyticsConfig;
use trade_journal::database::SqliteTradeStore;
use trade_journal::store::{JsonTradeStore, TradeStore};
use trade_journal::JournalService;

#[derive(Parser)]
#[command(name = "trade-journal")]
#[command(version = "0.1.0")]
#[command(about = "Performance analytics for a trading journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Read trades from this JSON export instead of the database
    #[arg(long, global = true)]
    trades_file: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full performance report for a user
    Report {
        #[arg(short, long)]
        user: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Daily P&L calendar for one month
    Calendar {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        year: i32,
        #[arg(short, long)]
        month: u32,
    },
    /// Cumulative P&L and R per closed trade
    Equity {
        #[arg(short, long)]
        user: String,
    },
    /// T-Track grade for a win rate and profit factor
    Score {
        /// Win rate in percent (0-100)
        #[arg(short, long)]
        win_rate: f64,
        #[arg(short, long)]
        profit_factor: f64,
    },
    /// Copy a JSON trade export into the database
    Import {
        /// JSON file holding an array of trades
        #[arg(short, long)]
        file: String,
        /// Assign every imported trade to this user
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose when set
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = AnalyticsConfig::load(&cli.config)?;
    if let Some(file) = cli.trades_file {
        config.store.trades_file = Some(file);
    }
    let policy = config
        .bucket_policy()
        .map_err(|errors| anyhow!("Invalid configuration: {}", errors.join(", ")))?;
    let analytics = JournalAnalytics::new(policy);

    match cli.command {
        Commands::Report { user, json } => {
            let service = JournalService::new(open_store(&config).await?, analytics);
            let report = service.report_for_user(&user).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print_summary();
            }
        }
        Commands::Calendar { user, year, month } => {
            if !(1..=12).contains(&month) {
                return Err(anyhow!("Month must be between 1 and 12"));
            }
            let service = JournalService::new(open_store(&config).await?, analytics);
            let days = service.calendar_for_user(&user, year, month).await?;
            print_calendar(year, month, &days);
        }
        Commands::Equity { user } => {
            let service = JournalService::new(open_store(&config).await?, analytics);
            let curve = service.equity_curve_for_user(&user).await?;
            if curve.is_empty() {
                println!("No closed trades yet");
            }
            for point in &curve {
                println!(
                    "#{:<4} {}  P&L ${:>12.2}  R {:>8.2}",
                    point.trade_number,
                    point.date.format("%Y-%m-%d %H:%M"),
                    round_for_display(point.pnl, 2),
                    round_for_display(point.r_multiple, 2)
                );
            }
        }
        Commands::Score { win_rate, profit_factor } => {
            let win_rate = Decimal::try_from(win_rate)?;
            let profit_factor = Decimal::try_from(profit_factor)?.min(RATIO_SENTINEL);
            println!(
                "T-Track: {} ({:.2} points)",
                t_track_score(win_rate, profit_factor),
                round_for_display(t_track_points(win_rate, profit_factor), 2)
            );
        }
        Commands::Import { file, user } => {
            import_trades(&config, &file, user.as_deref()).await?;
        }
    }

    Ok(())
}

async fn open_store(config: &AnalyticsConfig) -> Result<Box<dyn TradeStore>> {
    match &config.store.trades_file {
        Some(path) => {
            info!("Reading trades from {}", path);
            Ok(Box::new(JsonTradeStore::new(path)))
        }
        None => Ok(Box::new(SqliteTradeStore::new(&config.store.database_url).await?)),
    }
}

async fn import_trades(config: &AnalyticsConfig, file: &str, user: Option<&str>) -> Result<()> {
    let mut trades = JsonTradeStore::new(file).load_all().await?;
    if trades.is_empty() {
        warn!("{} holds no trades", file);
        return Ok(());
    }

    if let Some(user) = user {
        for trade in &mut trades {
            trade.user_id = user.to_string();
        }
    }

    let unowned = trades.iter().filter(|t| t.user_id.is_empty()).count();
    if unowned > 0 {
        return Err(anyhow!(
            "{} trades have no userId; pass --user to assign them",
            unowned
        ));
    }

    let db = SqliteTradeStore::new(&config.store.database_url).await?;
    let stored = db.insert_trades(&trades).await?;
    info!("Imported {} trades into {}", stored, config.store.database_url);
    Ok(())
}

fn print_calendar(year: i32, month: u32, days: &[DailyTradeData]) {
    println!("\n=== {}-{:02} ===", year, month);
    if days.is_empty() {
        println!("No closed trades this month");
        return;
    }

    for day in days {
        let tier = if day.has_signal() { day.performance.as_str() } else { "-" };
        println!(
            "{}  {:>3} trades  {:>5.1}% win  ${:>10.2}  {}",
            day.date,
            day.trade_count,
            round_for_display(day.win_rate, 1),
            round_for_display(day.pnl, 2),
            tier
        );
    }

    let total = days
        .iter()
        .fold(Decimal::ZERO, |acc, d| acc.saturating_add(d.pnl));
    println!("Month total: ${:.2}", round_for_display(total, 2));
}
