use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::breakdown::{SymbolMetrics, WeekdayStats};
use super::equity::EquityDataPoint;
use super::metrics::DashboardMetrics;
use super::rollup::{DailyTradeData, MonthlyTradeData, WeeklyTradeData};
use super::statistics::TradeStatistics;
use super::RATIO_SENTINEL;

/// Everything the dashboard shows, derived from one trade snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub metrics: DashboardMetrics,
    pub statistics: TradeStatistics,
    pub daily: Vec<DailyTradeData>,
    pub weekly: Vec<WeeklyTradeData>,
    pub monthly: Vec<MonthlyTradeData>,
    pub equity_curve: Vec<EquityDataPoint>,
    pub by_symbol: Vec<SymbolMetrics>,
    pub by_weekday: Vec<WeekdayStats>,
}

/// Half-up rounding to `dp` places. `Decimal` precision formatting truncates,
/// so console output rounds through this first.
pub fn round_for_display(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn ratio_label(value: Decimal) -> String {
    if value == RATIO_SENTINEL {
        "∞".to_string()
    } else {
        format!("{:.2}", round_for_display(value, 2))
    }
}

impl PerformanceReport {
    /// Pretty print results to console
    pub fn print_summary(&self) {
        let m = &self.metrics;
        let s = &self.statistics;

        println!("\n{}", "=".repeat(60));
        println!("                  TRADING PERFORMANCE");
        println!("{}", "=".repeat(60));
        println!("T-Track Score:      {}", m.t_track_score);
        println!("Net P&L:            ${:.2}", round_for_display(m.total_pnl, 2));
        println!("{}", "-".repeat(60));
        println!("TRADES");
        println!("  Total Trades:       {} ({} open, {} closed)", m.total_trades, m.open_trades, m.closed_trades);
        println!("  Winning Trades:     {} ({:.1}%)", m.winning_trades, round_for_display(m.win_rate, 1));
        println!("  Losing Trades:      {}", m.losing_trades);
        println!("  Scratch Trades:     {}", m.scratch_trades);
        println!("  Profit Factor:      {}", ratio_label(m.profit_factor));
        println!("  Avg Risk/Reward:    {}", ratio_label(m.avg_rr));
        println!("  Average Win:        ${:.2}", round_for_display(m.avg_win, 2));
        println!("  Average Loss:       ${:.2}", round_for_display(m.avg_loss, 2));
        println!("  Largest Win:        ${:.2}", round_for_display(m.largest_win, 2));
        println!("  Largest Loss:       ${:.2}", round_for_display(m.largest_loss, 2));
        println!("{}", "-".repeat(60));
        println!("RISK");
        println!(
            "  Max Drawdown:       ${:.2} ({:.2}%)",
            round_for_display(s.max_drawdown, 2),
            round_for_display(s.max_drawdown_percent, 2)
        );
        println!("  Recovery Factor:    {:.2}", round_for_display(s.recovery_factor, 2));
        println!("  Expectancy:         ${:.2}", round_for_display(s.expectancy, 2));
        println!("  Sharpe Ratio:       {:.2}", round_for_display(s.sharpe_ratio, 2));
        println!("  Calmar Ratio:       {:.2}", round_for_display(s.calmar_ratio, 2));
        println!("  Win Streak:         {} (max {})", s.current_win_streak, s.max_win_streak);
        println!("  Loss Streak:        {} (max {})", s.current_loss_streak, s.max_loss_streak);

        if !self.monthly.is_empty() {
            println!("{}", "-".repeat(60));
            println!("BY MONTH");
            for month in &self.monthly {
                println!(
                    "  {}-{:02}: {} trades, {:.1}% win rate, ${:.2} net P&L, PF {}",
                    month.year,
                    month.month,
                    month.trade_count,
                    round_for_display(month.win_rate, 1),
                    round_for_display(month.pnl, 2),
                    ratio_label(month.profit_factor)
                );
            }
        }

        if !self.by_symbol.is_empty() {
            println!("{}", "-".repeat(60));
            println!("BY SYMBOL");
            for stats in &self.by_symbol {
                println!(
                    "  {}: {} trades, {:.1}% win rate, ${:.2} net P&L",
                    stats.symbol,
                    stats.trades,
                    round_for_display(stats.win_rate, 1),
                    round_for_display(stats.total_pnl, 2)
                );
            }
        }
        println!("{}", "=".repeat(60));
    }
}
