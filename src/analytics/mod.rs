//! Trade journal performance analytics.
//!
//! Every function here is a pure derivation from a trade snapshot: no caching,
//! no I/O, and no arithmetic that can panic. Ratios that would be infinite are
//! reported as [`RATIO_SENTINEL`]; other results that do not fit in a
//! `Decimal` are reported as zero, and running totals saturate.

pub mod breakdown;
pub mod equity;
pub mod metrics;
pub mod report;
pub mod rollup;
pub mod score;
pub mod statistics;

pub use breakdown::*;
pub use equity::*;
pub use metrics::*;
pub use report::*;
pub use rollup::*;
pub use score::*;
pub use statistics::*;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::Trade;

/// Stand-in for an unbounded ratio (profit with no losses)
pub const RATIO_SENTINEL: Decimal = dec!(999);

/// `numerator / denominator`, or the sentinel when only the numerator is
/// positive. A quotient too large for `Decimal` is unbounded as well.
pub(crate) fn ratio_or_sentinel(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator
            .checked_div(denominator)
            .unwrap_or(RATIO_SENTINEL)
    } else if numerator > Decimal::ZERO {
        RATIO_SENTINEL
    } else {
        Decimal::ZERO
    }
}

/// `numerator / denominator`, zero on a zero divisor or overflow
pub(crate) fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// `part` as a percentage of `whole`, zero on a zero divisor or overflow
pub(crate) fn share_percent(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .and_then(|share| share.checked_mul(dec!(100)))
        .unwrap_or(Decimal::ZERO)
}

pub(crate) fn percent(part: u64, whole: u64) -> Decimal {
    share_percent(Decimal::from(part), Decimal::from(whole))
}

pub(crate) fn saturating_total(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

pub(crate) struct ClosedTrade<'a> {
    pub trade: &'a Trade,
    pub pnl: Decimal,
    pub exit_date: DateTime<Utc>,
}

/// Closed trades ordered by exit time. The sort is stable so same-instant
/// exits keep their input order.
pub(crate) fn closed_chronological(trades: &[Trade]) -> Vec<ClosedTrade<'_>> {
    let mut closed: Vec<ClosedTrade<'_>> = trades
        .iter()
        .filter_map(|trade| {
            trade.realized().map(|(pnl, exit_date)| ClosedTrade {
                trade,
                pnl,
                exit_date,
            })
        })
        .collect();
    closed.sort_by(|a, b| a.exit_date.cmp(&b.exit_date));
    closed
}

/// Runs every analytics pass over one snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct JournalAnalytics {
    policy: BucketPolicy,
}

impl JournalAnalytics {
    pub fn new(policy: BucketPolicy) -> Self {
        Self { policy }
    }

    pub fn calculate(&self, trades: &[Trade]) -> PerformanceReport {
        debug!("Computing analytics over {} trades", trades.len());

        PerformanceReport {
            metrics: compute_metrics(trades),
            statistics: compute_statistics(trades),
            daily: daily_rollup(trades, &self.policy),
            weekly: weekly_rollup(trades, &self.policy),
            monthly: monthly_rollup(trades, &self.policy),
            equity_curve: build_equity_curve(trades),
            by_symbol: symbol_breakdown(trades),
            by_weekday: weekday_breakdown(trades, &self.policy),
        }
    }

    pub fn calendar(&self, trades: &[Trade], year: i32, month: u32) -> Vec<DailyTradeData> {
        daily_rollup_for_month(trades, &self.policy, year, month)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::types::{Trade, TradeType};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap()
    }

    /// Closed trade at entry price 100 exiting `day` days after 2024-01-01
    pub fn closed_trade(pnl: Decimal, day: i64) -> Trade {
        closed_trade_at(pnl, base() + Duration::days(day))
    }

    pub fn closed_trade_at(pnl: Decimal, exit: DateTime<Utc>) -> Trade {
        let mut trade = open_trade();
        trade.entry_date = exit - Duration::hours(1);
        trade.exit_price = Some(dec!(100) + pnl);
        trade.exit_date = Some(exit);
        trade.profit_loss = Some(pnl);
        trade.is_open = false;
        trade
    }

    pub fn open_trade() -> Trade {
        Trade::open("trader-1", "AAPL", TradeType::Buy, dec!(1), dec!(100), base())
    }
}
