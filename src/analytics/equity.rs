use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{closed_chronological, ratio_or_zero};
use crate::types::Trade;

/// Risk assumed per trade when converting P/L into R: 2% of the entry price.
/// Trades carry no stop distance, so this stands in for real per-trade risk.
pub const ASSUMED_RISK_FRACTION: Decimal = dec!(0.02);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityDataPoint {
    pub date: DateTime<Utc>,
    pub pnl: Decimal,
    pub r_multiple: Decimal,
    pub trade_number: u64,
}

fn r_multiple(pnl: Decimal, entry_price: Decimal) -> Decimal {
    // Zero when the entry price leaves no risk or the quotient overflows
    ratio_or_zero(pnl, entry_price * ASSUMED_RISK_FRACTION)
}

/// Cumulative P/L and R, one point per closed trade in exit order. Empty
/// when nothing has closed.
pub fn build_equity_curve(trades: &[Trade]) -> Vec<EquityDataPoint> {
    let mut running_pnl = Decimal::ZERO;
    let mut running_r = Decimal::ZERO;

    closed_chronological(trades)
        .into_iter()
        .enumerate()
        .map(|(idx, closed)| {
            running_pnl = running_pnl.saturating_add(closed.pnl);
            running_r = running_r.saturating_add(r_multiple(closed.pnl, closed.trade.entry_price));
            EquityDataPoint {
                date: closed.exit_date,
                pnl: running_pnl,
                r_multiple: running_r,
                trade_number: idx as u64 + 1,
            }
        })
        .collect()
}
