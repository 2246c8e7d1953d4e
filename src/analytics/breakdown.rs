use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::metrics::profit_factor;
use super::{percent, ratio_or_zero, saturating_total, share_percent};
use super::rollup::BucketPolicy;
use crate::types::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMetrics {
    pub symbol: String,
    pub trades: u64,
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    pub avg_pnl: Decimal,
    pub contribution_pct: Decimal,
    pub profit_factor: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayStats {
    pub day: String,
    pub trades: u64,
    pub win_rate: Decimal,
    pub avg_pnl: Decimal,
}

/// Per-instrument results, best performer first
pub fn symbol_breakdown(trades: &[Trade]) -> Vec<SymbolMetrics> {
    let mut groups: HashMap<&str, Vec<Decimal>> = HashMap::new();
    for trade in trades {
        if let Some((pnl, _)) = trade.realized() {
            groups.entry(trade.symbol.as_str()).or_default().push(pnl);
        }
    }

    let total_pnl = saturating_total(groups.values().flatten().copied());

    let mut metrics: Vec<SymbolMetrics> = groups
        .into_iter()
        .map(|(symbol, pnls)| {
            let count = pnls.len() as u64;
            let wins = pnls.iter().filter(|p| **p > Decimal::ZERO).count() as u64;
            let symbol_pnl = saturating_total(pnls.iter().copied());
            let gross_profit = saturating_total(pnls.iter().copied().filter(|p| *p > Decimal::ZERO));
            let gross_loss = saturating_total(
                pnls.iter()
                    .filter(|p| **p < Decimal::ZERO)
                    .map(|p| p.abs()),
            );

            SymbolMetrics {
                symbol: symbol.to_string(),
                trades: count,
                win_rate: percent(wins, count),
                total_pnl: symbol_pnl,
                avg_pnl: ratio_or_zero(symbol_pnl, Decimal::from(count)),
                contribution_pct: share_percent(symbol_pnl, total_pnl),
                profit_factor: profit_factor(gross_profit, gross_loss),
            }
        })
        .collect();

    metrics.sort_by(|a, b| {
        b.total_pnl
            .cmp(&a.total_pnl)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    metrics
}

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Seven rows, Monday first, keyed on the exit day in the bucket offset
pub fn weekday_breakdown(trades: &[Trade], policy: &BucketPolicy) -> Vec<WeekdayStats> {
    let mut buckets: [Vec<Decimal>; 7] = Default::default();
    for trade in trades {
        if let Some((pnl, exit)) = trade.realized() {
            let idx = policy.local_date(exit).weekday().num_days_from_monday() as usize;
            buckets[idx].push(pnl);
        }
    }

    DAYS.iter()
        .zip(buckets.iter())
        .map(|(name, pnls)| {
            let count = pnls.len() as u64;
            let wins = pnls.iter().filter(|p| **p > Decimal::ZERO).count() as u64;
            let avg_pnl = ratio_or_zero(saturating_total(pnls.iter().copied()), Decimal::from(count));

            WeekdayStats {
                day: name.to_string(),
                trades: count,
                win_rate: percent(wins, count),
                avg_pnl,
            }
        })
        .collect()
}
