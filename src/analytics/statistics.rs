use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{closed_chronological, ratio_or_zero, saturating_total, share_percent};
use crate::types::{Trade, TradeOutcome};

/// Streak, drawdown and dispersion statistics over closed trades in exit order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStatistics {
    pub closed_trades: u64,
    pub total_pnl: Decimal,
    pub current_win_streak: u32,
    pub current_loss_streak: u32,
    pub max_win_streak: u32,
    pub max_loss_streak: u32,
    pub max_drawdown: Decimal,
    pub max_drawdown_percent: Decimal,
    pub recovery_factor: Decimal,
    pub expectancy: Decimal,
    /// Mean P/L over its population standard deviation. No risk-free rate,
    /// no annualization.
    pub sharpe_ratio: Decimal,
    /// Total P/L scaled by the worst peak-relative drawdown percent
    pub calmar_ratio: Decimal,
}

impl TradeStatistics {
    pub fn empty() -> Self {
        Self {
            closed_trades: 0,
            total_pnl: Decimal::ZERO,
            current_win_streak: 0,
            current_loss_streak: 0,
            max_win_streak: 0,
            max_loss_streak: 0,
            max_drawdown: Decimal::ZERO,
            max_drawdown_percent: Decimal::ZERO,
            recovery_factor: Decimal::ZERO,
            expectancy: Decimal::ZERO,
            sharpe_ratio: Decimal::ZERO,
            calmar_ratio: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct StreakCounter {
    win: u32,
    loss: u32,
    max_win: u32,
    max_loss: u32,
}

impl StreakCounter {
    // Scratches leave both counters untouched: they neither extend nor break a run.
    fn record(&mut self, outcome: TradeOutcome) {
        match outcome {
            TradeOutcome::Win => {
                self.win += 1;
                self.loss = 0;
                self.max_win = self.max_win.max(self.win);
            }
            TradeOutcome::Loss => {
                self.loss += 1;
                self.win = 0;
                self.max_loss = self.max_loss.max(self.loss);
            }
            TradeOutcome::Scratch => {}
        }
    }
}

#[derive(Debug, Default)]
struct DrawdownTracker {
    balance: Decimal,
    peak: Decimal,
    max_drawdown: Decimal,
    max_drawdown_pct: Decimal,
}

impl DrawdownTracker {
    fn record(&mut self, pnl: Decimal) {
        self.balance = self.balance.saturating_add(pnl);
        self.peak = self.peak.max(self.balance);

        let drawdown = self.peak.saturating_sub(self.balance);
        self.max_drawdown = self.max_drawdown.max(drawdown);

        if self.peak > Decimal::ZERO {
            let pct = share_percent(drawdown, self.peak);
            self.max_drawdown_pct = self.max_drawdown_pct.max(pct);
        }
    }
}

fn sharpe_like(pnls: &[Decimal]) -> Decimal {
    if pnls.is_empty() {
        return Decimal::ZERO;
    }

    let returns: Vec<f64> = pnls.iter().map(|p| p.to_f64().unwrap_or(0.0)).collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev > 0.0 && std_dev.is_finite() {
        Decimal::from_f64_retain(mean / std_dev).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

pub fn compute_statistics(trades: &[Trade]) -> TradeStatistics {
    let closed = closed_chronological(trades);
    if closed.is_empty() {
        return TradeStatistics::empty();
    }

    let mut streaks = StreakCounter::default();
    let mut drawdown = DrawdownTracker::default();
    for trade in &closed {
        drawdown.record(trade.pnl);
        streaks.record(TradeOutcome::from_pnl(trade.pnl));
    }

    let pnls: Vec<Decimal> = closed.iter().map(|t| t.pnl).collect();
    let total_pnl = saturating_total(pnls.iter().copied());
    let count = Decimal::from(pnls.len());

    let recovery_factor = ratio_or_zero(total_pnl, drawdown.max_drawdown);
    let calmar_ratio = total_pnl
        .checked_mul(dec!(100))
        .map(|scaled| ratio_or_zero(scaled, drawdown.max_drawdown_pct))
        .unwrap_or(Decimal::ZERO);

    TradeStatistics {
        closed_trades: pnls.len() as u64,
        total_pnl,
        current_win_streak: streaks.win,
        current_loss_streak: streaks.loss,
        max_win_streak: streaks.max_win,
        max_loss_streak: streaks.max_loss,
        max_drawdown: drawdown.max_drawdown,
        max_drawdown_percent: drawdown.max_drawdown_pct,
        recovery_factor,
        expectancy: ratio_or_zero(total_pnl, count),
        sharpe_ratio: sharpe_like(&pnls),
        calmar_ratio,
    }
}
