use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::score::{t_track_score, Grade};
use super::{percent, ratio_or_sentinel, ratio_or_zero, saturating_total};
use crate::types::Trade;

/// Dashboard headline numbers, rebuilt from the full trade list on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_trades: u64,
    pub open_trades: u64,
    pub closed_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub scratch_trades: u64,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub total_pnl: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub win_rate: Decimal,
    pub profit_factor: Decimal,
    pub avg_rr: Decimal,
    pub t_track_score: Grade,
}

impl DashboardMetrics {
    pub fn empty() -> Self {
        Self {
            total_trades: 0,
            open_trades: 0,
            closed_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            scratch_trades: 0,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            win_rate: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            avg_rr: Decimal::ZERO,
            t_track_score: Grade::F,
        }
    }
}

/// Gross profit over gross loss, with the 999 sentinel when nothing was lost
pub fn profit_factor(gross_profit: Decimal, gross_loss: Decimal) -> Decimal {
    ratio_or_sentinel(gross_profit, gross_loss)
}

pub fn compute_metrics(trades: &[Trade]) -> DashboardMetrics {
    if trades.is_empty() {
        return DashboardMetrics::empty();
    }

    let total_trades = trades.len() as u64;
    let open_trades = trades.iter().filter(|t| t.is_open).count() as u64;

    let closed: Vec<Decimal> = trades
        .iter()
        .filter_map(|t| t.realized().map(|(pnl, _)| pnl))
        .collect();
    let wins: Vec<Decimal> = closed.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
    let losses: Vec<Decimal> = closed.iter().copied().filter(|p| *p < Decimal::ZERO).collect();

    let closed_trades = closed.len() as u64;
    let winning_trades = wins.len() as u64;
    let losing_trades = losses.len() as u64;
    let scratch_trades = closed_trades - winning_trades - losing_trades;

    let win_rate = percent(winning_trades, closed_trades);

    let gross_profit = saturating_total(wins.iter().copied());
    let gross_loss = saturating_total(losses.iter().map(|p| p.abs()));
    let total_pnl = saturating_total(closed.iter().copied());

    let avg_win = ratio_or_zero(gross_profit, Decimal::from(wins.len()));
    let avg_loss = ratio_or_zero(gross_loss, Decimal::from(losses.len()));

    let largest_win = wins.iter().copied().max().unwrap_or(Decimal::ZERO);
    let largest_loss = losses.iter().copied().min().unwrap_or(Decimal::ZERO).abs();

    let profit_factor = profit_factor(gross_profit, gross_loss);
    let avg_rr = ratio_or_sentinel(avg_win, avg_loss);

    DashboardMetrics {
        total_trades,
        open_trades,
        closed_trades,
        winning_trades,
        losing_trades,
        scratch_trades,
        gross_profit,
        gross_loss,
        total_pnl,
        avg_win,
        avg_loss,
        largest_win,
        largest_loss,
        win_rate,
        profit_factor,
        avg_rr,
        t_track_score: t_track_score(win_rate, profit_factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{closed_trade, open_trade};
    use crate::analytics::RATIO_SENTINEL;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_trades() {
        let metrics = compute_metrics(&[]);
        assert_eq!(metrics, DashboardMetrics::empty());
        assert_eq!(metrics.profit_factor, Decimal::ZERO);
        assert_eq!(metrics.t_track_score, Grade::F);
    }

    #[test]
    fn test_mixed_trades() {
        let trades = vec![
            closed_trade(dec!(100), 1),
            closed_trade(dec!(-50), 2),
            closed_trade(dec!(30), 3),
            closed_trade(dec!(0), 4),
            closed_trade(dec!(-25), 5),
            open_trade(),
        ];

        let m = compute_metrics(&trades);
        assert_eq!(m.total_trades, 6);
        assert_eq!(m.open_trades, 1);
        assert_eq!(m.closed_trades, 5);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 2);
        assert_eq!(m.scratch_trades, 1);
        assert_eq!(
            m.winning_trades + m.losing_trades + m.scratch_trades,
            m.closed_trades
        );
        assert_eq!(m.win_rate, dec!(40));
        assert_eq!(m.gross_profit, dec!(130));
        assert_eq!(m.gross_loss, dec!(75));
        assert_eq!(m.total_pnl, dec!(55));
        assert_eq!(m.avg_win, dec!(65));
        assert_eq!(m.avg_loss, dec!(37.5));
        assert_eq!(m.largest_win, dec!(100));
        assert_eq!(m.largest_loss, dec!(50));
        assert_eq!(m.profit_factor.round_dp(4), dec!(1.7333));
        assert_eq!(m.avg_rr.round_dp(4), dec!(1.7333));
    }

    #[test]
    fn test_no_losses_uses_sentinel() {
        let trades = vec![closed_trade(dec!(10), 1), closed_trade(dec!(20), 2)];
        let m = compute_metrics(&trades);
        assert_eq!(m.profit_factor, RATIO_SENTINEL);
        assert_eq!(m.avg_rr, RATIO_SENTINEL);
        assert_eq!(m.win_rate, dec!(100));
        assert_eq!(m.largest_loss, Decimal::ZERO);
        assert_eq!(m.t_track_score, Grade::A);
    }

    #[test]
    fn test_only_open_trades() {
        let m = compute_metrics(&[open_trade(), open_trade()]);
        assert_eq!(m.total_trades, 2);
        assert_eq!(m.open_trades, 2);
        assert_eq!(m.closed_trades, 0);
        assert_eq!(m.win_rate, Decimal::ZERO);
        assert_eq!(m.profit_factor, Decimal::ZERO);
        assert_eq!(m.avg_rr, Decimal::ZERO);
    }

    #[test]
    fn test_half_closed_trade_is_not_counted() {
        let mut trade = closed_trade(dec!(40), 1);
        trade.exit_date = None;
        let m = compute_metrics(&[trade]);
        assert_eq!(m.total_trades, 1);
        assert_eq!(m.open_trades, 0);
        assert_eq!(m.closed_trades, 0);
        assert_eq!(m.total_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_profit_factor_never_negative() {
        let trades = vec![closed_trade(dec!(-10), 1), closed_trade(dec!(-5), 2)];
        let m = compute_metrics(&trades);
        assert_eq!(m.profit_factor, Decimal::ZERO);
        assert_eq!(m.avg_rr, Decimal::ZERO);
        assert_eq!(m.largest_loss, dec!(10));
    }
}
