use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::metrics::profit_factor;
use super::percent;
use crate::types::Trade;

/// How exit timestamps are truncated into calendar buckets. Every rollup
/// converts into one fixed offset first, so a trade never straddles two days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPolicy {
    pub utc_offset: FixedOffset,
    pub week_start: Weekday,
}

impl Default for BucketPolicy {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            week_start: Weekday::Sun,
        }
    }
}

impl BucketPolicy {
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }

    pub fn week_start_of(&self, date: NaiveDate) -> NaiveDate {
        let offset = (date.weekday().num_days_from_monday() + 7
            - self.week_start.num_days_from_monday())
            % 7;
        date - Duration::days(offset as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Neutral,
    Poor,
    Terrible,
}

impl PerformanceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Neutral => "neutral",
            PerformanceTier::Poor => "poor",
            PerformanceTier::Terrible => "terrible",
        }
    }

    pub fn classify(pnl: Decimal, win_rate: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            if win_rate >= dec!(70) {
                PerformanceTier::Excellent
            } else if win_rate >= dec!(50) {
                PerformanceTier::Good
            } else {
                PerformanceTier::Neutral
            }
        } else if pnl < Decimal::ZERO {
            if win_rate < dec!(30) {
                PerformanceTier::Terrible
            } else if win_rate < dec!(50) {
                PerformanceTier::Poor
            } else {
                PerformanceTier::Neutral
            }
        } else {
            PerformanceTier::Neutral
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTradeData {
    pub date: NaiveDate,
    pub pnl: Decimal,
    pub trade_count: u64,
    pub win_rate: Decimal,
    pub performance: PerformanceTier,
}

impl DailyTradeData {
    /// Flat days are shown as "no signal" on the calendar rather than as a tier
    pub fn has_signal(&self) -> bool {
        !self.pnl.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTradeData {
    pub week_start: NaiveDate,
    pub earnings: Decimal,
    pub trading_days: u64,
    pub trade_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTradeData {
    pub year: i32,
    pub month: u32,
    pub pnl: Decimal,
    pub trade_count: u64,
    pub win_rate: Decimal,
    pub profit_factor: Decimal,
}

#[derive(Default)]
struct Bucket {
    pnl: Decimal,
    trades: u64,
    wins: u64,
    gross_profit: Decimal,
    gross_loss: Decimal,
}

impl Bucket {
    fn add(&mut self, pnl: Decimal) {
        self.pnl = self.pnl.saturating_add(pnl);
        self.trades += 1;
        if pnl > Decimal::ZERO {
            self.wins += 1;
            self.gross_profit = self.gross_profit.saturating_add(pnl);
        } else if pnl < Decimal::ZERO {
            self.gross_loss = self.gross_loss.saturating_add(pnl.abs());
        }
    }

    fn win_rate(&self) -> Decimal {
        percent(self.wins, self.trades)
    }
}

fn closed_by_date<'a>(
    trades: &'a [Trade],
    policy: &'a BucketPolicy,
) -> impl Iterator<Item = (NaiveDate, Decimal)> + 'a {
    trades
        .iter()
        .filter_map(move |t| t.realized().map(|(pnl, exit)| (policy.local_date(exit), pnl)))
}

pub fn daily_rollup(trades: &[Trade], policy: &BucketPolicy) -> Vec<DailyTradeData> {
    let mut days: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    for (date, pnl) in closed_by_date(trades, policy) {
        days.entry(date).or_default().add(pnl);
    }

    days.into_iter()
        .map(|(date, bucket)| {
            let win_rate = bucket.win_rate();
            DailyTradeData {
                date,
                pnl: bucket.pnl,
                trade_count: bucket.trades,
                win_rate,
                performance: PerformanceTier::classify(bucket.pnl, win_rate),
            }
        })
        .collect()
}

/// Calendar view: the daily rollup restricted to one month
pub fn daily_rollup_for_month(
    trades: &[Trade],
    policy: &BucketPolicy,
    year: i32,
    month: u32,
) -> Vec<DailyTradeData> {
    daily_rollup(trades, policy)
        .into_iter()
        .filter(|d| d.date.year() == year && d.date.month() == month)
        .collect()
}

pub fn weekly_rollup(trades: &[Trade], policy: &BucketPolicy) -> Vec<WeeklyTradeData> {
    let mut weeks: BTreeMap<NaiveDate, (Bucket, BTreeSet<NaiveDate>)> = BTreeMap::new();
    for (date, pnl) in closed_by_date(trades, policy) {
        let (bucket, days) = weeks.entry(policy.week_start_of(date)).or_default();
        bucket.add(pnl);
        days.insert(date);
    }

    weeks
        .into_iter()
        .map(|(week_start, (bucket, days))| WeeklyTradeData {
            week_start,
            earnings: bucket.pnl,
            trading_days: days.len() as u64,
            trade_count: bucket.trades,
        })
        .collect()
}

pub fn monthly_rollup(trades: &[Trade], policy: &BucketPolicy) -> Vec<MonthlyTradeData> {
    let mut months: BTreeMap<(i32, u32), Bucket> = BTreeMap::new();
    for (date, pnl) in closed_by_date(trades, policy) {
        months.entry((date.year(), date.month())).or_default().add(pnl);
    }

    months
        .into_iter()
        .map(|((year, month), bucket)| MonthlyTradeData {
            year,
            month,
            pnl: bucket.pnl,
            trade_count: bucket.trades,
            win_rate: bucket.win_rate(),
            profit_factor: profit_factor(bucket.gross_profit, bucket.gross_loss),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{closed_trade_at, open_trade};
    use crate::analytics::RATIO_SENTINEL;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_single_day_rollup() {
        let trades = vec![
            closed_trade_at(dec!(100), at(2024, 5, 6, 14)),
            closed_trade_at(dec!(-50), at(2024, 5, 6, 15)),
            closed_trade_at(dec!(30), at(2024, 5, 6, 19)),
        ];

        let days = daily_rollup(&trades, &BucketPolicy::default());
        assert_eq!(days.len(), 1);
        let day = &days[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
        assert_eq!(day.pnl, dec!(80));
        assert_eq!(day.trade_count, 3);
        assert_eq!(day.win_rate.round_dp(2), dec!(66.67));
        assert_eq!(day.performance, PerformanceTier::Good);
        assert!(day.has_signal());
    }

    #[test]
    fn test_tier_rules() {
        assert_eq!(PerformanceTier::classify(dec!(10), dec!(70)), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::classify(dec!(10), dec!(50)), PerformanceTier::Good);
        assert_eq!(PerformanceTier::classify(dec!(10), dec!(49)), PerformanceTier::Neutral);
        assert_eq!(PerformanceTier::classify(dec!(-10), dec!(29)), PerformanceTier::Terrible);
        assert_eq!(PerformanceTier::classify(dec!(-10), dec!(30)), PerformanceTier::Poor);
        assert_eq!(PerformanceTier::classify(dec!(-10), dec!(50)), PerformanceTier::Neutral);
        assert_eq!(PerformanceTier::classify(Decimal::ZERO, dec!(100)), PerformanceTier::Neutral);
    }

    #[test]
    fn test_tier_labels_match_json() {
        for tier in [
            PerformanceTier::Excellent,
            PerformanceTier::Good,
            PerformanceTier::Neutral,
            PerformanceTier::Poor,
            PerformanceTier::Terrible,
        ] {
            let json = serde_json::to_value(tier).unwrap();
            assert_eq!(json, tier.as_str());
            assert_eq!(tier.to_string(), tier.as_str());
        }
    }

    #[test]
    fn test_flat_day_has_no_signal() {
        let trades = vec![
            closed_trade_at(dec!(25), at(2024, 5, 6, 14)),
            closed_trade_at(dec!(-25), at(2024, 5, 6, 15)),
        ];
        let days = daily_rollup(&trades, &BucketPolicy::default());
        assert_eq!(days[0].performance, PerformanceTier::Neutral);
        assert!(!days[0].has_signal());
    }

    #[test]
    fn test_days_sorted_and_open_trades_skipped() {
        let trades = vec![
            closed_trade_at(dec!(10), at(2024, 5, 8, 14)),
            open_trade(),
            closed_trade_at(dec!(-10), at(2024, 5, 6, 14)),
            closed_trade_at(dec!(5), at(2024, 5, 7, 14)),
        ];
        let days = daily_rollup(&trades, &BucketPolicy::default());
        let dates: Vec<u32> = days.iter().map(|d| d.date.day()).collect();
        assert_eq!(dates, vec![6, 7, 8]);
        assert_eq!(days.iter().map(|d| d.trade_count).sum::<u64>(), 3);
    }

    #[test]
    fn test_offset_moves_late_trade_to_next_day() {
        let late = at(2024, 5, 6, 23);
        let trades = vec![closed_trade_at(dec!(10), late)];

        let utc = daily_rollup(&trades, &BucketPolicy::default());
        assert_eq!(utc[0].date.day(), 6);

        let tokyo = BucketPolicy {
            utc_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
            ..BucketPolicy::default()
        };
        let shifted = daily_rollup(&trades, &tokyo);
        assert_eq!(shifted.len(), 1);
        assert_eq!(shifted[0].date.day(), 7);
    }

    #[test]
    fn test_week_start() {
        // 2024-05-08 is a Wednesday
        let wed = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        let sunday = BucketPolicy::default();
        assert_eq!(sunday.week_start_of(wed), NaiveDate::from_ymd_opt(2024, 5, 5).unwrap());

        let monday = BucketPolicy {
            week_start: Weekday::Mon,
            ..BucketPolicy::default()
        };
        assert_eq!(monday.week_start_of(wed), NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());

        let sun = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        assert_eq!(sunday.week_start_of(sun), sun);
        assert_eq!(monday.week_start_of(sun), NaiveDate::from_ymd_opt(2024, 4, 29).unwrap());
    }

    #[test]
    fn test_weekly_rollup() {
        let trades = vec![
            closed_trade_at(dec!(10), at(2024, 5, 6, 14)),
            closed_trade_at(dec!(20), at(2024, 5, 6, 16)),
            closed_trade_at(dec!(-5), at(2024, 5, 9, 14)),
            closed_trade_at(dec!(7), at(2024, 5, 13, 14)),
        ];

        let weeks = weekly_rollup(&trades, &BucketPolicy::default());
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start, NaiveDate::from_ymd_opt(2024, 5, 5).unwrap());
        assert_eq!(weeks[0].earnings, dec!(25));
        assert_eq!(weeks[0].trading_days, 2);
        assert_eq!(weeks[0].trade_count, 3);
        assert_eq!(weeks[1].week_start, NaiveDate::from_ymd_opt(2024, 5, 12).unwrap());
        assert_eq!(weeks[1].earnings, dec!(7));
    }

    #[test]
    fn test_monthly_rollup_sorted_across_years() {
        let trades = vec![
            closed_trade_at(dec!(40), at(2024, 1, 3, 14)),
            closed_trade_at(dec!(-10), at(2023, 12, 28, 14)),
            closed_trade_at(dec!(-20), at(2024, 1, 9, 14)),
            closed_trade_at(dec!(15), at(2023, 12, 29, 14)),
        ];

        let months = monthly_rollup(&trades, &BucketPolicy::default());
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2023, 12));
        assert_eq!(months[0].pnl, dec!(5));
        assert_eq!(months[0].profit_factor, dec!(1.5));
        assert_eq!((months[1].year, months[1].month), (2024, 1));
        assert_eq!(months[1].trade_count, 2);
        assert_eq!(months[1].win_rate, dec!(50));
        assert_eq!(months[1].profit_factor, dec!(2));
    }

    #[test]
    fn test_month_without_losses() {
        let trades = vec![closed_trade_at(dec!(40), at(2024, 1, 3, 14))];
        let months = monthly_rollup(&trades, &BucketPolicy::default());
        assert_eq!(months[0].profit_factor, RATIO_SENTINEL);
    }

    #[test]
    fn test_calendar_month_filter() {
        let trades = vec![
            closed_trade_at(dec!(40), at(2024, 1, 31, 14)),
            closed_trade_at(dec!(-10), at(2024, 2, 1, 14)),
        ];
        let feb = daily_rollup_for_month(&trades, &BucketPolicy::default(), 2024, 2);
        assert_eq!(feb.len(), 1);
        assert_eq!(feb[0].pnl, dec!(-10));
        assert_eq!(feb[0].performance, PerformanceTier::Terrible);
    }

    #[test]
    fn test_empty_rollups() {
        let policy = BucketPolicy::default();
        assert!(daily_rollup(&[], &policy).is_empty());
        assert!(weekly_rollup(&[], &policy).is_empty());
        assert!(monthly_rollup(&[], &policy).is_empty());
    }
}
