use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// T-Track letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    fn from_points(points: Decimal) -> Self {
        if points >= dec!(90) {
            Grade::A
        } else if points >= dec!(80) {
            Grade::B
        } else if points >= dec!(70) {
            Grade::C
        } else if points >= dec!(60) {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const PROFIT_FACTOR_CAP: Decimal = dec!(2.0);
const HALF_WEIGHT: Decimal = dec!(50);

/// Raw 0-100 score: half from win rate, half from profit factor capped at 2.0
pub fn t_track_points(win_rate: Decimal, profit_factor: Decimal) -> Decimal {
    let win_rate_score = win_rate / dec!(100) * HALF_WEIGHT;
    let capped = profit_factor.min(PROFIT_FACTOR_CAP);
    let profit_factor_score = capped / PROFIT_FACTOR_CAP * HALF_WEIGHT;
    win_rate_score + profit_factor_score
}

/// Bands are inclusive lower bounds and compared unrounded
pub fn t_track_score(win_rate: Decimal, profit_factor: Decimal) -> Grade {
    Grade::from_points(t_track_points(win_rate, profit_factor))
}
