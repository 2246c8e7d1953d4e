use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" | "long" => Some(TradeType::Buy),
            "sell" | "short" => Some(TradeType::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sign of a closed trade's P/L
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
    Scratch,
}

impl TradeOutcome {
    pub fn from_pnl(pnl: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            TradeOutcome::Win
        } else if pnl < Decimal::ZERO {
            TradeOutcome::Loss
        } else {
            TradeOutcome::Scratch
        }
    }
}

/// A journaled trade as supplied by the trade store.
///
/// Field names serialize in camelCase so exports from the journal frontend
/// load without a mapping layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub symbol: String,
    pub trade_type: TradeType,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub is_open: bool,
    pub profit_loss: Option<Decimal>,
    pub notes: Option<String>,
}

impl Trade {
    /// Open a new position with a fresh id
    pub fn open(
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        trade_type: TradeType,
        quantity: Decimal,
        entry_price: Decimal,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            symbol: symbol.into(),
            trade_type,
            quantity,
            entry_price,
            exit_price: None,
            entry_date,
            exit_date: None,
            is_open: true,
            profit_loss: None,
            notes: None,
        }
    }

    /// Record the exit and realize P/L. Sells profit when price falls; P/L
    /// beyond the `Decimal` range saturates.
    pub fn close(&mut self, exit_price: Decimal, exit_date: DateTime<Utc>) {
        let gross = exit_price
            .saturating_sub(self.entry_price)
            .saturating_mul(self.quantity);
        let pnl = match self.trade_type {
            TradeType::Buy => gross,
            TradeType::Sell => -gross,
        };

        self.exit_price = Some(exit_price);
        self.exit_date = Some(exit_date);
        self.profit_loss = Some(pnl);
        self.is_open = false;
    }

    /// Closed means not open AND both P/L and exit date recorded. Anything
    /// short of all three is treated as still open by the analytics.
    pub fn is_closed(&self) -> bool {
        !self.is_open && self.profit_loss.is_some() && self.exit_date.is_some()
    }

    /// Realized P/L and exit date, only for closed trades
    pub fn realized(&self) -> Option<(Decimal, DateTime<Utc>)> {
        if !self.is_open {
            if let (Some(pnl), Some(exit)) = (self.profit_loss, self.exit_date) {
                return Some((pnl, exit));
            }
        }
        None
    }

    pub fn outcome(&self) -> Option<TradeOutcome> {
        self.realized().map(|(pnl, _)| TradeOutcome::from_pnl(pnl))
    }
}
