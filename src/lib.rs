//! Performance analytics for a trading journal: dashboard metrics, the
//! T-Track grade, calendar rollups, streak and drawdown statistics and the
//! equity curve, all derived from a snapshot of a user's trades.

pub mod analytics;
pub mod config;
pub mod database;
pub mod service;
pub mod store;
pub mod types;

pub use analytics::{JournalAnalytics, PerformanceReport};
pub use service::JournalService;
pub use store::{StoreError, TradeStore};
pub use types::{Trade, TradeType};
