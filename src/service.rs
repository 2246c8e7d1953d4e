use std::time::Instant;
use tracing::{debug, info};

use crate::analytics::{DailyTradeData, EquityDataPoint, JournalAnalytics, PerformanceReport};
use crate::store::{StoreError, TradeStore};

/// Fetches a fresh snapshot from the store for every request, then runs the
/// analytics over it.
pub struct JournalService<S> {
    store: S,
    analytics: JournalAnalytics,
}

impl<S: TradeStore> JournalService<S> {
    pub fn new(store: S, analytics: JournalAnalytics) -> Self {
        Self { store, analytics }
    }

    pub async fn report_for_user(&self, user_id: &str) -> Result<PerformanceReport, StoreError> {
        let started = Instant::now();
        let trades = self.store.trades_for_user(user_id).await?;
        debug!("Fetched {} trades for {} in {:?}", trades.len(), user_id, started.elapsed());

        let report = self.analytics.calculate(&trades);
        info!(
            "Report for {}: {} closed trades, net P&L {}, grade {}",
            user_id, report.metrics.closed_trades, report.metrics.total_pnl, report.metrics.t_track_score
        );
        Ok(report)
    }

    pub async fn calendar_for_user(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyTradeData>, StoreError> {
        let trades = self.store.trades_for_user(user_id).await?;
        Ok(self.analytics.calendar(&trades, year, month))
    }

    pub async fn equity_curve_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<EquityDataPoint>, StoreError> {
        let trades = self.store.trades_for_user(user_id).await?;
        Ok(crate::analytics::build_equity_curve(&trades))
    }
}
