use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{StoreError, TradeStore};
use crate::types::Trade;

/// Trades exported from the journal as one JSON array. Single-user exports
/// omit `userId`; those unowned trades are attributed to whichever user asks.
pub struct JsonTradeStore {
    path: PathBuf,
}

impl JsonTradeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every trade in the file regardless of owner
    pub async fn load_all(&self) -> Result<Vec<Trade>, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let trades: Vec<Trade> = serde_json::from_str(&raw)?;
        debug!("Loaded {} trades from {}", trades.len(), self.path.display());
        Ok(trades)
    }
}

#[async_trait]
impl TradeStore for JsonTradeStore {
    async fn trades_for_user(&self, user_id: &str) -> Result<Vec<Trade>, StoreError> {
        let trades = self.load_all().await?;
        let total = trades.len();

        let owned: Vec<Trade> = trades
            .into_iter()
            .filter(|t| t.user_id.is_empty() || t.user_id == user_id)
            .map(|mut t| {
                if t.user_id.is_empty() {
                    t.user_id = user_id.to_string();
                }
                t
            })
            .collect();

        if owned.is_empty() && total > 0 {
            warn!(
                "{} holds {} trades but none belong to {}",
                self.path.display(),
                total,
                user_id
            );
        }
        Ok(owned)
    }
}
