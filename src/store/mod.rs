pub mod json;

pub use json::JsonTradeStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Trade;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse trades: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid trade record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },
}

/// Source of trade snapshots. Callers refetch before every analytics run;
/// nothing is patched incrementally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// All trades owned by `user_id`, in whatever order the backend returns
    async fn trades_for_user(&self, user_id: &str) -> Result<Vec<Trade>, StoreError>;
}

#[async_trait]
impl<T: TradeStore + ?Sized> TradeStore for Box<T> {
    async fn trades_for_user(&self, user_id: &str) -> Result<Vec<Trade>, StoreError> {
        (**self).trades_for_user(user_id).await
    }
}
