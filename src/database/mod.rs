use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::store::{StoreError, TradeStore};
use crate::types::{Trade, TradeType};

pub struct SqliteTradeStore {
    pool: SqlitePool,
}

impl SqliteTradeStore {
    /// Open (creating if needed) the journal database
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        info!("Initializing SQLite trade store at: {}", db_path);

        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// Private in-memory database. One connection, since every SQLite
    /// memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                trade_type TEXT NOT NULL,
                quantity TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                exit_price TEXT,
                entry_date TEXT NOT NULL,
                exit_date TEXT,
                is_open INTEGER NOT NULL,
                profit_loss TEXT,
                notes TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_trades_user ON trades(user_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a trade record
    pub async fn insert_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        self.insert_trades(std::slice::from_ref(trade)).await?;
        Ok(())
    }

    /// Insert or replace trades by id in one transaction
    pub async fn insert_trades(&self, trades: &[Trade]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        for trade in trades {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO trades (
                    id, user_id, symbol, trade_type, quantity, entry_price, exit_price,
                    entry_date, exit_date, is_open, profit_loss, notes
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&trade.id)
            .bind(&trade.user_id)
            .bind(&trade.symbol)
            .bind(trade.trade_type.as_str())
            .bind(trade.quantity.to_string())
            .bind(trade.entry_price.to_string())
            .bind(trade.exit_price.map(|p| p.to_string()))
            .bind(trade.entry_date.to_rfc3339())
            .bind(trade.exit_date.map(|t| t.to_rfc3339()))
            .bind(trade.is_open)
            .bind(trade.profit_loss.map(|p| p.to_string()))
            .bind(&trade.notes)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Stored {} trades", trades.len());
        Ok(trades.len())
    }

    pub async fn count_trades(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM trades")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }
}

#[async_trait]
impl TradeStore for SqliteTradeStore {
    async fn trades_for_user(&self, user_id: &str) -> Result<Vec<Trade>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, symbol, trade_type, quantity, entry_price, exit_price,
                   entry_date, exit_date, is_open, profit_loss, notes
            FROM trades
            WHERE user_id = ?
            ORDER BY entry_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(trade_from_row).collect()
    }
}

fn trade_from_row(row: &SqliteRow) -> Result<Trade, StoreError> {
    let id: String = row.try_get("id")?;

    let trade_type_raw: String = row.try_get("trade_type")?;
    let trade_type = TradeType::from_str(&trade_type_raw)
        .ok_or_else(|| invalid(&id, format!("unknown trade type {}", trade_type_raw)))?;

    Ok(Trade {
        user_id: row.try_get("user_id")?,
        symbol: row.try_get("symbol")?,
        trade_type,
        quantity: parse_decimal(&id, "quantity", &row.try_get::<String, _>("quantity")?)?,
        entry_price: parse_decimal(&id, "entry_price", &row.try_get::<String, _>("entry_price")?)?,
        exit_price: row
            .try_get::<Option<String>, _>("exit_price")?
            .map(|s| parse_decimal(&id, "exit_price", &s))
            .transpose()?,
        entry_date: parse_timestamp(&id, "entry_date", &row.try_get::<String, _>("entry_date")?)?,
        exit_date: row
            .try_get::<Option<String>, _>("exit_date")?
            .map(|s| parse_timestamp(&id, "exit_date", &s))
            .transpose()?,
        is_open: row.try_get("is_open")?,
        profit_loss: row
            .try_get::<Option<String>, _>("profit_loss")?
            .map(|s| parse_decimal(&id, "profit_loss", &s))
            .transpose()?,
        notes: row.try_get("notes")?,
        id,
    })
}

fn invalid(id: &str, reason: String) -> StoreError {
    StoreError::InvalidRecord {
        id: id.to_string(),
        reason,
    }
}

fn parse_decimal(id: &str, field: &str, raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw).map_err(|e| invalid(id, format!("{}: {}", field, e)))
}

fn parse_timestamp(id: &str, field: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| invalid(id, format!("{}: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample(user: &str, day: u32) -> Trade {
        let entry = Utc.with_ymd_and_hms(2024, 5, day, 13, 30, 0).unwrap();
        let mut trade = Trade::open(user, "ES", TradeType::Sell, dec!(2), dec!(5000.25), entry);
        trade.close(dec!(4990.25), entry + chrono::Duration::minutes(45));
        trade.notes = Some("fade".to_string());
        trade
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let store = SqliteTradeStore::in_memory().await.unwrap();

        let closed = sample("alice", 6);
        let open = Trade::open(
            "alice",
            "CL",
            TradeType::Buy,
            dec!(1),
            dec!(80.5),
            Utc.with_ymd_and_hms(2024, 5, 7, 13, 30, 0).unwrap(),
        );
        store.insert_trade(&closed).await.unwrap();
        store.insert_trade(&open).await.unwrap();
        store.insert_trade(&sample("bob", 6)).await.unwrap();

        let trades = store.trades_for_user("alice").await.unwrap();
        assert_eq!(trades.len(), 2);
        // newest entry first
        assert_eq!(trades[0], open);
        assert_eq!(trades[1], closed);
        assert_eq!(trades[1].profit_loss, Some(dec!(20)));
        assert_eq!(store.count_trades().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_insert_trades_replaces_by_id() {
        let store = SqliteTradeStore::in_memory().await.unwrap();
        let mut trade = sample("alice", 6);
        store.insert_trades(&[trade.clone()]).await.unwrap();

        trade.notes = None;
        let stored = store.insert_trades(&[trade.clone(), sample("alice", 8)]).await.unwrap();
        assert_eq!(stored, 2);
        assert_eq!(store.count_trades().await.unwrap(), 2);

        let trades = store.trades_for_user("alice").await.unwrap();
        assert!(trades.iter().any(|t| t.id == trade.id && t.notes.is_none()));
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let store = SqliteTradeStore::in_memory().await.unwrap();
        let trade = sample("alice", 6);
        store.insert_trade(&trade).await.unwrap();

        sqlx::query("UPDATE trades SET quantity = 'lots'")
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store.trades_for_user("alice").await.unwrap_err();
        match err {
            StoreError::InvalidRecord { id, reason } => {
                assert_eq!(id, trade.id);
                assert!(reason.starts_with("quantity"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
