//! Durable per-day spend totals.
//!
//! Only aggregated spend per UTC calendar day is kept (key `YYYYMMDD`); this
//! is not a per-request log. Days older than [`RETENTION_DAYS`] are pruned
//! whenever a new expense is recorded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

/// How many days of totals a ledger keeps.
pub const RETENTION_DAYS: i64 = 90;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS daily_spend (
    day TEXT PRIMARY KEY NOT NULL,
    amount REAL NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);
"#;

/// Ledger key for a calendar day.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

fn retention_cutoff(at: DateTime<Utc>) -> NaiveDate {
    (at - chrono::Duration::days(RETENTION_DAYS)).date_naive()
}

/// Storage for aggregated daily spend.
#[async_trait]
pub trait ExpenseLedger: Send + Sync {
    /// Add `amount` (USD) to the total of the day containing `at`.
    async fn record(&self, at: DateTime<Utc>, amount: f64) -> Result<(), LedgerError>;

    /// Total recorded for `day`, `0.0` if nothing was recorded.
    async fn daily_total(&self, day: NaiveDate) -> Result<f64, LedgerError>;

    /// Drop totals for days strictly before `day`. Returns how many were dropped.
    async fn prune_before(&self, day: NaiveDate) -> Result<usize, LedgerError>;
}

/// In-process ledger. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    totals: Mutex<BTreeMap<String, f64>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseLedger for MemoryLedger {
    async fn record(&self, at: DateTime<Utc>, amount: f64) -> Result<(), LedgerError> {
        let mut totals = self.totals.lock().await;
        *totals.entry(day_key(at.date_naive())).or_insert(0.0) += amount;
        let cutoff = day_key(retention_cutoff(at));
        totals.retain(|day, _| *day >= cutoff);
        Ok(())
    }

    async fn daily_total(&self, day: NaiveDate) -> Result<f64, LedgerError> {
        Ok(self
            .totals
            .lock()
            .await
            .get(&day_key(day))
            .copied()
            .unwrap_or(0.0))
    }

    async fn prune_before(&self, day: NaiveDate) -> Result<usize, LedgerError> {
        let mut totals = self.totals.lock().await;
        let cutoff = day_key(day);
        let before = totals.len();
        totals.retain(|d, _| *d >= cutoff);
        Ok(before - totals.len())
    }
}

/// SQLite-backed ledger.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(SCHEMA)?;
            Ok::<_, LedgerError>(conn)
        })
        .await
        .map_err(|e| LedgerError::Join(e.to_string()))??;

        tracing::info!(path = %path.display(), "Opened expense ledger");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExpenseLedger for SqliteLedger {
    async fn record(&self, at: DateTime<Utc>, amount: f64) -> Result<(), LedgerError> {
        let conn = self.conn.clone();
        let day = day_key(at.date_naive());
        let cutoff = day_key(retention_cutoff(at));
        let updated_at = at.to_rfc3339();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            // Upsert and prune commit together; on error nothing is stored
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO daily_spend (day, amount, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(day) DO UPDATE SET
                     amount = amount + excluded.amount,
                     updated_at = excluded.updated_at",
                params![day, amount, updated_at],
            )?;
            tx.execute("DELETE FROM daily_spend WHERE day < ?1", params![cutoff])?;
            tx.commit()?;
            Ok::<_, LedgerError>(())
        })
        .await
        .map_err(|e| LedgerError::Join(e.to_string()))?
    }

    async fn daily_total(&self, day: NaiveDate) -> Result<f64, LedgerError> {
        let conn = self.conn.clone();
        let day = day_key(day);

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let total: Option<f64> = conn
                .query_row(
                    "SELECT amount FROM daily_spend WHERE day = ?1",
                    params![day],
                    |row| row.get(0),
                )
                .optional()?;
            Ok::<_, LedgerError>(total.unwrap_or(0.0))
        })
        .await
        .map_err(|e| LedgerError::Join(e.to_string()))?
    }

    async fn prune_before(&self, day: NaiveDate) -> Result<usize, LedgerError> {
        let conn = self.conn.clone();
        let cutoff = day_key(day);

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let removed = conn.execute("DELETE FROM daily_spend WHERE day < ?1", params![cutoff])?;
            Ok::<_, LedgerError>(removed)
        })
        .await
        .map_err(|e| LedgerError::Join(e.to_string()))?
    }
}

/// Ledger storage errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(String),
}
