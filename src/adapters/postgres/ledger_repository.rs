//! PostgreSQL implementation of SubscriptionLedger.
//!
//! Rows live in the `payment` table. The unique index on
//! `(transaction_key, status)` turns a redelivered webhook into a no-op, and
//! the reversal insert checks for the paid row inside the same statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{LedgerEntry, LedgerStatus, NewLedgerEntry};
use crate::domain::foundation::{DomainError, ErrorCode, LedgerEntryId, Timestamp};
use crate::ports::{AppendResult, SubscriptionLedger};

const SELECT_COLUMNS: &str = r#"
    id, transaction_key, amount, status, start_at, end_at, end_grace_at,
    next_schedule_at, next_schedule_id, created_at
"#;

/// PostgreSQL implementation of the SubscriptionLedger port.
pub struct PostgresSubscriptionLedger {
    pool: PgPool,
}

impl PostgresSubscriptionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    transaction_key: String,
    amount: i64,
    status: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    end_grace_at: DateTime<Utc>,
    next_schedule_at: Option<DateTime<Utc>>,
    next_schedule_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let status = LedgerStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;

        Ok(LedgerEntry {
            id: LedgerEntryId::from_uuid(row.id),
            transaction_key: row.transaction_key,
            amount: row.amount,
            status,
            start_at: Timestamp::from_datetime(row.start_at),
            end_at: Timestamp::from_datetime(row.end_at),
            end_grace_at: Timestamp::from_datetime(row.end_grace_at),
            next_schedule_at: row.next_schedule_at.map(Timestamp::from_datetime),
            next_schedule_id: row.next_schedule_id,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl SubscriptionLedger for PostgresSubscriptionLedger {
    async fn append(&self, entry: NewLedgerEntry) -> Result<AppendResult, DomainError> {
        // A Cancel row is only written while its Paid row exists.
        let sql = format!(
            r#"
            INSERT INTO payment (
                id, transaction_key, amount, status, start_at, end_at, end_grace_at,
                next_schedule_at, next_schedule_id
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE $4::text <> 'Cancel'
               OR EXISTS (
                   SELECT 1 FROM payment WHERE transaction_key = $2 AND status = 'Paid'
               )
            ON CONFLICT (transaction_key, status) DO NOTHING
            RETURNING {}
            "#,
            SELECT_COLUMNS
        );

        let inserted: Option<LedgerRow> = sqlx::query_as(&sql)
            .bind(*LedgerEntryId::new().as_uuid())
            .bind(&entry.transaction_key)
            .bind(entry.amount)
            .bind(entry.status.as_str())
            .bind(entry.start_at.as_datetime())
            .bind(entry.end_at.as_datetime())
            .bind(entry.end_grace_at.as_datetime())
            .bind(entry.next_schedule_at.map(|t| *t.as_datetime()))
            .bind(&entry.next_schedule_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to append ledger entry: {}", e)))?;

        if let Some(row) = inserted {
            return Ok(AppendResult::Inserted(row.try_into()?));
        }

        match self
            .find_entry(&entry.transaction_key, entry.status)
            .await?
        {
            Some(existing) => Ok(AppendResult::AlreadyExists(existing)),
            None => Err(DomainError::ledger_entry_not_found(&entry.transaction_key)),
        }
    }

    async fn find_entry(
        &self,
        transaction_key: &str,
        status: LedgerStatus,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        let sql = format!(
            "SELECT {} FROM payment WHERE transaction_key = $1 AND status = $2",
            SELECT_COLUMNS
        );

        let row: Option<LedgerRow> = sqlx::query_as(&sql)
            .bind(transaction_key)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to load ledger entry: {}", e)))?;

        row.map(LedgerEntry::try_from).transpose()
    }

    async fn find_latest_paid(
        &self,
        transaction_key: &str,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM payment
            WHERE transaction_key = $1 AND status = 'Paid'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        );

        let row: Option<LedgerRow> = sqlx::query_as(&sql)
            .bind(transaction_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find paid entry: {}", e)))?;

        row.map(LedgerEntry::try_from).transpose()
    }

    async fn current_period(
        &self,
        transaction_key: &str,
        at: Timestamp,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM payment p
            WHERE p.transaction_key = $1
              AND p.status = 'Paid'
              AND p.start_at <= $2
              AND p.end_grace_at >= $2
              AND NOT EXISTS (
                  SELECT 1 FROM payment c
                  WHERE c.transaction_key = p.transaction_key
                    AND c.status = 'Cancel'
                    AND c.created_at >= p.created_at
              )
            ORDER BY p.created_at DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        );

        let row: Option<LedgerRow> = sqlx::query_as(&sql)
            .bind(transaction_key)
            .bind(at.as_datetime())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to load current period: {}", e)))?;

        row.map(LedgerEntry::try_from).transpose()
    }
}
