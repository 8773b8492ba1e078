//! Repository layer for the submission ledger.

use crate::domain::{EventId, Satoshi, Submission};
use chrono::{TimeZone, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

/// Satoshi amounts are stored as SQLite INTEGER, which is signed.
fn to_db_amount(amount: Satoshi) -> Result<i64, sqlx::Error> {
    i64::try_from(amount.as_u64())
        .map_err(|_| sqlx::Error::Protocol(format!("amount {} does not fit in INTEGER", amount)))
}

fn from_db_amount(raw: i64) -> Result<Satoshi, sqlx::Error> {
    u64::try_from(raw)
        .map(Satoshi::new)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn row_to_submission(row: &SqliteRow) -> Result<Submission, sqlx::Error> {
    let created_ms: i64 = row.try_get("created_at")?;
    let created_at = Utc.timestamp_millis_opt(created_ms).single().ok_or_else(|| {
        sqlx::Error::Decode(format!("invalid created_at timestamp {}", created_ms).into())
    })?;
    let duration_hours: i64 = row.try_get("duration_hours")?;
    let preheat_hours: Option<i64> = row.try_get("preheat_hours")?;

    Ok(Submission {
        event_id: EventId::new(row.try_get("event_id")?),
        duration_hours: u32::try_from(duration_hours)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        is_rewarded: row.try_get("is_rewarded")?,
        reward_satoshi: from_db_amount(row.try_get("reward_satoshi")?)?,
        preheat_hours: preheat_hours
            .map(u32::try_from)
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        quoted_total_satoshi: from_db_amount(row.try_get("quoted_total_satoshi")?)?,
        created_at,
    })
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Record a submission. Recording the same event twice keeps the first row.
    ///
    /// # Errors
    /// Returns an error if the insert fails or an amount does not fit in i64.
    pub async fn insert_submission(&self, submission: &Submission) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO funding_submissions (
                event_id, duration_hours, is_rewarded, reward_satoshi,
                preheat_hours, quoted_total_satoshi, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(event_id) DO NOTHING
            "#,
        )
        .bind(submission.event_id.as_str())
        .bind(i64::from(submission.duration_hours))
        .bind(submission.is_rewarded)
        .bind(to_db_amount(submission.reward_satoshi)?)
        .bind(submission.preheat_hours.map(i64::from))
        .bind(to_db_amount(submission.quoted_total_satoshi)?)
        .bind(submission.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the submission recorded for an event.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_submission(
        &self,
        event_id: &EventId,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT event_id, duration_hours, is_rewarded, reward_satoshi,
                   preheat_hours, quoted_total_satoshi, created_at
            FROM funding_submissions
            WHERE event_id = ?
            "#,
        )
        .bind(event_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_submission).transpose()
    }

    /// List submissions, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_submissions(&self, limit: u32) -> Result<Vec<Submission>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, duration_hours, is_rewarded, reward_satoshi,
                   preheat_hours, quoted_total_satoshi, created_at
            FROM funding_submissions
            ORDER BY created_at DESC, event_id ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_submission).collect()
    }
}
