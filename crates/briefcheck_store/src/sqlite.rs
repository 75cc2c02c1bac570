//! SQLite-backed store and queue.
//!
//! One pool serves both concerns. Job claiming uses the same atomic
//! `UPDATE ... WHERE status = 'QUEUED'` shape on both the happy path and
//! races: a second worker's update affects zero rows and it simply moves on.

use std::str::FromStr;

use async_trait::async_trait;
use briefcheck_protocol::{InputKind, Job, JobId, JobPayload, JobStatus, ResultPayload};
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::store::{JobQueue, ProgressStore, QueueStats, MAX_RETRY_COUNT};

#[derive(Debug)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open a store from a `sqlite:` URL (`sqlite:briefcheck.db`,
    /// `sqlite::memory:`).
    pub async fn open(url: &str) -> Result<Self> {
        let Some(path) = url.strip_prefix("sqlite:") else {
            return Err(StoreError::UnsupportedUrl(url.to_string()));
        };
        let pool = if path == ":memory:" {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect(":memory:")
                .await?
        } else {
            let options = SqliteConnectOptions::from_str(url)
                .map_err(sqlx::Error::from)?
                .create_if_missing(true)
                .busy_timeout(std::time::Duration::from_secs(5));
            SqlitePoolOptions::new().connect_with(options).await?
        };
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bc_jobs (
                id TEXT PRIMARY KEY,
                input_kind TEXT NOT NULL,
                status TEXT NOT NULL,
                progress_pct INTEGER NOT NULL DEFAULT 0,
                current_step TEXT NOT NULL DEFAULT 'queued',
                result_json TEXT,
                partial_result_json TEXT,
                error TEXT,
                cancel_requested INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bc_queue (
                job_id TEXT PRIMARY KEY,
                payload_json TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'QUEUED',
                claim_time TEXT,
                end_time TEXT,
                error_message TEXT,
                retry_count INTEGER NOT NULL DEFAULT 0,
                enqueued_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn job_status(&self, id: &JobId) -> Result<Option<JobStatus>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT status FROM bc_jobs WHERE id = ?")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(raw.and_then(|s| s.parse().ok()))
    }

    /// Map a zero-row terminal update to the precise error.
    async fn explain_failed_transition(&self, id: &JobId) -> StoreError {
        match self.job_status(id).await {
            Ok(Some(status)) => StoreError::TerminalJob {
                job_id: id.clone(),
                from: status,
            },
            _ => StoreError::JobNotFound(id.clone()),
        }
    }
}

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn create_job(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bc_jobs (id, input_kind, status, progress_pct, current_step, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.id.as_str())
        .bind(job.input_kind.as_str())
        .bind(job.status.as_str())
        .bind(i64::from(job.progress_pct))
        .bind(&job.current_step)
        .bind(&job.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>> {
        let row = sqlx::query(
            r#"
            SELECT id, input_kind, status, progress_pct, current_step,
                   result_json, partial_result_json, error, created_at
            FROM bc_jobs WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else { return Ok(None) };

        let result_json: Option<String> = row.try_get("result_json")?;
        let result: Option<ResultPayload> = match result_json {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };
        let partial_json: Option<String> = row.try_get("partial_result_json")?;
        let partial_result: Option<ResultPayload> = match partial_json {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };
        let status_raw: String = row.try_get("status")?;
        let input_kind_raw: String = row.try_get("input_kind")?;
        Ok(Some(Job {
            id: JobId::new(row.try_get::<String, _>("id")?),
            input_kind: input_kind_raw.parse().unwrap_or(InputKind::Text),
            status: status_raw.parse().unwrap_or(JobStatus::Failed),
            progress_pct: row.try_get::<i64, _>("progress_pct")?.clamp(0, 100) as u8,
            current_step: row.try_get("current_step")?,
            result,
            partial_result,
            error: row.try_get("error")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn exists(&self, id: &JobId) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bc_jobs WHERE id = ?")
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn update_progress(&self, id: &JobId, pct: u8, step: &str) -> Result<()> {
        // Monotonic by construction; terminal rows are left alone.
        let affected = sqlx::query(
            r#"
            UPDATE bc_jobs
            SET status = 'running',
                progress_pct = MAX(progress_pct, ?),
                current_step = ?
            WHERE id = ? AND status IN ('queued', 'running')
            "#,
        )
        .bind(i64::from(pct.min(100)))
        .bind(step)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();
        if affected == 0 && !self.exists(id).await? {
            return Err(StoreError::JobNotFound(id.clone()));
        }
        Ok(())
    }

    async fn complete_job(&self, id: &JobId, result: &ResultPayload) -> Result<()> {
        let result_json = serde_json::to_string(result)?;
        let affected = sqlx::query(
            r#"
            UPDATE bc_jobs
            SET status = 'completed',
                progress_pct = 100,
                current_step = 'completed',
                result_json = ?
            WHERE id = ? AND status IN ('queued', 'running')
            "#,
        )
        .bind(&result_json)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(self.explain_failed_transition(id).await);
        }
        info!(job_id = %id, "job completed");
        Ok(())
    }

    async fn fail_job(
        &self,
        id: &JobId,
        error: &str,
        partial: Option<&ResultPayload>,
    ) -> Result<()> {
        let partial_json = partial.map(serde_json::to_string).transpose()?;
        let affected = sqlx::query(
            r#"
            UPDATE bc_jobs
            SET status = 'failed',
                current_step = 'failed',
                error = ?,
                partial_result_json = ?
            WHERE id = ? AND status IN ('queued', 'running')
            "#,
        )
        .bind(error)
        .bind(&partial_json)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(self.explain_failed_transition(id).await);
        }
        info!(job_id = %id, error, partial = partial.is_some(), "job failed");
        Ok(())
    }

    async fn request_cancel(&self, id: &JobId) -> Result<()> {
        sqlx::query("UPDATE bc_jobs SET cancel_requested = 1 WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn cancel_requested(&self, id: &JobId) -> Result<bool> {
        let flag: Option<i64> =
            sqlx::query_scalar("SELECT cancel_requested FROM bc_jobs WHERE id = ?")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(flag.unwrap_or(0) != 0)
    }

    async fn purge_expired(&self, ttl_seconds: u64) -> Result<u64> {
        let cutoff = (Utc::now() - ChronoDuration::seconds(ttl_seconds as i64)).to_rfc3339();
        let jobs = sqlx::query(
            "DELETE FROM bc_jobs WHERE created_at < ? AND status IN ('completed', 'failed')",
        )
        .bind(&cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();
        sqlx::query(
            "DELETE FROM bc_queue WHERE enqueued_at < ? AND status IN ('COMPLETED', 'FAILED')",
        )
        .bind(&cutoff)
        .execute(&self.pool)
        .await?;
        Ok(jobs)
    }
}

#[async_trait]
impl JobQueue for SqliteStore {
    async fn enqueue(&self, id: &JobId, payload: &JobPayload) -> Result<()> {
        let payload_json = serde_json::to_string(payload)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO bc_queue (job_id, payload_json, status, enqueued_at)
            VALUES (?, ?, 'QUEUED', ?)
            "#,
        )
        .bind(id.as_str())
        .bind(&payload_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        info!(job_id = %id, "job enqueued");
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<(JobId, JobPayload)>> {
        let mut tx = self.pool.begin().await?;

        let job_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT job_id FROM bc_queue
            WHERE status = 'QUEUED'
            ORDER BY enqueued_at ASC, job_id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some(job_id) = job_id else {
            tx.commit().await?;
            return Ok(None);
        };

        let now = Utc::now().to_rfc3339();
        let rows_affected = sqlx::query(
            r#"
            UPDATE bc_queue
            SET status = 'RUNNING',
                claim_time = ?
            WHERE job_id = ? AND status = 'QUEUED'
            "#,
        )
        .bind(&now)
        .bind(&job_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            // Claimed by another worker between the select and the update.
            tx.commit().await?;
            return Ok(None);
        }

        let payload_json: String =
            sqlx::query_scalar("SELECT payload_json FROM bc_queue WHERE job_id = ?")
                .bind(&job_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        let payload: JobPayload = serde_json::from_str(&payload_json)?;
        info!(job_id = %job_id, "claimed job");
        Ok(Some((JobId::new(job_id), payload)))
    }

    async fn ack(&self, id: &JobId) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE bc_queue
            SET status = 'COMPLETED',
                end_time = ?
            WHERE job_id = ?
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail(&self, id: &JobId, error: &str) -> Result<()> {
        let retry_count: Option<i64> =
            sqlx::query_scalar("SELECT retry_count FROM bc_queue WHERE job_id = ?")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        let Some(retry_count) = retry_count else {
            return Ok(());
        };

        if retry_count + 1 >= i64::from(MAX_RETRY_COUNT) {
            sqlx::query(
                r#"
                UPDATE bc_queue
                SET status = 'FAILED',
                    end_time = ?,
                    error_message = ?,
                    retry_count = retry_count + 1
                WHERE job_id = ?
                "#,
            )
            .bind(Utc::now().to_rfc3339())
            .bind(error)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
            info!(job_id = %id, error, "job dead-lettered");
        } else {
            sqlx::query(
                r#"
                UPDATE bc_queue
                SET status = 'QUEUED',
                    claim_time = NULL,
                    error_message = ?,
                    retry_count = retry_count + 1
                WHERE job_id = ?
                "#,
            )
            .bind(error)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
            info!(job_id = %id, retry = retry_count + 1, "job requeued");
        }
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'QUEUED') as queued,
                COUNT(*) FILTER (WHERE status = 'RUNNING') as running,
                COUNT(*) FILTER (WHERE status = 'COMPLETED') as completed,
                COUNT(*) FILTER (WHERE status = 'FAILED') as failed
            FROM bc_queue
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(QueueStats {
            queued: row.try_get("queued")?,
            running: row.try_get("running")?,
            completed: row.try_get("completed")?,
            failed: row.try_get("failed")?,
        })
    }
}
