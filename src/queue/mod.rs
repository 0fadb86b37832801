//! Durable job queue.
//!
//! Jobs live in the `jobs` table of the metadata database, which lets the
//! HTTP server (producer) and the thumbnail worker (consumer) run as
//! separate processes. A job moves `waiting -> active -> completed|failed`.
//! An `active` job whose claim is older than the stall timeout is handed
//! out again, so delivery is at-least-once.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::{FilesError, Result};

/// Name of the thumbnail generation queue.
pub const THUMBNAIL_QUEUE: &str = "thumbnail generation";

/// Default time before an unacknowledged claim is handed out again.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Job lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Waiting,
    Active,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Work item for the thumbnail worker.
///
/// Ids are optional so a malformed job can be detected and failed by the
/// consumer instead of being rejected at decode time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<i64>,
    /// Display name for logs.
    #[serde(default)]
    pub name: String,
}

impl JobPayload {
    /// Payload for an uploaded image.
    pub fn thumbnail(user_id: i64, file_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            file_id: Some(file_id),
            name: format!("Image thumbnail [{user_id}-{file_id}]"),
        }
    }
}

/// A job handed to a consumer.
#[derive(Debug, Clone, FromRow)]
pub struct ClaimedJob {
    pub id: i64,
    /// Raw JSON payload.
    pub payload: String,
    /// Deliveries so far, this one included.
    pub attempts: i64,
}

impl ClaimedJob {
    /// Decode the payload.
    pub fn payload(&self) -> std::result::Result<JobPayload, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}

/// Number of jobs per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobCounts {
    pub waiting: i64,
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
}

/// A named queue in the metadata database.
#[derive(Debug, Clone)]
pub struct JobQueue {
    db: Database,
    name: String,
    stall_timeout: Duration,
}

impl JobQueue {
    /// Open the queue `name`.
    pub fn new(db: Database, name: impl Into<String>) -> Self {
        Self {
            db,
            name: name.into(),
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }

    /// Override the stall timeout.
    pub fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
        self.stall_timeout = stall_timeout;
        self
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a job. Returns its ID.
    pub async fn enqueue(&self, payload: &JobPayload) -> Result<i64> {
        let json = serde_json::to_string(payload)
            .map_err(|e| FilesError::Queue(format!("cannot encode payload: {e}")))?;

        let result = sqlx::query("INSERT INTO jobs (queue, payload) VALUES (?, ?)")
            .bind(&self.name)
            .bind(json)
            .execute(self.db.pool())
            .await?;

        let id = result.last_insert_rowid();
        debug!("Enqueued job {} on '{}': {}", id, self.name, payload.name);
        Ok(id)
    }

    /// Claim the oldest available job.
    ///
    /// Waiting jobs and stalled active jobs are both available. The claim
    /// is a single UPDATE, so two consumers never receive the same job
    /// at the same time.
    pub async fn claim_next(&self) -> Result<Option<ClaimedJob>> {
        let now = Utc::now().timestamp_millis();
        let stall_ms = i64::try_from(self.stall_timeout.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now.saturating_sub(stall_ms);

        let job = sqlx::query_as::<_, ClaimedJob>(
            "UPDATE jobs
             SET status = 'active', attempts = attempts + 1, claimed_at = ?
             WHERE id = (
                 SELECT id FROM jobs
                 WHERE queue = ?
                   AND (status = 'waiting' OR (status = 'active' AND claimed_at < ?))
                 ORDER BY id
                 LIMIT 1
             )
             RETURNING id, payload, attempts",
        )
        .bind(now)
        .bind(&self.name)
        .bind(cutoff)
        .fetch_optional(self.db.pool())
        .await?;

        if let Some(job) = &job {
            if job.attempts > 1 {
                warn!(
                    "Redelivering job {} on '{}' (attempt {})",
                    job.id, self.name, job.attempts
                );
            }
        }

        Ok(job)
    }

    /// Stall timeout for claims on this queue.
    pub fn stall_timeout(&self) -> Duration {
        self.stall_timeout
    }

    /// Renew a claim so the job is not handed out again while it is
    /// still being processed.
    ///
    /// Returns `false` when the claim was lost to another consumer.
    pub async fn extend(&self, job: &ClaimedJob) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET claimed_at = ?
             WHERE id = ? AND queue = ? AND status = 'active' AND attempts = ?",
        )
        .bind(Utc::now().timestamp_millis())
        .bind(job.id)
        .bind(&self.name)
        .bind(job.attempts)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Acknowledge a job as done.
    ///
    /// Returns `false` if the claim is no longer current, in which case
    /// the job is left to whoever holds it now.
    pub async fn complete(&self, job: &ClaimedJob) -> Result<bool> {
        let applied = self.finish(job, JobStatus::Completed, None).await?;
        if applied {
            info!("Job {} completed", job.id);
        }
        Ok(applied)
    }

    /// Mark a job as failed. Failed jobs are never handed out again.
    ///
    /// Returns `false` if the claim is no longer current.
    pub async fn fail(&self, job: &ClaimedJob, reason: &str) -> Result<bool> {
        let applied = self.finish(job, JobStatus::Failed, Some(reason)).await?;
        if applied {
            warn!("Job {} failed: {}", job.id, reason);
        }
        Ok(applied)
    }

    async fn finish(
        &self,
        job: &ClaimedJob,
        status: JobStatus,
        error: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = ?, error = ?, finished_at = datetime('now')
             WHERE id = ? AND queue = ? AND status = 'active' AND attempts = ?",
        )
        .bind(status.as_str())
        .bind(error)
        .bind(job.id)
        .bind(&self.name)
        .bind(job.attempts)
        .execute(self.db.pool())
        .await?;

        let applied = result.rows_affected() == 1;
        if !applied {
            warn!(
                "Job {} attempt {} no longer holds its claim; dropping {} result",
                job.id,
                job.attempts,
                status.as_str()
            );
        }
        Ok(applied)
    }

    /// Job counts per state.
    pub async fn counts(&self) -> Result<JobCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs WHERE queue = ? GROUP BY status")
                .bind(&self.name)
                .fetch_all(self.db.pool())
                .await?;

        let mut counts = JobCounts::default();
        for (status, n) in rows {
            match status.as_str() {
                "waiting" => counts.waiting = n,
                "active" => counts.active = n,
                "completed" => counts.completed = n,
                "failed" => counts.failed = n,
                _ => {}
            }
        }
        Ok(counts)
    }

    /// Error recorded for a failed job.
    pub async fn failure_reason(&self, id: i64) -> Result<Option<String>> {
        let reason: Option<Option<String>> =
            sqlx::query_scalar("SELECT error FROM jobs WHERE id = ? AND queue = ?")
                .bind(id)
                .bind(&self.name)
                .fetch_optional(self.db.pool())
                .await?;
        Ok(reason.flatten())
    }
}
