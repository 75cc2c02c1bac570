//! In-memory store and queue.
//!
//! Same contracts as the SQLite backend, held in mutexed maps. Used by
//! tests and by ephemeral sync-only runs where nothing must survive the
//! process.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use briefcheck_protocol::{Job, JobId, JobPayload, JobStatus, ResultPayload};
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::error::{Result, StoreError};
use crate::store::{JobQueue, ProgressStore, QueueStats, MAX_RETRY_COUNT};

#[derive(Default)]
struct QueueState {
    queued: VecDeque<(JobId, JobPayload)>,
    running: HashMap<JobId, JobPayload>,
    retries: HashMap<JobId, i32>,
    completed: HashSet<JobId>,
    failed: HashSet<JobId>,
}

#[derive(Default)]
pub struct MemoryStore {
    jobs: Mutex<HashMap<JobId, Job>>,
    cancels: Mutex<HashSet<JobId>>,
    queue: Mutex<QueueState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn create_job(&self, job: &Job) -> Result<()> {
        self.jobs.lock().unwrap().insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(id).cloned())
    }

    async fn exists(&self, id: &JobId) -> Result<bool> {
        Ok(self.jobs.lock().unwrap().contains_key(id))
    }

    async fn update_progress(&self, id: &JobId, pct: u8, step: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(id) else {
            return Err(StoreError::JobNotFound(id.clone()));
        };
        if job.status.is_terminal() {
            return Ok(());
        }
        job.status = JobStatus::Running;
        if pct.min(100) >= job.progress_pct {
            job.progress_pct = pct.min(100);
            job.current_step = step.to_string();
        }
        Ok(())
    }

    async fn complete_job(&self, id: &JobId, result: &ResultPayload) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(id) else {
            return Err(StoreError::JobNotFound(id.clone()));
        };
        if job.status.is_terminal() {
            return Err(StoreError::TerminalJob {
                job_id: id.clone(),
                from: job.status,
            });
        }
        job.status = JobStatus::Completed;
        job.progress_pct = 100;
        job.current_step = "completed".to_string();
        job.result = Some(result.clone());
        Ok(())
    }

    async fn fail_job(
        &self,
        id: &JobId,
        error: &str,
        partial: Option<&ResultPayload>,
    ) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(id) else {
            return Err(StoreError::JobNotFound(id.clone()));
        };
        if job.status.is_terminal() {
            return Err(StoreError::TerminalJob {
                job_id: id.clone(),
                from: job.status,
            });
        }
        job.status = JobStatus::Failed;
        job.current_step = "failed".to_string();
        job.error = Some(error.to_string());
        job.partial_result = partial.cloned();
        Ok(())
    }

    async fn request_cancel(&self, id: &JobId) -> Result<()> {
        self.cancels.lock().unwrap().insert(id.clone());
        Ok(())
    }

    async fn cancel_requested(&self, id: &JobId) -> Result<bool> {
        Ok(self.cancels.lock().unwrap().contains(id))
    }

    async fn purge_expired(&self, ttl_seconds: u64) -> Result<u64> {
        let cutoff = Utc::now() - ChronoDuration::seconds(ttl_seconds as i64);
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|_, job| {
            if !job.status.is_terminal() {
                return true;
            }
            match DateTime::parse_from_rfc3339(&job.created_at) {
                Ok(created) => created.with_timezone(&Utc) >= cutoff,
                Err(_) => true,
            }
        });
        Ok((before - jobs.len()) as u64)
    }
}

#[async_trait]
impl JobQueue for MemoryStore {
    async fn enqueue(&self, id: &JobId, payload: &JobPayload) -> Result<()> {
        let mut queue = self.queue.lock().unwrap();
        queue.queued.push_back((id.clone(), payload.clone()));
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<(JobId, JobPayload)>> {
        let mut queue = self.queue.lock().unwrap();
        let Some((id, payload)) = queue.queued.pop_front() else {
            return Ok(None);
        };
        queue.running.insert(id.clone(), payload.clone());
        Ok(Some((id, payload)))
    }

    async fn ack(&self, id: &JobId) -> Result<()> {
        let mut queue = self.queue.lock().unwrap();
        queue.running.remove(id);
        queue.completed.insert(id.clone());
        Ok(())
    }

    async fn fail(&self, id: &JobId, _error: &str) -> Result<()> {
        let mut queue = self.queue.lock().unwrap();
        let Some(payload) = queue.running.remove(id) else {
            return Ok(());
        };
        let retries = {
            let count = queue.retries.entry(id.clone()).or_insert(0);
            *count += 1;
            *count
        };
        if retries >= MAX_RETRY_COUNT {
            queue.failed.insert(id.clone());
        } else {
            queue.queued.push_back((id.clone(), payload));
        }
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats> {
        let queue = self.queue.lock().unwrap();
        Ok(QueueStats {
            queued: queue.queued.len() as i64,
            running: queue.running.len() as i64,
            completed: queue.completed.len() as i64,
            failed: queue.failed.len() as i64,
        })
    }
}
