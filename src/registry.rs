use crate::{
    job::{Job, JobId, JobStatus, JobSummary},
    supervisor::Supervisor,
    util::{now_rfc3339, sha256_hex},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;

struct Entry {
    job: Arc<Job>,
    task: JoinHandle<()>,
    /// Flips to true once the supervisor (or its watcher) is done.
    done: watch::Receiver<bool>,
}

/// Every job submitted during this process lifetime, keyed by id.
///
/// Each entry owns the task supervising its pipeline. Entries are never
/// removed.
pub struct JobRegistry {
    supervisor: Arc<Supervisor>,
    history_limit: usize,
    seq: AtomicU64,
    jobs: RwLock<HashMap<JobId, Entry>>,
}

impl JobRegistry {
    pub fn new(supervisor: Supervisor, history_limit: usize) -> Self {
        Self {
            supervisor: Arc::new(supervisor),
            history_limit,
            seq: AtomicU64::new(0),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self, domain: &str) -> (JobId, u64) {
        let ordinal = self.seq.fetch_add(1, Ordering::Relaxed);
        let digest = sha256_hex(format!("{domain}:{}:{ordinal}", now_rfc3339()).as_bytes());
        (JobId::new(&digest[..32]), ordinal)
    }

    /// Registers a job in `running` state and starts its supervisor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(&self, domain: &str) -> JobId {
        let (id, ordinal) = self.next_id(domain);
        let job = Arc::new(Job::new(id.clone(), domain, ordinal, self.history_limit));

        let supervisor = self.supervisor.clone();
        let run_job = job.clone();
        let inner = tokio::spawn(async move { supervisor.run(run_job).await });

        // The watcher turns a panicking supervisor into a failed job.
        let (done_tx, done) = watch::channel(false);
        let watched = job.clone();
        let task = tokio::spawn(async move {
            if let Err(err) = inner.await {
                error!("job {} supervisor task aborted: {err}", watched.id());
                watched.fail(format!("Error running script: {err}"));
            }
            done_tx.send_replace(true);
        });

        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        jobs.insert(
            id.clone(),
            Entry {
                job,
                task,
                done,
            },
        );
        id
    }

    pub fn get(&self, id: &JobId) -> Option<Arc<Job>> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.get(id).map(|entry| entry.job.clone())
    }

    /// Summaries of all jobs in submission order.
    pub fn list(&self) -> Vec<JobSummary> {
        let mut jobs: Vec<Arc<Job>> = {
            let map = self.jobs.read().unwrap_or_else(|e| e.into_inner());
            map.values().map(|entry| entry.job.clone()).collect()
        };
        jobs.sort_by_key(|job| job.ordinal());
        jobs.iter().map(|job| job.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn running(&self) -> usize {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.values()
            .filter(|entry| entry.job.status() == JobStatus::Running)
            .count()
    }

    /// Whether the supervisor for `id` has exited. `None` for an unknown id.
    pub fn is_supervisor_finished(&self, id: &JobId) -> Option<bool> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        let entry = jobs.get(id)?;
        Some(*entry.done.borrow() || entry.task.is_finished())
    }

    /// Waits for the supervisor of `id` to exit. Returns false for an
    /// unknown id. Any number of callers may wait on the same job.
    pub async fn wait(&self, id: &JobId) -> bool {
        let mut done = {
            let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
            let Some(entry) = jobs.get(id) else {
                return false;
            };
            entry.done.clone()
        };
        if done.wait_for(|finished| *finished).await.is_err() {
            error!("job {id} watcher dropped before completing");
        }
        true
    }
}
