use crate::{classify::LineEvent, extract::ResultRecord, util::now_rfc3339};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub timestamp: String,
}

/// Read-only row for job listings.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub domain: String,
    pub status: JobStatus,
    pub phase: u8,
    pub created_at: String,
}

/// Consistent view of a job taken under its lock.
#[derive(Debug, Clone)]
pub struct PollSnapshot {
    pub status: JobStatus,
    pub phase: u8,
    pub logs: Vec<LogEntry>,
    pub cursor: u64,
    pub results: Option<ResultRecord>,
}

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    phase: u8,
    pending: Vec<LogEntry>,
    history: VecDeque<LogEntry>,
    next_seq: u64,
    results: Option<ResultRecord>,
    workdir: Option<PathBuf>,
}

/// Shared record for one submitted domain.
///
/// The supervisor appends logs and drives the status; request handlers
/// drain or read. All mutable fields sit behind one mutex so a drain sees
/// status, phase and logs from the same instant.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    domain: String,
    ordinal: u64,
    created_at: String,
    history_limit: usize,
    state: Mutex<JobState>,
}

impl Job {
    pub fn new(id: JobId, domain: impl Into<String>, ordinal: u64, history_limit: usize) -> Self {
        Self {
            id,
            domain: domain.into(),
            ordinal,
            created_at: now_rfc3339(),
            history_limit,
            state: Mutex::new(JobState {
                status: JobStatus::Running,
                phase: 0,
                pending: Vec::new(),
                history: VecDeque::new(),
                next_seq: 1,
                results: None,
                workdir: None,
            }),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        // A poisoned lock only means a holder panicked mid-update; the
        // state itself is still structurally valid.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> JobStatus {
        self.lock().status
    }

    pub fn phase(&self) -> u8 {
        self.lock().phase
    }

    pub fn workdir(&self) -> Option<PathBuf> {
        self.lock().workdir.clone()
    }

    pub fn results(&self) -> Option<ResultRecord> {
        self.lock().results.clone()
    }

    pub fn summary(&self) -> JobSummary {
        let state = self.lock();
        JobSummary {
            job_id: self.id.clone(),
            domain: self.domain.clone(),
            status: state.status,
            phase: state.phase,
            created_at: self.created_at.clone(),
        }
    }

    pub fn push_log(&self, kind: LogKind, message: impl Into<String>) {
        let mut state = self.lock();
        self.append(&mut state, kind, message.into());
    }

    fn append(&self, state: &mut JobState, kind: LogKind, message: String) {
        let entry = LogEntry {
            seq: state.next_seq,
            kind,
            message,
            timestamp: now_rfc3339(),
        };
        state.next_seq += 1;
        if self.history_limit > 0 {
            if state.history.len() == self.history_limit {
                state.history.pop_front();
            }
            state.history.push_back(entry.clone());
        }
        state.pending.push(entry);
    }

    /// Applies classifier output from one line atomically.
    pub fn apply(&self, events: Vec<LineEvent>) {
        if events.is_empty() {
            return;
        }
        let mut state = self.lock();
        for event in events {
            match event {
                LineEvent::Phase { phase } => {
                    if phase < state.phase {
                        warn!(
                            "job {} phase went backwards: {} -> {}",
                            self.id, state.phase, phase
                        );
                    }
                    state.phase = phase;
                }
                LineEvent::Log { kind, message } => self.append(&mut state, kind, message),
            }
        }
    }

    pub fn set_workdir(&self, dir: &Path) {
        self.lock().workdir = Some(dir.to_path_buf());
    }

    /// Moves the job to its terminal state. Later calls are ignored.
    ///
    /// `results` is kept only on success so a failed run never exposes
    /// counters.
    pub fn finish(&self, success: bool, results: Option<ResultRecord>, message: impl Into<String>) {
        let mut state = self.lock();
        if state.status.is_terminal() {
            return;
        }
        if success {
            state.status = JobStatus::Completed;
            state.results = results;
            self.append(&mut state, LogKind::Success, message.into());
        } else {
            state.status = JobStatus::Failed;
            self.append(&mut state, LogKind::Error, message.into());
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.finish(false, None, message);
    }

    /// Returns and clears every log entry produced since the last drain.
    pub fn drain(&self) -> PollSnapshot {
        let mut state = self.lock();
        let logs = std::mem::take(&mut state.pending);
        Self::snapshot(&state, logs)
    }

    /// Returns retained entries newer than `cursor` without draining.
    pub fn read_since(&self, cursor: u64) -> PollSnapshot {
        let state = self.lock();
        let logs = state
            .history
            .iter()
            .filter(|entry| entry.seq > cursor)
            .cloned()
            .collect();
        Self::snapshot(&state, logs)
    }

    fn snapshot(state: &JobState, logs: Vec<LogEntry>) -> PollSnapshot {
        PollSnapshot {
            status: state.status,
            phase: state.phase,
            logs,
            cursor: state.next_seq - 1,
            results: match state.status {
                JobStatus::Completed => state.results.clone(),
                _ => None,
            },
        }
    }
}
