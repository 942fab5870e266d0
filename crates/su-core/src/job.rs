//! Component M — the background job manager (spec §4.M).
//!
//! A `&`-suffixed language call is handed to a worker pool instead of run
//! inline. A foreign runtime call may block, so background jobs need real OS
//! threads rather than a cooperative, single-threaded scheduler. The
//! `threadpool` crate supplies the worker pool; a bounded `mpsc` channel
//! carries completion notifications back to whoever is polling jobs.
//!
//! `Value` itself is `Send` (its containers are `Arc`/`Mutex`), but a job's
//! result still crosses the thread boundary in its already marshalled form
//! (component N, spec §4.N): the closure a caller submits owns an isolated
//! adapter clone, not a borrow of the caller's scope, so marshalling keeps
//! the job's output self-contained the same way a real foreign-process
//! adapter's output would be. The engine converts back to `Value` on the
//! polling side via [`crate::marshal::from_foreign`].

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};

use serde_json::Value as Json;
use threadpool::ThreadPool;

use crate::error::Error;

pub type JobId = u64;

#[derive(Debug, Clone)]
pub enum JobState {
    Running,
    Completed(Json),
    Failed(Error),
}

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub language: String,
    pub state: JobState,
}

struct Shared {
    jobs: Mutex<Vec<JobRecord>>,
}

/// A notification emitted when a background job finishes, successfully or
/// not (spec §4.M).
#[derive(Debug, Clone)]
pub struct JobNotification {
    pub id: JobId,
    pub state: JobState,
}

/// Owns the worker pool and the job table. `notify_capacity` bounds the
/// completion channel; if it fills up (nobody has polled notifications in a
/// while) further completions are dropped from the channel but the job
/// table itself always reflects the final state, so `get`/`list` remain
/// authoritative even if a notification was missed (spec §4.M back-pressure
/// note).
pub struct JobManager {
    pool: ThreadPool,
    shared: Arc<Shared>,
    next_id: Mutex<JobId>,
    notify_tx: SyncSender<JobNotification>,
    notify_rx: Mutex<Receiver<JobNotification>>,
}

impl JobManager {
    #[must_use]
    pub fn new(worker_threads: usize, notify_capacity: usize) -> Self {
        let (notify_tx, notify_rx) = sync_channel(notify_capacity.max(1));
        Self {
            pool: ThreadPool::new(worker_threads.max(1)),
            shared: Arc::new(Shared { jobs: Mutex::new(Vec::new()) }),
            next_id: Mutex::new(1),
            notify_tx,
            notify_rx: Mutex::new(notify_rx),
        }
    }

    /// Submits `work` to run on the pool. `work` must be `Send` because it
    /// crosses a thread boundary; callers build it from an isolated adapter
    /// clone (spec §4.K `isolate`) plus whatever values the call closed
    /// over.
    pub fn submit<F>(&self, language: &str, work: F) -> JobId
    where
        F: FnOnce() -> Result<Json, Error> + Send + 'static,
    {
        let id = {
            let mut next = self.next_id.lock().expect("job id lock poisoned");
            let id = *next;
            *next += 1;
            id
        };
        {
            let mut jobs = self.shared.jobs.lock().expect("job table lock poisoned");
            jobs.push(JobRecord { id, language: language.to_string(), state: JobState::Running });
        }

        let shared = Arc::clone(&self.shared);
        let notify_tx = self.notify_tx.clone();
        self.pool.execute(move || {
            let state = match work() {
                Ok(value) => JobState::Completed(value),
                Err(err) => JobState::Failed(err),
            };
            {
                let mut jobs = shared.jobs.lock().expect("job table lock poisoned");
                if let Some(record) = jobs.iter_mut().find(|r| r.id == id) {
                    record.state = state.clone();
                }
            }
            if let Err(TrySendError::Full(_)) = notify_tx.try_send(JobNotification { id, state }) {
                // Notification channel saturated: the job table already has
                // the final state, so this is a dropped convenience signal,
                // not data loss.
            }
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: JobId) -> Option<JobRecord> {
        self.shared.jobs.lock().expect("job table lock poisoned").iter().find(|r| r.id == id).cloned()
    }

    #[must_use]
    pub fn list(&self) -> Vec<JobRecord> {
        self.shared.jobs.lock().expect("job table lock poisoned").clone()
    }

    /// Drains any notifications currently queued, without blocking.
    pub fn poll_notifications(&self) -> Vec<JobNotification> {
        let rx = self.notify_rx.lock().expect("notification channel lock poisoned");
        rx.try_iter().collect()
    }

    /// Blocks the whole pool until every submitted job has run (used by
    /// batch-mode execution so the process doesn't exit mid-background-job).
    pub fn join(&self) {
        self.pool.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn submit_completes_and_is_observable_via_get() {
        let mgr = JobManager::new(2, 8);
        let id = mgr.submit("lua", || Ok(Json::from(7)));
        mgr.join();
        match mgr.get(id).unwrap().state {
            JobState::Completed(json) => assert_eq!(json, Json::from(7)),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn failed_job_state_carries_the_error() {
        let mgr = JobManager::new(1, 8);
        let id = mgr.submit("py", || Err(Error::foreign_runtime("py", "RuntimeError: boom")));
        mgr.join();
        assert!(matches!(mgr.get(id).unwrap().state, JobState::Failed(_)));
    }

    #[test]
    fn list_reports_all_submitted_jobs() {
        let mgr = JobManager::new(2, 8);
        mgr.submit("lua", || Ok(Json::Null));
        mgr.submit("py", || Ok(Json::Null));
        mgr.join();
        assert_eq!(mgr.list().len(), 2);
    }

    #[test]
    fn notifications_are_eventually_observable() {
        let mgr = JobManager::new(1, 8);
        mgr.submit("lua", || Ok(Json::Bool(true)));
        mgr.join();
        thread::sleep(Duration::from_millis(10));
        let notes = mgr.poll_notifications();
        assert_eq!(notes.len(), 1);
    }
}
