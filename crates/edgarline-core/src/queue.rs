//! Shared task queue for the download worker pool.
//!
//! One queue is constructed per period run and passed by reference into
//! every worker; there is no process-global state. Pop and mark operations
//! are indivisible. No ordering is guaranteed across tasks; the only
//! contract is exactly-once delivery per task.
//!
//! The queue also carries the pool-wide pacing signal: after every HTTP
//! attempt a worker records whether the archive rate-limited it, and every
//! worker observes that signal before its next pop. Backoff granularity is
//! pool-wide, not per-worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::task::DownloadTask;

/// A 429'd task is put back this many times before it is marked failed.
pub const MAX_REQUEUES: u32 = 3;

/// A task in its terminal failed state, with the reason it got there.
#[derive(Debug)]
pub struct FailedTask {
    pub task: DownloadTask,
    pub reason: String,
}

/// Terminal state of a drained queue.
#[derive(Debug, Default)]
pub struct QueueResults {
    pub completed: FxHashSet<String>,
    pub failed: Vec<FailedTask>,
}

#[derive(Default)]
struct QueueInner {
    /// Pending tasks keyed by file name (set semantics per run)
    pending: FxHashMap<String, DownloadTask>,
    /// Every file name ever accepted this run, for duplicate rejection
    accepted: FxHashSet<String>,
    /// Requeue count per file name after rate-limit responses
    requeues: FxHashMap<String, u32>,
    completed: FxHashSet<String>,
    failed: Vec<FailedTask>,
}

pub struct TaskQueue {
    inner: Mutex<QueueInner>,
    rate_limited: AtomicBool,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            rate_limited: AtomicBool::new(false),
        }
    }

    /// Add tasks to the pending set. A file name enters the queue at most
    /// once per run; duplicates are no-ops. Returns how many were accepted.
    pub fn enqueue_all(&self, tasks: Vec<DownloadTask>) -> usize {
        let mut inner = self.lock();
        let mut added = 0;
        for task in tasks {
            if inner.accepted.insert(task.file_name.clone()) {
                inner.pending.insert(task.file_name.clone(), task);
                added += 1;
            }
        }
        added
    }

    /// Atomically remove and return one pending task, or `None` when the
    /// queue is drained. No ordering guarantee over which task comes out.
    pub fn pop(&self) -> Option<DownloadTask> {
        let mut inner = self.lock();
        let key = inner.pending.keys().next().cloned()?;
        inner.pending.remove(&key)
    }

    /// Move a task into the completed set.
    pub fn mark_succeeded(&self, task: &DownloadTask) {
        self.lock().completed.insert(task.file_name.clone());
    }

    /// Move a task into the terminal failed set.
    pub fn mark_failed(&self, task: DownloadTask, reason: String) {
        self.lock().failed.push(FailedTask { task, reason });
    }

    /// Put a rate-limited task back into the pending set.
    ///
    /// After [`MAX_REQUEUES`] the task is marked failed instead and `false`
    /// is returned, so a persistently throttled run still terminates.
    pub fn requeue(&self, task: DownloadTask) -> bool {
        let mut inner = self.lock();
        let count = *inner
            .requeues
            .entry(task.file_name.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);
        if count > MAX_REQUEUES {
            let reason = format!("rate limited; gave up after {MAX_REQUEUES} requeues");
            inner.failed.push(FailedTask { task, reason });
            return false;
        }
        inner.pending.insert(task.file_name.clone(), task);
        true
    }

    /// Record the outcome of an HTTP attempt for the pacing signal.
    pub fn record_outcome(&self, rate_limited: bool) {
        self.rate_limited.store(rate_limited, Ordering::Relaxed);
    }

    /// Whether the most recently recorded outcome anywhere in the pool was
    /// a rate-limit response.
    pub fn should_back_off(&self) -> bool {
        self.rate_limited.load(Ordering::Relaxed)
    }

    pub fn remaining(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn completed_count(&self) -> usize {
        self.lock().completed.len()
    }

    pub fn failed_count(&self) -> usize {
        self.lock().failed.len()
    }

    /// Consume the queue into its terminal sets.
    pub fn into_results(self) -> QueueResults {
        let inner = self
            .inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        QueueResults {
            completed: inner.completed,
            failed: inner.failed,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
