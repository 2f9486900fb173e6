//! Download worker loop.
//!
//! Each worker repeatedly: observes the pool-wide pacing signal, pops one
//! task, sleeps the mandatory politeness delay, downloads, and marks the
//! task terminal (or requeues it after a 429). Workers exit when the
//! queue is drained or cancellation is requested; a transport error never
//! terminates a worker.

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::ProgressBar;
use rand::Rng;

use crate::cancel::is_cancel_requested;
use crate::error::TransportError;
use crate::http;
use crate::queue::TaskQueue;
use crate::success_log::SuccessLog;
use crate::task::DownloadTask;

/// Mandatory politeness sleep before every outbound request, whole seconds
const POLITENESS_SECS: RangeInclusive<u64> = 1..=5;

/// Pool-wide pause after an observed rate-limit response, whole seconds
const BACKOFF_SECS: RangeInclusive<u64> = 1..=10;

/// Everything a worker borrows from the run. All fields are shared
/// read-only or internally synchronized.
pub struct WorkerContext<'a> {
    pub queue: &'a TaskQueue,
    pub output_dir: &'a Path,
    pub success_log: Option<&'a SuccessLog>,
    pub bar: &'a ProgressBar,
}

/// Run one worker until the queue is empty or the run is cancelled.
pub fn run_worker(ctx: &WorkerContext<'_>) {
    while !is_cancel_requested() {
        // Coarse pool-wide backoff: if the last outcome observed anywhere
        // was a 429, pause before taking more work.
        if ctx.queue.should_back_off() {
            sleep_random(BACKOFF_SECS);
        }

        let Some(task) = ctx.queue.pop() else { break };

        // Every request is throttled, not just ones following a 429.
        sleep_random(POLITENESS_SECS);

        match attempt(ctx, &task) {
            Ok(local_path) => {
                ctx.queue.record_outcome(false);
                ctx.queue.mark_succeeded(&task);
                if let Some(success_log) = ctx.success_log {
                    if let Err(e) = success_log.append(&task, &local_path) {
                        log::warn!("{}: success log write failed: {e}", task.file_name);
                    }
                }
                ctx.bar.inc(1);
                update_postfix(ctx);
            }
            Err(e) if e.is_rate_limited() => {
                ctx.queue.record_outcome(true);
                let name = task.file_name.clone();
                if ctx.queue.requeue(task) {
                    log::warn!("{name}: rate limited, requeued");
                } else {
                    log::error!("{name}: gave up after repeated rate limiting");
                    ctx.bar.inc(1);
                }
                update_postfix(ctx);
            }
            Err(e) => {
                ctx.queue.record_outcome(false);
                log::error!("{} ({}): download failed: {e}", task.file_name, task.url);
                ctx.queue.mark_failed(task, e.to_string());
                ctx.bar.inc(1);
                update_postfix(ctx);
            }
        }
    }
}

/// Create the target directory and download one document into it.
fn attempt(ctx: &WorkerContext<'_>, task: &DownloadTask) -> Result<PathBuf, TransportError> {
    let dir = ctx.output_dir.join(task.output_subdir());
    fs::create_dir_all(&dir)?;
    let dest = dir.join(&task.file_name);
    http::download_to_file(task.url.as_str(), &dest)?;
    Ok(dest)
}

fn update_postfix(ctx: &WorkerContext<'_>) {
    ctx.bar.set_message(format!(
        "ok {} / err {} / left {}",
        ctx.queue.completed_count(),
        ctx.queue.failed_count(),
        ctx.queue.remaining()
    ));
}

fn sleep_random(range: RangeInclusive<u64>) {
    let secs = rand::thread_rng().gen_range(range);
    std::thread::sleep(Duration::from_secs(secs));
}
