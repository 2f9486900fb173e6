//! Run orchestration over one or more periods.
//!
//! For each requested period: fetch and parse the index, filter against
//! the seen-file set and allow-lists, build tasks, then drain a fresh
//! queue with a pool of parallel workers. Index trouble skips the period;
//! the run as a whole never aborts on partial failures.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use url::Url;

use crate::cancel::is_cancel_requested;
use crate::filter::{build_tasks, RecordFilter};
use crate::index::{fetch_period_index, PeriodKey};
use crate::progress::ProgressContext;
use crate::queue::{FailedTask, TaskQueue};
use crate::success_log::{load_logged_files, scan_output_dir, SuccessLog};
use crate::worker::{run_worker, WorkerContext};

/// Parameters of one acquisition run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: Url,
    pub output_dir: PathBuf,
    pub cache_dir: Option<PathBuf>,
    /// Periods processed in order, each with its own queue and pool
    pub periods: Vec<PeriodKey>,
    /// Form-type allow-list; empty means all
    pub form_types: Vec<String>,
    /// CIK allow-list; empty means all
    pub ciks: Vec<u64>,
    pub workers: usize,
}

/// Outcome of a run: aggregate counts plus the terminal failed set for
/// inspection and manual retry.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub failed: Vec<FailedTask>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub periods_processed: usize,
    pub periods_skipped: usize,
    pub tasks_enqueued: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn log(&self) {
        log::info!("=== Run Summary ===");
        log::info!(
            "Periods: {} processed ({} skipped, no index data)",
            self.periods_processed,
            self.periods_skipped
        );
        log::info!(
            "Documents: {} downloaded, {} failed, {} enqueued",
            self.downloaded,
            self.failed,
            self.tasks_enqueued
        );
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }
}

/// Execute the acquisition pipeline.
pub fn run(config: &RunConfig, progress: &ProgressContext) -> anyhow::Result<RunReport> {
    let start = Instant::now();

    fs::create_dir_all(&config.output_dir)?;

    // Seen-file set: prior downloads on disk plus the success log.
    let mut seen = scan_output_dir(&config.output_dir);
    log::info!(
        "scanned {}: {} previously downloaded files",
        config.output_dir.display(),
        seen.len()
    );
    let success_log = match &config.cache_dir {
        Some(dir) => {
            seen.extend(load_logged_files(dir)?);
            Some(SuccessLog::open(dir)?)
        }
        None => None,
    };

    let mut summary = RunSummary::default();
    let mut failed_tasks: Vec<FailedTask> = Vec::new();

    for &period in &config.periods {
        if is_cancel_requested() {
            log::warn!("cancellation requested, stopping before {period}");
            break;
        }

        let entries =
            match fetch_period_index(period, &config.base_url, config.cache_dir.as_deref()) {
                Ok(Some(entries)) => entries,
                Ok(None) => {
                    summary.periods_skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::error!("{period}: index unavailable: {e}");
                    summary.periods_skipped += 1;
                    continue;
                }
            };

        let filter = RecordFilter {
            seen_files: &seen,
            form_types: &config.form_types,
            ciks: &config.ciks,
        };
        let remaining = filter.apply(entries, period);
        let tasks = build_tasks(&remaining, &config.base_url);

        let queue = TaskQueue::new();
        let accepted = queue.enqueue_all(tasks);
        summary.tasks_enqueued += accepted;
        summary.periods_processed += 1;
        if accepted == 0 {
            log::info!("{period}: nothing to download");
            continue;
        }

        log::info!(
            "{period}: downloading {accepted} documents with {} workers",
            config.workers
        );
        let bar = progress.period_bar(&period.to_string(), accepted);
        rayon::scope(|s| {
            for _ in 0..config.workers {
                s.spawn(|_| {
                    let ctx = WorkerContext {
                        queue: &queue,
                        output_dir: &config.output_dir,
                        success_log: success_log.as_ref(),
                        bar: &bar,
                    };
                    run_worker(&ctx);
                });
            }
        });
        bar.finish_and_clear();

        let results = queue.into_results();
        summary.downloaded += results.completed.len();
        summary.failed += results.failed.len();
        for f in &results.failed {
            log::error!(
                "{period}: failed: {} ({}): {}",
                f.task.file_name,
                f.task.url,
                f.reason
            );
        }
        // Later periods (and re-runs) must not re-download these.
        seen.extend(results.completed);
        failed_tasks.extend(results.failed);
    }

    summary.elapsed = start.elapsed();
    summary.log();

    Ok(RunReport {
        summary,
        failed: failed_tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_log_does_not_panic() {
        let summary = RunSummary {
            periods_processed: 4,
            periods_skipped: 1,
            tasks_enqueued: 100,
            downloaded: 95,
            failed: 5,
            elapsed: Duration::from_secs(60),
        };
        summary.log();
    }

    #[test]
    fn summary_default_is_zeroed() {
        let summary = RunSummary::default();
        assert_eq!(summary.periods_processed, 0);
        assert_eq!(summary.downloaded, 0);
        assert_eq!(summary.elapsed, Duration::ZERO);
    }
}
