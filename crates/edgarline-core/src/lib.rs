//! edgarline core - concurrent acquisition pipeline for SEC EDGAR filings
//!
//! Fetches quarterly master indexes, filters candidate filings against
//! prior runs, and drives a bounded worker pool that downloads the
//! remaining documents under a politeness/rate-limit policy.

pub mod cancel;
pub mod error;
pub mod filter;
pub mod http;
pub mod index;
pub mod logging;
pub mod progress;
pub mod queue;
pub mod runner;
pub mod success_log;
pub mod task;
pub mod validate;
pub mod worker;

// Re-exports for convenience
pub use cancel::{cancel_flag, is_cancel_requested, request_cancel};
pub use error::{FetchError, TransportError, ValidationError};
pub use filter::{build_tasks, RecordFilter};
pub use index::{fetch_period_index, parse_index_lines, PeriodKey, RawEntry};
pub use logging::init_logging;
pub use progress::{ProgressContext, SharedProgress};
pub use queue::{FailedTask, TaskQueue};
pub use runner::{run, RunConfig, RunReport, RunSummary};
pub use success_log::{load_logged_files, scan_output_dir, SuccessLog};
pub use task::DownloadTask;
pub use validate::FilingRecord;
