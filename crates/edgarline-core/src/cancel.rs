//! Run cancellation via atomic flag
//!
//! Workers check the flag between iterations and stop handing out new
//! tasks once it is set; an in-flight request or sleep finishes first.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global cancellation flag — set by the SIGTERM/SIGINT handler
pub fn cancel_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Check if cancellation was requested
pub fn is_cancel_requested() -> bool {
    cancel_flag().load(Ordering::Relaxed)
}

/// Request cancellation (for signal handlers)
pub fn request_cancel() {
    cancel_flag().store(true, Ordering::Relaxed);
}
