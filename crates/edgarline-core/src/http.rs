//! Shared HTTP plumbing.
//!
//! Uses async reqwest internally but presents a sync interface so that
//! rayon download workers can call it directly.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::TransportError;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request timeout covering the whole body transfer
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// EDGAR rejects requests without a descriptive User-Agent
const USER_AGENT: &str = concat!("edgarline/", env!("CARGO_PKG_VERSION"));

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// HTTP GET returning the full response body.
///
/// Non-success statuses map to [`TransportError::Http`] with the status
/// attached so callers can distinguish 429 from everything else.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>, TransportError> {
    SHARED_RUNTIME.handle().block_on(async {
        let response = SHARED_CLIENT
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TransportError::from_reqwest(&e))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;
        Ok(body.to_vec())
    })
}

/// Download `url` to `dest`, write-then-rename.
///
/// The body lands in `<dest>.part` first so a crash mid-write never leaves
/// a truncated file where the seen-file scan would find it.
pub fn download_to_file(url: &str, dest: &Path) -> Result<(), TransportError> {
    let body = fetch_bytes(url)?;
    let tmp = dest.with_extension("part");
    fs::write(&tmp, &body)?;
    fs::rename(&tmp, dest)?;
    Ok(())
}
