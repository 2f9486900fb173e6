//! Error types for the acquisition pipeline

/// Per-field validation failure for one index record.
///
/// Raised while turning a raw index row into a [`FilingRecord`] or a
/// [`DownloadTask`]; the offending record is dropped and logged, never
/// fatal to the run.
///
/// [`FilingRecord`]: crate::validate::FilingRecord
/// [`DownloadTask`]: crate::task::DownloadTask
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// CIK field is not a positive integer
    InvalidCik(String),
    /// Form type contains lower-case letters or non-alphanumeric residue
    InvalidFormType(String),
    /// Filed date does not parse as a calendar date
    InvalidDate(String),
    /// Partial path does not end with the plain-text extension
    InvalidFileName(String),
    /// Resolved download URL is not well-formed
    InvalidUrl(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCik(raw) => write!(f, "invalid CIK: {raw:?} is not an integer"),
            Self::InvalidFormType(raw) => {
                write!(f, "invalid form type: {raw:?} is not upper-case or digits")
            }
            Self::InvalidDate(raw) => write!(f, "invalid filed date: {raw:?}"),
            Self::InvalidFileName(raw) => {
                write!(f, "invalid file name: {raw:?} does not end with .txt")
            }
            Self::InvalidUrl(raw) => write!(f, "invalid download url: {raw}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Per-task transport failure (document download).
///
/// Marks the task failed (or requeued for 429) and updates the pool-wide
/// pacing signal; the worker continues with the next task.
#[derive(Debug)]
pub enum TransportError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Local I/O error while writing the downloaded file
    Io(std::io::Error),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// Whether the archive asked us to slow down (HTTP 429).
    ///
    /// Drives the pool-wide backoff signal and requeue-instead-of-fail.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Http { status: Some(429), .. })
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Index-level fetch failure for one period.
///
/// Treated as "no data for this period" by the runner; the run continues
/// with the next period.
#[derive(Debug)]
pub enum FetchError {
    /// Network or HTTP failure fetching the compressed index
    Transport(TransportError),
    /// The downloaded archive could not be opened or is missing master.idx
    Archive(zip::result::ZipError),
    /// Local cache read/write failure
    Io(std::io::Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{e}"),
            Self::Archive(e) => write!(f, "archive: {e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<zip::result::ZipError> for FetchError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e)
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> TransportError {
        TransportError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn http_429_is_rate_limited() {
        assert!(http_err(429).is_rate_limited());
    }

    #[test]
    fn http_500_not_rate_limited() {
        assert!(!http_err(500).is_rate_limited());
    }

    #[test]
    fn http_none_status_not_rate_limited() {
        let err = TransportError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn io_not_rate_limited() {
        let err = TransportError::Io(std::io::Error::other("disk"));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn display_http_with_status() {
        assert_eq!(format!("{}", http_err(404)), "HTTP 404: test");
    }

    #[test]
    fn display_validation_form_type() {
        let err = ValidationError::InvalidFormType("10-k".to_string());
        assert!(format!("{err}").contains("10-k"));
    }

    #[test]
    fn fetch_error_wraps_transport() {
        let err = FetchError::from(http_err(503));
        assert!(format!("{err}").contains("503"));
    }
}
