//! Download task construction.
//!
//! A task is a value object derived from a validated [`FilingRecord`] plus
//! the archive base URL. Identity for deduplication is the resolved file
//! name, which is also how the queue and the seen-file set key tasks.

use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use chrono::Datelike;
use url::Url;

use crate::error::ValidationError;
use crate::validate::FilingRecord;

/// One document to download.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub cik: u64,
    pub company_name: String,
    pub form_type: String,
    /// Resolved trailing file name, the dedup identity
    pub file_name: String,
    /// Absolute, validated download URL
    pub url: Url,
    pub year: i32,
    /// Calendar quarter label of the filed date, `Q1`..`Q4`
    pub quarter_label: &'static str,
}

impl DownloadTask {
    /// Resolve a record against the archive base URL.
    pub fn from_record(record: &FilingRecord, base: &Url) -> Result<Self, ValidationError> {
        let url = base
            .join(&record.partial_path)
            .map_err(|e| ValidationError::InvalidUrl(format!("{}: {e}", record.partial_path)))?;
        let file_name = record
            .partial_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            cik: record.cik,
            company_name: record.company_name.clone(),
            form_type: record.form_type.clone(),
            file_name,
            url,
            year: record.date_filed.year(),
            quarter_label: quarter_label(record.date_filed.month()),
        })
    }

    /// Output subdirectory relative to the run's output root:
    /// `{formTypeSanitized}/{year}/{quarterLabel}`.
    pub fn output_subdir(&self) -> PathBuf {
        PathBuf::from(sanitize_form_type(&self.form_type))
            .join(self.year.to_string())
            .join(self.quarter_label)
    }
}

// Task identity is the resolved file name only.
impl PartialEq for DownloadTask {
    fn eq(&self, other: &Self) -> bool {
        self.file_name == other.file_name
    }
}

impl Eq for DownloadTask {}

impl Hash for DownloadTask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_name.hash(state);
    }
}

/// Calendar quarter label for a filed-date month.
pub fn quarter_label(month: u32) -> &'static str {
    match month {
        1..=3 => "Q1",
        4..=6 => "Q2",
        7..=9 => "Q3",
        _ => "Q4",
    }
}

/// Strip path separators from a form type so codes like `S-1/A` produce a
/// single directory component.
pub fn sanitize_form_type(form_type: &str) -> String {
    form_type
        .chars()
        .filter(|c| !matches!(c, '/' | '\\'))
        .collect()
}
