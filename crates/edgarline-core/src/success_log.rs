//! Crash-safe bookkeeping of completed downloads.
//!
//! `success.txt` is an append-only, pipe-delimited audit trail with one
//! line per completed download. It is never rewritten; future runs read
//! it (together with a scan of the output directory) to build the
//! seen-file set that keeps re-runs from downloading the same documents.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rustc_hash::FxHashSet;
use walkdir::WalkDir;

use crate::task::DownloadTask;

/// File name of the success log inside the cache directory
pub const SUCCESS_LOG_NAME: &str = "success.txt";

/// Column position of the file name in a success-log line
const FILE_NAME_FIELD: usize = 3;

/// Serialized append-only writer over `success.txt`.
///
/// Each entry is formatted into a single buffer and written with one
/// `write_all` under the lock, so concurrent workers never interleave
/// partial lines.
pub struct SuccessLog {
    file: Mutex<File>,
    path: PathBuf,
}

impl SuccessLog {
    /// Open (creating if absent) the success log inside `cache_dir`.
    pub fn open(cache_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(cache_dir)?;
        let path = cache_dir.join(SUCCESS_LOG_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one completed download:
    /// `cik|company|formType|fileName|year|quarterLabel|url|localPath`.
    pub fn append(&self, task: &DownloadTask, local_path: &Path) -> std::io::Result<()> {
        let line = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}\n",
            task.cik,
            task.company_name,
            task.form_type,
            task.file_name,
            task.year,
            task.quarter_label,
            task.url,
            local_path.display()
        );
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(line.as_bytes())
    }
}

/// File names recorded in an existing success log, if any.
pub fn load_logged_files(cache_dir: &Path) -> std::io::Result<FxHashSet<String>> {
    let path = cache_dir.join(SUCCESS_LOG_NAME);
    if !path.exists() {
        return Ok(FxHashSet::default());
    }
    let text = std::fs::read_to_string(&path)?;
    Ok(text
        .lines()
        .filter_map(|line| line.split('|').nth(FILE_NAME_FIELD))
        .map(str::to_string)
        .collect())
}

/// Recursively collect downloaded document names under the output
/// directory. Only plain-text and HTML documents count as seen.
pub fn scan_output_dir(output_dir: &Path) -> FxHashSet<String> {
    WalkDir::new(output_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_str()?;
            (name.ends_with(".txt") || name.ends_with(".html")).then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::FilingRecord;
    use url::Url;

    fn task(name: &str) -> DownloadTask {
        let rec = FilingRecord::from_raw(
            "90810312",
            "MAGIC COMPANY",
            "10-K",
            "2017-2-9",
            &format!("edgar/data/90810312/{name}"),
        )
        .unwrap();
        let base = Url::parse("https://www.sec.gov/Archives/").unwrap();
        DownloadTask::from_record(&rec, &base).unwrap()
    }

    #[test]
    fn append_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = SuccessLog::open(dir.path()).unwrap();
        log.append(&task("a.txt"), Path::new("/out/10-K/2017/Q1/a.txt"))
            .unwrap();
        log.append(&task("b.txt"), Path::new("/out/10-K/2017/Q1/b.txt"))
            .unwrap();
        let seen = load_logged_files(dir.path()).unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("a.txt"));
        assert!(seen.contains("b.txt"));
    }

    #[test]
    fn entry_layout_is_pipe_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let log = SuccessLog::open(dir.path()).unwrap();
        log.append(&task("a.txt"), Path::new("/out/10-K/2017/Q1/a.txt"))
            .unwrap();
        let text = std::fs::read_to_string(log.path()).unwrap();
        let fields: Vec<&str> = text.trim_end().split('|').collect();
        assert_eq!(
            fields,
            vec![
                "90810312",
                "MAGIC COMPANY",
                "10-K",
                "a.txt",
                "2017",
                "Q1",
                "https://www.sec.gov/Archives/edgar/data/90810312/a.txt",
                "/out/10-K/2017/Q1/a.txt",
            ]
        );
    }

    #[test]
    fn load_missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_logged_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn reopen_appends_not_truncates() {
        let dir = tempfile::tempdir().unwrap();
        {
            let log = SuccessLog::open(dir.path()).unwrap();
            log.append(&task("a.txt"), Path::new("/out/a.txt")).unwrap();
        }
        {
            let log = SuccessLog::open(dir.path()).unwrap();
            log.append(&task("b.txt"), Path::new("/out/b.txt")).unwrap();
        }
        assert_eq!(load_logged_files(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn scan_finds_text_and_html_only() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("10-K/2017/Q1");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("a.txt"), "x").unwrap();
        std::fs::write(nested.join("b.html"), "x").unwrap();
        std::fs::write(nested.join("c.part"), "x").unwrap();
        let seen = scan_output_dir(dir.path());
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("a.txt"));
        assert!(seen.contains("b.html"));
    }

    #[test]
    fn scan_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(scan_output_dir(&missing).is_empty());
    }
}
