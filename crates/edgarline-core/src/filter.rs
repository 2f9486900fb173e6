//! Candidate filtering between index parse and task construction.
//!
//! Three independent filters applied in a fixed order: already-downloaded
//! file names, form-type allow-list, CIK allow-list. The order only
//! affects what gets logged, not the final set.

use rustc_hash::FxHashSet;
use url::Url;

use crate::index::{PeriodKey, RawEntry};
use crate::task::DownloadTask;
use crate::validate::FilingRecord;

/// Filter configuration for one run. Empty allow-lists disable the
/// corresponding filter.
#[derive(Debug)]
pub struct RecordFilter<'a> {
    pub seen_files: &'a FxHashSet<String>,
    pub form_types: &'a [String],
    pub ciks: &'a [u64],
}

impl RecordFilter<'_> {
    /// Narrow the parsed entry set for one period.
    pub fn apply(&self, mut entries: Vec<RawEntry>, period: PeriodKey) -> Vec<RawEntry> {
        let original = entries.len();

        entries.retain(|e| !self.seen_files.contains(&e.file_name));
        log::info!(
            "{period}: index rows: {original}, prior downloads skipped: {}, remaining: {}",
            original - entries.len(),
            entries.len()
        );

        for e in &mut entries {
            e.form_type = e.form_type.trim().to_string();
        }
        if !self.form_types.is_empty() {
            let present: FxHashSet<&str> =
                entries.iter().map(|e| e.form_type.as_str()).collect();
            for wanted in self.form_types {
                if !present.contains(wanted.as_str()) {
                    log::warn!("{period}: form type {wanted} not present in index");
                }
            }
            entries.retain(|e| self.form_types.contains(&e.form_type));
        }

        if !self.ciks.is_empty() {
            entries.retain(|e| {
                e.cik
                    .trim()
                    .parse::<u64>()
                    .is_ok_and(|cik| self.ciks.contains(&cik))
            });
            log::info!("{period}: {} rows match the CIK list", entries.len());
        }

        entries
    }
}

/// Validate surviving entries and resolve them into download tasks.
///
/// An entry failing validation or URL resolution is dropped with a logged
/// reason; it never aborts the run.
pub fn build_tasks(entries: &[RawEntry], base: &Url) -> Vec<DownloadTask> {
    entries
        .iter()
        .filter_map(|e| {
            let task = FilingRecord::from_raw(
                &e.cik,
                &e.company_name,
                &e.form_type,
                &e.date_filed,
                &e.partial_path,
            )
            .map_err(|err| err.to_string())
            .and_then(|rec| {
                DownloadTask::from_record(&rec, base).map_err(|err| err.to_string())
            });
            match task {
                Ok(task) => Some(task),
                Err(reason) => {
                    log::warn!("dropping index row {}: {reason}", e.file_name);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::parse_index_lines;

    const HEADER: &str = "CIK|Company Name|Form Type|Date Filed|Filename";

    fn entries(rows: &[&str]) -> Vec<RawEntry> {
        let mut lines = vec![HEADER.to_string()];
        lines.extend(rows.iter().map(|s| s.to_string()));
        parse_index_lines(&lines)
    }

    fn period() -> PeriodKey {
        PeriodKey::new(2017, 1).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://www.sec.gov/Archives/").unwrap()
    }

    fn sample() -> Vec<RawEntry> {
        entries(&[
            "90810312|MAGIC COMPANY|10-K|2017-2-9|/edgar/data/08912031231.txt",
            "32472152|MAGICAL COMPANY|10-K|2015-2-9|/edgar/data/32472152.txt",
            "24275120|SUPER MAGIC COMPANY|10-Q|2017-1-30|/edgar/data/24275120.txt",
        ])
    }

    #[test]
    fn no_filters_keeps_everything() {
        let seen = FxHashSet::default();
        let filter = RecordFilter {
            seen_files: &seen,
            form_types: &[],
            ciks: &[],
        };
        assert_eq!(filter.apply(sample(), period()).len(), 3);
    }

    #[test]
    fn seen_files_are_dropped() {
        let seen: FxHashSet<String> = ["32472152.txt".to_string()].into_iter().collect();
        let filter = RecordFilter {
            seen_files: &seen,
            form_types: &[],
            ciks: &[],
        };
        let out = filter.apply(sample(), period());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.file_name != "32472152.txt"));
    }

    #[test]
    fn full_seen_set_converges_to_empty() {
        // Re-running with the prior run's full output as the seen set
        // leaves no work
        let seen: FxHashSet<String> = sample().into_iter().map(|e| e.file_name).collect();
        let filter = RecordFilter {
            seen_files: &seen,
            form_types: &[],
            ciks: &[],
        };
        assert!(filter.apply(sample(), period()).is_empty());
    }

    #[test]
    fn form_type_allow_list() {
        let seen = FxHashSet::default();
        let forms = vec!["10-Q".to_string()];
        let filter = RecordFilter {
            seen_files: &seen,
            form_types: &forms,
            ciks: &[],
        };
        let out = filter.apply(sample(), period());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cik, "24275120");
    }

    #[test]
    fn absent_form_type_leaves_nothing() {
        let seen = FxHashSet::default();
        let forms = vec!["S-1".to_string()];
        let filter = RecordFilter {
            seen_files: &seen,
            form_types: &forms,
            ciks: &[],
        };
        assert!(filter.apply(sample(), period()).is_empty());
    }

    #[test]
    fn form_types_match_after_trimming() {
        let seen = FxHashSet::default();
        let forms = vec!["10-K".to_string()];
        let filter = RecordFilter {
            seen_files: &seen,
            form_types: &forms,
            ciks: &[],
        };
        let rows = entries(&["1|PADDED CORP|  10-K  |2017-2-9|edgar/data/1/p.txt"]);
        assert_eq!(filter.apply(rows, period()).len(), 1);
    }

    #[test]
    fn cik_allow_list() {
        let seen = FxHashSet::default();
        let ciks = vec![90810312u64];
        let filter = RecordFilter {
            seen_files: &seen,
            form_types: &[],
            ciks: &ciks,
        };
        let out = filter.apply(sample(), period());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].file_name, "08912031231.txt");
    }

    #[test]
    fn build_tasks_resolves_valid_entries() {
        let tasks = build_tasks(&sample(), &base());
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].file_name, "08912031231.txt");
    }

    #[test]
    fn build_tasks_drops_invalid_rows() {
        let rows = entries(&[
            "90810312|MAGIC COMPANY|10-K|2017-2-9|/edgar/data/08912031231.txt",
            "not-a-cik|BROKEN CO|10-K|2017-2-9|/edgar/data/broken.txt",
            "5|LOWER CO|10-k|2017-2-9|/edgar/data/lower.txt",
            "6|HTML CO|10-K|2017-2-9|/edgar/data/page.html",
        ]);
        let tasks = build_tasks(&rows, &base());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].cik, 90810312);
    }
}
