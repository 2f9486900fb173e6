//! Offline pipeline scenario: index lines through parse, filter and task
//! construction. No network involved.

use rustc_hash::FxHashSet;
use url::Url;

use edgarline_core::{build_tasks, parse_index_lines, PeriodKey, RecordFilter};

const INDEX_LINES: &[&str] = &[
    "CIK|Company Name|Form Type|Date Filed|Filename",
    "90810312|MAGIC COMPANY|10-K|2017-2-9|/edgar/data/08912031231.txt",
    "32472152|MAGICAL COMPANY|10-K|2015-2-9|/edgar/data/32472152.txt",
];

fn base() -> Url {
    Url::parse("https://www.sec.gov/Archives/").unwrap()
}

fn period() -> PeriodKey {
    PeriodKey::new(2017, 1).unwrap()
}

fn run_filter(seen: &FxHashSet<String>, forms: &[String]) -> Vec<String> {
    let entries = parse_index_lines(INDEX_LINES);
    let filter = RecordFilter {
        seen_files: seen,
        form_types: forms,
        ciks: &[],
    };
    let surviving = filter.apply(entries, period());
    build_tasks(&surviving, &base())
        .into_iter()
        .map(|t| t.file_name)
        .collect()
}

#[test]
fn fresh_run_yields_both_documents() {
    let seen = FxHashSet::default();
    let names = run_filter(&seen, &["10-K".to_string()]);
    assert_eq!(names, vec!["08912031231.txt", "32472152.txt"]);
}

#[test]
fn seen_file_is_excluded() {
    let seen: FxHashSet<String> = ["32472152.txt".to_string()].into_iter().collect();
    let names = run_filter(&seen, &["10-K".to_string()]);
    assert_eq!(names, vec!["08912031231.txt"]);
}

#[test]
fn full_seen_set_leaves_no_work() {
    let seen: FxHashSet<String> = ["08912031231.txt".to_string(), "32472152.txt".to_string()]
        .into_iter()
        .collect();
    assert!(run_filter(&seen, &[]).is_empty());
}

#[test]
fn tasks_resolve_urls_and_layout() {
    let seen = FxHashSet::default();
    let entries = parse_index_lines(INDEX_LINES);
    let filter = RecordFilter {
        seen_files: &seen,
        form_types: &[],
        ciks: &[],
    };
    let tasks = build_tasks(&filter.apply(entries, period()), &base());
    assert_eq!(
        tasks[0].url.as_str(),
        "https://www.sec.gov/edgar/data/08912031231.txt"
    );
    assert_eq!(
        tasks[0].output_subdir(),
        std::path::Path::new("10-K/2017/Q1")
    );
    assert_eq!(
        tasks[1].output_subdir(),
        std::path::Path::new("10-K/2015/Q1")
    );
}
