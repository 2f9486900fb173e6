//! Quarterly master index fetching and parsing.
//!
//! EDGAR publishes one `master.zip` per quarter containing a single
//! pipe-delimited `master.idx` with columns
//! `CIK|Company Name|Form Type|Date Filed|Filename`. A parsed copy can be
//! cached on disk so repeat runs skip both the network and the re-parse.

use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use url::Url;
use zip::ZipArchive;

use crate::error::{FetchError, TransportError};
use crate::http;

/// Name of the index document inside the quarterly archive
const INDEX_MEMBER: &str = "master.idx";

/// Header written to (and skipped from) the on-disk index cache
const CACHE_HEADER: &str = "CIK|Company Name|Form Type|Date Filed|Filename|fname";

/// One quarter of the archive. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    year: i32,
    quarter: u8,
}

impl PeriodKey {
    /// Construct a period; `quarter` must be 1..=4.
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self { year, quarter })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn quarter(self) -> u8 {
        self.quarter
    }

    /// Remote URL of this period's compressed index.
    pub fn index_url(self, base: &Url) -> Url {
        base.join(&format!(
            "edgar/full-index/{}/QTR{}/master.zip",
            self.year, self.quarter
        ))
        .expect("base url accepts relative index path")
    }

    /// File name of the on-disk parsed-index cache.
    pub fn cache_file_name(self) -> String {
        format!("formidx-{}-{}.csv", self.year, self.quarter)
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} QTR{}", self.year, self.quarter)
    }
}

/// One shape-parsed index row. Fields are raw strings; validation happens
/// later when the row is turned into a [`FilingRecord`].
///
/// [`FilingRecord`]: crate::validate::FilingRecord
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub cik: String,
    pub company_name: String,
    pub form_type: String,
    pub date_filed: String,
    pub partial_path: String,
    /// Trailing component of the partial path, the dedup key
    pub file_name: String,
}

/// Fetch and parse one period's index.
///
/// Returns `Ok(None)` when the archive has no data for the period (any
/// non-success HTTP response, e.g. a future quarter). Archive and cache
/// I/O failures are returned as errors; the caller treats them as a
/// skipped period, never as fatal.
pub fn fetch_period_index(
    period: PeriodKey,
    base: &Url,
    cache_dir: Option<&Path>,
) -> Result<Option<Vec<RawEntry>>, FetchError> {
    if let Some(cache) = cache_path(period, cache_dir) {
        if cache.exists() {
            log::debug!("{period}: index cache hit at {}", cache.display());
            return Ok(Some(load_cache(&cache)?));
        }
    }

    let url = period.index_url(base);
    let body = match http::fetch_bytes(url.as_str()) {
        Ok(body) => body,
        Err(e @ TransportError::Http { .. }) => {
            log::error!("{period}: index fetch failed ({e}): {url}");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let mut archive = ZipArchive::new(Cursor::new(body))?;
    let mut raw = Vec::new();
    archive.by_name(INDEX_MEMBER)?.read_to_end(&mut raw)?;

    let lines = decode_lines(raw, period);
    let entries = parse_index_lines(&lines);

    if let Some(cache) = cache_path(period, cache_dir) {
        save_cache(&cache, &entries)?;
        log::debug!("{period}: cached {} index rows", entries.len());
    }

    Ok(Some(entries))
}

fn cache_path(period: PeriodKey, cache_dir: Option<&Path>) -> Option<PathBuf> {
    cache_dir.map(|d| d.join(period.cache_file_name()))
}

/// Decode the index body as UTF-8, salvaging line by line on failure.
///
/// Lines that still do not decode are counted and dropped.
fn decode_lines(raw: Vec<u8>, period: PeriodKey) -> Vec<String> {
    match String::from_utf8(raw) {
        Ok(text) => text.lines().map(str::to_string).collect(),
        Err(e) => {
            let raw = e.into_bytes();
            let mut dropped = 0usize;
            let lines: Vec<String> = raw
                .split(|&b| b == b'\n')
                .filter_map(|line| match std::str::from_utf8(line) {
                    Ok(s) => Some(s.to_string()),
                    Err(_) => {
                        dropped += 1;
                        None
                    }
                })
                .collect();
            log::debug!("{period}: dropped {dropped} undecodable index lines");
            lines
        }
    }
}

/// Shape-parse raw index lines.
///
/// A line is a record candidate iff it contains exactly four `|`
/// separators. The first surviving row is the column header and is
/// discarded. Never fails.
pub fn parse_index_lines<S: AsRef<str>>(lines: &[S]) -> Vec<RawEntry> {
    lines
        .iter()
        .filter(|l| l.as_ref().matches('|').count() == 4)
        .skip(1) // column header
        .map(|l| {
            let clean = l.as_ref().replace(['\r', '\t'], "");
            let mut fields = clean.split('|');
            let cik = fields.next().unwrap_or_default().to_string();
            let company_name = fields.next().unwrap_or_default().to_string();
            let form_type = fields.next().unwrap_or_default().to_string();
            let date_filed = fields.next().unwrap_or_default().to_string();
            let partial_path = fields.next().unwrap_or_default().to_string();
            let file_name = partial_path
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            RawEntry {
                cik,
                company_name,
                form_type,
                date_filed,
                partial_path,
                file_name,
            }
        })
        .collect()
}

fn save_cache(path: &Path, entries: &[RawEntry]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{CACHE_HEADER}")?;
    for e in entries {
        writeln!(
            w,
            "{}|{}|{}|{}|{}|{}",
            e.cik, e.company_name, e.form_type, e.date_filed, e.partial_path, e.file_name
        )?;
    }
    w.flush()
}

fn load_cache(path: &Path) -> std::io::Result<Vec<RawEntry>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .skip(1) // cache header
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('|').collect();
            let [cik, company_name, form_type, date_filed, partial_path, file_name] =
                fields.as_slice()
            else {
                return None;
            };
            Some(RawEntry {
                cik: (*cik).to_string(),
                company_name: (*company_name).to_string(),
                form_type: (*form_type).to_string(),
                date_filed: (*date_filed).to_string(),
                partial_path: (*partial_path).to_string(),
                file_name: (*file_name).to_string(),
            })
        })
        .collect())
}
