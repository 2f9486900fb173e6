//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use edgarline_core::{validate, PeriodKey};

/// Default archive base URL; document and index paths resolve against it
pub const DEFAULT_BASE_URL: &str = "https://www.sec.gov/Archives/";

/// Global configuration for edgarline.
///
/// Every field can be overridden from the command line; the config file
/// only provides defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub form_types: Vec<String>,
    pub ciks: Vec<u64>,
    pub cik_file: Option<PathBuf>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub quarters: Vec<u8>,
    pub workers: WorkersConfig,
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            default: cpus,
            max: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub base_url: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./edgarline.toml (current directory)
    /// 2. ~/.config/edgarline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("edgarline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "edgarline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Read a CIK allow-list file: one integer per line, blank lines ignored,
/// each validated as an identifier.
pub fn read_cik_file(path: &Path) -> Result<Vec<u64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CIK file: {}", path.display()))?;
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            validate::validate_cik(line)
                .with_context(|| format!("Invalid CIK in {}: {line:?}", path.display()))
        })
        .collect()
}

/// Expand a year range and quarter selection into ordered periods.
///
/// An empty quarter selection means all four quarters.
pub fn build_periods(start_year: i32, end_year: i32, quarters: &[u8]) -> Result<Vec<PeriodKey>> {
    if end_year < start_year {
        bail!("end_year {end_year} precedes start_year {start_year}");
    }
    let quarters: Vec<u8> = if quarters.is_empty() {
        vec![1, 2, 3, 4]
    } else {
        quarters.to_vec()
    };
    let mut periods = Vec::new();
    for year in start_year..=end_year {
        for &q in &quarters {
            let period = PeriodKey::new(year, q)
                .with_context(|| format!("quarter {q} out of range (1-4)"))?;
            periods.push(period);
        }
    }
    Ok(periods)
}

/// Commented sample configuration written by `edgarline init-config`
pub const SAMPLE_CONFIG: &str = r#"# edgarline sample configuration

output_dir = "/path/to/output"
cache_dir = "/path/to/cache"

# Form types to download; empty means all
form_types = ["10-K", "10-Q"]

# CIK allow-list, inline or from a file (one integer per line)
ciks = []
# cik_file = "/path/to/ciks.txt"

start_year = 1995
end_year = 2019
# Quarters to fetch; omit for all four
quarters = [1, 2, 3, 4]

[workers]
default = 8
max = 16

[archive]
base_url = "https://www.sec.gov/Archives/"
"#;
