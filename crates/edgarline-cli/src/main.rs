//! edgarline - bulk SEC EDGAR filing downloader
//!
//! Fetches quarterly master indexes, filters candidate filings against
//! prior runs and the configured allow-lists, then downloads the
//! remaining documents with a bounded, rate-limit-aware worker pool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use url::Url;

mod config;

use config::Config;
use edgarline_core::{validate, ProgressContext, RunConfig};

#[derive(Parser)]
#[command(name = "edgarline")]
#[command(about = "Bulk SEC EDGAR filing downloader")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./edgarline.toml or ~/.config/edgarline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Download filings for a year/quarter range
    Fetch(FetchArgs),
    /// Show current configuration
    Config,
    /// Write a commented sample config file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// First year to download
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year to download (inclusive)
    #[arg(long)]
    end_year: Option<i32>,

    /// Quarters to fetch (comma-separated, default all four)
    #[arg(short, long, value_delimiter = ',')]
    quarters: Vec<u8>,

    /// Form types to download (comma-separated, e.g. 10-K,10-Q)
    #[arg(short, long, value_delimiter = ',')]
    form_types: Vec<String>,

    /// CIK allow-list (comma-separated integers)
    #[arg(long, value_delimiter = ',')]
    ciks: Vec<u64>,

    /// Path to a CIK allow-list file, one integer per line
    #[arg(long)]
    cik_file: Option<PathBuf>,

    /// Output directory for downloaded documents
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Cache directory for parsed indexes and the success log
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Number of parallel download workers
    #[arg(short, long)]
    workers: Option<usize>,
}

#[derive(Args, Debug)]
struct InitConfigArgs {
    /// Where to write the sample config
    #[arg(default_value = "sample_config.toml")]
    path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    edgarline_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Fetch(args) => fetch(args, &config, &progress),
        Command::Config => show_config(&config),
        Command::InitConfig(args) => init_config(&args),
    }
}

/// Merge CLI arguments over the config file and run the pipeline.
///
/// Missing required parameters surface here, before any network activity.
fn fetch(args: FetchArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let Some(output_dir) = args.output.or_else(|| config.output_dir.clone()) else {
        bail!("no output directory: pass --output or set output_dir in the config");
    };
    let Some(start_year) = args.start_year.or(config.start_year) else {
        bail!("no start year: pass --start-year or set start_year in the config");
    };
    let Some(end_year) = args.end_year.or(config.end_year) else {
        bail!("no end year: pass --end-year or set end_year in the config");
    };

    let quarters = if args.quarters.is_empty() {
        config.quarters.clone()
    } else {
        args.quarters
    };
    let periods = config::build_periods(start_year, end_year, &quarters)?;

    let form_types = if args.form_types.is_empty() {
        config.form_types.clone()
    } else {
        args.form_types
    };
    let form_types = form_types
        .iter()
        .map(|raw| {
            validate::validate_form_type(raw).with_context(|| format!("form type {raw:?}"))
        })
        .collect::<Result<Vec<String>>>()?;

    let mut ciks = if args.ciks.is_empty() {
        config.ciks.clone()
    } else {
        args.ciks
    };
    if let Some(path) = args.cik_file.as_ref().or(config.cik_file.as_ref()) {
        ciks.extend(config::read_cik_file(path)?);
    }

    let workers = args
        .workers
        .unwrap_or(config.workers.default)
        .clamp(1, config.workers.max);

    let base_url = Url::parse(&config.archive.base_url)
        .with_context(|| format!("invalid archive base url: {}", config.archive.base_url))?;

    install_signal_handler()?;

    let run_config = RunConfig {
        base_url,
        output_dir,
        cache_dir: args.cache_dir.or_else(|| config.cache_dir.clone()),
        periods,
        form_types,
        ciks,
        workers,
    };
    let report = edgarline_core::run(&run_config, progress)?;

    if !report.failed.is_empty() {
        progress.println(format!(
            "{} downloads failed; see the log for file names and URLs",
            report.failed.len()
        ));
    }
    progress.println(format!(
        "done: {} downloaded, {} failed",
        report.summary.downloaded, report.summary.failed
    ));
    Ok(())
}

/// Stop handing out new tasks on SIGINT/SIGTERM; in-flight downloads finish.
fn install_signal_handler() -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("installing signal handler")?;
    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            log::warn!("signal received, finishing in-flight downloads");
            edgarline_core::request_cancel();
        }
    });
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

    let display_path = |p: &Option<PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not set".to_string())
    };
    let display_list = |l: &[String]| {
        if l.is_empty() {
            "all".to_string()
        } else {
            l.join(", ")
        }
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["Output directory", &display_path(&config.output_dir)]);
    table.add_row(vec!["Cache directory", &display_path(&config.cache_dir)]);
    table.add_row(vec!["Form types", &display_list(&config.form_types)]);
    table.add_row(vec![
        "CIKs",
        &if config.ciks.is_empty() && config.cik_file.is_none() {
            "all".to_string()
        } else {
            format!(
                "{} inline, file: {}",
                config.ciks.len(),
                display_path(&config.cik_file)
            )
        },
    ]);
    table.add_row(vec![
        "Years",
        &match (config.start_year, config.end_year) {
            (Some(s), Some(e)) => format!("{s}..={e}"),
            _ => "not set".to_string(),
        },
    ]);
    table.add_row(vec![
        "Quarters",
        &if config.quarters.is_empty() {
            "all".to_string()
        } else {
            config
                .quarters
                .iter()
                .map(|q| format!("Q{q}"))
                .collect::<Vec<_>>()
                .join(", ")
        },
    ]);
    table.add_row(vec![
        "Workers",
        &format!("{} (max: {})", config.workers.default, config.workers.max),
    ]);
    table.add_row(vec!["Archive base URL", &config.archive.base_url]);

    eprintln!("\n{table}");
    Ok(())
}

fn init_config(args: &InitConfigArgs) -> Result<()> {
    if args.path.exists() {
        bail!("{} already exists, not overwriting", args.path.display());
    }
    std::fs::write(&args.path, config::SAMPLE_CONFIG)
        .with_context(|| format!("writing {}", args.path.display()))?;
    eprintln!("wrote {}", args.path.display());
    Ok(())
}
