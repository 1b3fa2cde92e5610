use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use harvest_logging::LogDestination;
use log::LevelFilter;
use reply_harvester_core::{
    HarvestConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_READINESS_TIMEOUT, DEFAULT_SETTLE_INTERVAL,
    DEFAULT_STAGNATION_PATIENCE,
};
use reply_harvester_engine::{BrowserSettings, CsvOptions};

/// How the live page is loaded when no replay fixture is given.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Headless Chromium; scrolls the page and captures reply batches
    Browser,
    /// Plain HTTP fetches; only sees the replies embedded in the first page
    Http,
}

/// Collects the replies under a post into a CSV file.
#[derive(Parser, Debug, Clone)]
#[command(name = "reply-harvester", version)]
pub struct Cli {
    /// Post link (`https://www.threads.net/@user/post/<code>`) or bare post code
    #[arg(short, long)]
    pub link: String,

    /// CSV file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of replies to collect besides the root post
    #[arg(short, long, default_value_t = 0)]
    pub size: usize,

    /// Replay recorded payloads from a JSON fixture instead of loading the page
    #[arg(long, value_name = "FIXTURE")]
    pub replay: Option<PathBuf>,

    /// Page loader used for live harvests
    #[arg(long, value_enum, default_value_t = SourceKind::Browser)]
    pub source: SourceKind,

    /// Chromium executable for the browser source
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,

    /// Also write the full records as JSON
    #[arg(long, value_name = "FILE")]
    pub records_json: Option<PathBuf>,

    /// Upper bound on load-more iterations
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u32,

    /// Consecutive iterations without new posts tolerated before stopping
    #[arg(long, default_value_t = DEFAULT_STAGNATION_PATIENCE)]
    pub patience: u32,

    /// Milliseconds to wait after each load-more step
    #[arg(long, default_value_t = DEFAULT_SETTLE_INTERVAL.as_millis() as u64)]
    pub settle_ms: u64,

    /// Milliseconds to wait for the first content to appear
    #[arg(long, default_value_t = DEFAULT_READINESS_TIMEOUT.as_millis() as u64)]
    pub readiness_timeout_ms: u64,

    /// Omit the UTF-8 byte order mark from the CSV
    #[arg(long)]
    pub no_bom: bool,

    /// Mirror log output into this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log per-blob and per-fragment details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig {
            max_iterations: self.max_iterations,
            stagnation_patience: self.patience,
            settle_interval: Duration::from_millis(self.settle_ms),
            readiness_timeout: Duration::from_millis(self.readiness_timeout_ms),
            ..HarvestConfig::for_replies(self.size)
        }
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            byte_order_mark: !self.no_bom,
        }
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            executable: self.chrome.clone(),
            headless: !self.headful,
            ..BrowserSettings::default()
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
