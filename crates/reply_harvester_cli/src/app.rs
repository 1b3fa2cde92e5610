use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Context};
use reply_harvester_core::StopReason;
use reply_harvester_engine::{
    write_csv, write_records_json, BrowserSource, ContentSource, Harvester, PageSettings,
    PageSource, ReplaySource,
};
use tokio_util::sync::CancellationToken;

use crate::args::{Cli, SourceKind};
use crate::progress::ConsoleProgress;

/// What one invocation wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub replies: usize,
    pub output: PathBuf,
    pub records_json: Option<PathBuf>,
    pub stop_reason: StopReason,
    pub root_found: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} rows (root + {} replies) to {}; stop reason: {}",
            self.rows,
            self.replies,
            self.output.display(),
            describe(self.stop_reason)
        )?;
        if !self.root_found {
            write!(f, "; requested post not seen, first collected post used as root")?;
        }
        if let Some(path) = &self.records_json {
            write!(f, "; records in {}", path.display())?;
        }
        Ok(())
    }
}

fn describe(reason: StopReason) -> &'static str {
    match reason {
        StopReason::QuotaReached => "requested number of replies collected",
        StopReason::BudgetExhausted => "iteration budget exhausted",
        StopReason::Stagnated => "no new replies appeared",
        StopReason::Cancelled => "cancelled",
    }
}

/// Harvests the post named on the command line and writes the outputs.
pub async fn run(cli: &Cli, cancel: CancellationToken) -> anyhow::Result<RunSummary> {
    let mut source: Box<dyn ContentSource> = match &cli.replay {
        Some(fixture) => Box::new(
            ReplaySource::from_path(fixture)
                .with_context(|| format!("loading replay fixture {}", fixture.display()))?,
        ),
        None => match cli.source {
            SourceKind::Browser => Box::new(
                BrowserSource::launch(cli.browser_settings())
                    .await
                    .context("starting Chromium (use --chrome <PATH> or --source http)")?,
            ),
            SourceKind::Http => Box::new(PageSource::new(PageSettings::default())?),
        },
    };

    let harvester = Harvester::new(cli.harvest_config()).with_cancellation(cancel);
    let report = harvester
        .run(&cli.link, source.as_mut(), &ConsoleProgress)
        .await?;

    let Some(result) = report.result else {
        bail!("harvest cancelled before any post was collected");
    };

    let rows = result.rows();
    let summary = write_csv(&cli.output, &rows, &cli.csv_options())
        .with_context(|| format!("writing {}", cli.output.display()))?;
    let records_json = match &cli.records_json {
        Some(path) => Some(
            write_records_json(path, &result)
                .with_context(|| format!("writing {}", path.display()))?,
        ),
        None => None,
    };

    Ok(RunSummary {
        rows: summary.rows,
        replies: result.replies.len(),
        output: summary.path,
        records_json,
        stop_reason: report.stop_reason,
        root_found: result.root_found,
    })
}
