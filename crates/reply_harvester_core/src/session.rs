use std::time::Duration;

use harvest_logging::{harvest_debug, harvest_trace};

use crate::dedupe::IdentityDeduplicator;
use crate::extract::extract;
use crate::locator::{Locator, LocatorError};
use crate::record::PostRecord;
use crate::scan::{PayloadScanner, ScanSettings, ScanStats};
use crate::view_model::SessionView;

pub const DEFAULT_MAX_ITERATIONS: u32 = 20;
pub const DEFAULT_STAGNATION_PATIENCE: u32 = 1;
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(2_500);
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Root post plus requested replies.
    pub target_total: usize,
    pub max_iterations: u32,
    /// Consecutive no-growth iterations tolerated before stopping.
    pub stagnation_patience: u32,
    pub settle_interval: Duration,
    pub readiness_timeout: Duration,
    pub scan: ScanSettings,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_total: 1,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stagnation_patience: DEFAULT_STAGNATION_PATIENCE,
            settle_interval: DEFAULT_SETTLE_INTERVAL,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            scan: ScanSettings::default(),
        }
    }
}

impl HarvestConfig {
    /// Config targeting the root post plus `replies` replies.
    pub fn for_replies(replies: usize) -> Self {
        Self {
            target_total: replies.saturating_add(1),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuotaReached,
    BudgetExhausted,
    Stagnated,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidLocator(LocatorError),
    NoDataHarvested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Init,
    Loading,
    Scanning,
    Done(StopReason),
    Failed(FailureKind),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done(_) | Phase::Failed(_))
    }
}

/// Everything one harvest invocation knows. Owned by the loop, never persisted.
#[derive(Debug, Clone)]
pub struct HarvestSession {
    locator_input: String,
    locator: Option<Locator>,
    scanner: Option<PayloadScanner>,
    config: HarvestConfig,
    phase: Phase,
    iteration: u32,
    consecutive_stagnant: u32,
    last_new: usize,
    admitted: Vec<PostRecord>,
    dedupe: IdentityDeduplicator,
    scan_stats: ScanStats,
    unextractable: usize,
}

impl HarvestSession {
    pub fn new(locator_input: impl Into<String>, config: HarvestConfig) -> Self {
        Self {
            locator_input: locator_input.into(),
            locator: None,
            scanner: None,
            config,
            phase: Phase::Init,
            iteration: 0,
            consecutive_stagnant: 0,
            last_new: 0,
            admitted: Vec::new(),
            dedupe: IdentityDeduplicator::new(),
            scan_stats: ScanStats::default(),
            unextractable: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn locator_input(&self) -> &str {
        &self.locator_input
    }

    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    pub fn root_code(&self) -> Option<&str> {
        self.locator.as_ref().map(|l| l.root_code.as_str())
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn admitted(&self) -> &[PostRecord] {
        &self.admitted
    }

    pub fn into_admitted(self) -> Vec<PostRecord> {
        self.admitted
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase.clone(),
            root_code: self.root_code().map(ToOwned::to_owned),
            iteration: self.iteration,
            max_iterations: self.config.max_iterations,
            admitted: self.admitted.len(),
            last_new: self.last_new,
            unextractable: self.unextractable,
            scan: self.scan_stats,
        }
    }

    pub(crate) fn accept_locator(&mut self, locator: Locator) {
        self.scanner = Some(PayloadScanner::new(
            locator.root_code.clone(),
            self.config.scan.clone(),
        ));
        self.locator = Some(locator);
    }

    pub(crate) fn begin_iteration(&mut self) {
        self.iteration += 1;
        self.phase = Phase::Loading;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Records this iteration's growth and returns the stagnation streak.
    pub(crate) fn note_growth(&mut self, new: usize) -> u32 {
        if new > 0 {
            self.consecutive_stagnant = 0;
        } else if self.iteration > 1 {
            self.consecutive_stagnant += 1;
        }
        self.consecutive_stagnant
    }

    /// Runs scanner, extractor and deduplicator over one drain; returns the
    /// number of newly admitted records.
    pub(crate) fn ingest(&mut self, blobs: &[String]) -> usize {
        let Self {
            scanner,
            dedupe,
            admitted,
            scan_stats,
            unextractable,
            ..
        } = self;
        let Some(scanner) = scanner.as_ref() else {
            return 0;
        };

        let mut stats = ScanStats::default();
        let mut new = 0;
        for fragment in scanner.scan(blobs, &mut stats) {
            match extract(&fragment) {
                Ok(record) => {
                    if dedupe.admit(&record) {
                        harvest_trace!("Admitted post {}", record.identifier);
                        admitted.push(record);
                        new += 1;
                    } else {
                        harvest_trace!("Dropped duplicate post {}", record.identifier);
                    }
                }
                Err(reason) => {
                    *unextractable += 1;
                    harvest_trace!("Dropped fragment: {}", reason);
                }
            }
        }
        harvest_debug!(
            "Scanned {} blobs ({} in scope, {} malformed), {} fragments, {} new",
            stats.blobs_seen,
            stats.blobs_in_scope,
            stats.blobs_malformed,
            stats.fragments,
            new
        );
        *scan_stats += stats;
        self.last_new = new;
        new
    }
}
