use crate::scan::ScanStats;
use crate::session::Phase;

/// Read-only snapshot of a session for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: Phase,
    pub root_code: Option<String>,
    pub iteration: u32,
    pub max_iterations: u32,
    pub admitted: usize,
    /// Records admitted by the most recent drain.
    pub last_new: usize,
    pub unextractable: usize,
    pub scan: ScanStats,
}
