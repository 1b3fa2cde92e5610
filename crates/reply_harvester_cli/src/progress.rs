use harvest_logging::harvest_info;
use reply_harvester_engine::{HarvestEvent, ProgressSink};

/// Reports each scan step through the log.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: HarvestEvent) {
        if let HarvestEvent::Iteration(view) = event {
            harvest_info!(
                "[{}/{}] +{} new, {} collected ({} blobs in scope, {} skipped fragments)",
                view.iteration,
                view.max_iterations,
                view.last_new,
                view.admitted,
                view.scan.blobs_in_scope,
                view.unextractable
            );
        }
    }
}
