use harvest_logging::{harvest_info, harvest_warn};

use crate::locator::Locator;
use crate::session::{FailureKind, HarvestSession, Phase, StopReason};
use crate::{Effect, Msg};

/// Pure update function: applies a message to the session and returns the
/// effects the driver has to perform next. Terminal sessions ignore every message.
pub fn update(mut session: HarvestSession, msg: Msg) -> (HarvestSession, Vec<Effect>) {
    if session.is_terminal() {
        return (session, Vec::new());
    }

    let effects = match msg {
        Msg::Start => {
            if *session.phase() == Phase::Init {
                start(&mut session)
            } else {
                Vec::new()
            }
        }
        Msg::SourceReady | Msg::ReadinessTimedOut | Msg::Settled => {
            if *session.phase() != Phase::Loading {
                return (session, Vec::new());
            }
            if msg == Msg::ReadinessTimedOut {
                harvest_warn!(
                    "Content source not ready within {:?}; continuing with available data",
                    session.config().readiness_timeout
                );
            }
            session.set_phase(Phase::Scanning);
            vec![Effect::DrainPayloads]
        }
        Msg::PayloadsDrained(blobs) => {
            if *session.phase() != Phase::Scanning {
                return (session, Vec::new());
            }
            let new = session.ingest(&blobs);
            evaluate(&mut session, new)
        }
        Msg::CancelRequested => {
            harvest_info!(
                "Harvest cancelled at iteration {} with {} posts",
                session.iteration(),
                session.admitted().len()
            );
            session.set_phase(Phase::Done(StopReason::Cancelled));
            vec![Effect::Finish]
        }
    };

    (session, effects)
}

fn start(session: &mut HarvestSession) -> Vec<Effect> {
    match Locator::parse(session.locator_input()) {
        Ok(locator) => {
            harvest_info!(
                "Harvesting {} (root code {}), target {} posts",
                locator.url,
                locator.root_code,
                session.config().target_total
            );
            let url = locator.url.clone();
            session.accept_locator(locator);
            session.begin_iteration();
            vec![
                Effect::Navigate { url },
                Effect::AwaitReadiness {
                    timeout: session.config().readiness_timeout,
                },
            ]
        }
        Err(err) => {
            harvest_warn!("Rejected locator: {}", err);
            session.set_phase(Phase::Failed(FailureKind::InvalidLocator(err)));
            vec![Effect::Finish]
        }
    }
}

/// Termination policy, in priority order: quota, iteration budget, stagnation.
fn evaluate(session: &mut HarvestSession, new: usize) -> Vec<Effect> {
    let admitted = session.admitted().len();
    let iteration = session.iteration();
    let stagnant_streak = session.note_growth(new);
    let config = session.config();

    harvest_info!(
        "Iteration {}/{}: {} new, {} of {} posts",
        iteration,
        config.max_iterations,
        new,
        admitted,
        config.target_total
    );

    let stop = if admitted >= config.target_total {
        Some(StopReason::QuotaReached)
    } else if iteration >= config.max_iterations.max(1) {
        Some(StopReason::BudgetExhausted)
    } else if stagnant_streak >= config.stagnation_patience.max(1) {
        Some(StopReason::Stagnated)
    } else {
        None
    };

    match stop {
        Some(reason) => {
            if admitted == 0 {
                harvest_warn!("No posts harvested after {} iterations", iteration);
                session.set_phase(Phase::Failed(FailureKind::NoDataHarvested));
            } else {
                harvest_info!("Harvest done ({:?}) with {} posts", reason, admitted);
                session.set_phase(Phase::Done(reason));
            }
            vec![Effect::Finish]
        }
        None => {
            let settle = config.settle_interval;
            session.begin_iteration();
            vec![Effect::RevealMore, Effect::Settle { duration: settle }]
        }
    }
}
