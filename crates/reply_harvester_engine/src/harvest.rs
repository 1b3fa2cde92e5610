use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use harvest_logging::{harvest_info, harvest_warn};
use reply_harvester_core::{
    assemble, update, Effect, FailureKind, HarvestConfig, HarvestSession, Msg, Phase,
    StopReason,
};
use tokio_util::sync::CancellationToken;

use crate::source::{ContentSource, Readiness};
use crate::{HarvestError, HarvestEvent, HarvestReport};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<HarvestEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<HarvestEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: HarvestEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: HarvestEvent) {}
}

/// Runs one harvest session against a content source.
#[derive(Debug, Clone)]
pub struct Harvester {
    config: HarvestConfig,
    cancel: CancellationToken,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Cancelling this token ends the harvest with whatever was admitted so far.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Drives the session to a terminal phase, closes the source, and assembles
    /// the result. The source is closed on every path.
    pub async fn run(
        &self,
        locator: &str,
        source: &mut dyn ContentSource,
        sink: &dyn ProgressSink,
    ) -> Result<HarvestReport, HarvestError> {
        let session = HarvestSession::new(locator, self.config.clone());
        let outcome = self.drive(session, source, sink).await;
        source.close().await;
        let session = outcome?;
        sink.emit(HarvestEvent::Finished(session.view()));
        finish(session)
    }

    async fn drive(
        &self,
        session: HarvestSession,
        source: &mut dyn ContentSource,
        sink: &dyn ProgressSink,
    ) -> Result<HarvestSession, HarvestError> {
        let (mut session, effects) = update(session, Msg::Start);
        let mut pending: VecDeque<Effect> = effects.into();

        while let Some(effect) = pending.pop_front() {
            let msg = match effect {
                Effect::Navigate { url } => {
                    let navigated = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => None,
                        result = source.navigate(&url) => Some(result),
                    };
                    match navigated {
                        Some(result) => {
                            result?;
                            continue;
                        }
                        None => Msg::CancelRequested,
                    }
                }
                Effect::AwaitReadiness { timeout } => self.await_readiness(source, timeout).await,
                Effect::RevealMore => {
                    // Top of a new iteration; navigation and both waits race the token instead.
                    if self.cancel.is_cancelled() {
                        Msg::CancelRequested
                    } else {
                        if let Err(err) = source.reveal_more().await {
                            harvest_warn!("Reveal failed, scanning what is buffered: {}", err);
                        }
                        continue;
                    }
                }
                Effect::Settle { duration } => self.settle(source, duration).await,
                Effect::DrainPayloads => Msg::PayloadsDrained(source.drain_new_payloads().await),
                Effect::Finish => break,
            };

            let drained = matches!(msg, Msg::PayloadsDrained(_));
            let (next, more) = update(session, msg);
            session = next;
            if drained {
                sink.emit(HarvestEvent::Iteration(session.view()));
            }
            if session.is_terminal() {
                break;
            }
            pending.extend(more);
        }

        if !session.is_terminal() {
            session = update(session, Msg::CancelRequested).0;
        }
        Ok(session)
    }

    async fn await_readiness(&self, source: &mut dyn ContentSource, timeout: Duration) -> Msg {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Msg::CancelRequested,
            readiness = tokio::time::timeout(timeout, source.wait_until_ready(timeout)) => {
                match readiness {
                    Ok(Readiness::Ready) => Msg::SourceReady,
                    Ok(Readiness::TimedOut) | Err(_) => Msg::ReadinessTimedOut,
                }
            }
        }
    }

    async fn settle(&self, source: &mut dyn ContentSource, duration: Duration) -> Msg {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Msg::CancelRequested,
            _ = tokio::time::timeout(duration, source.wait(duration)) => Msg::Settled,
        }
    }
}

fn finish(session: HarvestSession) -> Result<HarvestReport, HarvestError> {
    let root_code = session.root_code().unwrap_or_default().to_string();
    let iterations = session.iteration();
    let target_total = session.config().target_total;

    let stop_reason = match session.phase().clone() {
        Phase::Failed(FailureKind::InvalidLocator(err)) => {
            return Err(HarvestError::InvalidLocator(err))
        }
        Phase::Failed(FailureKind::NoDataHarvested) => {
            return Err(HarvestError::NoDataHarvested { root_code })
        }
        Phase::Done(stop_reason) => stop_reason,
        // drive() cancels any session it leaves early
        Phase::Init | Phase::Loading | Phase::Scanning => StopReason::Cancelled,
    };

    let admitted = session.admitted().len();
    let result = assemble(session.into_admitted(), &root_code, target_total);
    if let Some(result) = &result {
        harvest_info!(
            "Harvest of {} finished after {} iterations: root + {} replies ({:?})",
            root_code,
            iterations,
            result.replies.len(),
            stop_reason
        );
    }
    Ok(HarvestReport {
        result,
        stop_reason,
        iterations,
        admitted,
        root_code,
    })
}
