#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin the harvest: validate the locator and open the page.
    Start,
    /// The content source signalled readiness within the timeout.
    SourceReady,
    /// Readiness was not signalled in time; proceed with what is there.
    ReadinessTimedOut,
    /// The settle wait after a reveal action elapsed.
    Settled,
    /// Raw payloads captured since the previous drain.
    PayloadsDrained(Vec<String>),
    /// External cancellation; keeps whatever was admitted so far.
    CancelRequested,
}
