use std::time::Duration;

/// Work the driver must perform against the content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Navigate { url: String },
    AwaitReadiness { timeout: Duration },
    RevealMore,
    Settle { duration: Duration },
    DrainPayloads,
    /// The session reached a terminal phase.
    Finish,
}
