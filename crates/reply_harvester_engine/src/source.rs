use std::time::Duration;

use crate::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    TimedOut,
}

/// A live, partially loaded page the harvester pulls payloads from.
///
/// Implementations buffer raw payloads as they arrive; `drain_new_payloads`
/// hands out everything captured since the previous call, never twice.
#[async_trait::async_trait]
pub trait ContentSource: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError>;

    /// Waits at most `timeout` for the page to signal that content is present.
    async fn wait_until_ready(&mut self, timeout: Duration) -> Readiness;

    /// Triggers one "load more" step (scroll to bottom, re-fetch, next fixture step).
    async fn reveal_more(&mut self) -> Result<(), SourceError>;

    async fn wait(&mut self, duration: Duration);

    async fn drain_new_payloads(&mut self) -> Vec<String>;

    async fn close(&mut self);
}
