use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

use harvest_logging::harvest_debug;
use serde::Deserialize;
use serde_json::Value;

use crate::buffer::PayloadBuffer;
use crate::source::{ContentSource, Readiness};
use crate::SourceError;

/// Recorded payloads, one list per load step.
///
/// ```json
/// { "steps": [ ["<raw blob>", {"inline": "json"}], [] ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayFixture {
    pub steps: Vec<Vec<ReplayBlob>>,
}

/// A blob is either raw text, or JSON that is re-serialized to text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReplayBlob {
    Text(String),
    Json(Value),
}

impl ReplayBlob {
    fn into_text(self) -> String {
        match self {
            ReplayBlob::Text(text) => text,
            ReplayBlob::Json(value) => value.to_string(),
        }
    }
}

/// Plays back recorded payloads: step 0 on `navigate`, step k on the k-th
/// `reveal_more`. Waits return immediately.
#[derive(Debug, Default)]
pub struct ReplaySource {
    steps: VecDeque<Vec<String>>,
    buffer: PayloadBuffer,
    navigated: bool,
    reveals: usize,
}

impl ReplaySource {
    pub fn new(steps: Vec<Vec<String>>) -> Self {
        Self {
            steps: steps.into(),
            ..Self::default()
        }
    }

    pub fn from_fixture(fixture: ReplayFixture) -> Self {
        Self::new(
            fixture
                .steps
                .into_iter()
                .map(|step| step.into_iter().map(ReplayBlob::into_text).collect())
                .collect(),
        )
    }

    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let content = fs::read_to_string(path)?;
        let fixture: ReplayFixture = serde_json::from_str(&content)
            .map_err(|err| SourceError::Fixture(format!("{}: {err}", path.display())))?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn reveals(&self) -> usize {
        self.reveals
    }

    fn deliver_next_step(&mut self) {
        if let Some(step) = self.steps.pop_front() {
            harvest_debug!("Replaying step with {} blobs", step.len());
            self.buffer.extend(step);
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for ReplaySource {
    async fn navigate(&mut self, _url: &str) -> Result<(), SourceError> {
        if !self.navigated {
            self.navigated = true;
            self.deliver_next_step();
        }
        Ok(())
    }

    async fn wait_until_ready(&mut self, _timeout: Duration) -> Readiness {
        if self.navigated {
            Readiness::Ready
        } else {
            Readiness::TimedOut
        }
    }

    async fn reveal_more(&mut self) -> Result<(), SourceError> {
        if !self.navigated {
            return Err(SourceError::NotNavigated);
        }
        self.reveals += 1;
        self.deliver_next_step();
        Ok(())
    }

    async fn wait(&mut self, _duration: Duration) {}

    async fn drain_new_payloads(&mut self) -> Vec<String> {
        self.buffer.drain()
    }

    async fn close(&mut self) {
        self.steps.clear();
        self.buffer.clear();
    }
}
