use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use harvest_logging::harvest_warn;

pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Bounded FIFO of captured payload blobs. Producers push as payloads
/// arrive; the harvest loop drains once per iteration. Every blob is handed
/// out by exactly one `drain`.
#[derive(Debug)]
pub struct PayloadBuffer {
    pending: VecDeque<String>,
    capacity: usize,
    pushed: u64,
    drained: u64,
    evicted: u64,
}

/// Buffer shared between a source and its background loaders.
pub type SharedPayloadBuffer = Arc<Mutex<PayloadBuffer>>;

/// Locks a shared buffer. A loader that panicked mid-push leaves the queue
/// itself intact, so a poisoned lock is recovered instead of dropping blobs.
pub fn lock_buffer(buffer: &SharedPayloadBuffer) -> MutexGuard<'_, PayloadBuffer> {
    buffer.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        harvest_warn!("Payload buffer lock was poisoned by a panicked loader; recovering");
        poisoned.into_inner()
    })
}

impl Default for PayloadBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }
}

impl PayloadBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: VecDeque::with_capacity(capacity.min(DEFAULT_BUFFER_CAPACITY)),
            capacity,
            pushed: 0,
            drained: 0,
            evicted: 0,
        }
    }

    pub fn shared(capacity: usize) -> SharedPayloadBuffer {
        Arc::new(Mutex::new(Self::with_capacity(capacity)))
    }

    /// Appends a blob, evicting the oldest undrained one when full.
    pub fn push(&mut self, blob: String) {
        if self.pending.len() >= self.capacity {
            self.pending.pop_front();
            self.evicted += 1;
            harvest_warn!(
                "Payload buffer full ({} blobs); dropped oldest undrained blob",
                self.capacity
            );
        }
        self.pending.push_back(blob);
        self.pushed += 1;
    }

    pub fn extend(&mut self, blobs: impl IntoIterator<Item = String>) {
        for blob in blobs {
            self.push(blob);
        }
    }

    /// Everything pushed since the previous drain.
    pub fn drain(&mut self) -> Vec<String> {
        let out: Vec<String> = self.pending.drain(..).collect();
        self.drained += out.len() as u64;
        out
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    pub fn total_drained(&self) -> u64 {
        self.drained
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
