//! Harvester core: pure harvest state machine, payload scanning, record
//! extraction, deduplication and result assembly. No IO happens here.
mod assemble;
mod dedupe;
mod effect;
mod extract;
mod locator;
mod msg;
mod record;
mod scan;
mod session;
mod update;
mod view_model;

pub use assemble::{
    assemble, collapse_whitespace, title_from, HarvestResult, OutputRow, TITLE_ELLIPSIS,
    TITLE_MAX_WORDS,
};
pub use dedupe::IdentityDeduplicator;
pub use effect::Effect;
pub use extract::{extract, Unextractable};
pub use locator::{Locator, LocatorError};
pub use msg::Msg;
pub use record::{canonical_url, Author, Engagement, Media, PostRecord, RawCount, CANONICAL_HOST};
pub use scan::{PayloadScanner, ScanSettings, ScanStats, DEFAULT_CONTAINER_KEY};
pub use session::{
    FailureKind, HarvestConfig, HarvestSession, Phase, StopReason, DEFAULT_MAX_ITERATIONS,
    DEFAULT_READINESS_TIMEOUT, DEFAULT_SETTLE_INTERVAL, DEFAULT_STAGNATION_PATIENCE,
};
pub use update::update;
pub use view_model::SessionView;
