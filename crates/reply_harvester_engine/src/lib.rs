//! Harvester engine: content sources, effect execution and export.
mod browser;
mod buffer;
mod decode;
mod export;
mod harvest;
mod page;
mod persist;
mod replay;
mod source;
mod types;

pub use browser::{
    is_reply_batch_body, is_reply_batch_url, BrowserSettings, BrowserSource, InlineScriptTracker,
    SCROLL_SCRIPT,
};
pub use buffer::{lock_buffer, PayloadBuffer, SharedPayloadBuffer, DEFAULT_BUFFER_CAPACITY};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use export::{
    render_csv, write_csv, write_records_json, CsvOptions, ExportError, ExportSummary, CSV_HEADER,
};
pub use harvest::{ChannelProgressSink, Harvester, NoProgress, ProgressSink};
pub use page::{
    parse_page, LoadedPage, PageSettings, PageSource, DEFAULT_PAYLOAD_SELECTOR,
    DEFAULT_READINESS_SELECTOR,
};
pub use persist::{ensure_output_dir, write_file, AtomicFileWriter, PersistError};
pub use replay::{ReplayBlob, ReplayFixture, ReplaySource};
pub use source::{ContentSource, Readiness};
pub use types::{HarvestError, HarvestEvent, HarvestReport, SourceError};
