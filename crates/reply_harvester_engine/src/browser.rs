use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_info, harvest_trace, harvest_warn};
use tokio::task::JoinHandle;

use crate::buffer::{lock_buffer, PayloadBuffer, SharedPayloadBuffer, DEFAULT_BUFFER_CAPACITY};
use crate::page::{parse_page, DEFAULT_PAYLOAD_SELECTOR, DEFAULT_READINESS_SELECTOR};
use crate::source::{ContentSource, Readiness};
use crate::SourceError;

/// Scrolls the reply list so the page requests the next batch.
pub const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";
const OUTER_HTML_SCRIPT: &str = "document.documentElement.outerHTML";
const READINESS_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Chromium binary; `None` lets chromiumoxide look one up.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window_size: (u32, u32),
    pub navigation_timeout: Duration,
    pub payload_selector: String,
    pub readiness_selector: String,
    /// Capture reply batches the page fetches over the network.
    pub capture_network: bool,
    pub buffer_capacity: usize,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            window_size: (1920, 1080),
            navigation_timeout: Duration::from_secs(30),
            payload_selector: DEFAULT_PAYLOAD_SELECTOR.to_string(),
            readiness_selector: DEFAULT_READINESS_SELECTOR.to_string(),
            capture_network: true,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// A network response carries a reply batch when its URL is a GraphQL call
/// scoped to a post.
pub fn is_reply_batch_url(url: &str) -> bool {
    url.contains("graphql") && url.contains("postID")
}

pub fn is_reply_batch_body(body: &str) -> bool {
    body.contains("reply_threads") || body.contains("containing_thread")
}

/// Remembers which inline scripts were already handed out, so re-reading the
/// document after a scroll only yields scripts that appeared since.
#[derive(Debug, Default)]
pub struct InlineScriptTracker {
    seen: HashSet<String>,
}

impl InlineScriptTracker {
    pub fn fresh(&mut self, scripts: Vec<String>) -> Vec<String> {
        scripts
            .into_iter()
            .filter(|script| self.seen.insert(script.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Content source driving a headless Chromium: reveals by scrolling, and
/// collects both the inline payload scripts of the live document and the
/// reply batches the page fetches while scrolling.
pub struct BrowserSource {
    settings: BrowserSettings,
    browser: Browser,
    page: Page,
    buffer: SharedPayloadBuffer,
    inline: InlineScriptTracker,
    navigated: bool,
    tasks: Vec<JoinHandle<()>>,
}

impl BrowserSource {
    pub async fn launch(settings: BrowserSettings) -> Result<Self, SourceError> {
        let (width, height) = settings.window_size;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(SourceError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| SourceError::Browser(format!("failed to launch Chromium: {err}")))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    harvest_trace!("Browser handler event error: {}", err);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| SourceError::Browser(format!("failed to open page: {err}")))?;

        let mut source = Self {
            buffer: PayloadBuffer::shared(settings.buffer_capacity),
            settings,
            browser,
            page,
            inline: InlineScriptTracker::default(),
            navigated: false,
            tasks: vec![handler_task],
        };
        if source.settings.capture_network {
            source.start_network_capture().await?;
        }
        harvest_info!("Chromium launched");
        Ok(source)
    }

    /// Listens for finished responses matching [`is_reply_batch_url`] and
    /// pushes their bodies into the buffer.
    async fn start_network_capture(&mut self) -> Result<(), SourceError> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(browser_error)?;
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(browser_error)?;
        let mut finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(browser_error)?;

        let page = self.page.clone();
        let buffer = self.buffer.clone();
        self.tasks.push(tokio::spawn(async move {
            let mut watched: HashSet<String> = HashSet::new();
            loop {
                tokio::select! {
                    Some(event) = responses.next() => {
                        if is_reply_batch_url(&event.response.url) {
                            let id: &str = event.request_id.as_ref();
                            watched.insert(id.to_string());
                        }
                    }
                    Some(event) = finished.next() => {
                        let id: &str = event.request_id.as_ref();
                        if !watched.remove(id) {
                            continue;
                        }
                        match page.execute(GetResponseBodyParams::new(event.request_id.clone())).await {
                            Ok(response) if response.result.base64_encoded => {
                                harvest_debug!("Skipping binary response body for request {}", id);
                            }
                            Ok(response) => {
                                if is_reply_batch_body(&response.result.body) {
                                    harvest_debug!(
                                        "Captured reply batch ({} bytes)",
                                        response.result.body.len()
                                    );
                                    lock_buffer(&buffer).push(response.result.body);
                                }
                            }
                            Err(err) => harvest_debug!("Response body unavailable: {}", err),
                        }
                    }
                    else => break,
                }
            }
        }));
        Ok(())
    }

    async fn document_html(&self) -> Result<String, SourceError> {
        self.page
            .evaluate(OUTER_HTML_SCRIPT)
            .await
            .map_err(browser_error)?
            .into_value::<String>()
            .map_err(|err| SourceError::Browser(format!("unexpected document value: {err}")))
    }

    async fn has_readiness_marker(&self) -> bool {
        self.page
            .find_element(self.settings.readiness_selector.as_str())
            .await
            .is_ok()
    }
}

#[async_trait::async_trait]
impl ContentSource for BrowserSource {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
        let loaded = tokio::time::timeout(self.settings.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| SourceError::Timeout)?;
        loaded.map_err(|err| SourceError::Browser(format!("navigation to {url} failed: {err}")))?;
        self.navigated = true;
        harvest_debug!("Navigated to {}", url);
        Ok(())
    }

    async fn wait_until_ready(&mut self, timeout: Duration) -> Readiness {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let buffered = lock_buffer(&self.buffer).pending_len() > 0;
            if buffered || self.has_readiness_marker().await {
                return Readiness::Ready;
            }
            if tokio::time::Instant::now() >= deadline {
                return Readiness::TimedOut;
            }
            tokio::time::sleep(READINESS_POLL).await;
        }
    }

    async fn reveal_more(&mut self) -> Result<(), SourceError> {
        if !self.navigated {
            return Err(SourceError::NotNavigated);
        }
        self.page
            .evaluate(SCROLL_SCRIPT)
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn wait(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn drain_new_payloads(&mut self) -> Vec<String> {
        if self.navigated {
            match self.document_html().await {
                Ok(html) => {
                    let scripts = parse_page(
                        &html,
                        &self.settings.payload_selector,
                        &self.settings.readiness_selector,
                    )
                    .payloads;
                    let fresh = self.inline.fresh(scripts);
                    harvest_trace!(
                        "{} new inline scripts ({} seen so far)",
                        fresh.len(),
                        self.inline.len()
                    );
                    lock_buffer(&self.buffer).extend(fresh);
                }
                Err(err) => harvest_warn!("Could not re-read the document: {}", err),
            }
        }
        lock_buffer(&self.buffer).drain()
    }

    async fn close(&mut self) {
        if let Err(err) = self.browser.close().await {
            harvest_warn!("Closing Chromium failed: {}", err);
        }
        let _ = self.browser.wait().await;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        lock_buffer(&self.buffer).clear();
    }
}

fn browser_error(err: chromiumoxide::error::CdpError) -> SourceError {
    SourceError::Browser(err.to_string())
}
