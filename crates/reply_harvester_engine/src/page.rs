use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_warn};
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::buffer::{lock_buffer, PayloadBuffer, SharedPayloadBuffer, DEFAULT_BUFFER_CAPACITY};
use crate::decode::decode_page;
use crate::source::{ContentSource, Readiness};
use crate::SourceError;

/// Inline JSON datasets the page server-renders for its client.
pub const DEFAULT_PAYLOAD_SELECTOR: &str = r#"script[type="application/json"][data-sjs]"#;
/// Present once the post and its replies have been rendered.
pub const DEFAULT_READINESS_SELECTOR: &str = "[data-pressable-container=true]";

#[derive(Debug, Clone)]
pub struct PageSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    pub payload_selector: String,
    pub readiness_selector: String,
    pub buffer_capacity: usize,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 8 * 1024 * 1024,
            user_agent: concat!("reply-harvester/", env!("CARGO_PKG_VERSION")).to_string(),
            payload_selector: DEFAULT_PAYLOAD_SELECTOR.to_string(),
            readiness_selector: DEFAULT_READINESS_SELECTOR.to_string(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// What one page load contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    pub payloads: Vec<String>,
    pub ready_marker: bool,
}

/// Content source backed by plain HTTP page loads, used where no Chromium is
/// available. Each reveal re-requests the page in the background; payloads
/// land in the shared buffer whenever the response arrives. A re-request
/// returns the same first page, so this source cannot reach replies that the
/// live page only loads on scroll; see [`crate::BrowserSource`].
pub struct PageSource {
    settings: Arc<PageSettings>,
    client: reqwest::Client,
    url: Option<String>,
    buffer: SharedPayloadBuffer,
    ready_tx: Arc<watch::Sender<bool>>,
    ready_rx: watch::Receiver<bool>,
    loads: Vec<JoinHandle<()>>,
}

impl PageSource {
    pub fn new(settings: PageSettings) -> Result<Self, SourceError> {
        for selector in [&settings.payload_selector, &settings.readiness_selector] {
            Selector::parse(selector).map_err(|_| SourceError::InvalidSelector(selector.clone()))?;
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| SourceError::Network(err.to_string()))?;

        let (ready_tx, ready_rx) = watch::channel(false);
        Ok(Self {
            buffer: PayloadBuffer::shared(settings.buffer_capacity),
            settings: Arc::new(settings),
            client,
            url: None,
            ready_tx: Arc::new(ready_tx),
            ready_rx,
            loads: Vec::new(),
        })
    }

    fn absorb(buffer: &SharedPayloadBuffer, ready_tx: &watch::Sender<bool>, page: LoadedPage) {
        let has_payloads = !page.payloads.is_empty();
        lock_buffer(buffer).extend(page.payloads);
        if page.ready_marker || has_payloads {
            ready_tx.send_replace(true);
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for PageSource {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
        let parsed = reqwest::Url::parse(url).map_err(|err| SourceError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let page = load_page(&self.client, &self.settings, parsed.as_str()).await?;
        harvest_debug!(
            "Initial load of {} captured {} payloads",
            url,
            page.payloads.len()
        );
        Self::absorb(&self.buffer, &self.ready_tx, page);
        self.url = Some(parsed.to_string());
        Ok(())
    }

    async fn wait_until_ready(&mut self, timeout: Duration) -> Readiness {
        let mut rx = self.ready_rx.clone();
        let signalled = tokio::time::timeout(timeout, rx.wait_for(|ready| *ready))
            .await
            .map(|result| result.is_ok())
            .unwrap_or(false);
        if signalled {
            Readiness::Ready
        } else {
            Readiness::TimedOut
        }
    }

    async fn reveal_more(&mut self) -> Result<(), SourceError> {
        let url = self.url.clone().ok_or(SourceError::NotNavigated)?;
        let client = self.client.clone();
        let settings = self.settings.clone();
        let buffer = self.buffer.clone();
        let ready_tx = self.ready_tx.clone();

        self.loads.retain(|handle| !handle.is_finished());
        self.loads.push(tokio::spawn(async move {
            match load_page(&client, &settings, &url).await {
                Ok(page) => Self::absorb(&buffer, &ready_tx, page),
                Err(err) => harvest_warn!("Background load of {} failed: {}", url, err),
            }
        }));
        Ok(())
    }

    async fn wait(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn drain_new_payloads(&mut self) -> Vec<String> {
        lock_buffer(&self.buffer).drain()
    }

    async fn close(&mut self) {
        for handle in self.loads.drain(..) {
            handle.abort();
        }
        lock_buffer(&self.buffer).clear();
    }
}

async fn load_page(
    client: &reqwest::Client,
    settings: &PageSettings,
    url: &str,
) -> Result<LoadedPage, SourceError> {
    let response = client.get(url).send().await.map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus(status.as_u16()));
    }
    if let Some(len) = response.content_length() {
        if len > settings.max_bytes {
            return Err(SourceError::TooLarge {
                max_bytes: settings.max_bytes,
            });
        }
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        if bytes.len() as u64 + chunk.len() as u64 > settings.max_bytes {
            return Err(SourceError::TooLarge {
                max_bytes: settings.max_bytes,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    let decoded = decode_page(&bytes, content_type.as_deref())?;
    Ok(parse_page(
        &decoded.text,
        &settings.payload_selector,
        &settings.readiness_selector,
    ))
}

/// Collects the text of every payload script and checks for the readiness marker.
pub fn parse_page(html: &str, payload_selector: &str, readiness_selector: &str) -> LoadedPage {
    let doc = Html::parse_document(html);

    let payloads = Selector::parse(payload_selector)
        .map(|sel| {
            doc.select(&sel)
                .map(|node| node.text().collect::<String>())
                .filter(|text| !text.trim().is_empty())
                .collect()
        })
        .unwrap_or_default();

    let ready_marker = Selector::parse(readiness_selector)
        .map(|sel| doc.select(&sel).next().is_some())
        .unwrap_or(false);

    LoadedPage {
        payloads,
        ready_marker,
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        return SourceError::Timeout;
    }
    SourceError::Network(err.to_string())
}
