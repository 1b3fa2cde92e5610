//! These tests drive a real Chromium and are ignored by default.
//! Run them with `cargo test -- --ignored` on a machine with Chromium installed.
mod common;

use std::time::Duration;

use common::{blob, init_logging, reply, root, ROOT_CODE};
use pretty_assertions::assert_eq;
use reply_harvester_core::{HarvestConfig, StopReason};
use reply_harvester_engine::{
    BrowserSettings, BrowserSource, ContentSource, Harvester, NoProgress, SourceError,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A tall page with one inline payload that fetches the next reply batch
/// once it is scrolled.
fn scrolling_page(inline: &str) -> String {
    format!(
        r#"<html><body>
<div data-pressable-container="true" style="height: 5000px">post</div>
<script type="application/json" data-sjs>{inline}</script>
<script>
  let requested = false;
  window.addEventListener("scroll", () => {{
    if (requested) return;
    requested = true;
    fetch("/api/graphql?postID={ROOT_CODE}").then((r) => r.text());
  }});
</script>
</body></html>"#
    )
}

fn reply_batch() -> String {
    json!({
        "data": { "reply_threads": [ { "postID": ROOT_CODE, "thread_items": [reply(2)] } ] }
    })
    .to_string()
}

async fn start_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            scrolling_page(&blob(vec![root(), reply(1)])),
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(reply_batch(), "application/json"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
#[ignore] // Requires Chromium to be installed
async fn scrolling_collects_network_reply_batches() {
    init_logging();
    let server = start_server().await;
    let mut source = BrowserSource::launch(BrowserSettings::default())
        .await
        .unwrap();
    let harvester = Harvester::new(HarvestConfig {
        settle_interval: Duration::from_millis(1_500),
        readiness_timeout: Duration::from_secs(10),
        ..HarvestConfig::for_replies(5)
    });

    let report = harvester
        .run(&format!("{}/post/abc123", server.uri()), &mut source, &NoProgress)
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::Stagnated);
    let result = report.result.unwrap();
    assert_eq!(result.root.text, "Hello world");
    let handles: Vec<_> = result
        .replies
        .iter()
        .map(|r| r.author.handle.clone().unwrap())
        .collect();
    assert_eq!(handles, vec!["user1", "user2"]);
}

#[tokio::test]
#[ignore] // Requires Chromium to be installed
async fn inline_scripts_are_handed_out_once() {
    init_logging();
    let server = start_server().await;
    let mut source = BrowserSource::launch(BrowserSettings {
        capture_network: false,
        ..BrowserSettings::default()
    })
    .await
    .unwrap();

    source
        .navigate(&format!("{}/post/abc123", server.uri()))
        .await
        .unwrap();
    assert_eq!(source.drain_new_payloads().await.len(), 1);
    source.reveal_more().await.unwrap();
    assert!(source.drain_new_payloads().await.is_empty());
    source.close().await;
}

#[tokio::test]
#[ignore] // Requires Chromium to be installed
async fn reveal_before_navigate_is_rejected() {
    init_logging();
    let mut source = BrowserSource::launch(BrowserSettings::default())
        .await
        .unwrap();

    assert!(matches!(
        source.reveal_more().await,
        Err(SourceError::NotNavigated)
    ));
    source.close().await;
}
