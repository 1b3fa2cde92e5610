#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use reply_harvester_core::HarvestConfig;
use serde_json::{json, Value};

pub const ROOT_CODE: &str = "abc123";
pub const LINK: &str = "https://www.threads.net/@alice/post/abc123";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(harvest_logging::initialize_for_tests);
}

pub fn fragment(id: &str, code: &str, user: &str, text: &str) -> Value {
    json!({
        "post": {
            "id": id,
            "code": code,
            "taken_at": 1_700_000_000,
            "user": { "username": user },
            "caption": { "text": text }
        }
    })
}

pub fn root() -> Value {
    fragment("root-id", ROOT_CODE, "alice", "Hello world")
}

pub fn reply(n: u32) -> Value {
    fragment(
        &format!("r{n}"),
        &format!("reply{n}"),
        &format!("user{n}"),
        &format!("reply number {n}"),
    )
}

/// One payload blob holding a single `thread_items` group.
pub fn blob(items: Vec<Value>) -> String {
    json!({
        "require": [["ScheduledServerJS", ROOT_CODE]],
        "data": { "edges": [ { "node": { "thread_items": items } } ] }
    })
    .to_string()
}

/// Config that never sleeps for long: waits are bounded to a few milliseconds.
pub fn fast_config(replies: usize) -> HarvestConfig {
    HarvestConfig {
        settle_interval: Duration::from_millis(5),
        readiness_timeout: Duration::from_millis(50),
        ..HarvestConfig::for_replies(replies)
    }
}
