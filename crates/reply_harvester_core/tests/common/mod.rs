#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Once;

use reply_harvester_core::{update, Effect, HarvestConfig, HarvestSession, Msg};
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
            "pk": id,
            "code": code,
            "taken_at": 1_700_000_000,
            "like_count": 3,
            "user": {
                "username": user,
                "id": format!("u-{user}"),
                "pk": format!("pk-{user}"),
                "is_verified": false,
                "profile_pic_url": format!("https://cdn.example/{user}.jpg")
            },
            "caption": { "text": text }
        },
        "view_replies_cta_string": "1 reply"
    })
}

/// A captured payload in the shape the source embeds: reply groups under `thread_items`.
pub fn blob(groups: Vec<Vec<Value>>) -> String {
    let containers: Vec<Value> = groups
        .into_iter()
        .map(|items| json!({ "thread_items": items }))
        .collect();
    json!({
        "data": {
            "root_code": ROOT_CODE,
            "edges": containers
        }
    })
    .to_string()
}

pub fn reply(n: u32) -> Value {
    fragment(
        &format!("r{n}"),
        &format!("reply{n}"),
        &format!("user{n}"),
        &format!("reply number {n}"),
    )
}

pub fn root() -> Value {
    fragment("root-id", ROOT_CODE, "alice", "Hello world")
}

/// Drives the pure state machine to completion, answering every effect
/// immediately and handing out one scripted drain per `DrainPayloads`.
pub fn run_scripted(config: HarvestConfig, drains: Vec<Vec<String>>) -> HarvestSession {
    let mut drains = drains.into_iter();
    let (mut session, effects) = update(HarvestSession::new(LINK, config), Msg::Start);
    let mut pending: VecDeque<Effect> = effects.into();

    while let Some(effect) = pending.pop_front() {
        let msg = match effect {
            Effect::Navigate { .. } | Effect::RevealMore => continue,
            Effect::AwaitReadiness { .. } => Msg::SourceReady,
            Effect::Settle { .. } => Msg::Settled,
            Effect::DrainPayloads => Msg::PayloadsDrained(drains.next().unwrap_or_default()),
            Effect::Finish => break,
        };
        let (next, more) = update(session, msg);
        session = next;
        pending.extend(more);
    }
    session
}
