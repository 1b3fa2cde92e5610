use std::collections::BTreeSet;

use serde_json::Value;

use crate::record::{canonical_url, Author, Engagement, Media, PostRecord, RawCount};

/// Why a fragment did not map to a [`PostRecord`]. Frequent and harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unextractable {
    #[error("fragment has no post object")]
    MissingPost,
    #[error("post has no usable identifier")]
    MissingIdentifier,
}

/// Projects one reply fragment (`{"post": {...}, "view_replies_cta_string": ...}`)
/// onto a [`PostRecord`].
pub fn extract(fragment: &Value) -> Result<PostRecord, Unextractable> {
    let post = fragment
        .get("post")
        .filter(|p| p.is_object())
        .ok_or(Unextractable::MissingPost)?;

    let identifier = post
        .get("id")
        .and_then(scalar_string)
        .filter(|id| !id.is_empty())
        .ok_or(Unextractable::MissingIdentifier)?;

    let short_code = string_at(post, "/code");
    let handle = string_at(post, "/user/username");

    Ok(PostRecord {
        canonical_url: canonical_url(handle.as_deref(), short_code.as_deref()),
        identifier,
        pk: post.get("pk").and_then(scalar_string),
        short_code,
        author: Author {
            handle,
            id: post.pointer("/user/id").and_then(scalar_string),
            pk: post.pointer("/user/pk").and_then(scalar_string),
            verified: post
                .pointer("/user/is_verified")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            avatar_url: string_at(post, "/user/profile_pic_url"),
        },
        text: string_at(post, "/caption/text").unwrap_or_default(),
        published_at: post.get("taken_at").and_then(Value::as_i64),
        has_audio: post.get("has_audio").and_then(Value::as_bool),
        engagement: Engagement {
            like_count: post.get("like_count").and_then(raw_count),
            reply_hint: fragment.get("view_replies_cta_string").and_then(raw_count),
        },
        media: Media {
            images: carousel_images(post),
            videos: video_urls(post),
            image_count: post.get("carousel_media_count").and_then(Value::as_u64),
        },
    })
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn raw_count(value: &Value) -> Option<RawCount> {
    match value {
        Value::Number(n) => Some(RawCount::Number(n.clone())),
        Value::String(s) => Some(RawCount::Text(s.clone())),
        _ => None,
    }
}

// carousel_media[].image_versions2.candidates[1].url
fn carousel_images(post: &Value) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    let items = post
        .get("carousel_media")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for item in items {
        if let Some(url) = item
            .pointer("/image_versions2/candidates/1/url")
            .and_then(Value::as_str)
        {
            if !images.iter().any(|seen| seen == url) {
                images.push(url.to_string());
            }
        }
    }
    images
}

fn video_urls(post: &Value) -> BTreeSet<String> {
    post.get("video_versions")
        .and_then(Value::as_array)
        .map(|versions| {
            versions
                .iter()
                .filter_map(|v| v.get("url").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
