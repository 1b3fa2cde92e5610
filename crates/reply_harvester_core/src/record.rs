use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Host used when building canonical post links.
pub const CANONICAL_HOST: &str = "www.threads.net";

/// A normalized post: either the root post or one of its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub identifier: String,
    pub pk: Option<String>,
    pub short_code: Option<String>,
    pub author: Author,
    pub text: String,
    pub published_at: Option<i64>,
    pub has_audio: Option<bool>,
    pub engagement: Engagement,
    pub media: Media,
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub handle: Option<String>,
    pub id: Option<String>,
    pub pk: Option<String>,
    pub verified: bool,
    pub avatar_url: Option<String>,
}

/// Engagement counters exactly as the source reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Engagement {
    pub like_count: Option<RawCount>,
    /// Usually free text such as "12 replies".
    pub reply_hint: Option<RawCount>,
}

/// A count that is either numeric or free text; never coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawCount {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for RawCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCount::Number(n) => write!(f, "{n}"),
            RawCount::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Media {
    /// Image URLs in source order, first occurrence kept.
    pub images: Vec<String>,
    pub videos: BTreeSet<String>,
    pub image_count: Option<u64>,
}

impl PostRecord {
    /// Minimal record with only an identifier; used by tests and fixtures.
    pub fn with_identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            pk: None,
            short_code: None,
            author: Author::default(),
            text: String::new(),
            published_at: None,
            has_audio: None,
            engagement: Engagement::default(),
            media: Media::default(),
            canonical_url: None,
        }
    }
}

/// `https://<host>/@{handle}/post/{code}`, only when both parts are known.
pub fn canonical_url(handle: Option<&str>, short_code: Option<&str>) -> Option<String> {
    match (handle, short_code) {
        (Some(handle), Some(code)) if !handle.is_empty() && !code.is_empty() => {
            Some(format!("https://{CANONICAL_HOST}/@{handle}/post/{code}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_url, RawCount};

    #[test]
    fn canonical_url_requires_both_parts() {
        assert_eq!(
            canonical_url(Some("alice"), Some("abc123")).as_deref(),
            Some("https://www.threads.net/@alice/post/abc123")
        );
        assert_eq!(canonical_url(Some("alice"), None), None);
        assert_eq!(canonical_url(None, Some("abc123")), None);
        assert_eq!(canonical_url(Some(""), Some("abc123")), None);
    }

    #[test]
    fn raw_count_displays_source_value() {
        assert_eq!(RawCount::Text("12 replies".into()).to_string(), "12 replies");
        assert_eq!(RawCount::Number(42.into()).to_string(), "42");
    }
}
