use url::Url;

use crate::record::CANONICAL_HOST;

/// Where to navigate and which post code counts as the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub url: String,
    pub root_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("locator is empty")]
    Empty,
    #[error("cannot derive a post code from {0:?} (expected a /post/<code> link or a bare code)")]
    NoPostCode(String),
}

impl Locator {
    /// Accepts a post link (`.../@user/post/<code>`, scheme optional) or a bare post code.
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(LocatorError::Empty);
        }

        if is_bare_code(input) {
            return Ok(Self {
                url: format!("https://{CANONICAL_HOST}/post/{input}"),
                root_code: input.to_string(),
            });
        }

        let with_scheme = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{input}")
        };
        let url = Url::parse(&with_scheme)
            .map_err(|_| LocatorError::NoPostCode(input.to_string()))?;
        let root_code = post_code_from_path(&url)
            .ok_or_else(|| LocatorError::NoPostCode(input.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            root_code,
        })
    }
}

fn is_bare_code(input: &str) -> bool {
    input
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn post_code_from_path(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "post" {
            return segments
                .next()
                .filter(|code| !code.is_empty())
                .map(ToOwned::to_owned);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{Locator, LocatorError};

    #[test]
    fn code_taken_from_post_link() {
        let loc = Locator::parse("https://www.threads.net/@alice/post/DPgqkOUDgoZ?xmt=abc").unwrap();
        assert_eq!(loc.root_code, "DPgqkOUDgoZ");
        assert!(loc.url.starts_with("https://www.threads.net/@alice/post/DPgqkOUDgoZ"));
    }

    #[test]
    fn trailing_segments_ignored() {
        let loc = Locator::parse("  https://www.threads.com/@bob/post/abc-123/media  ").unwrap();
        assert_eq!(loc.root_code, "abc-123");
    }

    #[test]
    fn scheme_is_optional() {
        let loc = Locator::parse("www.threads.net/@alice/post/xyz").unwrap();
        assert_eq!(loc.root_code, "xyz");
        assert!(loc.url.starts_with("https://"));
    }

    #[test]
    fn bare_code_builds_url() {
        let loc = Locator::parse("abc123").unwrap();
        assert_eq!(loc.root_code, "abc123");
        assert_eq!(loc.url, "https://www.threads.net/post/abc123");
    }

    #[test]
    fn link_without_post_segment_rejected() {
        assert!(matches!(
            Locator::parse("https://www.threads.net/@alice"),
            Err(LocatorError::NoPostCode(_))
        ));
        assert!(matches!(
            Locator::parse("https://www.threads.net/@alice/post/"),
            Err(LocatorError::NoPostCode(_))
        ));
        assert_eq!(Locator::parse("   "), Err(LocatorError::Empty));
        assert!(Locator::parse("not a locator").is_err());
    }
}
