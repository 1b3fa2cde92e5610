use harvest_logging::harvest_warn;
use serde::Serialize;

use crate::record::PostRecord;

pub const TITLE_MAX_WORDS: usize = 20;
pub const TITLE_ELLIPSIS: &str = "...";

/// Root post first, then replies; at most `target_total` posts in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestResult {
    pub root: PostRecord,
    pub replies: Vec<PostRecord>,
    /// `false` when the requested root was never seen and the first post stands in.
    pub root_found: bool,
}

/// One line of tabular output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub author: String,
    pub comment: String,
    pub title: String,
}

/// Moves the root post to the front and truncates to `target_total`.
/// Returns `None` only when nothing was admitted.
pub fn assemble(
    mut admitted: Vec<PostRecord>,
    root_code: &str,
    target_total: usize,
) -> Option<HarvestResult> {
    if admitted.is_empty() {
        return None;
    }

    let root_index = admitted
        .iter()
        .position(|post| post.short_code.as_deref() == Some(root_code));
    let root_found = match root_index {
        Some(index) => {
            let root = admitted.remove(index);
            admitted.insert(0, root);
            true
        }
        None => {
            harvest_warn!(
                "Root post {} not found among {} posts; using the first one instead",
                root_code,
                admitted.len()
            );
            false
        }
    };

    admitted.truncate(target_total.max(1));
    let mut posts = admitted.into_iter();
    let root = posts.next()?;
    Some(HarvestResult {
        root,
        replies: posts.collect(),
        root_found,
    })
}

impl HarvestResult {
    /// Root plus replies.
    pub fn post_count(&self) -> usize {
        1 + self.replies.len()
    }

    /// Root row first, then one row per reply; every row carries the root's title.
    pub fn rows(&self) -> Vec<OutputRow> {
        let title = title_from(&self.root.text);
        std::iter::once(&self.root)
            .chain(self.replies.iter())
            .map(|post| OutputRow {
                author: post.author.handle.clone().unwrap_or_default(),
                comment: collapse_whitespace(&post.text),
                title: title.clone(),
            })
            .collect()
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First [`TITLE_MAX_WORDS`] words of the text, with an ellipsis if cut.
pub fn title_from(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > TITLE_MAX_WORDS {
        format!("{}{TITLE_ELLIPSIS}", words[..TITLE_MAX_WORDS].join(" "))
    } else {
        words.join(" ")
    }
}
