//! Post detail resolution

use serde::Serialize;

use crate::cms::CmsClient;
use crate::content::{estimate_minutes, format_detail, format_read_time, PostDetail};
use crate::Result;

/// Outcome of looking up a post by uid
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(PostDetail),
    /// The CMS has no post with this uid
    NotFound(String),
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Look up a post and project it into its detail shape.
///
/// A missing post is a [`Resolution::NotFound`], not an error; errors are
/// reserved for failures talking to the CMS.
pub async fn resolve_post(
    client: &dyn CmsClient,
    document_type: &str,
    uid: &str,
) -> Result<Resolution> {
    if uid.trim().is_empty() {
        return Ok(Resolution::NotFound(uid.to_string()));
    }

    match client.get_by_uid(document_type, uid).await? {
        Some(raw) => Ok(Resolution::Found(format_detail(&raw))),
        None => {
            tracing::info!("Post {:?} not found", uid);
            Ok(Resolution::NotFound(uid.to_string()))
        }
    }
}

/// Values computed from a resolved post for one render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingStats {
    pub words: usize,
    pub minutes: usize,
    pub label: String,
}

impl ReadingStats {
    pub fn for_post(post: &PostDetail, words_per_minute: usize) -> Self {
        let words = post
            .data
            .content
            .iter()
            .map(|section| section.body.word_count())
            .sum();
        let minutes = estimate_minutes(&post.data.content, words_per_minute);

        Self {
            words,
            minutes,
            label: format_read_time(minutes),
        }
    }
}
