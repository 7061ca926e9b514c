//! Projection of raw CMS records into display shapes
//!
//! Both functions are pure: they borrow the raw record and build a new value.
//! Dates are carried through untouched and formatted at render time.

use super::post::{Post, PostData, PostDetail, PostDetailData, RawPost};

/// Map a raw record to its listing shape
pub fn format_post(raw: &RawPost) -> Post {
    Post {
        uid: raw.uid.clone().unwrap_or_default(),
        first_publication_date: raw.first_publication_date,
        data: PostData {
            title: raw.data.title.clone().unwrap_or_default(),
            subtitle: raw.data.subtitle.clone().unwrap_or_default(),
            author: raw.data.author.clone().unwrap_or_default(),
        },
    }
}

/// Map a raw record to its detail shape
pub fn format_detail(raw: &RawPost) -> PostDetail {
    PostDetail {
        uid: raw.uid.clone().unwrap_or_default(),
        first_publication_date: raw.first_publication_date,
        data: PostDetailData {
            title: raw.data.title.clone().unwrap_or_default(),
            subtitle: raw.data.subtitle.clone().unwrap_or_default(),
            author: raw.data.author.clone().unwrap_or_default(),
            banner_url: raw
                .data
                .banner
                .as_ref()
                .and_then(|b| b.url.clone())
                .filter(|url| !url.is_empty()),
            content: raw.data.content.clone(),
        },
    }
}
