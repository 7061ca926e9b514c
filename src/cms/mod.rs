//! Headless CMS access
//!
//! Controllers only see the [`CmsClient`] trait; the Prismic REST client and
//! the in-memory client are interchangeable behind it.

mod memory;
mod prismic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SiteConfig;
use crate::content::RawPost;
use crate::Result;

pub use memory::MemoryCms;
pub use prismic::PrismicClient;

/// Opaque token pointing at the next page of a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostsPage {
    #[serde(default)]
    pub results: Vec<RawPost>,
    /// Absent on the last page
    #[serde(default)]
    pub next_page: Option<Cursor>,
}

/// Parameters of a listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub document_type: String,
    pub page_size: usize,
    /// Fields to return; empty means all
    pub fetch: Vec<String>,
}

impl QueryOptions {
    pub fn new(document_type: &str, page_size: usize) -> Self {
        Self {
            document_type: document_type.to_string(),
            page_size,
            fetch: Vec::new(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            document_type: config.cms.document_type.clone(),
            page_size: config.page_size(),
            fetch: config.cms.fetch.clone(),
        }
    }
}

/// The operations the site needs from a CMS
#[async_trait]
pub trait CmsClient: Send + Sync {
    /// Fetch the first page of documents of a type
    async fn query(&self, options: &QueryOptions) -> Result<PostsPage>;

    /// Fetch the page a cursor points at
    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostsPage>;

    /// Look up one document by its uid; `None` if the CMS has no such document
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawPost>>;
}

/// Run a query and follow cursors until the last page
pub async fn query_all(client: &dyn CmsClient, options: &QueryOptions) -> Result<Vec<RawPost>> {
    let mut page = client.query(options).await?;
    let mut posts = std::mem::take(&mut page.results);

    while let Some(cursor) = page.next_page.take() {
        tracing::debug!("Following cursor {}", cursor);
        page = client.fetch_page(&cursor).await?;
        posts.append(&mut page.results);
    }

    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts(n: usize) -> Vec<RawPost> {
        (1..=n)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "uid": format!("post-{}", i),
                    "type": "posts",
                    "data": { "title": format!("Post {}", i) }
                }))
                .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_query_all_follows_cursors() {
        let cms = MemoryCms::new(posts(5));
        let all = query_all(&cms, &QueryOptions::new("posts", 2)).await.unwrap();

        let uids: Vec<_> = all.iter().filter_map(|p| p.uid.as_deref()).collect();
        assert_eq!(uids, ["post-1", "post-2", "post-3", "post-4", "post-5"]);
        assert_eq!(cms.fetch_count(), 3);
    }

    #[test]
    fn test_page_deserializes_null_cursor() {
        let page: PostsPage =
            serde_json::from_str(r#"{"page": 1, "results": [], "next_page": null}"#).unwrap();
        assert!(page.next_page.is_none());

        let page: PostsPage =
            serde_json::from_str(r#"{"results": [], "next_page": "https://x/?page=2"}"#).unwrap();
        assert_eq!(page.next_page, Some(Cursor::new("https://x/?page=2")));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = SiteConfig::default();
        config.cms.page_size = 0;
        config.cms.fetch = vec!["posts.title".to_string()];

        let options = QueryOptions::from_config(&config);
        assert_eq!(options.page_size, 1);
        assert_eq!(options.document_type, "posts");
        assert_eq!(options.fetch, ["posts.title"]);
    }
}
