//! In-memory CMS serving a fixed list of documents
//!
//! Used for offline development (`--fixture posts.json`) and in tests.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{CmsClient, Cursor, PostsPage, QueryOptions};
use crate::content::RawPost;
use crate::{Error, Result};

const CURSOR_PREFIX: &str = "memory:";

/// A CMS backed by a vector of documents
#[derive(Debug, Default)]
pub struct MemoryCms {
    posts: Vec<RawPost>,
    fetches: AtomicUsize,
    failures: AtomicUsize,
    page_failures: AtomicUsize,
    delay: Option<Duration>,
}

impl MemoryCms {
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self {
            posts,
            ..Default::default()
        }
    }

    /// Load documents from a JSON array file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let posts: Vec<RawPost> = serde_json::from_str(&content)?;
        tracing::info!(
            "Loaded {} fixture documents from {:?}",
            posts.len(),
            path.as_ref()
        );
        Ok(Self::new(posts))
    }

    /// Delay every response, to observe requests while they are in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the next `count` requests fail with a 503
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` cursor fetches fail with a 503; queries still succeed
    pub fn fail_next_pages(&self, count: usize) {
        self.page_failures.store(count, Ordering::SeqCst);
    }

    /// Number of requests served so far, failed ones included
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn begin_request(&self, paging: bool) -> Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failing = take_one(&self.failures) || (paging && take_one(&self.page_failures));
        if failing {
            return Err(Error::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "simulated outage".to_string(),
            });
        }

        Ok(())
    }

    fn page(&self, document_type: &str, page: usize, page_size: usize) -> PostsPage {
        let matching: Vec<&RawPost> = self
            .posts
            .iter()
            .filter(|p| p.doc_type.is_empty() || p.doc_type == document_type)
            .collect();

        let start = page.saturating_sub(1).saturating_mul(page_size);
        let end = start.saturating_add(page_size);
        let results = matching
            .iter()
            .skip(start)
            .take(page_size)
            .map(|p| (*p).clone())
            .collect();

        let next_page = (end < matching.len()).then(|| {
            Cursor::new(format!(
                "{}{}/page/{}?size={}",
                CURSOR_PREFIX,
                document_type,
                page + 1,
                page_size
            ))
        });

        PostsPage { results, next_page }
    }
}

/// Decrement a failure budget, true if one was left
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Parse `memory:{type}/page/{n}?size={m}`; the page window must fit in `usize`
fn parse_cursor(cursor: &Cursor) -> Option<(&str, usize, usize)> {
    let rest = cursor.as_str().strip_prefix(CURSOR_PREFIX)?;
    let (path, size) = rest.split_once("?size=")?;
    let (document_type, page) = path.split_once("/page/")?;
    let page = page.parse::<usize>().ok().filter(|p| *p >= 1)?;
    let size = size.parse::<usize>().ok().filter(|s| *s >= 1)?;
    (page - 1).checked_mul(size)?.checked_add(size)?;
    Some((document_type, page, size))
}

#[async_trait]
impl CmsClient for MemoryCms {
    async fn query(&self, options: &QueryOptions) -> Result<PostsPage> {
        self.begin_request(false).await?;
        Ok(self.page(&options.document_type, 1, options.page_size.max(1)))
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostsPage> {
        self.begin_request(true).await?;
        let (document_type, page, size) =
            parse_cursor(cursor).ok_or_else(|| Error::Cursor(cursor.to_string()))?;
        Ok(self.page(document_type, page, size))
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawPost>> {
        self.begin_request(false).await?;
        Ok(self
            .posts
            .iter()
            .find(|p| {
                p.uid.as_deref() == Some(uid)
                    && (p.doc_type.is_empty() || p.doc_type == document_type)
            })
            .cloned())
    }
}
