//! Listing pagination
//!
//! [`Pagination`] is the state machine behind the post listing: an
//! append-only list of posts and the cursor of the next page. A "load more"
//! trigger is split into [`Pagination::begin_load`], which claims the single
//! in-flight slot, and [`Pagination::complete_load`] / [`Pagination::fail_load`],
//! which apply the response. [`ListingController`] drives the state machine
//! against a [`CmsClient`], releasing the lock while the fetch is awaited.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cms::{CmsClient, Cursor, PostsPage, QueryOptions};
use crate::content::{format_post, Post};
use crate::{Error, Result};

/// What a "load more" trigger did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many posts were appended
    Appended(usize),
    /// No cursor; nothing was fetched
    Exhausted,
    /// Another fetch is in flight; nothing was fetched
    Busy,
    /// The listing was detached before the response arrived
    Discarded,
}

/// Result of claiming a load
#[derive(Debug)]
pub enum Trigger {
    Fetch(LoadTicket),
    Skip(LoadOutcome),
}

/// Proof that a fetch was started; carries the cursor to fetch
#[derive(Debug)]
pub struct LoadTicket {
    cursor: Cursor,
}

impl LoadTicket {
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

/// Listing state: loaded posts and where the next page is
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    results: Vec<Post>,
    next_page: Option<Cursor>,
    in_flight: bool,
    detached: bool,
    last_error: Option<String>,
}

impl Pagination {
    /// Initialize from the first page of a query
    pub fn new(page: PostsPage) -> Self {
        Self {
            results: page.results.iter().map(format_post).collect(),
            next_page: page.next_page,
            ..Default::default()
        }
    }

    pub fn results(&self) -> &[Post] {
        &self.results
    }

    pub fn next_page(&self) -> Option<&Cursor> {
        self.next_page.as_ref()
    }

    /// Whether the "load more" affordance should be offered
    pub fn can_load_more(&self) -> bool {
        self.next_page.is_some() && !self.detached
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Claim the in-flight slot for the page at the cursor
    pub fn begin_load(&mut self) -> Trigger {
        if self.detached {
            return Trigger::Skip(LoadOutcome::Discarded);
        }
        if self.in_flight {
            return Trigger::Skip(LoadOutcome::Busy);
        }
        let Some(cursor) = self.next_page.clone() else {
            return Trigger::Skip(LoadOutcome::Exhausted);
        };

        self.in_flight = true;
        Trigger::Fetch(LoadTicket { cursor })
    }

    /// Apply a fetched page: append its posts and move the cursor
    pub fn complete_load(&mut self, ticket: LoadTicket, page: PostsPage) -> LoadOutcome {
        self.in_flight = false;
        if self.detached {
            tracing::debug!("Discarding page for {} after detach", ticket.cursor);
            return LoadOutcome::Discarded;
        }

        let appended = page.results.len();
        self.results.extend(page.results.iter().map(format_post));
        self.next_page = page.next_page;
        self.last_error = None;

        LoadOutcome::Appended(appended)
    }

    /// Record a failed fetch. Posts and cursor are kept so the load can be
    /// retried. Returns false if the listing was detached meanwhile.
    pub fn fail_load(&mut self, ticket: LoadTicket, error: &Error) -> bool {
        self.in_flight = false;
        if self.detached {
            return false;
        }

        tracing::warn!("Loading page {} failed: {}", ticket.cursor, error);
        self.last_error = Some(error.to_string());
        true
    }

    /// Stop accepting triggers and responses
    pub fn detach(&mut self) {
        self.detached = true;
        self.in_flight = false;
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        ListingSnapshot {
            results: self.results.clone(),
            next_page: self.next_page.clone(),
            can_load_more: self.can_load_more(),
            error: self.last_error.clone(),
        }
    }
}

/// A copy of the listing state for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSnapshot {
    pub results: Vec<Post>,
    pub next_page: Option<Cursor>,
    pub can_load_more: bool,
    pub error: Option<String>,
}

/// Drives a [`Pagination`] against a CMS
pub struct ListingController {
    client: Arc<dyn CmsClient>,
    state: Mutex<Pagination>,
}

impl ListingController {
    /// Fetch the first page and build a controller around it
    pub async fn load(client: Arc<dyn CmsClient>, options: &QueryOptions) -> Result<Self> {
        let page = client.query(options).await?;
        tracing::debug!(
            "Initial listing page: {} posts, more: {}",
            page.results.len(),
            page.next_page.is_some()
        );
        Ok(Self::from_page(client, page))
    }

    pub fn from_page(client: Arc<dyn CmsClient>, page: PostsPage) -> Self {
        Self {
            client,
            state: Mutex::new(Pagination::new(page)),
        }
    }

    /// Fetch the next page and append it.
    ///
    /// Performs at most one fetch. Triggers while a fetch is in flight, or
    /// after the cursor is exhausted, return without fetching.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let ticket = match self.state.lock().await.begin_load() {
            Trigger::Fetch(ticket) => ticket,
            Trigger::Skip(outcome) => return Ok(outcome),
        };

        // the lock is not held across the fetch
        let fetched = self.client.fetch_page(ticket.cursor()).await;

        let mut state = self.state.lock().await;
        match fetched {
            Ok(page) => Ok(state.complete_load(ticket, page)),
            Err(err) => {
                if state.fail_load(ticket, &err) {
                    Err(err)
                } else {
                    Ok(LoadOutcome::Discarded)
                }
            }
        }
    }

    /// Trigger "load more" until `pages` pages are loaded, the cursor runs
    /// out, or a fetch fails. Failures are left in the snapshot's `error`.
    pub async fn load_until(&self, pages: usize) -> ListingSnapshot {
        for _ in 1..pages {
            match self.load_more().await {
                Ok(LoadOutcome::Appended(_)) => continue,
                Ok(_) | Err(_) => break,
            }
        }
        self.snapshot().await
    }

    pub async fn snapshot(&self) -> ListingSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Discard responses from now on; used when the listing goes away
    pub async fn detach(&self) {
        self.state.lock().await.detach();
    }
}
