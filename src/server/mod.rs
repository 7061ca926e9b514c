//! HTTP server rendering pages from the CMS on each request

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cms::{CmsClient, Cursor, QueryOptions};
use crate::config::SiteConfig;
use crate::content::{format_post, Post};
use crate::detail::{resolve_post, ReadingStats, Resolution};
use crate::listing::ListingController;
use crate::templates::{HomeLinks, TemplateRenderer};
use crate::{Error, Site};

/// Shared, read-only state of the server
pub struct ServerState {
    config: SiteConfig,
    renderer: TemplateRenderer,
    cms: Arc<dyn CmsClient>,
    public_dir: PathBuf,
}

impl ServerState {
    pub fn new(site: &Site, cms: Arc<dyn CmsClient>) -> Result<Self> {
        Ok(Self {
            config: site.config.clone(),
            renderer: site.renderer()?,
            cms,
            public_dir: site.public_dir.clone(),
        })
    }

    fn not_found(&self) -> PageError {
        match self.renderer.render_not_found() {
            Ok(html) => PageError::new(StatusCode::NOT_FOUND, html),
            Err(e) => self.render_failure(e),
        }
    }

    /// A CMS failure: logged, then shown as an error page linking back to `retry_href`
    fn cms_failure(&self, error: Error, retry_href: &str) -> PageError {
        if error.is_transient() {
            tracing::warn!("CMS request for {} failed: {}", retry_href, error);
        } else {
            tracing::error!("CMS request for {} failed: {}", retry_href, error);
        }
        match self.renderer.render_error(retry_href) {
            Ok(html) => PageError::new(StatusCode::BAD_GATEWAY, html),
            Err(e) => self.render_failure(e),
        }
    }

    fn render_failure(&self, error: Error) -> PageError {
        tracing::error!("Rendering failed: {}", error);
        PageError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    }
}

/// An error page ready to be sent
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    html: String,
}

impl PageError {
    fn new(status: StatusCode, html: String) -> Self {
        Self { status, html }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (self.status, Html(self.html)).into_response()
    }
}

type PageResult = std::result::Result<Html<String>, PageError>;

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/post/:slug", get(post_handler))
        .route("/api/posts/next", get(next_page_handler))
        .route("/healthz", get(|| async { "ok" }))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(site: &Site, cms: Arc<dyn CmsClient>, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(ServerState::new(site, cms)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
}

#[derive(Debug, Deserialize)]
struct HomeQuery {
    pages: Option<String>,
}

/// Listing with `?pages=N` pages accumulated
async fn home_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<HomeQuery>,
) -> PageResult {
    let max_pages = state.config.max_pages.max(1);
    let pages = query
        .pages
        .and_then(|p| p.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, max_pages);
    let here = format!("/?pages={}", pages);

    let options = QueryOptions::from_config(&state.config);
    let controller = ListingController::load(state.cms.clone(), &options)
        .await
        .map_err(|e| state.cms_failure(e, &here))?;

    let mut listing = controller.load_until(pages).await;
    listing.can_load_more &= pages < max_pages;

    let links = HomeLinks {
        load_more: format!("/?pages={}", pages + 1),
        retry: here,
    };

    state
        .renderer
        .render_home(&listing, &links)
        .map(Html)
        .map_err(|e| state.render_failure(e))
}

/// A single post, or the not-found page
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> PageResult {
    let resolution = resolve_post(state.cms.as_ref(), &state.config.cms.document_type, &slug)
        .await
        .map_err(|e| state.cms_failure(e, &format!("/post/{}", slug)))?;

    let post = match resolution {
        Resolution::Found(post) => post,
        Resolution::NotFound(_) => return Err(state.not_found()),
    };

    let stats = ReadingStats::for_post(&post, state.config.words_per_minute);
    state
        .renderer
        .render_post(&post, &stats)
        .map(Html)
        .map_err(|e| state.render_failure(e))
}

#[derive(Debug, Deserialize)]
struct NextPageQuery {
    cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct NextPageBody {
    results: Vec<Post>,
    next_page: Option<Cursor>,
}

/// One page of formatted posts as JSON; without a cursor, the first page
async fn next_page_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<NextPageQuery>,
) -> Response {
    let fetched = match query.cursor.filter(|c| !c.is_empty()) {
        Some(cursor) => state.cms.fetch_page(&Cursor::new(cursor)).await,
        None => {
            state
                .cms
                .query(&QueryOptions::from_config(&state.config))
                .await
        }
    };

    match fetched {
        Ok(page) => Json(NextPageBody {
            results: page.results.iter().map(format_post).collect(),
            next_page: page.next_page,
        })
        .into_response(),
        Err(e) => {
            let status = match e {
                Error::Cursor(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            tracing::warn!("Next page request failed: {}", e);
            (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}

/// Static files from the public directory, the not-found page otherwise
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    if state.public_dir.is_dir() {
        let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
        match service.try_call(request).await {
            Ok(response) if response.status() != StatusCode::NOT_FOUND => {
                return response.into_response();
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Serving static file failed: {}", e),
        }
    }

    state.not_found().into_response()
}
