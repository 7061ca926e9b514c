//! Prismic REST API (v2) client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{CmsClient, Cursor, PostsPage, QueryOptions};
use crate::config::CmsConfig;
use crate::content::RawPost;
use crate::{Error, Result};

/// API root document; only the refs are of interest
#[derive(Debug, Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default, rename = "isMasterRef")]
    is_master_ref: bool,
}

/// Client for a Prismic repository
#[derive(Clone, Debug)]
pub struct PrismicClient {
    endpoint: String,
    base: reqwest::Url,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl PrismicClient {
    /// Creates a client for `endpoint`, e.g. `https://repo.cdn.prismic.io/api/v2`
    pub fn new(
        endpoint: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(Error::Config("cms.endpoint is not set".to_string()));
        }
        let base = reqwest::Url::parse(&endpoint)
            .map_err(|e| Error::Config(format!("invalid cms.endpoint {:?}: {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http("failed to build HTTP client", e))?;

        Ok(Self {
            endpoint,
            base,
            access_token: access_token.filter(|t| !t.is_empty()),
            client,
        })
    }

    pub fn from_config(config: &CmsConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    /// The ref of the currently published content
    async fn master_ref(&self) -> Result<String> {
        let root: ApiRoot = self.get_json(&self.endpoint, &[]).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| Error::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "API root has no master ref".to_string(),
            })
    }

    async fn search(&self, mut params: Vec<(&str, String)>) -> Result<PostsPage> {
        let reference = self.master_ref().await?;
        params.insert(0, ("ref", reference));

        let url = format!("{}/documents/search", self.endpoint);
        self.get_json(&url, &params).await
    }

    /// Whether `url` shares scheme, host and port with the endpoint
    fn is_same_origin(&self, url: &str) -> bool {
        reqwest::Url::parse(url).is_ok_and(|url| url.origin() == self.base.origin())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T> {
        let mut request = self.client.get(url).query(params);
        if let Some(token) = &self.access_token {
            if self.is_same_origin(url) && !url.contains("access_token=") {
                request = request.query(&[("access_token", token)]);
            }
        }

        tracing::debug!("GET {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("failed to reach {}", url), e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http("failed to read response body", e))?;

        if !status.is_success() {
            return Err(Error::Status { status, body: text });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Quote a value for use inside a predicate string
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait]
impl CmsClient for PrismicClient {
    async fn query(&self, options: &QueryOptions) -> Result<PostsPage> {
        let mut params = vec![
            (
                "q",
                format!("[[at(document.type,{})]]", quote(&options.document_type)),
            ),
            ("pageSize", options.page_size.max(1).to_string()),
        ];
        if !options.fetch.is_empty() {
            params.push(("fetch", options.fetch.join(",")));
        }

        self.search(params).await
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostsPage> {
        let url = cursor.as_str();
        if !self.is_same_origin(url) {
            tracing::warn!("Rejecting cursor outside {}: {}", self.endpoint, url);
            return Err(Error::Cursor(url.to_string()));
        }

        self.get_json(url, &[]).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawPost>> {
        let params = vec![
            (
                "q",
                format!("[[at(my.{}.uid,{})]]", document_type, quote(uid)),
            ),
            ("pageSize", "1".to_string()),
        ];

        let page = self.search(params).await?;
        Ok(page.results.into_iter().next())
    }
}
