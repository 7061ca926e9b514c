//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // Rendering
    pub date_format: String,
    pub words_per_minute: usize,
    pub max_pages: usize,

    // Directory
    pub public_dir: String,
    pub i18n_dir: String,

    #[serde(default)]
    pub cms: CmsConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: String::new(),

            date_format: "dd MMM yyyy".to_string(),
            words_per_minute: 200,
            max_pages: 50,

            public_dir: "public".to_string(),
            i18n_dir: "languages".to_string(),

            cms: CmsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("PRISMIC_API_ENDPOINT").ok(),
            std::env::var("PRISMIC_ACCESS_TOKEN").ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            tracing::debug!("CMS endpoint overridden from environment");
            self.cms.endpoint = endpoint;
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.cms.access_token = Some(token);
        }
    }

    /// Parse the configured timezone, if any
    pub fn timezone(&self) -> Result<Option<chrono_tz::Tz>> {
        if self.timezone.is_empty() {
            return Ok(None);
        }
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {}", self.timezone, e))
    }

    /// Page size clamped to at least one post per page
    pub fn page_size(&self) -> usize {
        self.cms.page_size.max(1)
    }
}

/// Headless CMS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// Prismic API endpoint, e.g. `https://repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: usize,
    pub timeout_secs: u64,
    /// Restrict listing queries to these fields (`posts.title`, ...)
    #[serde(default)]
    pub fetch: Vec<String>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 1,
            timeout_secs: 10,
            fetch: Vec::new(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 3000,
        }
    }
}
