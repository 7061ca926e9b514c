//! spacetraveling: a server-rendered blog front-end backed by a headless CMS
//!
//! Posts live in a Prismic repository. The listing page accumulates pages of
//! posts behind a "load more" link, and each post renders with its rich-text
//! sections, a pt-BR publication date and an estimated read time. Pages are
//! either served live by an axum server or exported as static files.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod detail;
pub mod error;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod server;
pub mod templates;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{CmsClient, MemoryCms, PrismicClient};

/// The blog application
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Interface strings
    pub i18n: i18n::I18n,
}

impl Site {
    /// Create a site from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        let mut i18n = i18n::I18n::new(&config.language);
        i18n.load_languages(base_dir.join(&config.i18n_dir))?;

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
            i18n,
        })
    }

    /// The CMS to read posts from: a fixture file when given, Prismic otherwise
    pub fn cms_client(&self, fixture: Option<&Path>) -> anyhow::Result<Arc<dyn CmsClient>> {
        match fixture {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    self.base_dir.join(path)
                };
                Ok(Arc::new(MemoryCms::from_file(path)?))
            }
            None => Ok(Arc::new(PrismicClient::from_config(&self.config.cms)?)),
        }
    }

    /// Date formatter for this site's pattern, language and timezone
    pub fn date_formatter(&self) -> anyhow::Result<helpers::DateFormatter> {
        Ok(helpers::DateFormatter::new(
            &self.config.date_format,
            helpers::DateLocale::from_language(self.i18n.language()),
        )
        .with_timezone(self.config.timezone()?))
    }

    /// Renderer configured with this site's title, locale and timezone
    pub fn renderer(&self) -> anyhow::Result<templates::TemplateRenderer> {
        let dates = self.date_formatter()?;
        Ok(templates::TemplateRenderer::new(
            &self.config,
            &self.i18n,
            dates,
        )?)
    }
}
