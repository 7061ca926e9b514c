//! Page templates using the Tera template engine
//!
//! The templates are embedded in the binary. Dates are kept raw in the view
//! data and formatted by the `date_format` filter with the site's locale,
//! pattern and timezone.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

use crate::config::SiteConfig;
use crate::content::post::cms_date;
use crate::content::PostDetail;
use crate::detail::ReadingStats;
use crate::helpers::{date_xml, excerpt, html_escape, DateFormatter};
use crate::i18n::I18n;
use crate::listing::ListingSnapshot;
use crate::Result;

const DESCRIPTION_LENGTH: usize = 160;

/// Template renderer for the site's pages
pub struct TemplateRenderer {
    tera: Tera,
    site_title: String,
    language: String,
    strings: HashMap<String, String>,
}

impl TemplateRenderer {
    /// Create a renderer with all templates loaded
    pub fn new(config: &SiteConfig, i18n: &I18n, dates: DateFormatter) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("home.html", include_str!("theme/home.html")),
            ("post.html", include_str!("theme/post.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            ("error.html", include_str!("theme/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/style.html",
                include_str!("theme/partials/style.html"),
            ),
        ])?;

        tera.register_filter("date_format", date_format_filter(dates));

        Ok(Self {
            tera,
            site_title: config.title.clone(),
            language: i18n.language().to_string(),
            strings: i18n.all(),
        })
    }

    /// Render the post listing
    pub fn render_home(&self, listing: &ListingSnapshot, links: &HomeLinks) -> Result<String> {
        let mut context = self.base_context();
        context.insert("posts", &listing.results);
        context.insert("can_load_more", &listing.can_load_more);
        context.insert("error", &listing.error.is_some());
        context.insert("load_more_href", &html_escape(&links.load_more));
        context.insert("retry_href", &html_escape(&links.retry));
        self.render("home.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail, stats: &ReadingStats) -> Result<String> {
        let sections: Vec<SectionView> = post
            .data
            .content
            .iter()
            .map(|section| SectionView {
                heading: section.heading.clone().unwrap_or_default(),
                html: section.body.as_html(),
            })
            .collect();

        let description = if post.data.subtitle.is_empty() {
            post.data
                .content
                .first()
                .map(|section| section.body.as_text())
                .unwrap_or_default()
        } else {
            post.data.subtitle.clone()
        };

        let mut context = self.base_context();
        context.insert("post", post);
        context.insert("sections", &sections);
        context.insert("stats", stats);
        context.insert("description", &excerpt(&description, DESCRIPTION_LENGTH));
        context.insert(
            "published_iso",
            &post
                .first_publication_date
                .as_ref()
                .map(date_xml)
                .unwrap_or_default(),
        );
        self.render("post.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.render("not_found.html", &self.base_context())
    }

    /// Render the error page; `retry_href` is the page to request again
    pub fn render_error(&self, retry_href: &str) -> Result<String> {
        let mut context = self.base_context();
        context.insert("retry_href", &html_escape(retry_href));
        self.render("error.html", &context)
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site_title", &self.site_title);
        context.insert("language", &self.language);
        context.insert("t", &self.strings);
        context
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Targets of the listing's links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLinks {
    pub load_more: String,
    pub retry: String,
}

#[derive(Debug, Clone, Serialize)]
struct SectionView {
    heading: String,
    html: String,
}

/// Tera filter: format a serialized timestamp, `null` becomes the fallback
fn date_format_filter(
    formatter: DateFormatter,
) -> impl Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync {
    move |value, _args| match value {
        Value::Null => Ok(Value::String(formatter.format(None))),
        Value::String(s) => match cms_date::parse(s) {
            Some(date) => Ok(Value::String(formatter.format(Some(&date)))),
            None => {
                tracing::warn!("Unparseable date {:?}, rendering as-is", s);
                Ok(Value::String(s.clone()))
            }
        },
        other => Err(tera::Error::msg(format!(
            "Filter `date_format` received an unsupported value: {}",
            other
        ))),
    }
}
