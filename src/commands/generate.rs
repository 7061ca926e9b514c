//! Generate static files
//!
//! Writes the listing as a chain of pages (`index.html`, `page/2/index.html`,
//! ...) where page N holds the first N pages of posts and its "load more"
//! link points at page N+1, one page per post under `post/<uid>/`, and a
//! `404.html`.

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::cms::{query_all, CmsClient, QueryOptions};
use crate::detail::{resolve_post, ReadingStats, Resolution};
use crate::listing::{ListingController, ListingSnapshot, LoadOutcome};
use crate::templates::{HomeLinks, TemplateRenderer};
use crate::Site;

/// What a generation run wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateSummary {
    pub listing_pages: usize,
    pub posts: usize,
}

/// Generate the static site from the CMS
pub async fn run(site: &Site, cms: Arc<dyn CmsClient>) -> Result<GenerateSummary> {
    let start = std::time::Instant::now();
    let renderer = site.renderer()?;
    let options = QueryOptions::from_config(&site.config);

    fs::create_dir_all(&site.public_dir)?;

    let listing_pages = generate_listing(site, &renderer, cms.clone(), &options).await?;
    let posts = generate_posts(site, &renderer, cms.as_ref(), &options).await?;

    write_page(&site.public_dir, "404.html", &renderer.render_not_found()?)?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} listing pages and {} posts in {:.2}s",
        listing_pages,
        posts,
        duration.as_secs_f64()
    );

    Ok(GenerateSummary {
        listing_pages,
        posts,
    })
}

async fn generate_listing(
    site: &Site,
    renderer: &TemplateRenderer,
    cms: Arc<dyn CmsClient>,
    options: &QueryOptions,
) -> Result<usize> {
    let max_pages = site.config.max_pages.max(1);
    let controller = ListingController::load(cms, options).await?;

    let mut page = 1;
    loop {
        let listing = controller.snapshot().await;
        write_listing_page(site, renderer, listing, page, max_pages)?;

        if page >= max_pages {
            break;
        }
        match controller.load_more().await? {
            LoadOutcome::Appended(_) => page += 1,
            _ => break,
        }
    }

    Ok(page)
}

fn write_listing_page(
    site: &Site,
    renderer: &TemplateRenderer,
    mut listing: ListingSnapshot,
    page: usize,
    max_pages: usize,
) -> Result<()> {
    listing.can_load_more &= page < max_pages;

    let links = HomeLinks {
        load_more: page_href(page + 1),
        retry: page_href(page),
    };
    let html = renderer.render_home(&listing, &links)?;

    let relative = if page == 1 {
        "index.html".to_string()
    } else {
        format!("page/{}/index.html", page)
    };
    write_page(&site.public_dir, &relative, &html)
}

fn page_href(page: usize) -> String {
    if page <= 1 {
        "/".to_string()
    } else {
        format!("/page/{}/", page)
    }
}

async fn generate_posts(
    site: &Site,
    renderer: &TemplateRenderer,
    cms: &dyn CmsClient,
    options: &QueryOptions,
) -> Result<usize> {
    let document_type = &site.config.cms.document_type;
    let mut count = 0;

    for raw in query_all(cms, options).await? {
        let Some(uid) = raw.uid.filter(|uid| is_safe_uid(uid)) else {
            tracing::warn!("Skipping a post without a usable uid");
            continue;
        };

        let post = match resolve_post(cms, document_type, &uid).await? {
            Resolution::Found(post) => post,
            Resolution::NotFound(uid) => {
                tracing::warn!("Post {:?} disappeared while generating", uid);
                continue;
            }
        };

        let stats = ReadingStats::for_post(&post, site.config.words_per_minute);
        let html = renderer.render_post(&post, &stats)?;
        write_page(
            &site.public_dir,
            &format!("post/{}/index.html", uid),
            &html,
        )?;
        count += 1;
    }

    Ok(count)
}

/// A uid usable as a single path segment
fn is_safe_uid(uid: &str) -> bool {
    !uid.is_empty() && uid != "." && uid != ".." && !uid.contains(['/', '\\'])
}

fn write_page(public_dir: &Path, relative: &str, html: &str) -> Result<()> {
    let output_path = public_dir.join(relative);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, html)?;
    tracing::debug!("Wrote {:?}", output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::MemoryCms;
    use crate::content::RawPost;

    fn raw(uid: &str) -> RawPost {
        serde_json::from_value(serde_json::json!({
            "uid": uid,
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": format!("Title {}", uid),
                "content": [{ "heading": "H", "body": [{ "type": "paragraph", "text": "x y", "spans": [] }] }]
            }
        }))
        .unwrap()
    }

    fn site(dir: &Path, max_pages: usize) -> Site {
        fs::write(
            dir.join("_config.yml"),
            format!("max_pages: {}\ncms:\n  page_size: 2\n", max_pages),
        )
        .unwrap();
        Site::new(dir).unwrap()
    }

    fn read(site: &Site, relative: &str) -> String {
        fs::read_to_string(site.public_dir.join(relative)).unwrap()
    }

    #[tokio::test]
    async fn test_generate_site() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), 10);
        let cms = Arc::new(MemoryCms::new(
            ["a", "b", "c", "d", "e"].iter().map(|u| raw(u)).collect(),
        ));

        let summary = run(&site, cms).await.unwrap();
        assert_eq!(
            summary,
            GenerateSummary {
                listing_pages: 3,
                posts: 5
            }
        );

        let index = read(&site, "index.html");
        assert!(index.contains("Title b"));
        assert!(!index.contains("Title c"));
        assert!(index.contains("href=\"/page/2/\""));

        let second = read(&site, "page/2/index.html");
        assert!(second.find("Title a") < second.find("Title d"));
        assert!(second.contains("href=\"/page/3/\""));

        let last = read(&site, "page/3/index.html");
        assert!(last.contains("Title e"));
        assert!(!last.contains("class=\"load-more\""));

        assert!(read(&site, "post/c/index.html").contains("<h1>Title c</h1>"));
        assert!(read(&site, "404.html").contains("Post não encontrado"));
    }

    #[tokio::test]
    async fn test_generate_stops_at_max_pages() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), 2);
        let cms = Arc::new(MemoryCms::new(
            ["a", "b", "c", "d", "e"].iter().map(|u| raw(u)).collect(),
        ));

        let summary = run(&site, cms).await.unwrap();
        assert_eq!(summary.listing_pages, 2);
        assert!(!read(&site, "page/2/index.html").contains("class=\"load-more\""));
        assert!(!site.public_dir.join("page/3").exists());
        // every post still gets its page
        assert_eq!(summary.posts, 5);
    }

    #[tokio::test]
    async fn test_generate_skips_unsafe_uids() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), 10);
        let cms = Arc::new(MemoryCms::new(vec![raw("ok"), raw("../escape")]));

        let summary = run(&site, cms).await.unwrap();
        assert_eq!(summary.posts, 1);
        assert!(!dir.path().join("escape").exists());
    }

    #[tokio::test]
    async fn test_generate_fails_on_cms_error() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), 10);
        let cms = Arc::new(MemoryCms::new(vec![raw("a"), raw("b"), raw("c")]));
        cms.fail_next_pages(1);

        assert!(run(&site, cms).await.is_err());
    }

    #[test]
    fn test_is_safe_uid() {
        assert!(is_safe_uid("como-utilizar-hooks"));
        assert!(!is_safe_uid(""));
        assert!(!is_safe_uid(".."));
        assert!(!is_safe_uid("a/b"));
    }
}
