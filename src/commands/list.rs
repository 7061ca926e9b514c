//! List site content

use anyhow::Result;

use crate::cms::{query_all, CmsClient, QueryOptions};
use crate::content::{format_post, Post};
use crate::helpers::DateFormatter;
use crate::Site;

/// List site content by type
pub async fn run(site: &Site, cms: &dyn CmsClient, content_type: &str) -> Result<()> {
    let options = QueryOptions::from_config(&site.config);

    match content_type {
        "post" | "posts" => {
            let posts: Vec<Post> = query_all(cms, &options)
                .await?
                .iter()
                .map(format_post)
                .collect();
            println!("Posts ({}):", posts.len());
            for line in post_lines(&posts, &site.date_formatter()?) {
                println!("  {}", line);
            }
        }
        "route" | "routes" => {
            let posts = query_all(cms, &options).await?;
            let routes = routes(posts.iter().filter_map(|p| p.uid.as_deref()));
            println!("Routes ({}):", routes.len());
            for route in routes {
                println!("  {}", route);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    }

    Ok(())
}

fn post_lines(posts: &[Post], dates: &DateFormatter) -> Vec<String> {
    posts
        .iter()
        .map(|post| {
            format!(
                "{} - {} [{}]",
                dates.format(post.first_publication_date.as_ref()),
                post.data.title,
                post.uid
            )
        })
        .collect()
}

fn routes<'a>(uids: impl Iterator<Item = &'a str>) -> Vec<String> {
    std::iter::once("/".to_string())
        .chain(uids.map(|uid| format!("/post/{}", uid)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::MemoryCms;
    use crate::content::RawPost;
    use crate::helpers::{DateLocale, DATE_FALLBACK};

    fn post(uid: &str, date: Option<&str>) -> Post {
        let raw: RawPost = serde_json::from_value(serde_json::json!({
            "uid": uid,
            "type": "posts",
            "first_publication_date": date,
            "data": { "title": format!("Title {}", uid) }
        }))
        .unwrap();
        format_post(&raw)
    }

    #[test]
    fn test_post_lines() {
        let posts = vec![
            post("a", Some("2021-03-15T19:25:28+0000")),
            post("b", None),
        ];
        let dates = DateFormatter::new("dd MMM yyyy", DateLocale::PtBr);

        assert_eq!(
            post_lines(&posts, &dates),
            [
                "15 mar 2021 - Title a [a]".to_string(),
                format!("{} - Title b [b]", DATE_FALLBACK),
            ]
        );
    }

    #[test]
    fn test_routes() {
        assert_eq!(routes(["a", "b"].into_iter()), ["/", "/post/a", "/post/b"]);
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let cms = MemoryCms::new(Vec::new());

        assert!(run(&site, &cms, "post").await.is_ok());
        assert!(run(&site, &cms, "tag").await.is_err());
    }
}
