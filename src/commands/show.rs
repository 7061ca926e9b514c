//! Show a single post

use anyhow::Result;

use crate::cms::CmsClient;
use crate::content::PostDetail;
use crate::detail::{resolve_post, ReadingStats, Resolution};
use crate::helpers::DateFormatter;
use crate::Site;

/// Print a post's metadata and section outline
pub async fn run(site: &Site, cms: &dyn CmsClient, uid: &str) -> Result<()> {
    let post = match resolve_post(cms, &site.config.cms.document_type, uid).await? {
        Resolution::Found(post) => post,
        Resolution::NotFound(uid) => anyhow::bail!("Post not found: {}", uid),
    };

    let stats = ReadingStats::for_post(&post, site.config.words_per_minute);
    print!("{}", describe(&post, &stats, &site.date_formatter()?));
    Ok(())
}

fn describe(post: &PostDetail, stats: &ReadingStats, dates: &DateFormatter) -> String {
    let mut out = format!("{}\n", post.data.title);
    if !post.data.subtitle.is_empty() {
        out.push_str(&format!("{}\n", post.data.subtitle));
    }
    out.push_str(&format!(
        "{} | {} | {} ({} words)\n",
        dates.format(post.first_publication_date.as_ref()),
        post.data.author,
        stats.label,
        stats.words
    ));
    if let Some(banner) = &post.data.banner_url {
        out.push_str(&format!("Banner: {}\n", banner));
    }

    for section in &post.data.content {
        out.push_str(&format!(
            "  # {} ({} words)\n",
            section.heading.as_deref().unwrap_or(""),
            section.body.word_count()
        ));
    }
    out
}
