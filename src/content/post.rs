//! Post models: raw CMS records and the display shapes derived from them

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::richtext::RichText;

/// A post document as returned by the CMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    pub uid: Option<String>,

    #[serde(default, rename = "type")]
    pub doc_type: String,

    #[serde(default, with = "cms_date")]
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub data: RawPostData,
}

/// The custom-type fields of a post document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPostData {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub banner: Option<Banner>,
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: Option<String>,
}

/// One repeatable section of a post body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    pub heading: Option<String>,
    pub body: RichText,
}

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub uid: String,
    /// Kept raw; formatted when rendered
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub data: PostData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub data: PostDetailData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetailData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub content: Vec<ContentSection>,
}

/// Serde adapter for CMS timestamps.
///
/// Prismic writes `2021-03-25T19:25:28+0000`, which is not RFC 3339 (no colon
/// in the offset), so both shapes are accepted.
pub mod cms_date {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    const CMS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn parse(value: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_str(value, CMS_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(value))
            .ok()
    }

    pub fn serialize<S>(date: &Option<DateTime<FixedOffset>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format(CMS_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => match parse(&s) {
                Some(date) => Ok(Some(date)),
                None => {
                    let error = crate::Error::InvalidDate { value: s };
                    tracing::warn!("{}, treating as unpublished", error);
                    Ok(None)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const DOCUMENT: &str = r#"{
        "id": "YFzDWxIAACIAoZ7X",
        "uid": "como-utilizar-hooks",
        "type": "posts",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "last_publication_date": "2021-03-25T19:25:28+0000",
        "data": {
            "title": "Como utilizar Hooks",
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira",
            "banner": { "url": "https://images.prismic.io/banner.png", "alt": null },
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [{ "type": "paragraph", "text": "Lorem ipsum", "spans": [] }]
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_document() {
        let post: RawPost = serde_json::from_str(DOCUMENT).unwrap();
        assert_eq!(post.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(post.doc_type, "posts");

        let date = post.first_publication_date.unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2021, 3, 15));
        assert_eq!(date.hour(), 19);

        assert_eq!(post.data.author.as_deref(), Some("Joseph Oliveira"));
        assert_eq!(post.data.content.len(), 1);
        assert_eq!(
            post.data.banner.unwrap().url.as_deref(),
            Some("https://images.prismic.io/banner.png")
        );
    }

    #[test]
    fn test_parse_sparse_document() {
        let post: RawPost =
            serde_json::from_str(r#"{"uid": "x", "first_publication_date": null}"#).unwrap();
        assert!(post.first_publication_date.is_none());
        assert!(post.data.title.is_none());
        assert!(post.data.content.is_empty());
    }

    #[test]
    fn test_rfc3339_date_accepted() {
        let date = cms_date::parse("2021-03-15T19:25:28+00:00").unwrap();
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_invalid_date_is_dropped() {
        let post: RawPost =
            serde_json::from_str(r#"{"uid": "x", "first_publication_date": "soon"}"#).unwrap();
        assert_eq!(post.uid.as_deref(), Some("x"));
        assert!(post.first_publication_date.is_none());
    }

    #[test]
    fn test_page_with_bad_date_still_decodes() {
        let page: crate::cms::PostsPage = serde_json::from_str(
            r#"{
                "results": [
                    {"uid": "a", "type": "posts", "first_publication_date": "2021-03-15T19:25:28+0000"},
                    {"uid": "b", "type": "posts", "first_publication_date": "2021-03-15 19:25"}
                ],
                "next_page": null
            }"#,
        )
        .unwrap();

        assert_eq!(page.results.len(), 2);
        assert!(page.results[0].first_publication_date.is_some());
        assert_eq!(page.results[1].uid.as_deref(), Some("b"));
        assert!(page.results[1].first_publication_date.is_none());
    }
}
