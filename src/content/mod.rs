//! Content module - post models, rich text and the derived display values

pub mod formatter;
pub mod post;
pub mod readtime;
pub mod richtext;

pub use formatter::{format_detail, format_post};
pub use post::{ContentSection, Post, PostDetail, RawPost};
pub use readtime::{estimate_minutes, format_read_time};
pub use richtext::RichText;
