//! Helper functions shared by renderers and templates

mod date;
mod html;

pub use date::*;
pub use html::*;
