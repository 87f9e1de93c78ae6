//! Content module - posts, rich text and reading time

mod post;
pub mod reading_time;
pub mod richtext;

pub use post::{ContentSection, PostDetail, PostSummary};
pub use reading_time::ReadingTime;
pub use richtext::RichTextBlock;
