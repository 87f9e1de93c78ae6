//! Headless CMS client
//!
//! The content source is reached through the [`ContentSource`] trait so the
//! listing accumulator, the generator and the server can run against the
//! HTTP client in production and against in-memory sources in tests.

mod client;
mod document;
mod error;
#[cfg(test)]
pub(crate) mod memory;
mod predicate;

use async_trait::async_trait;

pub use client::HttpContentSource;
pub use document::{timestamp, Document, ResultsPage};
pub use error::{ContentError, ContentResult};
pub use predicate::{Predicate, Query};

/// A remote store of documents with cursor pagination
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a listing query and return its first page
    async fn query(&self, query: &Query) -> ContentResult<ResultsPage>;

    /// Follow a `next_page` cursor returned by a previous page
    async fn fetch_page(&self, cursor: &str) -> ContentResult<ResultsPage>;

    /// Look up a single document by type and uid
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> ContentResult<Document>;
}
