//! In-memory content source for tests

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ContentError, ContentResult, ContentSource, Document, Query, ResultsPage};

const CURSOR_PREFIX: &str = "memory://page/";

/// Serves a fixed list of documents, `page_size` per page
pub struct MemorySource {
    pub documents: Vec<Document>,
    pub page_size: usize,
    pub lookups: AtomicUsize,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>, page_size: usize) -> Self {
        Self {
            documents,
            page_size,
            lookups: AtomicUsize::new(0),
        }
    }

    /// `count` posts with uids `post-1`..`post-N`
    pub fn with_posts(count: usize, page_size: usize) -> Self {
        let documents = (1..=count)
            .map(|n| post_document(&format!("post-{}", n), &format!("Post {}", n)))
            .collect();
        Self::new(documents, page_size)
    }

    fn page(&self, number: usize) -> ResultsPage {
        let start = (number - 1) * self.page_size;
        let results = self
            .documents
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();
        let next_page = (start + self.page_size < self.documents.len())
            .then(|| format!("{}{}", CURSOR_PREFIX, number + 1));
        ResultsPage { results, next_page }
    }
}

/// A post document with one section of body text
pub fn post_document(uid: &str, title: &str) -> Document {
    serde_json::from_value(json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "posts",
        "first_publication_date": "2021-03-25T19:25:28+0000",
        "data": {
            "title": title,
            "subtitle": format!("Sobre {}", title),
            "author": "Joseph Oliveira",
            "banner": {"url": "https://images.prismic.io/banner.png"},
            "content": [{
                "heading": "Introdução",
                "body": [{"type": "paragraph", "text": "Lorem ipsum dolor sit amet", "spans": []}]
            }]
        }
    }))
    .unwrap()
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query(&self, _query: &Query) -> ContentResult<ResultsPage> {
        Ok(self.page(1))
    }

    async fn fetch_page(&self, cursor: &str) -> ContentResult<ResultsPage> {
        cursor
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|n| n.parse().ok())
            .filter(|&n| n >= 1)
            .map(|n| self.page(n))
            .ok_or_else(|| ContentError::not_found("page", cursor))
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> ContentResult<Document> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.documents
            .iter()
            .find(|d| d.doc_type == doc_type && d.uid.as_deref() == Some(uid))
            .cloned()
            .ok_or_else(|| ContentError::not_found(doc_type, uid))
    }
}
