//! Post listing with cursor pagination
//!
//! The listing starts from the first page fetched ahead of time and grows
//! by following the `next_page` cursor. Entries are only ever appended in
//! the order the source returns them; duplicates are kept.

use serde::Serialize;
use std::collections::HashSet;

use crate::content::PostSummary;
use crate::helpers::DateFormatter;
use crate::prismic::{ContentResult, ContentSource, ResultsPage};

/// A listed post with its display date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEntry {
    #[serde(flatten)]
    pub summary: PostSummary,
    /// Publication date formatted for display
    pub published: Option<String>,
}

/// The accumulated list of post summaries and the cursor for more
#[derive(Debug, Clone)]
pub struct PostListing {
    entries: Vec<ListingEntry>,
    next_page: Option<String>,
    dates: DateFormatter,
}

impl PostListing {
    /// An empty listing with no further pages
    pub fn new(dates: DateFormatter) -> Self {
        Self {
            entries: Vec::new(),
            next_page: None,
            dates,
        }
    }

    /// A listing initialized from the first page of a query
    pub fn from_page(page: ResultsPage, dates: DateFormatter) -> ContentResult<Self> {
        let results = page
            .results
            .into_iter()
            .map(PostSummary::from_document)
            .collect::<ContentResult<Vec<_>>>()?;

        let mut listing = Self::new(dates);
        listing.initialize(results, page.next_page);
        Ok(listing)
    }

    /// Replace the list and cursor with the results of the initial fetch
    pub fn initialize(&mut self, results: Vec<PostSummary>, next_page: Option<String>) {
        let dates = &self.dates;
        self.entries = results
            .into_iter()
            .map(|summary| entry(dates, summary))
            .collect();
        self.next_page = next_page;
    }

    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor of the next page, if any
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether the "load more" control should be shown
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetch the page behind the current cursor and append its results
    ///
    /// Returns the number of appended entries. Without a cursor nothing is
    /// fetched and `Ok(0)` is returned. On error the list and the cursor
    /// are left as they were.
    pub async fn load_more(&mut self, source: &dyn ContentSource) -> ContentResult<usize> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(0);
        };

        let page = source.fetch_page(cursor).await?;
        let results = page
            .results
            .into_iter()
            .map(PostSummary::from_document)
            .collect::<ContentResult<Vec<_>>>()?;

        let added = results.len();
        let dates = &self.dates;
        self.entries
            .extend(results.into_iter().map(|summary| entry(dates, summary)));
        self.next_page = page.next_page;

        tracing::debug!(
            "Loaded {} more posts ({} total, more: {})",
            added,
            self.entries.len(),
            self.next_page.is_some()
        );
        Ok(added)
    }

    /// Follow cursors until the last page, returning the number appended
    pub async fn load_all(&mut self, source: &dyn ContentSource) -> ContentResult<usize> {
        let mut seen = HashSet::new();
        let mut added = 0;

        while let Some(cursor) = self.next_page.clone() {
            if !seen.insert(cursor.clone()) {
                tracing::warn!("Content source repeated cursor {}, stopping", cursor);
                break;
            }
            added += self.load_more(source).await?;
        }

        Ok(added)
    }
}

fn entry(dates: &DateFormatter, summary: PostSummary) -> ListingEntry {
    let published = dates.format_opt(summary.first_publication_date.as_ref());
    ListingEntry { summary, published }
}
