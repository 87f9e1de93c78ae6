//! Reading-time estimation
//!
//! The body text of every section is reduced to plain text, concatenated
//! and split on single spaces. Runs of spaces, tabs and newlines are not
//! collapsed, so the count is a heuristic rather than a word count.

use serde::Serialize;

use super::{richtext, ContentSection};

/// Assumed reading speed
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Estimated reading time of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingTime {
    pub words: usize,
    pub minutes: usize,
}

impl ReadingTime {
    /// Estimate the reading time of `sections` at `words_per_minute`
    pub fn estimate(sections: &[ContentSection], words_per_minute: usize) -> Self {
        let words = word_count(&body_text(sections));
        Self {
            words,
            minutes: minutes_for(words, words_per_minute),
        }
    }
}

/// Plain text of every section body, sections with no text skipped
pub fn body_text(sections: &[ContentSection]) -> String {
    sections
        .iter()
        .map(|section| richtext::as_text(&section.body))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Number of single-space separated tokens in `text`
pub fn word_count(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.split(' ').count()
    }
}

/// Minutes needed for `words`, rounded up
pub fn minutes_for(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1))
}
