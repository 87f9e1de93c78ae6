//! Helper functions for templates
//!
//! Date, HTML and URL helpers, bundled with the site configuration and
//! translations so templates can be rendered from one place.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;

use crate::config::SiteConfig;
use crate::i18n::I18n;

/// Collection of all helper functions
#[derive(Debug, Clone)]
pub struct Helpers {
    config: SiteConfig,
    i18n: I18n,
    dates: DateFormatter,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig, i18n: I18n) -> Self {
        let dates = DateFormatter::new(&config.date_format, config.tz(), &i18n);
        Self {
            config,
            i18n,
            dates,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    /// Publication date formatter
    pub fn dates(&self) -> &DateFormatter {
        &self.dates
    }

    /// Get url_for helper
    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    /// Absolute path of a post page
    pub fn post_url(&self, slug: &str) -> String {
        self.url_for(&post_path(slug))
    }

    /// Translate a key (__ helper)
    pub fn t(&self, key: &str) -> String {
        self.i18n.get(key)
    }
}
