//! spacetraveling: a static blog front-end for a headless CMS
//!
//! Posts are fetched from a Prismic repository, rendered with embedded Tera
//! templates and either written to a public directory or served by a small
//! axum server that regenerates pages once they are older than the
//! configured staleness window.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::prismic::{ContentSource, HttpContentSource};

/// A site directory with its configuration
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Language files directory
    pub languages_dir: PathBuf,
}

impl Site {
    /// Load the site in `base_dir`, using defaults when `_config.yml` is absent
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env_overrides();

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let public_dir = base_dir.join(&config.public_dir);
        let languages_dir = base_dir.join(&config.languages_dir);

        Self {
            config,
            base_dir,
            public_dir,
            languages_dir,
        }
    }

    /// HTTP client for the configured content repository
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        let source = HttpContentSource::new(
            self.config.content.endpoint.clone(),
            self.config.content.access_token.clone(),
        )?;
        Ok(Arc::new(source))
    }

    /// Translations for the configured language
    pub fn i18n(&self) -> Result<i18n::I18n> {
        let mut i18n = i18n::I18n::new(&self.config.language);
        i18n.load_languages(&self.languages_dir)?;
        Ok(i18n)
    }

    /// Template helpers bound to this site
    pub fn helpers(&self) -> Result<helpers::Helpers> {
        Ok(helpers::Helpers::new(self.config.clone(), self.i18n()?))
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
