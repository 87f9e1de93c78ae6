//! Generate static files

use anyhow::Result;
use std::sync::Arc;

use crate::generator::Generator;
use crate::prismic::ContentSource;
use crate::Site;

/// Generate the site from the configured content repository
pub async fn run(site: &Site) -> Result<()> {
    run_with_source(site, site.content_source()?).await
}

/// Generate the site from `source` and record the build manifest
pub async fn run_with_source(site: &Site, source: Arc<dyn ContentSource>) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(site, source)?;
    let manifest = generator.generate().await?;
    manifest.save(&site.base_dir)?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} pages in {:.2}s",
        manifest.pages.len(),
        duration.as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BuildManifest;
    use crate::config::SiteConfig;
    use crate::prismic::memory::MemorySource;

    #[tokio::test]
    async fn test_generate_saves_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_config(dir.path().to_path_buf(), SiteConfig::default());

        run_with_source(&site, Arc::new(MemorySource::with_posts(3, 2)))
            .await
            .unwrap();

        let manifest = BuildManifest::load(&site.base_dir).unwrap();
        assert_eq!(manifest.pages.len(), 4);
        assert!(site.public_dir.join("post/post-2/index.html").exists());
    }
}
