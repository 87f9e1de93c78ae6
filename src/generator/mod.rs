//! Generator module - renders pages from the content source
//!
//! The generator owns the ahead-of-time fetches: the first listing page,
//! the listing pages reached by following cursors, and the post pages for
//! the slugs of the first listing page. The server uses the same generator
//! to render routes on demand.

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tera::Context;

use crate::cache::BuildManifest;
use crate::content::{richtext, PostDetail};
use crate::helpers::{date_xml, encode_segment, escape_html, Helpers};
use crate::listing::PostListing;
use crate::prismic::{ContentResult, ContentSource, Predicate, Query};
use crate::templates::{
    LabelsData, PostCardData, PostPageData, SectionData, SiteData, TemplateRenderer, STYLESHEET,
};
use crate::Site;

/// Seconds before the loading placeholder reloads itself
const LOADING_REFRESH_SECS: u64 = 1;

/// A page of the site
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Listing with `page` pages loaded, starting at 1
    Home { page: usize },
    Post { slug: String },
}

impl Route {
    pub fn home(page: usize) -> Option<Self> {
        (page >= 1).then_some(Self::Home { page })
    }

    /// A post route, `None` for slugs that cannot name a page
    pub fn post(slug: &str) -> Option<Self> {
        if slug.is_empty() || slug == "." || slug == ".." {
            return None;
        }
        Some(Self::Post {
            slug: slug.to_string(),
        })
    }

    /// Route path relative to the site root, e.g. `post/slug/`
    pub fn path(&self) -> String {
        match self {
            Self::Home { page: 1 } => String::new(),
            Self::Home { page } => format!("page/{}/", page),
            Self::Post { slug } => format!("post/{}/", encode_segment(slug)),
        }
    }

    /// Output file relative to the public dir
    pub fn output_file(&self) -> String {
        format!("{}index.html", self.path())
    }
}

/// Page renderer backed by a content source
pub struct Generator {
    site: Site,
    helpers: Helpers,
    renderer: TemplateRenderer,
    source: Arc<dyn ContentSource>,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site, source: Arc<dyn ContentSource>) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            helpers: site.helpers()?,
            renderer: TemplateRenderer::new()?,
            source,
        })
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    /// Query for the first listing page
    pub fn listing_query(&self) -> Query {
        let content = &self.site.config.content;
        Query::new(vec![Predicate::document_type(&content.document_type)])
            .fetch(&content.fetch)
            .page_size(content.page_size)
    }

    /// Fetch the first listing page
    pub async fn first_page(&self) -> ContentResult<PostListing> {
        let page = self.source.query(&self.listing_query()).await?;
        PostListing::from_page(page, self.helpers.dates().clone())
    }

    /// Slugs rendered ahead of time: those of the first listing page
    pub async fn static_paths(&self) -> ContentResult<Vec<String>> {
        let listing = self.first_page().await?;
        Ok(listing
            .entries()
            .iter()
            .map(|e| e.summary.slug().to_string())
            .collect())
    }

    /// Fetch a full post
    pub async fn fetch_post(&self, slug: &str) -> ContentResult<PostDetail> {
        let doc_type = &self.site.config.content.document_type;
        let document = self.source.get_by_uid(doc_type, slug).await?;
        PostDetail::from_document(document)
    }

    /// Render `route`, `None` when the content source has nothing for it
    pub async fn render_route(&self, route: &Route) -> Result<Option<String>> {
        match route {
            Route::Home { page } => {
                let mut listing = self.first_page().await?;
                for _ in 1..*page {
                    if !listing.has_more() {
                        return Ok(None);
                    }
                    listing.load_more(self.source()).await?;
                }
                Ok(Some(self.render_home(&listing, *page)?))
            }
            Route::Post { slug } => match self.fetch_post(slug).await {
                Ok(post) => Ok(Some(self.render_post(&post)?)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e.into()),
            },
        }
    }

    fn site_data(&self) -> SiteData {
        let config = self.helpers.config();
        SiteData {
            title: escape_html(&config.title),
            language: escape_html(&config.language),
            root: self.helpers.url_for(""),
            stylesheet: self.helpers.url_for("style.css"),
        }
    }

    fn labels_data(&self) -> LabelsData {
        LabelsData {
            load_more: escape_html(&self.helpers.t("load_more")),
            loading: escape_html(&self.helpers.t("loading")),
        }
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site_data());
        context.insert("labels", &self.labels_data());
        context
    }

    /// Render the listing; `page` is the number of pages it holds
    pub fn render_home(&self, listing: &PostListing, page: usize) -> Result<String> {
        let posts: Vec<PostCardData> = listing
            .entries()
            .iter()
            .map(|entry| {
                let post = &entry.summary;
                PostCardData {
                    title: escape_html(&post.title),
                    subtitle: escape_html(&post.subtitle),
                    author: escape_html(&post.author),
                    url: escape_html(&self.helpers.post_url(post.slug())),
                    published: entry.published.as_deref().map(escape_html),
                    datetime: post.first_publication_date.as_ref().map(date_xml),
                }
            })
            .collect();

        let load_more = listing
            .has_more()
            .then(|| self.helpers.url_for(&Route::Home { page: page + 1 }.path()));

        let mut context = self.base_context();
        context.insert("posts", &posts);
        context.insert("load_more", &load_more);
        self.renderer.render("home.html", &context)
    }

    /// Render a post page with its reading time
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let reading_time = post.reading_time(self.helpers.config().words_per_minute);

        let sections = post
            .content
            .iter()
            .enumerate()
            .map(|(i, section)| {
                let anchor = slug::slugify(&section.heading);
                SectionData {
                    heading: escape_html(&section.heading),
                    anchor: if anchor.is_empty() {
                        format!("section-{}", i + 1)
                    } else {
                        anchor
                    },
                    html: richtext::as_html(&section.body),
                }
            })
            .collect();

        let page = PostPageData {
            title: escape_html(&post.title),
            author: escape_html(&post.author),
            banner_url: escape_html(&post.banner_url),
            published: self
                .helpers
                .dates()
                .format_opt(post.first_publication_date.as_ref())
                .map(|d| escape_html(&d)),
            datetime: post.first_publication_date.as_ref().map(date_xml),
            reading_time: Some(escape_html(
                &self
                    .helpers
                    .i18n()
                    .get_count("reading_time", reading_time.minutes),
            )),
            sections,
        };

        let mut context = self.base_context();
        context.insert("post", &page);
        self.renderer.render("post.html", &context)
    }

    /// Placeholder shown while a page is generated
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.base_context();
        context.insert("refresh", &LOADING_REFRESH_SECS);
        self.renderer.render("loading.html", &context)
    }

    /// Error page for `status`
    pub fn render_error(&self, status: u16, message: &str) -> Result<String> {
        let mut context = self.base_context();
        context.insert("status", &status);
        context.insert("message", &escape_html(message));
        self.renderer.render("error.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.render_error(404, &self.helpers.t("not_found"))
    }

    fn write_page(&self, route: &Route, html: &str, manifest: &mut BuildManifest) -> Result<()> {
        let file = route.output_file();
        let output_path: PathBuf = self.site.public_dir.join(&file);

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);

        manifest.push(&format!("/{}", route.path()), &file);
        Ok(())
    }

    /// Generate the listing pages and the post pages of the first listing page
    pub async fn generate(&self) -> Result<BuildManifest> {
        let mut manifest = BuildManifest::new(Utc::now());

        // Ensure public directory exists
        fs::create_dir_all(&self.site.public_dir)?;
        fs::write(self.site.public_dir.join("style.css"), STYLESHEET)?;

        let mut listing = self.first_page().await?;

        // Listing pages, each one holding every post up to it
        let mut seen = HashSet::new();
        let mut page = 1;
        loop {
            let html = self.render_home(&listing, page)?;
            self.write_page(&Route::Home { page }, &html, &mut manifest)?;

            let Some(cursor) = listing.next_page().map(str::to_string) else {
                break;
            };
            if !seen.insert(cursor.clone()) {
                tracing::warn!("Content source repeated cursor {}, stopping", cursor);
                break;
            }
            listing.load_more(self.source()).await?;
            page += 1;
        }

        for slug in &self.static_paths().await? {
            let Some(route) = Route::post(slug) else {
                tracing::warn!("Skipping post with unusable slug {:?}", slug);
                continue;
            };
            match self.render_route(&route).await? {
                Some(html) => self.write_page(&route, &html, &mut manifest)?,
                None => tracing::warn!("Post {} disappeared while generating", slug),
            }
        }

        tracing::info!(
            "Generated {} listing pages and {} posts",
            page,
            manifest.pages.len() - page
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::prismic::memory::{post_document, MemorySource};
    use serde_json::json;

    fn site(base: &std::path::Path) -> Site {
        Site::with_config(base.to_path_buf(), SiteConfig::default())
    }

    fn generator(base: &std::path::Path, source: MemorySource) -> Generator {
        Generator::new(&site(base), Arc::new(source)).unwrap()
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Home { page: 1 }.path(), "");
        assert_eq!(Route::Home { page: 3 }.output_file(), "page/3/index.html");
        let post = Route::post("como-utilizar-hooks").unwrap();
        assert_eq!(post.output_file(), "post/como-utilizar-hooks/index.html");
        assert!(Route::post("..").is_none());
        assert!(Route::post("").is_none());
        assert!(Route::home(0).is_none());
    }

    #[test]
    fn test_listing_query() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path(), MemorySource::with_posts(0, 2));
        let query = generator.listing_query();
        assert_eq!(query.page_size, 2);
        assert_eq!(query.q(), r#"[[at(document.type, "posts")]]"#);
        assert_eq!(query.fetch.len(), 3);
    }

    #[tokio::test]
    async fn test_generate_writes_listing_and_first_page_posts() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path(), MemorySource::with_posts(5, 2));

        let manifest = generator.generate().await.unwrap();
        let public = dir.path().join("public");

        assert!(public.join("style.css").exists());
        assert!(public.join("index.html").exists());
        assert!(public.join("page/2/index.html").exists());
        assert!(public.join("page/3/index.html").exists());
        assert!(!public.join("page/4/index.html").exists());

        assert!(public.join("post/post-1/index.html").exists());
        assert!(public.join("post/post-2/index.html").exists());
        assert!(!public.join("post/post-3/index.html").exists());

        let routes: Vec<&str> = manifest.pages.iter().map(|p| p.route.as_str()).collect();
        assert_eq!(
            routes,
            vec!["/", "/page/2/", "/page/3/", "/post/post-1/", "/post/post-2/"]
        );

        let index = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains("Post 1"));
        assert!(index.contains("Post 2"));
        assert!(!index.contains("Post 3"));
        assert!(index.contains("25 mar 2021"));
        assert!(index.contains(r#"href="/page/2/""#));

        // The last page holds every post and no button
        let last = fs::read_to_string(public.join("page/3/index.html")).unwrap();
        assert!(last.contains("Post 1"));
        assert!(last.contains("Post 5"));
        assert!(!last.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_static_paths_are_first_page_slugs() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path(), MemorySource::with_posts(5, 2));
        assert_eq!(generator.static_paths().await.unwrap(), vec!["post-1", "post-2"]);
    }

    #[tokio::test]
    async fn test_single_page_has_no_load_more() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path(), MemorySource::with_posts(2, 2));

        let listing = generator.first_page().await.unwrap();
        assert!(!listing.has_more());
        let html = generator.render_home(&listing, 1).unwrap();
        assert!(!html.contains("load-more"));
    }

    #[tokio::test]
    async fn test_post_page() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path(), MemorySource::with_posts(1, 2));

        let html = generator
            .render_route(&Route::post("post-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(html.contains("<h1>Post 1</h1>"));
        assert!(html.contains("1 min"));
        assert!(html.contains(r#"<section id="introducao">"#));
        assert!(html.contains("<p>Lorem ipsum dolor sit amet</p>"));
        assert!(html.contains("https://images.prismic.io/banner.png"));
    }

    #[tokio::test]
    async fn test_missing_post_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path(), MemorySource::with_posts(1, 2));

        let page = generator
            .render_route(&Route::post("nope").unwrap())
            .await
            .unwrap();
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn test_listing_page_past_the_end() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path(), MemorySource::with_posts(3, 2));

        assert!(generator.render_route(&Route::Home { page: 2 }).await.unwrap().is_some());
        assert!(generator.render_route(&Route::Home { page: 3 }).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_text_is_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = post_document("xss", "<script>alert(1)</script>");
        doc.data["author"] = json!("Tom & Jerry");
        let generator = generator(dir.path(), MemorySource::new(vec![doc], 2));

        let listing = generator.first_page().await.unwrap();
        let html = generator.render_home(&listing, 1).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Tom &amp; Jerry"));
    }

    #[test]
    fn test_error_pages() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path(), MemorySource::with_posts(0, 2));

        let html = generator.render_not_found().unwrap();
        assert!(html.contains("404"));
        assert!(html.contains("Post não encontrado"));

        let loading = generator.render_loading().unwrap();
        assert!(loading.contains("Carregando..."));
    }
}
