//! Server with incremental static regeneration
//!
//! Pages are served from the page cache. A page past the revalidation
//! window is served as is while one background task renders it again. A
//! post that was never rendered gets a loading placeholder until its first
//! render finishes.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::{BuildManifest, Lookup, PageCache};
use crate::generator::{Generator, Route};
use crate::Site;

/// Server state
pub struct ServerState {
    generator: Generator,
    cache: PageCache,
    public_dir: PathBuf,
}

impl ServerState {
    pub fn new(generator: Generator, cache: PageCache, public_dir: PathBuf) -> Self {
        Self {
            generator,
            cache,
            public_dir,
        }
    }
}

/// Build the router for `state`
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/page/:page", get(page_handler))
        .route("/page/:page/", get(page_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16, open: bool) -> Result<()> {
    let source = site.content_source()?;
    let generator = Generator::new(site, source)?;

    let manifest = match BuildManifest::load(&site.base_dir) {
        Some(manifest) => manifest,
        None => {
            tracing::info!("No previous build found, generating...");
            let manifest = generator.generate().await?;
            manifest.save(&site.base_dir)?;
            manifest
        }
    };

    let state = Arc::new(ServerState::new(
        generator,
        PageCache::new(Duration::from_secs(site.config.revalidate)),
        site.public_dir.clone(),
    ));
    let seeded = state
        .cache
        .seed_from_manifest(&manifest, &site.public_dir)
        .await?;
    tracing::info!("Loaded {} pre-rendered pages", seeded);

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!(
        "Pages are regenerated after {}s. Press Ctrl+C to stop.",
        site.config.revalidate
    );

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn home_handler(State(state): State<Arc<ServerState>>) -> Response {
    serve_route(state, Route::Home { page: 1 }).await
}

async fn page_handler(
    State(state): State<Arc<ServerState>>,
    Path(page): Path<String>,
) -> Response {
    match page.parse().ok().and_then(Route::home) {
        Some(route) => serve_route(state, route).await,
        None => not_found(&state),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    match Route::post(&slug) {
        Some(route) => serve_route(state, route).await,
        None => not_found(&state),
    }
}

/// Serve static files such as the stylesheet
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(&state),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

async fn serve_route(state: Arc<ServerState>, route: Route) -> Response {
    let key = format!("/{}", route.path());

    match state.cache.lookup(&key, Instant::now()).await {
        Lookup::Fresh(html) => page(&state, html),
        Lookup::Stale(html) => {
            spawn_regeneration(&state, &route, &key).await;
            page(&state, html)
        }
        Lookup::Absent if matches!(route, Route::Home { .. }) => {
            // Listing pages are rendered while the request waits
            if state.cache.begin(&key).await {
                regenerate(&state, &route, &key).await;
            }
            match state.cache.lookup(&key, Instant::now()).await {
                Lookup::Fresh(html) | Lookup::Stale(html) => page(&state, html),
                Lookup::Missing { .. } => not_found(&state),
                Lookup::Failed => server_error(&state),
                Lookup::Absent | Lookup::Pending => loading(&state),
            }
        }
        Lookup::Absent | Lookup::Pending => {
            spawn_regeneration(&state, &route, &key).await;
            loading(&state)
        }
        Lookup::Missing { stale } => {
            if stale {
                spawn_regeneration(&state, &route, &key).await;
            }
            not_found(&state)
        }
        Lookup::Failed => {
            spawn_regeneration(&state, &route, &key).await;
            server_error(&state)
        }
    }
}

/// Start a background render of `route` unless one is already running
async fn spawn_regeneration(state: &Arc<ServerState>, route: &Route, key: &str) {
    if !state.cache.begin(key).await {
        return;
    }

    let state = state.clone();
    let route = route.clone();
    let key = key.to_string();
    tokio::spawn(async move {
        regenerate(&state, &route, &key).await;
    });
}

async fn regenerate(state: &ServerState, route: &Route, key: &str) {
    tracing::debug!("Regenerating {}", key);
    let started = Instant::now();

    match state.generator.render_route(route).await {
        Ok(Some(html)) => {
            state.cache.insert_ready(key, html, Instant::now()).await;
            tracing::info!("Regenerated {} in {:?}", key, started.elapsed());
        }
        Ok(None) => {
            state.cache.insert_missing(key, Instant::now()).await;
            tracing::info!("No content for {}", key);
            tracing::debug!("{} routes cached", state.cache.len().await);
        }
        Err(e) => {
            state.cache.fail(key).await;
            tracing::error!("Failed to regenerate {}: {:#}", key, e);
        }
    }
}

fn page(state: &ServerState, html: String) -> Response {
    let cache_control = format!(
        "s-maxage={}, stale-while-revalidate",
        state.cache.revalidate().as_secs()
    );
    with_cache_control(StatusCode::OK, html, &cache_control)
}

fn loading(state: &ServerState) -> Response {
    match state.generator.render_loading() {
        Ok(html) => with_cache_control(StatusCode::OK, html, "no-store"),
        Err(e) => render_failure(e),
    }
}

fn not_found(state: &ServerState) -> Response {
    match state.generator.render_not_found() {
        Ok(html) => with_cache_control(StatusCode::NOT_FOUND, html, "no-store"),
        Err(e) => render_failure(e),
    }
}

fn server_error(state: &ServerState) -> Response {
    match state.generator.render_error(500, "Internal server error") {
        Ok(html) => with_cache_control(StatusCode::INTERNAL_SERVER_ERROR, html, "no-store"),
        Err(e) => render_failure(e),
    }
}

fn with_cache_control(status: StatusCode, html: String, cache_control: &str) -> Response {
    let mut response = (status, Html(html)).into_response();
    if let Ok(value) = HeaderValue::from_str(cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}

fn render_failure(e: anyhow::Error) -> Response {
    tracing::error!("Failed to render page: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::prismic::memory::MemorySource;
    use crate::prismic::ContentSource;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    fn state(source: Arc<MemorySource>, revalidate: Duration) -> Arc<ServerState> {
        state_with_cache(source, PageCache::new(revalidate))
    }

    fn state_with_cache(source: Arc<MemorySource>, cache: PageCache) -> Arc<ServerState> {
        let dir = std::env::temp_dir().join("spacetraveling-server-tests");
        let site = Site::with_config(dir, SiteConfig::default());
        let source: Arc<dyn ContentSource> = source;
        let generator = Generator::new(&site, source).unwrap();
        Arc::new(ServerState::new(generator, cache, site.public_dir))
    }

    async fn get(state: &Arc<ServerState>, uri: &str) -> (StatusCode, String) {
        let response = router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Request `uri` until the response is no longer the loading placeholder
    async fn settle(state: &Arc<ServerState>, uri: &str) -> (StatusCode, String) {
        for _ in 0..100 {
            let (status, body) = get(state, uri).await;
            if !body.contains("Carregando...") {
                return (status, body);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never finished generating", uri);
    }

    #[tokio::test]
    async fn test_unknown_slug_shows_loading_then_content() {
        let source = Arc::new(MemorySource::with_posts(5, 2));
        let state = state(source, Duration::from_secs(1800));

        let (status, body) = get(&state, "/post/post-4/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregando..."));
        assert!(body.contains(r#"http-equiv="refresh""#));

        let (status, body) = settle(&state, "/post/post-4/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Post 4</h1>"));
        assert!(body.contains("1 min"));
    }

    #[tokio::test]
    async fn test_nonexistent_slug_is_not_found() {
        let source = Arc::new(MemorySource::with_posts(1, 2));
        let state = state(source, Duration::from_secs(1800));

        let (status, body) = settle(&state, "/post/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Post não encontrado"));
    }

    #[tokio::test]
    async fn test_unknown_slugs_do_not_grow_the_cache() {
        let source = Arc::new(MemorySource::with_posts(1, 2));
        let state = state_with_cache(
            source,
            PageCache::with_missing_limit(Duration::from_secs(1800), 16),
        );

        for i in 0..500 {
            let (status, _) = get(&state, &format!("/post/junk-{}/", i)).await;
            assert_eq!(status, StatusCode::OK);
            // Let the background lookup finish
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(state.cache.len().await <= 16);
        let (status, _) = get(&state, "/post/junk-499/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_home_without_next_page() {
        let source = Arc::new(MemorySource::with_posts(2, 2));
        let state = state(source, Duration::from_secs(1800));

        let (status, body) = get(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Post 1"));
        assert!(body.contains("Post 2"));
        assert!(!body.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_listing_pages() {
        let source = Arc::new(MemorySource::with_posts(3, 2));
        let state = state(source, Duration::from_secs(1800));

        let (_, body) = get(&state, "/").await;
        assert!(body.contains(r#"href="/page/2/""#));
        assert!(!body.contains("Post 3"));

        let (status, body) = get(&state, "/page/2/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Post 1"));
        assert!(body.contains("Post 3"));

        let (status, _) = get(&state, "/page/3/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(&state, "/page/zero/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stale_page_is_served_and_regenerated() {
        let source = Arc::new(MemorySource::with_posts(1, 2));
        let state = state(source.clone(), Duration::ZERO);

        let (_, body) = settle(&state, "/post/post-1/").await;
        assert!(body.contains("<h1>Post 1</h1>"));
        let lookups = source.lookups.load(Ordering::SeqCst);

        // Always stale: served from cache while a new render runs
        let (status, body) = get(&state, "/post/post-1/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Post 1</h1>"));

        for _ in 0..100 {
            if source.lookups.load(Ordering::SeqCst) > lookups {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("stale page was not regenerated");
    }

    #[tokio::test]
    async fn test_fresh_page_is_not_refetched() {
        let source = Arc::new(MemorySource::with_posts(1, 2));
        let state = state(source.clone(), Duration::from_secs(1800));

        settle(&state, "/post/post-1/").await;
        let lookups = source.lookups.load(Ordering::SeqCst);

        get(&state, "/post/post-1/").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(source.lookups.load(Ordering::SeqCst), lookups);
    }
}
