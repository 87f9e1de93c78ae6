//! Page cache for incremental static regeneration
//!
//! Rendered pages are kept in memory together with the moment they were
//! generated. A page younger than the revalidation window is served as is;
//! an older one is still served while a single background task regenerates
//! it. The build manifest written by `generate` records which pages exist on
//! disk so a server can start from them.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache directory, relative to the site directory
pub const CACHE_DIR: &str = ".spacetraveling-cache";

/// Manifest file name inside the cache directory
const MANIFEST_FILE: &str = "build.json";

/// Default number of routes remembered as missing
pub const MISSING_LIMIT: usize = 1024;

/// A page written by a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Route path, e.g. `/post/slug/`
    pub route: String,
    /// Output file relative to the public dir
    pub file: String,
}

/// Record of the last static build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Version of the manifest format
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<ManifestEntry>,
}

impl BuildManifest {
    /// Current manifest format version
    const VERSION: u32 = 1;

    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            version: Self::VERSION,
            generated_at,
            pages: Vec::new(),
        }
    }

    pub fn push(&mut self, route: &str, file: &str) {
        self.pages.push(ManifestEntry {
            route: route.to_string(),
            file: file.to_string(),
        });
    }

    /// Load the manifest, `None` when missing, unreadable or outdated
    pub fn load(base_dir: &Path) -> Option<Self> {
        let path = base_dir.join(CACHE_DIR).join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<BuildManifest>(&content) {
            Ok(manifest) if manifest.version == Self::VERSION => Some(manifest),
            Ok(_) => {
                tracing::info!("Build manifest version mismatch, ignoring it");
                None
            }
            Err(e) => {
                tracing::warn!("Failed to parse build manifest {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save the manifest to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_dir.join(MANIFEST_FILE), content)?;
        Ok(())
    }

    /// Age of the build at `now`, zero if the clock went backwards
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.generated_at).to_std().unwrap_or_default()
    }
}

/// State of a cached route
#[derive(Debug, Clone)]
enum PageState {
    /// First generation in progress, nothing to serve yet
    Pending,
    /// `generated_at` is `None` when the age is unknown; such a page is stale
    Ready {
        html: String,
        generated_at: Option<Instant>,
    },
    /// The content source has no document for the route
    Missing { checked_at: Instant },
    /// The last generation failed and there is nothing to serve
    Failed,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    state: PageState,
    regenerating: bool,
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Never requested: generate it
    Absent,
    /// Being generated for the first time
    Pending,
    /// Within the revalidation window
    Fresh(String),
    /// Past the revalidation window: serve and regenerate
    Stale(String),
    /// Known to be missing; `stale` when it should be checked again
    Missing { stale: bool },
    /// Last generation failed
    Failed,
}

/// In-memory cache of rendered pages keyed by route path
#[derive(Debug)]
pub struct PageCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    revalidate: Duration,
    missing_limit: usize,
}

impl PageCache {
    pub fn new(revalidate: Duration) -> Self {
        Self::with_missing_limit(revalidate, MISSING_LIMIT)
    }

    /// A cache remembering at most `missing_limit` missing routes
    pub fn with_missing_limit(revalidate: Duration, missing_limit: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            revalidate,
            missing_limit: missing_limit.max(1),
        }
    }

    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    fn is_stale(&self, since: Instant, now: Instant) -> bool {
        now.saturating_duration_since(since) >= self.revalidate
    }

    /// Look up `route` as of `now`
    pub async fn lookup(&self, route: &str, now: Instant) -> Lookup {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(route) else {
            return Lookup::Absent;
        };

        match &entry.state {
            PageState::Pending => Lookup::Pending,
            PageState::Ready { html, generated_at } => {
                let stale = generated_at.map_or(true, |at| self.is_stale(at, now));
                if stale {
                    Lookup::Stale(html.clone())
                } else {
                    Lookup::Fresh(html.clone())
                }
            }
            PageState::Missing { checked_at } => Lookup::Missing {
                stale: self.is_stale(*checked_at, now),
            },
            PageState::Failed => Lookup::Failed,
        }
    }

    /// Claim the regeneration of `route`
    ///
    /// Returns `false` when another task already regenerates it. A route
    /// without an entry becomes pending.
    pub async fn begin(&self, route: &str) -> bool {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(route.to_string()).or_insert(CacheEntry {
            state: PageState::Pending,
            regenerating: false,
        });

        if entry.regenerating {
            return false;
        }
        if matches!(entry.state, PageState::Failed) {
            entry.state = PageState::Pending;
        }
        entry.regenerating = true;
        true
    }

    /// Store a freshly rendered page
    pub async fn insert_ready(&self, route: &str, html: String, generated_at: Instant) {
        self.insert_page(route, html, Some(generated_at)).await;
    }

    async fn insert_page(&self, route: &str, html: String, generated_at: Option<Instant>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            route.to_string(),
            CacheEntry {
                state: PageState::Ready { html, generated_at },
                regenerating: false,
            },
        );
    }

    /// Record that the content source has nothing for `route`
    ///
    /// Missing routes past the revalidation window are dropped, and the
    /// oldest ones are evicted once `missing_limit` is reached.
    pub async fn insert_missing(&self, route: &str, checked_at: Instant) {
        let mut entries = self.entries.write().await;

        entries.retain(|key, entry| match entry.state {
            PageState::Missing { checked_at: at } if key != route && !entry.regenerating => {
                !self.is_stale(at, checked_at)
            }
            _ => true,
        });

        let mut missing: Vec<(String, Instant)> = entries
            .iter()
            .filter_map(|(key, entry)| match entry.state {
                PageState::Missing { checked_at: at } if key != route && !entry.regenerating => {
                    Some((key.clone(), at))
                }
                _ => None,
            })
            .collect();
        if missing.len() >= self.missing_limit {
            missing.sort_by_key(|(_, at)| *at);
            let excess = missing.len() + 1 - self.missing_limit;
            for (key, _) in missing.into_iter().take(excess) {
                tracing::debug!("Forgetting missing route {}", key);
                entries.remove(&key);
            }
        }

        entries.insert(
            route.to_string(),
            CacheEntry {
                state: PageState::Missing { checked_at },
                regenerating: false,
            },
        );
    }

    /// Record a failed regeneration; a previously rendered page is kept
    pub async fn fail(&self, route: &str) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(route) {
            entry.regenerating = false;
            if matches!(entry.state, PageState::Pending) {
                entry.state = PageState::Failed;
            }
        }
    }

    /// Number of cached routes
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Load the pages of a previous build, aged by the manifest timestamp
    pub async fn seed_from_manifest(
        &self,
        manifest: &BuildManifest,
        public_dir: &Path,
    ) -> Result<usize> {
        let age = manifest.age(Utc::now());
        // Older than the monotonic clock: the age is unknown, serve as stale
        let generated_at = Instant::now().checked_sub(age);

        let mut seeded = 0;
        for page in &manifest.pages {
            match fs::read_to_string(public_dir.join(&page.file)) {
                Ok(html) => {
                    self.insert_page(&page.route, html, generated_at).await;
                    seeded += 1;
                }
                Err(e) => tracing::warn!("Skipping {} from manifest: {}", page.file, e),
            }
        }

        Ok(seeded)
    }
}
