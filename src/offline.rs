//! Offline asset cache
//!
//! The shell-cache lifecycle behind the site's offline resilience:
//! install pre-populates a version-named cache, activate drops every cache
//! from older versions, and fetch handling is network-first with cache
//! fallback for same-origin GET requests. The cache is an opportunistic
//! mirror; staleness is tolerated and correctness never depends on it.

use std::collections::HashMap;

use async_trait::async_trait;
use lazy_static::lazy_static;
use tracing::{debug, warn};

use crate::error::{SiteError, SiteResult};

/// Prefix shared by all shell cache generations
pub const CACHE_PREFIX: &str = "realtrust-shell";

/// Paths under these mounts go straight to the network, always
const API_MOUNTS: [&str; 2] = ["/functions", "/api"];

lazy_static! {
    /// Large streaming media is never cached or intercepted
    static ref MEDIA_EXTENSIONS: Vec<&'static str> = vec![
        "mp4", "webm", "mov", "avi", "mkv", "mp3", "m4a", "wav", "flac",
    ];
}

/// Minimal view of an intercepted request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    /// True for page navigations (document requests)
    pub navigation: bool,
}

impl FetchRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            navigation: false,
        }
    }

    pub fn navigation(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            navigation: true,
        }
    }
}

/// A response as stored in (or served from) the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn ok(content_type: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_string(),
            body: body.to_vec(),
        }
    }

    /// Synthetic response for eligible requests that miss both network and
    /// cache
    pub fn service_unavailable() -> Self {
        Self {
            status: 503,
            content_type: "text/plain".to_string(),
            body: b"offline".to_vec(),
        }
    }
}

/// Abstract network access, so the cache logic is testable and the
/// production impl stays a thin reqwest wrapper. No retries anywhere.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> SiteResult<CachedResponse>;
}

/// Production fetcher over reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> SiteResult<CachedResponse> {
        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response.bytes().await?.to_vec();

        Ok(CachedResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Where a served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
    ShellRoot,
    Synthetic,
}

/// Outcome of an intercepted fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Request is not ours to handle; let it through untouched
    PassThrough,
    Served {
        response: CachedResponse,
        source: ServedFrom,
    },
}

/// Versioned shell cache with the install/activate/fetch lifecycle
pub struct OfflineCache {
    origin: String,
    version: String,
    waiting_version: Option<String>,
    shell_assets: Vec<String>,
    /// name -> (url -> response)
    caches: HashMap<String, HashMap<String, CachedResponse>>,
    controlling: bool,
}

impl OfflineCache {
    pub fn new(origin: &str, version: &str, shell_assets: Vec<String>) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            version: version.to_string(),
            waiting_version: None,
            shell_assets,
            caches: HashMap::new(),
            controlling: false,
        }
    }

    fn cache_name(&self) -> String {
        format!("{}-{}", CACHE_PREFIX, self.version)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Names of all caches currently held (old generations included)
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether activation has claimed the open pages
    pub fn is_controlling(&self) -> bool {
        self.controlling
    }

    /// Install phase: pre-populate the versioned cache with the shell
    /// assets. Any failed shell fetch fails the install.
    pub async fn install(&mut self, fetcher: &dyn Fetcher) -> SiteResult<()> {
        let name = self.cache_name();
        let mut entries = HashMap::new();

        for asset in &self.shell_assets {
            let url = format!("{}{}", self.origin, asset);
            let response = fetcher.fetch(&url).await?;
            if response.status != 200 {
                return Err(SiteError::Cache(format!(
                    "shell asset {} returned {}",
                    asset, response.status
                )));
            }
            entries.insert(url, response);
        }

        debug!("📦 Installed {} shell assets into {}", entries.len(), name);
        self.caches.insert(name, entries);
        Ok(())
    }

    /// Activate phase: drop every cache from another version, then take
    /// control of open pages immediately.
    pub fn activate(&mut self) {
        let current = self.cache_name();
        self.caches.retain(|name, _| *name == current);
        self.controlling = true;
        debug!("✅ Activated cache {}", current);
    }

    /// Stage an update that would normally wait for all pages to close
    pub fn stage_update(&mut self, version: &str) {
        self.waiting_version = Some(version.to_string());
    }

    /// Message-based control: promote a staged update right now instead of
    /// waiting for navigation
    pub fn skip_waiting(&mut self) {
        if let Some(version) = self.waiting_version.take() {
            debug!("⏩ Skip waiting: {} -> {}", self.version, version);
            self.version = version;
            self.activate();
        }
    }

    /// Whether this request is ours to intercept: same-origin GET, not an
    /// API call, not streaming media
    pub fn eligible(&self, request: &FetchRequest) -> bool {
        if request.method != "GET" {
            return false;
        }
        let Some(path) = self.origin_path(&request.url) else {
            return false;
        };
        if API_MOUNTS.iter().any(|mount| path.starts_with(mount)) {
            return false;
        }
        if let Some(ext) = extension_of(&path) {
            if MEDIA_EXTENSIONS.contains(&ext.as_str()) {
                return false;
            }
        }
        true
    }

    /// Network-first with cache fallback
    pub async fn handle_fetch(
        &mut self,
        request: &FetchRequest,
        fetcher: &dyn Fetcher,
    ) -> FetchOutcome {
        if !self.eligible(request) {
            return FetchOutcome::PassThrough;
        }

        match fetcher.fetch(&request.url).await {
            Ok(response) => {
                if response.status == 200 {
                    // Opportunistic mirror; a concurrent write for the same
                    // URL just wins by being last
                    self.store(&request.url, response.clone());
                }
                FetchOutcome::Served {
                    response,
                    source: ServedFrom::Network,
                }
            }
            Err(e) => {
                warn!("🌐 Network fetch failed for {}: {}", request.url, e);
                self.fallback(request)
            }
        }
    }

    fn fallback(&self, request: &FetchRequest) -> FetchOutcome {
        if let Some(response) = self.lookup(&request.url) {
            return FetchOutcome::Served {
                response: response.clone(),
                source: ServedFrom::Cache,
            };
        }

        if request.navigation {
            let root = format!("{}/", self.origin);
            if let Some(response) = self.lookup(&root) {
                return FetchOutcome::Served {
                    response: response.clone(),
                    source: ServedFrom::ShellRoot,
                };
            }
        }

        FetchOutcome::Served {
            response: CachedResponse::service_unavailable(),
            source: ServedFrom::Synthetic,
        }
    }

    fn store(&mut self, url: &str, response: CachedResponse) {
        self.caches
            .entry(self.cache_name())
            .or_default()
            .insert(url.to_string(), response);
    }

    fn lookup(&self, url: &str) -> Option<&CachedResponse> {
        self.caches.get(&self.cache_name())?.get(url)
    }

    /// Path component of a same-origin URL, or None for remote origins
    fn origin_path(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.origin)?;
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.split(['?', '#']).next().unwrap_or(rest).to_string())
        } else {
            // e.g. origin "https://a.example" vs "https://a.example.evil"
            None
        }
    }
}

fn extension_of(path: &str) -> Option<String> {
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://realtrust.example";

    /// Scripted fetcher: known URLs answer, everything else is a network
    /// error. `offline` flips the whole network off.
    struct StubFetcher {
        responses: HashMap<String, CachedResponse>,
        offline: bool,
    }

    impl StubFetcher {
        fn new() -> Self {
            let mut responses = HashMap::new();
            responses.insert(
                format!("{ORIGIN}/"),
                CachedResponse::ok("text/html", b"<html>shell</html>"),
            );
            responses.insert(
                format!("{ORIGIN}/assets/app.js"),
                CachedResponse::ok("text/javascript", b"app"),
            );
            Self {
                responses,
                offline: false,
            }
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> SiteResult<CachedResponse> {
            if self.offline {
                return Err(SiteError::Cache("network down".to_string()));
            }
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| SiteError::Cache(format!("no route for {url}")))
        }
    }

    fn shell() -> Vec<String> {
        vec!["/".to_string(), "/assets/app.js".to_string()]
    }

    #[tokio::test]
    async fn test_install_populates_versioned_cache() {
        let mut cache = OfflineCache::new(ORIGIN, "v1", shell());
        cache.install(&StubFetcher::new()).await.expect("install");
        assert_eq!(cache.cache_names(), vec!["realtrust-shell-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_install_fails_on_missing_shell_asset() {
        let mut cache = OfflineCache::new(
            ORIGIN,
            "v1",
            vec!["/".to_string(), "/missing.css".to_string()],
        );
        assert!(cache.install(&StubFetcher::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_activate_drops_stale_generations_and_claims() {
        let fetcher = StubFetcher::new();
        let mut cache = OfflineCache::new(ORIGIN, "v1", shell());
        cache.install(&fetcher).await.expect("install v1");
        assert!(!cache.is_controlling());

        // New version installs alongside, then activation sweeps v1
        cache.version = "v2".to_string();
        cache.install(&fetcher).await.expect("install v2");
        assert_eq!(cache.cache_names().len(), 2);

        cache.activate();
        assert_eq!(cache.cache_names(), vec!["realtrust-shell-v2".to_string()]);
        assert!(cache.is_controlling());
    }

    #[tokio::test]
    async fn test_skip_waiting_promotes_staged_update() {
        let fetcher = StubFetcher::new();
        let mut cache = OfflineCache::new(ORIGIN, "v1", shell());
        cache.install(&fetcher).await.expect("install");
        cache.activate();

        cache.stage_update("v2");
        assert_eq!(cache.version(), "v1");
        cache.skip_waiting();
        assert_eq!(cache.version(), "v2");
        // v1 cache swept by the activation skip_waiting triggered
        assert!(cache.cache_names().is_empty());
    }

    #[test]
    fn test_eligibility_rules() {
        let cache = OfflineCache::new(ORIGIN, "v1", shell());

        assert!(cache.eligible(&FetchRequest::get(&format!("{ORIGIN}/apartments"))));
        assert!(cache.eligible(&FetchRequest::get(&format!("{ORIGIN}/assets/app.js?v=3"))));

        // Remote origin
        assert!(!cache.eligible(&FetchRequest::get("https://cdn.example/lib.js")));
        // Prefix-confusable origin
        assert!(!cache.eligible(&FetchRequest::get("https://realtrust.example.evil/x")));
        // Non-GET
        let mut post = FetchRequest::get(&format!("{ORIGIN}/apartments"));
        post.method = "POST".to_string();
        assert!(!cache.eligible(&post));
        // API mounts
        assert!(!cache.eligible(&FetchRequest::get(&format!("{ORIGIN}/functions/reviews"))));
        assert!(!cache.eligible(&FetchRequest::get(&format!("{ORIGIN}/api/leads"))));
        // Streaming media
        assert!(!cache.eligible(&FetchRequest::get(&format!("{ORIGIN}/video/tour.mp4"))));
    }

    #[tokio::test]
    async fn test_network_first_then_cache_fallback() {
        let mut fetcher = StubFetcher::new();
        let mut cache = OfflineCache::new(ORIGIN, "v1", shell());
        let url = format!("{ORIGIN}/assets/app.js");

        // Online: served from network and mirrored
        let outcome = cache.handle_fetch(&FetchRequest::get(&url), &fetcher).await;
        assert!(matches!(
            outcome,
            FetchOutcome::Served {
                source: ServedFrom::Network,
                ..
            }
        ));

        // Offline: the mirrored copy answers
        fetcher.offline = true;
        let outcome = cache.handle_fetch(&FetchRequest::get(&url), &fetcher).await;
        match outcome {
            FetchOutcome::Served { response, source } => {
                assert_eq!(source, ServedFrom::Cache);
                assert_eq!(response.body, b"app");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_offline_navigation_falls_back_to_shell_root() {
        let mut fetcher = StubFetcher::new();
        let mut cache = OfflineCache::new(ORIGIN, "v1", shell());
        cache.install(&fetcher).await.expect("install");
        fetcher.offline = true;

        let outcome = cache
            .handle_fetch(
                &FetchRequest::navigation(&format!("{ORIGIN}/apartments/12")),
                &fetcher,
            )
            .await;
        match outcome {
            FetchOutcome::Served { response, source } => {
                assert_eq!(source, ServedFrom::ShellRoot);
                assert_eq!(response.body, b"<html>shell</html>");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_offline_miss_is_synthetic_503() {
        let mut fetcher = StubFetcher::new();
        fetcher.offline = true;
        let mut cache = OfflineCache::new(ORIGIN, "v1", shell());

        let outcome = cache
            .handle_fetch(&FetchRequest::get(&format!("{ORIGIN}/uncached.css")), &fetcher)
            .await;
        match outcome {
            FetchOutcome::Served { response, source } => {
                assert_eq!(source, ServedFrom::Synthetic);
                assert_eq!(response.status, 503);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_200_served_but_not_cached() {
        let mut fetcher = StubFetcher::new();
        let url = format!("{ORIGIN}/gone");
        fetcher.responses.insert(
            url.clone(),
            CachedResponse {
                status: 404,
                content_type: "text/plain".to_string(),
                body: b"gone".to_vec(),
            },
        );

        let mut cache = OfflineCache::new(ORIGIN, "v1", shell());
        let outcome = cache.handle_fetch(&FetchRequest::get(&url), &fetcher).await;
        assert!(matches!(
            outcome,
            FetchOutcome::Served {
                source: ServedFrom::Network,
                ..
            }
        ));

        // The 404 was not mirrored
        fetcher.offline = true;
        let outcome = cache.handle_fetch(&FetchRequest::get(&url), &fetcher).await;
        assert!(matches!(
            outcome,
            FetchOutcome::Served {
                source: ServedFrom::Synthetic,
                ..
            }
        ));
    }
}
