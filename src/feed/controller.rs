use std::sync::Arc;

use super::cache::CategoryCache;
use super::{FeedMode, FeedSettings, FeedStatus, BOOKMARK_CATEGORY};
use crate::clock::Clock;
use crate::gateway::{ContentGateway, ErrorKind, GatewayError};
use crate::model::Article;

/// What a [`PendingRequest`] will ask the gateway for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Category(String),
    Search(String),
}

/// A request issued by the controller but not yet applied.
///
/// The token is compared against the controller's latest token for the same
/// mode when the result comes back; anything older is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    kind: RequestKind,
    token: u64,
}

impl PendingRequest {
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// Run the request against a gateway. Does not touch controller state.
    pub async fn execute(&self, gateway: &dyn ContentGateway) -> Result<Vec<Article>, GatewayError> {
        match &self.kind {
            RequestKind::Category(name) => gateway.fetch_category(name).await,
            RequestKind::Search(query) => gateway.search(query).await,
        }
    }
}

/// First half of a category selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryStep {
    /// Served from a fresh cache entry; nothing to fetch.
    Cached,
    /// A network fetch is needed.
    Fetch(PendingRequest),
    /// The bookmark pseudo-category was chosen. The caller shows the bookmark
    /// overlay. When a search had to be cleared first, the last browsed
    /// category may need refetching behind the overlay.
    Bookmarks(Option<PendingRequest>),
}

/// How a completed request changed the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Articles replaced; carries the count.
    Loaded(usize),
    /// The request succeeded with zero articles.
    Empty,
    Failed(ErrorKind),
    /// A newer request for the same mode was issued, or the mode changed.
    Superseded,
}

/// Result of the async [`FeedController::select_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOutcome {
    Cached,
    Fetched(FetchOutcome),
    /// Show the bookmark overlay.
    Bookmarks,
}

/// Owns what the feed currently shows and decides when to hit the network.
pub struct FeedController {
    gateway: Arc<dyn ContentGateway>,
    clock: Arc<dyn Clock>,
    settings: FeedSettings,
    mode: FeedMode,
    /// Category to return to when a search is dropped for the bookmark view.
    last_category: String,
    articles: Arc<Vec<Article>>,
    headline: String,
    status: FeedStatus,
    cache: CategoryCache,
    category_token: u64,
    search_token: u64,
}

impl std::fmt::Debug for FeedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedController")
            .field("mode", &self.mode)
            .field("status", &self.status)
            .field("articles", &self.articles.len())
            .field("cached_categories", &self.cache.len())
            .finish()
    }
}

impl FeedController {
    pub fn new(
        gateway: Arc<dyn ContentGateway>,
        clock: Arc<dyn Clock>,
        settings: FeedSettings,
    ) -> Self {
        let default_category = normalize_category(&settings.default_category);
        Self {
            gateway,
            clock,
            cache: CategoryCache::new(settings.ttl),
            mode: FeedMode::Category(default_category.clone()),
            last_category: default_category,
            settings,
            articles: Arc::new(Vec::new()),
            headline: String::new(),
            status: FeedStatus::Idle,
            category_token: 0,
            search_token: 0,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn mode(&self) -> &FeedMode {
        &self.mode
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Cheap shared snapshot of the current list.
    pub fn articles_snapshot(&self) -> Arc<Vec<Article>> {
        Arc::clone(&self.articles)
    }

    pub fn cache(&self) -> &CategoryCache {
        &self.cache
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Split API: begin a transition, run the request elsewhere, complete it
    // ------------------------------------------------------------------

    /// Switch to a category, or route the bookmark pseudo-category.
    pub fn begin_category(&mut self, name: &str) -> CategoryStep {
        let mut name = normalize_category(name);
        if name.is_empty() {
            name = normalize_category(&self.settings.default_category);
        }

        let left_search = self.drop_search();

        if name == BOOKMARK_CATEGORY {
            if !left_search {
                return CategoryStep::Bookmarks(None);
            }
            let last = self.last_category.clone();
            tracing::debug!(category = %last, "Search cleared for bookmark view, restoring category");
            return match self.enter_category(last, false) {
                CategoryStep::Fetch(pending) => CategoryStep::Bookmarks(Some(pending)),
                _ => CategoryStep::Bookmarks(None),
            };
        }

        self.enter_category(name, false)
    }

    /// Start a free-text search. `None` when the query is blank.
    pub fn begin_search(&mut self, query: &str) -> Option<PendingRequest> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.search_token = self.search_token.wrapping_add(1);
        self.mode = FeedMode::Search(query.to_string());
        self.status = FeedStatus::Loading;
        tracing::debug!(query = %query, token = self.search_token, "Search issued");
        Some(PendingRequest {
            kind: RequestKind::Search(query.to_string()),
            token: self.search_token,
        })
    }

    /// Leave search and reload the default category, bypassing the cache.
    pub fn begin_clear_search(&mut self) -> PendingRequest {
        self.drop_search();
        let name = normalize_category(&self.settings.default_category);
        self.mode = FeedMode::Category(name.clone());
        self.last_category = name.clone();
        self.issue_category(name)
    }

    /// Re-issue the request for the current mode, bypassing the cache.
    pub fn begin_retry(&mut self) -> PendingRequest {
        match self.mode.clone() {
            FeedMode::Category(name) => {
                tracing::info!(category = %name, "Retrying category fetch");
                self.issue_category(name)
            }
            FeedMode::Search(query) => {
                tracing::info!(query = %query, "Retrying search");
                self.search_token = self.search_token.wrapping_add(1);
                self.status = FeedStatus::Loading;
                PendingRequest {
                    kind: RequestKind::Search(query),
                    token: self.search_token,
                }
            }
        }
    }

    /// Apply a finished request if it is still the latest for its mode.
    pub fn complete(
        &mut self,
        pending: PendingRequest,
        result: Result<Vec<Article>, GatewayError>,
    ) -> FetchOutcome {
        if !self.is_current(&pending) {
            tracing::debug!(
                request = ?pending.kind,
                got = pending.token,
                category_token = self.category_token,
                search_token = self.search_token,
                "Ignoring stale feed result"
            );
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(articles) => {
                let count = articles.len();
                let articles = Arc::new(articles);
                self.headline = match &pending.kind {
                    RequestKind::Category(name) => {
                        let now_ms = self.clock.now_ms();
                        self.cache.insert(name, Arc::clone(&articles), now_ms);
                        category_headline(name, &articles)
                    }
                    RequestKind::Search(query) => articles
                        .first()
                        .map(|a| a.title.clone())
                        .unwrap_or_else(|| format!("no results for {query}")),
                };
                self.articles = articles;
                self.status = FeedStatus::Loaded;
                tracing::debug!(request = ?pending.kind, count, "Feed updated");

                if count == 0 {
                    FetchOutcome::Empty
                } else {
                    FetchOutcome::Loaded(count)
                }
            }
            Err(err) => {
                let kind = err.kind();
                tracing::warn!(request = ?pending.kind, error = %err, "Feed request failed");
                self.articles = Arc::new(Vec::new());
                self.headline.clear();
                self.status = FeedStatus::Failed(kind);
                FetchOutcome::Failed(kind)
            }
        }
    }

    // ------------------------------------------------------------------
    // Async convenience: begin, run, complete
    // ------------------------------------------------------------------

    pub async fn select_category(&mut self, name: &str) -> CategoryOutcome {
        match self.begin_category(name) {
            CategoryStep::Cached => CategoryOutcome::Cached,
            CategoryStep::Fetch(pending) => CategoryOutcome::Fetched(self.run(pending).await),
            CategoryStep::Bookmarks(restore) => {
                if let Some(pending) = restore {
                    self.run(pending).await;
                }
                CategoryOutcome::Bookmarks
            }
        }
    }

    /// `None` when the query was blank and nothing happened.
    pub async fn search(&mut self, query: &str) -> Option<FetchOutcome> {
        let pending = self.begin_search(query)?;
        Some(self.run(pending).await)
    }

    pub async fn clear_search(&mut self) -> FetchOutcome {
        let pending = self.begin_clear_search();
        self.run(pending).await
    }

    pub async fn retry(&mut self) -> FetchOutcome {
        let pending = self.begin_retry();
        self.run(pending).await
    }

    async fn run(&mut self, pending: PendingRequest) -> FetchOutcome {
        let gateway = Arc::clone(&self.gateway);
        let result = pending.execute(gateway.as_ref()).await;
        self.complete(pending, result)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Discard an active search. Returns whether there was one.
    fn drop_search(&mut self) -> bool {
        if !matches!(self.mode, FeedMode::Search(_)) {
            return false;
        }
        // Invalidate any search still in flight.
        self.search_token = self.search_token.wrapping_add(1);
        self.articles = Arc::new(Vec::new());
        self.headline.clear();
        self.mode = FeedMode::Category(self.last_category.clone());
        true
    }

    fn enter_category(&mut self, name: String, force: bool) -> CategoryStep {
        self.mode = FeedMode::Category(name.clone());
        self.last_category = name.clone();

        if !force {
            let now_ms = self.clock.now_ms();
            if let Some(entry) = self.cache.fresh(&name, now_ms) {
                tracing::debug!(
                    category = %name,
                    age_ms = entry.age_ms(now_ms),
                    "Serving category from cache"
                );
                self.articles = Arc::clone(&entry.articles);
                self.headline = category_headline(&name, &self.articles);
                self.status = FeedStatus::Loaded;
                // A fetch still in flight for another category must not land here.
                self.category_token = self.category_token.wrapping_add(1);
                return CategoryStep::Cached;
            }
        }

        CategoryStep::Fetch(self.issue_category(name))
    }

    fn issue_category(&mut self, name: String) -> PendingRequest {
        self.category_token = self.category_token.wrapping_add(1);
        self.status = FeedStatus::Loading;
        tracing::debug!(category = %name, token = self.category_token, "Category fetch issued");
        PendingRequest {
            kind: RequestKind::Category(name),
            token: self.category_token,
        }
    }

    fn is_current(&self, pending: &PendingRequest) -> bool {
        match (&pending.kind, &self.mode) {
            (RequestKind::Category(requested), FeedMode::Category(current)) => {
                requested == current && pending.token == self.category_token
            }
            (RequestKind::Search(requested), FeedMode::Search(current)) => {
                requested == current && pending.token == self.search_token
            }
            _ => false,
        }
    }
}

pub(crate) fn normalize_category(name: &str) -> String {
    name.trim().to_lowercase()
}

fn category_headline(name: &str, articles: &[Article]) -> String {
    articles
        .first()
        .map(|a| a.title.clone())
        .unwrap_or_else(|| format!("no articles in {name}"))
}
