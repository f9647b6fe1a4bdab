//! Feed state: what is on screen and where it came from.
//!
//! - [`FeedController`] owns the current mode, article list, headline and
//!   status, and decides when a category can be served from cache.
//! - [`CategoryCache`] keeps the last successful fetch per category.
//!
//! Requests go out as [`PendingRequest`]s tagged with a per-mode token, so a
//! driver can run them concurrently and still only apply the latest one.

mod cache;
mod controller;

use std::fmt;

use crate::gateway::ErrorKind;

pub use cache::{CacheEntry, CategoryCache};
pub use controller::{
    CategoryOutcome, CategoryStep, FeedController, FetchOutcome, PendingRequest, RequestKind,
};

/// Pseudo-category that shows saved articles instead of fetching.
pub const BOOKMARK_CATEGORY: &str = "bookmark";

/// Categories offered by the shell. Providers map these to their own names.
pub const CATEGORIES: &[&str] = &[
    "general",
    "world",
    "business",
    "technology",
    "entertainment",
    "sports",
    "science",
    "health",
    BOOKMARK_CATEGORY,
];

/// What the article list is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMode {
    Category(String),
    Search(String),
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedMode::Category(name) => write!(f, "category: {name}"),
            FeedMode::Search(query) => write!(f, "search: {query}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Loaded,
    Failed(ErrorKind),
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedStatus::Idle => write!(f, "idle"),
            FeedStatus::Loading => write!(f, "loading"),
            FeedStatus::Loaded => write!(f, "loaded"),
            FeedStatus::Failed(kind) => write!(f, "failed: {kind}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// How long a category fetch is served from cache.
    pub ttl: chrono::Duration,
    /// Category shown at startup and after a search is cleared.
    pub default_category: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::minutes(5),
            default_category: "general".to_string(),
        }
    }
}
