//! Access to the external news provider.
//!
//! [`ContentGateway`] is the seam the feed controller depends on. The HTTP
//! implementation handles provider selection, auth placement, throttling,
//! body size limits and normalization into [`Article`]s.

mod error;
mod http;
mod provider;
mod throttle;

use async_trait::async_trait;

use crate::model::Article;

pub use error::{BuildError, ErrorKind, GatewayError};
pub use http::{GatewaySettings, HttpGateway};
pub use provider::{Provider, QueryOptions};
pub use throttle::Throttle;

/// Source of normalized articles.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Top headlines for a category. Unknown categories fall back to the
    /// provider's general headlines.
    async fn fetch_category(&self, category: &str) -> Result<Vec<Article>, GatewayError>;

    /// Free-text search.
    async fn search(&self, query: &str) -> Result<Vec<Article>, GatewayError>;
}
