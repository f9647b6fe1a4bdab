use async_trait::async_trait;
use futures::StreamExt;
use reqwest::redirect::Policy;
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use super::error::{BuildError, GatewayError};
use super::provider::{Provider, QueryOptions};
use super::throttle::Throttle;
use super::ContentGateway;
use crate::model::Article;
use crate::util::validate_base_url;

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Everything needed to build an [`HttpGateway`].
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub provider: Provider,
    /// Overrides the provider's default endpoint (mock servers, proxies).
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub options: QueryOptions,
    pub min_request_interval: Duration,
    /// `None` leaves requests without a deadline.
    pub request_timeout: Option<Duration>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: None,
            api_key: None,
            options: QueryOptions::default(),
            min_request_interval: Duration::from_millis(250),
            request_timeout: None,
        }
    }
}

/// [`ContentGateway`] backed by a news provider's HTTP API.
pub struct HttpGateway {
    client: reqwest::Client,
    provider: Provider,
    base: Url,
    api_key: Option<SecretString>,
    options: QueryOptions,
    throttle: Throttle,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("provider", &self.provider)
            .field("base", &self.base.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("options", &self.options)
            .finish()
    }
}

impl HttpGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, BuildError> {
        let base_str = settings
            .base_url
            .as_deref()
            .unwrap_or(settings.provider.default_base_url());
        let base = validate_base_url(base_str)?;

        if settings.base_url.is_some() {
            tracing::info!(base_url = %base, provider = %settings.provider, "Using custom provider base URL");
        }
        if settings.api_key.is_none() {
            tracing::warn!(provider = %settings.provider, "No API key configured; provider requests will likely be rejected");
        }

        let client = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            provider: settings.provider,
            base,
            api_key: settings.api_key,
            options: settings.options,
            throttle: Throttle::new(settings.min_request_interval),
            request_timeout: settings.request_timeout,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    async fn get_articles(&self, url: Url) -> Result<Vec<Article>, GatewayError> {
        self.throttle.acquire().await;

        let endpoint = url.path().to_string();
        let mut request = self.provider.request(&self.client, url, self.api_key.as_ref());
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            let err = GatewayError::from(e);
            tracing::warn!(endpoint = %endpoint, error = %err, "Provider request failed");
            err
        })?;
        let status = response.status();

        if !status.is_success() {
            // Error bodies are only used for classification; an unreadable one is not fatal.
            let body = read_limited_text(response, MAX_RESPONSE_SIZE)
                .await
                .unwrap_or_default();
            let err = self.provider.classify(status.as_u16(), &body);
            tracing::warn!(endpoint = %endpoint, status = status.as_u16(), error = %err, "Provider returned an error");
            return Err(err);
        }

        let body = read_limited_text(response, MAX_RESPONSE_SIZE).await?;
        let articles = self.provider.normalize(&body)?;
        tracing::debug!(endpoint = %endpoint, count = articles.len(), "Provider request succeeded");
        Ok(articles)
    }
}

#[async_trait]
impl ContentGateway for HttpGateway {
    async fn fetch_category(&self, category: &str) -> Result<Vec<Article>, GatewayError> {
        let url = self.provider.category_url(&self.base, category, &self.options);
        self.get_articles(url).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Article>, GatewayError> {
        let url = self.provider.search_url(&self.base, query, &self.options);
        self.get_articles(url).await
    }
}

/// Follow at most 3 same-host redirects.
///
/// Cross-host redirects are refused: custom auth headers and the `apikey`
/// query parameter would otherwise be forwarded to the new host.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        let origin_host = attempt
            .previous()
            .first()
            .and_then(|u| u.host_str())
            .map(str::to_owned);
        if origin_host.as_deref() != url.host_str() {
            return attempt.error("Cross-host redirect refused");
        }

        tracing::debug!(path = %url.path(), hop = attempt.previous().len(), "Following redirect");
        attempt.follow()
    })
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, GatewayError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(GatewayError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(GatewayError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| GatewayError::Decode("invalid UTF-8 in response".into()))
}
