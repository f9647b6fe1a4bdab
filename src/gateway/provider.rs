//! Provider-specific request building and response normalization.
//!
//! Each provider has its own endpoints, auth placement, category vocabulary and
//! JSON field names. Everything past this module only ever sees [`Article`].

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

use super::error::GatewayError;
use crate::model::{Article, Source};
use crate::util::{clean_text, MAX_SEARCH_QUERY_LENGTH};

/// Categories GNews accepts on `/top-headlines`.
const GNEWS_CATEGORIES: &[&str] = &[
    "general",
    "world",
    "nation",
    "business",
    "technology",
    "entertainment",
    "sports",
    "science",
    "health",
];

/// Categories NewsAPI accepts on `/top-headlines`.
const NEWSAPI_CATEGORIES: &[&str] = &[
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

/// NewsAPI keeps deleted stories in results with this title.
const REMOVED_MARKER: &str = "[Removed]";

/// Supported news providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    GNews,
    NewsApi,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::GNews => write!(f, "gnews"),
            Provider::NewsApi => write!(f, "newsapi"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gnews" => Ok(Provider::GNews),
            "newsapi" => Ok(Provider::NewsApi),
            other => Err(format!("unknown provider '{other}' (expected gnews or newsapi)")),
        }
    }
}

/// Query parameters shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub language: String,
    pub country: String,
    /// Fixed page size; there is no pagination beyond the first page.
    pub page_size: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            country: "us".to_string(),
            page_size: 10,
        }
    }
}

impl Provider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::GNews => "https://gnews.io/api/v4",
            Provider::NewsApi => "https://newsapi.org/v2",
        }
    }

    /// Map an app category to the provider's vocabulary.
    ///
    /// `None` means the provider has no such category and the request should
    /// fall back to its generic top headlines.
    pub fn map_category(&self, category: &str) -> Option<&'static str> {
        let table = match self {
            Provider::GNews => GNEWS_CATEGORIES,
            Provider::NewsApi => NEWSAPI_CATEGORIES,
        };
        let wanted = category.trim().to_ascii_lowercase();
        table.iter().copied().find(|c| *c == wanted)
    }

    pub fn category_url(&self, base: &Url, category: &str, opts: &QueryOptions) -> Url {
        let mut url = with_path(base, "top-headlines");
        {
            let mut q = url.query_pairs_mut();
            if let Some(mapped) = self.map_category(category) {
                q.append_pair("category", mapped);
            }
            match self {
                Provider::GNews => {
                    q.append_pair("lang", &opts.language);
                    q.append_pair("max", &opts.page_size.to_string());
                }
                Provider::NewsApi => {
                    q.append_pair("country", &opts.country);
                    q.append_pair("pageSize", &opts.page_size.to_string());
                }
            }
        }
        url
    }

    pub fn search_url(&self, base: &Url, query: &str, opts: &QueryOptions) -> Url {
        let query: String = query.trim().chars().take(MAX_SEARCH_QUERY_LENGTH).collect();
        let mut url = match self {
            Provider::GNews => with_path(base, "search"),
            Provider::NewsApi => with_path(base, "everything"),
        };
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("q", &query);
            match self {
                Provider::GNews => {
                    q.append_pair("lang", &opts.language);
                    q.append_pair("max", &opts.page_size.to_string());
                }
                Provider::NewsApi => {
                    q.append_pair("language", &opts.language);
                    q.append_pair("pageSize", &opts.page_size.to_string());
                }
            }
        }
        url
    }

    /// Build a GET request with the API key placed where this provider expects it.
    pub fn request(&self, client: &Client, mut url: Url, key: Option<&SecretString>) -> RequestBuilder {
        let Some(key) = key else {
            return client.get(url);
        };
        match self {
            Provider::GNews => {
                url.query_pairs_mut().append_pair("apikey", key.expose_secret());
                client.get(url)
            }
            Provider::NewsApi => client.get(url).header("X-Api-Key", key.expose_secret()),
        }
    }

    /// Turn a successful response body into articles.
    ///
    /// Entries without a title or url are dropped. A missing or unparseable
    /// publish date falls back to the time the response was normalized.
    pub fn normalize(&self, body: &str) -> Result<Vec<Article>, GatewayError> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;

        // NewsAPI can answer 200 with an error envelope.
        if envelope.status.as_deref() == Some("error") {
            return Err(self.classify(200, body));
        }

        let received = Utc::now();
        let total = envelope.articles.len();
        let articles: Vec<Article> = envelope
            .articles
            .into_iter()
            .filter_map(|raw| raw.into_article(received))
            .collect();

        if articles.len() < total {
            tracing::debug!(
                provider = %self,
                dropped = total - articles.len(),
                kept = articles.len(),
                "Dropped provider entries that could not be normalized"
            );
        }
        Ok(articles)
    }

    /// Classify a failed response from its status and body.
    pub fn classify(&self, status: u16, body: &str) -> GatewayError {
        let envelope: Option<Envelope> = serde_json::from_str(body).ok();
        let code = envelope.as_ref().and_then(|e| e.code.clone());
        let message = envelope.as_ref().and_then(Envelope::message);

        match code.as_deref() {
            Some("rateLimited") => return GatewayError::RateLimited,
            Some("apiKeyExhausted") | Some("maximumResultsReached") => {
                return GatewayError::QuotaExceeded(message.unwrap_or_else(|| "quota".into()));
            }
            _ => {}
        }

        match (self, status) {
            (_, 429) => GatewayError::RateLimited,
            (Provider::GNews, 403) => {
                GatewayError::QuotaExceeded(message.unwrap_or_else(|| "daily quota".into()))
            }
            _ => GatewayError::Api { status, message },
        }
    }
}

fn with_path(base: &Url, endpoint: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(endpoint);
    }
    url
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    status: Option<String>,
    code: Option<String>,
    message: Option<String>,
    /// GNews reports errors as a list of strings.
    #[serde(default)]
    errors: Option<serde_json::Value>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

impl Envelope {
    fn message(&self) -> Option<String> {
        if let Some(m) = &self.message {
            return Some(m.clone());
        }
        match &self.errors {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .find_map(|v| v.as_str())
                .map(str::to_string),
            Some(serde_json::Value::Object(map)) => map
                .values()
                .find_map(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    #[serde(alias = "urlToImage")]
    image: Option<String>,
    published_at: Option<String>,
    source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl RawArticle {
    fn into_article(self, received: DateTime<Utc>) -> Option<Article> {
        let title = clean_text(self.title.as_deref())?;
        if title == REMOVED_MARKER {
            return None;
        }
        let url = clean_text(self.url.as_deref())?;
        let published_at = match self
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        {
            Some(date) => date.with_timezone(&Utc),
            None => {
                tracing::debug!(title = %title, "Provider entry has no usable publish date");
                received
            }
        };
        let source_name = self
            .source
            .and_then(|s| clean_text(s.name.as_deref()))
            .unwrap_or_else(|| "Unknown".to_string());

        Some(Article {
            title,
            image: clean_text(self.image.as_deref()),
            description: clean_text(self.description.as_deref()),
            content: clean_text(self.content.as_deref()),
            url,
            source: Source { name: source_name },
            published_at,
        })
    }
}
