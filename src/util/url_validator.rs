use std::net::IpAddr;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Plain HTTP is only allowed for localhost: {0}")]
    InsecureScheme(String),
    #[error("Private or loopback address not allowed: {0}")]
    PrivateHost(String),
}

/// Validate a provider base URL.
///
/// HTTPS is required because the API key travels with every request. Plain
/// HTTP is accepted only for loopback hosts, which is what local mock servers
/// listen on.
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;
    let scheme = url.scheme().to_owned();
    match scheme.as_str() {
        "https" => Ok(url),
        "http" if is_loopback_host(&url) => {
            tracing::warn!(base_url = %url, "Using plain HTTP provider base URL (loopback only)");
            Ok(url)
        }
        "http" => Err(UrlValidationError::InsecureScheme(url.to_string())),
        other => Err(UrlValidationError::UnsupportedScheme(other.to_owned())),
    }
}

/// Validate an article URL before handing it to the system browser.
///
/// Article links come from a third party, so anything that is not a public
/// http(s) address is refused.
pub fn validate_article_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_owned())),
    }
    if is_loopback_host(&url) {
        return Err(UrlValidationError::PrivateHost(
            url.host_str().unwrap_or_default().to_owned(),
        ));
    }
    if let Some(ip) = host_ip(&url) {
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateHost(ip.to_string()));
        }
    }
    Ok(url)
}

fn host_ip(url: &Url) -> Option<IpAddr> {
    let host = url.host_str()?;
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
        .parse()
        .ok()
}

fn is_loopback_host(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(_) => host_ip(url).is_some_and(|ip| ip.is_loopback()),
        None => false,
    }
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_https_accepted() {
        assert!(validate_base_url("https://gnews.io/api/v4").is_ok());
    }

    #[test]
    fn test_base_url_http_loopback_accepted() {
        assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
        assert!(validate_base_url("http://localhost:3000/api").is_ok());
    }

    #[test]
    fn test_base_url_plain_http_rejected() {
        assert!(matches!(
            validate_base_url("http://evil.example.com"),
            Err(UrlValidationError::InsecureScheme(_))
        ));
    }

    #[test]
    fn test_base_url_other_scheme_rejected() {
        assert!(matches!(
            validate_base_url("ftp://example.com"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_article_url_public_accepted() {
        assert!(validate_article_url("https://example.com/story").is_ok());
        assert!(validate_article_url("http://news.example.org/a?b=c").is_ok());
    }

    #[test]
    fn test_article_url_private_rejected() {
        assert!(validate_article_url("http://localhost/x").is_err());
        assert!(validate_article_url("http://127.0.0.1/x").is_err());
        assert!(validate_article_url("http://192.168.1.1/x").is_err());
        assert!(validate_article_url("http://[fe80::1]/x").is_err());
        assert!(validate_article_url("file:///etc/passwd").is_err());
    }
}
