//! Small helpers shared by the gateway and the shell.
//!
//! - **Text**: control-character stripping for provider strings, column-aware truncation
//! - **URLs**: base URL and article link validation

mod text;
mod url_validator;

pub use text::{clean_text, fit_width, strip_control_chars};
pub use url_validator::{validate_article_url, validate_base_url, UrlValidationError};

/// Longest search query forwarded to a provider.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
