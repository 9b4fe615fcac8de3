//! URL utilities for consistent URL handling
//!
//! Base URLs come from the command line or the config file and may carry
//! trailing slashes; endpoint paths are appended without doubling them.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use ragchat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000"), "http://localhost:8000");
/// assert_eq!(normalize_base_url("http://localhost:8000/"), "http://localhost:8000");
/// assert_eq!(normalize_base_url("http://localhost:8000///"), "http://localhost:8000");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use ragchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000", "api/chat"),
///     "http://localhost:8000/api/chat"
/// );
/// assert_eq!(
///     construct_api_url("https://rag.example.com/", "/api/health"),
///     "https://rag.example.com/api/health"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
