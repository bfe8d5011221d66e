//! Endpoint URL helpers shared by the model and store clients.

/// Strip trailing slashes from a configured base URL.
///
/// ```
/// use ollachat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:4321/api/"), "http://localhost:4321/api");
/// assert_eq!(normalize_base_url("http://localhost:4321/api//"), "http://localhost:4321/api");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use ollachat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434/api", "chat"),
///     "http://localhost:11434/api/chat"
/// );
/// assert_eq!(
///     construct_api_url("http://localhost:4321/api/", "/messages/abc123"),
///     "http://localhost:4321/api/messages/abc123"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
