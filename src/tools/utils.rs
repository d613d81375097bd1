/// Normalize an incomplete URL by adding missing protocol and handling common patterns
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();

    // If already has a protocol, return as-is
    if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("file://")
        || trimmed.starts_with("data:")
        || trimmed.starts_with("about:")
    {
        return trimmed.to_string();
    }

    // localhost special case - use http by default
    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    // Relative paths are resolved by the page itself
    if trimmed.starts_with('/') || trimmed.starts_with("./") || trimmed.starts_with("../") {
        return trimmed.to_string();
    }

    format!("https://{}", trimmed)
}

/// Resolve a link relative to the page currently loaded
pub fn resolve_against(current: &str, link: &str) -> String {
    let normalized = normalize_url(link);
    if normalized.starts_with('/') || normalized.starts_with("./") || normalized.starts_with("../") {
        if let Ok(base) = url::Url::parse(current) {
            if let Ok(joined) = base.join(&normalized) {
                return joined.to_string();
            }
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_complete() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com/path"), "http://example.com/path");
    }

    #[test]
    fn test_normalize_url_missing_protocol() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("books.toscrape.com/catalogue"), "https://books.toscrape.com/catalogue");
    }

    #[test]
    fn test_normalize_url_localhost() {
        assert_eq!(normalize_url("localhost:3000"), "http://localhost:3000");
        assert_eq!(normalize_url("127.0.0.1:8080"), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_normalize_url_special_protocols() {
        assert_eq!(normalize_url("about:blank"), "about:blank");
        assert_eq!(normalize_url("data:text/html,<h1>Test</h1>"), "data:text/html,<h1>Test</h1>");
        assert_eq!(normalize_url("file:///path/to/file"), "file:///path/to/file");
    }

    #[test]
    fn test_normalize_url_whitespace() {
        assert_eq!(normalize_url("  https://example.com  "), "https://example.com");
    }

    #[test]
    fn test_resolve_relative_links() {
        assert_eq!(resolve_against("http://ex.test/a/b", "/c"), "http://ex.test/c");
        assert_eq!(resolve_against("http://ex.test/a/b", "../c"), "http://ex.test/c");
        assert_eq!(resolve_against("http://ex.test/a", "ex2.test"), "https://ex2.test");
        assert_eq!(resolve_against("not a url", "/c"), "/c");
    }
}
