//! Cross-origin policy for protected endpoints.
//!
//! Origins are matched against configured patterns where `*` stands for
//! any run of characters. A matching origin is echoed back; a foreign origin
//! gets the method/header allow-lists but no `Access-Control-Allow-Origin`.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::CorsConfig;

pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<String>,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn new(config: &CorsConfig) -> Self {
        let allow_headers = HeaderValue::from_str(&config.allowed_headers.join(", "))
            .unwrap_or_else(|_| HeaderValue::from_static("content-type"));

        Self {
            origins: config.allowed_origins.clone(),
            allow_headers,
            max_age: HeaderValue::from(config.max_age_secs),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.origins.iter().any(|pattern| origin_matches(pattern, origin))
    }

    /// Add CORS headers for a request that carried `origin`.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(origin) = origin {
            if origin.to_str().map(|o| self.allows(o)).unwrap_or(false) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            }
        }
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}

/// Glob match with `*` as the only metacharacter.
pub fn origin_matches(pattern: &str, origin: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = origin.strip_prefix(first) else {
        return false;
    };

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        return rest.is_empty();
    };

    for piece in middle {
        match rest.find(piece) {
            Some(idx) => rest = &rest[idx + piece.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_patterns() {
        assert!(origin_matches("https://app.example.com", "https://app.example.com"));
        assert!(!origin_matches("https://app.example.com", "https://app.example.com.evil"));
        assert!(origin_matches("https://*.lovable.app", "https://team.lovable.app"));
        assert!(!origin_matches("https://*.lovable.app", "https://lovable.app.evil.io"));
        assert!(origin_matches("http://localhost:*", "http://localhost:5173"));
        assert!(!origin_matches("http://localhost:*", "https://localhost:5173"));
        assert!(origin_matches("https://*-preview.*.dev", "https://pr-1-preview.sales.dev"));
        assert!(origin_matches("*", "anything"));
    }

    #[test]
    fn test_apply_matching_origin() {
        let policy = CorsPolicy::new(&CorsConfig::default());
        let origin = HeaderValue::from_static("https://team.lovable.app");
        let mut headers = HeaderMap::new();

        policy.apply(Some(&origin), &mut headers);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://team.lovable.app");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "authorization, x-client-info, apikey, content-type"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[test]
    fn test_apply_foreign_origin() {
        let policy = CorsPolicy::new(&CorsConfig::default());
        let origin = HeaderValue::from_static("https://evil.example");
        let mut headers = HeaderMap::new();

        policy.apply(Some(&origin), &mut headers);
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }
}
