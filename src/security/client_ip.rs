//! Client IP extraction from proxy headers.
//!
//! The header order is a trust chain and must not be reordered: the first
//! header present wins, even when a later one carries a different address.

use axum::http::HeaderMap;

/// Headers consulted, highest priority first.
pub const CLIENT_IP_HEADERS: [&str; 4] = [
    "x-forwarded-for",
    "x-real-ip",
    "cf-connecting-ip",
    "x-client-ip",
];

/// Value used when no header identifies the client.
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

/// First comma-separated token of the first proxy header present.
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT_IP)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_first_header_and_first_segment_win() {
        let map = headers(&[
            ("x-forwarded-for", "1.2.3.4, 5.6.7.8"),
            ("cf-connecting-ip", "9.9.9.9"),
        ]);
        assert_eq!(extract_client_ip(&map), "1.2.3.4");
    }

    #[test]
    fn test_priority_order() {
        let map = headers(&[("x-client-ip", "4.4.4.4"), ("x-real-ip", "2.2.2.2")]);
        assert_eq!(extract_client_ip(&map), "2.2.2.2");

        let map = headers(&[("x-client-ip", "4.4.4.4"), ("cf-connecting-ip", "3.3.3.3")]);
        assert_eq!(extract_client_ip(&map), "3.3.3.3");

        let map = headers(&[("x-client-ip", " 4.4.4.4 ")]);
        assert_eq!(extract_client_ip(&map), "4.4.4.4");
    }

    #[test]
    fn test_unknown_without_headers() {
        assert_eq!(extract_client_ip(&HeaderMap::new()), "unknown");
    }
}
