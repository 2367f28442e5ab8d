//! Client IP extraction for rate-limit keys.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

/// Key used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort client address, used only to key the courtesy rate limiter.
///
/// Checks Cloudflare's `CF-Connecting-IP` first, then the first entry of
/// `X-Forwarded-For`, then `X-Real-IP`, then the socket peer address. These
/// headers are client-controlled when no proxy strips them, so the value
/// must never be used for authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self(client_ip(&parts.headers, peer)))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Resolve the client address from proxy headers or the peer address.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(ip) = header_value(headers, "cf-connecting-ip") {
        return ip.to_string();
    }

    // A present chain decides the key, even when its first hop is blank
    if let Some(chain) = header_value(headers, "x-forwarded-for") {
        return chain
            .split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_CLIENT)
            .to_string();
    }

    if let Some(ip) = header_value(headers, "x-real-ip") {
        return ip.to_string();
    }

    peer.map_or_else(|| UNKNOWN_CLIENT.to_string(), |addr| addr.ip().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
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
    fn test_forwarded_for_uses_first_hop() {
        let map = headers(&[("x-forwarded-for", " 203.0.113.7 , 10.0.0.1")]);
        assert_eq!(client_ip(&map, None), "203.0.113.7");
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let map = headers(&[
            ("cf-connecting-ip", "198.51.100.2"),
            ("x-forwarded-for", "203.0.113.7"),
        ]);
        assert_eq!(client_ip(&map, None), "198.51.100.2");
    }

    #[test]
    fn test_real_ip_fallback() {
        let map = headers(&[("x-real-ip", "192.0.2.9")]);
        assert_eq!(client_ip(&map, None), "192.0.2.9");
    }

    #[test]
    fn test_peer_address_then_unknown() {
        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "192.0.2.1");
        assert_eq!(client_ip(&HeaderMap::new(), None), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_empty_forwarded_entry_is_unknown() {
        let map = headers(&[("x-forwarded-for", ", 10.0.0.1"), ("x-real-ip", "192.0.2.9")]);
        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();
        assert_eq!(client_ip(&map, Some(peer)), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_blank_forwarded_header_is_ignored() {
        let map = headers(&[("x-forwarded-for", "  "), ("x-real-ip", "192.0.2.9")]);
        assert_eq!(client_ip(&map, None), "192.0.2.9");
    }
}
