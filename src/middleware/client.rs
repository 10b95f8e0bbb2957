use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

/// Caller address and user agent, recorded in the activity log
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientInfo {
            ip: client_ip(&parts.headers, remote),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.chars().take(500).collect()),
        })
    }
}

/// First public address from `Client-IP`, `X-Forwarded-For`, then the peer;
/// falls back to the peer address (or 0.0.0.0) when none is public.
pub fn client_ip(headers: &HeaderMap, remote: Option<IpAddr>) -> String {
    for name in ["client-ip", "x-forwarded-for"] {
        let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        for candidate in value.split(',') {
            if let Ok(ip) = candidate.trim().parse::<IpAddr>() {
                if is_public(&ip) {
                    return ip.to_string();
                }
            }
        }
    }

    match remote {
        Some(ip) => ip.to_string(),
        None => "0.0.0.0".to_string(),
    }
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.octets()[0] == 0
                || v4.octets()[0] >= 240)
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn skips_private_forwarded_addresses() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.4, 203.0.113.9, 8.8.8.8"));
        // 203.0.113.0/24 is a documentation range
        assert_eq!(client_ip(&headers, None), "8.8.8.8");
    }

    #[test]
    fn client_ip_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("client-ip", HeaderValue::from_static("1.1.1.1"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("8.8.8.8"));
        assert_eq!(client_ip(&headers, None), "1.1.1.1");
    }

    #[test]
    fn falls_back_to_peer() {
        let headers = HeaderMap::new();
        let peer: IpAddr = "192.168.1.20".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), "192.168.1.20");
        assert_eq!(client_ip(&headers, None), "0.0.0.0");
    }
}
