use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;

/// Resolve the client address. `X-Forwarded-For` is only honoured when the
/// direct peer is a trusted proxy.
pub fn resolve(headers: &HeaderMap, peer: IpAddr, trusted_proxies: &[IpNet]) -> IpAddr {
    if !trusted_proxies.is_empty() && trusted_proxies.iter().any(|net| net.contains(&peer)) {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            // Take the first (leftmost) IP that isn't a trusted proxy
            for ip_str in xff.split(',').map(|s| s.trim()) {
                if let Ok(ip) = ip_str.parse::<IpAddr>() {
                    if !trusted_proxies.iter().any(|net| net.contains(&ip)) {
                        return ip;
                    }
                }
            }
        }
    }

    peer
}
