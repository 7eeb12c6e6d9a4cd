use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use http::{request::Parts, HeaderMap};

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Placeholder identity when the transport peer is unknown.
pub const UNKNOWN_PEER: &str = "unknown";

/// Resolve the requesting client's IP.
///
/// The first `X-Forwarded-For` entry wins over the peer address. The value is
/// trusted as-is and never validated: any client can set this header, so
/// per-IP quotas and bans are only as strong as the proxy in front.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(value) = headers.get(FORWARDED_FOR) {
        let forwarded = String::from_utf8_lossy(value.as_bytes());
        let first = forwarded.split(',').next().unwrap_or_default();
        return first.trim().to_owned();
    }
    peer_ip(peer)
}

/// The transport-level peer IP, without port.
pub fn peer_ip(peer: Option<SocketAddr>) -> String {
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_PEER.to_owned(),
    }
}

/// Extractor carrying the resolved client IP and the raw peer address.
#[derive(Debug, Clone)]
pub struct ClientIp {
    pub ip: String,
    pub peer: Option<SocketAddr>,
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self {
            ip: resolve_client_ip(&parts.headers, peer),
            peer,
        })
    }
}
