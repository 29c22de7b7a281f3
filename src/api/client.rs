//! Client network address resolution for throttling and audit fields.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use super::AppState;

/// Address of the caller. Falls back to `"unknown"` when the server was not
/// started with connect info (e.g. in-process tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub String);

impl FromRequestParts<Arc<AppState>> for ClientAddress {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(Self(resolve_client_address(
            peer,
            &parts.headers,
            state.throttle().trusted_proxies(),
        )))
    }
}

/// `X-Forwarded-For` is honored only when the socket peer is a trusted proxy.
pub fn resolve_client_address(
    peer: Option<IpAddr>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> String {
    let Some(peer) = peer else {
        return "unknown".to_string();
    };

    let peer_is_trusted = trusted_proxies
        .iter()
        .filter_map(|p| p.parse::<IpAddr>().ok())
        .any(|p| p == peer);

    if peer_is_trusted
        && let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| v.parse::<IpAddr>().is_ok())
    {
        return forwarded.to_string();
    }

    peer.to_string()
}
