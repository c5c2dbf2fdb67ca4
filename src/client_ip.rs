//! Best-effort client IP address extraction
//!
//! Edge headers first, then the socket address. Everything here is
//! attacker-controlled; the result is only ever hashed into click records,
//! never trusted for authorization.

use std::convert::Infallible;
use std::net::IpAddr;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::OptionalFromRequestParts;
use axum::http::request::Parts;

/// Headers an edge proxy may use to forward the client address, in order
/// of preference
const FORWARDING_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Client IP address extractor
#[derive(Clone, Copy, Debug)]
pub struct ClientIp(pub IpAddr);

impl<S> OptionalFromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(from_parts(parts).map(ClientIp))
    }
}

fn from_parts(parts: &Parts) -> Option<IpAddr> {
    for header in FORWARDING_HEADERS {
        let Some(value) = parts.headers.get(header) else {
            continue;
        };

        let Ok(value) = value.to_str() else {
            continue;
        };

        // `x-forwarded-for` may carry a chain; the client is first
        let first = value.split(',').next().unwrap_or_default().trim();

        if let Ok(ip_address) = first.parse::<IpAddr>() {
            return Some(ip_address);
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0.ip())
}
