pub mod create;
pub use self::create::create;

pub mod verify;
pub use self::verify::verify;

pub mod info;
pub use self::info::info;

pub mod health;
pub use self::health::health;

// common helpers for the handlers
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::net::SocketAddr;

/// Client address used as the rate-limit key: proxy headers first, then the
/// socket peer so the guard always has a key.
pub(crate) fn client_key(headers: &HeaderMap, peer: SocketAddr) -> String {
    extract_client_ip(headers).unwrap_or_else(|| peer.ip().to_string())
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
