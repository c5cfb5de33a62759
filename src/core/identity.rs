//! Client identity resolution for rate limiting
//!
//! The gateway always sits behind a reverse proxy, so the socket peer
//! address is the proxy, not the client. Identity is derived from the
//! forwarding headers instead.

use actix_web::http::header::HeaderMap;

/// Identity assigned when no forwarding header carries a usable address.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Resolve the rate-limiting identity for a request.
///
/// `x-forwarded-for` takes priority; it may carry a comma-separated chain
/// of addresses, of which only the first (the originating client) is used.
/// Falls back to `x-real-ip`, then `cf-connecting-ip`, then
/// [`ANONYMOUS_CLIENT`]. Candidates are trimmed, and blank values fall
/// through to the next header.
pub fn resolve_client_identity(headers: &HeaderMap) -> String {
    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    for name in ["x-real-ip", "cf-connecting-ip"] {
        if let Some(value) = header_str(headers, name) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }

    ANONYMOUS_CLIENT.to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
