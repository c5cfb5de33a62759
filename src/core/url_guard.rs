//! SSRF protection for caller-supplied URLs
//!
//! Every URL the gateway fetches on a caller's behalf, or forwards for the
//! provider to fetch, passes through here first. Validation is purely
//! syntactic: scheme check, blocked hostname check, IP literal
//! classification, and in production an origin allowlist. Hostnames are
//! never resolved.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use url::Url;

/// Hostnames never fetched regardless of environment. Matched exactly
/// after ASCII lowercasing.
const BLOCKED_HOSTNAMES: &[&str] = &[
    "localhost",
    "metadata.google.internal",
    "metadata.gcp",
    "metadata",
    "0.0.0.0",
];

/// Why a URL was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlRejection {
    #[error("Invalid URL format.")]
    Malformed,
    #[error("Invalid protocol: {scheme}. Only HTTP(S) is allowed.")]
    UnsupportedScheme { scheme: String },
    #[error("Access to internal/private resources is not allowed.")]
    BlockedHostname,
    #[error("Access to internal/private resources is not allowed.")]
    BlockedIpRange,
    #[error("URL domain is not in the allowed list.")]
    NotInAllowlist,
}

/// Syntactic SSRF guard for outbound URLs.
///
/// The hostname and IP checks always apply. The origin allowlist only
/// applies when `enforce_allowlist` is set and at least one origin is
/// configured, so a development instance accepts any public host.
pub struct UrlGuard {
    /// Origins permitted when the allowlist is enforced
    allowed_origins: Vec<String>,
    /// Enforce the origin allowlist (production mode)
    enforce_allowlist: bool,
}

impl UrlGuard {
    /// Create a guard over the configured origin allowlist.
    pub fn new(allowed_origins: Vec<String>, enforce_allowlist: bool) -> Self {
        Self {
            allowed_origins,
            enforce_allowlist,
        }
    }

    /// Validate a caller-supplied URL before any outbound use.
    pub fn evaluate(&self, raw: &str) -> Result<(), UrlRejection> {
        let url = Url::parse(raw).map_err(|_| UrlRejection::Malformed)?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(UrlRejection::UnsupportedScheme {
                scheme: scheme.to_string(),
            });
        }

        let Some(host) = url.host_str() else {
            return Err(UrlRejection::Malformed);
        };
        let hostname = host.to_ascii_lowercase();

        if BLOCKED_HOSTNAMES.contains(&hostname.as_str()) {
            return Err(UrlRejection::BlockedHostname);
        }

        if let Some(ip) = parse_ip_literal(&hostname) {
            if is_private_or_internal_ip(ip) {
                return Err(UrlRejection::BlockedIpRange);
            }
        }

        if self.enforce_allowlist && !self.allowed_origins.is_empty() {
            let origin = url.origin().ascii_serialization();
            if !self
                .allowed_origins
                .iter()
                .any(|candidate| origin.starts_with(candidate))
            {
                return Err(UrlRejection::NotInAllowlist);
            }
        }

        Ok(())
    }
}

/// Parse a hostname as an IP literal. IPv6 hosts arrive bracketed.
fn parse_ip_literal(hostname: &str) -> Option<IpAddr> {
    let bare = hostname
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(hostname);
    bare.parse().ok()
}

/// Addresses that must never be fetched: loopback, RFC 1918, link-local,
/// unspecified, IPv6 unique-local, and IPv4-mapped forms of the same.
fn is_private_or_internal_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    let segments = ip.segments();
    // fc00::/7 unique local
    if segments[0] & 0xfe00 == 0xfc00 {
        return true;
    }
    // fe80::/10 link local
    if segments[0] & 0xffc0 == 0xfe80 {
        return true;
    }
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_v4(v4);
    }
    false
}
