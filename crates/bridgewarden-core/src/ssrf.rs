//! SSRF gate — keeps guarded fetches away from host-internal addresses.
//!
//! A network target is rejected when its hostname is a known loopback
//! alias, parses as a private/reserved IP, or resolves (via the injected
//! resolver) to any such IP. Resolution failure is itself a rejection:
//! the gate fails closed.

use std::net::{IpAddr, ToSocketAddrs};

/// DNS resolution seam. Production uses [`SystemResolver`]; tests inject
/// implementations returning fixed addresses.
pub trait DnsResolve {
    /// Resolve a hostname to its addresses. An empty result means the
    /// name did not resolve.
    fn resolve(&self, host: &str) -> Vec<IpAddr>;
}

/// Resolver backed by the operating system's name service.
pub struct SystemResolver;

impl DnsResolve for SystemResolver {
    fn resolve(&self, host: &str) -> Vec<IpAddr> {
        match (host, 80).to_socket_addrs() {
            Ok(addrs) => addrs.map(|addr| addr.ip()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Classify addresses that must never be fetched: private ranges,
/// loopback, link-local, reserved, multicast, unspecified, broadcast,
/// and the cloud metadata address.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_multicast()
                || v4.octets()[0] >= 240
                || v4.octets() == [169, 254, 169, 254]
        }
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (segments[0] & 0xfe00) == 0xfc00 // unique-local fc00::/7
                || (segments[0] & 0xffc0) == 0xfe80 // link-local fe80::/10
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_private_ip(&IpAddr::V4(v4)))
        }
    }
}

/// Decide whether a hostname is an SSRF risk.
///
/// `allow_localhost` exempts loopback addresses (and the `localhost`
/// aliases) for development setups; every other private class is still
/// rejected.
pub fn is_ssrf_risk(hostname: Option<&str>, resolver: &dyn DnsResolve, allow_localhost: bool) -> bool {
    let normalized = match hostname {
        Some(host) if !host.trim().is_empty() => normalize_host(host),
        _ => return true,
    };

    if matches!(normalized.as_str(), "localhost" | "127.0.0.1" | "::1") {
        return !allow_localhost;
    }

    if let Ok(ip) = normalized.parse::<IpAddr>() {
        if allow_localhost && ip.is_loopback() {
            return false;
        }
        return is_private_ip(&ip);
    }

    let resolved = resolver.resolve(&normalized);
    if resolved.is_empty() {
        return true;
    }
    for ip in resolved {
        if allow_localhost && ip.is_loopback() {
            continue;
        }
        if is_private_ip(&ip) {
            return true;
        }
    }
    false
}

/// Normalize a hostname for comparisons: trim, lowercase, strip the
/// trailing dot and any IPv6 brackets.
pub fn normalize_host(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('.');
    let bare = trimmed
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(trimmed);
    bare.to_lowercase()
}
