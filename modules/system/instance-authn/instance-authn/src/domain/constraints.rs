//! Role constraint and network address matching.

use std::net::IpAddr;

use ipnet::IpNet;

/// An empty constraint list places no constraint; otherwise `value` must be
/// one of `constraints`, compared exactly.
#[must_use]
pub fn meets_bound_constraints(value: &str, constraints: &[String]) -> bool {
    constraints.is_empty() || constraints.iter().any(|c| c == value)
}

/// Compares the caller's address, with any `/NN` suffix removed, to the IP
/// address from the certificate. IPv4-mapped IPv6 addresses match their
/// IPv4 form. Unparseable addresses never match.
#[must_use]
pub fn matches_ip_address(remote_addr: &str, cert_ip: &str) -> bool {
    match (parse_remote_addr(remote_addr), cert_ip.trim().parse::<IpAddr>()) {
        (Some(remote), Ok(cert)) => remote.to_canonical() == cert.to_canonical(),
        _ => false,
    }
}

/// `true` when `remote_addr` falls inside any of `cidrs`, or when `cidrs` is
/// empty.
#[must_use]
pub fn remote_addr_in_cidrs(remote_addr: &str, cidrs: &[IpNet]) -> bool {
    if cidrs.is_empty() {
        return true;
    }
    parse_remote_addr(remote_addr)
        .is_some_and(|ip| cidrs.iter().any(|net| net.contains(&ip.to_canonical())))
}

fn parse_remote_addr(remote_addr: &str) -> Option<IpAddr> {
    let addr = remote_addr
        .split_once('/')
        .map_or(remote_addr, |(ip, _)| ip)
        .trim();
    addr.parse().ok()
}
