//! Address classification and the outbound address guard.
//!
//! Every address a scan may connect to is classified here. Only
//! [`AddressClass::Public`] addresses are connectable, unless the operator
//! allow-lists a specific address.
//!
//! IPv6 forms that embed an IPv4 address (IPv4-mapped, NAT64, 6to4) are
//! classified by the embedded address, so `::ffff:127.0.0.1` is loopback.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use crate::error_handling::ValidationError;

/// Address ranges the guard distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AddressClass {
    Public,
    Loopback,
    Private,
    LinkLocal,
    SharedAddressSpace,
    Multicast,
    Broadcast,
    Unspecified,
    Documentation,
    Reserved,
    /// IPv6 socket address carrying an interface scope id.
    ZoneScoped,
}

impl AddressClass {
    pub fn is_public(self) -> bool {
        self == AddressClass::Public
    }
}

/// Classifies an address.
pub fn classify_ip(ip: IpAddr) -> AddressClass {
    match ip {
        IpAddr::V4(v4) => classify_ipv4(v4),
        IpAddr::V6(v6) => classify_ipv6(v6),
    }
}

fn classify_ipv4(ip: Ipv4Addr) -> AddressClass {
    let o = ip.octets();
    if ip.is_unspecified() {
        return AddressClass::Unspecified;
    }
    if ip.is_broadcast() {
        return AddressClass::Broadcast;
    }
    match o {
        // This-network 0.0.0.0/8
        [0, ..] => AddressClass::Reserved,
        [127, ..] => AddressClass::Loopback,
        [10, ..] => AddressClass::Private,
        [172, b, ..] if (16..=31).contains(&b) => AddressClass::Private,
        [192, 168, ..] => AddressClass::Private,
        [169, 254, ..] => AddressClass::LinkLocal,
        // CGNAT 100.64.0.0/10
        [100, b, ..] if (64..=127).contains(&b) => AddressClass::SharedAddressSpace,
        // IETF protocol assignments 192.0.0.0/24
        [192, 0, 0, _] => AddressClass::Reserved,
        [192, 0, 2, _] | [198, 51, 100, _] | [203, 0, 113, _] => AddressClass::Documentation,
        // Deprecated 6to4 relay anycast 192.88.99.0/24
        [192, 88, 99, _] => AddressClass::Reserved,
        // Benchmarking 198.18.0.0/15
        [198, 18 | 19, ..] => AddressClass::Reserved,
        [224..=239, ..] => AddressClass::Multicast,
        [240..=255, ..] => AddressClass::Reserved,
        _ => AddressClass::Public,
    }
}

fn classify_ipv6(ip: Ipv6Addr) -> AddressClass {
    let s = ip.segments();
    if ip.is_unspecified() {
        return AddressClass::Unspecified;
    }
    if ip.is_loopback() {
        return AddressClass::Loopback;
    }
    if let Some(v4) = ip.to_ipv4_mapped() {
        return classify_ipv4(v4);
    }
    // Deprecated IPv4-compatible ::/96
    if s[..6] == [0; 6] {
        return AddressClass::Reserved;
    }
    // NAT64 well-known prefix 64:ff9b::/96
    if s[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        return classify_ipv4(embedded_ipv4(s[6], s[7]));
    }
    // Local-use NAT64 64:ff9b:1::/48
    if s[..3] == [0x64, 0xff9b, 1] {
        return AddressClass::Private;
    }
    // 6to4 2002::/16
    if s[0] == 0x2002 {
        return classify_ipv4(embedded_ipv4(s[1], s[2]));
    }
    if s[0] == 0x2001 && s[1] == 0x0db8 {
        return AddressClass::Documentation;
    }
    // Teredo 2001::/32
    if s[0] == 0x2001 && s[1] == 0 {
        return AddressClass::Reserved;
    }
    // Discard-only 100::/64
    if s[..4] == [0x100, 0, 0, 0] {
        return AddressClass::Reserved;
    }
    // Unique local fc00::/7 and deprecated site-local fec0::/10
    if (s[0] & 0xfe00) == 0xfc00 || (s[0] & 0xffc0) == 0xfec0 {
        return AddressClass::Private;
    }
    if (s[0] & 0xffc0) == 0xfe80 {
        return AddressClass::LinkLocal;
    }
    if (s[0] & 0xff00) == 0xff00 {
        return AddressClass::Multicast;
    }
    // Only global unicast 2000::/3 is allocated
    if (s[0] & 0xe000) != 0x2000 {
        return AddressClass::Reserved;
    }
    AddressClass::Public
}

/// Classifies a socket address. A non-zero IPv6 scope id makes the
/// address zone-scoped whatever its range.
pub fn classify_socket_addr(addr: &SocketAddr) -> AddressClass {
    match addr {
        SocketAddr::V6(v6) if v6.scope_id() != 0 => AddressClass::ZoneScoped,
        _ => classify_ip(addr.ip()),
    }
}

fn embedded_ipv4(high: u16, low: u16) -> Ipv4Addr {
    let [a, b] = high.to_be_bytes();
    let [c, d] = low.to_be_bytes();
    Ipv4Addr::new(a, b, c, d)
}

/// Decides which addresses a scan may connect to.
///
/// Cloning is cheap; the allow-list is shared.
#[derive(Debug, Clone, Default)]
pub struct AddressGuard {
    allowed: Arc<HashSet<IpAddr>>,
}

impl AddressGuard {
    /// Guard that only admits public addresses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard that additionally admits the exact addresses in `allowed`.
    pub fn with_allowed(allowed: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            allowed: Arc::new(allowed.into_iter().collect()),
        }
    }

    pub fn is_allowed(&self, ip: IpAddr) -> bool {
        self.allowed.contains(&ip) || classify_ip(ip).is_public()
    }

    /// Checks a full resolution answer. Every address must be allowed; one bad
    /// address rejects the whole set.
    pub fn check_all(&self, addrs: &[IpAddr]) -> Result<(), ValidationError> {
        if addrs.is_empty() {
            return Err(ValidationError::UnresolvableHost);
        }
        for &ip in addrs {
            if !self.is_allowed(ip) {
                let class: &'static str = classify_ip(ip).into();
                log::debug!("Address {ip} rejected ({class})");
                return Err(ValidationError::UnsafeAddress);
            }
        }
        Ok(())
    }

    /// Checks the peer of an established connection. Zone-scoped IPv6
    /// addresses are refused outright, even when allow-listed.
    pub fn check_socket_addr(&self, addr: &SocketAddr) -> Result<(), ValidationError> {
        if classify_socket_addr(addr) == AddressClass::ZoneScoped {
            log::debug!("Peer {addr} rejected (zone_scoped)");
            return Err(ValidationError::UnsafeAddress);
        }
        self.check_all(&[addr.ip()])
    }
}

/// Checks if a domain name is a localhost variant.
pub(crate) fn is_localhost_domain(domain: &str) -> bool {
    let domain_lower = domain.trim_end_matches('.').to_lowercase();
    matches!(
        domain_lower.as_str(),
        "localhost" | "localhost.localdomain" | "ip6-localhost" | "ip6-loopback"
    ) || domain_lower.ends_with(".localhost")
}
