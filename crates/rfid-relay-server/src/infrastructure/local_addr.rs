//! Local LAN address lookup for the startup banner.
//!
//! Readers on the LAN need the hub's IP, not `localhost`.  The lookup walks
//! the host's network interfaces and takes the first IPv4 address that is
//! not loopback.  It needs no default route, so an air-gapped Pi still
//! reports its LAN address.  With no such interface the banner falls back
//! to `localhost`.

use std::net::{IpAddr, Ipv4Addr};

use tracing::debug;

/// The first non-loopback IPv4 address among the host's interfaces.
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            debug!("could not list network interfaces: {e}");
            return None;
        }
    };
    first_lan_ipv4(
        interfaces
            .iter()
            .filter(|iface| !iface.is_loopback())
            .map(|iface| iface.ip()),
    )
}

/// Host string to print in the banner: the LAN IPv4, or `localhost`.
pub fn display_host() -> String {
    local_ipv4()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "localhost".to_string())
}

fn first_lan_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|ip| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
        _ => None,
    })
}
