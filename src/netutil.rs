//! Host address discovery.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use crate::error::MdnsError;

/// Public address used only to select a route; no packet is sent.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:53";

/// Address of the interface the host uses to reach the internet.
pub fn outbound_ip() -> Result<IpAddr, MdnsError> {
    let target: SocketAddr = ROUTE_PROBE_ADDR
        .parse()
        .map_err(|e| MdnsError::Config(format!("invalid probe address: {e}")))?;
    outbound_ip_via(target)
}

/// Address of the local interface routing towards `target`.
///
/// Connecting a UDP socket only performs a route lookup, so nothing is
/// transmitted.
pub fn outbound_ip_via(target: SocketAddr) -> Result<IpAddr, MdnsError> {
    let unspecified = match target {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    let socket = UdpSocket::bind(SocketAddr::new(unspecified, 0))?;
    socket.connect(target)?;
    Ok(socket.local_addr()?.ip())
}
