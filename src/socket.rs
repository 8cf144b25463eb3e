//! Multicast UDP socket setup.

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::config::ResponderConfig;
use crate::error::MdnsError;

/// Create the responder socket described by `config`.
///
/// The socket allows address reuse so it can coexist with other mDNS
/// responders on the host, and joins the configured multicast group when
/// `join_multicast` is set. Must be called from within a tokio runtime.
pub fn bind_multicast(config: &ResponderConfig) -> Result<UdpSocket, MdnsError> {
    let addr = config.listen_addr;
    let bind_err = |source| MdnsError::SocketBind { addr, source };

    let domain = match addr {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;

    socket.set_reuse_address(true).map_err(bind_err)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true).map_err(bind_err)?;

    socket.bind(&addr.into()).map_err(bind_err)?;

    if config.join_multicast {
        socket
            .join_multicast_v4(&config.multicast_group, &config.interface)
            .map_err(bind_err)?;
        socket
            .set_multicast_ttl_v4(config.multicast_ttl)
            .map_err(bind_err)?;
        socket.set_multicast_loop_v4(true).map_err(bind_err)?;
        debug!(group = %config.multicast_group, interface = %config.interface, "joined multicast group");
    }

    socket.set_nonblocking(true).map_err(bind_err)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(bind_err)
}
