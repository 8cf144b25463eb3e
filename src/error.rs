//! Error types for mdns-responder.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Errors produced while turning a service into a resource record.
///
/// These never reach a caller of [`crate::Responder::register`]; they are
/// reported through the diagnostics channel when the operational loop
/// applies the registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Hostname is not a valid, fully-qualified DNS name.
    #[error("invalid hostname {hostname:?}: {reason}")]
    InvalidHostname {
        /// The rejected hostname.
        hostname: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Address cannot be advertised in an A or AAAA record.
    #[error("unsupported address family for {0}")]
    UnsupportedAddressFamily(IpAddr),
}

/// Errors that can occur in the mDNS responder.
#[derive(Debug, Error)]
pub enum MdnsError {
    /// The multicast socket could not be created or bound.
    #[error("failed to bind mDNS socket on {addr}: {source}")]
    SocketBind {
        /// Address the socket was bound to.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// IO error (network, file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record construction failed.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Inbound packet was not a valid DNS message.
    #[error("failed to parse DNS message: {0}")]
    MessageParse(#[source] hickory_proto::error::ProtoError),

    /// Outbound DNS message could not be serialized.
    #[error("failed to pack DNS message: {0}")]
    MessagePack(#[source] hickory_proto::error::ProtoError),

    /// The responder has been shut down and accepts no further operations.
    #[error("mDNS responder is stopped")]
    ResponderStopped,

    /// `start` was called more than once.
    #[error("mDNS responder already started")]
    AlreadyStarted,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
