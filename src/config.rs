//! Configuration types for mdns-responder.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::record::DEFAULT_TTL;
use crate::registry::Service;

/// Standard mDNS IPv4 multicast group.
pub const MDNS_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// Standard mDNS port.
pub const MDNS_PORT: u16 = 5353;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Responder configuration.
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Services registered at startup.
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

/// Responder socket and record configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Address the UDP socket binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Multicast group joined for queries and used for goodbyes.
    #[serde(default = "default_multicast_group")]
    pub multicast_group: Ipv4Addr,

    /// Local interface address used to join the group (0.0.0.0 = default).
    #[serde(default = "default_interface")]
    pub interface: Ipv4Addr,

    /// Whether to join the multicast group at all.
    #[serde(default = "default_true")]
    pub join_multicast: bool,

    /// Destination for goodbye announcements.
    /// Defaults to `multicast_group` on the listen port.
    #[serde(default)]
    pub announce_addr: Option<SocketAddr>,

    /// TTL for answers in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// IP multicast hop limit for outgoing packets.
    #[serde(default = "default_multicast_ttl")]
    pub multicast_ttl: u32,

    /// Send a goodbye for the old address when a hostname is re-registered
    /// with a different one.
    #[serde(default = "default_true")]
    pub goodbye_on_replace: bool,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            multicast_group: default_multicast_group(),
            interface: default_interface(),
            join_multicast: true,
            announce_addr: None,
            ttl: default_ttl(),
            multicast_ttl: default_multicast_ttl(),
            goodbye_on_replace: true,
        }
    }
}

impl ResponderConfig {
    /// Where goodbye announcements are sent.
    pub fn announce_addr(&self) -> SocketAddr {
        self.announce_addr.unwrap_or_else(|| {
            SocketAddr::new(IpAddr::V4(self.multicast_group), self.listen_addr.port())
        })
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "debug", "mdns_responder=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
        }
    }
}

/// A statically configured service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Fully-qualified hostname.
    pub hostname: String,
    /// Advertised address.
    pub address: IpAddr,
}

impl From<ServiceConfig> for Service {
    fn from(config: ServiceConfig) -> Self {
        Service::new(config.hostname, config.address)
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), MDNS_PORT)
}

fn default_multicast_group() -> Ipv4Addr {
    MDNS_MULTICAST_ADDR
}

fn default_interface() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_multicast_ttl() -> u32 {
    255
}

fn default_log_level() -> String {
    "info".to_string()
}
