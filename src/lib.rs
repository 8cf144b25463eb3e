//! mdns-responder - A minimal authoritative multicast DNS responder.
//!
//! This crate keeps a process-local registry of hostnames and answers A and
//! AAAA queries for them over UDP multicast on `224.0.0.251:5353`. When a
//! hostname is unregistered, or the responder shuts down, a goodbye (TTL 0)
//! announcement is multicast so peers purge their cached copy.
//!
//! ## Features
//!
//! - A/AAAA answers with the mDNS cache-flush bit set
//! - Goodbye announcements on unregistration, replacement and shutdown
//! - Single-writer registry: all mutations are applied by one task
//! - Injected diagnostics instead of process-wide logger state
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        mdns-responder                          │
//! │                                                                │
//! │  register/unregister                                           │
//! │         │                                                      │
//! │         ▼                                                      │
//! │  ┌──────────────────┐  write  ┌──────────────────┐             │
//! │  │ Operational Loop │────────▶│    Registry      │             │
//! │  │ (single writer)  │         │ (name -> record) │             │
//! │  └────────┬─────────┘         └────────┬─────────┘             │
//! │           │ goodbyes                   │ read                  │
//! │           ▼                            ▼                       │
//! │  ┌─────────────────────────────────────────────┐               │
//! │  │     UDP socket  224.0.0.251:5353            │◀── queries    │
//! │  │     (listener replies unicast to querier)   │──▶ answers    │
//! │  └─────────────────────────────────────────────┘               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use mdns_responder::{Responder, ResponderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mdns_responder::MdnsError> {
//!     let responder = Responder::new(ResponderConfig::default())?;
//!     responder.start()?;
//!     responder.register("example.local.", "192.168.1.1".parse().unwrap())?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     responder.shutdown().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod diagnostics;
pub mod error;
mod listener;
pub mod metrics;
pub mod netutil;
pub mod record;
pub mod registry;
pub mod responder;
pub mod socket;
pub mod telemetry;

// Re-export main types
pub use config::{Config, ResponderConfig, ServiceConfig, TelemetryConfig};
pub use diagnostics::{Diagnostics, GoodbyeReason, ResponderEvent, TracingDiagnostics};
pub use error::{MdnsError, RecordError};
pub use registry::Service;
pub use responder::Responder;
