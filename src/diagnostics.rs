//! Diagnostics emitted by a running responder.
//!
//! The responder never logs through process-wide state of its own. Every
//! noteworthy thing it does is described by a [`ResponderEvent`] and handed
//! to the [`Diagnostics`] implementation it was built with.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn, Level};

use crate::error::RecordError;
use crate::metrics;
use crate::registry::Service;

/// Why a goodbye was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoodbyeReason {
    /// The service was unregistered.
    Unregister,
    /// The service was superseded by a registration with another address.
    Replaced,
    /// The responder is shutting down.
    Shutdown,
}

impl GoodbyeReason {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoodbyeReason::Unregister => "unregister",
            GoodbyeReason::Replaced => "replaced",
            GoodbyeReason::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for GoodbyeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the responder did or failed to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponderEvent {
    /// Listener and operational loop are running.
    Started {
        /// Local address of the socket.
        local_addr: SocketAddr,
    },
    /// A registration was applied.
    Registered {
        /// The service now live.
        service: Service,
        /// Address previously live for the same hostname.
        replaced: Option<IpAddr>,
    },
    /// A registration could not be applied; the registry was left unchanged.
    RegistrationRejected {
        /// The rejected service.
        service: Service,
        /// Why the record could not be built.
        error: RecordError,
    },
    /// An unregistration was applied.
    Unregistered {
        /// The service that was removed.
        service: Service,
    },
    /// An unregistration named a hostname that is not registered.
    UnknownService {
        /// Hostname from the request.
        hostname: String,
    },
    /// A goodbye was sent to the multicast group.
    GoodbyeSent {
        /// The withdrawn service.
        service: Service,
        /// What triggered it.
        reason: GoodbyeReason,
    },
    /// A goodbye could not be built or sent.
    GoodbyeFailed {
        /// The service being withdrawn.
        service: Service,
        /// Failure description.
        error: String,
    },
    /// A query was received.
    QueryReceived {
        /// Querier address.
        from: SocketAddr,
        /// Number of questions in the query.
        questions: usize,
    },
    /// A response was sent to a querier.
    ResponseSent {
        /// Querier address.
        to: SocketAddr,
        /// Number of answers in the response.
        answers: usize,
    },
    /// A response could not be built or sent.
    ResponseFailed {
        /// Querier address.
        to: SocketAddr,
        /// Failure description.
        error: String,
    },
    /// An inbound packet was discarded.
    PacketDropped {
        /// Sender address.
        from: SocketAddr,
        /// Why it was discarded.
        reason: String,
    },
    /// Reading from the socket failed.
    ReadFailed {
        /// Failure description.
        error: String,
    },
    /// Shutdown was observed by the operational loop.
    ShutdownStarted {
        /// Services about to be withdrawn.
        services: usize,
        /// Queued operations that were discarded.
        discarded: usize,
    },
    /// Both tasks have exited.
    Stopped,
}

impl ResponderEvent {
    /// Severity of the event.
    pub fn level(&self) -> Level {
        match self {
            ResponderEvent::Started { .. }
            | ResponderEvent::Registered { .. }
            | ResponderEvent::Unregistered { .. }
            | ResponderEvent::ResponseSent { .. }
            | ResponderEvent::ShutdownStarted { .. }
            | ResponderEvent::Stopped => Level::INFO,
            ResponderEvent::GoodbyeSent { .. } | ResponderEvent::QueryReceived { .. } => {
                Level::DEBUG
            }
            ResponderEvent::PacketDropped { .. } => Level::TRACE,
            ResponderEvent::UnknownService { .. } => Level::WARN,
            ResponderEvent::RegistrationRejected { .. }
            | ResponderEvent::GoodbyeFailed { .. }
            | ResponderEvent::ResponseFailed { .. }
            | ResponderEvent::ReadFailed { .. } => Level::ERROR,
        }
    }
}

/// Sink for responder events.
pub trait Diagnostics: Send + Sync + 'static {
    /// Handle one event.
    fn emit(&self, event: &ResponderEvent);
}

impl<D: Diagnostics + ?Sized> Diagnostics for Arc<D> {
    fn emit(&self, event: &ResponderEvent) {
        (**self).emit(event)
    }
}

/// Default diagnostics: structured `tracing` output plus metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, event: &ResponderEvent) {
        metrics::record_event(event);

        match event {
            ResponderEvent::Started { local_addr } => {
                info!(%local_addr, "mDNS responder started");
            }
            ResponderEvent::Registered { service, replaced } => match replaced {
                Some(previous) => info!(
                    hostname = %service.hostname,
                    ip = %service.address,
                    %previous,
                    "replaced service"
                ),
                None => info!(hostname = %service.hostname, ip = %service.address, "registered service"),
            },
            ResponderEvent::RegistrationRejected { service, error } => {
                error!(hostname = %service.hostname, ip = %service.address, %error, "failed to build service record");
            }
            ResponderEvent::Unregistered { service } => {
                info!(hostname = %service.hostname, ip = %service.address, "unregistered service");
            }
            ResponderEvent::UnknownService { hostname } => {
                warn!(%hostname, "attempted to unregister non-existent service");
            }
            ResponderEvent::GoodbyeSent { service, reason } => {
                debug!(hostname = %service.hostname, ip = %service.address, %reason, "sent goodbye");
            }
            ResponderEvent::GoodbyeFailed { service, error } => {
                error!(hostname = %service.hostname, %error, "failed to send goodbye");
            }
            ResponderEvent::QueryReceived { from, questions } => {
                debug!(%from, questions, "received query");
            }
            ResponderEvent::ResponseSent { to, answers } => {
                info!(%to, answers, "sent response");
            }
            ResponderEvent::ResponseFailed { to, error } => {
                error!(%to, %error, "failed to send response");
            }
            ResponderEvent::PacketDropped { from, reason } => {
                trace!(%from, %reason, "dropped packet");
            }
            ResponderEvent::ReadFailed { error } => {
                error!(%error, "failed to read from socket");
            }
            ResponderEvent::ShutdownStarted { services, discarded } => {
                info!(services, discarded, "shutting down mDNS responder");
            }
            ResponderEvent::Stopped => {
                info!("mDNS responder stopped");
            }
        }
    }
}
