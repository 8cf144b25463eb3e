//! Responder lifecycle and the operational loop.
//!
//! All registry mutations happen on a single task, the operational loop,
//! which consumes [`Operation`]s from an unbounded queue. The listener only
//! ever reads the registry. Shutdown is signalled through a cancellation
//! token: the loop closes the queue, withdraws every live service with a
//! goodbye and then stops the listener, which drops the last handle to the
//! socket.

use parking_lot::Mutex;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ResponderConfig;
use crate::diagnostics::{Diagnostics, GoodbyeReason, ResponderEvent, TracingDiagnostics};
use crate::error::MdnsError;
use crate::listener::Listener;
use crate::record::build_goodbye;
use crate::registry::{Registration, Service, SharedRegistry};
use crate::socket::bind_multicast;

/// Kind of registry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Insert or replace a service.
    Register,
    /// Remove a service by hostname.
    Unregister,
}

/// A queued registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// What to do.
    pub kind: OperationKind,
    /// The service; for unregistration only the hostname is used for lookup.
    pub service: Service,
}

/// State handed to the background tasks by [`Responder::start`].
struct Pending {
    socket: UdpSocket,
    ops: mpsc::UnboundedReceiver<Operation>,
}

/// An authoritative mDNS responder for A and AAAA records.
pub struct Responder {
    config: ResponderConfig,
    local_addr: SocketAddr,
    registry: SharedRegistry,
    diagnostics: Arc<dyn Diagnostics>,
    ops: mpsc::UnboundedSender<Operation>,
    shutdown: CancellationToken,
    pending: Mutex<Option<Pending>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Responder {
    /// Bind the responder socket, logging through `tracing`.
    ///
    /// Must be called from within a tokio runtime. Nothing is processed
    /// until [`Responder::start`] is called.
    pub fn new(config: ResponderConfig) -> Result<Self, MdnsError> {
        Self::with_diagnostics(config, Arc::new(TracingDiagnostics))
    }

    /// Bind the responder socket with a custom diagnostics sink.
    pub fn with_diagnostics(
        config: ResponderConfig,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, MdnsError> {
        let socket = bind_multicast(&config)?;
        let local_addr = socket.local_addr()?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            local_addr,
            registry: SharedRegistry::new(),
            diagnostics,
            ops: tx,
            shutdown: CancellationToken::new(),
            pending: Mutex::new(Some(Pending { socket, ops: rx })),
            task: Mutex::new(None),
        })
    }

    /// Local address of the responder socket.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Configuration the responder was built with.
    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Snapshot of the currently live services.
    pub fn services(&self) -> Vec<Service> {
        self.registry.services()
    }

    /// True once shutdown has been requested.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawn the operational loop and the listener.
    pub fn start(&self) -> Result<(), MdnsError> {
        if self.shutdown.is_cancelled() {
            return Err(MdnsError::ResponderStopped);
        }
        let Pending { socket, ops } = self.pending.lock().take().ok_or(MdnsError::AlreadyStarted)?;

        let socket = Arc::new(socket);
        let listener_stop = CancellationToken::new();

        let listener = Listener::new(
            socket.clone(),
            self.registry.clone(),
            self.diagnostics.clone(),
        );
        let op_loop = OperationalLoop {
            socket,
            registry: self.registry.clone(),
            diagnostics: self.diagnostics.clone(),
            ttl: self.config.ttl,
            announce_addr: self.config.announce_addr(),
            goodbye_on_replace: self.config.goodbye_on_replace,
            listener_stop: listener_stop.clone(),
        };
        let shutdown = self.shutdown.clone();
        let diagnostics = self.diagnostics.clone();

        diagnostics.emit(&ResponderEvent::Started {
            local_addr: self.local_addr,
        });

        let handle = tokio::spawn(async move {
            let listener = tokio::spawn(listener.run(listener_stop));
            op_loop.run(ops, shutdown).await;
            if let Err(e) = listener.await {
                tracing::error!("Listener task panicked: {}", e);
            }
            diagnostics.emit(&ResponderEvent::Stopped);
        });
        *self.task.lock() = Some(handle);

        Ok(())
    }

    /// Queue registration of `hostname` with `address`.
    ///
    /// Returns once the request is queued; record construction errors are
    /// reported through diagnostics when the loop applies it.
    pub fn register(&self, hostname: impl Into<String>, address: IpAddr) -> Result<(), MdnsError> {
        self.register_service(Service::new(hostname, address))
    }

    /// Queue registration of `service`.
    pub fn register_service(&self, service: Service) -> Result<(), MdnsError> {
        self.submit(Operation {
            kind: OperationKind::Register,
            service,
        })
    }

    /// Queue removal of `hostname`. The address is informational only.
    pub fn unregister(&self, hostname: impl Into<String>, address: IpAddr) -> Result<(), MdnsError> {
        self.submit(Operation {
            kind: OperationKind::Unregister,
            service: Service::new(hostname, address),
        })
    }

    fn submit(&self, op: Operation) -> Result<(), MdnsError> {
        if self.shutdown.is_cancelled() {
            return Err(MdnsError::ResponderStopped);
        }
        self.ops.send(op).map_err(|_| MdnsError::ResponderStopped)
    }

    /// Withdraw every live service and stop both tasks.
    ///
    /// Waits until the goodbye sweep has completed and the socket is closed.
    /// Operations still queued when the loop observes the shutdown are
    /// discarded; later ones fail with [`MdnsError::ResponderStopped`].
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        // Never started: dropping the pending socket closes it.
        self.pending.lock().take();

        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Responder task panicked: {}", e);
            }
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Single writer of the registry.
struct OperationalLoop {
    socket: Arc<UdpSocket>,
    registry: SharedRegistry,
    diagnostics: Arc<dyn Diagnostics>,
    ttl: u32,
    announce_addr: SocketAddr,
    goodbye_on_replace: bool,
    listener_stop: CancellationToken,
}

impl OperationalLoop {
    async fn run(self, mut ops: mpsc::UnboundedReceiver<Operation>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                op = ops.recv() => match op {
                    Some(op) => self.apply(op).await,
                    None => break,
                },
            }
        }

        self.wind_down(ops).await;
    }

    async fn apply(&self, op: Operation) {
        match op.kind {
            OperationKind::Register => self.apply_register(op.service).await,
            OperationKind::Unregister => self.apply_unregister(op.service).await,
        }
    }

    async fn apply_register(&self, service: Service) {
        let outcome = self
            .registry
            .write(|registry| registry.register(service.clone(), self.ttl));

        match outcome {
            Ok(Registration { replaced }) => {
                self.diagnostics.emit(&ResponderEvent::Registered {
                    service: service.clone(),
                    replaced: replaced.as_ref().map(|old| old.address),
                });
                if let Some(old) = replaced {
                    if self.goodbye_on_replace && old.address != service.address {
                        self.send_goodbye(&old, GoodbyeReason::Replaced).await;
                    }
                }
            }
            Err(error) => {
                self.diagnostics
                    .emit(&ResponderEvent::RegistrationRejected { service, error });
            }
        }
    }

    async fn apply_unregister(&self, service: Service) {
        let removed = self
            .registry
            .write(|registry| registry.unregister(&service.hostname));

        match removed {
            Some(removed) => {
                self.send_goodbye(&removed, GoodbyeReason::Unregister).await;
                self.diagnostics
                    .emit(&ResponderEvent::Unregistered { service: removed });
            }
            None => self.diagnostics.emit(&ResponderEvent::UnknownService {
                hostname: service.hostname,
            }),
        }
    }

    /// Reject further operations, withdraw every live service, stop the listener.
    async fn wind_down(&self, mut ops: mpsc::UnboundedReceiver<Operation>) {
        ops.close();
        let mut discarded = 0;
        while ops.try_recv().is_ok() {
            discarded += 1;
        }

        // Draining under the write lock means the listener sees either the
        // full registry or nothing; the loop is the only writer from here on.
        let services = self.registry.write(|registry| registry.drain());

        self.diagnostics.emit(&ResponderEvent::ShutdownStarted {
            services: services.len(),
            discarded,
        });

        for service in &services {
            self.send_goodbye(service, GoodbyeReason::Shutdown).await;
        }

        self.listener_stop.cancel();
    }

    async fn send_goodbye(&self, service: &Service, reason: GoodbyeReason) {
        let packet = match build_goodbye(service) {
            Ok(packet) => packet,
            Err(e) => {
                self.diagnostics.emit(&ResponderEvent::GoodbyeFailed {
                    service: service.clone(),
                    error: e.to_string(),
                });
                return;
            }
        };

        match self.socket.send_to(&packet, self.announce_addr).await {
            Ok(_) => self.diagnostics.emit(&ResponderEvent::GoodbyeSent {
                service: service.clone(),
                reason,
            }),
            Err(e) => self.diagnostics.emit(&ResponderEvent::GoodbyeFailed {
                service: service.clone(),
                error: e.to_string(),
            }),
        }
    }
}
