//! Shared test infrastructure for responder integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use parking_lot::Mutex;
use tokio::net::UdpSocket;

use mdns_responder::{Diagnostics, Responder, ResponderConfig, ResponderEvent};

// --- Timeouts ---

/// How long to wait for something that should happen.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to listen before concluding nothing was sent.
pub const SILENCE: Duration = Duration::from_millis(250);

// --- RecordingDiagnostics ---

/// Captures every responder event so tests can wait for the operational
/// loop to apply an operation.
#[derive(Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<ResponderEvent>>,
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, event: &ResponderEvent) {
        self.events.lock().push(event.clone());
    }
}

impl RecordingDiagnostics {
    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<ResponderEvent> {
        self.events.lock().clone()
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&ResponderEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    /// Wait until at least `n` events match `pred`.
    pub async fn wait_for(&self, n: usize, pred: impl Fn(&ResponderEvent) -> bool) {
        let waited = tokio::time::timeout(EVENT_TIMEOUT, async {
            while self.count(&pred) < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        assert!(
            waited.is_ok(),
            "timed out waiting for {} matching events; saw {:#?}",
            n,
            self.events()
        );
    }
}

// --- TestResponder ---

/// A responder bound to loopback that announces goodbyes to a local socket
/// instead of the multicast group.
pub struct TestResponder {
    pub responder: Responder,
    pub events: Arc<RecordingDiagnostics>,
    pub announce: UdpSocket,
}

impl TestResponder {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut ResponderConfig)) -> Self {
        let announce = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("failed to bind announce socket");

        let mut config = loopback_config(announce.local_addr().unwrap());
        customize(&mut config);

        let events = Arc::new(RecordingDiagnostics::default());
        let responder = Responder::with_diagnostics(config, events.clone())
            .expect("failed to bind responder");
        responder.start().expect("failed to start responder");

        Self {
            responder,
            events,
            announce,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.responder.local_addr()
    }

    /// Register and wait until the loop has applied or rejected it.
    pub async fn register(&self, hostname: &str, address: &str) {
        let before = self.applied_registrations(hostname);
        self.responder
            .register(hostname, address.parse().unwrap())
            .expect("register failed");
        self.events
            .wait_for(before + 1, |e| is_registration_outcome(e, hostname))
            .await;
    }

    /// Unregister and wait until the loop has applied it.
    pub async fn unregister(&self, hostname: &str) {
        let before = self.applied_unregistrations(hostname);
        self.responder
            .unregister(hostname, "0.0.0.0".parse().unwrap())
            .expect("unregister failed");
        self.events
            .wait_for(before + 1, |e| is_unregistration_outcome(e, hostname))
            .await;
    }

    fn applied_registrations(&self, hostname: &str) -> usize {
        self.events.count(|e| is_registration_outcome(e, hostname))
    }

    fn applied_unregistrations(&self, hostname: &str) -> usize {
        self.events.count(|e| is_unregistration_outcome(e, hostname))
    }

    /// Next goodbye delivered to the announce socket, if any.
    pub async fn next_goodbye(&self, wait: Duration) -> Option<Message> {
        recv_message(&self.announce, wait).await
    }
}

fn is_registration_outcome(event: &ResponderEvent, hostname: &str) -> bool {
    match event {
        ResponderEvent::Registered { service, .. }
        | ResponderEvent::RegistrationRejected { service, .. } => service.hostname == hostname,
        _ => false,
    }
}

fn is_unregistration_outcome(event: &ResponderEvent, hostname: &str) -> bool {
    match event {
        ResponderEvent::Unregistered { service } => service.hostname == hostname,
        ResponderEvent::UnknownService { hostname: h } => h == hostname,
        _ => false,
    }
}

// --- Config builders ---

pub fn loopback_config(announce_addr: SocketAddr) -> ResponderConfig {
    ResponderConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        join_multicast: false,
        announce_addr: Some(announce_addr),
        ..Default::default()
    }
}

// --- Query construction ---

/// Build wire-format bytes for an mDNS query.
pub fn build_query_bytes(questions: &[(&str, RecordType)]) -> Vec<u8> {
    let mut msg = Message::new();
    msg.set_id(0);
    msg.set_message_type(MessageType::Query);
    msg.set_op_code(OpCode::Query);
    for (name, record_type) in questions {
        let mut query = Query::new();
        query.set_name(Name::from_ascii(name).unwrap());
        query.set_query_type(*record_type);
        query.set_query_class(DNSClass::IN);
        msg.add_query(query);
    }
    msg.to_vec().unwrap()
}

/// A client socket on loopback that sends queries to a responder.
pub struct Querier {
    socket: UdpSocket,
}

impl Querier {
    pub async fn new() -> Self {
        Self {
            socket: UdpSocket::bind("127.0.0.1:0")
                .await
                .expect("failed to bind querier socket"),
        }
    }

    pub async fn send_raw(&self, bytes: &[u8], to: SocketAddr) {
        self.socket.send_to(bytes, to).await.expect("send failed");
    }

    /// Send a query and return the response, or `None` if the responder
    /// stayed silent.
    pub async fn query(&self, to: SocketAddr, name: &str, record_type: RecordType) -> Option<Message> {
        self.query_many(to, &[(name, record_type)]).await
    }

    pub async fn query_many(
        &self,
        to: SocketAddr,
        questions: &[(&str, RecordType)],
    ) -> Option<Message> {
        self.send_raw(&build_query_bytes(questions), to).await;
        self.recv(SILENCE).await
    }

    pub async fn recv(&self, wait: Duration) -> Option<Message> {
        recv_message(&self.socket, wait).await
    }
}

/// Receive and parse one DNS message, or `None` on timeout.
pub async fn recv_message(socket: &UdpSocket, wait: Duration) -> Option<Message> {
    let mut buf = vec![0u8; 9000];
    match tokio::time::timeout(wait, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(Message::from_vec(&buf[..len]).expect("unparseable DNS message")),
        Ok(Err(e)) => panic!("recv failed: {}", e),
        Err(_) => None,
    }
}

// --- Response helpers ---

/// Address carried by an A or AAAA record.
pub fn record_ip(record: &Record) -> Option<IpAddr> {
    match record.data()? {
        RData::A(a) => Some(IpAddr::V4(a.0)),
        RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
        _ => None,
    }
}

/// Assert `msg` is an authoritative response with exactly one answer for
/// `name` carrying `ip`, and return that answer.
pub fn assert_single_answer(msg: &Message, name: &str, ip: &str) -> Record {
    assert_eq!(msg.message_type(), MessageType::Response);
    assert!(msg.authoritative(), "response must be authoritative");
    assert_eq!(msg.answers().len(), 1, "answers: {:?}", msg.answers());

    let answer = msg.answers()[0].clone();
    assert_eq!(answer.name().to_ascii(), name);
    assert_eq!(record_ip(&answer), Some(ip.parse().unwrap()));
    assert!(answer.mdns_cache_flush(), "cache-flush bit must be set");
    answer
}
