//! UDP listener answering A/AAAA queries from the registry.

use hickory_proto::op::{Header, MessageType, Query};
use hickory_proto::rr::{LowerName, Record, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{Diagnostics, ResponderEvent};
use crate::error::MdnsError;
use crate::record::build_response;
use crate::registry::SharedRegistry;

/// Largest mDNS packet we accept (RFC 6762 section 17).
const MAX_PACKET_SIZE: usize = 9000;

/// What to do with an inbound packet.
#[derive(Debug, PartialEq)]
pub(crate) enum Disposition {
    /// Not a query; ignore silently.
    NotAQuery,
    /// Query without questions.
    NoQuestions,
    /// Query that matched nothing we own.
    NoAnswer {
        /// Number of questions asked.
        questions: usize,
    },
    /// Query with at least one matching record.
    Answer {
        /// Number of questions asked.
        questions: usize,
        /// Matching records, in question order.
        answers: Vec<Record>,
    },
}

/// Parse the header and question section of a DNS message.
///
/// Returns `None` for responses.
fn parse_questions(packet: &[u8]) -> Result<Option<Vec<Query>>, MdnsError> {
    let mut decoder = BinDecoder::new(packet);
    let header = Header::read(&mut decoder).map_err(MdnsError::MessageParse)?;

    if header.message_type() == MessageType::Response {
        return Ok(None);
    }

    let mut questions = Vec::with_capacity(header.query_count() as usize);
    for _ in 0..header.query_count() {
        questions.push(Query::read(&mut decoder).map_err(MdnsError::MessageParse)?);
    }

    Ok(Some(questions))
}

/// Match an inbound packet against the registry.
pub(crate) fn classify(packet: &[u8], registry: &SharedRegistry) -> Result<Disposition, MdnsError> {
    let Some(questions) = parse_questions(packet)? else {
        return Ok(Disposition::NotAQuery);
    };

    if questions.is_empty() {
        return Ok(Disposition::NoQuestions);
    }

    let answers: Vec<Record> = registry.read(|registry| {
        questions
            .iter()
            .filter(|q| matches!(q.query_type(), RecordType::A | RecordType::AAAA))
            .filter_map(|q| {
                registry
                    .lookup(&LowerName::new(q.name()), q.query_type())
                    .cloned()
            })
            .collect()
    });

    if answers.is_empty() {
        Ok(Disposition::NoAnswer {
            questions: questions.len(),
        })
    } else {
        Ok(Disposition::Answer {
            questions: questions.len(),
            answers,
        })
    }
}

/// Reads queries from the shared socket and replies unicast to the querier.
pub(crate) struct Listener {
    socket: Arc<UdpSocket>,
    registry: SharedRegistry,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Listener {
    pub(crate) fn new(
        socket: Arc<UdpSocket>,
        registry: SharedRegistry,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            socket,
            registry,
            diagnostics,
        }
    }

    /// Serve queries until `shutdown` is cancelled.
    pub(crate) async fn run(self, shutdown: CancellationToken) {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];

        loop {
            let result = tokio::select! {
                _ = shutdown.cancelled() => return,
                result = self.socket.recv_from(&mut buf) => result,
            };

            match result {
                Ok((len, from)) => self.handle_packet(&buf[..len], from).await,
                Err(_) if shutdown.is_cancelled() => return,
                Err(e) => self.diagnostics.emit(&ResponderEvent::ReadFailed {
                    error: e.to_string(),
                }),
            }
        }
    }

    async fn handle_packet(&self, packet: &[u8], from: SocketAddr) {
        let disposition = match classify(packet, &self.registry) {
            Ok(disposition) => disposition,
            Err(e) => {
                self.diagnostics.emit(&ResponderEvent::PacketDropped {
                    from,
                    reason: e.to_string(),
                });
                return;
            }
        };

        match disposition {
            Disposition::NotAQuery => {}
            Disposition::NoQuestions => {
                self.diagnostics.emit(&ResponderEvent::PacketDropped {
                    from,
                    reason: "query has no questions".to_string(),
                });
            }
            Disposition::NoAnswer { questions } => {
                self.diagnostics
                    .emit(&ResponderEvent::QueryReceived { from, questions });
            }
            Disposition::Answer { questions, answers } => {
                self.diagnostics
                    .emit(&ResponderEvent::QueryReceived { from, questions });
                self.send_response(answers, from).await;
            }
        }
    }

    async fn send_response(&self, answers: Vec<Record>, to: SocketAddr) {
        let count = answers.len();
        let packed = match build_response(answers) {
            Ok(packed) => packed,
            Err(e) => {
                self.diagnostics.emit(&ResponderEvent::ResponseFailed {
                    to,
                    error: e.to_string(),
                });
                return;
            }
        };

        match self.socket.send_to(&packed, to).await {
            Ok(_) => self
                .diagnostics
                .emit(&ResponderEvent::ResponseSent { to, answers: count }),
            Err(e) => self.diagnostics.emit(&ResponderEvent::ResponseFailed {
                to,
                error: e.to_string(),
            }),
        }
    }
}
