//! Metrics instrumentation for mdns-responder.
//!
//! All metrics are prefixed with `mdns_responder.`

use metrics::{counter, gauge};

use crate::diagnostics::ResponderEvent;

/// Record the metric side of a responder event.
pub fn record_event(event: &ResponderEvent) {
    match event {
        ResponderEvent::Registered { replaced, .. } => {
            if replaced.is_some() {
                record_registration("replaced");
            } else {
                record_registration("new");
                gauge!("mdns_responder.services.count").increment(1.0);
            }
        }
        ResponderEvent::RegistrationRejected { .. } => record_registration("rejected"),
        ResponderEvent::Unregistered { .. } => {
            counter!("mdns_responder.unregistration.count", "result" => "removed").increment(1);
            gauge!("mdns_responder.services.count").decrement(1.0);
        }
        ResponderEvent::UnknownService { .. } => {
            counter!("mdns_responder.unregistration.count", "result" => "unknown").increment(1);
        }
        ResponderEvent::GoodbyeSent { reason, .. } => {
            counter!("mdns_responder.goodbye.count", "reason" => reason.as_str()).increment(1);
        }
        ResponderEvent::GoodbyeFailed { .. } => {
            counter!("mdns_responder.goodbye.failed.count").increment(1);
        }
        ResponderEvent::QueryReceived { .. } => {
            counter!("mdns_responder.query.count").increment(1);
        }
        ResponderEvent::ResponseSent { answers, .. } => {
            counter!("mdns_responder.response.count").increment(1);
            counter!("mdns_responder.response.answers").increment(*answers as u64);
        }
        ResponderEvent::ResponseFailed { .. } => {
            counter!("mdns_responder.response.failed.count").increment(1);
        }
        ResponderEvent::PacketDropped { .. } => {
            counter!("mdns_responder.packet.dropped.count").increment(1);
        }
        ResponderEvent::ReadFailed { .. } => {
            counter!("mdns_responder.read.failed.count").increment(1);
        }
        ResponderEvent::ShutdownStarted { discarded, .. } => {
            counter!("mdns_responder.operation.discarded.count").increment(*discarded as u64);
        }
        ResponderEvent::Stopped => {
            gauge!("mdns_responder.services.count").set(0.0);
        }
        ResponderEvent::Started { .. } => {}
    }
}

fn record_registration(result: &'static str) {
    counter!("mdns_responder.registration.count", "result" => result).increment(1);
}
