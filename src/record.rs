//! Resource record construction and DNS message packing.
//!
//! Every record produced here is an `IN` class A or AAAA record with the mDNS
//! cache-flush bit set. A TTL of zero turns the record into a goodbye.

use hickory_proto::op::{Message, MessageType, OpCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{DNSClass, Name, RData, Record};
use std::net::IpAddr;

use crate::error::{MdnsError, RecordError};
use crate::registry::Service;

/// Default TTL for answers, in seconds.
pub const DEFAULT_TTL: u32 = 120;

/// TTL that marks a record as withdrawn.
pub const GOODBYE_TTL: u32 = 0;

/// Parse a hostname into a fully-qualified DNS name.
pub fn parse_hostname(hostname: &str) -> Result<Name, RecordError> {
    let name = Name::from_ascii(hostname).map_err(|e| RecordError::InvalidHostname {
        hostname: hostname.to_string(),
        reason: e.to_string(),
    })?;

    if name.is_root() {
        return Err(RecordError::InvalidHostname {
            hostname: hostname.to_string(),
            reason: "hostname has no labels".to_string(),
        });
    }

    if !name.is_fqdn() {
        return Err(RecordError::InvalidHostname {
            hostname: hostname.to_string(),
            reason: "hostname must end with '.'".to_string(),
        });
    }

    Ok(name)
}

/// Build the A or AAAA record advertising `service` with the given TTL.
pub fn build_service_record(service: &Service, ttl: u32) -> Result<Record, RecordError> {
    let name = parse_hostname(&service.hostname)?;

    if service.address.is_unspecified() {
        return Err(RecordError::UnsupportedAddressFamily(service.address));
    }

    let rdata = match service.address {
        IpAddr::V4(v4) => RData::A(A::from(v4)),
        IpAddr::V6(v6) => RData::AAAA(AAAA::from(v6)),
    };

    let mut record = Record::from_rdata(name, ttl, rdata);
    record.set_dns_class(DNSClass::IN);
    record.set_mdns_cache_flush(true);
    Ok(record)
}

/// Pack answers into an authoritative mDNS response.
pub fn build_response(answers: impl IntoIterator<Item = Record>) -> Result<Vec<u8>, MdnsError> {
    let mut msg = Message::new();
    msg.set_id(0)
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_authoritative(true);
    msg.add_answers(answers);

    msg.to_vec().map_err(MdnsError::MessagePack)
}

/// Pack a goodbye (TTL 0) announcement for `service`.
pub fn build_goodbye(service: &Service) -> Result<Vec<u8>, MdnsError> {
    let record = build_service_record(service, GOODBYE_TTL)?;
    build_response([record])
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::RecordType;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn service(hostname: &str, address: &str) -> Service {
        Service::new(hostname, address.parse().unwrap())
    }

    #[test]
    fn test_ipv4_builds_a_record() {
        let record = build_service_record(&service("foo.local.", "192.168.1.10"), 120).unwrap();

        assert_eq!(record.record_type(), RecordType::A);
        assert_eq!(record.ttl(), 120);
        assert_eq!(record.dns_class(), DNSClass::IN);
        assert!(record.mdns_cache_flush());
        assert_eq!(record.name().to_ascii(), "foo.local.");
        assert_eq!(
            record.data(),
            Some(&RData::A(A::from(Ipv4Addr::new(192, 168, 1, 10))))
        );
    }

    #[test]
    fn test_ipv6_builds_aaaa_record() {
        let record = build_service_record(&service("foo.local.", "fd00::1"), 120).unwrap();

        assert_eq!(record.record_type(), RecordType::AAAA);
        assert!(record.mdns_cache_flush());
        assert_eq!(
            record.data(),
            Some(&RData::AAAA(AAAA::from("fd00::1".parse::<Ipv6Addr>().unwrap())))
        );
    }

    #[test]
    fn test_goodbye_ttl_is_zero() {
        let record = build_service_record(&service("foo.local.", "10.0.0.1"), GOODBYE_TTL).unwrap();
        assert_eq!(record.ttl(), 0);
    }

    #[test]
    fn test_unspecified_address_rejected() {
        let err = build_service_record(&service("foo.local.", "0.0.0.0"), 120).unwrap_err();
        assert!(matches!(err, RecordError::UnsupportedAddressFamily(_)));

        let err = build_service_record(&service("foo.local.", "::"), 120).unwrap_err();
        assert!(matches!(err, RecordError::UnsupportedAddressFamily(_)));
    }

    #[test]
    fn test_relative_hostname_rejected() {
        let err = build_service_record(&service("foo.local", "10.0.0.1"), 120).unwrap_err();
        assert!(matches!(err, RecordError::InvalidHostname { .. }));
    }

    #[test]
    fn test_malformed_hostname_rejected() {
        let long_label = format!("{}.local.", "a".repeat(64));
        let err = build_service_record(&service(&long_label, "10.0.0.1"), 120).unwrap_err();
        assert!(matches!(err, RecordError::InvalidHostname { .. }));

        let err = build_service_record(&service(".", "10.0.0.1"), 120).unwrap_err();
        assert!(matches!(err, RecordError::InvalidHostname { .. }));
    }

    #[test]
    fn test_response_header_and_cache_flush_on_wire() {
        let record = build_service_record(&service("foo.local.", "10.0.0.1"), 120).unwrap();
        let bytes = build_response([record]).unwrap();

        // class field of the single answer: after header(12) + name(11) + type(2)
        assert_eq!(&bytes[25..27], &[0x80, 0x01]);

        let msg = Message::from_vec(&bytes).unwrap();
        assert_eq!(msg.message_type(), MessageType::Response);
        assert!(msg.authoritative());
        assert_eq!(msg.id(), 0);
        assert_eq!(msg.answers().len(), 1);
        assert!(msg.answers()[0].mdns_cache_flush());
    }

    #[test]
    fn test_goodbye_message() {
        let bytes = build_goodbye(&service("bar.local.", "fd00::2")).unwrap();
        let msg = Message::from_vec(&bytes).unwrap();

        assert_eq!(msg.answers().len(), 1);
        let answer = &msg.answers()[0];
        assert_eq!(answer.ttl(), 0);
        assert_eq!(answer.record_type(), RecordType::AAAA);
        assert_eq!(answer.name().to_ascii(), "bar.local.");
    }
}
