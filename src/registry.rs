//! In-memory registry of advertised services.
//!
//! Each live hostname owns exactly one precomputed resource record. The
//! record is built before anything is inserted, so a failed build leaves the
//! registry untouched.

use hickory_proto::rr::{LowerName, Record, RecordType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::error::RecordError;
use crate::record::{build_service_record, parse_hostname};

/// A hostname advertised with a single address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Service {
    /// Fully-qualified hostname, e.g. `example.local.`.
    pub hostname: String,
    /// Address returned for the hostname.
    pub address: IpAddr,
}

impl Service {
    /// Create a service from a hostname and address.
    pub fn new(hostname: impl Into<String>, address: IpAddr) -> Self {
        Self {
            hostname: hostname.into(),
            address,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.hostname, self.address)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    service: Service,
    record: Record,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The service that was live under the same hostname before, if any.
    pub replaced: Option<Service>,
}

/// Hostname-keyed service table.
#[derive(Debug, Default)]
pub struct Registry {
    /// lowercased name -> service and its record
    entries: HashMap<LowerName, Entry>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the record for `service` and insert it, replacing any entry for
    /// the same hostname.
    pub fn register(&mut self, service: Service, ttl: u32) -> Result<Registration, RecordError> {
        let record = build_service_record(&service, ttl)?;
        let key = LowerName::new(record.name());

        let replaced = self
            .entries
            .insert(key, Entry { service, record })
            .map(|old| old.service);

        Ok(Registration { replaced })
    }

    /// Remove the service registered under `hostname`.
    ///
    /// Returns `None` when nothing is registered or the hostname does not parse.
    pub fn unregister(&mut self, hostname: &str) -> Option<Service> {
        let name = parse_hostname(hostname).ok()?;
        self.entries
            .remove(&LowerName::new(&name))
            .map(|entry| entry.service)
    }

    /// Find the record answering a question for `name` with type `rtype`.
    pub fn lookup(&self, name: &LowerName, rtype: RecordType) -> Option<&Record> {
        self.entries
            .get(name)
            .map(|entry| &entry.record)
            .filter(|record| record.record_type() == rtype)
    }

    /// Get the service registered under `hostname`.
    pub fn get(&self, hostname: &str) -> Option<&Service> {
        let name = parse_hostname(hostname).ok()?;
        self.entries
            .get(&LowerName::new(&name))
            .map(|entry| &entry.service)
    }

    /// Remove every entry, returning the services that were live.
    pub fn drain(&mut self) -> Vec<Service> {
        self.entries.drain().map(|(_, entry)| entry.service).collect()
    }

    /// Snapshot of all live services.
    pub fn services(&self) -> Vec<Service> {
        self.entries.values().map(|e| e.service.clone()).collect()
    }

    /// Number of live services.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry shared between the operational loop (writer) and the listener
/// (reader).
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    /// Create an empty shared registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access.
    pub fn write<T>(&self, f: impl FnOnce(&mut Registry) -> T) -> T {
        f(&mut self.inner.write())
    }

    /// Run `f` with shared access.
    pub fn read<T>(&self, f: impl FnOnce(&Registry) -> T) -> T {
        f(&self.inner.read())
    }

    /// Number of live services.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Snapshot of all live services.
    pub fn services(&self) -> Vec<Service> {
        self.inner.read().services()
    }
}
