use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[cfg(feature = "logging")]
use crate::log::debug;
use crate::status::HostStatus;

/// Negotiation outcomes keyed by host key, kept for the life of the
/// owning `Dispatcher`.
///
/// Entries are never evicted; an evicted host would read as `Auto` again.
#[derive(Debug, Default)]
pub(crate) struct HostStatusCache {
    hosts: HashMap<String, HostStatus>,
}

impl HostStatusCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, host_key: &str) -> HostStatus {
        self.hosts
            .get(host_key)
            .copied()
            .unwrap_or_default()
    }

    /// Records `status` unless the host has already settled.
    ///
    /// Returns whether the stored value is now `status`.
    pub(crate) fn set(&mut self, host_key: &str, status: HostStatus) -> bool {
        match self.hosts.entry(host_key.to_owned()) {
            Entry::Occupied(mut e) => {
                let current = *e.get();
                if current.is_settled() {
                    if current != status {
                        debug!(
                            "{} is settled at {:?}; not recording {:?}",
                            host_key, current, status
                        );
                    }
                    return current == status;
                }
                e.insert(status);
            }
            Entry::Vacant(e) => {
                e.insert(status);
            }
        }

        debug!("{} is now {:?}", host_key, status);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.hosts.len()
    }
}
