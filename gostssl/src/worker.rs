use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use pki_types::CertificateDer;

use crate::engine::{Engine, EngineProvider};
use crate::host_cache::HostStatusCache;
use crate::lock::ReentrantLock;
#[cfg(feature = "logging")]
use crate::log::{debug, trace, warn};
use crate::session::{NativeSession, SessionId};
use crate::status::HostStatus;

/// Binds one native session to its GOST engine handle.
pub(crate) struct Worker {
    session: SessionId,
    host_key: String,
    // Written only while the registry lock is held.
    status: Mutex<HostStatus>,
    engine: Mutex<Box<dyn Engine>>,
    staged_certificate: Mutex<Option<CertificateDer<'static>>>,
}

impl Worker {
    pub(crate) fn status(&self) -> HostStatus {
        *self.status.lock()
    }

    /// Exclusive access to the engine.  Calls on one session are serialized.
    pub(crate) fn engine(&self) -> MutexGuard<'_, Box<dyn Engine>> {
        self.engine.lock()
    }

    /// Keep `certificate` for the handshake step in progress.  The
    /// first certificate staged wins until it is taken.
    pub(crate) fn stage_certificate(&self, certificate: CertificateDer<'static>) {
        let mut slot = self.staged_certificate.lock();
        if slot.is_none() {
            *slot = Some(certificate);
        }
    }

    pub(crate) fn take_staged_certificate(&self) -> Option<CertificateDer<'static>> {
        self.staged_certificate.lock().take()
    }
}

impl core::fmt::Debug for Worker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Worker")
            .field("session", &self.session)
            .field("host_key", &self.host_key)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        trace!("closing engine for {:?}", self.session);
        self.engine.get_mut().close();
    }
}

/// `hostname:fingerprint`, with `*` standing in for either part.
pub(crate) fn host_key(hostname: Option<&str>, fingerprint: Option<&str>) -> String {
    let hostname = hostname
        .filter(|h| !h.is_empty())
        .unwrap_or("*");
    let fingerprint = fingerprint
        .filter(|f| !f.is_empty())
        .unwrap_or("*");
    format!("{}:{}", hostname, fingerprint)
}

struct Registry {
    workers: HashMap<SessionId, Arc<Worker>>,
    hosts: HostStatusCache,
}

/// Owns every live worker and the host status cache, both behind one
/// re-entrant lock.
pub(crate) struct WorkerRegistry {
    state: ReentrantLock<Registry>,
    provider: Arc<dyn EngineProvider>,
    max_probe_level: u8,
}

impl WorkerRegistry {
    pub(crate) fn new(provider: Arc<dyn EngineProvider>, max_probe_level: u8) -> Self {
        Self {
            state: ReentrantLock::new(Registry {
                workers: HashMap::new(),
                hosts: HostStatusCache::new(),
            }),
            provider,
            max_probe_level,
        }
    }

    pub(crate) fn provider(&self) -> &dyn EngineProvider {
        &*self.provider
    }

    /// Open an engine for `session` and register a worker for it,
    /// retiring any worker it had before.
    ///
    /// Returns `None` if no engine could be opened; the previous
    /// worker, if any, is then left in place.
    pub(crate) fn create(
        &self,
        session: &dyn NativeSession,
        fingerprint: Option<&str>,
    ) -> Option<Arc<Worker>> {
        let id = session.id();
        let mut engine = match self.provider.open() {
            Some(engine) => engine,
            None => {
                warn!("GOST engine unavailable; {:?} stays on the native stack", id);
                return None;
            }
        };

        if let Some(hostname) = session.hostname() {
            engine.set_hostname(hostname);
        }
        if let Some(fingerprint) = fingerprint {
            engine.set_cache_string(fingerprint);
        }
        let alpn = session.alpn_protocols();
        if !alpn.is_empty() {
            engine.set_alpn(alpn);
        }

        let host_key = host_key(session.hostname(), fingerprint);

        let guard = self.state.lock();
        let previous = guard.borrow_mut().workers.remove(&id);
        if let Some(previous) = previous {
            trace!("replacing existing worker for {:?}", id);
            self.retire(previous);
        }

        let status = guard.borrow_mut().hosts.get(&host_key);
        debug!("{:?} for {} starts at {:?}", id, host_key, status);

        let worker = Arc::new(Worker {
            session: id,
            host_key,
            status: Mutex::new(status),
            engine: Mutex::new(engine),
            staged_certificate: Mutex::new(None),
        });
        guard
            .borrow_mut()
            .workers
            .insert(id, Arc::clone(&worker));

        Some(worker)
    }

    pub(crate) fn find(&self, id: SessionId) -> Option<Arc<Worker>> {
        self.state
            .with(|r| r.workers.get(&id).cloned())
    }

    /// Retire and forget the worker for `id`, if there is one.
    pub(crate) fn remove(&self, id: SessionId) {
        let guard = self.state.lock();
        let worker = guard.borrow_mut().workers.remove(&id);
        if let Some(worker) = worker {
            self.retire(worker);
        }
    }

    /// Apply the teardown transition of a worker that has left the map.
    ///
    /// Callers may already hold the lock.  The engine is closed when the
    /// last reference to `worker` goes, which is here unless a call on
    /// that session is still in flight.
    fn retire(&self, worker: Arc<Worker>) {
        let guard = self.state.lock();
        let status = worker.status();
        if let Some(next) = status.after_teardown(self.max_probe_level) {
            debug!("{} leaves {:?} for {:?}", worker.host_key, status, next);
            guard
                .borrow_mut()
                .hosts
                .set(&worker.host_key, next);
        }
        drop(worker);
    }

    /// Set a worker's status and record it for its host in one step.
    pub(crate) fn record(&self, worker: &Worker, status: HostStatus) {
        let guard = self.state.lock();
        *worker.status.lock() = status;
        guard
            .borrow_mut()
            .hosts
            .set(&worker.host_key, status);
    }

    /// Record `status` for a host no session has settled yet.
    pub(crate) fn seed(&self, host_key: &str, status: HostStatus) -> bool {
        self.state
            .with(|r| r.hosts.set(host_key, status))
    }

    pub(crate) fn host_status(&self, host_key: &str) -> HostStatus {
        self.state.with(|r| r.hosts.get(host_key))
    }

    pub(crate) fn known_hosts(&self) -> usize {
        self.state.with(|r| r.hosts.len())
    }

    pub(crate) fn live_workers(&self) -> usize {
        self.state.with(|r| r.workers.len())
    }
}
