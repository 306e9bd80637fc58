use std::sync::Arc;

use pki_types::CertificateDer;

use crate::bridge;
use crate::cert_store::{self, CertificateStore, ClientCertificates};
use crate::client_auth::WorkerContext;
use crate::config::Config;
use crate::engine::{Engine, EngineContext, EngineProvider, VerifyOutcome};
use crate::enums::CipherSuite;
use crate::error::Error;
#[cfg(feature = "logging")]
use crate::log::{debug, trace, warn};
use crate::session::{NativeSession, SessionId, Want};
use crate::status::HostStatus;
use crate::worker::{Worker, WorkerRegistry};
use crate::x509;

/// Which implementation handled a dispatched call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Routed {
    /// Not handled here; the native stack must perform the call itself.
    Native,
    /// Handled by the GOST engine, with this return code in the native
    /// stack's vocabulary.  Codes `<= 0` are qualified by the `Want`
    /// already recorded on the session.
    Alternate(i32),
}

impl Routed {
    /// Whether the GOST engine handled the call.
    pub fn used_alternate(&self) -> bool {
        matches!(self, Self::Alternate(_))
    }
}

/// The native stack's verdict vocabulary for a server chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The engine did not handle this session; verify natively.
    NoOpinion,
    /// The engine trusts the chain.
    Trusted,
    /// The engine rejected the chain.
    Critical,
    /// An engine-specific status code, passed through.
    Other(u32),
}

/// `CERT_E_CRITICAL`
const CERT_E_CRITICAL: u32 = 0x800B_0105;

impl From<VerificationStatus> for u32 {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::NoOpinion => 0,
            VerificationStatus::Trusted => 1,
            VerificationStatus::Critical => CERT_E_CRITICAL,
            VerificationStatus::Other(code) => code,
        }
    }
}

/// Decides, per session, whether the native stack or the GOST engine
/// performs each TLS operation, and remembers per host what worked.
///
/// One `Dispatcher` is meant to live as long as the native stack that
/// uses it.  It is `Send + Sync`; calls may come from any thread.
///
/// # Call protocol
///
/// For each client connection the native stack calls
/// [`cache_fingerprint`](Self::cache_fingerprint) before its first
/// [`connect`](Self::connect), routes `connect`, `read`, `peek` and
/// `write` here first (performing the call itself when the answer is
/// [`Routed::Native`]), and calls [`free`](Self::free) when the
/// connection goes away.
///
/// Engine calls on one session are serialized.  A client certificate
/// callback run from inside `connect` may call
/// [`certificate_hook`](Self::certificate_hook), but must not call
/// `connect`, `read`, `peek`, `write` or `verification_status` for the
/// same session.
pub struct Dispatcher {
    registry: WorkerRegistry,
    config: Config,
}

impl Dispatcher {
    /// Make a dispatcher that opens engines through `provider`.
    pub fn new(provider: Arc<dyn EngineProvider>, config: Config) -> Self {
        Self {
            registry: WorkerRegistry::new(provider, config.max_probe_level),
            config,
        }
    }

    /// Check that GOST sessions can work at all: an engine opens, the
    /// vendor crypto provider is present, and the native stack knows
    /// both GOST suites (`native_ciphers`).
    pub fn init(&self, native_ciphers: &[CipherSuite]) -> bool {
        let provider = self.registry.provider();

        match provider.open() {
            Some(mut engine) => engine.close(),
            None => {
                warn!("GOST engine cannot be opened");
                return false;
            }
        }

        if !provider.crypto_provider_available() {
            warn!("GOST crypto provider unavailable");
            return false;
        }

        for suite in CipherSuite::GOST.iter() {
            if !native_ciphers.contains(suite) {
                warn!("native stack lacks {:?}", suite);
                return false;
            }
        }

        debug!("GOST support ready");
        true
    }

    /// Opt `session` into GOST routing, replacing any earlier worker.
    ///
    /// `fingerprint` is the session resumption identifier; its hex form
    /// is the engine's cache string and part of the host key.  Returns
    /// false if no engine could be opened, in which case the session
    /// stays on the native stack.
    pub fn cache_fingerprint(&self, session: &dyn NativeSession, fingerprint: &[u8]) -> bool {
        let fingerprint = (!fingerprint.is_empty()).then(|| hex::encode_upper(fingerprint));
        self.registry
            .create(session, fingerprint.as_deref())
            .is_some()
    }

    /// Drive the handshake, if this session's host calls for the engine.
    pub fn connect(&self, session: &dyn NativeSession) -> Routed {
        let Some(worker) = self.registry.find(session.id()) else {
            return Routed::Native;
        };

        let status = worker.status();
        if !status.routes_handshake() {
            trace!("{:?} handshakes natively ({:?})", session.id(), status);
            return Routed::Native;
        }

        let mut engine = worker.engine();
        let ret = engine.connect(&mut WorkerContext {
            session,
            worker: &worker,
        });
        if ret != 1 {
            return Routed::Alternate(pending(session, &**engine, ret));
        }

        session.set_want(Want::Nothing);
        #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
        let result = match bridge::negotiated_result(&**engine, &self.config.fallback_alpn) {
            Ok(result) => result,
            Err(err) => {
                warn!("GOST handshake on {:?} unusable: {}", session.id(), err);
                return Routed::Alternate(0);
            }
        };
        drop(engine);

        debug!(
            "{:?} negotiated {:?} {:?} via the engine",
            session.id(),
            result.version,
            result.cipher_suite
        );
        self.registry.record(&worker, HostStatus::Yes);

        #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
        let ret = match bridge::deliver(session, &result) {
            Ok(()) => 1,
            Err(err) => {
                warn!("{:?}: {}", session.id(), err);
                -1
            }
        };
        Routed::Alternate(ret)
    }

    /// Read application data, if this session's handshake used the engine.
    pub fn read(&self, session: &dyn NativeSession, buf: &mut [u8]) -> Routed {
        self.with_io_engine(session, |engine, cx| engine.read(cx, buf))
    }

    /// As [`read`](Self::read), leaving the data buffered.
    pub fn peek(&self, session: &dyn NativeSession, buf: &mut [u8]) -> Routed {
        self.with_io_engine(session, |engine, cx| engine.peek(cx, buf))
    }

    /// Write application data, if this session's handshake used the engine.
    pub fn write(&self, session: &dyn NativeSession, buf: &[u8]) -> Routed {
        self.with_io_engine(session, |engine, cx| engine.write(cx, buf))
    }

    fn with_io_engine(
        &self,
        session: &dyn NativeSession,
        f: impl FnOnce(&mut dyn Engine, &mut dyn EngineContext) -> i32,
    ) -> Routed {
        let Some(worker) = self.registry.find(session.id()) else {
            return Routed::Native;
        };
        if !worker.status().routes_io() {
            return Routed::Native;
        }

        let mut engine = worker.engine();
        let ret = f(
            &mut **engine,
            &mut WorkerContext {
                session,
                worker: &worker,
            },
        );
        Routed::Alternate(pending(session, &**engine, ret))
    }

    /// Forget `session`.  Safe to call for sessions never seen, and at
    /// any point of a connection's life.
    pub fn free(&self, session: SessionId) {
        self.registry.remove(session);
    }

    /// The native stack negotiated a suite on its own; check it did not
    /// pick a GOST one it cannot actually carry.
    ///
    /// When it did, the host starts probing and
    /// [`Error::GostRequired`] tells the caller to abort this
    /// connection.  The retry handshakes through the engine.
    pub fn tls_gost_required(&self, session: &dyn NativeSession) -> Result<(), Error> {
        let Some(worker) = self.registry.find(session.id()) else {
            return Ok(());
        };
        let Some(suite) = session
            .pending_cipher()
            .filter(CipherSuite::is_gost)
        else {
            return Ok(());
        };
        if worker.status().routes_handshake() {
            return Ok(());
        }

        debug!(
            "{:?} negotiated {:?} natively; probing {:?}",
            session.id(),
            suite,
            worker
        );
        self.registry
            .record(&worker, HostStatus::Probing(0));
        Err(Error::GostRequired(suite))
    }

    /// Publish the client certificate chosen by the native certificate
    /// callback for `session`'s handshake in progress.
    pub fn certificate_hook(&self, session: SessionId, certificate: CertificateDer<'static>) {
        match self.registry.find(session) {
            Some(worker) => worker.stage_certificate(certificate),
            None => trace!("certificate for unknown {:?} dropped", session),
        }
    }

    /// The engine's verdict on the server chain of `session`.
    pub fn verification_status(&self, session: SessionId) -> VerificationStatus {
        let Some(worker) = self.registry.find(session) else {
            return VerificationStatus::NoOpinion;
        };
        if !worker.status().routes_io() {
            return VerificationStatus::NoOpinion;
        }

        let outcome = worker.engine().verify();
        match outcome {
            VerifyOutcome::Ok => VerificationStatus::Trusted,
            VerifyOutcome::Error => VerificationStatus::Critical,
            VerifyOutcome::Other(code) => VerificationStatus::Other(code),
        }
    }

    /// Whether `der` is a certificate signed with a GOST algorithm.
    pub fn is_gost_certificate(der: &[u8]) -> bool {
        x509::classify_certificate(der)
    }

    /// Certificates in `store` usable for GOST client authentication.
    pub fn client_certificates(store: &dyn CertificateStore) -> ClientCertificates {
        cert_store::client_certificates(store)
    }

    /// What is known about `host_key` (`hostname:FINGERPRINT`).
    pub fn host_status(&self, host_key: &str) -> HostStatus {
        self.registry.host_status(host_key)
    }

    /// Record what is already known about `host_key`, for example hosts
    /// that must never be handed to the engine (`HostStatus::No`).
    ///
    /// Returns false if the host has already settled on `Yes` or `No`;
    /// settled entries never change.  Sessions created afterwards start
    /// from the new status.
    pub fn set_host_status(&self, host_key: &str, status: HostStatus) -> bool {
        self.registry.seed(host_key, status)
    }

    /// The current status of `session`, if it has a worker.
    pub fn session_status(&self, session: SessionId) -> Option<HostStatus> {
        self.registry
            .find(session)
            .map(|worker| worker.status())
    }

    /// How many hosts have a recorded status.
    pub fn known_hosts(&self) -> usize {
        self.registry.known_hosts()
    }

    /// How many sessions currently have a worker.
    pub fn live_sessions(&self) -> usize {
        self.registry.live_workers()
    }
}

/// Record on `session` what the engine is waiting for; pass `ret` through.
fn pending(session: &dyn NativeSession, engine: &dyn Engine, ret: i32) -> i32 {
    session.set_want(engine.state().want());
    ret
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("live_sessions", &self.live_sessions())
            .finish()
    }
}

#[allow(dead_code)]
fn assert_send_sync() {
    fn check<T: Send + Sync>() {}
    check::<Dispatcher>();
    check::<Worker>();
}
