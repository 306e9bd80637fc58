#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
pub use std::sync::Arc;
use std::sync::Mutex;

use gostssl::pki_types::CertificateDer;
use gostssl::{
    CipherInfo, CipherSuite, ClientCertExchange, Config, DistinguishedName, Dispatcher, Engine,
    EngineContext, EngineProvider, EngineState, NativeSession, NegotiatedResult, SessionId,
    VerifyOutcome, Want,
};

pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .try_init();
}

pub const GOST_2012_SIGNATURE: &[u8] = &[0x2a, 0x85, 0x03, 0x07, 0x01, 0x01, 0x03, 0x02];
pub const GOST_2001_SIGNATURE: &[u8] = &[0x2a, 0x85, 0x03, 0x02, 0x02, 0x03];
pub const GOST_2012_KEY: &[u8] = &[0x2a, 0x85, 0x03, 0x07, 0x01, 0x01, 0x01, 0x01];
pub const GOST_2001_KEY: &[u8] = &[0x2a, 0x85, 0x03, 0x02, 0x02, 0x13];
pub const RSA_SHA256: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];
pub const RSA_KEY: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

pub const GOST_2012_SUITE: CipherSuite = CipherSuite::TLS_GOSTR341112_256_WITH_28147_CNT_IMIT;
pub const GOST_2001_SUITE: CipherSuite = CipherSuite::TLS_GOSTR341001_WITH_28147_CNT_IMIT;

fn asn1_wrap(tag: u8, bytes: &[u8]) -> Vec<u8> {
    let len = bytes.len();
    let mut ret = vec![tag];
    if len <= 0x7f {
        ret.push(len as u8);
    } else if len <= 0xff {
        ret.extend([0x81, len as u8]);
    } else {
        ret.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    ret.extend_from_slice(bytes);
    ret
}

fn algorithm(oid: &[u8]) -> Vec<u8> {
    asn1_wrap(0x30, &asn1_wrap(0x06, oid))
}

/// A structurally valid X.509 certificate with the given algorithms.
/// Nothing in it would verify.
pub fn certificate(signature_oid: &[u8], key_oid: &[u8]) -> CertificateDer<'static> {
    certificate_with_serial(0x2a, signature_oid, key_oid)
}

fn certificate_with_serial(serial: u8, signature_oid: &[u8], key_oid: &[u8]) -> CertificateDer<'static> {
    let name = asn1_wrap(0x30, &asn1_wrap(0x31, &[]));

    let mut tbs = asn1_wrap(0xa0, &[0x02, 0x01, 0x02]);
    tbs.extend(asn1_wrap(0x02, &[serial & 0x7f]));
    tbs.extend(algorithm(signature_oid));
    tbs.extend(name.clone());
    tbs.extend(asn1_wrap(0x30, &[]));
    tbs.extend(name);
    let mut spki = algorithm(key_oid);
    spki.extend(asn1_wrap(0x03, &[0u8; 65]));
    tbs.extend(asn1_wrap(0x30, &spki));

    let mut cert = asn1_wrap(0x30, &tbs);
    cert.extend(algorithm(signature_oid));
    cert.extend(asn1_wrap(0x03, &[0u8; 65]));
    CertificateDer::from(asn1_wrap(0x30, &cert))
}

pub fn gost_server_certificate() -> CertificateDer<'static> {
    certificate(GOST_2012_SIGNATURE, GOST_2012_KEY)
}

pub fn client_certificate(serial: u8) -> CertificateDer<'static> {
    certificate_with_serial(serial, GOST_2012_SIGNATURE, GOST_2012_KEY)
}

/// How every engine opened by a [`MockProvider`] behaves.
#[derive(Clone, Debug)]
pub struct Script {
    /// Results of the first `connect` calls, in order.  Once these run
    /// out `connect` succeeds.
    pub connect: Vec<(i32, EngineState)>,
    pub request_client_cert: bool,
    pub issuers: Option<Vec<DistinguishedName>>,
    pub alpn: Option<Vec<u8>>,
    pub cipher_info: Option<CipherInfo>,
    pub peer_certificates: Option<Vec<CertificateDer<'static>>>,
    pub verify: VerifyOutcome,
    pub app_data: Vec<u8>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            connect: Vec::new(),
            request_client_cert: false,
            issuers: Some(vec![DistinguishedName::from(vec![0x30, 0x00])]),
            alpn: Some(b"h2".to_vec()),
            cipher_info: Some(CipherInfo {
                protocol: 0x303,
                cipher_suite: 0xff85,
            }),
            peer_certificates: Some(vec![gost_server_certificate()]),
            verify: VerifyOutcome::Ok,
            app_data: b"hello".to_vec(),
        }
    }
}

/// What engines have been asked to do, across every engine a provider
/// opened.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub opened: usize,
    pub closed: usize,
    pub hostnames: Vec<String>,
    pub cache_strings: Vec<String>,
    pub alpn_offers: Vec<Vec<Vec<u8>>>,
    pub connects: usize,
    pub client_certificates: Vec<CertificateDer<'static>>,
    pub written: Vec<u8>,
}

pub struct MockProvider {
    pub available: AtomicBool,
    pub crypto_available: AtomicBool,
    pub script: Mutex<Script>,
    pub log: Arc<Mutex<EngineLog>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Self::with_script(Script::default())
    }

    pub fn with_script(script: Script) -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(true),
            crypto_available: AtomicBool::new(true),
            script: Mutex::new(script),
            log: Arc::new(Mutex::new(EngineLog::default())),
        })
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, EngineLog> {
        self.log.lock().unwrap()
    }
}

impl EngineProvider for MockProvider {
    fn open(&self) -> Option<Box<dyn Engine>> {
        if !self.available.load(Ordering::SeqCst) {
            return None;
        }
        self.log.lock().unwrap().opened += 1;
        let script = self.script.lock().unwrap().clone();
        Some(Box::new(MockEngine {
            pending: script.connect.iter().copied().collect(),
            app_data: script.app_data.clone(),
            script,
            state: EngineState::NONE,
            closed: false,
            log: Arc::clone(&self.log),
        }))
    }

    fn crypto_provider_available(&self) -> bool {
        self.crypto_available.load(Ordering::SeqCst)
    }
}

pub struct MockEngine {
    script: Script,
    pending: VecDeque<(i32, EngineState)>,
    app_data: Vec<u8>,
    state: EngineState,
    closed: bool,
    log: Arc<Mutex<EngineLog>>,
}

impl ClientCertExchange for MockEngine {
    fn issuer_list(&mut self) -> Option<Vec<DistinguishedName>> {
        self.script.issuers.clone()
    }

    fn set_client_certificate(&mut self, certificate: &CertificateDer<'_>) -> bool {
        self.log
            .lock()
            .unwrap()
            .client_certificates
            .push(certificate.clone().into_owned());
        true
    }
}

impl Engine for MockEngine {
    fn set_hostname(&mut self, hostname: &str) {
        self.log
            .lock()
            .unwrap()
            .hostnames
            .push(hostname.to_owned());
    }

    fn set_cache_string(&mut self, cache_string: &str) {
        self.log
            .lock()
            .unwrap()
            .cache_strings
            .push(cache_string.to_owned());
    }

    fn set_alpn(&mut self, protocols: &[Vec<u8>]) {
        self.log
            .lock()
            .unwrap()
            .alpn_offers
            .push(protocols.to_vec());
    }

    fn connect(&mut self, cx: &mut dyn EngineContext) -> i32 {
        self.log.lock().unwrap().connects += 1;
        // a handshake record for the transport
        cx.write(&[0x16, 0x03, 0x01]);

        if let Some((ret, state)) = self.pending.pop_front() {
            self.state = state;
            return ret;
        }

        if self.script.request_client_cert {
            let ret = cx.certificate_request(self);
            if ret <= 0 {
                self.state = EngineState::X509_LOOKUP;
                return ret;
            }
        }

        self.state = EngineState::NONE;
        1
    }

    fn read(&mut self, cx: &mut dyn EngineContext, buf: &mut [u8]) -> i32 {
        let n = self.peek(cx, buf);
        if n > 0 {
            self.app_data.drain(..n as usize);
        }
        n
    }

    fn peek(&mut self, _cx: &mut dyn EngineContext, buf: &mut [u8]) -> i32 {
        if self.app_data.is_empty() {
            self.state = EngineState::READING;
            return -1;
        }
        let n = buf.len().min(self.app_data.len());
        buf[..n].copy_from_slice(&self.app_data[..n]);
        self.state = EngineState::NONE;
        n as i32
    }

    fn write(&mut self, cx: &mut dyn EngineContext, buf: &[u8]) -> i32 {
        self.log
            .lock()
            .unwrap()
            .written
            .extend_from_slice(buf);
        self.state = EngineState::NONE;
        cx.write(buf)
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn alpn(&self) -> Option<Vec<u8>> {
        self.script.alpn.clone()
    }

    fn cipher_info(&self) -> Option<CipherInfo> {
        self.script.cipher_info
    }

    fn peer_certificates(&self) -> Option<Vec<CertificateDer<'static>>> {
        self.script.peer_certificates.clone()
    }

    fn verify(&self) -> VerifyOutcome {
        self.script.verify
    }

    fn close(&mut self) {
        assert!(!self.closed, "engine closed twice");
        self.closed = true;
        self.log.lock().unwrap().closed += 1;
    }
}

type CertCallback = Box<dyn Fn(SessionId) -> i32>;

pub struct MockSession {
    pub id: SessionId,
    pub hostname: Option<String>,
    pub alpn: Vec<Vec<u8>>,
    pub pending_cipher: Mutex<Option<CipherSuite>>,
    pub want: Mutex<Option<Want>>,
    pub connected: Mutex<Option<NegotiatedResult>>,
    pub accept_result: bool,
    pub ca_names: Mutex<Option<Vec<DistinguishedName>>>,
    pub ca_names_set: AtomicUsize,
    pub callback: Option<CertCallback>,
    pub callback_runs: AtomicUsize,
    pub transport_out: Mutex<Vec<u8>>,
}

impl MockSession {
    pub fn new(id: u64, hostname: &str) -> Self {
        Self {
            id: SessionId(id),
            hostname: (!hostname.is_empty()).then(|| hostname.to_owned()),
            alpn: vec![b"h2".to_vec(), b"http/1.1".to_vec()],
            pending_cipher: Mutex::new(None),
            want: Mutex::new(None),
            connected: Mutex::new(None),
            accept_result: true,
            ca_names: Mutex::new(None),
            ca_names_set: AtomicUsize::new(0),
            callback: None,
            callback_runs: AtomicUsize::new(0),
            transport_out: Mutex::new(Vec::new()),
        }
    }

    pub fn with_callback(mut self, callback: impl Fn(SessionId) -> i32 + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn negotiating(self, suite: CipherSuite) -> Self {
        *self.pending_cipher.lock().unwrap() = Some(suite);
        self
    }

    pub fn want(&self) -> Option<Want> {
        *self.want.lock().unwrap()
    }

    pub fn connected(&self) -> Option<NegotiatedResult> {
        self.connected.lock().unwrap().clone()
    }
}

impl NativeSession for MockSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    fn alpn_protocols(&self) -> &[Vec<u8>] {
        &self.alpn
    }

    fn transport_read(&self, _buf: &mut [u8]) -> i32 {
        -1
    }

    fn transport_write(&self, buf: &[u8]) -> i32 {
        self.transport_out
            .lock()
            .unwrap()
            .extend_from_slice(buf);
        buf.len() as i32
    }

    fn set_want(&self, want: Want) {
        *self.want.lock().unwrap() = Some(want);
    }

    fn pending_cipher(&self) -> Option<CipherSuite> {
        *self.pending_cipher.lock().unwrap()
    }

    fn has_client_cert_callback(&self) -> bool {
        self.callback.is_some()
    }

    fn has_ca_names(&self) -> bool {
        self.ca_names.lock().unwrap().is_some()
    }

    fn set_ca_names(&self, names: &[DistinguishedName]) {
        self.ca_names_set
            .fetch_add(1, Ordering::SeqCst);
        *self.ca_names.lock().unwrap() = Some(names.to_vec());
    }

    fn run_client_cert_callback(&self) -> i32 {
        self.callback_runs
            .fetch_add(1, Ordering::SeqCst);
        match &self.callback {
            Some(callback) => callback(self.id),
            None => 1,
        }
    }

    fn set_connected(&self, result: &NegotiatedResult) -> bool {
        *self.connected.lock().unwrap() = Some(result.clone());
        self.accept_result
    }
}

pub fn make_dispatcher(provider: &Arc<MockProvider>) -> Dispatcher {
    make_dispatcher_with_config(provider, Config::default())
}

pub fn make_dispatcher_with_config(provider: &Arc<MockProvider>, config: Config) -> Dispatcher {
    init_logging();
    Dispatcher::new(Arc::clone(provider) as Arc<dyn EngineProvider>, config)
}

/// Drive one native session into a GOST suite so that `hostname`'s
/// cache entry starts probing.
pub fn start_probing(dispatcher: &Dispatcher, id: u64, hostname: &str, fingerprint: &[u8]) {
    let session = MockSession::new(id, hostname).negotiating(GOST_2012_SUITE);
    assert!(dispatcher.cache_fingerprint(&session, fingerprint));
    assert!(dispatcher
        .tls_gost_required(&session)
        .is_err());
    dispatcher.free(session.id);
}
