use core::fmt;
use core::ops::BitOr;

use pki_types::CertificateDer;

use crate::session::{DistinguishedName, Want};

/// Opens handles to the GOST engine.
pub trait EngineProvider: Send + Sync {
    /// Open a fresh engine handle, or `None` if the engine is unavailable.
    fn open(&self) -> Option<Box<dyn Engine>>;

    /// Whether the vendor's GOST cryptographic provider can be used.
    fn crypto_provider_available(&self) -> bool;
}

/// The client certificate half of an engine, handed to
/// [`EngineContext::certificate_request`] while a handshake is running.
pub trait ClientCertExchange {
    /// The issuers the server will accept, if it sent any.
    fn issuer_list(&mut self) -> Option<Vec<DistinguishedName>>;

    /// Use `certificate` (with its private key, which the engine
    /// locates itself) to authenticate.  Returns false on failure.
    fn set_client_certificate(&mut self, certificate: &CertificateDer<'_>) -> bool;
}

/// One handle to the GOST engine, exclusively owned by a worker.
///
/// Return codes follow the native stack: `1` is success for `connect`,
/// a positive count for I/O, anything else is pending or failure and
/// is qualified by [`Engine::state`].
pub trait Engine: ClientCertExchange + Send {
    /// Server name for SNI and certificate checks.
    fn set_hostname(&mut self, hostname: &str);

    /// Session resumption hint derived from the caller's fingerprint.
    fn set_cache_string(&mut self, cache_string: &str);

    /// ALPN protocols to offer.
    fn set_alpn(&mut self, protocols: &[Vec<u8>]);

    /// Advance the handshake.
    fn connect(&mut self, cx: &mut dyn EngineContext) -> i32;

    /// Read decrypted application data.
    fn read(&mut self, cx: &mut dyn EngineContext, buf: &mut [u8]) -> i32;

    /// As `read`, but leaves the data buffered.
    fn peek(&mut self, cx: &mut dyn EngineContext, buf: &mut [u8]) -> i32;

    /// Encrypt and send application data.
    fn write(&mut self, cx: &mut dyn EngineContext, buf: &[u8]) -> i32;

    /// Flags describing the last operation.
    fn state(&self) -> EngineState;

    /// The negotiated application protocol.
    fn alpn(&self) -> Option<Vec<u8>>;

    /// Protocol and suite of the completed handshake.
    fn cipher_info(&self) -> Option<CipherInfo>;

    /// The server's chain, leaf first.
    fn peer_certificates(&self) -> Option<Vec<CertificateDer<'static>>>;

    /// The engine's own verdict on the server's chain.
    fn verify(&self) -> VerifyOutcome;

    /// Release the handle.  Called exactly once.
    fn close(&mut self);
}

/// Services the engine needs from the native side while it runs.
pub trait EngineContext {
    /// Read raw transport bytes.
    fn read(&mut self, buf: &mut [u8]) -> i32;

    /// Write raw transport bytes.
    fn write(&mut self, buf: &[u8]) -> i32;

    /// The server asked for a client certificate.  Returns `<= 0` to
    /// suspend or fail the handshake.
    fn certificate_request(&mut self, exchange: &mut dyn ClientCertExchange) -> i32;
}

/// Protocol code and cipher suite as the engine reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CipherInfo {
    /// Wire version or an SChannel `SP_PROT_*` bit.
    pub protocol: u32,
    /// The cipher suite code point.
    pub cipher_suite: u32,
}

/// The engine's verdict on the peer's certificate chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The chain is trusted.
    Ok,
    /// Verification failed outright.
    Error,
    /// An engine-specific status code.
    Other(u32),
}

/// Bit flags describing what the engine's last operation did.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineState(u32);

impl EngineState {
    /// Nothing to report.
    pub const NONE: Self = Self(0);
    /// The engine needs transport data.
    pub const READING: Self = Self(0x01);
    /// The engine has transport data to send.
    pub const WRITING: Self = Self(0x02);
    /// A client certificate lookup is in progress.
    pub const X509_LOOKUP: Self = Self(0x04);
    /// A close_notify was sent.
    pub const SENT_SHUTDOWN: Self = Self(0x08);
    /// A close_notify was received.
    pub const RECEIVED_SHUTDOWN: Self = Self(0x10);
    /// A fatal error occurred.
    pub const ERROR: Self = Self(0x20);
    /// The most recent transport operation was a write.
    pub const LAST_PROC_WRITE: Self = Self(0x40);

    /// Build from raw engine bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Translate into what the native session should wait for.
    ///
    /// When the engine is both reading and writing, the side it touched
    /// last wins, with writing preferred when it cannot tell.
    pub fn want(self) -> Want {
        if self.contains(Self::ERROR) {
            Want::Nothing
        } else if self.contains(Self::SENT_SHUTDOWN) && self.contains(Self::RECEIVED_SHUTDOWN) {
            Want::Nothing
        } else if self.contains(Self::X509_LOOKUP) {
            Want::X509Lookup
        } else if self.contains(Self::WRITING) {
            if self.contains(Self::LAST_PROC_WRITE) {
                Want::Write
            } else if self.contains(Self::READING) {
                Want::Read
            } else {
                Want::Write
            }
        } else if self.contains(Self::READING) {
            Want::Read
        } else {
            Want::Nothing
        }
    }
}

impl BitOr for EngineState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(EngineState, &str); 7] = [
            (EngineState::READING, "READING"),
            (EngineState::WRITING, "WRITING"),
            (EngineState::X509_LOOKUP, "X509_LOOKUP"),
            (EngineState::SENT_SHUTDOWN, "SENT_SHUTDOWN"),
            (EngineState::RECEIVED_SHUTDOWN, "RECEIVED_SHUTDOWN"),
            (EngineState::ERROR, "ERROR"),
            (EngineState::LAST_PROC_WRITE, "LAST_PROC_WRITE"),
        ];

        let mut set = f.debug_set();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{}", name));
            }
        }
        set.finish()
    }
}
