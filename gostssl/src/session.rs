use core::fmt;

use pki_types::CertificateDer;

use crate::enums::{CipherSuite, ProtocolVersion};

/// Identifies one native session for as long as it is alive.
///
/// The native stack picks these; typically the address of its session
/// object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// What the native session is waiting on after a call returned early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Want {
    /// Not blocked on anything.
    Nothing,
    /// More transport data must be read before retrying.
    Read,
    /// Pending transport data must be written before retrying.
    Write,
    /// A client certificate lookup is in progress.
    X509Lookup,
}

/// A DER-encoded X.501 `Name`, as offered in a CertificateRequest.
#[derive(Clone, PartialEq, Eq)]
pub struct DistinguishedName(Vec<u8>);

impl From<Vec<u8>> for DistinguishedName {
    /// Wrap a DER-encoded `Name`.  The contents are not checked.
    fn from(der: Vec<u8>) -> Self {
        Self(der)
    }
}

impl AsRef<[u8]> for DistinguishedName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DistinguishedName")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

/// The outcome of a handshake driven by the GOST engine, as handed to
/// [`NativeSession::set_connected`].
#[derive(Clone, Debug, PartialEq)]
pub struct NegotiatedResult {
    /// The agreed application protocol.
    pub alpn_protocol: Vec<u8>,
    /// The agreed protocol version.
    pub version: ProtocolVersion,
    /// The agreed cipher suite.
    pub cipher_suite: CipherSuite,
    /// The server's certificate chain, leaf first.
    pub peer_certificates: Vec<CertificateDer<'static>>,
}

/// The native TLS stack's view of one client session.
///
/// gostssl never owns a session.  The native stack passes its session
/// into each call, and gostssl only reads configuration from it and
/// pushes results into it through these hooks.
pub trait NativeSession {
    /// The key under which this session's worker is registered.
    fn id(&self) -> SessionId;

    /// The server name this session connects to, if any.
    fn hostname(&self) -> Option<&str>;

    /// The ALPN protocols the session offers, in preference order.
    fn alpn_protocols(&self) -> &[Vec<u8>];

    /// Read raw bytes from the transport.  Returns the count read, or
    /// a value `<= 0` with the same meaning as the native BIO.
    fn transport_read(&self, buf: &mut [u8]) -> i32;

    /// Write raw bytes to the transport, as `transport_read`.
    fn transport_write(&self, buf: &[u8]) -> i32;

    /// Record what the session is blocked on.
    fn set_want(&self, want: Want);

    /// The cipher suite chosen by the native handshake in progress.
    fn pending_cipher(&self) -> Option<CipherSuite>;

    /// Whether the application configured a client certificate callback.
    fn has_client_cert_callback(&self) -> bool;

    /// Whether the handshake already knows the acceptable issuers.
    fn has_ca_names(&self) -> bool;

    /// Supply the acceptable issuers for the client certificate callback.
    fn set_ca_names(&self, names: &[DistinguishedName]);

    /// Run the application's client certificate callback.
    ///
    /// The callback picks a certificate by calling
    /// [`Dispatcher::certificate_hook`](crate::Dispatcher::certificate_hook)
    /// for this session.  The return value follows the native stack:
    /// `<= 0` is failure or "try again".
    fn run_client_cert_callback(&self) -> i32;

    /// Adopt the result of a handshake driven by the engine.  Returns
    /// false if the session cannot accept it.
    fn set_connected(&self, result: &NegotiatedResult) -> bool;
}
