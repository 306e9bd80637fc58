use core::fmt;
use std::error::Error as StdError;

use crate::enums::CipherSuite;

/// gostssl reports its own failures using this type.
///
/// Failures of the alternate engine itself are never wrapped in this
/// type: their return codes are handed back to the native stack
/// unchanged inside [`Routed::Alternate`](crate::Routed::Alternate).
#[non_exhaustive]
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// The native stack negotiated a GOST suite on a session that was
    /// not routed through the alternate engine.  The connection must be
    /// aborted; a retry will be routed through the engine.
    GostRequired(CipherSuite),

    /// The engine completed a handshake but reported no cipher info.
    MissingCipherInfo,

    /// The engine completed a handshake but reported no peer certificates.
    MissingPeerCertificates,

    /// A certificate could not be parsed far enough to be classified.
    InvalidCertificate,

    /// The native session refused the negotiated handshake result.
    ResultRejected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::GostRequired(ref suite) => {
                write!(f, "server negotiated {:?}, which requires the GOST engine", suite)
            }
            Self::MissingCipherInfo => write!(f, "engine reported no cipher info"),
            Self::MissingPeerCertificates => write!(f, "engine reported no peer certificates"),
            Self::InvalidCertificate => write!(f, "malformed certificate"),
            Self::ResultRejected => write!(f, "native session rejected the handshake result"),
        }
    }
}

impl StdError for Error {}
