use pki_types::CertificateDer;

use crate::engine::Engine;
use crate::enums::{CipherSuite, ProtocolVersion};
use crate::error::Error;
#[cfg(feature = "logging")]
use crate::log::debug;
use crate::session::{NativeSession, NegotiatedResult};
use crate::x509;

/// Collect what the engine negotiated, in the native stack's terms.
pub(crate) fn negotiated_result(
    engine: &dyn Engine,
    fallback_alpn: &[u8],
) -> Result<NegotiatedResult, Error> {
    let alpn_protocol = engine
        .alpn()
        .filter(|proto| !proto.is_empty())
        .unwrap_or_else(|| fallback_alpn.to_vec());

    let info = engine
        .cipher_info()
        .ok_or(Error::MissingCipherInfo)?;
    let version = ProtocolVersion::from_engine_protocol(info.protocol);
    let reported = CipherSuite::from(info.cipher_suite as u16);

    let peer_certificates = engine
        .peer_certificates()
        .filter(|chain| !chain.is_empty())
        .ok_or(Error::MissingPeerCertificates)?;

    let cipher_suite = if reported.is_gost() {
        reported
    } else {
        reconcile_cipher_suite(reported, &peer_certificates[0])?
    };

    Ok(NegotiatedResult {
        alpn_protocol,
        version,
        cipher_suite,
        peer_certificates,
    })
}

/// Some servers (and engines) report a generic suite for a GOST
/// handshake.  The leaf's key algorithm tells us which GOST suite it
/// really was.
pub(crate) fn reconcile_cipher_suite(
    reported: CipherSuite,
    leaf: &CertificateDer<'_>,
) -> Result<CipherSuite, Error> {
    let key = x509::public_key_algorithm(leaf).ok_or(Error::InvalidCertificate)?;

    let actual = if key == x509::GOST_R3410_2001_KEY {
        CipherSuite::TLS_GOSTR341001_WITH_28147_CNT_IMIT
    } else if x509::GOST_R3410_2012_KEYS
        .iter()
        .any(|alg| *alg == key)
    {
        CipherSuite::TLS_GOSTR341112_256_WITH_28147_CNT_IMIT
    } else {
        return Ok(reported);
    };

    debug!("engine reported {:?}; leaf key says {:?}", reported, actual);
    Ok(actual)
}

/// Hand the result to the native session.
pub(crate) fn deliver(session: &dyn NativeSession, result: &NegotiatedResult) -> Result<(), Error> {
    if session.set_connected(result) {
        Ok(())
    } else {
        Err(Error::ResultRejected)
    }
}
