//! # gostssl - GOST cipher suites for a native TLS stack
//!
//! Some servers will only complete a handshake using the GOST cipher
//! suites (`TLS_GOSTR341001_WITH_28147_CNT_IMIT`, 0x0081, and
//! `TLS_GOSTR341112_256_WITH_28147_CNT_IMIT`, 0xFF85).  A native TLS
//! stack typically advertises them but cannot carry them.  This crate
//! sits in front of such a stack and routes each session either to the
//! stack itself or to an external GOST-capable TLS engine.
//!
//! ## How a host is learned
//!
//! Hosts are identified by `hostname:FINGERPRINT`.  Every host starts
//! out [`HostStatus::Auto`]: handshakes go to the native stack.  If the
//! native stack ends up negotiating a GOST suite,
//! [`Dispatcher::tls_gost_required`] fails the connection and the host
//! starts probing.  Retries then handshake through the engine.  The
//! first engine handshake that completes marks the host
//! [`HostStatus::Yes`] for good.  A host that keeps failing to complete
//! an engine handshake drops back to `Auto` after a bounded number of
//! attempts ([`Config::max_probe_level`]).
//!
//! ## Design overview
//!
//! gostssl does no network IO and no cryptography of its own.  The
//! native stack is reached through [`NativeSession`], the engine through
//! [`EngineProvider`] and [`Engine`].  Engine return codes are handed
//! back unchanged inside [`Routed::Alternate`]; only gostssl's own
//! failures use [`Error`].
//!
//! ```rust,no_run
//! # fn provider() -> std::sync::Arc<dyn gostssl::EngineProvider> { unimplemented!() }
//! # fn native_ciphers() -> Vec<gostssl::CipherSuite> { unimplemented!() }
//! use gostssl::{Config, Dispatcher};
//!
//! let dispatcher = Dispatcher::new(provider(), Config::default());
//! if !dispatcher.init(&native_ciphers()) {
//!     // GOST servers will not be reachable
//! }
//! ```
//!
//! ## Crate features
//!
//! - `logging`: this makes the crate depend on the `log` crate.
//!   gostssl outputs interesting protocol-level messages at `trace!` and
//!   `debug!` level, and host status changes at `debug!` level.  Engine
//!   problems are reported at `warn!` level.  This feature is enabled by
//!   default.

// Require docs for public APIs, deny unsafe code, etc.
#![forbid(unsafe_code, unused_must_use)]
#![deny(
    clippy::clone_on_ref_ptr,
    clippy::use_self,
    trivial_casts,
    trivial_numeric_casts,
    missing_docs,
    unreachable_pub,
    unused_import_braces,
    unused_extern_crates,
    unused_qualifications
)]
// - single_component_path_imports: our top-level `use log` import causes
//   a false positive, https://github.com/rust-lang/rust-clippy/issues/5210
// - new_without_default: for internal constructors, the indirection is not
//   helpful
#![allow(clippy::single_component_path_imports, clippy::new_without_default)]

// log for logging (optional).
#[cfg(feature = "logging")]
use log;

#[cfg(not(feature = "logging"))]
#[macro_use]
mod log {
    macro_rules! trace    ( ($($tt:tt)*) => {{}} );
    macro_rules! debug    ( ($($tt:tt)*) => {{}} );
    macro_rules! warn     ( ($($tt:tt)*) => {{}} );
}

#[macro_use]
mod macros;

mod bridge;
mod cert_store;
mod client_auth;
mod config;
mod dispatcher;
mod engine;
mod enums;
mod error;
mod host_cache;
mod lock;
mod session;
mod status;
mod worker;
mod x509;

pub use crate::cert_store::{
    CertificateStore, ClientCertificate, ClientCertificates, StoredCertificate,
};
pub use crate::config::Config;
pub use crate::dispatcher::{Dispatcher, Routed, VerificationStatus};
pub use crate::engine::{
    CipherInfo, ClientCertExchange, Engine, EngineContext, EngineProvider, EngineState,
    VerifyOutcome,
};
pub use crate::enums::{CipherSuite, ProtocolVersion};
pub use crate::error::Error;
pub use crate::session::{DistinguishedName, NativeSession, NegotiatedResult, SessionId, Want};
pub use crate::status::HostStatus;
pub use crate::x509::classify_certificate;

/// Re-exported so callers name certificates with the same type.
pub use pki_types;
