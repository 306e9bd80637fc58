use crate::engine::{ClientCertExchange, EngineContext};
#[cfg(feature = "logging")]
use crate::log::{debug, trace};
use crate::session::NativeSession;
use crate::worker::Worker;

/// The `EngineContext` handed to the engine for one call on one session.
pub(crate) struct WorkerContext<'a> {
    pub(crate) session: &'a dyn NativeSession,
    pub(crate) worker: &'a Worker,
}

impl EngineContext for WorkerContext<'_> {
    fn read(&mut self, buf: &mut [u8]) -> i32 {
        self.session.transport_read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> i32 {
        self.session.transport_write(buf)
    }

    fn certificate_request(&mut self, exchange: &mut dyn ClientCertExchange) -> i32 {
        certificate_request(self.session, self.worker, exchange)
    }
}

/// Run the native client certificate flow on behalf of the engine.
///
/// Without a native callback the request is declined quietly and the
/// handshake continues with no certificate.  Otherwise the callback
/// runs with the server's issuer list available, and a certificate
/// it stages through `Dispatcher::certificate_hook` is given to the
/// engine.  If it staged nothing, its own return value decides.
pub(crate) fn certificate_request(
    session: &dyn NativeSession,
    worker: &Worker,
    exchange: &mut dyn ClientCertExchange,
) -> i32 {
    if !session.has_client_cert_callback() {
        debug!("no client certificate callback; offering none");
        return 1;
    }

    // anything left over belongs to an earlier step
    worker.take_staged_certificate();

    if !session.has_ca_names() {
        match exchange.issuer_list() {
            Some(issuers) => {
                trace!("server accepts {} issuers", issuers.len());
                session.set_ca_names(&issuers);
            }
            None => trace!("no issuer list from engine"),
        }
    }

    let ret = session.run_client_cert_callback();

    match worker.take_staged_certificate() {
        Some(certificate) => {
            if !exchange.set_client_certificate(&certificate) {
                debug!("engine refused the staged client certificate");
            }
            1
        }
        None if ret <= 0 => ret,
        None => 1,
    }
}
