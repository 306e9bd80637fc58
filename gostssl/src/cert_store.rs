use pki_types::CertificateDer;

/// A certificate in the operating system's personal store, with the
/// properties the store knows about it.
#[derive(Clone, Debug)]
pub struct StoredCertificate {
    /// The certificate itself.
    pub der: CertificateDer<'static>,
    /// The intended key usage includes digital signatures.
    pub digital_signature: bool,
    /// The certificate is within its validity period right now.
    pub time_valid: bool,
    /// A private key is associated with the certificate.
    pub has_private_key: bool,
    /// Simple display name of the subject.
    pub subject: Option<String>,
    /// Simple display name of the issuer.
    pub issuer: Option<String>,
}

/// Access to the operating system's personal certificate store.
pub trait CertificateStore {
    /// Every certificate in the store, or `None` if it cannot be opened.
    fn certificates(&self) -> Option<Vec<StoredCertificate>>;
}

/// A certificate that can authenticate a client.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientCertificate {
    /// The certificate itself.
    pub der: CertificateDer<'static>,
    /// `subject (issuer)`, for certificate pickers.
    pub display_name: String,
}

/// The answer to a client certificate listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientCertificates {
    /// The listing came from the GOST-capable store.
    pub gost: bool,
    /// Usable certificates, in store order.
    pub certificates: Vec<ClientCertificate>,
}

/// List the certificates in `store` that could be used for client
/// authentication: signing certificates, currently valid, with a key.
pub(crate) fn client_certificates(store: &dyn CertificateStore) -> ClientCertificates {
    let mut listing = ClientCertificates {
        gost: true,
        certificates: Vec::new(),
    };

    let Some(stored) = store.certificates() else {
        return listing;
    };

    listing.certificates = stored
        .into_iter()
        .filter(|c| c.digital_signature && c.time_valid && c.has_private_key)
        .map(|c| ClientCertificate {
            display_name: display_name(c.subject.as_deref(), c.issuer.as_deref()),
            der: c.der,
        })
        .collect();
    listing
}

fn display_name(subject: Option<&str>, issuer: Option<&str>) -> String {
    let part = |name: Option<&str>| match name {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => "...".to_owned(),
    };
    format!("{} ({})", part(subject), part(issuer))
}
