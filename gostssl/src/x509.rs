// Just enough DER to find the algorithm identifiers of an X.509 certificate.

/// DER content octets of the GOST signature algorithm OIDs.
///
/// - 1.2.643.2.2.3: GOST R 34.11-94 with GOST R 34.10-2001
/// - 1.2.643.7.1.1.3.2: GOST R 34.11-2012 (256) with GOST R 34.10-2012
/// - 1.2.643.7.1.1.3.3: GOST R 34.11-2012 (512) with GOST R 34.10-2012
pub(crate) const GOST_SIGNATURE_ALGORITHMS: [&[u8]; 3] = [
    &[0x2a, 0x85, 0x03, 0x02, 0x02, 0x03],
    &[0x2a, 0x85, 0x03, 0x07, 0x01, 0x01, 0x03, 0x02],
    &[0x2a, 0x85, 0x03, 0x07, 0x01, 0x01, 0x03, 0x03],
];

/// 1.2.643.2.2.19: GOST R 34.10-2001 public key.
pub(crate) const GOST_R3410_2001_KEY: &[u8] = &[0x2a, 0x85, 0x03, 0x02, 0x02, 0x13];

/// 1.2.643.7.1.1.1.1 and 1.2.643.7.1.1.1.2: GOST R 34.10-2012 public keys.
pub(crate) const GOST_R3410_2012_KEYS: [&[u8]; 2] = [
    &[0x2a, 0x85, 0x03, 0x07, 0x01, 0x01, 0x01, 0x01],
    &[0x2a, 0x85, 0x03, 0x07, 0x01, 0x01, 0x01, 0x02],
];

const DER_SEQUENCE_TAG: u8 = 0x30;
const DER_OID_TAG: u8 = 0x06;
const DER_INTEGER_TAG: u8 = 0x02;
const DER_VERSION_TAG: u8 = 0xa0;

/// Returns true if `der` is a certificate signed with a GOST algorithm.
///
/// Only the `signature` algorithm identifier of `tbsCertificate` is
/// looked at; nothing is verified.  Malformed input is simply not a
/// GOST certificate.
pub fn classify_certificate(der: &[u8]) -> bool {
    match signature_algorithm(der) {
        Some(oid) => GOST_SIGNATURE_ALGORITHMS
            .iter()
            .any(|alg| *alg == oid),
        None => false,
    }
}

/// The `signature` AlgorithmIdentifier OID inside `tbsCertificate`.
pub(crate) fn signature_algorithm(der: &[u8]) -> Option<&[u8]> {
    let mut tbs = tbs_certificate(der)?;
    skip_version_and_serial(&mut tbs)?;
    algorithm_oid(tbs.read_tagged(DER_SEQUENCE_TAG)?)
}

/// The `subjectPublicKeyInfo.algorithm` OID inside `tbsCertificate`.
pub(crate) fn public_key_algorithm(der: &[u8]) -> Option<&[u8]> {
    let mut tbs = tbs_certificate(der)?;
    skip_version_and_serial(&mut tbs)?;
    // signature, issuer, validity, subject
    for _ in 0..4 {
        tbs.read_tagged(DER_SEQUENCE_TAG)?;
    }
    let mut spki = Reader::new(tbs.read_tagged(DER_SEQUENCE_TAG)?);
    algorithm_oid(spki.read_tagged(DER_SEQUENCE_TAG)?)
}

fn tbs_certificate(der: &[u8]) -> Option<Reader<'_>> {
    let mut outer = Reader::new(der);
    let mut cert = Reader::new(outer.read_tagged(DER_SEQUENCE_TAG)?);
    Some(Reader::new(cert.read_tagged(DER_SEQUENCE_TAG)?))
}

fn skip_version_and_serial(tbs: &mut Reader<'_>) -> Option<()> {
    if tbs.peek_tag() == Some(DER_VERSION_TAG) {
        tbs.read_tagged(DER_VERSION_TAG)?;
    }
    tbs.read_tagged(DER_INTEGER_TAG)?;
    Some(())
}

fn algorithm_oid(algorithm_identifier: &[u8]) -> Option<&[u8]> {
    Reader::new(algorithm_identifier).read_tagged(DER_OID_TAG)
}

/// A cursor over DER TLVs.  Every read is bounds-checked.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn peek_tag(&self) -> Option<u8> {
        self.buf.first().copied()
    }

    /// Reads one TLV with tag `tag` and returns its contents.
    fn read_tagged(&mut self, tag: u8) -> Option<&'a [u8]> {
        let (&actual, rest) = self.buf.split_first()?;
        if actual != tag {
            return None;
        }

        let (&first, mut rest) = rest.split_first()?;
        let len = if first < 0x80 {
            usize::from(first)
        } else {
            // Long form; indefinite lengths are not DER.
            let count = usize::from(first & 0x7f);
            if count == 0 || count > usize::BITS as usize / 8 || count > rest.len() {
                return None;
            }
            let (len_bytes, after) = rest.split_at(count);
            rest = after;
            len_bytes
                .iter()
                .fold(0usize, |acc, b| (acc << 8) | usize::from(*b))
        };

        if len > rest.len() {
            return None;
        }
        let (contents, after) = rest.split_at(len);
        self.buf = after;
        Some(contents)
    }
}
