#![allow(non_camel_case_types)]
#![allow(clippy::upper_case_acronyms)]

enum_builder! {
    /// The `CipherSuite` TLS protocol enum, restricted to the values this
    /// crate has an opinion about.  The `Unknown` item carries every
    /// other suite through unchanged.
    #[repr(u16)]
    pub enum CipherSuite {
        TLS_GOSTR341001_WITH_28147_CNT_IMIT => 0x0081,
        TLS_GOSTR341112_256_WITH_28147_CNT_IMIT => 0xff85,
    }
}

impl CipherSuite {
    /// Both suites that can only be negotiated by the GOST engine.
    pub const GOST: [Self; 2] = [
        Self::TLS_GOSTR341001_WITH_28147_CNT_IMIT,
        Self::TLS_GOSTR341112_256_WITH_28147_CNT_IMIT,
    ];

    /// Whether this is one of the reserved GOST suites.
    pub fn is_gost(&self) -> bool {
        Self::GOST.contains(self)
    }
}

enum_builder! {
    /// The `ProtocolVersion` TLS protocol enum.  Values in this enum are taken
    /// from the various RFCs covering TLS, and are listed by IANA.
    /// The `Unknown` item is used when processing unrecognised ordinals.
    #[repr(u16)]
    pub enum ProtocolVersion {
        SSLv3 => 0x0300,
        TLSv1_0 => 0x0301,
        TLSv1_1 => 0x0302,
        TLSv1_2 => 0x0303,
        TLSv1_3 => 0x0304,
    }
}

impl ProtocolVersion {
    /// Map the protocol code reported by the engine's cipher info.
    ///
    /// Engines report either the wire version or an SChannel
    /// `SP_PROT_*` bit.  Anything unrecognised degrades to SSLv3,
    /// which the native stack treats as "no usable version".
    pub fn from_engine_protocol(code: u32) -> Self {
        match code {
            0x0301 | 0x0040 | 0x0080 => Self::TLSv1_0,
            0x0302 | 0x0100 | 0x0200 => Self::TLSv1_1,
            0x0303 | 0x0400 | 0x0800 => Self::TLSv1_2,
            _ => Self::SSLv3,
        }
    }
}
