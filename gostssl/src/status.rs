use core::fmt;

/// What has been learned about a host's need for the GOST engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HostStatus {
    /// Nothing is known yet; connections use the native stack.
    #[default]
    Auto,
    /// The GOST engine negotiated successfully with this host.
    Yes,
    /// The GOST engine must not be used for this host.
    No,
    /// The native stack saw a GOST suite it could not have negotiated
    /// on its own.  Handshakes are retried through the engine; the level
    /// counts how many sessions have done so without settling the host.
    Probing(u8),
}

impl HostStatus {
    /// Whether a handshake with this status goes through the engine.
    pub fn routes_handshake(self) -> bool {
        matches!(self, Self::Yes | Self::Probing(_))
    }

    /// Whether post-handshake record I/O goes through the engine.
    ///
    /// Only a session whose own handshake ran on the engine qualifies.
    pub fn routes_io(self) -> bool {
        self == Self::Yes
    }

    /// `Yes` and `No` are final.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Yes | Self::No)
    }

    /// The status to record when a session holding this status ends.
    ///
    /// Returns `None` when teardown has nothing to record.  A probe at
    /// `max_level` gives up and returns the host to `Auto`.
    pub fn after_teardown(self, max_level: u8) -> Option<Self> {
        match self {
            Self::Probing(level) if level >= max_level => Some(Self::Auto),
            Self::Probing(level) => Some(Self::Probing(level + 1)),
            _ => None,
        }
    }
}

impl fmt::Debug for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("Auto"),
            Self::Yes => f.write_str("Yes"),
            Self::No => f.write_str("No"),
            Self::Probing(level) => write!(f, "Probing({})", level),
        }
    }
}
