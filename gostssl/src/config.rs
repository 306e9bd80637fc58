/// Tunables for a [`Dispatcher`](crate::Dispatcher).
///
/// ```
/// let config = gostssl::Config::default()
///     .with_max_probe_level(3)
///     .with_fallback_alpn(b"h2".to_vec());
/// assert_eq!(config.max_probe_level, 3);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Highest `Probing` level before a host returns to `Auto`.
    ///
    /// A host that hits a GOST suite on the native stack gets
    /// `max_probe_level + 1` engine handshakes to settle.
    pub max_probe_level: u8,

    /// ALPN result reported to the native session when the engine
    /// negotiated none.
    pub fallback_alpn: Vec<u8>,
}

impl Config {
    /// Replace `max_probe_level`.
    pub fn with_max_probe_level(mut self, level: u8) -> Self {
        self.max_probe_level = level;
        self
    }

    /// Replace `fallback_alpn`.
    pub fn with_fallback_alpn(mut self, protocol: Vec<u8>) -> Self {
        self.fallback_alpn = protocol;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_probe_level: 15,
            fallback_alpn: b"http/1.1".to_vec(),
        }
    }
}
