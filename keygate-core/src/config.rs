//! Deployment-profile configuration for the gatekeeping engine.

/// Configuration for a Keygate deployment profile.
///
/// The engine is fully parameterized: the short-lived profile (32 second
/// windows, frequent sweeps) and long-lived profiles (multi-hour windows)
/// differ only in these values.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Fixed prefix on every generated key.
    pub key_prefix: String,
    /// Number of random `[A-Z0-9]` characters after the prefix.
    pub key_random_len: usize,
    /// Validity window granted at first activation, in seconds.
    pub key_ttl_secs: i64,
    /// Maximum allowed skew between request timestamp and server time.
    pub freshness_window_secs: i64,
    /// Interval between expiry sweeps of the session index, in seconds.
    pub sweep_interval_secs: u64,
    /// Whether a HWID must be supplied when a key is issued.
    pub require_hwid: bool,
    /// Minimum accepted HWID length.
    pub min_hwid_len: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            key_prefix: "KG-".to_string(),
            key_random_len: 12,
            key_ttl_secs: 32,
            freshness_window_secs: 30,
            sweep_interval_secs: 10,
            require_hwid: false,
            min_hwid_len: 8,
        }
    }
}
