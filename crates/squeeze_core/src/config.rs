//! Configuration record and change notifications.

/// Retired public proxy endpoint. Persisted configurations still pointing at
/// it are reset to "unset" at load time so the setup surface reopens.
pub const RETIRED_PROXY_HOST: &str = "compressor.squeezeimg.com";

/// Returns true when `proxy_url` points at the retired proxy endpoint.
pub fn is_retired_proxy(proxy_url: &str) -> bool {
    proxy_url.to_ascii_lowercase().contains(RETIRED_PROXY_HOST)
}

/// Bandwidth-savings counters. Monotonically non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    pub files_processed: u64,
    pub bytes_processed: u64,
    pub bytes_saved: u64,
}

/// The single source of truth for every redirect decision.
///
/// Owned by the session state machine. The mirror is updated field-by-field
/// from store change notifications and is never re-read from the store in
/// the middle of a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub enabled: bool,
    /// Compression proxy endpoint. Empty means "unset".
    pub proxy_url: String,
    /// Hostnames the user opted out of compression.
    pub disabled_hosts: Vec<String>,
    /// Ask the proxy for grayscale output.
    pub convert_bw: bool,
    /// Proxy-defined compression level, 0-100.
    pub compression_level: u8,
    /// Result of the WebP decode-capability probe. False until the probe
    /// settles, which keeps the format choice conservative.
    pub is_webp_supported: bool,
    pub statistics: Statistics,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            proxy_url: String::new(),
            disabled_hosts: Vec::new(),
            convert_bw: false,
            compression_level: 40,
            is_webp_supported: false,
            statistics: Statistics::default(),
        }
    }
}

impl Config {
    /// True when no usable proxy endpoint is configured.
    pub fn needs_setup(&self) -> bool {
        self.proxy_url.is_empty() || is_retired_proxy(&self.proxy_url)
    }

    /// True when the user opted `host` out of compression.
    pub fn is_disabled_host(&self, host: &str) -> bool {
        self.disabled_hosts.iter().any(|entry| entry == host)
    }
}

/// An old/new value pair for one changed configuration key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

/// Changed-keys notification from the config store.
///
/// One entry per configuration key; `None` means the key did not change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigChanges {
    pub enabled: Option<Change<bool>>,
    pub proxy_url: Option<Change<String>>,
    pub disabled_hosts: Option<Change<Vec<String>>>,
    pub convert_bw: Option<Change<bool>>,
    pub compression_level: Option<Change<u8>>,
    pub is_webp_supported: Option<Change<bool>>,
    pub statistics: Option<Change<Statistics>>,
}

impl ConfigChanges {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.proxy_url.is_none()
            && self.disabled_hosts.is_none()
            && self.convert_bw.is_none()
            && self.compression_level.is_none()
            && self.is_webp_supported.is_none()
            && self.statistics.is_none()
    }

    /// Field-by-field diff of two configurations.
    pub fn diff(old: &Config, new: &Config) -> Self {
        fn changed<T: Clone + PartialEq>(old: &T, new: &T) -> Option<Change<T>> {
            (old != new).then(|| Change {
                old: old.clone(),
                new: new.clone(),
            })
        }

        Self {
            enabled: changed(&old.enabled, &new.enabled),
            proxy_url: changed(&old.proxy_url, &new.proxy_url),
            disabled_hosts: changed(&old.disabled_hosts, &new.disabled_hosts),
            convert_bw: changed(&old.convert_bw, &new.convert_bw),
            compression_level: changed(&old.compression_level, &new.compression_level),
            is_webp_supported: changed(&old.is_webp_supported, &new.is_webp_supported),
            statistics: changed(&old.statistics, &new.statistics),
        }
    }
}
