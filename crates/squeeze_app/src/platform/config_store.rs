use std::path::PathBuf;
use std::time::{Duration, Instant};

use engine_logging::{engine_error, engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use squeeze_core::{is_retired_proxy, Config, ConfigChanges, Statistics};
use squeeze_engine::AtomicStateFile;

const STATE_FILENAME: &str = "squeeze_state.ron";

/// How long statistics writes are held back so bursts of completed
/// requests coalesce into one disk write.
const STATS_WRITE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct PersistedState {
    enabled: bool,
    proxy_url: String,
    disabled_hosts: Vec<String>,
    convert_bw: bool,
    compression_level: u8,
    is_webp_supported: bool,
    statistics: PersistedStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct PersistedStatistics {
    files_processed: u64,
    bytes_processed: u64,
    bytes_saved: u64,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PersistedState {
    fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.enabled,
            proxy_url: config.proxy_url.clone(),
            disabled_hosts: config.disabled_hosts.clone(),
            convert_bw: config.convert_bw,
            compression_level: config.compression_level,
            is_webp_supported: config.is_webp_supported,
            statistics: PersistedStatistics {
                files_processed: config.statistics.files_processed,
                bytes_processed: config.statistics.bytes_processed,
                bytes_saved: config.statistics.bytes_saved,
            },
        }
    }

    fn into_config(self) -> Config {
        Config {
            enabled: self.enabled,
            proxy_url: self.proxy_url,
            disabled_hosts: self.disabled_hosts,
            convert_bw: self.convert_bw,
            compression_level: self.compression_level,
            is_webp_supported: self.is_webp_supported,
            statistics: Statistics {
                files_processed: self.statistics.files_processed,
                bytes_processed: self.statistics.bytes_processed,
                bytes_saved: self.statistics.bytes_saved,
            },
        }
    }
}

/// Durable configuration store backed by one RON document.
///
/// Loading merges defaults under whatever was persisted: keys missing from
/// the document take their default value. Writes go through the atomic
/// file writer.
pub struct ConfigStore {
    file: AtomicStateFile,
    config: Config,
    stats_written_at: Option<Instant>,
    stats_deferred: bool,
    write_window: Duration,
}

impl ConfigStore {
    /// Opens the store in `dir`. A persisted proxy endpoint pointing at the
    /// retired host is reset to unset and written back immediately, so the
    /// setup surface reopens on the next startup signal.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let file = AtomicStateFile::new(dir, STATE_FILENAME);
        let mut config = load_config(&file);
        if is_retired_proxy(&config.proxy_url) {
            engine_info!("Resetting retired proxy endpoint {}", config.proxy_url);
            config.proxy_url.clear();
            save_config(&file, &config);
        }
        Self {
            file,
            config,
            stats_written_at: None,
            stats_deferred: false,
            write_window: STATS_WRITE_WINDOW,
        }
    }

    /// The configuration as last loaded or written.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Persists `new` and returns the changed keys, ready to feed back into
    /// the session as a change notification. No-op when nothing changed.
    pub fn set(&mut self, new: Config) -> ConfigChanges {
        let changes = ConfigChanges::diff(&self.config, &new);
        if !changes.is_empty() {
            self.config = new;
            save_config(&self.file, &self.config);
        }
        changes
    }

    /// Records an updated statistics block. The first write in a while goes
    /// straight to disk; followers within the write window are deferred
    /// until [`flush`](Self::flush).
    pub fn set_statistics(&mut self, statistics: Statistics) {
        self.config.statistics = statistics;
        let now = Instant::now();
        let recently_written = self
            .stats_written_at
            .is_some_and(|written| now.duration_since(written) < self.write_window);
        if recently_written {
            self.stats_deferred = true;
        } else {
            self.stats_written_at = Some(now);
            self.stats_deferred = false;
            save_config(&self.file, &self.config);
        }
    }

    /// Writes out any deferred statistics update.
    pub fn flush(&mut self) {
        if self.stats_deferred {
            self.stats_deferred = false;
            save_config(&self.file, &self.config);
        }
    }

    /// Persists the settled WebP capability.
    pub fn set_webp_support(&mut self, supported: bool) {
        if self.config.is_webp_supported != supported {
            self.config.is_webp_supported = supported;
            save_config(&self.file, &self.config);
        }
    }
}

fn load_config(file: &AtomicStateFile) -> Config {
    let content = match file.read() {
        Ok(Some(text)) => text,
        Ok(None) => return Config::default(),
        Err(err) => {
            engine_warn!(
                "Failed to read persisted state from {:?}: {}",
                file.path(),
                err
            );
            return Config::default();
        }
    };

    match ron::from_str::<PersistedState>(&content) {
        Ok(state) => state.into_config(),
        Err(err) => {
            engine_warn!(
                "Failed to parse persisted state from {:?}: {}",
                file.path(),
                err
            );
            Config::default()
        }
    }
}

fn save_config(file: &AtomicStateFile, config: &Config) {
    let state = PersistedState::from_config(config);
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    if let Err(err) = file.write(&content) {
        engine_error!(
            "Failed to write persisted state to {:?}: {}",
            file.path(),
            err
        );
    }
}
