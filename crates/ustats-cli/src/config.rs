//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use ustats_core::Granularity;
use ustats_store::Tracker;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the bucket files.
    pub storage_root: PathBuf,
    /// Calendar period covered by one bucket file.
    pub granularity: Granularity,
    /// Seconds between background flushes during `import`.
    pub flush_interval_secs: u64,
    /// Read-only storage roots included in queries.
    pub extra_roots: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            storage_root: data_dir,
            granularity: Granularity::default(),
            flush_interval_secs: 30,
            extra_roots: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the default locations, then `config_path`
    /// if given, then the environment.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (USTATS_*)
        figment = figment.merge(Env::prefixed("USTATS_"));

        figment.extract()
    }

    /// Background flush period, never shorter than one second.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    /// A tracker over the configured storage root and extra roots.
    pub fn tracker(&self) -> Tracker {
        Tracker::new(&self.storage_root, self.granularity).with_extra_roots(self.extra_roots.clone())
    }
}

/// Returns the platform-specific config directory for ustats.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ustats"))
}

/// Returns the platform-specific data directory for ustats.
///
/// On Linux: `~/.local/share/ustats`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ustats"))
}
