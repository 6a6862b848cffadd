use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Default location of the tool configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vgdept/snaprecode.toml";

/// Default authority private key, relative to $HOME
pub const DEFAULT_AUTHORITY_KEY: &str = ".secret/authority_priv.pem";

/// Default master (shuffler) key pair, relative to $HOME
pub const DEFAULT_MASTER_KEY: &str = ".secret/shuffler_priv.json";

/// Default realms public key file
pub const DEFAULT_REALMS_KEYS: &str = "/etc/vgdept/realms_keys";

/// Top-level configuration (loaded from snaprecode.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecodeConfig {
    pub keys: KeysConfig,
    pub log: LogConfig,
    pub recode: RecodeOptions,
}

/// Key file locations. Unset entries fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Authority RSA private key (PEM or OpenSSH container)
    pub authority_key: Option<PathBuf>,
    /// Master NaCl key pair (JSON)
    pub master_key: Option<PathBuf>,
    /// Realms public keys (authorized_keys format)
    pub realms_keys: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecodeOptions {
    /// Decode brigades on the rayon pool (default: true)
    pub parallel_decode: bool,
    /// What to do when a brigade cannot be placed
    pub placement_errors: PlacementPolicy,
    /// Upper bound for a decompressed brigade payload, in MiB (default: 64)
    pub max_payload_mb: usize,
}

/// Handling of mirrored/pinned placement failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementPolicy {
    /// Abort the whole run
    #[default]
    Fatal,
    /// Log the brigade and leave it out of the plan
    Skip,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for RecodeOptions {
    fn default() -> Self {
        Self {
            parallel_decode: true,
            placement_errors: PlacementPolicy::Fatal,
            max_payload_mb: 64,
        }
    }
}

impl RecodeOptions {
    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_mb.saturating_mul(1024 * 1024)
    }
}

impl KeysConfig {
    pub fn authority_key_path(&self) -> PathBuf {
        resolve(self.authority_key.as_deref(), || home_dir().join(DEFAULT_AUTHORITY_KEY))
    }

    pub fn master_key_path(&self) -> PathBuf {
        resolve(self.master_key.as_deref(), || home_dir().join(DEFAULT_MASTER_KEY))
    }

    pub fn realms_keys_path(&self) -> PathBuf {
        resolve(self.realms_keys.as_deref(), || PathBuf::from(DEFAULT_REALMS_KEYS))
    }
}

fn resolve(configured: Option<&Path>, fallback: impl FnOnce() -> PathBuf) -> PathBuf {
    configured.map(expand_tilde).unwrap_or_else(fallback)
}

/// Load configuration from `path`, or defaults when the file does not exist.
pub fn load(path: &Path) -> anyhow::Result<RecodeConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(RecodeConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
}

/// $HOME, or the current directory when HOME is unset.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}
