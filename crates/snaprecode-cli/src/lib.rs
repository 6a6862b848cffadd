//! Shared glue for the `recodesnaps` and `recodesnapmap` binaries:
//! common flags, logging setup, and file I/O with context.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use snaprecode_core::config::{self, RecodeConfig, DEFAULT_CONFIG_PATH};
use snaprecode_core::types::PinMap;

#[derive(Clone, Debug, ValueEnum, PartialEq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Parse the `[log] format` config value; unknown values fall back to text.
    pub fn from_config(value: &str) -> Self {
        match <Self as ValueEnum>::from_str(value, true) {
            Ok(format) => format,
            Err(_) => LogFormat::Text,
        }
    }
}

/// Flags shared by both binaries.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to snaprecode.toml configuration file
    #[arg(long, env = "SNAPRECODE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "SNAPRECODE_LOG")]
    pub log: Option<String>,

    /// Log format (json, text); overrides the config file
    #[arg(long, env = "SNAPRECODE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl CommonArgs {
    /// Load the config file and start logging. Flags win over the file.
    pub fn setup(&self) -> Result<RecodeConfig> {
        let config = config::load(&self.config)?;

        let level = self.log.as_deref().unwrap_or(&config.log.level);
        let format = self
            .log_format
            .clone()
            .unwrap_or_else(|| LogFormat::from_config(&config.log.format));
        init_logging(level, &format);

        Ok(config)
    }
}

/// Logs go to stderr; stdout carries the inspect output.
pub fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Flag/env value if given, else the config-derived path.
pub fn resolve_key(flag: Option<&Path>, fallback: PathBuf) -> PathBuf {
    flag.map(config::expand_tilde).unwrap_or(fallback)
}

pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read(path)
        .with_context(|| format!("reading {what}: {}", path.display()))?;
    serde_json::from_slice(&content)
        .with_context(|| format!("parsing {what}: {}", path.display()))
}

/// Pins from the optional mapping file; no file means no pins.
pub fn read_pins(path: Option<&Path>) -> Result<PinMap> {
    match path {
        Some(path) => read_json(path, "mapping file"),
        None => Ok(PinMap::new()),
    }
}

/// Write `value` as pretty JSON, replacing `path` only once the whole
/// document is on disk.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, value)
        .with_context(|| format!("serializing {}", path.display()))?;
    tmp.write_all(b"\n")?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("syncing {}", path.display()))?;

    tmp.persist(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Compact JSON document on stdout, newline-terminated.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, value).context("writing JSON to stdout")?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
