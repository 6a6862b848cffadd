//! recodesnapmap: print the current address of every brigade in a bundle
//!
//! Usage:
//!   recodesnapmap --in snapshot.json [--akey authority.pem]
//!
//! Output is a `{brigade_id: ipv4}` JSON object on stdout, suitable as a
//! `recodesnaps --map` input.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use snaprecode_cli::{print_json, read_json, resolve_key, CommonArgs};
use snaprecode_core::types::AggregatedSnapshot;
use snaprecode_crypto::AuthorityKey;
use snaprecode_plan::{create_mapping, PlacementMode, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "recodesnapmap",
    version,
    about = "List brigade addresses from a snapshot bundle"
)]
struct Cli {
    /// Authority private key (PEM or OpenSSH)
    #[arg(long, env = "AUTHORITY_PRIV_KEY_FILE")]
    akey: Option<PathBuf>,

    /// Realms public keys (unused, accepted for compatibility with recodesnaps)
    #[arg(long, env = "REALMS_KEYS_FILE")]
    rkeys: Option<PathBuf>,

    /// Aggregated snapshot bundle
    #[arg(long = "in")]
    input: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.common.setup()?;

    if let Some(rkeys) = &cli.rkeys {
        tracing::debug!(rkeys = %rkeys.display(), "realms key file ignored in inspect mode");
    }

    let authority = AuthorityKey::load(&resolve_key(
        cli.akey.as_deref(),
        config.keys.authority_key_path(),
    ))?;
    let bundle: AggregatedSnapshot = read_json(&cli.input, "snapshot")?;

    // placement mode and force play no part in inspect
    let opts = RunOptions::from_config(&config.recode, PlacementMode::Mirrored, false);
    let mapping = create_mapping(&bundle, &authority, &opts)
        .with_context(|| format!("inspecting {}", cli.input.display()))?;

    tracing::info!(brigades = mapping.len(), "mapping ready");
    print_json(&mapping)
}
