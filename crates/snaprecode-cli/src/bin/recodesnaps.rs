//! recodesnaps: recode a brigade snapshot bundle into a restore plan
//!
//! Usage:
//!   recodesnaps --in snapshot.json -c reservation.json --out plan.json --tfp SHA256:...
//!               [--map mapping.json] [--mirror] [--force]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use snaprecode_cli::{read_json, read_pins, resolve_key, write_json_atomic, CommonArgs};
use snaprecode_core::types::{AggregatedSnapshot, ReservationConfig};
use snaprecode_crypto::{load_realm_key, AuthorityKey, MasterKeypair};
use snaprecode_plan::{create_restore_plan, PlacementMode, RecodeKeys, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "recodesnaps",
    version,
    about = "Re-encrypt brigade snapshots for a destination reservation"
)]
struct Cli {
    /// Authority private key (PEM or OpenSSH)
    #[arg(long, env = "AUTHORITY_PRIV_KEY_FILE")]
    akey: Option<PathBuf>,

    /// Master (shuffler) key pair, JSON
    #[arg(long, env = "MASTER_PRIV_KEY_FILE")]
    mkey: Option<PathBuf>,

    /// Realms public keys, authorized_keys format
    #[arg(long, env = "REALMS_KEYS_FILE")]
    rkeys: Option<PathBuf>,

    /// Aggregated snapshot bundle
    #[arg(long = "in")]
    input: PathBuf,

    /// Reservation config (destination topology)
    #[arg(long, short = 'c')]
    reservation: PathBuf,

    /// Restore plan output
    #[arg(long)]
    out: PathBuf,

    /// Fingerprint of the destination authority key in the realms key file
    #[arg(long)]
    tfp: String,

    /// Mapping file pinning brigades to addresses
    #[arg(long)]
    map: Option<PathBuf>,

    /// Accept a bundle that reports failed brigade exports
    #[arg(long)]
    force: bool,

    /// Keep each brigade on its current address
    #[arg(long)]
    mirror: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.common.setup()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        input = %cli.input.display(),
        reservation = %cli.reservation.display(),
        "recodesnaps starting"
    );

    let authority = AuthorityKey::load(&resolve_key(
        cli.akey.as_deref(),
        config.keys.authority_key_path(),
    ))?;
    let master = MasterKeypair::load(&resolve_key(
        cli.mkey.as_deref(),
        config.keys.master_key_path(),
    ))?;
    let destination = load_realm_key(
        &resolve_key(cli.rkeys.as_deref(), config.keys.realms_keys_path()),
        &cli.tfp,
    )?;

    let bundle: AggregatedSnapshot = read_json(&cli.input, "snapshot")?;
    let reservation: ReservationConfig = read_json(&cli.reservation, "reservation config")?;
    let pins = read_pins(cli.map.as_deref())?;

    let mode = if cli.mirror {
        PlacementMode::Mirrored
    } else {
        PlacementMode::Sequential
    };
    let opts = RunOptions::from_config(&config.recode, mode, cli.force);

    let keys = RecodeKeys {
        authority: &authority,
        master: &master,
        destination: &destination,
        realm_fingerprint: &cli.tfp,
    };
    let plan = create_restore_plan(&bundle, &reservation, &pins, keys, &opts)
        .with_context(|| format!("recoding {}", cli.input.display()))?;

    write_json_atomic(&cli.out, &plan)?;

    info!(
        reservation_id = %plan.reservation_id,
        nodes = plan.plan.len(),
        snapshots = plan.plan.iter().map(|n| n.snapshots.len()).sum::<usize>(),
        out = %cli.out.display(),
        "restore plan written"
    );
    Ok(())
}
