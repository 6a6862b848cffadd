//! Recode and inspect runs over a whole snapshot bundle.
//!
//! Everything that can be rejected without secrets (bundle shape, authority
//! fingerprint, reservation capacity, router keys, pins) is rejected before
//! the first decryption.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use rayon::prelude::*;

use snaprecode_core::config::{PlacementPolicy, RecodeOptions};
use snaprecode_core::types::{
    is_zero_time, AggregatedSnapshot, Brigade, EncryptedBrigade, PinMap, ReservationConfig,
    RestorePlan,
};
use snaprecode_core::{RecodeError, RecodeResult, Stage};
use snaprecode_crypto::{AuthorityKey, MasterKeypair, RsaPublicKey};

use crate::decode::decode_brigade;
use crate::encode::SnapshotEncoder;
use crate::placement::{build_plan, PlacementMode, PlanOptions, Topology};

/// Keys used by a recode run.
#[derive(Debug, Clone, Copy)]
pub struct RecodeKeys<'a> {
    /// Local authority: opens the inbound bundle
    pub authority: &'a AuthorityKey,
    /// Master key pair the inbound secret fields are sealed to
    pub master: &'a MasterKeypair,
    /// Destination authority the plan is encoded for
    pub destination: &'a RsaPublicKey,
    pub realm_fingerprint: &'a str,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: PlacementMode,
    /// Accept a bundle whose exporter reported failures
    pub force: bool,
    pub placement_errors: PlacementPolicy,
    pub parallel_decode: bool,
    pub max_payload: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&RecodeOptions::default(), PlacementMode::Sequential, false)
    }
}

impl RunOptions {
    pub fn from_config(config: &RecodeOptions, mode: PlacementMode, force: bool) -> Self {
        Self {
            mode,
            force,
            placement_errors: config.placement_errors,
            parallel_decode: config.parallel_decode,
            max_payload: config.max_payload_bytes(),
        }
    }
}

/// Bundle-level validation shared by both modes.
///
/// A non-zero `errors_count` is only reported here; whether it is fatal is
/// up to the caller.
pub fn check_in(bundle: &AggregatedSnapshot, authority_fingerprint: &str) -> RecodeResult<()> {
    let invalid = |msg: &str| Err(RecodeError::InvalidSnapshotData(msg.to_string()));

    if is_zero_time(&bundle.update_time) {
        return invalid("update time is zero");
    }
    if is_zero_time(&bundle.global_snapshot_time) {
        return invalid("global snapshot time is zero");
    }
    if bundle.tag.is_empty() {
        return invalid("empty tag");
    }
    if bundle.datacenter_id.is_empty() {
        return invalid("empty datacenter id");
    }
    if !bundle.realm_key_fingerprint.is_empty() {
        return invalid("non-empty realm key fingerprint");
    }
    if bundle.authority_key_fingerprint.is_empty() {
        return invalid("empty authority key fingerprint");
    }
    if bundle.encrypted_preshared_secret.is_empty() {
        return invalid("empty encrypted pre-shared secret");
    }
    if bundle.snapshots.is_empty() {
        return invalid("empty snapshots");
    }
    if bundle.errors_count > 0 {
        tracing::warn!(errors_count = bundle.errors_count, "bundle reports failed brigade exports");
    }
    if bundle.authority_key_fingerprint != authority_fingerprint {
        return Err(RecodeError::KeysMismatch(format!(
            "authority: {authority_fingerprint} != {}",
            bundle.authority_key_fingerprint
        )));
    }
    Ok(())
}

fn check_capacity(bundle: &AggregatedSnapshot, reservation: &ReservationConfig) -> RecodeResult<()> {
    let (snapshots, slots) = (bundle.snapshots.len(), reservation.total_slots());
    if snapshots > slots {
        return Err(RecodeError::ReservationTooSmall { snapshots, slots });
    }
    Ok(())
}

/// Decrypt the bundle PSK once and decode every brigade, in input order.
fn decode_all(
    bundle: &AggregatedSnapshot,
    authority: &AuthorityKey,
    parallel: bool,
    max_payload: usize,
) -> RecodeResult<Vec<Brigade>> {
    let psk = authority.decrypt_field(&bundle.encrypted_preshared_secret, "pre-shared secret")?;

    let decode = |snap: &EncryptedBrigade| {
        decode_brigade(snap, authority, &psk, max_payload)
            .map_err(|e| e.in_brigade(&snap.brigade_id, Stage::Decode))
    };

    if parallel {
        bundle.snapshots.par_iter().map(decode).collect()
    } else {
        bundle.snapshots.iter().map(decode).collect()
    }
}

/// Recode mode: build a restore plan for `reservation`.
pub fn create_restore_plan(
    bundle: &AggregatedSnapshot,
    reservation: &ReservationConfig,
    pins: &PinMap,
    keys: RecodeKeys<'_>,
    opts: &RunOptions,
) -> RecodeResult<RestorePlan> {
    check_in(bundle, keys.authority.fingerprint())?;
    if bundle.errors_count > 0 && !opts.force {
        return Err(RecodeError::SnapshotErrors(bundle.errors_count));
    }

    check_capacity(bundle, reservation)?;
    let topology = Topology::from_reservation(reservation)?;
    let pins = topology.check_pins(pins, bundle.snapshots.iter().map(|s| s.brigade_id.as_str()))?;

    tracing::info!(
        snapshots = bundle.snapshots.len(),
        slots = topology.total_slots(),
        nodes = topology.nodes.len(),
        mode = ?opts.mode,
        "recoding bundle"
    );

    let brigades = decode_all(bundle, keys.authority, opts.parallel_decode, opts.max_payload)?;

    let encoder = SnapshotEncoder::new(keys.master, &topology.reservation_id, keys.destination);
    build_plan(
        &topology,
        keys.realm_fingerprint,
        brigades,
        PlanOptions {
            mode: opts.mode,
            pins: &pins,
            policy: opts.placement_errors,
        },
        &encoder,
    )
}

/// Inspect mode: current address of every brigade in the bundle.
pub fn create_mapping(
    bundle: &AggregatedSnapshot,
    authority: &AuthorityKey,
    opts: &RunOptions,
) -> RecodeResult<BTreeMap<String, Ipv4Addr>> {
    check_in(bundle, authority.fingerprint())?;

    let brigades = decode_all(bundle, authority, opts.parallel_decode, opts.max_payload)?;
    Ok(brigades
        .into_iter()
        .map(|b| (b.brigade_id, b.endpoint_ipv4))
        .collect())
}
