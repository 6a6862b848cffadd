//! Snapshot Decoder: recovers a plaintext brigade from its authority envelope.

use snaprecode_core::types::{Brigade, EncryptedBrigade};
use snaprecode_core::{RecodeError, RecodeResult};
use snaprecode_crypto::{b64, open_payload, AuthorityKey, CompositeKey};

/// Verify the envelope against the local authority, unwrap its secrets and
/// open the payload.
///
/// Fingerprint checks run before any decryption. The payload key needs the
/// bundle `psk`, the locker secret and this authority's share together.
pub fn decode_brigade(
    snap: &EncryptedBrigade,
    authority: &AuthorityKey,
    psk: &[u8],
    max_payload: usize,
) -> RecodeResult<Brigade> {
    if !snap.realm_key_fingerprint.is_empty() {
        return Err(RecodeError::InvalidSnapshotData(
            "non-empty realm key fingerprint".into(),
        ));
    }
    if snap.authority_key_fingerprint.is_empty() {
        return Err(RecodeError::InvalidSnapshotData(
            "empty authority key fingerprint".into(),
        ));
    }
    if snap.authority_key_fingerprint != authority.fingerprint() {
        return Err(RecodeError::KeysMismatch(format!(
            "authority: {} != {}",
            authority.fingerprint(),
            snap.authority_key_fingerprint
        )));
    }
    let share = snap.secrets.get(authority.fingerprint()).ok_or_else(|| {
        RecodeError::InvalidSnapshotData(format!(
            "no secret for authority: {}",
            authority.fingerprint()
        ))
    })?;

    let locker = authority.decrypt_field(&snap.encrypted_locker_secret, "locker secret")?;
    let share = authority.decrypt_field(share, "authority secret")?;

    let key = CompositeKey::new()
        .with_str(&snap.tag)
        .with_str(&snap.brigade_id)
        .with_timestamp(snap.global_snapshot_time.timestamp())
        .with_timestamp(snap.local_snapshot_time.timestamp())
        .with(psk)
        .with(&locker)
        .with(&share);

    let sealed = b64::decode(&snap.payload, "payload")?;
    let json = open_payload(&key, &sealed, max_payload)?;
    let brigade: Brigade = serde_json::from_slice(&json)?;

    if brigade.brigade_id != snap.brigade_id {
        return Err(RecodeError::InvalidSnapshotData(format!(
            "brigade id mismatch: {} != {}",
            brigade.brigade_id, snap.brigade_id
        )));
    }

    tracing::debug!(brigade_id = %brigade.brigade_id, endpoint = %brigade.endpoint_ipv4, "brigade decoded");
    Ok(brigade)
}
