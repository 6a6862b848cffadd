//! Snapshot Encoder: seals a recoded brigade for the destination authority.

use std::net::Ipv4Addr;

use snaprecode_core::types::{Brigade, PreparedSnapshot};
use snaprecode_core::{RecodeError, RecodeResult, Stage};
use snaprecode_crypto::{
    b64, encrypt_with_authority, generate_secret, open_payload, seal_payload, AuthorityKey,
    CompositeKey, MasterKeypair, RouterKey, RsaPublicKey,
};

use crate::placement::SlotEncoder;
use crate::recode::{recode_brigade, RouterResealer};
use crate::sanitize::sanitize;

fn prepared_key(brigade_id: &str, reservation_id: &str, secret: &[u8]) -> CompositeKey {
    CompositeKey::new()
        .with_str(brigade_id)
        .with_str(reservation_id)
        .with(secret)
}

/// Seal `brigade` under a fresh secret wrapped to `destination`.
pub fn encode_brigade(
    brigade: &Brigade,
    reservation_id: &str,
    destination: &RsaPublicKey,
) -> RecodeResult<PreparedSnapshot> {
    let secret = generate_secret();
    let encrypted_secret = encrypt_with_authority(destination, &secret)?;

    let json = serde_json::to_vec(brigade)?;
    let key = prepared_key(&brigade.brigade_id, reservation_id, &secret);
    let payload = seal_payload(&key, &json)?;

    Ok(PreparedSnapshot {
        brigade_id: brigade.brigade_id.clone(),
        endpoint_ipv4: brigade.endpoint_ipv4,
        domain_names: brigade.domain_names(),
        encrypted_secret: b64::encode(&encrypted_secret),
        payload: b64::encode(&payload),
    })
}

/// Inverse of [`encode_brigade`], as performed on the destination side.
pub fn open_prepared(
    prepared: &PreparedSnapshot,
    reservation_id: &str,
    authority: &AuthorityKey,
    max_payload: usize,
) -> RecodeResult<Brigade> {
    let secret = authority.decrypt_field(&prepared.encrypted_secret, "snapshot secret")?;
    let key = prepared_key(&prepared.brigade_id, reservation_id, &secret);

    let sealed = b64::decode(&prepared.payload, "payload")?;
    let json = open_payload(&key, &sealed, max_payload)?;
    let brigade: Brigade = serde_json::from_slice(&json)?;

    if brigade.brigade_id != prepared.brigade_id {
        return Err(RecodeError::InvalidSnapshotData(format!(
            "brigade id mismatch: {} != {}",
            brigade.brigade_id, prepared.brigade_id
        )));
    }
    Ok(brigade)
}

/// The production [`SlotEncoder`]: sanitize, reseal to the node router,
/// encode for the destination authority.
pub struct SnapshotEncoder<'a> {
    master: &'a MasterKeypair,
    reservation_id: &'a str,
    destination: &'a RsaPublicKey,
}

impl<'a> SnapshotEncoder<'a> {
    pub fn new(
        master: &'a MasterKeypair,
        reservation_id: &'a str,
        destination: &'a RsaPublicKey,
    ) -> Self {
        Self {
            master,
            reservation_id,
            destination,
        }
    }
}

impl SlotEncoder for SnapshotEncoder<'_> {
    fn encode(
        &self,
        mut brigade: Brigade,
        slot: Ipv4Addr,
        router: &RouterKey,
    ) -> RecodeResult<PreparedSnapshot> {
        let brigade_id = brigade.brigade_id.clone();

        sanitize(&mut brigade);

        let resealer = RouterResealer::new(self.master, router);
        recode_brigade(&mut brigade, slot, &resealer)
            .map_err(|e| e.in_brigade(&brigade_id, Stage::Recode))?;

        encode_brigade(&brigade, self.reservation_id, self.destination)
            .map_err(|e| e.in_brigade(&brigade_id, Stage::Encode))
    }
}
