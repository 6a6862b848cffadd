//! Exporter-side builders for tests.
//!
//! Builds bundles the same way the exporter does, so the recoder sees
//! realistic input: authority-wrapped secrets, sealed payloads, brigade
//! fields sealed to the master key. Panics on any failure.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::json;

use snaprecode_core::types::{AggregatedSnapshot, Brigade, EncryptedBrigade};
use snaprecode_crypto::{
    b64, encrypt_with_authority, generate_secret, reseal, seal_payload, AuthorityKey,
    CompositeKey, MasterKeypair,
};

pub const TAG: &str = "epoch-2024-05";

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

/// `plaintext` sealed to `master`, base64-encoded like a `*_shuffler_enc` field.
pub fn sealed_to(master: &MasterKeypair, plaintext: &str) -> String {
    b64::encode(&reseal(plaintext.as_bytes(), &master.router_key()).unwrap())
}

/// The exporting datacenter: its authority key and the master key its
/// brigades seal their secrets to.
#[derive(Debug, Clone, Copy)]
pub struct Exporter<'a> {
    pub authority: &'a AuthorityKey,
    pub master: &'a MasterKeypair,
}

impl Exporter<'_> {
    /// A live brigade: counters set, every secret sealed to the master key.
    /// Sealed plaintexts are `{id}-wg-private`, `{id}-ipsec-psk`,
    /// `{id}-u1-psk`, `{id}-u1-outline` and `{id}-u2-psk`.
    pub fn live_brigade(&self, id: &str, addr: &str) -> Brigade {
        let sealed = |what: &str| sealed_to(self.master, &format!("{id}-{what}"));
        serde_json::from_value(json!({
            "brigade_id": id,
            "endpoint_domain": format!("{id}.vpn.example"),
            "endpoint_ipv4": addr,
            "dns_ipv4": "100.64.0.1",
            "brigade_counters": {"total_rx": 123_456, "total_tx": 654_321},
            "stats_counters_stack": [{"rx": 1, "tx": 2}],
            "endpoints": {"198.51.100.7": {"seen": 4}},
            "wg_private_shuffler_enc": sealed("wg-private"),
            "ipsec_psk_shuffler_enc": sealed("ipsec-psk"),
            "users": [
                {
                    "user_id": format!("{id}-u1"),
                    "quotas": {"ver": 2, "limit_monthly_remaining": 1000, "os_counter_mtime": "2024-04-30T00:00:00Z"},
                    "wg_psk_shuffler_enc": sealed("u1-psk"),
                    "outline_secret_shuffler_enc": sealed("u1-outline")
                },
                {
                    "user_id": format!("{id}-u2"),
                    "quotas": {"ver": 2},
                    "wg_psk_shuffler_enc": sealed("u2-psk")
                }
            ]
        }))
        .unwrap()
    }

    /// Envelope for `brigade`.
    pub fn wrap(&self, brigade: &Brigade, psk: &[u8]) -> EncryptedBrigade {
        self.wrap_as(brigade, &brigade.brigade_id, psk)
    }

    /// Envelope labelled `envelope_id` whose payload is `brigade`'s JSON,
    /// sealed under the key derived for `envelope_id`.
    pub fn wrap_as(&self, brigade: &Brigade, envelope_id: &str, psk: &[u8]) -> EncryptedBrigade {
        let global = ts("2024-05-01T11:00:00Z");
        let local = ts("2024-05-01T10:58:17Z");

        let locker = generate_secret();
        let share = generate_secret();
        let key = CompositeKey::new()
            .with_str(TAG)
            .with_str(envelope_id)
            .with_timestamp(global.timestamp())
            .with_timestamp(local.timestamp())
            .with(psk)
            .with(&locker)
            .with(&share);
        let payload = seal_payload(&key, &serde_json::to_vec(brigade).unwrap()).unwrap();

        let fp = self.authority.fingerprint().to_string();
        EncryptedBrigade {
            brigade_id: envelope_id.to_string(),
            tag: TAG.into(),
            global_snapshot_time: global,
            local_snapshot_time: local,
            realm_key_fingerprint: String::new(),
            authority_key_fingerprint: fp.clone(),
            encrypted_locker_secret: self.wrap_secret(locker.as_slice()),
            secrets: BTreeMap::from([(fp, self.wrap_secret(share.as_slice()))]),
            payload: b64::encode(&payload),
        }
    }

    /// Bundle of the given brigades, in order, under a fresh PSK.
    pub fn bundle(&self, brigades: &[Brigade]) -> AggregatedSnapshot {
        let psk = generate_secret();

        AggregatedSnapshot {
            update_time: ts("2024-05-01T11:05:00Z"),
            global_snapshot_time: ts("2024-05-01T11:00:00Z"),
            tag: TAG.into(),
            datacenter_id: "dc-ams-1".into(),
            realm_key_fingerprint: String::new(),
            authority_key_fingerprint: self.authority.fingerprint().to_string(),
            encrypted_preshared_secret: self.wrap_secret(psk.as_slice()),
            errors_count: 0,
            snapshots: brigades.iter().map(|b| self.wrap(b, &psk)).collect(),
        }
    }

    fn wrap_secret(&self, secret: &[u8]) -> String {
        b64::encode(&encrypt_with_authority(self.authority.public_key(), secret).unwrap())
    }
}
