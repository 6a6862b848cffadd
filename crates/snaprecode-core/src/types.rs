//! Wire documents: snapshot bundles in, restore plans out.
//!
//! Everything here is plain serde data. Fields the recoder does not act on are
//! kept in flattened passthrough maps so a brigade survives decode → encode
//! without losing state it does not understand.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Treats missing timestamps, the Unix epoch and anything before it as unset.
pub fn is_zero_time(t: &DateTime<Utc>) -> bool {
    t.timestamp() <= 0
}

/// Brigade ID → address pins read from the optional mapping file.
pub type PinMap = BTreeMap<String, Ipv4Addr>;

/// Authority-level snapshot bundle produced by the exporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatedSnapshot {
    pub update_time: DateTime<Utc>,
    pub global_snapshot_time: DateTime<Utc>,
    /// Deployment epoch / namespace marker
    pub tag: String,
    pub datacenter_id: String,
    /// Must be empty: the bundle is not yet bound to a realm
    pub realm_key_fingerprint: String,
    pub authority_key_fingerprint: String,
    /// Bundle-wide secret, RSA-encrypted to the authority (base64)
    pub encrypted_preshared_secret: String,
    /// Number of brigades the exporter failed to snapshot
    pub errors_count: u64,
    pub snapshots: Vec<EncryptedBrigade>,
}

/// One brigade as exported: authority-wrapped secrets plus sealed payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptedBrigade {
    pub brigade_id: String,
    pub tag: String,
    pub global_snapshot_time: DateTime<Utc>,
    pub local_snapshot_time: DateTime<Utc>,
    pub realm_key_fingerprint: String,
    pub authority_key_fingerprint: String,
    /// RSA-encrypted locker secret (base64)
    pub encrypted_locker_secret: String,
    /// Authority fingerprint → RSA-encrypted share (base64)
    pub secrets: BTreeMap<String, String>,
    /// base64 of `[nonce][XChaCha20-Poly1305(zstd(json))]`
    pub payload: String,
}

/// Plaintext brigade record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brigade {
    pub brigade_id: String,
    #[serde(default)]
    pub endpoint_domain: String,
    pub endpoint_ipv4: Ipv4Addr,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub brigade_counters: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub stats_counters_stack: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub endpoints: Value,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wg_private_shuffler_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wg_private_router_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ov_ca_key_shuffler_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ov_ca_key_router_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipsec_psk_shuffler_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipsec_psk_router_enc: String,

    #[serde(default)]
    pub users: Vec<User>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub quotas: Quota,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wg_psk_shuffler_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wg_psk_router_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cloak_bypass_uid_shuffler_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cloak_bypass_uid_router_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipsec_username_shuffler_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipsec_username_router_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipsec_password_shuffler_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipsec_password_router_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub outline_secret_shuffler_enc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub outline_secret_router_enc: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-user quota: schema version plus whatever usage counters it carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quota {
    #[serde(default)]
    pub ver: i64,
    #[serde(flatten)]
    pub usage: Map<String, Value>,
}

/// A secret stored under both sealing layers.
///
/// `shuffler` is the inbound ciphertext (sealed to the master key),
/// `router` receives the ciphertext resealed to the destination node.
pub struct SealedField<'a> {
    pub name: &'static str,
    pub required: bool,
    pub shuffler: &'a str,
    pub router: &'a mut String,
}

impl Brigade {
    pub fn sealed_fields_mut(&mut self) -> [SealedField<'_>; 3] {
        [
            SealedField {
                name: "wg private key",
                required: true,
                shuffler: &self.wg_private_shuffler_enc,
                router: &mut self.wg_private_router_enc,
            },
            SealedField {
                name: "openvpn ca key",
                required: false,
                shuffler: &self.ov_ca_key_shuffler_enc,
                router: &mut self.ov_ca_key_router_enc,
            },
            SealedField {
                name: "ipsec psk",
                required: false,
                shuffler: &self.ipsec_psk_shuffler_enc,
                router: &mut self.ipsec_psk_router_enc,
            },
        ]
    }

    /// Names served for this brigade in a prepared snapshot.
    pub fn domain_names(&self) -> Vec<String> {
        vec![self.endpoint_domain.clone()]
    }
}

impl User {
    pub fn sealed_fields_mut(&mut self) -> [SealedField<'_>; 5] {
        [
            SealedField {
                name: "wg psk",
                required: true,
                shuffler: &self.wg_psk_shuffler_enc,
                router: &mut self.wg_psk_router_enc,
            },
            SealedField {
                name: "cloak bypass uid",
                required: false,
                shuffler: &self.cloak_bypass_uid_shuffler_enc,
                router: &mut self.cloak_bypass_uid_router_enc,
            },
            SealedField {
                name: "ipsec username",
                required: false,
                shuffler: &self.ipsec_username_shuffler_enc,
                router: &mut self.ipsec_username_router_enc,
            },
            SealedField {
                name: "ipsec password",
                required: false,
                shuffler: &self.ipsec_password_shuffler_enc,
                router: &mut self.ipsec_password_router_enc,
            },
            SealedField {
                name: "outline secret",
                required: false,
                shuffler: &self.outline_secret_shuffler_enc,
                router: &mut self.outline_secret_router_enc,
            },
        ]
    }
}

/// Destination topology for a migration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    pub reservation_id: String,
    pub plan: Vec<ControlNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlNode {
    pub control_ip: String,
    /// NaCl box public key of the node's router (base64, 32 bytes)
    pub router_public_key: String,
    pub slots: Vec<Ipv4Addr>,
}

impl ReservationConfig {
    pub fn total_slots(&self) -> usize {
        self.plan.iter().map(|n| n.slots.len()).sum()
    }
}

/// Ready-to-apply output of a recode run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestorePlan {
    pub reservation_id: String,
    /// Fingerprint of the destination authority key
    pub realm_fingerprint: String,
    pub plan: Vec<RestoreNodeConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoreNodeConfig {
    pub control_ip: String,
    pub snapshots: Vec<PreparedSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedSnapshot {
    pub brigade_id: String,
    pub endpoint_ipv4: Ipv4Addr,
    pub domain_names: Vec<String>,
    /// Fresh per-brigade secret, RSA-encrypted to the destination authority (base64)
    pub encrypted_secret: String,
    pub payload: String,
}
