//! Realm public keys, stored one per line in `authorized_keys` format.

use std::path::Path;

use anyhow::Context;
use rsa::RsaPublicKey;
use ssh_key::HashAlg;

use snaprecode_core::{RecodeError, RecodeResult};

use crate::authority::rsa_public_from_ssh;

#[derive(Debug, Clone)]
pub struct RealmKey {
    pub fingerprint: String,
    pub public_key: RsaPublicKey,
    pub comment: String,
}

/// Parse every usable `ssh-rsa` line. Comments, blank lines and other key
/// types are skipped; malformed lines are logged and skipped.
pub fn parse_realm_keys(content: &str) -> Vec<RealmKey> {
    let mut keys = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let kind = line.split_whitespace().next().unwrap_or_default();
        if kind != "ssh-rsa" {
            tracing::debug!(line = lineno + 1, kind, "skipping non-RSA realm key");
            continue;
        }

        match parse_realm_line(line) {
            Ok(key) => keys.push(key),
            Err(e) => tracing::warn!(line = lineno + 1, error = %e, "skipping malformed realm key"),
        }
    }
    keys
}

fn parse_realm_line(line: &str) -> RecodeResult<RealmKey> {
    let key = ssh_key::PublicKey::from_openssh(line)
        .map_err(|e| RecodeError::InvalidKey(format!("realm key: {e}")))?;
    let rsa = key
        .key_data()
        .rsa()
        .ok_or_else(|| RecodeError::InvalidKey("realm key is not ssh-rsa".into()))?;

    Ok(RealmKey {
        fingerprint: key.fingerprint(HashAlg::Sha256).to_string(),
        public_key: rsa_public_from_ssh(rsa)?,
        comment: key.comment().to_string(),
    })
}

/// Find the realm key whose fingerprint is `fp`.
pub fn find_realm_key(content: &str, fp: &str) -> RecodeResult<RsaPublicKey> {
    parse_realm_keys(content)
        .into_iter()
        .find(|k| k.fingerprint == fp)
        .map(|k| k.public_key)
        .ok_or_else(|| RecodeError::InvalidKey(format!("realm key not found: {fp}")))
}

/// Read the realms key file and resolve `fp` in it.
pub fn load_realm_key(path: &Path, fp: &str) -> anyhow::Result<RsaPublicKey> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading realms keys: {}", path.display()))?;
    let key = find_realm_key(&content, fp).with_context(|| format!("in {}", path.display()))?;
    tracing::debug!(path = %path.display(), fingerprint = fp, "realm key resolved");
    Ok(key)
}
