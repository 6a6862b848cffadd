//! NaCl anonymous sealed boxes for per-field brigade secrets
//!
//! Secret fields travel sealed to the master ("shuffler") key. Recoding opens
//! them with the master key pair and reseals each one to the router key of the
//! node the brigade lands on. Every seal uses a fresh ephemeral sender key.

use std::path::Path;

use anyhow::Context;
use crypto_box::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use snaprecode_core::{RecodeError, RecodeResult};

use crate::{b64, NACL_KEY_SIZE};

/// The master key pair that inbound secret fields are sealed to.
pub struct MasterKeypair {
    public: PublicKey,
    secret: SecretKey,
}

/// On-disk form: `{"public": "<base64>", "private": "<base64>"}`
#[derive(Serialize, Deserialize)]
struct KeypairFile {
    public: String,
    private: String,
}

impl MasterKeypair {
    pub fn generate() -> Self {
        Self::from_secret(SecretKey::generate(&mut rand::rngs::OsRng))
    }

    pub fn from_secret(secret: SecretKey) -> Self {
        Self {
            public: secret.public_key(),
            secret,
        }
    }

    /// Parse the JSON key pair, rejecting a public half that does not match.
    pub fn from_json(json: &str) -> RecodeResult<Self> {
        let file: KeypairFile = serde_json::from_str(json)
            .map_err(|e| RecodeError::InvalidKey(format!("master key pair: {e}")))?;

        let private = Zeroizing::new(b64::decode(&file.private, "master private key")?);
        let secret = SecretKey::from(key_array(&private, "master private key")?);
        let public_bytes = b64::decode(&file.public, "master public key")?;
        let public = PublicKey::from(key_array(&public_bytes, "master public key")?);

        let keypair = Self::from_secret(secret);
        if keypair.public.as_bytes() != public.as_bytes() {
            return Err(RecodeError::InvalidKey(
                "master key pair: public key does not match private key".into(),
            ));
        }
        Ok(keypair)
    }

    pub fn to_json(&self) -> RecodeResult<String> {
        let private = Zeroizing::new(self.secret.to_bytes());
        let file = KeypairFile {
            public: b64::encode(self.public.as_bytes()),
            private: b64::encode(&*private),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Read the master key pair file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = Zeroizing::new(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading master key: {}", path.display()))?,
        );
        Self::from_json(&json).with_context(|| format!("parsing master key: {}", path.display()))
    }

    /// The public half, as a sealing target.
    pub fn router_key(&self) -> RouterKey {
        RouterKey(self.public.clone())
    }
}

impl std::fmt::Debug for MasterKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeypair")
            .field("public", &b64::encode(self.public.as_bytes()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Public key of a destination router, the final sealing target.
#[derive(Clone)]
pub struct RouterKey(PublicKey);

impl PartialEq for RouterKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes() == other.0.as_bytes()
    }
}

impl Eq for RouterKey {}

impl RouterKey {
    /// Parse the base64 wire form used in reservation configs.
    pub fn from_wire(encoded: &str) -> RecodeResult<Self> {
        let bytes = b64::decode(encoded, "router public key")?;
        Ok(Self(PublicKey::from(key_array(&bytes, "router public key")?)))
    }

    pub fn to_wire(&self) -> String {
        b64::encode(self.0.as_bytes())
    }
}

impl std::fmt::Debug for RouterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RouterKey").field(&self.to_wire()).finish()
    }
}

fn key_array(bytes: &[u8], what: &str) -> RecodeResult<[u8; NACL_KEY_SIZE]> {
    <[u8; NACL_KEY_SIZE]>::try_from(bytes).map_err(|_| {
        RecodeError::InvalidKey(format!(
            "{what}: expected {NACL_KEY_SIZE} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Open a sealed box addressed to the master key pair.
pub fn open_sealed(ciphertext: &[u8], recipient: &MasterKeypair) -> RecodeResult<Zeroizing<Vec<u8>>> {
    recipient
        .secret
        .unseal(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| RecodeError::DecryptionFailed("sealed box".into()))
}

/// Seal `plaintext` to `recipient` with a fresh ephemeral sender key.
pub fn reseal(plaintext: &[u8], recipient: &RouterKey) -> RecodeResult<Vec<u8>> {
    recipient
        .0
        .seal(&mut rand::rngs::OsRng, plaintext)
        .map_err(|e| RecodeError::EncryptionFailed(format!("sealed box: {e}")))
}
