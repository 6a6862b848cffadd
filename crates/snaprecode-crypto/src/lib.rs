//! snaprecode-crypto: the secret codec behind snapshot recoding
//!
//! Layers, outermost first:
//! ```text
//! Authority RSA key (per datacenter, OAEP/SHA-256)
//!   ├── bundle pre-shared secret
//!   ├── per-brigade locker secret
//!   └── per-brigade authority share
//!         └── composite key = tag || brigade_id || times || psk || locker || share
//!               └── payload: XChaCha20-Poly1305(HKDF(composite), zstd(json))
//! Master "shuffler" NaCl key pair
//!   └── sealed secret fields inside the brigade (resealed to router keys)
//! ```

pub mod authority;
pub mod payload;
pub mod realms;
pub mod sealed;

pub use authority::{
    decrypt_with_authority, encode_ssh_public_key, encrypt_with_authority, fingerprint,
    AuthorityKey,
};
pub use payload::{generate_secret, open_payload, seal_payload, CompositeKey};
pub use realms::{find_realm_key, load_realm_key, parse_realm_keys, RealmKey};
pub use sealed::{open_sealed, reseal, MasterKeypair, RouterKey};

pub use rsa::{RsaPrivateKey, RsaPublicKey};

/// Size of the random secrets minted per prepared snapshot
pub const SECRET_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of a NaCl box key (public or private)
pub const NACL_KEY_SIZE: usize = 32;

/// Standard base64, as used by every ciphertext field in the wire formats.
pub mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use snaprecode_core::{RecodeError, RecodeResult};

    pub fn encode(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    /// Decode, naming the field in the error.
    pub fn decode(s: &str, what: &str) -> RecodeResult<Vec<u8>> {
        STANDARD
            .decode(s.trim())
            .map_err(|e| RecodeError::Encoding(format!("base64 {what}: {e}")))
    }
}
