//! Sealed brigade payloads
//!
//! Payload format (binary, base64 on the wire):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! key = HKDF-SHA256(ikm = composite key, info = "brigade-snapshot-payload")
//! plaintext = zstd frame of the brigade JSON
//! ```

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use snaprecode_core::{RecodeError, RecodeResult};

use crate::{NONCE_SIZE, SECRET_SIZE, TAG_SIZE};

const PAYLOAD_INFO: &[u8] = b"brigade-snapshot-payload";
const ZSTD_LEVEL: i32 = 3;

/// Key material assembled from several independent secrets.
///
/// Parts are concatenated in the order they are added; timestamps go in as
/// 8-byte big-endian Unix seconds.
#[derive(Default)]
pub struct CompositeKey(Zeroizing<Vec<u8>>);

impl CompositeKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, part: &[u8]) -> Self {
        self.0.extend_from_slice(part);
        self
    }

    pub fn with_str(self, part: &str) -> Self {
        self.with(part.as_bytes())
    }

    pub fn with_timestamp(self, unix_seconds: i64) -> Self {
        self.with(&unix_seconds.to_be_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn derive_key(&self) -> RecodeResult<Zeroizing<[u8; 32]>> {
        let hkdf = Hkdf::<Sha256>::new(None, &self.0);
        let mut okm = Zeroizing::new([0u8; 32]);
        hkdf.expand(PAYLOAD_INFO, &mut *okm)
            .map_err(|e| RecodeError::EncryptionFailed(format!("HKDF expand: {e}")))?;
        Ok(okm)
    }
}

impl std::fmt::Debug for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeKey")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// Fresh random per-snapshot secret.
pub fn generate_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0u8; SECRET_SIZE]);
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

/// Compress and encrypt a payload under `key`.
pub fn seal_payload(key: &CompositeKey, plaintext: &[u8]) -> RecodeResult<Vec<u8>> {
    let compressed = Zeroizing::new(
        zstd::bulk::compress(plaintext, ZSTD_LEVEL)
            .map_err(|e| RecodeError::Encoding(format!("zstd compress: {e}")))?,
    );

    let aead_key = key.derive_key()?;
    let cipher = XChaCha20Poly1305::new((&*aead_key).into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, compressed.as_slice())
        .map_err(|e| RecodeError::EncryptionFailed(format!("payload: {e}")))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt and decompress a payload, refusing output larger than `max_len`.
pub fn open_payload(
    key: &CompositeKey,
    sealed: &[u8],
    max_len: usize,
) -> RecodeResult<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(RecodeError::DecryptionFailed(format!(
            "payload too short: {} bytes (minimum {})",
            sealed.len(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let aead_key = key.derive_key()?;
    let cipher = XChaCha20Poly1305::new((&*aead_key).into());

    let compressed = Zeroizing::new(
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| RecodeError::DecryptionFailed("payload: wrong key or corrupted data".into()))?,
    );

    zstd::bulk::decompress(&compressed, max_len)
        .map(Zeroizing::new)
        .map_err(|e| RecodeError::Encoding(format!("zstd decompress: {e}")))
}
