//! Secret Re-encryptor: moves sealed fields from the master key to a router key.

use std::net::Ipv4Addr;

use snaprecode_core::types::{Brigade, SealedField};
use snaprecode_core::{RecodeError, RecodeResult};
use snaprecode_crypto::{b64, open_sealed, reseal, MasterKeypair, RouterKey};

/// Turns one shuffler-layer ciphertext (base64) into its router-layer form.
pub trait SecretResealer {
    fn reseal(&self, field: &str, shuffler_enc: &str) -> RecodeResult<String>;
}

/// Opens with the master key pair, seals to the destination router.
pub struct RouterResealer<'a> {
    master: &'a MasterKeypair,
    router: &'a RouterKey,
}

impl<'a> RouterResealer<'a> {
    pub fn new(master: &'a MasterKeypair, router: &'a RouterKey) -> Self {
        Self { master, router }
    }
}

impl SecretResealer for RouterResealer<'_> {
    fn reseal(&self, field: &str, shuffler_enc: &str) -> RecodeResult<String> {
        let sealed = b64::decode(shuffler_enc, field)?;
        let plaintext = open_sealed(&sealed, self.master)
            .map_err(|_| RecodeError::DecryptionFailed(field.to_string()))?;
        Ok(b64::encode(&reseal(&plaintext, self.router)?))
    }
}

/// Move the brigade to `slot` and reseal every secret it carries.
///
/// Required fields must be present; empty optional fields are left empty
/// on the router side and never reach the resealer.
pub fn recode_brigade(
    brigade: &mut Brigade,
    slot: Ipv4Addr,
    resealer: &dyn SecretResealer,
) -> RecodeResult<()> {
    brigade.endpoint_ipv4 = slot;

    for field in brigade.sealed_fields_mut() {
        reseal_field(field, resealer)?;
    }

    for (idx, user) in brigade.users.iter_mut().enumerate() {
        for field in user.sealed_fields_mut() {
            reseal_field(field, resealer).map_err(|e| match e {
                RecodeError::DecryptionFailed(what) => {
                    RecodeError::DecryptionFailed(format!("user {idx}: {what}"))
                }
                other => other,
            })?;
        }
    }
    Ok(())
}

fn reseal_field(field: SealedField<'_>, resealer: &dyn SecretResealer) -> RecodeResult<()> {
    if field.shuffler.is_empty() {
        if field.required {
            return Err(RecodeError::DecryptionFailed(format!("{}: empty", field.name)));
        }
        field.router.clear();
        return Ok(());
    }
    *field.router = resealer.reseal(field.name, field.shuffler)?;
    Ok(())
}
