//! Message encryption under derived keys
//!
//! XChaCha20-Poly1305: 32-byte key, 24-byte nonce, 16-byte tag appended to the
//! ciphertext, no associated data.

use aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand_core::{CryptoRng, RngCore};

use crate::types::{DerivedKey, EncryptedMessage, NONCE_LENGTH};
use crate::{Error, Result};

/// Length of the Poly1305 tag
pub const TAG_LENGTH: usize = 16;

/// Seal `plaintext` under `key` with a fresh random nonce
pub fn encrypt<R: RngCore + CryptoRng>(
    plaintext: &[u8],
    key: &DerivedKey,
    rng: &mut R,
) -> Result<EncryptedMessage> {
    let mut nonce = [0u8; NONCE_LENGTH];
    rng.try_fill_bytes(&mut nonce)
        .map_err(|e| Error::RandomnessUnavailable(e.to_string()))?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|e| Error::Crypto(e.to_string()))?;

    Ok(EncryptedMessage::from_parts(ciphertext, nonce))
}

/// Open an encrypted message, failing if the tag does not verify
pub fn decrypt(encrypted: &EncryptedMessage, key: &DerivedKey) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(XNonce::from_slice(encrypted.nonce()), encrypted.ciphertext())
        .map_err(|_| Error::AuthenticationFailure)
}
