//! Sender role
//!
//! Holds the two messages. Publishes `S = s·G`, then encrypts message `i`
//! under the `i`-th candidate key derived from the receiver's public value.

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::Zeroizing;

use crate::key_agreement::{self, derive_sender_keys, parse_public_point};
use crate::types::{EncryptedMessage, PrivateScalar, PublicPoint, SenderConfig};
use crate::{cipher, Result};

/// Sender side of a single transfer
///
/// Single-use: encrypting a different message pair under the same private
/// key lets a curious party correlate runs.
pub struct Sender {
    private_scalar: PrivateScalar,
    public_point: PublicPoint,
    message0: Zeroizing<Vec<u8>>,
    message1: Zeroizing<Vec<u8>>,
}

impl Sender {
    /// Create a sender, drawing a fresh key from the OS if none is supplied
    pub fn new(config: SenderConfig) -> Result<Self> {
        Self::from_rng(config, &mut OsRng)
    }

    /// Create a sender with an explicit randomness source
    pub fn from_rng<R: RngCore + CryptoRng>(config: SenderConfig, rng: &mut R) -> Result<Self> {
        let private_scalar = key_agreement::resolve_private_key(&config.private_key, rng)?;
        let public_point = key_agreement::public_point_of(&private_scalar);

        Ok(Self {
            private_scalar,
            public_point,
            message0: Zeroizing::new(config.message0),
            message1: Zeroizing::new(config.message1),
        })
    }

    /// `S = s·G`
    pub fn public_key(&self) -> PublicPoint {
        self.public_point
    }

    /// Encrypt both messages against the receiver's public value
    pub fn encrypt_messages(
        &self,
        receiver_public_key: &[u8],
    ) -> Result<(EncryptedMessage, EncryptedMessage)> {
        self.encrypt_messages_with_rng(receiver_public_key, &mut OsRng)
    }

    /// Same as [`Sender::encrypt_messages`] with an explicit nonce source
    pub fn encrypt_messages_with_rng<R: RngCore + CryptoRng>(
        &self,
        receiver_public_key: &[u8],
        rng: &mut R,
    ) -> Result<(EncryptedMessage, EncryptedMessage)> {
        let receiver_point = parse_public_point(receiver_public_key)?;
        let (key0, key1) =
            derive_sender_keys(&receiver_point, &self.private_scalar, &self.public_point);

        let encrypted0 = cipher::encrypt(&self.message0, &key0, rng)?;
        let encrypted1 = cipher::encrypt(&self.message1, &key1, rng)?;

        debug!("Encrypted both messages");
        Ok((encrypted0, encrypted1))
    }
}
