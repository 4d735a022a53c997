//! Core types for the Simplest OT protocol

use k256::{elliptic_curve::sec1::ToEncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Error, Result};

/// Unique identifier for a transfer session
pub type SessionId = [u8; 32];

/// Length of a SEC1 compressed point
pub const POINT_LENGTH: usize = 33;

/// Length of a big-endian private scalar
pub const SCALAR_LENGTH: usize = 32;

/// Length of a derived symmetric key
pub const KEY_LENGTH: usize = 32;

/// Nonce length required by XChaCha20-Poly1305
pub const NONCE_LENGTH: usize = 24;

/// Role of a party in a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Holds the two messages
    Sender,
    /// Holds the choice bit
    Receiver,
}

/// Secret scalar in [1, n-1], owned by a single party
///
/// Wiped on drop. Only built from a `NonZeroScalar`, so it is never zero
/// while alive.
#[derive(Clone)]
pub struct PrivateScalar(Scalar);

impl PrivateScalar {
    /// Parse a 32-byte big-endian scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCALAR_LENGTH {
            return Err(Error::InvalidPrivateKey);
        }
        let repr = FieldBytes::clone_from_slice(bytes);
        Option::<NonZeroScalar>::from(NonZeroScalar::from_repr(repr))
            .map(Self::from_non_zero)
            .ok_or(Error::InvalidPrivateKey)
    }

    /// Big-endian encoding of the scalar
    pub fn to_bytes(&self) -> [u8; SCALAR_LENGTH] {
        self.0.to_bytes().into()
    }

    pub(crate) fn from_non_zero(scalar: NonZeroScalar) -> Self {
        Self(*scalar)
    }

    pub(crate) fn as_scalar(&self) -> &Scalar {
        &self.0
    }
}

impl Drop for PrivateScalar {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for PrivateScalar {}

impl fmt::Debug for PrivateScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateScalar(..)")
    }
}

/// Curve point exchanged between the parties
///
/// Encoded on the wire as a 33-byte SEC1 compressed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicPoint(ProjectivePoint);

impl PublicPoint {
    /// Parse a compressed point, rejecting the identity
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        crate::key_agreement::parse_public_point(bytes)
    }

    /// SEC1 compressed encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_affine().to_encoded_point(true).as_bytes().to_vec()
    }

    pub(crate) fn from_projective(point: ProjectivePoint) -> Self {
        Self(point)
    }

    pub(crate) fn as_projective(&self) -> &ProjectivePoint {
        &self.0
    }
}

impl Serialize for PublicPoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for PublicPoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(encoded).map_err(serde::de::Error::custom)?;
        PublicPoint::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Symmetric key obtained by hashing a shared point
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LENGTH]);

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl ConstantTimeEq for DerivedKey {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for DerivedKey {}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// AEAD ciphertext together with the nonce it was sealed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMessage {
    /// Ciphertext with the 16-byte tag appended
    #[serde(with = "hex_bytes")]
    ciphertext: Vec<u8>,
    #[serde(with = "nonce_hex")]
    nonce: [u8; NONCE_LENGTH],
}

impl EncryptedMessage {
    /// Rebuild an encrypted message received from a peer
    pub fn new(ciphertext: Vec<u8>, nonce: &[u8]) -> Result<Self> {
        let nonce: [u8; NONCE_LENGTH] =
            nonce.try_into().map_err(|_| Error::InvalidNonceLength {
                expected: NONCE_LENGTH,
                actual: nonce.len(),
            })?;
        Ok(Self { ciphertext, nonce })
    }

    pub(crate) fn from_parts(ciphertext: Vec<u8>, nonce: [u8; NONCE_LENGTH]) -> Self {
        Self { ciphertext, nonce }
    }

    /// Ciphertext bytes, tag included
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Nonce the ciphertext was sealed under
    pub fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod nonce_hex {
    use super::NONCE_LENGTH;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(nonce: &[u8; NONCE_LENGTH], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::hex_bytes::serialize(nonce, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; NONCE_LENGTH], D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = super::hex_bytes::deserialize(deserializer)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("Invalid nonce length"))
    }
}

/// Where a party's private scalar comes from
#[derive(Clone, Default)]
pub enum PrivateKeySource {
    /// Caller-supplied 32-byte big-endian scalar
    Provided([u8; SCALAR_LENGTH]),
    /// Draw a fresh scalar from the secure random source
    #[default]
    Generate,
}

impl fmt::Debug for PrivateKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateKeySource::Provided(_) => f.write_str("Provided(..)"),
            PrivateKeySource::Generate => f.write_str("Generate"),
        }
    }
}

/// Construction parameters for a sender
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Source of the sender's private scalar
    pub private_key: PrivateKeySource,
    /// Message delivered when the choice bit is 0
    pub message0: Vec<u8>,
    /// Message delivered when the choice bit is 1
    pub message1: Vec<u8>,
}

impl SenderConfig {
    /// Sender config with a freshly generated private key
    pub fn new(message0: impl Into<Vec<u8>>, message1: impl Into<Vec<u8>>) -> Self {
        Self {
            private_key: PrivateKeySource::Generate,
            message0: message0.into(),
            message1: message1.into(),
        }
    }

    /// Use a caller-supplied private key
    pub fn with_private_key(mut self, private_key: [u8; SCALAR_LENGTH]) -> Self {
        self.private_key = PrivateKeySource::Provided(private_key);
        self
    }
}

/// Construction parameters for a receiver
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Source of the receiver's private scalar
    pub private_key: PrivateKeySource,
    /// Which of the two messages to recover
    pub choice_bit: bool,
}

impl ReceiverConfig {
    /// Receiver config with a freshly generated private key
    pub fn new(choice_bit: bool) -> Self {
        Self {
            private_key: PrivateKeySource::Generate,
            choice_bit,
        }
    }

    /// Use a caller-supplied private key
    pub fn with_private_key(mut self, private_key: [u8; SCALAR_LENGTH]) -> Self {
        self.private_key = PrivateKeySource::Provided(private_key);
        self
    }
}
