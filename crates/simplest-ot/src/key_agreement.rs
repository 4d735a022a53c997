//! Key agreement for Simplest OT
//!
//! Curve arithmetic over secp256k1 that turns the two public values of a run
//! into symmetric keys. With `S = s·G`:
//!
//! - choice 0: the receiver sends `R = r·G`, and `H(s·R) = H(r·S)`
//! - choice 1: the receiver sends `R = S + r·G`, and `H(s·(R - S)) = H(r·S)`
//!
//! The sender derives both candidates; the receiver can only derive the one
//! matching its choice.

use k256::{
    elliptic_curve::sec1::ToEncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, PublicKey,
};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::{Choice, ConditionallySelectable};

use crate::types::{DerivedKey, PrivateKeySource, PrivateScalar, PublicPoint, POINT_LENGTH};
use crate::{Error, Result};

/// Draw a uniformly random scalar in [1, n-1]
///
/// Rejection-samples 32-byte strings, so any failure of the entropy source is
/// reported instead of panicking.
pub fn generate_private_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<PrivateScalar> {
    let mut bytes = FieldBytes::default();

    loop {
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| Error::RandomnessUnavailable(e.to_string()))?;

        if let Some(scalar) = Option::<NonZeroScalar>::from(NonZeroScalar::from_repr(bytes)) {
            return Ok(PrivateScalar::from_non_zero(scalar));
        }
    }
}

/// `scalar·G`
pub fn public_point_of(scalar: &PrivateScalar) -> PublicPoint {
    PublicPoint::from_projective(ProjectivePoint::GENERATOR * scalar.as_scalar())
}

/// Parse a peer's SEC1 compressed point
///
/// Only the 33-byte compressed form is accepted. The identity has no
/// compressed encoding, so it is rejected along with off-curve x-coordinates.
pub fn parse_public_point(bytes: &[u8]) -> Result<PublicPoint> {
    if bytes.len() != POINT_LENGTH {
        return Err(Error::InvalidPoint(format!(
            "expected {} bytes, got {}",
            POINT_LENGTH,
            bytes.len()
        )));
    }
    if bytes[0] != 0x02 && bytes[0] != 0x03 {
        return Err(Error::InvalidPoint(format!(
            "unexpected tag byte {:#04x}",
            bytes[0]
        )));
    }

    let public_key = PublicKey::from_sec1_bytes(bytes)
        .map_err(|_| Error::InvalidPoint("not a point on secp256k1".into()))?;

    Ok(PublicPoint::from_projective(public_key.to_projective()))
}

/// Receiver's public value: `r·G` for choice 0, `S + r·G` for choice 1
pub fn derive_receiver_public_value(
    choice_bit: bool,
    sender_point: &PublicPoint,
    receiver_scalar: &PrivateScalar,
) -> PublicPoint {
    let own = ProjectivePoint::GENERATOR * receiver_scalar.as_scalar();
    let shifted = *sender_point.as_projective() + own;

    // Both candidates are computed so the choice only drives a select
    PublicPoint::from_projective(ProjectivePoint::conditional_select(
        &own,
        &shifted,
        Choice::from(choice_bit as u8),
    ))
}

/// Sender's candidate keys `(H(s·R), H(s·(R - S)))`
pub fn derive_sender_keys(
    receiver_point: &PublicPoint,
    sender_scalar: &PrivateScalar,
    sender_point: &PublicPoint,
) -> (DerivedKey, DerivedKey) {
    let s = sender_scalar.as_scalar();
    let r = receiver_point.as_projective();

    let key0 = hash_point(&(*r * s));
    let key1 = hash_point(&((*r - sender_point.as_projective()) * s));

    (key0, key1)
}

/// Receiver's key `H(r·S)`
pub fn derive_receiver_key(sender_point: &PublicPoint, receiver_scalar: &PrivateScalar) -> DerivedKey {
    hash_point(&(*sender_point.as_projective() * receiver_scalar.as_scalar()))
}

/// SHA-256 over the compressed encoding of a point
fn hash_point(point: &ProjectivePoint) -> DerivedKey {
    let encoded = point.to_affine().to_encoded_point(true);
    DerivedKey::from_bytes(Sha256::digest(encoded.as_bytes()).into())
}

/// Resolve a configured key source into a scalar
pub(crate) fn resolve_private_key<R: RngCore + CryptoRng>(
    source: &PrivateKeySource,
    rng: &mut R,
) -> Result<PrivateScalar> {
    match source {
        PrivateKeySource::Provided(bytes) => PrivateScalar::from_bytes(bytes),
        PrivateKeySource::Generate => generate_private_scalar(rng),
    }
}
