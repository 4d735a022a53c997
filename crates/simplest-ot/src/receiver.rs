//! Receiver role
//!
//! The receiver moves through `Uninitialized → KeyDerived → {Resolved,
//! Unresolved}`. Trial decryption of the two ciphertexts runs the same
//! sequence of operations whichever one opens, and the outcome of each attempt
//! is carried as a [`subtle::Choice`] rather than as an error.

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable};
use tracing::debug;
use zeroize::Zeroizing;

use crate::key_agreement::{self, derive_receiver_key, derive_receiver_public_value};
use crate::types::{DerivedKey, EncryptedMessage, PrivateScalar, PublicPoint, ReceiverConfig};
use crate::{cipher, Error, Result};

/// Observable phase of a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverPhase {
    /// Waiting for the sender's public key
    Uninitialized,
    /// Key derived, waiting for the ciphertexts
    KeyDerived,
    /// Exactly one ciphertext opened
    Resolved,
    /// Neither or both ciphertexts opened
    Unresolved,
}

enum State {
    Uninitialized,
    KeyDerived(DerivedKey),
    Resolved(Zeroizing<Vec<u8>>),
    Unresolved,
}

/// Result of one trial decryption
struct TrialOutcome {
    opened: Choice,
    plaintext: Zeroizing<Vec<u8>>,
}

impl TrialOutcome {
    fn attempt(encrypted: &EncryptedMessage, key: &DerivedKey) -> Self {
        let result = cipher::decrypt(encrypted, key);
        let opened = Choice::from(result.is_ok() as u8);

        Self {
            opened,
            plaintext: Zeroizing::new(result.unwrap_or_default()),
        }
    }
}

/// Receiver side of a single transfer
pub struct Receiver {
    private_scalar: PrivateScalar,
    choice_bit: bool,
    state: State,
}

impl Receiver {
    /// Create a receiver, drawing a fresh key from the OS if none is supplied
    pub fn new(config: ReceiverConfig) -> Result<Self> {
        Self::from_rng(config, &mut OsRng)
    }

    /// Create a receiver with an explicit randomness source
    pub fn from_rng<R: RngCore + CryptoRng>(config: ReceiverConfig, rng: &mut R) -> Result<Self> {
        let private_scalar = key_agreement::resolve_private_key(&config.private_key, rng)?;

        Ok(Self {
            private_scalar,
            choice_bit: config.choice_bit,
            state: State::Uninitialized,
        })
    }

    /// Current phase
    pub fn phase(&self) -> ReceiverPhase {
        match self.state {
            State::Uninitialized => ReceiverPhase::Uninitialized,
            State::KeyDerived(_) => ReceiverPhase::KeyDerived,
            State::Resolved(_) => ReceiverPhase::Resolved,
            State::Unresolved => ReceiverPhase::Unresolved,
        }
    }

    /// Derive the decryption key from the sender's public key and return `R`
    ///
    /// On a malformed sender key the receiver stays uninitialized.
    pub fn public_key(&mut self, sender_public_key: &[u8]) -> Result<PublicPoint> {
        if !matches!(self.state, State::Uninitialized) {
            return Err(Error::InvalidState(
                "receiver key has already been derived".into(),
            ));
        }

        let sender_point = key_agreement::parse_public_point(sender_public_key)?;
        let key = derive_receiver_key(&sender_point, &self.private_scalar);
        let public_value =
            derive_receiver_public_value(self.choice_bit, &sender_point, &self.private_scalar);

        self.state = State::KeyDerived(key);
        debug!("Receiver key derived");

        Ok(public_value)
    }

    /// Trial-decrypt both ciphertexts and keep the one that opens
    ///
    /// Per-ciphertext authentication failures are absorbed. If zero or two
    /// ciphertexts open, the receiver ends up unresolved.
    pub fn decrypt(
        &mut self,
        encrypted0: &EncryptedMessage,
        encrypted1: &EncryptedMessage,
    ) -> Result<()> {
        let State::KeyDerived(key) = &self.state else {
            return Err(Error::InvalidState(
                "decrypt requires a derived key and may only run once".into(),
            ));
        };

        let first = TrialOutcome::attempt(encrypted0, key);
        let second = TrialOutcome::attempt(encrypted1, key);

        let (resolved, plaintext) = select_opened(&first, &second);

        self.state = if resolved {
            State::Resolved(plaintext)
        } else {
            State::Unresolved
        };
        debug!(resolved, "Receiver trial decryption finished");

        Ok(())
    }

    /// The recovered message
    pub fn get_message(&self) -> Result<&[u8]> {
        match &self.state {
            State::Resolved(message) => Ok(message.as_slice()),
            _ => Err(Error::NoMessageAvailable),
        }
    }
}

/// Constant-time pick of the opened plaintext
///
/// Both candidates are walked over the wider of the two lengths, so the work
/// done does not depend on which attempt opened.
fn select_opened(first: &TrialOutcome, second: &TrialOutcome) -> (bool, Zeroizing<Vec<u8>>) {
    let take_second = second.opened;
    let width = first.plaintext.len().max(second.plaintext.len());
    let mut selected = Zeroizing::new(vec![0u8; width]);

    for (i, byte) in selected.iter_mut().enumerate() {
        let a = first.plaintext.get(i).copied().unwrap_or(0);
        let b = second.plaintext.get(i).copied().unwrap_or(0);
        *byte = u8::conditional_select(&a, &b, take_second);
    }

    let len = u64::conditional_select(
        &(first.plaintext.len() as u64),
        &(second.plaintext.len() as u64),
        take_second,
    );
    selected.truncate(len as usize);

    let resolved = first.opened ^ second.opened;
    (resolved.into(), selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_agreement::tests::BrokenRng;
    use crate::key_agreement::{generate_private_scalar, public_point_of};
    use crate::{Sender, SenderConfig};

    fn outcome(opened: bool, plaintext: &[u8]) -> TrialOutcome {
        TrialOutcome {
            opened: Choice::from(opened as u8),
            plaintext: Zeroizing::new(plaintext.to_vec()),
        }
    }

    #[test]
    fn test_get_message_before_decrypt() {
        let receiver = Receiver::new(ReceiverConfig::new(true)).unwrap();
        assert!(matches!(
            receiver.get_message(),
            Err(Error::NoMessageAvailable)
        ));
        assert_eq!(receiver.phase(), ReceiverPhase::Uninitialized);
    }

    #[test]
    fn test_invalid_sender_key_keeps_uninitialized() {
        let mut receiver = Receiver::new(ReceiverConfig::new(false)).unwrap();

        assert!(matches!(
            receiver.public_key(b"not a point"),
            Err(Error::InvalidPoint(_))
        ));
        assert_eq!(receiver.phase(), ReceiverPhase::Uninitialized);

        // still usable after the failure
        let sender = Sender::new(SenderConfig::new("a", "b")).unwrap();
        receiver.public_key(&sender.public_key().to_bytes()).unwrap();
        assert_eq!(receiver.phase(), ReceiverPhase::KeyDerived);
    }

    #[test]
    fn test_public_key_only_once() {
        let sender = Sender::new(SenderConfig::new("a", "b")).unwrap();
        let mut receiver = Receiver::new(ReceiverConfig::new(false)).unwrap();
        let s = sender.public_key().to_bytes();

        receiver.public_key(&s).unwrap();
        assert!(matches!(receiver.public_key(&s), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_decrypt_requires_key() {
        let sender = Sender::new(SenderConfig::new("a", "b")).unwrap();
        let r_point = public_point_of(&generate_private_scalar(&mut OsRng).unwrap());
        let (c0, c1) = sender.encrypt_messages(&r_point.to_bytes()).unwrap();

        let mut receiver = Receiver::new(ReceiverConfig::new(false)).unwrap();
        assert!(matches!(
            receiver.decrypt(&c0, &c1),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_choice_selects_message() {
        for (choice, expected) in [(false, &b"hello"[..]), (true, &b"goodbye"[..])] {
            let sender = Sender::new(SenderConfig::new("hello", "goodbye")).unwrap();
            let mut receiver = Receiver::new(ReceiverConfig::new(choice)).unwrap();

            let r = receiver.public_key(&sender.public_key().to_bytes()).unwrap();
            let (c0, c1) = sender.encrypt_messages(&r.to_bytes()).unwrap();
            receiver.decrypt(&c0, &c1).unwrap();

            assert_eq!(receiver.phase(), ReceiverPhase::Resolved);
            assert_eq!(receiver.get_message().unwrap(), expected);
        }
    }

    #[test]
    fn test_decrypt_only_once() {
        let sender = Sender::new(SenderConfig::new("hello", "goodbye")).unwrap();
        let mut receiver = Receiver::new(ReceiverConfig::new(true)).unwrap();

        let r = receiver.public_key(&sender.public_key().to_bytes()).unwrap();
        let (c0, c1) = sender.encrypt_messages(&r.to_bytes()).unwrap();
        receiver.decrypt(&c0, &c1).unwrap();

        assert!(matches!(
            receiver.decrypt(&c0, &c1),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(receiver.get_message().unwrap(), b"goodbye");
    }

    #[test]
    fn test_both_fail_is_unresolved() {
        let sender = Sender::new(SenderConfig::new("hello", "goodbye")).unwrap();
        let mut receiver = Receiver::new(ReceiverConfig::new(false)).unwrap();
        receiver.public_key(&sender.public_key().to_bytes()).unwrap();

        // ciphertexts built for an unrelated receiver value
        let other = public_point_of(&generate_private_scalar(&mut OsRng).unwrap());
        let (c0, c1) = sender.encrypt_messages(&other.to_bytes()).unwrap();

        receiver.decrypt(&c0, &c1).unwrap();
        assert_eq!(receiver.phase(), ReceiverPhase::Unresolved);
        assert!(matches!(
            receiver.get_message(),
            Err(Error::NoMessageAvailable)
        ));
    }

    #[test]
    fn test_both_open_is_unresolved() {
        let sender = Sender::new(SenderConfig::new("hello", "goodbye")).unwrap();
        let mut receiver = Receiver::new(ReceiverConfig::new(false)).unwrap();
        let r = receiver.public_key(&sender.public_key().to_bytes()).unwrap();

        // a sender that encrypts under key0 twice
        let (c0, _) = sender.encrypt_messages(&r.to_bytes()).unwrap();
        let replay = c0.clone();

        receiver.decrypt(&c0, &replay).unwrap();
        assert_eq!(receiver.phase(), ReceiverPhase::Unresolved);
        assert!(matches!(
            receiver.get_message(),
            Err(Error::NoMessageAvailable)
        ));
    }

    #[test]
    fn test_select_opened() {
        let (resolved, plaintext) =
            select_opened(&outcome(true, b"hello"), &outcome(false, b""));
        assert!(resolved);
        assert_eq!(plaintext.as_slice(), b"hello");

        let (resolved, plaintext) =
            select_opened(&outcome(false, b""), &outcome(true, b"goodbye"));
        assert!(resolved);
        assert_eq!(plaintext.as_slice(), b"goodbye");

        let (resolved, _) = select_opened(&outcome(false, b""), &outcome(false, b""));
        assert!(!resolved);

        let (resolved, _) = select_opened(&outcome(true, b"a"), &outcome(true, b"b"));
        assert!(!resolved);
    }

    #[test]
    fn test_empty_message_resolves() {
        let sender = Sender::new(SenderConfig::new("", "other")).unwrap();
        let mut receiver = Receiver::new(ReceiverConfig::new(false)).unwrap();

        let r = receiver.public_key(&sender.public_key().to_bytes()).unwrap();
        let (c0, c1) = sender.encrypt_messages(&r.to_bytes()).unwrap();
        receiver.decrypt(&c0, &c1).unwrap();

        assert_eq!(receiver.phase(), ReceiverPhase::Resolved);
        assert!(receiver.get_message().unwrap().is_empty());
    }

    #[test]
    fn test_generate_needs_entropy() {
        let result = Receiver::from_rng(ReceiverConfig::new(true), &mut BrokenRng);
        assert!(matches!(result, Err(Error::RandomnessUnavailable(_))));
    }
}
