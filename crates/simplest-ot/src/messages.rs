//! Protocol message types carried over a relay

use crate::types::{hex_bytes, EncryptedMessage};
use serde::{Deserialize, Serialize};

/// Round carrying the sender's public key
pub const ROUND_SENDER_SETUP: u32 = 1;

/// Round carrying the receiver's public value
pub const ROUND_RECEIVER_CHOICE: u32 = 2;

/// Round carrying the two ciphertexts
pub const ROUND_SENDER_CIPHERTEXTS: u32 = 3;

/// Round 1 message: sender's public key `S`
///
/// Points travel as raw SEC1 bytes and are parsed by the party that uses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSetupMessage {
    /// Compressed `S = s·G`
    #[serde(with = "hex_bytes")]
    pub public_key: Vec<u8>,
}

/// Round 2 message: receiver's public value `R`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverChoiceMessage {
    /// Compressed `r·G` or `S + r·G`
    #[serde(with = "hex_bytes")]
    pub public_key: Vec<u8>,
}

/// Round 3 message: both encrypted messages, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderCiphertextsMessage {
    /// Message 0 under `H(s·R)`
    pub message0: EncryptedMessage,
    /// Message 1 under `H(s·(R - S))`
    pub message1: EncryptedMessage,
}
