//! # Simplest OT
//!
//! 1-out-of-2 oblivious transfer over secp256k1, following
//! "The Simplest Protocol for Oblivious Transfer" (https://eprint.iacr.org/2015/267.pdf).
//!
//! A [`Sender`] holds two messages and a [`Receiver`] holds a choice bit. After
//! the run the receiver holds exactly the chosen message, and the sender has
//! learned nothing about the bit.
//!
//! ## Protocol Overview
//!
//! - Sender publishes `S = s·G`
//! - Receiver answers `R = r·G` (bit 0) or `R = S + r·G` (bit 1) and keys
//!   itself with `H(r·S)`
//! - Sender encrypts message 0 under `H(s·R)` and message 1 under
//!   `H(s·(R - S))` with XChaCha20-Poly1305
//! - Receiver trial-decrypts both and keeps the one that opens
//!
//! Points travel as 33-byte SEC1 compressed encodings. Every [`Sender`] and
//! [`Receiver`] is single-use; never reuse a private key across runs.
//!
//! ## Example
//!
//! ```rust
//! use simplest_ot::{run_oblivious_transfer, Receiver, ReceiverConfig, Sender, SenderConfig};
//!
//! let sender = Sender::new(SenderConfig::new("hello", "goodbye"))?;
//! let mut receiver = Receiver::new(ReceiverConfig::new(true))?;
//!
//! run_oblivious_transfer(&sender, &mut receiver)?;
//! assert_eq!(receiver.get_message()?, b"goodbye");
//! # Ok::<(), simplest_ot::Error>(())
//! ```

pub mod cipher;
pub mod error;
pub mod key_agreement;
pub mod messages;
pub mod receiver;
pub mod relay;
pub mod sender;
pub mod session;
pub mod transfer;
pub mod types;

pub use error::{Error, Result};
pub use receiver::{Receiver, ReceiverPhase};
pub use sender::Sender;
pub use transfer::run_oblivious_transfer;
pub use types::{
    EncryptedMessage, PrivateKeySource, PrivateScalar, PublicPoint, ReceiverConfig, Role,
    SenderConfig, SessionId,
};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
