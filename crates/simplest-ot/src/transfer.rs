//! Single-process reference run of the protocol
//!
//! Convenient for tests and demos. Separated parties use
//! [`crate::session`] over a relay instead.

use crate::{Receiver, Result, Sender};

/// Run Simplest OT between a sender and a receiver in one call
///
/// Values cross between the roles only in their wire encodings.
pub fn run_oblivious_transfer(sender: &Sender, receiver: &mut Receiver) -> Result<()> {
    let sender_public_key = sender.public_key().to_bytes();
    let receiver_public_key = receiver.public_key(&sender_public_key)?.to_bytes();
    let (encrypted0, encrypted1) = sender.encrypt_messages(&receiver_public_key)?;
    receiver.decrypt(&encrypted0, &encrypted1)
}
