//! Transport seam between the two parties
//!
//! Sender and receiver share nothing but the values they push through a
//! [`Relay`]. Timeouts and retries belong to the relay implementation.

use crate::{Result, Role, SessionId};
use serde::{de::DeserializeOwned, Serialize};

pub use ::async_trait::async_trait;

/// Message relay trait for two-party communication
#[async_trait]
pub trait Relay: Send + Sync {
    /// Deliver a message for round `round` to the party playing `to`
    async fn send<T: Serialize + Send + Sync>(
        &self,
        session_id: &SessionId,
        round: u32,
        to: Role,
        message: &T,
    ) -> Result<()>;

    /// Wait for the round `round` message addressed to `me`
    async fn receive<T: DeserializeOwned + Send>(
        &self,
        session_id: &SessionId,
        round: u32,
        me: Role,
    ) -> Result<T>;
}

/// In-memory relay for testing
pub mod memory;

pub use memory::MemoryRelay;
