//! In-memory relay implementation for testing

use super::{async_trait, Relay};
use crate::{Error, Result, Role, SessionId};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Default time a party waits for its peer
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// In-memory message relay for local runs
///
/// Messages nobody collects stay queued until [`MemoryRelay::close_session`]
/// drops them, so long-lived relays should close each finished session.
#[derive(Clone)]
pub struct MemoryRelay {
    /// Pending messages: (session_id, round, to) -> message_bytes
    mailboxes: Arc<DashMap<(SessionId, u32, Role), Vec<u8>>>,
    /// Notification channel
    notify: broadcast::Sender<()>,
    /// How long `receive` waits before giving up
    timeout: Duration,
}

impl MemoryRelay {
    /// Create a new in-memory relay
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(100);
        Self {
            mailboxes: Arc::new(DashMap::new()),
            notify,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set receive timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Drop every undelivered message of a session
    pub fn close_session(&self, session_id: &SessionId) -> usize {
        let before = self.mailboxes.len();
        self.mailboxes.retain(|(id, _, _), _| id != session_id);
        before.saturating_sub(self.mailboxes.len())
    }

    /// Number of messages waiting to be received
    pub fn pending(&self) -> usize {
        self.mailboxes.len()
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))
}

fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
}

#[async_trait]
impl Relay for MemoryRelay {
    async fn send<T: Serialize + Send + Sync>(
        &self,
        session_id: &SessionId,
        round: u32,
        to: Role,
        message: &T,
    ) -> Result<()> {
        let bytes = serialize(message)?;

        match self.mailboxes.entry((*session_id, round, to)) {
            Entry::Occupied(_) => {
                return Err(Error::Relay(format!(
                    "round {} message for {:?} already sent",
                    round, to
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(bytes);
            }
        }

        let _ = self.notify.send(());
        Ok(())
    }

    async fn receive<T: DeserializeOwned + Send>(
        &self,
        session_id: &SessionId,
        round: u32,
        me: Role,
    ) -> Result<T> {
        let mut rx = self.notify.subscribe();
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some((_, bytes)) = self.mailboxes.remove(&(*session_id, round, me)) {
                return deserialize(&bytes);
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "round {} message for {:?}",
                    round, me
                )));
            }

            // Wait for notification, bounded by the deadline
            tokio::select! {
                _ = rx.recv() => continue,
                _ = tokio::time::sleep_until(deadline) => continue,
            }
        }
    }
}
