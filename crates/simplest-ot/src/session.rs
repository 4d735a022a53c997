//! Two-party drivers over a relay
//!
//! Each role runs in its own task (or process) and exchanges only the
//! protocol values through the [`Relay`]:
//!
//! 1. sender → receiver: `S`
//! 2. receiver → sender: `R`
//! 3. sender → receiver: `(c0, c1)`

use crate::messages::{
    ReceiverChoiceMessage, SenderCiphertextsMessage, SenderSetupMessage, ROUND_RECEIVER_CHOICE,
    ROUND_SENDER_CIPHERTEXTS, ROUND_SENDER_SETUP,
};
use crate::receiver::ReceiverPhase;
use crate::relay::Relay;
use crate::{Receiver, Result, Role, Sender, SessionId};
use tracing::{debug, info, instrument};

/// Run the sender side of a transfer
#[instrument(skip_all, fields(session_id = %hex::encode(session_id)))]
pub async fn run_sender<R: Relay>(sender: &Sender, session_id: &SessionId, relay: &R) -> Result<()> {
    info!("Starting OT sender");

    debug!("Round 1: publishing sender key");
    let setup = SenderSetupMessage {
        public_key: sender.public_key().to_bytes(),
    };
    relay
        .send(session_id, ROUND_SENDER_SETUP, Role::Receiver, &setup)
        .await?;

    debug!("Round 2: waiting for receiver value");
    let choice: ReceiverChoiceMessage = relay
        .receive(session_id, ROUND_RECEIVER_CHOICE, Role::Sender)
        .await?;

    debug!("Round 3: sending ciphertexts");
    let (message0, message1) = sender.encrypt_messages(&choice.public_key)?;
    let ciphertexts = SenderCiphertextsMessage { message0, message1 };
    relay
        .send(session_id, ROUND_SENDER_CIPHERTEXTS, Role::Receiver, &ciphertexts)
        .await?;

    info!("OT sender finished");
    Ok(())
}

/// Run the receiver side of a transfer and report the phase reached
#[instrument(skip_all, fields(session_id = %hex::encode(session_id)))]
pub async fn run_receiver<R: Relay>(
    receiver: &mut Receiver,
    session_id: &SessionId,
    relay: &R,
) -> Result<ReceiverPhase> {
    info!("Starting OT receiver");

    debug!("Round 1: waiting for sender key");
    let setup: SenderSetupMessage = relay
        .receive(session_id, ROUND_SENDER_SETUP, Role::Receiver)
        .await?;

    debug!("Round 2: publishing receiver value");
    let public_key = receiver.public_key(&setup.public_key)?.to_bytes();
    relay
        .send(
            session_id,
            ROUND_RECEIVER_CHOICE,
            Role::Sender,
            &ReceiverChoiceMessage { public_key },
        )
        .await?;

    debug!("Round 3: waiting for ciphertexts");
    let ciphertexts: SenderCiphertextsMessage = relay
        .receive(session_id, ROUND_SENDER_CIPHERTEXTS, Role::Receiver)
        .await?;
    receiver.decrypt(&ciphertexts.message0, &ciphertexts.message1)?;

    let phase = receiver.phase();
    info!(?phase, "OT receiver finished");
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::MemoryRelay;
    use crate::{Error, ReceiverConfig, SenderConfig};
    use std::time::Duration;

    async fn transfer(choice_bit: bool) -> Receiver {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let relay = MemoryRelay::new();
        let session_id: SessionId = rand::random();

        let sender = Sender::new(SenderConfig::new("hello", "goodbye")).unwrap();
        let mut receiver = Receiver::new(ReceiverConfig::new(choice_bit)).unwrap();

        let sender_relay = relay.clone();
        let sender_task =
            tokio::spawn(async move { run_sender(&sender, &session_id, &sender_relay).await });

        let phase = run_receiver(&mut receiver, &session_id, &relay).await.unwrap();
        sender_task.await.unwrap().unwrap();

        assert_eq!(phase, ReceiverPhase::Resolved);
        receiver
    }

    #[tokio::test]
    async fn test_relay_transfer_choice_zero() {
        let receiver = transfer(false).await;
        assert_eq!(receiver.get_message().unwrap(), b"hello");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_relay_transfer_choice_one() {
        let receiver = transfer(true).await;
        assert_eq!(receiver.get_message().unwrap(), b"goodbye");
    }

    #[tokio::test]
    async fn test_invalid_sender_key_over_relay() {
        let relay = MemoryRelay::new();
        let session_id: SessionId = rand::random();

        // 33 bytes with a valid tag but x >= p
        let mut off_curve = [0xffu8; 33];
        off_curve[0] = 0x02;
        relay
            .send(
                &session_id,
                ROUND_SENDER_SETUP,
                Role::Receiver,
                &serde_json::json!({ "public_key": hex::encode(off_curve) }),
            )
            .await
            .unwrap();

        let mut receiver = Receiver::new(ReceiverConfig::new(true)).unwrap();
        let err = run_receiver(&mut receiver, &session_id, &relay).await.unwrap_err();

        assert!(matches!(err, Error::InvalidPoint(_)));
        assert_eq!(receiver.phase(), ReceiverPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_short_sender_key_over_relay() {
        let relay = MemoryRelay::new();
        let session_id: SessionId = rand::random();

        relay
            .send(
                &session_id,
                ROUND_SENDER_SETUP,
                Role::Receiver,
                &serde_json::json!({ "public_key": "02ffff" }),
            )
            .await
            .unwrap();

        let mut receiver = Receiver::new(ReceiverConfig::new(false)).unwrap();
        let err = run_receiver(&mut receiver, &session_id, &relay).await.unwrap_err();

        assert!(matches!(err, Error::InvalidPoint(_)));
        assert_eq!(receiver.phase(), ReceiverPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_invalid_receiver_value_over_relay() {
        let relay = MemoryRelay::new().with_timeout(Duration::from_millis(50));
        let session_id: SessionId = rand::random();

        let mut off_curve = [0xffu8; 33];
        off_curve[0] = 0x03;
        relay
            .send(
                &session_id,
                ROUND_RECEIVER_CHOICE,
                Role::Sender,
                &serde_json::json!({ "public_key": hex::encode(off_curve) }),
            )
            .await
            .unwrap();

        let sender = Sender::new(SenderConfig::new("a", "b")).unwrap();
        let err = run_sender(&sender, &session_id, &relay).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPoint(_)));

        // Nothing was sealed for the receiver
        let pending: Result<SenderCiphertextsMessage> = relay
            .receive(&session_id, ROUND_SENDER_CIPHERTEXTS, Role::Receiver)
            .await;
        assert!(matches!(pending, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_sender_times_out_without_receiver() {
        let relay = MemoryRelay::new().with_timeout(Duration::from_millis(50));
        let session_id: SessionId = rand::random();
        let sender = Sender::new(SenderConfig::new("a", "b")).unwrap();

        let err = run_sender(&sender, &session_id, &relay).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }
}
