//! Bounded inbound queue.
//!
//! Callbacks arrive on the HTTP layer's threads and must be answered
//! quickly, so enqueueing never waits. When the consumer falls behind
//! and the queue is full, the callback is dropped and a warning logged.

use threema_gateway_types::{GatewayError, Result};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::raw::CallbackMessage;

/// Result of offering a callback to the queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EnqueueOutcome {
    Enqueued,
    /// The queue was full or its receiver was gone.
    Dropped,
}

/// Producer half of the inbound queue.
#[derive(Clone, Debug)]
pub struct CallbackQueue {
    tx: mpsc::Sender<CallbackMessage>,
}

/// Creates a queue holding at most `capacity` callbacks.
///
/// # Errors
///
/// [`GatewayError::ConfigError`] if `capacity` is zero.
pub fn callback_queue(capacity: usize) -> Result<(CallbackQueue, mpsc::Receiver<CallbackMessage>)> {
    if capacity == 0 {
        return Err(GatewayError::ConfigError {
            reason: "callback queue capacity must be greater than 0".into(),
        });
    }
    let (tx, rx) = mpsc::channel(capacity);
    Ok((CallbackQueue { tx }, rx))
}

impl CallbackQueue {
    /// Offers `message` without waiting.
    pub fn enqueue(&self, message: CallbackMessage) -> EnqueueOutcome {
        match self.tx.try_send(message) {
            Ok(()) => EnqueueOutcome::Enqueued,
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    from = %dropped.from,
                    message_id = %dropped.message_id,
                    "callback queue full, dropping message"
                );
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(dropped)) => {
                tracing::warn!(
                    from = %dropped.from,
                    message_id = %dropped.message_id,
                    "callback queue closed, dropping message"
                );
                EnqueueOutcome::Dropped
            }
        }
    }

    /// Free slots left in the queue.
    pub fn remaining_capacity(&self) -> usize {
        self.tx.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use threema_gateway_types::{Identity, MessageId, Nonce};

    fn message(id: u8) -> std::result::Result<CallbackMessage, GatewayError> {
        Ok(CallbackMessage {
            from: Identity::new("ECHOECHO")?,
            to: Identity::new("*GATEWAY")?,
            message_id: MessageId::new([id; 8]),
            date: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default(),
            nonce: Nonce::new([0; 24]),
            boxed: vec![1, 2, 3],
            mac: [0; 32],
            nickname: None,
        })
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            callback_queue(0),
            Err(GatewayError::ConfigError { .. })
        ));
    }

    #[tokio::test]
    async fn full_queue_drops() -> std::result::Result<(), GatewayError> {
        let (queue, mut rx) = callback_queue(2)?;
        assert_eq!(queue.enqueue(message(1)?), EnqueueOutcome::Enqueued);
        assert_eq!(queue.enqueue(message(2)?), EnqueueOutcome::Enqueued);
        assert_eq!(queue.remaining_capacity(), 0);
        assert_eq!(queue.enqueue(message(3)?), EnqueueOutcome::Dropped);

        let first = rx.recv().await.map(|m| m.message_id);
        assert_eq!(first, Some(MessageId::new([1; 8])));
        assert_eq!(queue.enqueue(message(4)?), EnqueueOutcome::Enqueued);
        Ok(())
    }

    #[tokio::test]
    async fn closed_queue_drops() -> std::result::Result<(), GatewayError> {
        let (queue, rx) = callback_queue(4)?;
        drop(rx);
        assert_eq!(queue.enqueue(message(1)?), EnqueueOutcome::Dropped);
        Ok(())
    }
}
