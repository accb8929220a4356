//! One-call callback intake: parse, authenticate, enqueue.

use threema_gateway_types::config::GatewayConfig;
use threema_gateway_types::Result;
use tokio::sync::mpsc;

use crate::queue::{callback_queue, CallbackQueue, EnqueueOutcome};
use crate::raw::{CallbackLimits, CallbackMessage, RawCallback};
use crate::verify::MacPolicy;

/// Feeds decoded callback forms into the inbound queue.
///
/// The HTTP layer answers `400` for an `Err` and `200` otherwise; a
/// dropped message is not the sender's fault.
#[derive(Clone, Debug)]
pub struct CallbackHandler {
    policy: MacPolicy,
    limits: CallbackLimits,
    queue: CallbackQueue,
}

impl CallbackHandler {
    /// Builds a handler and its queue receiver from `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<(Self, mpsc::Receiver<CallbackMessage>)> {
        config.validate()?;
        let (queue, rx) = callback_queue(config.callback_queue_capacity)?;
        let handler = Self::new(MacPolicy::from_config(config), CallbackLimits::from(config), queue);
        Ok((handler, rx))
    }

    pub fn new(policy: MacPolicy, limits: CallbackLimits, queue: CallbackQueue) -> Self {
        Self {
            policy,
            limits,
            queue,
        }
    }

    /// Parses and authenticates one callback and offers it to the queue.
    ///
    /// # Errors
    ///
    /// Any parsing or MAC error; these are logged at `warn`.
    pub fn handle_form<I, K, V>(&self, pairs: I) -> Result<EnqueueOutcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let message = RawCallback::from_form_with_limits(pairs, self.limits)
            .and_then(|raw| raw.authenticate_with(&self.policy))
            .map_err(|e| {
                tracing::warn!(%e, "rejected callback");
                e
            })?;

        tracing::debug!(
            from = %message.from,
            message_id = %message.message_id,
            len = message.boxed.len(),
            "accepted callback"
        );
        Ok(self.queue.enqueue(message))
    }
}
