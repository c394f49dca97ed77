//! Request/response correlation over a fire-and-forget transport.
//!
//! Outbound requests register a pending entry keyed by `meta.requestId`. Whichever comes
//! first, a matching reply handed to [`Messenger::resolve`] or the deadline, removes the
//! entry; the other outcome then finds nothing and has no effect.

use core::fmt::{self, Debug, Formatter};
use core::time::Duration;
use std::collections::hash_map::{Entry, HashMap};
use std::sync::Arc;

use libp2p::PeerId;
use parking_lot::Mutex;
use synapse_network_primitives::envelope::{encode, Envelope};
use synapse_network_primitives::errors::ProtocolError;
use synapse_network_primitives::transport::Transport;
use thiserror::Error as ThisError;
use tokio::sync::oneshot;
use tokio::time;
use tracing::{debug, warn};

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum MessengerError {
    #[error("request `{request_id}` timed out after {timeout:?}")]
    RequestTimeout {
        request_id: String,
        timeout: Duration,
    },
    #[error("request `{0}` is already pending")]
    DuplicateRequest(String),
    #[error("failed to deliver to {peer_id}: {message}")]
    Transport { peer_id: PeerId, message: String },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("request `{0}` was abandoned")]
    Closed(String),
}

type PendingMap = HashMap<String, oneshot::Sender<Envelope>>;

pub struct Messenger {
    transport: Arc<dyn Transport>,
    pending: Arc<Mutex<PendingMap>>,
}

impl Debug for Messenger {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

/// Removes the pending entry if the waiting future is dropped before an outcome.
struct PendingGuard<'a> {
    pending: &'a Mutex<PendingMap>,
    request_id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        drop(self.pending.lock().remove(self.request_id));
    }
}

impl Messenger {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            pending: Arc::default(),
        }
    }

    /// One-way delivery; no reply is expected.
    pub async fn send(&self, peer_id: PeerId, envelope: &Envelope) -> Result<(), MessengerError> {
        let bytes = encode(envelope)?;

        debug!(
            %peer_id,
            request_id = envelope.request_id(),
            message_type = %envelope.message_type(),
            action_type = %envelope.action_type(),
            "Sending envelope"
        );

        self.transport
            .send(peer_id, bytes)
            .await
            .map_err(|err| MessengerError::Transport {
                peer_id,
                message: format!("{err:#}"),
            })
    }

    /// Sends `envelope` and waits for the reply carrying the same request id.
    ///
    /// `timeout` bounds the delivery and the wait for the reply together.
    pub async fn send_with_response(
        &self,
        peer_id: PeerId,
        envelope: &Envelope,
        timeout: Duration,
    ) -> Result<Envelope, MessengerError> {
        let request_id = envelope.request_id();
        let (tx, mut rx) = oneshot::channel();

        match self.pending.lock().entry(request_id.to_owned()) {
            Entry::Occupied(_) => {
                return Err(MessengerError::DuplicateRequest(request_id.to_owned()))
            }
            Entry::Vacant(entry) => drop(entry.insert(tx)),
        }

        let _guard = PendingGuard {
            pending: &self.pending,
            request_id,
        };

        let exchange = async {
            self.send(peer_id, envelope).await?;

            (&mut rx)
                .await
                .map_err(|_| MessengerError::Closed(request_id.to_owned()))
        };

        if let Ok(outcome) = time::timeout(timeout, exchange).await {
            return outcome;
        }

        if self.pending.lock().remove(request_id).is_some() {
            warn!(%peer_id, request_id, ?timeout, "Request timed out");

            return Err(MessengerError::RequestTimeout {
                request_id: request_id.to_owned(),
                timeout,
            });
        }

        // A reply removed the entry at the deadline and is being handed over.
        rx.await
            .map_err(|_| MessengerError::Closed(request_id.to_owned()))
    }

    /// Hands a reply to its waiting request. Returns `false` if nothing was waiting.
    pub fn resolve(&self, reply: Envelope) -> bool {
        let Some(waiter) = self.pending.lock().remove(reply.request_id()) else {
            debug!(
                request_id = reply.request_id(),
                message_type = %reply.message_type(),
                "No pending request for reply"
            );
            return false;
        };

        let request_id = reply.request_id().to_owned();

        if waiter.send(reply).is_err() {
            debug!(request_id, "Requester went away before the reply arrived");
            return false;
        }

        true
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
