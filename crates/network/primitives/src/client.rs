use core::fmt::{self, Debug, Formatter};

use async_trait::async_trait;
use eyre::{eyre, Result as EyreResult, WrapErr};
use futures_util::SinkExt;
use libp2p::{Multiaddr, PeerId};
use libp2p_stream::Control;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::messages::{Bootstrap, Dial, ListenOn, PeerCount};
use crate::stream::{Message, Stream, SYNAPSE_STREAM_PROTOCOL};
use crate::transport::Transport;

/// Commands accepted by the swarm event loop.
#[derive(Debug)]
pub enum NetworkMessage {
    Dial {
        request: Dial,
        outcome: oneshot::Sender<EyreResult<()>>,
    },
    ListenOn {
        request: ListenOn,
        outcome: oneshot::Sender<EyreResult<()>>,
    },
    Bootstrap {
        request: Bootstrap,
        outcome: oneshot::Sender<EyreResult<()>>,
    },
    PeerCount {
        request: PeerCount,
        outcome: oneshot::Sender<usize>,
    },
}

/// A cloneable handle onto a running swarm.
#[derive(Clone)]
pub struct NetworkClient {
    sender: mpsc::Sender<NetworkMessage>,
    control: Control,
}

impl Debug for NetworkClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkClient").finish_non_exhaustive()
    }
}

impl NetworkClient {
    #[must_use]
    pub const fn new(sender: mpsc::Sender<NetworkMessage>, control: Control) -> Self {
        Self { sender, control }
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> NetworkMessage,
    ) -> EyreResult<T> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(message(tx))
            .await
            .map_err(|_| eyre!("network event loop has stopped"))?;

        rx.await
            .map_err(|_| eyre!("network event loop dropped the request"))
    }

    pub async fn dial(&self, peer_addr: Multiaddr) -> EyreResult<()> {
        self.request(|outcome| NetworkMessage::Dial {
            request: Dial::from(peer_addr),
            outcome,
        })
        .await?
    }

    pub async fn listen_on(&self, addr: Multiaddr) -> EyreResult<()> {
        self.request(|outcome| NetworkMessage::ListenOn {
            request: ListenOn::from(addr),
            outcome,
        })
        .await?
    }

    pub async fn bootstrap(&self) -> EyreResult<()> {
        self.request(|outcome| NetworkMessage::Bootstrap {
            request: Bootstrap,
            outcome,
        })
        .await?
    }

    pub async fn peer_count(&self) -> EyreResult<usize> {
        self.request(|outcome| NetworkMessage::PeerCount {
            request: PeerCount,
            outcome,
        })
        .await
    }

    pub async fn open_stream(&self, peer_id: PeerId) -> EyreResult<Stream> {
        let mut control = self.control.clone();

        let stream = control
            .open_stream(peer_id, SYNAPSE_STREAM_PROTOCOL)
            .await
            .map_err(|err| eyre!("failed to open stream to {peer_id}: {err:?}"))?;

        Ok(Stream::new(stream))
    }
}

#[async_trait]
impl Transport for NetworkClient {
    async fn send(&self, peer_id: PeerId, data: Vec<u8>) -> EyreResult<()> {
        let mut stream = self.open_stream(peer_id).await?;

        stream
            .send(Message::new(data))
            .await
            .wrap_err_with(|| format!("failed to write frame to {peer_id}"))?;

        stream
            .close()
            .await
            .wrap_err_with(|| format!("failed to close stream to {peer_id}"))?;

        debug!(%peer_id, "Frame delivered");

        Ok(())
    }
}
