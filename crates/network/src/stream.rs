use futures_util::StreamExt;
use libp2p::{PeerId, Stream as P2pStream};
use synapse_network_primitives::messages::NetworkEvent;
use synapse_network_primitives::stream::Stream;
use tokio::spawn;
use tracing::{debug, warn};

use crate::EventLoop;

impl EventLoop {
    /// Forwards every frame read from an inbound stream until the remote closes it.
    pub(crate) fn handle_incoming_stream(&self, (peer_id, stream): (PeerId, P2pStream)) {
        let event_sender = self.event_sender.clone();

        drop(spawn(async move {
            let mut stream = Stream::new(stream);

            while let Some(frame) = stream.next().await {
                let message = match frame {
                    Ok(message) => message,
                    Err(err) => {
                        warn!(%peer_id, %err, "Dropping inbound stream");
                        break;
                    }
                };

                let event = NetworkEvent::Message {
                    peer_id,
                    data: message.data,
                };

                if event_sender.send(event).await.is_err() {
                    break;
                }
            }

            debug!(%peer_id, "Inbound stream finished");
        }));
    }
}
