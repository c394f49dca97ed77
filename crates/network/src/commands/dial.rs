use std::collections::hash_map::Entry;

use eyre::{eyre, Result as EyreResult};
use multiaddr::Protocol;
use synapse_network_primitives::messages::Dial;
use tokio::sync::oneshot;

use crate::EventLoop;

impl EventLoop {
    pub(crate) fn dial(
        &mut self,
        Dial(mut peer_addr): Dial,
        outcome: oneshot::Sender<EyreResult<()>>,
    ) {
        let Some(Protocol::P2p(peer_id)) = peer_addr.pop() else {
            let _ignored = outcome.send(Err(eyre!("No peer ID in address: {}", peer_addr)));
            return;
        };

        if self.swarm.is_connected(&peer_id) {
            let _ignored = outcome.send(Ok(()));
            return;
        }

        match self.pending_dial.entry(peer_id) {
            Entry::Occupied(_) => {
                let _ignored = outcome.send(Ok(()));
            }
            Entry::Vacant(entry) => {
                self.swarm.add_peer_address(peer_id, peer_addr.clone());

                match self.swarm.dial(peer_addr) {
                    Ok(()) => {
                        let _ignored = entry.insert(outcome);
                    }
                    Err(err) => {
                        let _ignored = outcome.send(Err(eyre!(err)));
                    }
                }
            }
        }
    }
}
