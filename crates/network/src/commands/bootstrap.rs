use eyre::{bail, Result as EyreResult};
use synapse_network_primitives::messages::Bootstrap;
use tracing::{debug, warn};

use crate::EventLoop;

impl EventLoop {
    /// Dials every configured bootstrap node; succeeds if at least one dial was started.
    pub(crate) fn bootstrap(&mut self, _request: Bootstrap) -> EyreResult<()> {
        if self.bootstrap_peers.is_empty() {
            return Ok(());
        }

        let mut started = 0_usize;

        for (peer_id, addr) in self.bootstrap_peers.clone() {
            self.swarm.add_peer_address(peer_id, addr.clone());

            if self.swarm.is_connected(&peer_id) {
                started += 1;
                continue;
            }

            match self.swarm.dial(addr.clone()) {
                Ok(()) => {
                    debug!(%peer_id, %addr, "Dialing bootstrap node");
                    started += 1;
                }
                Err(err) => warn!(%peer_id, %addr, %err, "Failed to dial bootstrap node"),
            }
        }

        if started == 0 {
            bail!("none of the {} bootstrap nodes could be dialed", self.bootstrap_peers.len());
        }

        Ok(())
    }
}
