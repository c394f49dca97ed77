use synapse_network_primitives::messages::PeerCount;

use crate::EventLoop;

impl EventLoop {
    pub(crate) fn peer_count(&self, _request: PeerCount) -> usize {
        self.swarm.connected_peers().count()
    }
}
