use synapse_network_primitives::client::NetworkMessage;

use crate::EventLoop;

mod bootstrap;
mod dial;
mod listen;
mod peer_count;

impl EventLoop {
    pub(crate) fn handle_command(&mut self, command: NetworkMessage) {
        match command {
            NetworkMessage::Dial { request, outcome } => self.dial(request, outcome),
            NetworkMessage::ListenOn { request, outcome } => {
                let _ignored = outcome.send(self.listen_on(request));
            }
            NetworkMessage::Bootstrap { request, outcome } => {
                let _ignored = outcome.send(self.bootstrap(request));
            }
            NetworkMessage::PeerCount { request, outcome } => {
                let _ignored = outcome.send(self.peer_count(request));
            }
        }
    }
}
