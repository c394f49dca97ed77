use eyre::{eyre, Result as EyreResult};
use synapse_network_primitives::messages::ListenOn;

use crate::EventLoop;

impl EventLoop {
    pub(crate) fn listen_on(&mut self, ListenOn(addr): ListenOn) -> EyreResult<()> {
        let _listener_id = self.swarm.listen_on(addr).map_err(|err| eyre!(err))?;

        Ok(())
    }
}
