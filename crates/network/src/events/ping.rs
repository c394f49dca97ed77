use libp2p::ping::Event;
use owo_colors::OwoColorize;
use tracing::debug;

use super::{EventHandler, EventLoop};

impl EventHandler<Event> for EventLoop {
    async fn handle(&mut self, event: Event) {
        match event.result {
            Ok(rtt) => debug!("{}: {} in {:?}", "ping".yellow(), event.peer, rtt),
            Err(err) => debug!("{}: {} failed: {}", "ping".yellow(), event.peer, err),
        }
    }
}
