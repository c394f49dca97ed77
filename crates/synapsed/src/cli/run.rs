use core::time::Duration;
use std::sync::Arc;

use clap::Parser;
use eyre::{bail, Result as EyreResult};
use serde_json::json;
use synapse_config::ConfigFile;
use synapse_network_primitives::config::NetworkConfig;
use synapse_node::resources::InMemoryResources;
use synapse_node::{LocalIdentity, Node, NodeContext};
use synapse_server::config::ServerConfig;
use tokio::select;
use tracing::info;

use crate::cli::RootArgs;

/// Run a synapse
#[derive(Debug, Parser)]
pub struct RunCommand {
    /// Override the configured request timeout, in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl RunCommand {
    pub async fn run(self, root_args: &RootArgs) -> EyreResult<()> {
        let path = root_args.node_dir();

        if !ConfigFile::exists(&path) {
            bail!("Synapse is not initialized in {:?}", path);
        }

        let config = ConfigFile::load(&path)?;

        let resources = match &config.resources.seed {
            Some(seed) => InMemoryResources::load(&path.join(seed))?,
            None => InMemoryResources::new(),
        };

        if !resources.has_metadata() {
            resources.set_metadata(json!({
                "name": config.synapse.name,
                "publicKey": config.synapse.public_key,
            }));
        }

        let identity = LocalIdentity {
            peer_id: config.identity.public().to_peer_id(),
            public_key: config.synapse.public_key,
            name: config.synapse.name,
        };

        let network = config.network;

        let (client, events) = synapse_network::run(&NetworkConfig::new(
            config.identity,
            network.swarm,
            network.bootstrap,
            network.discovery,
        ))
        .await?;

        let ctx = NodeContext::new(
            identity,
            Arc::new(client),
            Arc::new(resources),
            self.timeout_ms
                .map_or(config.messenger.timeout, Duration::from_millis),
        );

        info!(
            peer_id = %ctx.identity.peer_id,
            public_key = %ctx.identity.public_key,
            "Starting synapse"
        );

        let node = Node::new(ctx.clone());

        select! {
            () = node.run(events) => Ok(()),
            result = synapse_server::start(ServerConfig::new(network.server.listen), ctx) => result,
        }
    }
}
