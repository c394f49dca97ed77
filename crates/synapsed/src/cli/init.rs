use std::fs::create_dir_all;
use std::net::IpAddr;

use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{bail, Result as EyreResult, WrapErr};
use libp2p_identity::Keypair;
use multiaddr::{Multiaddr, Protocol};
use synapse_config::{
    default_public_key, ConfigFile, MessengerConfig, NetworkConfig, ResourcesConfig,
    ServerConfig, SynapseConfig,
};
use synapse_network_primitives::config::{
    BootstrapConfig, BootstrapNodes, DiscoveryConfig, SwarmConfig, DEFAULT_PORT as SWARM_PORT,
};
use synapse_server::config::DEFAULT_PORT as SERVER_PORT;
use tracing::{info, warn};

use crate::cli::RootArgs;

/// Initialize synapse configuration
#[derive(Debug, Parser)]
pub struct InitCommand {
    /// Display name announced to peers
    #[arg(long, value_name = "NAME")]
    pub synapse_name: Option<String>,

    /// Federation public key, defaults to one derived from the node identity
    #[arg(long, value_name = "KEY")]
    pub public_key: Option<String>,

    /// List of bootstrap nodes
    #[arg(long, value_name = "ADDR")]
    pub boot_nodes: Vec<Multiaddr>,

    /// Host to listen on
    #[arg(long, value_name = "HOST")]
    #[arg(default_value = "0.0.0.0,::")]
    #[arg(use_value_delimiter = true)]
    pub swarm_host: Vec<IpAddr>,

    /// Port to listen on
    #[arg(long, value_name = "PORT")]
    #[arg(default_value_t = SWARM_PORT)]
    pub swarm_port: u16,

    /// Host to listen on for HTTP
    #[arg(long, value_name = "HOST")]
    #[arg(default_value = "127.0.0.1,::1")]
    #[arg(use_value_delimiter = true)]
    pub server_host: Vec<IpAddr>,

    /// Port to listen on for HTTP
    #[arg(long, value_name = "PORT")]
    #[arg(default_value_t = SERVER_PORT)]
    pub server_port: u16,

    /// Enable mDNS discovery
    #[arg(long, default_value_t = true)]
    #[arg(overrides_with("no_mdns"))]
    pub mdns: bool,

    #[arg(long, hide = true)]
    #[arg(overrides_with("mdns"))]
    pub no_mdns: bool,

    /// JSON file, relative to the node directory, seeding the local resources
    #[arg(long, value_name = "PATH")]
    pub seed: Option<Utf8PathBuf>,

    /// Force initialization even if the directory already exists
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(self, root_args: &RootArgs) -> EyreResult<()> {
        let mdns = self.mdns && !self.no_mdns;
        let path = root_args.node_dir();

        if !path.exists() {
            create_dir_all(&path)
                .wrap_err_with(|| format!("failed to create directory {path:?}"))?;
        }

        if ConfigFile::exists(&path) {
            if let Err(err) = ConfigFile::load(&path) {
                if self.force {
                    warn!(%err, "Failed to load existing configuration, overwriting");
                } else {
                    bail!("failed to load existing configuration: {err:#}");
                }
            }
            if !self.force {
                bail!("synapse is already initialized in {path:?}");
            }
        }

        let identity = Keypair::generate_ed25519();
        info!(peer_id = %identity.public().to_peer_id(), "Generated identity");

        let public_key = self
            .public_key
            .unwrap_or_else(|| default_public_key(&identity));
        let name = self
            .synapse_name
            .unwrap_or_else(|| root_args.node_name.to_string());

        let listen = self
            .swarm_host
            .into_iter()
            .map(|host| Multiaddr::from(host).with(Protocol::Tcp(self.swarm_port)))
            .collect();

        let server_listen = self
            .server_host
            .into_iter()
            .map(|host| Multiaddr::from(host).with(Protocol::Tcp(self.server_port)))
            .collect();

        let config = ConfigFile::new(
            identity,
            SynapseConfig::new(public_key, name),
            NetworkConfig::new(
                SwarmConfig::new(listen),
                BootstrapConfig::new(BootstrapNodes::new(self.boot_nodes)),
                DiscoveryConfig::new(mdns),
                ServerConfig::new(server_listen),
            ),
            MessengerConfig::default(),
            ResourcesConfig::new(self.seed),
        );

        config.save(&path)?;

        info!(public_key = %config.synapse.public_key, "Initialized a synapse in {path:?}");

        Ok(())
    }
}
