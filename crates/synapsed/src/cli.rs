use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use const_format::concatcp;
use eyre::Result as EyreResult;

use crate::defaults;

mod init;
mod run;

use init::InitCommand;
use run::RunCommand;

pub const EXAMPLES: &str = r"
  # Initialize a new synapse
  $ synapsed --home data/ --node-name alpha init --synapse-name Alpha

  # Initialize a second synapse on other ports
  $ synapsed --home data/ --node-name beta init --swarm-port 2628 --server-port 2629

  # Run a synapse
  $ synapsed --home data/ --node-name alpha run
";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = concatcp!(
    "Environment variables:\n",
    "  SYNAPSE_HOME    Directory for config and data\n\n",
    "Examples:",
    EXAMPLES
))]
pub struct RootCommand {
    #[command(flatten)]
    pub args: RootArgs,

    #[command(subcommand)]
    pub action: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    Init(InitCommand),
    #[command(alias = "up")]
    Run(RunCommand),
}

#[derive(Debug, Parser)]
pub struct RootArgs {
    /// Directory for config and data
    #[arg(long, value_name = "PATH", default_value_t = defaults::default_node_dir())]
    #[arg(env = "SYNAPSE_HOME", hide_env_values = true)]
    pub home: Utf8PathBuf,

    /// Name of node
    #[arg(short, long, value_name = "NAME")]
    pub node_name: Utf8PathBuf,
}

impl RootArgs {
    pub fn node_dir(&self) -> Utf8PathBuf {
        self.home.join(&self.node_name)
    }
}

impl RootCommand {
    pub async fn run(self) -> EyreResult<()> {
        match self.action {
            SubCommands::Init(init) => init.run(&self.args),
            SubCommands::Run(run) => run.run(&self.args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use synapse_config::ConfigFile;
    use tempdir::TempDir;

    use super::*;

    fn parse(args: &[&str]) -> RootCommand {
        RootCommand::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_init() {
        let command = parse(&[
            "synapsed",
            "--home",
            "/tmp/synapse",
            "--node-name",
            "alpha",
            "init",
            "--synapse-name",
            "Alpha",
            "--swarm-port",
            "3528",
            "--no-mdns",
        ]);

        assert_eq!(command.args.node_dir(), "/tmp/synapse/alpha");

        let SubCommands::Init(init) = command.action else {
            panic!("expected init");
        };
        assert_eq!(init.synapse_name.as_deref(), Some("Alpha"));
        assert_eq!(init.swarm_port, 3528);
        assert!(init.no_mdns);
        assert!(!init.force);
    }

    #[test]
    fn test_parse_run_alias() {
        let command = parse(&["synapsed", "--node-name", "beta", "up", "--timeout-ms", "250"]);

        let SubCommands::Run(run) = command.action else {
            panic!("expected run");
        };
        assert_eq!(run.timeout_ms, Some(250));
    }

    #[test]
    fn test_init_writes_config_once() {
        let home = TempDir::new("synapsed").unwrap();
        let home = home.path().to_str().unwrap();

        let command = parse(&[
            "synapsed",
            "--home",
            home,
            "--node-name",
            "alpha",
            "init",
            "--server-port",
            "3529",
        ]);
        let SubCommands::Init(init) = command.action else {
            panic!("expected init");
        };
        init.run(&command.args).unwrap();

        let config = ConfigFile::load(&command.args.node_dir()).unwrap();
        assert_eq!(config.synapse.name, "alpha");
        assert_eq!(
            config.synapse.public_key,
            synapse_config::default_public_key(&config.identity)
        );
        assert!(config.network.discovery.mdns);
        assert!(config
            .network
            .server
            .listen
            .iter()
            .all(|addr| addr.to_string().ends_with("/tcp/3529")));

        let again = parse(&["synapsed", "--home", home, "--node-name", "alpha", "init"]);
        let SubCommands::Init(init) = again.action else {
            panic!("expected init");
        };
        let err = init.run(&again.args).unwrap_err();
        assert!(err.to_string().contains("already initialized"));
    }
}
