use std::path::PathBuf;

use clap::{ArgAction, Parser};

use super::config::{AppConfig, TransportChoice};
use super::logging::LogDestination;

/// Watch a nixpkgs pull request propagate through the release branches.
#[derive(Debug, Parser)]
#[command(name = "nixtracker", version)]
pub struct Cli {
    /// Pull request numbers to check, one after another. Reads one per line
    /// from stdin when omitted.
    pub prs: Vec<String>,

    /// RON configuration file (defaults to ./nixtracker.ron when present).
    #[arg(short, long, env = "NIXTRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where results come from.
    #[arg(short, long, value_enum)]
    pub transport: Option<TransportChoice>,

    /// WebSocket endpoint of the tracker service.
    #[arg(long)]
    pub url: Option<String>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Command-line flags win over the configuration file.
    pub(crate) fn apply(&self, config: &mut AppConfig) {
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(url) = &self.url {
            config.channel_url = url.clone();
        }
    }
}
