use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracker_core::{BranchTable, TransportKind, DEFAULT_BRANCHES};
use tracker_engine::{ChannelSettings, EngineSettings, LookupSettings};
use tracker_logging::{tracker_info, tracker_warn};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "nixtracker.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportChoice {
    /// Persistent WebSocket to the tracker service.
    #[default]
    Channel,
    /// One GitHub lookup per branch.
    Lookup,
}

impl From<TransportChoice> for TransportKind {
    fn from(choice: TransportChoice) -> Self {
        match choice {
            TransportChoice::Channel => TransportKind::Channel,
            TransportChoice::Lookup => TransportKind::Lookup,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub repository: String,
    /// Name of the environment variable holding the API token.
    pub token_env: String,
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        let defaults = LookupSettings::default();
        Self {
            api_base: defaults.api_base,
            repository: defaults.repository,
            token_env: "GITHUB_TOKEN".to_string(),
            user_agent: defaults.user_agent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportChoice,
    pub channel_url: String,
    /// Tracked branches, in the order the service reports them.
    pub branches: Vec<String>,
    pub github: GithubConfig,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transport: TransportChoice::default(),
            channel_url: "wss://nixtracker.org/ws".to_string(),
            branches: DEFAULT_BRANCHES.iter().map(|b| b.to_string()).collect(),
            github: GithubConfig::default(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            query_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: AppConfig = ron::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.branches.is_empty() {
            bail!("at least one branch must be configured");
        }
        if self.branches.iter().any(|b| b.trim().is_empty()) {
            bail!("branch names must not be empty");
        }
        let url = url::Url::parse(&self.channel_url)
            .with_context(|| format!("invalid channel_url {:?}", self.channel_url))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            bail!("channel_url must use ws:// or wss://, got {}://", url.scheme());
        }
        url::Url::parse(&self.github.api_base)
            .with_context(|| format!("invalid github.api_base {:?}", self.github.api_base))?;
        if self.connect_timeout_secs == 0
            || self.request_timeout_secs == 0
            || self.query_timeout_secs == 0
        {
            bail!("timeouts must be at least one second");
        }
        Ok(())
    }

    pub fn branch_table(&self) -> BranchTable {
        BranchTable::new(self.branches.iter().cloned())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            channel: ChannelSettings {
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            },
        }
    }

    pub fn lookup_settings(&self) -> LookupSettings {
        let token = std::env::var(&self.github.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty());
        LookupSettings {
            api_base: self.github.api_base.clone(),
            repository: self.github.repository.clone(),
            token,
            user_agent: self.github.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Loads the configuration.
///
/// An explicit path must exist and parse. Without one, `./nixtracker.ron` is
/// used when present; an unreadable or invalid default file falls back to the
/// built-in defaults with a warning.
pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = path {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config =
            AppConfig::parse(&text).with_context(|| format!("in config {}", path.display()))?;
        tracker_info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    let path = Path::new(DEFAULT_CONFIG_FILE);
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(err) => {
            tracker_warn!("Failed to read configuration from {:?}: {}", path, err);
            return Ok(AppConfig::default());
        }
    };

    match AppConfig::parse(&text) {
        Ok(config) => {
            tracker_info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        Err(err) => {
            tracker_warn!("Ignoring configuration in {:?}: {:#}", path, err);
            Ok(AppConfig::default())
        }
    }
}
