//! Server configuration.
//!
//! Settings are layered, later layers overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. a YAML file (`--config`, else `<config_dir>/tekton-mcp/config.yaml` if present)
//! 3. `TEKTON_MCP_*` environment variables
//! 4. command line flags
//!
//! ```yaml
//! default_namespace: ci
//! artifacthub_url: https://artifacthub.io/api/v1
//! http_timeout_secs: 30
//! transport: http
//! address: 127.0.0.1:8080
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::artifacthub::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

pub const ENV_NAMESPACE: &str = "TEKTON_MCP_NAMESPACE";
pub const ENV_ARTIFACTHUB_URL: &str = "TEKTON_MCP_ARTIFACTHUB_URL";
pub const ENV_TRANSPORT: &str = "TEKTON_MCP_TRANSPORT";
pub const ENV_ADDRESS: &str = "TEKTON_MCP_ADDRESS";

/// How the MCP server talks to its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// Streamable HTTP served at `/mcp`.
    Http,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => write!(f, "stdio"),
            Transport::Http => write!(f, "http"),
        }
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            other => Err(format!("Unknown transport: '{other}'. Expected stdio or http")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace used when a tool call does not name one.
    pub default_namespace: String,

    /// Artifact Hub API base URL.
    pub artifacthub_url: String,

    /// Timeout for Artifact Hub requests.
    pub http_timeout_secs: u64,

    pub transport: Transport,

    /// Listen address for the HTTP transport, e.g. `127.0.0.1:8080`.
    pub address: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_namespace: "default".to_string(),
            artifacthub_url: DEFAULT_API_URL.to_string(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            transport: Transport::Stdio,
            address: None,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub namespace: Option<String>,
    pub artifacthub_url: Option<String>,
    pub transport: Option<Transport>,
    pub address: Option<String>,
}

impl Config {
    /// Loads every layer from the real environment and validates the result.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// The default config file location.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tekton-mcp").join("config.yaml"))
    }

    /// Reads a YAML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Applies `TEKTON_MCP_*` variables as resolved by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(ns) = get(ENV_NAMESPACE) {
            self.default_namespace = ns;
        }
        if let Some(url) = get(ENV_ARTIFACTHUB_URL) {
            self.artifacthub_url = url;
        }
        if let Some(transport) = get(ENV_TRANSPORT) {
            self.transport = transport
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{ENV_TRANSPORT}: {e}"))?;
        }
        if let Some(address) = get(ENV_ADDRESS) {
            self.address = Some(address);
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(ns) = &overrides.namespace {
            self.default_namespace = ns.clone();
        }
        if let Some(url) = &overrides.artifacthub_url {
            self.artifacthub_url = url.clone();
        }
        if let Some(transport) = overrides.transport {
            self.transport = transport;
        }
        if let Some(address) = &overrides.address {
            self.address = Some(address.clone());
        }
    }

    /// Rejects combinations the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.default_namespace.trim().is_empty() {
            bail!("default_namespace must not be empty");
        }
        if self.http_timeout_secs == 0 {
            bail!("http_timeout_secs must be greater than zero");
        }
        if self.transport == Transport::Http
            && self.address.as_deref().is_none_or(|a| a.trim().is_empty())
        {
            bail!("The http transport requires an address (--address or {ENV_ADDRESS})");
        }
        Ok(())
    }
}
