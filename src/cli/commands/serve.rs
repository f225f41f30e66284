//! Serve command.
//!
//! Starts the MCP server against the cluster of the current kubeconfig
//! context, or the in-cluster service account when running in a pod.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tekton_mcp::cluster::KubeCluster;
use tekton_mcp::config::{Config, Overrides, Transport};

/// Arguments for the serve command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    tekton-mcp-server serve                                       Serve on stdio\n    \
    tekton-mcp-server serve --transport http --address 0.0.0.0:3000\n    \
    tekton-mcp-server serve --namespace ci                        Default tool calls to 'ci'")]
pub struct Args {
    /// Transport to serve MCP on
    #[arg(long, value_enum)]
    pub transport: Option<Transport>,

    /// Listen address for the http transport, e.g. 127.0.0.1:3000
    #[arg(long)]
    pub address: Option<String>,

    /// Path to a YAML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Namespace used when a tool call does not name one
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Artifact Hub API base URL
    #[arg(long, value_name = "URL")]
    pub artifacthub_url: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            namespace: self.namespace.clone(),
            artifacthub_url: self.artifacthub_url.clone(),
            transport: self.transport,
            address: self.address.clone(),
        }
    }
}

/// Executes the serve command.
pub fn run(args: Args) -> Result<()> {
    // Settings are checked before anything touches the cluster.
    let config = Config::load(args.config.as_deref(), &args.overrides())?;
    tracing::debug!(?config, "Loaded configuration");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let cluster = KubeCluster::try_default()
            .await
            .context("Failed to connect to the Kubernetes cluster")?;
        tekton_mcp::mcp::run_server(&config, Arc::new(cluster)).await
    })
}
