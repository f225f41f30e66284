//! `list_*` tools.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::Deserialize;

use super::Services;
use crate::output::OutputFormat;
use crate::tekton::{self, TektonKind};

/// Parameters for the list_* tools.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListParams {
    #[schemars(description = "Namespace to list from (default: all namespaces)")]
    pub namespace: Option<String>,

    #[serde(rename = "labelSelector", alias = "label-selector")]
    #[schemars(description = "Label selector to filter on, e.g. app=build,tier!=test")]
    pub label_selector: Option<String>,

    #[schemars(description = "Only return resources whose name starts with this prefix")]
    pub prefix: Option<String>,

    #[schemars(description = "Output format, json or yaml (default: yaml)")]
    pub output: Option<String>,
}

/// Implementation of the list_* tools.
pub async fn list(svc: &Services, kind: TektonKind, p: ListParams) -> Result<String> {
    let format = OutputFormat::from_arg(p.output.as_deref()).map_err(anyhow::Error::msg)?;
    let namespace = p.namespace.as_deref().map(str::trim).filter(|ns| !ns.is_empty());
    let selector = p.label_selector.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut items = svc
        .cluster
        .list(kind, namespace, selector)
        .await
        .with_context(|| match namespace {
            Some(ns) => format!("Error listing {kind}s in namespace {ns}"),
            None => format!("Error listing {kind}s"),
        })?;

    if let Some(prefix) = p.prefix.as_deref().filter(|s| !s.is_empty()) {
        items.retain(|obj| tekton::name_of(obj).starts_with(prefix));
    }
    tracing::debug!(%kind, count = items.len(), "Listed resources");

    format.render(&items)
}
