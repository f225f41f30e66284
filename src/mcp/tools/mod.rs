//! Tool implementations.
//!
//! Each function takes the typed arguments of one tool and returns the text
//! shown to the client. Errors carry their full context chain and are turned
//! into tool-result errors by the server.

pub mod artifacthub;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod logs;
pub mod run;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use kube::core::DynamicObject;
use serde_json::Value;

use crate::artifacthub::ArtifactHubClient;
use crate::cluster::Cluster;
use crate::tekton::{self, TektonKind};

/// Collaborators shared by every tool call.
#[derive(Clone)]
pub struct Services {
    pub cluster: Arc<dyn Cluster>,
    pub hub: ArtifactHubClient,
    pub default_namespace: String,
}

impl Services {
    pub fn new(cluster: Arc<dyn Cluster>, hub: ArtifactHubClient, default_namespace: &str) -> Self {
        Self {
            cluster,
            hub,
            default_namespace: default_namespace.to_string(),
        }
    }

    /// Resolves an optional namespace argument.
    pub fn namespace(&self, namespace: Option<&str>) -> String {
        match namespace.map(str::trim) {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => self.default_namespace.clone(),
        }
    }
}

fn require_name(kind: TektonKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("{kind} name is required");
    }
    Ok(())
}

/// Parses a YAML or JSON definition of a `kind` object.
///
/// A missing `apiVersion` or `kind` is filled in for `kind`; a present one
/// must match it.
fn parse_definition(text: &str, kind: TektonKind) -> Result<DynamicObject> {
    let mut value: Value =
        serde_yaml::from_str(text).with_context(|| format!("Error parsing {kind} YAML"))?;
    let Some(fields) = value.as_object_mut() else {
        bail!("Error parsing {kind} YAML: the definition must be a mapping");
    };
    for (key, default) in [("apiVersion", kind.api_version()), ("kind", kind.kind().to_string())] {
        if fields.get(key).is_none_or(Value::is_null) {
            fields.insert(key.to_string(), Value::String(default));
        }
    }

    let obj = serde_json::from_value(value).with_context(|| format!("Error parsing {kind} YAML"))?;
    tekton::ensure_kind(&obj, kind).map_err(anyhow::Error::msg)?;
    Ok(obj)
}
