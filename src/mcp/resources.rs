//! `tekton://` resource templates.
//!
//! Every kind is readable as `tekton://{kind}/{namespace}/{name}`. Runs also
//! take a `params` query holding an overlay in the flat parameter syntax,
//! which is merged into the returned JSON without touching the cluster.

use reqwest::Url;
use rmcp::model::{ErrorData as McpError, ReadResourceResult, ResourceContents, ResourceTemplate};
use serde_json::json;

use super::tools::{get, Services};
use crate::params;
use crate::tekton::TektonKind;

pub const URI_SCHEME: &str = "tekton";

/// A parsed `tekton://` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri {
    pub kind: TektonKind,
    pub namespace: String,
    pub name: String,
    pub params: Option<String>,
}

impl ResourceUri {
    pub fn parse(uri: &str) -> Result<Self, String> {
        let url = Url::parse(uri).map_err(|e| format!("Invalid resource URI '{uri}': {e}"))?;
        if url.scheme() != URI_SCHEME {
            return Err(format!("Unsupported resource URI scheme '{}'", url.scheme()));
        }

        let kind: TektonKind = url
            .host_str()
            .ok_or_else(|| format!("Resource URI '{uri}' has no kind"))?
            .parse()?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let [namespace, name] = segments.as_slice() else {
            return Err(format!(
                "Resource URI '{uri}' must look like {URI_SCHEME}://{}/{{namespace}}/{{name}}",
                kind.selector()
            ));
        };

        let params = url
            .query_pairs()
            .find(|(key, _)| key == "params")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            params,
        })
    }
}

/// MIME type of a resource read.
pub fn mime_type(kind: TektonKind) -> String {
    format!("application/json;type={}", kind.selector())
}

/// The URI template advertised for `kind`.
pub fn uri_template(kind: TektonKind) -> String {
    let base = format!("{URI_SCHEME}://{}/{{namespace}}/{{name}}", kind.selector());
    if kind.is_run() {
        format!("{base}?params={{params}}")
    } else {
        base
    }
}

/// One resource template per Tekton kind.
pub fn templates() -> Result<Vec<ResourceTemplate>, serde_json::Error> {
    TektonKind::ALL
        .iter()
        .map(|kind| {
            serde_json::from_value(json!({
                "uriTemplate": uri_template(*kind),
                "name": kind.kind(),
                "description": format!("A Tekton {kind} rendered as JSON"),
                "mimeType": mime_type(*kind),
            }))
        })
        .collect()
}

/// Reads a resource.
///
/// Malformed URIs are `invalid_params` errors and failed fetches are
/// `resource_not_found` errors. An unparseable `params` overlay is logged and
/// ignored.
pub async fn read(svc: &Services, uri: &str) -> Result<ReadResourceResult, McpError> {
    let target = ResourceUri::parse(uri).map_err(|e| McpError::invalid_params(e, None))?;

    let overlay = match params::decode(target.params.as_deref().unwrap_or_default()) {
        Ok(overlay) => overlay,
        Err(e) => {
            tracing::warn!(uri, error = %e, "Error extracting parameters");
            Vec::new()
        }
    };

    tracing::info!(
        kind = %target.kind,
        namespace = %target.namespace,
        name = %target.name,
        "Reading resource"
    );

    let obj = get::fetch(svc, target.kind, &target.namespace, &target.name, overlay)
        .await
        .map_err(|e| {
            McpError::resource_not_found(
                format!(
                    "failed to get {} {}/{}: {e}",
                    target.kind, target.namespace, target.name
                ),
                None,
            )
        })?;

    let text = serde_json::to_string(&obj)
        .map_err(|e| McpError::internal_error(format!("failed to encode resource: {e}"), None))?;

    let mut contents = ResourceContents::text(text, uri);
    if let ResourceContents::TextResourceContents { mime_type: mime, .. } = &mut contents {
        *mime = Some(mime_type(target.kind));
    }
    Ok(ReadResourceResult {
        contents: vec![contents],
    })
}
