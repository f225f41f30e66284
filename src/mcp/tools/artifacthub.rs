//! Artifact Hub tools: search, install into the cluster, and trigger.

use std::collections::BTreeMap;
use std::fmt::Write;

use anyhow::{bail, Context, Result};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_definition, require_name, Services};
use crate::artifacthub::SearchResponse;
use crate::params;
use crate::tekton::{self, TektonKind};

/// Number of packages returned when the caller gives no limit.
const DEFAULT_SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Text to search for")]
    pub query: Option<String>,

    #[schemars(description = "Maximum number of packages to return (default: 20)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct InstallParams {
    #[serde(rename = "packageId")]
    #[schemars(
        description = "Artifact Hub package id, as shown in the Install ID of the list output, e.g. tekton-task/tekton-catalog-tasks/git-clone"
    )]
    pub package_id: String,

    #[schemars(description = "Package version to install (default: latest)")]
    pub version: Option<String>,

    #[schemars(description = "Namespace to install into (default: the server's default namespace)")]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TriggerParams {
    #[schemars(description = "Name of the installed Task or Pipeline")]
    pub name: String,

    #[schemars(description = "Namespace of the Task or Pipeline (default: the server's default namespace)")]
    pub namespace: Option<String>,

    #[schemars(
        description = "Params for the run as a JSON object; arrays and objects become array and object params"
    )]
    pub params: Option<BTreeMap<String, Value>>,
}

/// Artifact Hub naming for a Tekton kind.
struct HubKind {
    kind: TektonKind,
    /// Lowercase plural used in messages.
    plural: &'static str,
    /// Prefix of installable package ids.
    id_prefix: &'static str,
}

impl HubKind {
    fn of(kind: TektonKind) -> Self {
        match kind {
            TektonKind::Pipeline => Self {
                kind,
                plural: "pipelines",
                id_prefix: "tekton-pipeline",
            },
            _ => Self {
                kind: TektonKind::Task,
                plural: "tasks",
                id_prefix: "tekton-task",
            },
        }
    }
}

/// Implementation of list_artifacthub_tasks and list_artifacthub_pipelines.
pub async fn search(svc: &Services, kind: TektonKind, p: SearchParams) -> Result<String> {
    let hub = HubKind::of(kind);
    let query = p.query.unwrap_or_default();
    let limit = p.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_SEARCH_LIMIT);

    let response = match hub.kind {
        TektonKind::Pipeline => svc.hub.search_tekton_pipelines(&query, limit).await,
        _ => svc.hub.search_tekton_tasks(&query, limit).await,
    }
    .with_context(|| format!("Error searching Artifact Hub for {}", hub.plural))?;

    Ok(format_listing(&hub, &response))
}

fn format_listing(hub: &HubKind, response: &SearchResponse) -> String {
    if response.packages.is_empty() {
        return format!("No Tekton {} found on Artifact Hub", hub.plural);
    }

    let mut out = format!(
        "Found {} Tekton {} on Artifact Hub:\n\n",
        response.packages.len(),
        hub.plural
    );
    for (i, pkg) in response.packages.iter().enumerate() {
        let _ = writeln!(out, "{}. **{}** (v{})", i + 1, pkg.title(), pkg.version);
        let _ = writeln!(
            out,
            "   Install ID: {}/{}/{}",
            hub.id_prefix, pkg.repository.name, pkg.normalized_name
        );
        if !pkg.description.is_empty() {
            let _ = writeln!(out, "   Description: {}", pkg.description);
        }
        if !pkg.keywords.is_empty() {
            let _ = writeln!(out, "   Keywords: {}", pkg.keywords.join(", "));
        }
        let repository = pkg
            .repository
            .display_name
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&pkg.repository.name);
        let _ = writeln!(out, "   Repository: {repository}");
        if let Some(home) = pkg.home_url.as_deref().filter(|h| !h.is_empty()) {
            let _ = writeln!(out, "   Homepage: {home}");
        }
        out.push('\n');
    }
    out
}

/// Implementation of install_artifacthub_task and install_artifacthub_pipeline.
pub async fn install(svc: &Services, kind: TektonKind, p: InstallParams) -> Result<String> {
    let hub = HubKind::of(kind);
    if p.package_id.trim().is_empty() {
        bail!("packageId parameter is required");
    }
    let namespace = svc.namespace(p.namespace.as_deref());

    let pkg = svc
        .hub
        .get_package(&p.package_id, p.version.as_deref())
        .await
        .context("Error getting package from Artifact Hub")?;

    let Some(content_url) = pkg.content_url.as_deref().filter(|u| !u.is_empty()) else {
        bail!("Package does not have a content URL");
    };

    tracing::info!(
        package_id = %p.package_id,
        content_url,
        namespace = %namespace,
        "Installing Tekton {} from Artifact Hub",
        hub.kind.selector()
    );

    let content = svc
        .hub
        .get_package_content(content_url)
        .await
        .context("Error getting package content")?;

    let mut obj = parse_definition(&content, hub.kind)?;
    obj.metadata.namespace = Some(namespace.clone());
    obj.metadata.resource_version = None;

    let created = svc
        .cluster
        .create(hub.kind, &namespace, &obj)
        .await
        .with_context(|| {
            format!(
                "Error creating {} {namespace}/{} in cluster",
                hub.kind.selector(),
                tekton::name_of(&obj)
            )
        })?;

    Ok(format!(
        "Successfully installed Tekton {} '{}' (v{}) to namespace '{namespace}' as '{}'",
        hub.kind.selector(),
        pkg.title(),
        pkg.version,
        tekton::name_of(&created)
    ))
}

/// Implementation of trigger_artifacthub_task and trigger_artifacthub_pipeline.
///
/// Unlike start_*, the referenced Task or Pipeline is not looked up first.
pub async fn trigger(svc: &Services, kind: TektonKind, p: TriggerParams) -> Result<String> {
    let hub = HubKind::of(kind);
    require_name(hub.kind, &p.name)?;
    let namespace = svc.namespace(p.namespace.as_deref());

    let map: serde_json::Map<String, Value> = p.params.unwrap_or_default().into_iter().collect();
    let params = params::from_json_map(&map);

    let run = tekton::new_run(hub.kind, &p.name, &namespace, format!("{}-run-", p.name), &params)
        .map_err(anyhow::Error::msg)?;
    let run_kind = match hub.kind {
        TektonKind::Pipeline => TektonKind::PipelineRun,
        _ => TektonKind::TaskRun,
    };

    let created = svc
        .cluster
        .create(run_kind, &namespace, &run)
        .await
        .with_context(|| format!("Error creating {run_kind} {namespace}/{}-run-", p.name))?;

    Ok(format!(
        "Successfully triggered {run_kind} '{}' for {} '{}' in namespace '{namespace}'",
        tekton::name_of(&created),
        hub.kind.selector(),
        p.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacthub::{Package, Repository};
    use crate::cluster::memory::MemoryCluster;
    use crate::mcp::tools::testing::{services, services_with_hub};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn package(name: &str, description: &str, keywords: &[&str]) -> Package {
        Package {
            name: name.to_string(),
            normalized_name: name.to_string(),
            display_name: name.replace('-', " "),
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            version: "0.9.0".to_string(),
            repository: Repository {
                name: "tekton-catalog-tasks".to_string(),
                display_name: Some("Tekton Catalog".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_format_listing() {
        let mut with_home = package("git-clone", "Clone a repo", &["git", "scm"]);
        with_home.home_url = Some("https://tekton.dev".to_string());
        let response = SearchResponse {
            packages: vec![with_home, package("lint", "", &[])],
        };

        let text = format_listing(&HubKind::of(TektonKind::Task), &response);
        assert_eq!(
            text,
            "Found 2 Tekton tasks on Artifact Hub:\n\n\
             1. **git clone** (v0.9.0)\n   \
             Install ID: tekton-task/tekton-catalog-tasks/git-clone\n   \
             Description: Clone a repo\n   \
             Keywords: git, scm\n   \
             Repository: Tekton Catalog\n   \
             Homepage: https://tekton.dev\n\n\
             2. **lint** (v0.9.0)\n   \
             Install ID: tekton-task/tekton-catalog-tasks/lint\n   \
             Repository: Tekton Catalog\n\n"
        );
    }

    #[test]
    fn test_format_listing_empty() {
        let text = format_listing(&HubKind::of(TektonKind::Pipeline), &SearchResponse::default());
        assert_eq!(text, "No Tekton pipelines found on Artifact Hub");
    }

    #[tokio::test]
    async fn test_search_uses_default_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/packages/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("kind".into(), "11".into()),
                Matcher::UrlEncoded("limit".into(), "20".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"packages": []}"#)
            .create_async()
            .await;
        let (svc, _) = services_with_hub(MemoryCluster::new(), &server.url());

        let text = search(&svc, TektonKind::Pipeline, SearchParams::default())
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(text, "No Tekton pipelines found on Artifact Hub");
    }

    #[tokio::test]
    async fn test_install_task() {
        let mut server = Server::new_async().await;
        let content_url = format!("{}/raw/git-clone.yaml", server.url());
        server
            .mock("GET", "/packages/tekton-task/catalog/git-clone/0.9.0")
            .with_status(200)
            .with_body(
                json!({
                    "name": "git-clone",
                    "display_name": "git clone",
                    "version": "0.9.0",
                    "content_url": content_url,
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/raw/git-clone.yaml")
            .with_status(200)
            .with_body(
                "apiVersion: tekton.dev/v1\nkind: Task\nmetadata:\n  name: git-clone\n  namespace: upstream\n  resourceVersion: \"7\"\nspec:\n  steps: []\n",
            )
            .create_async()
            .await;
        let (svc, cluster) = services_with_hub(MemoryCluster::new(), &server.url());

        let msg = install(
            &svc,
            TektonKind::Task,
            InstallParams {
                package_id: "tekton-task/catalog/git-clone".to_string(),
                version: Some("0.9.0".to_string()),
                namespace: Some("ci".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            msg,
            "Successfully installed Tekton task 'git clone' (v0.9.0) to namespace 'ci' as 'git-clone'"
        );
        let tasks = cluster.objects(TektonKind::Task);
        assert_eq!(tasks[0].metadata.namespace.as_deref(), Some("ci"));
    }

    #[tokio::test]
    async fn test_install_rejects_wrong_kind() {
        let mut server = Server::new_async().await;
        let content_url = format!("{}/raw/pipeline.yaml", server.url());
        server
            .mock("GET", "/packages/tekton-task/catalog/build")
            .with_status(200)
            .with_body(json!({"name": "build", "version": "1.0.0", "content_url": content_url}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/raw/pipeline.yaml")
            .with_status(200)
            .with_body("apiVersion: tekton.dev/v1\nkind: Pipeline\nmetadata:\n  name: build\n")
            .create_async()
            .await;
        let (svc, cluster) = services_with_hub(MemoryCluster::new(), &server.url());

        let err = install(
            &svc,
            TektonKind::Task,
            InstallParams {
                package_id: "tekton-task/catalog/build".to_string(),
                version: None,
                namespace: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("not a valid Tekton Task"));
        assert!(cluster.objects(TektonKind::Task).is_empty());
    }

    #[tokio::test]
    async fn test_install_without_content_url() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/packages/tekton-task/catalog/empty")
            .with_status(200)
            .with_body(r#"{"name": "empty", "version": "1.0.0"}"#)
            .create_async()
            .await;
        let (svc, _) = services_with_hub(MemoryCluster::new(), &server.url());

        let err = install(
            &svc,
            TektonKind::Task,
            InstallParams {
                package_id: "tekton-task/catalog/empty".to_string(),
                version: None,
                namespace: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Package does not have a content URL");
    }

    #[tokio::test]
    async fn test_trigger_pipeline_with_json_params() {
        let (svc, cluster) = services(MemoryCluster::new());
        let params = BTreeMap::from([
            ("count".to_string(), json!(3)),
            ("images".to_string(), json!(["a", "b"])),
            ("repo".to_string(), json!("https://example.com/r.git")),
        ]);

        let msg = trigger(
            &svc,
            TektonKind::Pipeline,
            TriggerParams {
                name: "build".to_string(),
                namespace: None,
                params: Some(params),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            msg,
            "Successfully triggered PipelineRun 'build-run-00001' for pipeline 'build' in namespace 'default'"
        );
        let run = &cluster.objects(TektonKind::PipelineRun)[0];
        assert_eq!(run.metadata.generate_name.as_deref(), Some("build-run-"));
        assert_eq!(
            run.data["spec"],
            json!({
                "pipelineRef": {"name": "build"},
                "params": [
                    {"name": "count", "value": "3"},
                    {"name": "images", "value": ["a", "b"]},
                    {"name": "repo", "value": "https://example.com/r.git"}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_trigger_task_without_params() {
        let (svc, cluster) = services(MemoryCluster::new());
        trigger(
            &svc,
            TektonKind::Task,
            TriggerParams {
                name: "lint".to_string(),
                namespace: Some("ci".to_string()),
                params: None,
            },
        )
        .await
        .unwrap();

        let run = &cluster.objects(TektonKind::TaskRun)[0];
        assert_eq!(run.data["spec"], json!({"taskRef": {"name": "lint"}}));
    }
}
