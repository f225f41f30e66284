//! MCP server implementation.
//!
//! Runs an MCP server on stdio or streamable HTTP, exposing Tekton tools and
//! `tekton://` resources to AI assistants.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorCode, ErrorData as McpError, Implementation,
        ListResourceTemplatesResult, PaginatedRequestParam, ProtocolVersion,
        ReadResourceRequestParam, ReadResourceResult, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router,
    transport::{
        stdio,
        streamable_http_server::{session::local::LocalSessionManager, StreamableHttpService},
    },
    ServerHandler, ServiceExt,
};

use super::resources;
use super::tools::{
    artifacthub::{self, InstallParams, SearchParams, TriggerParams},
    create::{self, CreateParams, PatchParams, UpdateParams},
    delete::{self, DeleteAllParams, DeleteParams},
    get::{self, GetParams, GetRunParams},
    list::{self, ListParams},
    logs::{self, LogsParams},
    run::{self, RestartParams, StartParams},
    Services,
};
use crate::artifacthub::ArtifactHubClient;
use crate::cluster::Cluster;
use crate::config::{Config, Transport};
use crate::tekton::TektonKind;

/// The Tekton MCP server.
#[derive(Clone)]
pub struct TektonServer {
    tool_router: ToolRouter<TektonServer>,
    services: Services,
}

impl TektonServer {
    /// Creates a server around its collaborators.
    pub fn new(services: Services) -> Self {
        Self {
            tool_router: Self::tool_router(),
            services,
        }
    }
}

/// Creates an McpError from an error message.
fn mcp_error(message: &str) -> McpError {
    McpError {
        code: ErrorCode(-32603),
        message: Cow::from(message.to_string()),
        data: None,
    }
}

/// Wraps a tool outcome. Failures become tool-result errors, not protocol faults.
fn tool_result(result: anyhow::Result<String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => {
            tracing::debug!(error = %format!("{e:#}"), "Tool call failed");
            Ok(CallToolResult::error(vec![Content::text(format!("Error: {e:#}"))]))
        }
    }
}

#[tool_router]
impl TektonServer {
    // ============== Get ==============

    #[tool(description = "Get a specific Pipeline by name")]
    async fn get_pipeline(
        &self,
        Parameters(params): Parameters<GetParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(get::get(&self.services, TektonKind::Pipeline, params.into()).await)
    }

    #[tool(description = "Get a specific Task by name")]
    async fn get_task(
        &self,
        Parameters(params): Parameters<GetParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(get::get(&self.services, TektonKind::Task, params.into()).await)
    }

    #[tool(description = "Get a specific StepAction by name")]
    async fn get_stepaction(
        &self,
        Parameters(params): Parameters<GetParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(get::get(&self.services, TektonKind::StepAction, params.into()).await)
    }

    #[tool(description = "Get a specific PipelineRun by name, optionally overlaying params")]
    async fn get_pipelinerun(
        &self,
        Parameters(params): Parameters<GetRunParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(get::get(&self.services, TektonKind::PipelineRun, params).await)
    }

    #[tool(description = "Get a specific TaskRun by name, optionally overlaying params")]
    async fn get_taskrun(
        &self,
        Parameters(params): Parameters<GetRunParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(get::get(&self.services, TektonKind::TaskRun, params).await)
    }

    // ============== List ==============

    #[tool(description = "List pipelines in the cluster with filtering options")]
    async fn list_pipelines(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(list::list(&self.services, TektonKind::Pipeline, params).await)
    }

    #[tool(description = "List pipelineruns in the cluster with filtering options")]
    async fn list_pipelineruns(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(list::list(&self.services, TektonKind::PipelineRun, params).await)
    }

    #[tool(description = "List tasks in the cluster with filtering options")]
    async fn list_tasks(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(list::list(&self.services, TektonKind::Task, params).await)
    }

    #[tool(description = "List taskruns in the cluster with filtering options")]
    async fn list_taskruns(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(list::list(&self.services, TektonKind::TaskRun, params).await)
    }

    #[tool(description = "List stepactions in the cluster with filtering options")]
    async fn list_stepactions(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(list::list(&self.services, TektonKind::StepAction, params).await)
    }

    // ============== Create / Update / Patch ==============

    #[tool(description = "Create a Pipeline from a YAML or JSON definition")]
    async fn create_pipeline(
        &self,
        Parameters(params): Parameters<CreateParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(create::create(&self.services, TektonKind::Pipeline, params).await)
    }

    #[tool(description = "Create a Task from a YAML or JSON definition")]
    async fn create_task(
        &self,
        Parameters(params): Parameters<CreateParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(create::create(&self.services, TektonKind::Task, params).await)
    }

    #[tool(description = "Update an existing Pipeline")]
    async fn update_pipeline(
        &self,
        Parameters(params): Parameters<UpdateParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(create::update(&self.services, TektonKind::Pipeline, params).await)
    }

    #[tool(description = "Update an existing Task")]
    async fn update_task(
        &self,
        Parameters(params): Parameters<UpdateParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(create::update(&self.services, TektonKind::Task, params).await)
    }

    #[tool(description = "Apply a JSON patch to an existing Pipeline")]
    async fn patch_pipeline(
        &self,
        Parameters(params): Parameters<PatchParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(create::patch(&self.services, TektonKind::Pipeline, params).await)
    }

    #[tool(description = "Apply a JSON patch to an existing Task")]
    async fn patch_task(
        &self,
        Parameters(params): Parameters<PatchParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(create::patch(&self.services, TektonKind::Task, params).await)
    }

    // ============== Delete ==============

    #[tool(description = "Delete a Pipeline")]
    async fn delete_pipeline(
        &self,
        Parameters(params): Parameters<DeleteParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(delete::delete(&self.services, TektonKind::Pipeline, params).await)
    }

    #[tool(description = "Delete a Task")]
    async fn delete_task(
        &self,
        Parameters(params): Parameters<DeleteParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(delete::delete(&self.services, TektonKind::Task, params).await)
    }

    #[tool(description = "Delete a PipelineRun")]
    async fn delete_pipelinerun(
        &self,
        Parameters(params): Parameters<DeleteParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(delete::delete(&self.services, TektonKind::PipelineRun, params).await)
    }

    #[tool(description = "Delete a TaskRun")]
    async fn delete_taskrun(
        &self,
        Parameters(params): Parameters<DeleteParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(delete::delete(&self.services, TektonKind::TaskRun, params).await)
    }

    #[tool(description = "Delete multiple PipelineRuns based on selectors")]
    async fn delete_all_pipelineruns(
        &self,
        Parameters(params): Parameters<DeleteAllParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(delete::delete_all_pipeline_runs(&self.services, params).await)
    }

    // ============== Runs ==============

    #[tool(description = "Start a Pipeline")]
    async fn start_pipeline(
        &self,
        Parameters(params): Parameters<StartParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(run::start(&self.services, TektonKind::Pipeline, params).await)
    }

    #[tool(description = "Start a Task")]
    async fn start_task(
        &self,
        Parameters(params): Parameters<StartParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(run::start(&self.services, TektonKind::Task, params).await)
    }

    #[tool(description = "Restart a PipelineRun")]
    async fn restart_pipelinerun(
        &self,
        Parameters(params): Parameters<RestartParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(run::restart(&self.services, TektonKind::PipelineRun, params).await)
    }

    #[tool(description = "Restart a TaskRun")]
    async fn restart_taskrun(
        &self,
        Parameters(params): Parameters<RestartParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(run::restart(&self.services, TektonKind::TaskRun, params).await)
    }

    // ============== Logs ==============

    #[tool(description = "Get the logs for a given TaskRun")]
    async fn get_taskrun_logs(
        &self,
        Parameters(params): Parameters<LogsParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(logs::taskrun_logs(&self.services, params).await)
    }

    #[tool(description = "Get the logs of every TaskRun of a given PipelineRun")]
    async fn get_pipelinerun_logs(
        &self,
        Parameters(params): Parameters<LogsParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(logs::pipelinerun_logs(&self.services, params).await)
    }

    // ============== Artifact Hub ==============

    #[tool(description = "List Tekton tasks from Artifact Hub with search options")]
    async fn list_artifacthub_tasks(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(artifacthub::search(&self.services, TektonKind::Task, params).await)
    }

    #[tool(description = "List Tekton pipelines from Artifact Hub with search options")]
    async fn list_artifacthub_pipelines(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(artifacthub::search(&self.services, TektonKind::Pipeline, params).await)
    }

    #[tool(
        description = "Install a Tekton task from Artifact Hub to the cluster. The packageId must be in the format 'tekton-task/{repository-name}/{package-name}', as shown by list_artifacthub_tasks."
    )]
    async fn install_artifacthub_task(
        &self,
        Parameters(params): Parameters<InstallParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(artifacthub::install(&self.services, TektonKind::Task, params).await)
    }

    #[tool(
        description = "Install a Tekton pipeline from Artifact Hub to the cluster. The packageId must be in the format 'tekton-pipeline/{repository-name}/{package-name}', as shown by list_artifacthub_pipelines."
    )]
    async fn install_artifacthub_pipeline(
        &self,
        Parameters(params): Parameters<InstallParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(artifacthub::install(&self.services, TektonKind::Pipeline, params).await)
    }

    #[tool(description = "Trigger a Tekton task that was installed from Artifact Hub")]
    async fn trigger_artifacthub_task(
        &self,
        Parameters(params): Parameters<TriggerParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(artifacthub::trigger(&self.services, TektonKind::Task, params).await)
    }

    #[tool(description = "Trigger a Tekton pipeline that was installed from Artifact Hub")]
    async fn trigger_artifacthub_pipeline(
        &self,
        Parameters(params): Parameters<TriggerParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(artifacthub::trigger(&self.services, TektonKind::Pipeline, params).await)
    }
}

#[tool_handler]
impl ServerHandler for TektonServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Tekton MCP server. Use these tools to inspect, create, start and clean up \
                 Tekton Pipelines, Tasks, PipelineRuns, TaskRuns and StepActions, read run \
                 logs, and install community tasks and pipelines from Artifact Hub. \
                 Resources are available as tekton://{kind}/{namespace}/{name}."
                    .to_string(),
            ),
        }
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_ {
        async move {
            let templates = resources::templates()
                .map_err(|e| mcp_error(&format!("Failed to build resource templates: {e}")))?;
            Ok(ListResourceTemplatesResult::with_all_items(templates))
        }
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move { resources::read(&self.services, &request.uri).await }
    }
}

/// Runs the MCP server on the configured transport.
///
/// Returns when the client disconnects (stdio) or on Ctrl-C (http).
pub async fn run_server(config: &Config, cluster: Arc<dyn Cluster>) -> Result<()> {
    let hub = ArtifactHubClient::with_url(&config.artifacthub_url, config.http_timeout_secs)
        .context("Failed to create Artifact Hub client")?;
    let server = TektonServer::new(Services::new(cluster, hub, &config.default_namespace));

    match config.transport {
        Transport::Stdio => {
            tracing::info!("Serving MCP on stdio");
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
        Transport::Http => {
            let address = config
                .address
                .as_deref()
                .context("The http transport requires an address")?;
            serve_http(server, address).await?;
        }
    }
    Ok(())
}

async fn serve_http(server: TektonServer, address: &str) -> Result<()> {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    tracing::info!(address, "Serving MCP over streamable HTTP at /mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::memory::{tekton_object, MemoryCluster};
    use crate::mcp::tools::testing::services;
    use serde_json::json;

    fn server(cluster: MemoryCluster) -> TektonServer {
        TektonServer::new(services(cluster).0)
    }

    fn text(result: &CallToolResult) -> String {
        result.content[0]
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_get_info_enables_tools_and_resources() {
        let info = server(MemoryCluster::new()).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.instructions.unwrap().contains("tekton://"));
    }

    #[test]
    fn test_all_tools_registered() {
        let server = server(MemoryCluster::new());
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();

        let mut expected = vec![
            "create_pipeline",
            "create_task",
            "delete_all_pipelineruns",
            "delete_pipeline",
            "delete_pipelinerun",
            "delete_task",
            "delete_taskrun",
            "get_pipeline",
            "get_pipelinerun",
            "get_pipelinerun_logs",
            "get_stepaction",
            "get_task",
            "get_taskrun",
            "get_taskrun_logs",
            "install_artifacthub_pipeline",
            "install_artifacthub_task",
            "list_artifacthub_pipelines",
            "list_artifacthub_tasks",
            "list_pipelineruns",
            "list_pipelines",
            "list_stepactions",
            "list_taskruns",
            "list_tasks",
            "patch_pipeline",
            "patch_task",
            "restart_pipelinerun",
            "restart_taskrun",
            "start_pipeline",
            "start_task",
            "trigger_artifacthub_pipeline",
            "trigger_artifacthub_task",
            "update_pipeline",
            "update_task",
        ];
        expected.sort();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_tool_success_is_text() {
        let server = server(MemoryCluster::new().with(
            TektonKind::Pipeline,
            tekton_object(TektonKind::Pipeline, "default", "build", json!({"spec": {}})),
        ));
        let result = server
            .get_pipeline(Parameters(GetParams {
                name: "build".to_string(),
                namespace: None,
                output: Some("json".to_string()),
            }))
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert!(text(&result).contains("\"name\": \"build\""));
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_result() {
        let server = server(MemoryCluster::new());
        let result = server
            .delete_task(Parameters(DeleteParams {
                name: "missing".to_string(),
                namespace: Some("ci".to_string()),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        let message = text(&result);
        assert!(message.starts_with("Error: Error deleting Task"));
        assert!(message.contains("Task ci/missing not found"));
    }
}
