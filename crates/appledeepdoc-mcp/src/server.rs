use std::sync::Arc;

use rmcp::handler::server::{ServerHandler, router::Router, tool::ToolRouter};
use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use rmcp::service::ServerInitializeError;
use rmcp::{service::ServiceExt, tool_handler, transport};

use appledeepdoc::{
    AppleDocsClient, DeepDocError, DocDiscovery, HumanInterfaceGuidelines, LocalDocStore,
    SERVER_NAME, SuggestionEngine, SwiftEvolution, SwiftRepos, WwdcNotes,
};

use crate::error::to_mcp_error;
use crate::tools::build_tool_router;

#[derive(Clone)]
pub struct AppleDeepDocServer {
    pub(crate) store: Arc<LocalDocStore>,
    pub(crate) apple_docs: Arc<AppleDocsClient>,
    pub(crate) evolution: Arc<SwiftEvolution>,
    pub(crate) repos: Arc<SwiftRepos>,
    pub(crate) wwdc: WwdcNotes,
    pub(crate) hig: HumanInterfaceGuidelines,
    pub(crate) suggestions: Arc<SuggestionEngine>,
    pub(crate) tool_router: ToolRouter<Self>,
}

impl AppleDeepDocServer {
    pub fn new() -> Result<Self, DeepDocError> {
        Self::with_discovery(DocDiscovery::from_env())
    }

    pub fn with_discovery(discovery: DocDiscovery) -> Result<Self, DeepDocError> {
        let store = Arc::new(LocalDocStore::load(&discovery));
        if store.is_empty() {
            tracing::warn!("no local documentation indexed; local search tools will be empty");
        }

        Ok(Self {
            store,
            apple_docs: Arc::new(AppleDocsClient::new()?),
            evolution: Arc::new(SwiftEvolution::new()?),
            repos: Arc::new(SwiftRepos::new()?),
            wwdc: WwdcNotes::new(),
            hig: HumanInterfaceGuidelines::new(),
            suggestions: Arc::new(SuggestionEngine::new()),
            tool_router: build_tool_router(),
        })
    }

    pub fn document_count(&self) -> usize {
        self.store.document_count()
    }

    /// Start a stdio-based MCP server and wait until the transport closes.
    pub async fn run_stdio(self) -> Result<(), ServerInitializeError> {
        let tools = self.tool_router.clone();
        let router = Router::new(self).with_tools(tools);
        let service = router.serve(transport::io::stdio()).await?;

        // Hold the service open until the peer closes the transport.
        let _ = service.waiting().await;
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for AppleDeepDocServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..ServerInfo::default()
        }
    }
}

/// Convenience entry point that builds the server and runs it over stdio.
pub async fn run_stdio_server_with_discovery(
    discovery: DocDiscovery,
) -> Result<(), ServerInitializeError> {
    let server = AppleDeepDocServer::with_discovery(discovery)
        .map_err(|err| ServerInitializeError::InitializeFailed(to_mcp_error(err)))?;

    tracing::info!(
        server = SERVER_NAME,
        documents = server.document_count(),
        "starting Apple documentation MCP server via stdio"
    );
    server.run_stdio().await
}

/// Convenience entry point that resolves documentation sources from the
/// environment.
pub async fn run_stdio_server() -> Result<(), ServerInitializeError> {
    run_stdio_server_with_discovery(DocDiscovery::from_env()).await
}
