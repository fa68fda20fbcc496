//! Apple Deep Docs MCP adapter entrypoint.

mod error;
mod server;
mod telemetry;
mod tools;

pub use crate::error::{McpError, invalid_params, to_mcp_error};
pub use crate::server::{
    AppleDeepDocServer, run_stdio_server, run_stdio_server_with_discovery,
};
pub use crate::telemetry::init_tracing;
pub use crate::tools::{
    CombinedSearchResponse, DocSearchResponse, DocumentContent, EvolutionSearchResponse,
    HigSearchResponse, LocalDocsSummary, RepoSearchResponse, WwdcSearchResponse,
};
