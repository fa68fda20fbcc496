use appledeepdoc::DeepDocError;
use rmcp::model::ErrorData;

pub type McpError = ErrorData;

pub fn to_mcp_error(err: DeepDocError) -> McpError {
    match err {
        DeepDocError::InvalidInput(message) => ErrorData::invalid_params(message, None),
        err @ DeepDocError::NotFound(_) => ErrorData::invalid_params(err.to_string(), None),
        other => ErrorData::internal_error(other.to_string(), None),
    }
}

pub fn invalid_params(message: impl Into<String>) -> McpError {
    ErrorData::invalid_params(message.into(), None)
}
