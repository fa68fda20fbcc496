use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::schemars::JsonSchema;
use rmcp::{tool, tool_router};
use serde::{Deserialize, Serialize};
use url::Url;

use appledeepdoc::{
    DOC_BASE_URL, DocSearchResults, DocumentHit, DocumentListing, EvolutionSearchResults,
    FetchedFile, FrameworkInfo, HigPlatform, HigSearchLinks, HumanInterfaceGuidelines,
    OnlineSearch, ParsedDocumentation, ProposalDetails, RepoSearchLinks, Suggestion,
    SuggestionContext, WwdcSearchLinks, WwdcSessionInfo,
};

use crate::error::{McpError, invalid_params, to_mcp_error};
use crate::server::AppleDeepDocServer;

/// Queries longer than this are rejected before any search runs.
const MAX_QUERY_LEN: usize = 500;
/// Filesystem limit for document names.
const MAX_NAME_LEN: usize = 255;
/// Local results included in the combined online search response.
const LOCAL_PREVIEW: usize = 5;

pub(crate) fn build_tool_router() -> ToolRouter<AppleDeepDocServer> {
    AppleDeepDocServer::tool_router()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchDocsArgs {
    #[schemars(description = "Search term to find in documentation (e.g. 'liquid glass', 'TabBar').")]
    pub query: String,
    #[serde(default)]
    #[schemars(description = "Whether to perform a case-sensitive search.")]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetDocumentArgs {
    #[schemars(description = "Document name (e.g. 'SwiftUI-Implementing-Liquid-Glass-Design').")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Optional specific Xcode version (e.g. 'Xcode-26.0.0.app').")]
    pub xcode_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListDocumentsArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Optional filter string matched against document names.")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchAppleDocumentationArgs {
    #[schemars(
        description = "Full Apple documentation URL (must start with https://developer.apple.com/documentation/)."
    )]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchAppleOnlineArgs {
    #[schemars(description = "Search term (e.g. 'liquid glass', 'async await', 'Int128').")]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Optional platform filter (ios, macos, tvos, watchos, visionos).")]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetFrameworkInfoArgs {
    #[schemars(description = "Framework name (e.g. 'SwiftUI', 'UIKit', 'Foundation').")]
    pub framework: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchSwiftEvolutionArgs {
    #[schemars(description = "Feature, version, or status to search for (e.g. 'async', 'Swift 6', 'rejected').")]
    pub feature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetSwiftEvolutionProposalArgs {
    #[schemars(description = "Proposal number (e.g. 'SE-0413' or just '0413').")]
    pub se_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchSwiftReposArgs {
    #[schemars(description = "Code or concept to search for across all Swift repositories.")]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchGithubFileArgs {
    #[schemars(description = "GitHub file URL from the apple or swiftlang organizations.")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchWwdcNotesArgs {
    #[schemars(description = "Topic to search for (e.g. 'performance', 'swift concurrency').")]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetWwdcSessionArgs {
    #[schemars(description = "Session id in the form 'wwdc2023-10154' or 'wwdc2023/10154'.")]
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHigArgs {
    #[schemars(description = "Design topic or keyword to search for (e.g. 'navigation', 'dark mode').")]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Optional platform filter (ios, macos, tvos, watchos, visionos).")]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocSearchResponse {
    #[serde(flatten)]
    pub results: DocSearchResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentContent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xcode_version: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocalDocsSummary {
    pub found: usize,
    pub results: Vec<DocumentHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CombinedSearchResponse {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub local_docs: LocalDocsSummary,
    pub online: OnlineSearch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EvolutionSearchResponse {
    #[serde(flatten)]
    pub results: EvolutionSearchResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RepoSearchResponse {
    #[serde(flatten)]
    pub links: RepoSearchLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WwdcSearchResponse {
    #[serde(flatten)]
    pub links: WwdcSearchLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HigSearchResponse {
    #[serde(flatten)]
    pub links: HigSearchLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
}

#[tool_router]
impl AppleDeepDocServer {
    #[tool(
        name = "search_docs",
        description = "Search Xcode's hidden local documentation for design patterns and implementation guides (e.g. Liquid Glass, SwiftUI patterns, performance techniques)."
    )]
    pub(crate) async fn search_docs(
        &self,
        Parameters(args): Parameters<SearchDocsArgs>,
    ) -> Result<Json<DocSearchResponse>, McpError> {
        let query = require_query(&args.query)?;
        let results = self
            .store
            .search(query, args.case_sensitive)
            .map_err(to_mcp_error)?;
        let suggestions = self.suggest("search_docs", query, results.total_results);
        Ok(Json(DocSearchResponse {
            results,
            suggestions,
        }))
    }

    #[tool(
        name = "get_document",
        description = "Retrieve the full markdown content of a local Xcode documentation file by name."
    )]
    pub(crate) async fn get_document(
        &self,
        Parameters(args): Parameters<GetDocumentArgs>,
    ) -> Result<Json<DocumentContent>, McpError> {
        validate_document_name(&args.name)?;
        let content = self
            .store
            .document(&args.name, args.xcode_version.as_deref())
            .map_err(to_mcp_error)?;
        Ok(Json(DocumentContent {
            name: args.name,
            xcode_version: args.xcode_version,
            content,
        }))
    }

    #[tool(
        name = "list_documents",
        description = "List all available Xcode hidden documentation files with topics, sizes, and versions."
    )]
    pub(crate) async fn list_documents(
        &self,
        Parameters(args): Parameters<ListDocumentsArgs>,
    ) -> Result<Json<Vec<DocumentListing>>, McpError> {
        Ok(Json(self.store.list(args.filter.as_deref())))
    }

    #[tool(
        name = "get_xcode_versions",
        description = "List installed Xcode versions that ship hidden documentation."
    )]
    pub(crate) async fn get_xcode_versions(&self) -> Result<Json<Vec<String>>, McpError> {
        Ok(Json(self.store.xcode_versions()))
    }

    #[tool(
        name = "fetch_apple_documentation",
        description = "Fetch structured documentation (signatures, parameters, discussion) from any developer.apple.com/documentation URL via Apple's JSON API."
    )]
    pub(crate) async fn fetch_apple_documentation(
        &self,
        Parameters(args): Parameters<FetchAppleDocumentationArgs>,
    ) -> Result<Json<ParsedDocumentation>, McpError> {
        let url = args.url.trim();
        if url.is_empty() {
            return Err(invalid_params(
                "URL must not be empty; example: https://developer.apple.com/documentation/swiftui/view",
            ));
        }
        if !url.starts_with(DOC_BASE_URL) {
            return Err(invalid_params(format!(
                "URL must start with {DOC_BASE_URL}; \
                 example: https://developer.apple.com/documentation/swiftui/view"
            )));
        }
        let parsed = Url::parse(url)
            .map_err(|err| invalid_params(format!("malformed URL: {err}")))?;
        if parsed.host_str() != Some("developer.apple.com") {
            return Err(invalid_params(
                "URL must be from the developer.apple.com domain",
            ));
        }

        let documentation = self
            .apple_docs
            .fetch_documentation(url)
            .await
            .map_err(to_mcp_error)?;
        Ok(Json(documentation))
    }

    #[tool(
        name = "search_apple_online",
        description = "Search local Xcode docs and generate Apple/Google/GitHub search URLs for broader online exploration."
    )]
    pub(crate) async fn search_apple_online(
        &self,
        Parameters(args): Parameters<SearchAppleOnlineArgs>,
    ) -> Result<Json<CombinedSearchResponse>, McpError> {
        let local = self.store.search(&args.query, false).map_err(to_mcp_error)?;
        let online = self
            .apple_docs
            .search_online(&args.query, args.platform.as_deref());

        let found = local.total_results;
        let results: Vec<DocumentHit> = local.results.into_iter().take(LOCAL_PREVIEW).collect();
        let suggestions = self.suggest("search_apple_online", &args.query, found);

        Ok(Json(CombinedSearchResponse {
            query: args.query,
            platform: args.platform,
            local_docs: LocalDocsSummary { found, results },
            online,
            suggestions,
        }))
    }

    #[tool(
        name = "get_framework_info",
        description = "Get the direct Apple Developer documentation URL for a framework."
    )]
    pub(crate) async fn get_framework_info(
        &self,
        Parameters(args): Parameters<GetFrameworkInfoArgs>,
    ) -> Result<Json<FrameworkInfo>, McpError> {
        Ok(Json(self.apple_docs.framework_info(&args.framework)))
    }

    #[tool(
        name = "search_swift_evolution",
        description = "Search Swift Evolution proposals from swift.org for the design rationale behind language features."
    )]
    pub(crate) async fn search_swift_evolution(
        &self,
        Parameters(args): Parameters<SearchSwiftEvolutionArgs>,
    ) -> Result<Json<EvolutionSearchResponse>, McpError> {
        let results = self.evolution.search(&args.feature).await.map_err(to_mcp_error)?;
        let suggestions = self.suggest("search_swift_evolution", &args.feature, results.total_found);
        Ok(Json(EvolutionSearchResponse {
            results,
            suggestions,
        }))
    }

    #[tool(
        name = "get_swift_evolution_proposal",
        description = "Get details of one Swift Evolution proposal by SE number."
    )]
    pub(crate) async fn get_swift_evolution_proposal(
        &self,
        Parameters(args): Parameters<GetSwiftEvolutionProposalArgs>,
    ) -> Result<Json<ProposalDetails>, McpError> {
        let details = self
            .evolution
            .proposal(&args.se_number)
            .await
            .map_err(to_mcp_error)?;
        Ok(Json(details))
    }

    #[tool(
        name = "search_swift_repos",
        description = "Generate GitHub search URLs spanning all Apple and SwiftLang open-source Swift repositories."
    )]
    pub(crate) async fn search_swift_repos(
        &self,
        Parameters(args): Parameters<SearchSwiftReposArgs>,
    ) -> Result<Json<RepoSearchResponse>, McpError> {
        let links = self.repos.search(&args.query);
        let suggestions = self.suggest("search_swift_repos", &args.query, 1);
        Ok(Json(RepoSearchResponse { links, suggestions }))
    }

    #[tool(
        name = "fetch_github_file",
        description = "Fetch source code from a file in the apple or swiftlang GitHub organizations."
    )]
    pub(crate) async fn fetch_github_file(
        &self,
        Parameters(args): Parameters<FetchGithubFileArgs>,
    ) -> Result<Json<FetchedFile>, McpError> {
        let url = args.url.trim();
        if url.is_empty() {
            return Err(invalid_params(
                "GitHub file URL must not be empty; \
                 example: https://github.com/apple/swift/blob/main/stdlib/public/Concurrency/Task.swift",
            ));
        }
        let fetched = self.repos.fetch_file(url).await.map_err(to_mcp_error)?;
        Ok(Json(fetched))
    }

    #[tool(
        name = "search_wwdc_notes",
        description = "Search WWDC session notes for topics not covered in regular documentation."
    )]
    pub(crate) async fn search_wwdc_notes(
        &self,
        Parameters(args): Parameters<SearchWwdcNotesArgs>,
    ) -> Result<Json<WwdcSearchResponse>, McpError> {
        let links = self.wwdc.search(&args.query);
        let suggestions = self.suggest("search_wwdc_notes", &args.query, 1);
        Ok(Json(WwdcSearchResponse { links, suggestions }))
    }

    #[tool(
        name = "get_wwdc_session",
        description = "Resolve a WWDC session id to its notes and video URLs."
    )]
    pub(crate) async fn get_wwdc_session(
        &self,
        Parameters(args): Parameters<GetWwdcSessionArgs>,
    ) -> Result<Json<WwdcSessionInfo>, McpError> {
        let info = self.wwdc.session(&args.session_id).map_err(to_mcp_error)?;
        Ok(Json(info))
    }

    #[tool(
        name = "search_human_interface_guidelines",
        description = "Search Apple's Human Interface Guidelines for design patterns and best practices across platforms."
    )]
    pub(crate) async fn search_human_interface_guidelines(
        &self,
        Parameters(args): Parameters<SearchHigArgs>,
    ) -> Result<Json<HigSearchResponse>, McpError> {
        let query = require_query(&args.query)?;
        if let Some(platform) = &args.platform {
            if !HumanInterfaceGuidelines::is_known_platform(platform) {
                return Err(invalid_params(
                    "platform must be one of: ios, macos, tvos, watchos, visionos",
                ));
            }
        }

        let links = self.hig.search(query, args.platform.as_deref());
        let suggestions = self.suggest("search_human_interface_guidelines", query, 1);
        Ok(Json(HigSearchResponse { links, suggestions }))
    }

    #[tool(
        name = "list_human_interface_guidelines_platforms",
        description = "List all Apple platforms with links to their Human Interface Guidelines."
    )]
    pub(crate) async fn list_human_interface_guidelines_platforms(
        &self,
    ) -> Result<Json<Vec<HigPlatform>>, McpError> {
        Ok(Json(self.hig.platforms()))
    }
}

impl AppleDeepDocServer {
    fn suggest(&self, tool: &str, query: &str, results_count: usize) -> Option<Vec<Suggestion>> {
        let suggestions = self.suggestions.suggestions(SuggestionContext {
            current_tool: tool,
            query,
            results_count,
        });
        (!suggestions.is_empty()).then_some(suggestions)
    }
}

fn require_query(query: &str) -> Result<&str, McpError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(invalid_params("query must not be empty"));
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(invalid_params(format!(
            "query too long; maximum length is {MAX_QUERY_LEN} characters"
        )));
    }
    Ok(trimmed)
}

fn validate_document_name(name: &str) -> Result<(), McpError> {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(invalid_params(
            "invalid document name; use the document name only, without path separators",
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid_params(format!(
            "document name too long; maximum length is {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}
