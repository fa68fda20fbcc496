use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::TtlCache;
use crate::error::DeepDocError;
use crate::urlenc::encode_query;

const PRODUCT_USER_AGENT: &str = "AppleDeepDocs-MCP/1.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const CACHE_TTL: Duration = Duration::from_secs(3600);
const CACHE_MAX_ENTRIES: usize = 50;
const CACHE_RETAIN_ENTRIES: usize = 25;

const URL_SUGGESTION: &str =
    "Example: https://github.com/apple/swift/blob/main/stdlib/public/Concurrency/Task.swift";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RepoSearchUrls {
    pub github_search: String,
    pub swift_code: String,
    pub repositories: String,
    pub issues: String,
    pub apple_org: String,
    pub swiftlang_org: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RepoSearchLinks {
    pub query: String,
    pub search_urls: RepoSearchUrls,
    pub note: String,
    pub tip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchedFile {
    pub content: String,
    pub url: String,
    pub raw_url: String,
    pub language: String,
    pub repo: String,
    pub path: String,
    pub size: usize,
    pub lines: usize,
}

/// Components of an accepted GitHub file URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubFileRef {
    pub org: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl GithubFileRef {
    /// Parses blob URLs and raw URLs from the apple/swiftlang organizations.
    pub fn parse(url: &str) -> Option<Self> {
        static BLOB_RE: OnceLock<Regex> = OnceLock::new();
        static RAW_RE: OnceLock<Regex> = OnceLock::new();
        let blob_re = BLOB_RE.get_or_init(|| {
            Regex::new(r"github\.com/(apple|swiftlang)/([^/]+)/blob/([^/]+)/(.+)")
                .expect("Invalid regex")
        });
        let raw_re = RAW_RE.get_or_init(|| {
            Regex::new(r"raw\.githubusercontent\.com/(apple|swiftlang)/([^/]+)/([^/]+)/(.+)")
                .expect("Invalid regex")
        });

        let captures = blob_re.captures(url).or_else(|| raw_re.captures(url))?;
        Some(Self {
            org: captures[1].to_string(),
            repo: captures[2].to_string(),
            branch: captures[3].to_string(),
            path: captures[4].to_string(),
        })
    }

    pub fn raw_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.org, self.repo, self.branch, self.path
        )
    }
}

/// Search and fetch access to Apple's open-source Swift ecosystem on GitHub.
///
/// Uses GitHub's web search URLs instead of the API, so no authentication or
/// rate-limit handling is needed.
pub struct SwiftRepos {
    http: reqwest::Client,
    cache: TtlCache<FetchedFile>,
}

impl SwiftRepos {
    pub fn new() -> Result<Self, DeepDocError> {
        let http = reqwest::Client::builder()
            .user_agent(PRODUCT_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            cache: TtlCache::new(CACHE_TTL, CACHE_MAX_ENTRIES, CACHE_RETAIN_ENTRIES),
        })
    }

    /// Generated search URLs spanning both organizations and several scopes.
    pub fn search(&self, query: &str) -> RepoSearchLinks {
        let encoded = encode_query(query);

        RepoSearchLinks {
            query: query.to_string(),
            search_urls: RepoSearchUrls {
                github_search: format!(
                    "https://github.com/search?q={encoded}+org:apple+org:swiftlang&type=code"
                ),
                swift_code: format!(
                    "https://github.com/search?q={encoded}+language:Swift+org:apple+org:swiftlang&type=code"
                ),
                repositories: format!(
                    "https://github.com/search?q={encoded}+org:apple+org:swiftlang&type=repositories"
                ),
                issues: format!(
                    "https://github.com/search?q={encoded}+org:apple+org:swiftlang&type=issues"
                ),
                apple_org: format!("https://github.com/search?q={encoded}+org:apple&type=code"),
                swiftlang_org: format!(
                    "https://github.com/search?q={encoded}+org:swiftlang&type=code"
                ),
            },
            note: "GitHub's search algorithm will automatically find relevant code, types, and discussions.".to_string(),
            tip: "Start with \"github_search\" - it searches across code, comments, and documentation. Use \"repositories\" to find relevant projects.".to_string(),
        }
    }

    /// Fetches one file's source from the apple/swiftlang organizations.
    pub async fn fetch_file(&self, url: &str) -> Result<FetchedFile, DeepDocError> {
        if !is_allowed_origin(url) {
            return Err(DeepDocError::InvalidInput(format!(
                "URL must be from github.com/apple/ or github.com/swiftlang/ organizations; {URL_SUGGESTION}"
            )));
        }

        let file_ref = GithubFileRef::parse(url).ok_or_else(|| {
            DeepDocError::InvalidInput(
                "could not parse repository and file information from URL; \
                 expected github.com/{org}/{repo}/blob/{branch}/{path}"
                    .to_string(),
            )
        })?;
        let raw_url = file_ref.raw_url();

        if let Some(cached) = self.cache.get(&raw_url) {
            return Ok((*cached).clone());
        }

        let response = self
            .http
            .get(&raw_url)
            .header(reqwest::header::ACCEPT, "text/plain, */*")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeepDocError::Fetch(format!(
                "HTTP {status} fetching {url}; check that the URL is correct and the file exists \
                 (only public files can be fetched)"
            )));
        }

        let content = response.text().await?;
        let fetched = FetchedFile {
            language: detect_language(&file_ref.path).to_string(),
            repo: format!("{}/{}", file_ref.org, file_ref.repo),
            path: file_ref.path,
            size: content.len(),
            lines: content.split('\n').count(),
            url: url.to_string(),
            raw_url: raw_url.clone(),
            content,
        };
        self.cache.insert(raw_url, fetched.clone());
        Ok(fetched)
    }
}

fn is_allowed_origin(url: &str) -> bool {
    url.contains("github.com/apple/")
        || url.contains("github.com/swiftlang/")
        || url.contains("raw.githubusercontent.com/apple/")
        || url.contains("raw.githubusercontent.com/swiftlang/")
}

/// Maps a file path to a coarse language label by extension.
pub fn detect_language(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or_default();
    match extension {
        "swift" => "swift",
        "md" => "markdown",
        "py" => "python",
        "cpp" | "cc" | "cxx" => "cpp",
        "c" => "c",
        "h" | "hpp" => "header",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "sh" => "shell",
        "txt" => "text",
        _ => "unknown",
    }
}
