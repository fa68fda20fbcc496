use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::TtlCache;
use crate::error::DeepDocError;
use crate::urlenc::encode_query;

/// Prefix every accepted documentation URL must carry.
pub const DOC_BASE_URL: &str = "https://developer.apple.com/documentation/";

/// Apple's CDN rejects requests without a browser-like User-Agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_TTL: Duration = Duration::from_secs(3600);
const CACHE_MAX_ENTRIES: usize = 100;
const CACHE_RETAIN_ENTRIES: usize = 50;

/// Structured documentation extracted from Apple's JSON endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ParsedDocumentation {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub declaration: String,
    pub discussion: String,
    pub parameters: Vec<Value>,
    pub returns: Value,
    pub url: String,
    pub json_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OnlineSearchUrls {
    pub apple_direct: String,
    pub google: String,
    pub github: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OnlineSearch {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub search_urls: OnlineSearchUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FrameworkInfo {
    pub name: String,
    pub url: String,
    pub note: String,
}

/// Client for Apple's undocumented documentation JSON API.
pub struct AppleDocsClient {
    http: reqwest::Client,
    cache: TtlCache<Value>,
}

impl AppleDocsClient {
    pub fn new() -> Result<Self, DeepDocError> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            cache: TtlCache::new(CACHE_TTL, CACHE_MAX_ENTRIES, CACHE_RETAIN_ENTRIES),
        })
    }

    /// Fetches and parses one documentation page.
    ///
    /// Tries the primary `tutorials/data` endpoint and falls back to the
    /// older `data.json` layout that some pages still use.
    pub async fn fetch_documentation(
        &self,
        url: &str,
    ) -> Result<ParsedDocumentation, DeepDocError> {
        let (primary, fallback) = documentation_json_endpoints(url)?;

        let (data, json_url) = match self.fetch_json(&primary).await {
            Ok(data) => (data, primary),
            Err(err) => {
                tracing::debug!(%err, url = %primary, "primary endpoint failed");
                let data = self.fetch_json(&fallback).await.map_err(|err| {
                    DeepDocError::Fetch(format!(
                        "failed to fetch documentation for {url}: {err}; \
                         check that the URL is correct and the page exists"
                    ))
                })?;
                (data, fallback)
            }
        };

        let mut parsed = parse_documentation_json(&data);
        parsed.url = url.to_string();
        parsed.json_url = json_url;
        Ok(parsed)
    }

    /// Generated search URLs for a query, optionally scoped to a platform.
    pub fn search_online(&self, query: &str, platform: Option<&str>) -> OnlineSearch {
        let encoded = encode_query(query);

        let mut apple_direct = format!("{DOC_BASE_URL}technologies?filter={encoded}");
        let mut google =
            format!("https://www.google.com/search?q=site:developer.apple.com+{encoded}");
        let github =
            format!("https://github.com/search?q={encoded}+language:swift&type=code");

        if let Some(platform) = platform {
            apple_direct.push('+');
            apple_direct.push_str(platform);
            google.push('+');
            google.push_str(platform);
        }

        OnlineSearch {
            query: query.to_string(),
            platform: platform.map(str::to_string),
            search_urls: OnlineSearchUrls {
                apple_direct,
                google,
                github,
            },
        }
    }

    /// Direct documentation URL for a framework name.
    pub fn framework_info(&self, framework: &str) -> FrameworkInfo {
        let normalized: String = framework
            .to_lowercase()
            .chars()
            .filter(|ch| *ch != ' ' && *ch != '-')
            .collect();

        FrameworkInfo {
            name: framework.to_string(),
            url: format!("{DOC_BASE_URL}{normalized}"),
            note: "Direct link to framework documentation".to_string(),
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<std::sync::Arc<Value>, DeepDocError> {
        if let Some(cached) = self.cache.get(url) {
            return Ok(cached);
        }

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        let data: Value = response.json().await?;
        Ok(self.cache.insert(url.to_string(), data))
    }
}

/// Maps a documentation URL to its (primary, fallback) JSON endpoints.
fn documentation_json_endpoints(url: &str) -> Result<(String, String), DeepDocError> {
    let Some(path) = url.strip_prefix(DOC_BASE_URL) else {
        return Err(DeepDocError::InvalidInput(format!(
            "URL must start with {DOC_BASE_URL}"
        )));
    };
    let path = path.trim_end_matches('/');

    Ok((
        format!("https://developer.apple.com/tutorials/data/documentation/{path}.json"),
        format!("https://developer.apple.com/documentation/{path}/data.json"),
    ))
}

/// Flattens Apple's documentation JSON into the fields callers care about.
fn parse_documentation_json(data: &Value) -> ParsedDocumentation {
    let mut parsed = ParsedDocumentation {
        title: "Unknown".to_string(),
        returns: Value::String(String::new()),
        ..Default::default()
    };

    if let Some(title) = data.pointer("/metadata/title").and_then(Value::as_str) {
        parsed.title = title.to_string();
    }

    for section in array_at(data, "primaryContentSections") {
        match section.get("kind").and_then(Value::as_str) {
            Some("declarations") => {
                // Declarations arrive tokenized for syntax highlighting.
                for declaration in array_at(section, "declarations") {
                    for token in array_at(declaration, "tokens") {
                        if let Some(text) = token.get("text").and_then(Value::as_str) {
                            parsed.declaration.push_str(text);
                        }
                    }
                }
            }
            Some("content") => {
                for item in array_at(section, "content") {
                    if item.get("type").and_then(Value::as_str) == Some("paragraph") {
                        if let Some(text) =
                            item.pointer("/inlineContent/0/text").and_then(Value::as_str)
                        {
                            parsed.discussion.push_str(text);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    for item in array_at(data, "abstract") {
        if item.get("type").and_then(Value::as_str) == Some("text") {
            if let Some(text) = item.get("text").and_then(Value::as_str) {
                parsed.abstract_text.push_str(text);
            }
        }
    }

    for section in array_at(data, "sections") {
        match section.get("title").and_then(Value::as_str) {
            Some("Parameters") => {
                parsed.parameters = array_at(section, "items").to_vec();
            }
            Some("Return Value") => {
                if let Some(content) = section.get("content") {
                    parsed.returns = content.clone();
                }
            }
            _ => {}
        }
    }

    parsed
}

fn array_at<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoints_require_the_documentation_prefix() {
        let err = documentation_json_endpoints("https://example.com/documentation/swiftui")
            .unwrap_err();
        assert!(matches!(err, DeepDocError::InvalidInput(_)));

        let (primary, fallback) = documentation_json_endpoints(
            "https://developer.apple.com/documentation/swiftui/view/",
        )
        .unwrap();
        assert_eq!(
            primary,
            "https://developer.apple.com/tutorials/data/documentation/swiftui/view.json"
        );
        assert_eq!(
            fallback,
            "https://developer.apple.com/documentation/swiftui/view/data.json"
        );
    }

    #[test]
    fn parses_declarations_abstract_and_discussion() {
        let data = json!({
            "metadata": {"title": "View"},
            "abstract": [
                {"type": "text", "text": "A type that represents "},
                {"type": "text", "text": "part of your UI."}
            ],
            "primaryContentSections": [
                {
                    "kind": "declarations",
                    "declarations": [
                        {"tokens": [
                            {"text": "protocol "},
                            {"text": "View"}
                        ]}
                    ]
                },
                {
                    "kind": "content",
                    "content": [
                        {"type": "paragraph", "inlineContent": [{"type": "text", "text": "Discussion body."}]},
                        {"type": "codeListing"}
                    ]
                }
            ],
            "sections": [
                {"title": "Parameters", "items": [{"name": "content"}]},
                {"title": "Return Value", "content": "Some view."}
            ]
        });

        let parsed = parse_documentation_json(&data);
        assert_eq!(parsed.title, "View");
        assert_eq!(parsed.abstract_text, "A type that represents part of your UI.");
        assert_eq!(parsed.declaration, "protocol View");
        assert_eq!(parsed.discussion, "Discussion body.");
        assert_eq!(parsed.parameters, vec![json!({"name": "content"})]);
        assert_eq!(parsed.returns, json!("Some view."));
    }

    #[test]
    fn parse_tolerates_missing_sections() {
        let parsed = parse_documentation_json(&json!({}));
        assert_eq!(parsed.title, "Unknown");
        assert!(parsed.declaration.is_empty());
        assert!(parsed.parameters.is_empty());
    }

    #[test]
    fn online_search_appends_platform_filters() {
        let client = AppleDocsClient::new().unwrap();

        let plain = client.search_online("async await", None);
        assert_eq!(
            plain.search_urls.apple_direct,
            "https://developer.apple.com/documentation/technologies?filter=async%20await"
        );
        assert!(plain.search_urls.github.contains("language:swift"));

        let scoped = client.search_online("navigation", Some("ios"));
        assert!(scoped.search_urls.apple_direct.ends_with("+ios"));
        assert!(scoped.search_urls.google.ends_with("+ios"));
        assert!(!scoped.search_urls.github.contains("+ios"));
    }

    #[test]
    fn framework_info_normalizes_names() {
        let client = AppleDocsClient::new().unwrap();
        let info = client.framework_info("Core Data");
        assert_eq!(
            info.url,
            "https://developer.apple.com/documentation/coredata"
        );
        assert_eq!(info.name, "Core Data");
    }
}
