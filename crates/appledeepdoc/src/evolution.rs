use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::DeepDocError;

const EVOLUTION_JSON_URL: &str = "https://download.swift.org/swift-evolution/v1/evolution.json";
const GITHUB_WEB_BASE: &str = "https://github.com/swiftlang/swift-evolution";
const GITHUB_RAW_BASE: &str =
    "https://raw.githubusercontent.com/swiftlang/swift-evolution/main/proposals";

const PRODUCT_USER_AGENT: &str = "AppleDeepDocs-MCP";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const CACHE_TTL: Duration = Duration::from_secs(3600);

const MAX_PROPOSALS: usize = 20;
const SUMMARY_PREVIEW_CHARS: usize = 200;

// Relevance weights for proposal search.
const SCORE_VERSION_EXACT: u32 = 100;
const SCORE_VERSION_PREFIX: u32 = 50;
const SCORE_STATUS: u32 = 15;
const SCORE_TITLE: u32 = 10;
const SCORE_SUMMARY: u32 = 5;

/// Shape of swift.org's evolution.json feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvolutionFeed {
    #[serde(default)]
    pub proposals: Vec<ProposalRecord>,
    #[serde(default, rename = "implementationVersions")]
    pub implementation_versions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub status: ProposalStatus,
    #[serde(default)]
    pub authors: Vec<ProposalAuthor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalAuthor {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProposalHit {
    pub se_number: String,
    pub title: String,
    pub status: String,
    pub version: String,
    pub summary: String,
    pub github_url: String,
    pub relevance_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EvolutionSearchResults {
    pub feature: String,
    pub total_found: usize,
    pub proposals: Vec<ProposalHit>,
    pub available_versions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProposalDetails {
    pub se_number: String,
    pub title: String,
    pub status: String,
    pub version: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub github_url: String,
    pub raw_url: String,
    pub swift_org_url: String,
}

/// Searches Swift Evolution proposals through swift.org's JSON feed.
pub struct SwiftEvolution {
    http: reqwest::Client,
    feed: Mutex<Option<(Instant, Arc<EvolutionFeed>)>>,
}

impl SwiftEvolution {
    pub fn new() -> Result<Self, DeepDocError> {
        let http = reqwest::Client::builder()
            .user_agent(PRODUCT_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            feed: Mutex::new(None),
        })
    }

    /// Searches proposals by feature name, Swift version, or status.
    pub async fn search(&self, feature: &str) -> Result<EvolutionSearchResults, DeepDocError> {
        let feed = self.feed().await?;
        Ok(search_in_feed(&feed, feature))
    }

    /// Looks up one proposal by SE number (`SE-0413`, `0413`, or `413`).
    pub async fn proposal(&self, se_number: &str) -> Result<ProposalDetails, DeepDocError> {
        let feed = self.feed().await?;
        let se_num = normalize_se_number(se_number);

        let record = feed
            .proposals
            .iter()
            .find(|proposal| proposal.id.to_uppercase() == se_num)
            .ok_or_else(|| {
                DeepDocError::NotFound(format!(
                    "proposal {se_num}; visit https://www.swift.org/swift-evolution/ to browse proposals"
                ))
            })?;

        Ok(ProposalDetails {
            se_number: record.id.clone(),
            title: record.title.clone(),
            status: state_or_unknown(&record.status),
            version: version_or_na(&record.status),
            summary: record.summary.clone(),
            authors: record
                .authors
                .iter()
                .map(|author| {
                    if author.name.is_empty() {
                        "Unknown".to_string()
                    } else {
                        author.name.clone()
                    }
                })
                .collect(),
            github_url: proposal_web_url(record),
            raw_url: format!("{GITHUB_RAW_BASE}/{}", record.link),
            swift_org_url: format!(
                "https://www.swift.org/swift-evolution/#?id={}",
                record.id
            ),
        })
    }

    async fn feed(&self) -> Result<Arc<EvolutionFeed>, DeepDocError> {
        if let Some((fetched, feed)) = self.feed.lock().as_ref() {
            if fetched.elapsed() < CACHE_TTL {
                return Ok(feed.clone());
            }
        }

        let feed: EvolutionFeed = self
            .http
            .get(EVOLUTION_JSON_URL)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| {
                DeepDocError::Fetch(format!(
                    "failed to fetch Swift Evolution data: {err}; check your internet connection"
                ))
            })?
            .json()
            .await?;

        let feed = Arc::new(feed);
        *self.feed.lock() = Some((Instant::now(), feed.clone()));
        Ok(feed)
    }
}

/// Scores and ranks proposals for a feature query against a loaded feed.
pub fn search_in_feed(feed: &EvolutionFeed, feature: &str) -> EvolutionSearchResults {
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();
    let version_re = VERSION_RE
        .get_or_init(|| Regex::new(r"swift\s*(\d+\.?\d*)").expect("Invalid regex"));

    let feature_lower = feature.to_lowercase();
    let search_version = version_re
        .captures(&feature_lower)
        .map(|captures| captures[1].to_string());

    let mut hits: Vec<ProposalHit> = feed
        .proposals
        .iter()
        .filter_map(|proposal| {
            let score = score_proposal(proposal, &feature_lower, search_version.as_deref());
            (score > 0).then(|| ProposalHit {
                se_number: proposal.id.clone(),
                title: proposal.title.clone(),
                status: state_or_unknown(&proposal.status),
                version: version_or_na(&proposal.status),
                summary: summary_preview(&proposal.summary),
                github_url: proposal_web_url(proposal),
                relevance_score: score,
            })
        })
        .collect();

    hits.sort_by_key(|hit| std::cmp::Reverse(hit.relevance_score));

    let total_found = hits.len();
    hits.truncate(MAX_PROPOSALS);

    EvolutionSearchResults {
        feature: feature.to_string(),
        total_found,
        proposals: hits,
        available_versions: feed.implementation_versions.clone(),
    }
}

fn score_proposal(
    proposal: &ProposalRecord,
    feature_lower: &str,
    search_version: Option<&str>,
) -> u32 {
    let mut score = 0;
    let impl_version = proposal.status.version.as_str();

    if let Some(version) = search_version {
        if impl_version == version {
            score += SCORE_VERSION_EXACT;
        } else if !impl_version.is_empty() && impl_version.starts_with(version) {
            score += SCORE_VERSION_PREFIX;
        }
    }

    if proposal.title.to_lowercase().contains(feature_lower) {
        score += SCORE_TITLE;
    }
    if proposal.summary.to_lowercase().contains(feature_lower) {
        score += SCORE_SUMMARY;
    }
    if proposal.status.state.to_lowercase().contains(feature_lower) {
        score += SCORE_STATUS;
    }

    score
}

/// Normalizes user-provided SE numbers to `SE-XXXX`.
pub fn normalize_se_number(se_number: &str) -> String {
    let upper = se_number.trim().to_uppercase();
    if upper.starts_with("SE-") {
        upper
    } else {
        format!("SE-{upper:0>4}")
    }
}

fn summary_preview(summary: &str) -> String {
    if summary.chars().count() > SUMMARY_PREVIEW_CHARS {
        let preview: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{preview}...")
    } else {
        summary.to_string()
    }
}

fn proposal_web_url(proposal: &ProposalRecord) -> String {
    format!("{GITHUB_WEB_BASE}/blob/main/proposals/{}", proposal.link)
}

fn state_or_unknown(status: &ProposalStatus) -> String {
    if status.state.is_empty() {
        "unknown".to_string()
    } else {
        status.state.clone()
    }
}

fn version_or_na(status: &ProposalStatus) -> String {
    if status.version.is_empty() {
        "N/A".to_string()
    } else {
        status.version.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feed() -> EvolutionFeed {
        serde_json::from_str(
            r#"{
                "proposals": [
                    {
                        "id": "SE-0296",
                        "title": "Async/await",
                        "summary": "Introduces asynchronous functions into Swift.",
                        "link": "0296-async-await.md",
                        "status": {"state": "implemented", "version": "5.5"},
                        "authors": [{"name": "John McCall"}]
                    },
                    {
                        "id": "SE-0306",
                        "title": "Actors",
                        "summary": "Adds actors, which protect their state with async isolation.",
                        "link": "0306-actors.md",
                        "status": {"state": "implemented", "version": "5.5"}
                    },
                    {
                        "id": "SE-0401",
                        "title": "Remove property wrapper isolation",
                        "summary": "Isolation inference changes for Swift 6.",
                        "link": "0401-remove-property-wrapper-isolation.md",
                        "status": {"state": "implemented", "version": "6"}
                    },
                    {
                        "id": "SE-0444",
                        "title": "Member import visibility",
                        "summary": "Rejected change to import rules.",
                        "link": "0444-member-import-visibility.md",
                        "status": {"state": "rejected"}
                    }
                ],
                "implementationVersions": ["5.5", "6"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn version_queries_rank_exact_matches_first() {
        let results = search_in_feed(&sample_feed(), "Swift 6");
        assert_eq!(results.proposals[0].se_number, "SE-0401");
        assert_eq!(
            results.proposals[0].relevance_score,
            SCORE_VERSION_EXACT + SCORE_SUMMARY
        );
        assert_eq!(results.available_versions, vec!["5.5", "6"]);
    }

    #[test]
    fn text_queries_weight_title_over_summary() {
        let results = search_in_feed(&sample_feed(), "async");
        assert_eq!(results.proposals[0].se_number, "SE-0296");
        assert_eq!(
            results.proposals[0].relevance_score,
            SCORE_TITLE + SCORE_SUMMARY
        );
        // "async" also appears in the actors summary.
        assert!(results.proposals.iter().any(|hit| hit.se_number == "SE-0306"));
    }

    #[test]
    fn status_queries_surface_matching_proposals() {
        let results = search_in_feed(&sample_feed(), "rejected");
        assert_eq!(results.total_found, 1);
        assert_eq!(results.proposals[0].se_number, "SE-0444");
        assert_eq!(results.proposals[0].version, "N/A");
        assert_eq!(
            results.proposals[0].relevance_score,
            SCORE_STATUS + SCORE_SUMMARY
        );
    }

    #[test]
    fn unmatched_queries_return_empty_results() {
        let results = search_in_feed(&sample_feed(), "distributed tracing");
        assert_eq!(results.total_found, 0);
        assert!(results.proposals.is_empty());
    }

    #[test]
    fn summaries_are_truncated_for_previews() {
        let long = "x".repeat(SUMMARY_PREVIEW_CHARS + 10);
        let preview = summary_preview(&long);
        assert_eq!(preview.chars().count(), SUMMARY_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn se_numbers_normalize_to_padded_form() {
        assert_eq!(normalize_se_number("SE-0413"), "SE-0413");
        assert_eq!(normalize_se_number("se-0413"), "SE-0413");
        assert_eq!(normalize_se_number("0413"), "SE-0413");
        assert_eq!(normalize_se_number("413"), "SE-0413");
    }
}
