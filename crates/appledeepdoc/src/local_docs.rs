use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{DocDiscovery, xcode_name_from_path};
use crate::error::DeepDocError;

/// Cap on the per-document match list (the filename hit counts too).
const MAX_MATCHES_PER_DOC: usize = 5;
/// Context window radius around a content match, in bytes (boundary-snapped).
const CONTEXT_RADIUS: usize = 50;
/// Document cap on a single search response.
const MAX_RESULT_DOCS: usize = 20;
/// Topic headers are extracted from this much of the document head.
const TOPIC_SCAN_BYTES: usize = 500;
/// Topic preview length per document.
const MAX_TOPICS: usize = 5;

/// Where a search hit occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Filename,
    Content,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchMatch {
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentHit {
    pub document: String,
    pub xcode_version: String,
    pub matches: Vec<SearchMatch>,
    pub total_matches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocSearchResults {
    pub query: String,
    pub total_results: usize,
    pub results: Vec<DocumentHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentListing {
    pub name: String,
    pub topics: Vec<String>,
    pub size: u64,
    pub xcode_versions: Vec<String>,
}

#[derive(Debug, Clone)]
struct IndexedDoc {
    name: String,
    path: PathBuf,
    size: u64,
    xcode_source: String,
    topics: Vec<String>,
    content: String,
}

/// In-memory index of Xcode's hidden local documentation.
///
/// All markdown files under the discovered documentation folders are loaded
/// at construction; the same document name may appear once per Xcode
/// installation.
pub struct LocalDocStore {
    docs: Vec<IndexedDoc>,
}

impl LocalDocStore {
    /// Loads the store from discovery, degrading to an empty index when no
    /// documentation source is available.
    pub fn load(discovery: &DocDiscovery) -> Self {
        match discovery.documentation_paths() {
            Ok(paths) => {
                let store = Self::from_paths(&paths);
                tracing::info!(
                    documents = store.docs.len(),
                    sources = paths.len(),
                    "indexed local documentation"
                );
                store
            }
            Err(err) => {
                tracing::error!(%err, "local documentation unavailable");
                Self { docs: Vec::new() }
            }
        }
    }

    /// Indexes every `*.md` file under the given documentation folders.
    pub fn from_paths(paths: &[PathBuf]) -> Self {
        let mut docs = Vec::new();
        for doc_path in paths {
            let xcode_source = xcode_name_from_path(doc_path);
            for file in markdown_files(doc_path) {
                match fs::read_to_string(&file) {
                    Ok(content) => {
                        let size = fs::metadata(&file).map(|meta| meta.len()).unwrap_or(0);
                        let name = file
                            .file_stem()
                            .map(|stem| stem.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        docs.push(IndexedDoc {
                            topics: extract_topics(&content),
                            name,
                            path: file,
                            size,
                            xcode_source: xcode_source.clone(),
                            content,
                        });
                    }
                    Err(err) => {
                        tracing::error!(file = %file.display(), %err, "error loading document");
                    }
                }
            }
        }
        Self { docs }
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.docs.len()
    }

    /// Searches names and content for a literal query.
    ///
    /// Filename hits rank a document ahead of content-only hits; within each
    /// group documents sort by total match count. Responses are capped to the
    /// top documents and a handful of matches per document.
    pub fn search(
        &self,
        query: &str,
        case_sensitive: bool,
    ) -> Result<DocSearchResults, DeepDocError> {
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|err| DeepDocError::InvalidInput(format!("unusable query: {err}")))?;

        let mut results = Vec::new();
        for doc in &self.docs {
            let mut matches = Vec::new();

            if pattern.is_match(&doc.name) {
                matches.push(SearchMatch {
                    kind: MatchKind::Filename,
                    context: doc.name.clone(),
                    position: None,
                });
            }

            for found in pattern.find_iter(&doc.content) {
                if matches.len() >= MAX_MATCHES_PER_DOC {
                    break;
                }
                matches.push(SearchMatch {
                    kind: MatchKind::Content,
                    context: context_window(&doc.content, found.start(), found.end()),
                    position: Some(found.start()),
                });
            }

            if !matches.is_empty() {
                results.push(DocumentHit {
                    document: doc.name.clone(),
                    xcode_version: doc.xcode_source.clone(),
                    total_matches: matches.len(),
                    matches,
                });
            }
        }

        results.sort_by_key(|hit| {
            let filename_hit = hit
                .matches
                .iter()
                .any(|found| found.kind == MatchKind::Filename);
            (!filename_hit, std::cmp::Reverse(hit.total_matches))
        });

        let total_results = results.len();
        results.truncate(MAX_RESULT_DOCS);

        Ok(DocSearchResults {
            query: query.to_string(),
            total_results,
            results,
        })
    }

    /// Returns the full markdown content of a document, optionally pinned to
    /// one Xcode installation.
    pub fn document(
        &self,
        name: &str,
        xcode_version: Option<&str>,
    ) -> Result<String, DeepDocError> {
        for doc in &self.docs {
            if doc.name != name {
                continue;
            }
            if let Some(version) = xcode_version {
                if version != doc.xcode_source {
                    continue;
                }
            }

            if !doc.content.is_empty() {
                return Ok(doc.content.clone());
            }
            // Disk fallback for documents that indexed empty.
            if doc.path.exists() {
                return Ok(fs::read_to_string(&doc.path)?);
            }
        }

        let scope = xcode_version
            .map(|version| format!(" in {version}"))
            .unwrap_or_default();
        Err(DeepDocError::NotFound(format!(
            "document '{name}'{scope}"
        )))
    }

    /// Lists documents, deduplicated by name across Xcode versions.
    pub fn list(&self, filter: Option<&str>) -> Vec<DocumentListing> {
        let filter_lower = filter.map(str::to_lowercase);
        let mut seen = BTreeSet::new();
        let mut listings = Vec::new();

        for doc in &self.docs {
            if seen.contains(&doc.name) {
                continue;
            }
            if let Some(filter) = &filter_lower {
                if !doc.name.to_lowercase().contains(filter) {
                    continue;
                }
            }
            seen.insert(doc.name.clone());
            listings.push(DocumentListing {
                name: doc.name.clone(),
                topics: doc.topics.clone(),
                size: doc.size,
                xcode_versions: self.versions_for(&doc.name),
            });
        }

        listings.sort_by(|a, b| a.name.cmp(&b.name));
        listings
    }

    /// Sorted distinct Xcode installations contributing documentation.
    pub fn xcode_versions(&self) -> Vec<String> {
        let versions: BTreeSet<&str> = self
            .docs
            .iter()
            .map(|doc| doc.xcode_source.as_str())
            .collect();
        versions.into_iter().map(str::to_string).collect()
    }

    fn versions_for(&self, name: &str) -> Vec<String> {
        let versions: BTreeSet<&str> = self
            .docs
            .iter()
            .filter(|doc| doc.name == name)
            .map(|doc| doc.xcode_source.as_str())
            .collect();
        versions.into_iter().map(str::to_string).collect()
    }
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    files
}

fn extract_topics(content: &str) -> Vec<String> {
    static HEADER_RE: OnceLock<Regex> = OnceLock::new();
    let re = HEADER_RE
        .get_or_init(|| Regex::new(r"(?m)^#{1,3}\s+(.+)$").expect("Invalid regex"));

    let head = char_prefix(content, TOPIC_SCAN_BYTES);
    re.captures_iter(head)
        .take(MAX_TOPICS)
        .map(|captures| captures[1].to_string())
        .collect()
}

fn context_window(content: &str, start: usize, end: usize) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex"));

    let from = floor_char_boundary(content, start.saturating_sub(CONTEXT_RADIUS));
    let to = ceil_char_boundary(content, (end + CONTEXT_RADIUS).min(content.len()));
    let window = content[from..to].trim();
    re.replace_all(window, " ").into_owned()
}

fn char_prefix(text: &str, max: usize) -> &str {
    &text[..floor_char_boundary(text, max.min(text.len()))]
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
