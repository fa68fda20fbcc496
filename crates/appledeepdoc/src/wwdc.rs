use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::DeepDocError;
use crate::urlenc::encode_query;

const BASE_URL: &str = "https://wwdcnotes.com";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WwdcSearchUrls {
    pub wwdcnotes: String,
    pub apple_videos: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WwdcSearchLinks {
    pub query: String,
    pub search_urls: WwdcSearchUrls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WwdcSessionUrls {
    pub wwdcnotes: String,
    pub apple_video: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WwdcSessionInfo {
    pub session_id: String,
    pub urls: WwdcSessionUrls,
}

/// Access to community WWDC session notes and Apple's session videos.
#[derive(Debug, Clone, Default)]
pub struct WwdcNotes;

impl WwdcNotes {
    pub fn new() -> Self {
        Self
    }

    /// Search URLs for a topic, with category hints for well-known areas.
    pub fn search(&self, query: &str) -> WwdcSearchLinks {
        let encoded = encode_query(query);
        let query_lower = query.to_lowercase();

        let is_performance = ["performance", "optimize", "fast", "memory"]
            .iter()
            .any(|word| query_lower.contains(word));

        let (tip, categories) = if is_performance {
            (
                Some(
                    "WWDC has extensive performance sessions not found in regular docs"
                        .to_string(),
                ),
                Some(vec![
                    "Instruments".to_string(),
                    "App Performance".to_string(),
                    "Memory Management".to_string(),
                ]),
            )
        } else if query_lower.contains("swiftui") {
            (
                None,
                Some(vec![
                    "SwiftUI Essentials".to_string(),
                    "SwiftUI Layout".to_string(),
                    "SwiftUI Animation".to_string(),
                ]),
            )
        } else if query_lower.contains("swift") {
            (
                None,
                Some(vec![
                    "What's New in Swift".to_string(),
                    "Swift Concurrency".to_string(),
                ]),
            )
        } else {
            (None, None)
        };

        WwdcSearchLinks {
            query: query.to_string(),
            search_urls: WwdcSearchUrls {
                wwdcnotes: format!("{BASE_URL}/search?q={encoded}"),
                apple_videos: format!(
                    "https://developer.apple.com/search/?q={encoded}&type=Videos"
                ),
            },
            tip,
            categories,
        }
    }

    /// Resolves a session id (`wwdc2023-10154` or `wwdc2023/10154`) to URLs.
    pub fn session(&self, session_id: &str) -> Result<WwdcSessionInfo, DeepDocError> {
        let normalized = session_id.to_lowercase().replace('/', "-");
        let mut parts = normalized.split('-');

        let (Some(event), Some(number)) = (parts.next(), parts.next()) else {
            return Err(invalid_session_id());
        };
        let Some(year) = event.strip_prefix("wwdc") else {
            return Err(invalid_session_id());
        };
        if year.is_empty() || number.is_empty() {
            return Err(invalid_session_id());
        }

        Ok(WwdcSessionInfo {
            session_id: format!("wwdc{year}-{number}"),
            urls: WwdcSessionUrls {
                wwdcnotes: format!("{BASE_URL}/notes/wwdc{year}/{number}"),
                apple_video: format!(
                    "https://developer.apple.com/videos/play/wwdc{year}/{number}/"
                ),
            },
        })
    }
}

fn invalid_session_id() -> DeepDocError {
    DeepDocError::InvalidInput("invalid session ID format; use: wwdc2023-10154".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn performance_queries_get_tips_and_categories() {
        let links = WwdcNotes::new().search("memory optimization");
        assert!(links.tip.is_some());
        assert_eq!(
            links.categories.as_deref().unwrap(),
            ["Instruments", "App Performance", "Memory Management"]
        );
    }

    #[test]
    fn swiftui_queries_win_over_plain_swift() {
        let links = WwdcNotes::new().search("SwiftUI layout");
        assert!(links.tip.is_none());
        assert_eq!(
            links.categories.as_deref().unwrap(),
            ["SwiftUI Essentials", "SwiftUI Layout", "SwiftUI Animation"]
        );

        let swift = WwdcNotes::new().search("swift concurrency");
        assert_eq!(
            swift.categories.as_deref().unwrap(),
            ["What's New in Swift", "Swift Concurrency"]
        );
    }

    #[test]
    fn unrelated_queries_get_plain_urls() {
        let links = WwdcNotes::new().search("widgets");
        assert!(links.tip.is_none());
        assert!(links.categories.is_none());
        assert_eq!(
            links.search_urls.wwdcnotes,
            "https://wwdcnotes.com/search?q=widgets"
        );
    }

    #[test]
    fn session_ids_accept_dash_and_slash_forms() {
        let notes = WwdcNotes::new();

        let dashed = notes.session("wwdc2023-10154").unwrap();
        assert_eq!(dashed.session_id, "wwdc2023-10154");
        assert_eq!(
            dashed.urls.wwdcnotes,
            "https://wwdcnotes.com/notes/wwdc2023/10154"
        );

        let slashed = notes.session("WWDC2023/10154").unwrap();
        assert_eq!(slashed.session_id, "wwdc2023-10154");
        assert_eq!(
            slashed.urls.apple_video,
            "https://developer.apple.com/videos/play/wwdc2023/10154/"
        );
    }

    #[test]
    fn malformed_session_ids_are_rejected() {
        let notes = WwdcNotes::new();
        assert!(notes.session("10154").is_err());
        assert!(notes.session("wwdc2023").is_err());
        assert!(matches!(
            notes.session("summit2023-1"),
            Err(DeepDocError::InvalidInput(_))
        ));
    }
}
