use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::urlenc::encode_query;

const BASE_URL: &str = "https://developer.apple.com/design/human-interface-guidelines";

/// Platforms with dedicated Human Interface Guidelines sections.
pub const PLATFORMS: [&str; 5] = ["ios", "macos", "tvos", "watchos", "visionos"];

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HigSearchLinks {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub base_url: String,
    pub search_url: String,
    pub direct_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HigPlatform {
    pub platform: String,
    pub name: String,
    pub url: String,
}

/// Access to Apple's Human Interface Guidelines through site search.
#[derive(Debug, Clone, Default)]
pub struct HumanInterfaceGuidelines;

impl HumanInterfaceGuidelines {
    pub fn new() -> Self {
        Self
    }

    pub fn is_known_platform(platform: &str) -> bool {
        PLATFORMS.contains(&platform.to_lowercase().as_str())
    }

    /// Search URLs for a design topic, optionally scoped to one platform.
    pub fn search(&self, query: &str, platform: Option<&str>) -> HigSearchLinks {
        let encoded = encode_query(query);

        let mut links = HigSearchLinks {
            query: query.to_string(),
            platform: platform.map(str::to_string),
            base_url: BASE_URL.to_string(),
            search_url: format!(
                "https://www.google.com/search?q=site:developer.apple.com/design/human-interface-guidelines+{encoded}"
            ),
            direct_link: BASE_URL.to_string(),
            platform_url: None,
            platform_search: None,
        };

        if let Some(platform) = platform {
            let platform_lower = platform.to_lowercase();
            if PLATFORMS.contains(&platform_lower.as_str()) {
                links.platform_url = Some(format!("{BASE_URL}/platforms/{platform_lower}"));
                links.platform_search = Some(format!(
                    "https://www.google.com/search?q=site:developer.apple.com/design/human-interface-guidelines+{platform_lower}+{encoded}"
                ));
            }
        }

        links
    }

    /// All platforms with their guideline entry points.
    pub fn platforms(&self) -> Vec<HigPlatform> {
        PLATFORMS
            .iter()
            .map(|platform| HigPlatform {
                platform: platform.to_string(),
                name: platform_display_name(platform),
                url: format!("{BASE_URL}/platforms/{platform}"),
            })
            .collect()
    }
}

fn platform_display_name(platform: &str) -> String {
    if platform == "visionos" {
        "visionOS".to_string()
    } else {
        platform.to_uppercase()
    }
}
