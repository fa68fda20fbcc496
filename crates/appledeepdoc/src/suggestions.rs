use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const MAX_SUGGESTIONS: usize = 3;
const MAX_FALLBACKS: usize = 2;

/// Tools to try next when the named tool produced no results.
const FALLBACKS: &[(&str, &[&str])] = &[
    ("search_docs", &["search_apple_online", "search_wwdc_notes"]),
    (
        "search_apple_online",
        &["search_wwdc_notes", "search_swift_repos"],
    ),
    (
        "search_swift_evolution",
        &["search_swift_repos", "fetch_github_file"],
    ),
    ("search_swift_repos", &["fetch_github_file"]),
    ("search_wwdc_notes", &["search_swift_repos"]),
    (
        "search_human_interface_guidelines",
        &["search_docs", "search_apple_online"],
    ),
];

/// Keyword patterns mapped to the tools that answer them best.
const KEYWORD_ROUTES: &[(&str, &[&str])] = &[
    (
        r"performance|optimize|fast",
        &["search_wwdc_notes", "search_swift_repos"],
    ),
    (
        r"how|implement|build",
        &["search_swift_repos", "search_wwdc_notes"],
    ),
    (r"why|design|rationale", &["search_swift_evolution"]),
    (
        r"class|struct|protocol",
        &["fetch_apple_documentation", "search_apple_online"],
    ),
    (
        r"design|ui|ux|interface|button|navigation|layout|color|typography",
        &["search_human_interface_guidelines"],
    ),
];

fn keyword_patterns() -> &'static [(Regex, &'static [&'static str])] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static [&'static str])>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        KEYWORD_ROUTES
            .iter()
            .map(|(pattern, tools)| (Regex::new(pattern).expect("Invalid regex"), *tools))
            .collect()
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
    pub tool: String,
    pub reason: String,
}

/// Inputs the engine weighs when recommending a next tool.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionContext<'a> {
    pub current_tool: &'a str,
    pub query: &'a str,
    pub results_count: usize,
}

/// Recommends follow-up tools based on the invoking tool and its query.
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine;

impl SuggestionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Up to three suggestions: fallbacks when a search came up empty, then
    /// keyword-routed tools, never the current tool, deduplicated.
    pub fn suggestions(&self, context: SuggestionContext<'_>) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = Vec::new();
        let query_lower = context.query.to_lowercase();

        if context.results_count == 0 {
            if let Some((_, fallbacks)) = FALLBACKS
                .iter()
                .find(|(tool, _)| *tool == context.current_tool)
            {
                for tool in fallbacks.iter().take(MAX_FALLBACKS) {
                    suggestions.push(suggestion_for(tool));
                }
            }
        }

        for (pattern, tools) in keyword_patterns() {
            if !pattern.is_match(&query_lower) {
                continue;
            }
            for tool in tools.iter() {
                if *tool == context.current_tool {
                    continue;
                }
                if suggestions.iter().any(|existing| existing.tool == *tool) {
                    continue;
                }
                suggestions.push(suggestion_for(tool));
                if suggestions.len() >= MAX_SUGGESTIONS {
                    return suggestions;
                }
            }
        }

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

fn suggestion_for(tool: &str) -> Suggestion {
    let reason = match tool {
        "search_apple_online" => "Search Apple's online documentation",
        "search_wwdc_notes" => "Check WWDC sessions for detailed explanations",
        "search_swift_repos" => "Find implementation examples",
        "fetch_github_file" => "Fetch specific source files",
        "search_swift_evolution" => "Understand feature design rationale",
        "fetch_apple_documentation" => "Get detailed API documentation",
        "search_human_interface_guidelines" => "Find design patterns and UI best practices",
        other => return Suggestion {
            tool: other.to_string(),
            reason: format!("Try {other}"),
        },
    };
    Suggestion {
        tool: tool.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_results_produce_fallback_suggestions() {
        let engine = SuggestionEngine::new();
        let suggestions = engine.suggestions(SuggestionContext {
            current_tool: "search_docs",
            query: "liquid glass",
            results_count: 0,
        });

        assert_eq!(suggestions[0].tool, "search_apple_online");
        assert_eq!(suggestions[1].tool, "search_wwdc_notes");
    }

    #[test]
    fn keyword_routes_apply_even_with_results() {
        let engine = SuggestionEngine::new();
        let suggestions = engine.suggestions(SuggestionContext {
            current_tool: "search_docs",
            query: "how to optimize scrolling performance",
            results_count: 7,
        });

        assert!(
            suggestions
                .iter()
                .any(|suggestion| suggestion.tool == "search_wwdc_notes")
        );
        assert!(
            suggestions
                .iter()
                .any(|suggestion| suggestion.tool == "search_swift_repos")
        );
    }

    #[test]
    fn never_suggests_the_current_tool_and_deduplicates() {
        let engine = SuggestionEngine::new();
        let suggestions = engine.suggestions(SuggestionContext {
            current_tool: "search_swift_repos",
            query: "how to implement performance profiling",
            results_count: 0,
        });

        assert!(
            suggestions
                .iter()
                .all(|suggestion| suggestion.tool != "search_swift_repos")
        );
        let mut tools: Vec<&str> = suggestions
            .iter()
            .map(|suggestion| suggestion.tool.as_str())
            .collect();
        tools.sort();
        tools.dedup();
        assert_eq!(tools.len(), suggestions.len());
    }

    #[test]
    fn suggestions_are_capped_at_three() {
        let engine = SuggestionEngine::new();
        let suggestions = engine.suggestions(SuggestionContext {
            current_tool: "search_docs",
            query: "how to design a fast navigation layout for performance",
            results_count: 0,
        });

        assert_eq!(suggestions.len(), 3);
    }

    #[test]
    fn neutral_queries_with_results_yield_nothing() {
        let engine = SuggestionEngine::new();
        let suggestions = engine.suggestions(SuggestionContext {
            current_tool: "search_docs",
            query: "liquid glass",
            results_count: 4,
        });

        assert!(suggestions.is_empty());
    }
}
